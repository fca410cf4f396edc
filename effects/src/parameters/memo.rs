use parking_lot::Mutex;

use crate::variability::{MaterialVariability, VariabilitySeed};

use super::{EvalContext, ParameterValue};

/// A value cached against the seed of one variability tier.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    inner: Mutex<MemoState>,
}

#[derive(Debug, Default)]
struct MemoState {
    seed: VariabilitySeed,
    value: Option<ParameterValue>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute through `compute` unless the cached value is fresh for `tier`.
    ///
    /// Returns whether the stored value differs from the previous one.
    pub fn refresh(
        &self,
        tier: MaterialVariability,
        ctx: &EvalContext<'_>,
        compute: impl FnOnce() -> ParameterValue,
    ) -> bool {
        let mut state = self.inner.lock();
        if state.value.is_some() && ctx.seeds.is_fresh(tier, state.seed) {
            return false;
        }
        let value = compute();
        state.seed = ctx.seeds.get(tier);
        let changed = state.value != Some(value);
        state.value = Some(value);
        changed
    }

    /// The cached value, or `fallback` if nothing was computed yet.
    pub fn value_or(&self, fallback: ParameterValue) -> ParameterValue {
        self.inner.lock().value.unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::FrameState;
    use crate::variability::VariabilitySeeds;
    use std::cell::Cell;

    #[test]
    fn recomputes_once_per_seed() {
        let memo = Memo::new();
        let mut seeds = VariabilitySeeds::new();
        let frame = FrameState::default();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            ParameterValue::Float(calls.get() as f32)
        };

        let ctx = EvalContext::new(&seeds, &frame);
        assert!(memo.refresh(MaterialVariability::Frame, &ctx, compute));
        assert!(!memo.refresh(MaterialVariability::Frame, &ctx, compute));
        assert_eq!(calls.get(), 1);

        seeds.next_frame();
        let ctx = EvalContext::new(&seeds, &frame);
        assert!(memo.refresh(MaterialVariability::Frame, &ctx, compute));
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.value_or(ParameterValue::Float(0.0)), ParameterValue::Float(2.0));
    }

    #[test]
    fn unchanged_value_reports_false() {
        let memo = Memo::new();
        let mut seeds = VariabilitySeeds::new();
        let frame = FrameState::default();
        let ctx = EvalContext::new(&seeds, &frame);
        assert!(memo.refresh(MaterialVariability::Scene, &ctx, || 1.0f32.into()));

        seeds.advance(MaterialVariability::Scene);
        let ctx = EvalContext::new(&seeds, &frame);
        assert!(!memo.refresh(MaterialVariability::Scene, &ctx, || 1.0f32.into()));
    }

    #[test]
    fn always_recomputes() {
        let memo = Memo::new();
        let seeds = VariabilitySeeds::new();
        let frame = FrameState::default();
        let ctx = EvalContext::new(&seeds, &frame);
        let calls = Cell::new(0u32);
        for _ in 0..3 {
            memo.refresh(MaterialVariability::Always, &ctx, || {
                calls.set(calls.get() + 1);
                ParameterValue::UInt(calls.get())
            });
        }
        assert_eq!(calls.get(), 3);
    }
}
