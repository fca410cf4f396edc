//! Variability tiers and their invalidation seeds.
//!
//! Every parameter and constant buffer belongs to a [`MaterialVariability`]
//! tier. Each tier owns a monotonically increasing [`VariabilitySeed`];
//! a cached value is stale once the seed of its tier has moved past the seed
//! recorded when the value was computed.
//!
//! Advancing a tier also advances every more volatile tier. A constant
//! buffer is keyed on the most volatile tier among its parameters, so it
//! must notice when any of its less volatile parameters is invalidated.

use serde::{Deserialize, Serialize};

/// How often a value may change, from least to most volatile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum MaterialVariability {
    /// Computed once, refreshed only by a global invalidation.
    #[default]
    Once = 0,
    /// Changes between draw batches.
    Batch = 1,
    /// Changes when material values change.
    Material = 2,
    /// Changes when the scene changes.
    Scene = 3,
    /// Changes when the world (objects, lights) changes.
    World = 4,
    /// Changes every frame.
    Frame = 5,
    /// Never cached.
    Always = 6,
}

impl MaterialVariability {
    /// Number of tiers.
    pub const COUNT: usize = 7;

    /// All tiers, least volatile first.
    pub const ALL: [MaterialVariability; Self::COUNT] = [
        Self::Once,
        Self::Batch,
        Self::Material,
        Self::Scene,
        Self::World,
        Self::Frame,
        Self::Always,
    ];

    /// Decode from the 3-bit packed representation.
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.get(bits as usize).copied()
    }

    /// The packed 3-bit representation.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Whether `self` changes at least as often as `other`.
    pub fn is_same_or_more_variable(self, other: Self) -> bool {
        self >= other
    }

    /// The more volatile of two tiers.
    pub fn most_variable(self, other: Self) -> Self {
        if other.is_same_or_more_variable(self) {
            other
        } else {
            self
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A point in a tier's invalidation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariabilitySeed(u32);

impl VariabilitySeed {
    /// Never matches a live seed.
    pub const INVALID: Self = Self(0);

    /// First seed handed out by a fresh table.
    pub const FIRST: Self = Self(1);

    /// The raw counter.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the invalid sentinel.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    fn next(self) -> Self {
        match self.0.wrapping_add(1) {
            0 => Self::FIRST,
            n => Self(n),
        }
    }
}

impl Default for VariabilitySeed {
    fn default() -> Self {
        Self::INVALID
    }
}

/// The current seed of every tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariabilitySeeds {
    seeds: [VariabilitySeed; MaterialVariability::COUNT],
}

impl VariabilitySeeds {
    /// A fresh table, every tier at [`VariabilitySeed::FIRST`].
    pub fn new() -> Self {
        Self {
            seeds: [VariabilitySeed::FIRST; MaterialVariability::COUNT],
        }
    }

    /// The current seed of `tier`.
    pub fn get(&self, tier: MaterialVariability) -> VariabilitySeed {
        self.seeds[tier.index()]
    }

    /// Whether a value computed at `seed` is still valid for `tier`.
    ///
    /// `Always` values are never fresh, and neither is the invalid seed.
    pub fn is_fresh(&self, tier: MaterialVariability, seed: VariabilitySeed) -> bool {
        tier != MaterialVariability::Always && seed.is_valid() && self.get(tier) == seed
    }

    /// Invalidate `tier` and every more volatile tier.
    pub fn advance(&mut self, tier: MaterialVariability) {
        for seed in &mut self.seeds[tier.index()..] {
            *seed = seed.next();
        }
    }

    /// Invalidate every tier, including `Once`.
    pub fn advance_all(&mut self) {
        self.advance(MaterialVariability::Once);
    }

    /// Advance the per-frame tier. Call once at the start of each frame.
    pub fn next_frame(&mut self) {
        self.advance(MaterialVariability::Frame);
    }
}

impl Default for VariabilitySeeds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        for pair in MaterialVariability::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[1].is_same_or_more_variable(pair[0]));
        }
    }

    #[test]
    fn bits_roundtrip() {
        for tier in MaterialVariability::ALL {
            assert_eq!(MaterialVariability::from_bits(tier.bits()), Some(tier));
        }
        assert_eq!(MaterialVariability::from_bits(7), None);
    }

    #[test]
    fn most_variable_prefers_higher_tier() {
        use MaterialVariability::*;
        assert_eq!(Once.most_variable(Frame), Frame);
        assert_eq!(Frame.most_variable(Scene), Frame);
        assert_eq!(World.most_variable(World), World);
    }

    #[test]
    fn invalid_seed_is_never_fresh() {
        let seeds = VariabilitySeeds::new();
        assert!(!seeds.is_fresh(MaterialVariability::Once, VariabilitySeed::INVALID));
        assert!(seeds.is_fresh(MaterialVariability::Once, VariabilitySeed::FIRST));
    }

    #[test]
    fn always_is_never_fresh() {
        let seeds = VariabilitySeeds::new();
        let seed = seeds.get(MaterialVariability::Always);
        assert!(!seeds.is_fresh(MaterialVariability::Always, seed));
    }

    #[test]
    fn advance_cascades_to_more_volatile_tiers() {
        let mut seeds = VariabilitySeeds::new();
        let before = seeds.clone();
        seeds.advance(MaterialVariability::Scene);

        assert_eq!(seeds.get(MaterialVariability::Material), before.get(MaterialVariability::Material));
        assert_ne!(seeds.get(MaterialVariability::Scene), before.get(MaterialVariability::Scene));
        assert_ne!(seeds.get(MaterialVariability::World), before.get(MaterialVariability::World));
        assert_ne!(seeds.get(MaterialVariability::Frame), before.get(MaterialVariability::Frame));
    }

    #[test]
    fn next_frame_leaves_lower_tiers() {
        let mut seeds = VariabilitySeeds::new();
        let once = seeds.get(MaterialVariability::Once);
        seeds.next_frame();
        assert!(seeds.is_fresh(MaterialVariability::Once, once));
    }

    #[test]
    fn seed_wraps_past_invalid() {
        assert_eq!(VariabilitySeed(u32::MAX).next(), VariabilitySeed::FIRST);
    }
}
