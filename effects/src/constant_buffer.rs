//! Per material effect view of one shared constant buffer.

use std::sync::Arc;

use xxhash_rust::xxh3::{Xxh3, xxh3_64};

use crate::backend::DeviceContext;
use crate::bind_name::BindName;
use crate::constant::ConstantBufferLayout;
use crate::effect::ShaderStage;
use crate::error::ResolutionError;
use crate::parameters::{EvalContext, ParamRef, ResolveContext, resolve};
use crate::shared_buffer::SharedConstantBuffer;
use crate::variability::{MaterialVariability, VariabilitySeed};

/// Byte written over the whole buffer before evaluation when the debug fill is on.
pub const DEBUG_FILL_BYTE: u8 = 0xDE;

/// The parameters bound to one constant buffer and the bytes they produced.
///
/// [`prepare`](Self::prepare) resolves a parameter per field once.
/// [`eval`](Self::eval) then runs every frame and recomputes only when another
/// binding uploaded to the shared buffer or the buffer's variability tier
/// advanced. A `data_hash` of zero means the last evaluation produced nothing
/// new. The bytes of the last evaluation are kept so they can be uploaded
/// again after another binding took the device buffer over.
#[derive(Debug)]
pub struct EffectConstantBuffer {
    shared: Arc<SharedConstantBuffer>,
    bindings: Vec<(ShaderStage, u32)>,
    parameters: Vec<Option<ParamRef>>,
    raw: Vec<u8>,
    raw_hash: u64,
    header_hash: u64,
    data_hash: u64,
    variability: MaterialVariability,
    seed: VariabilitySeed,
}

impl EffectConstantBuffer {
    pub fn new(shared: Arc<SharedConstantBuffer>, stage: ShaderStage, slot: u32) -> Self {
        let size = shared.layout().byte_size() as usize;
        Self {
            shared,
            bindings: vec![(stage, slot)],
            parameters: Vec::new(),
            raw: vec![0; size],
            raw_hash: 0,
            header_hash: 0,
            data_hash: 0,
            variability: MaterialVariability::Once,
            seed: VariabilitySeed::INVALID,
        }
    }

    /// Also bind to `slot` of `stage`.
    pub fn add_binding(&mut self, stage: ShaderStage, slot: u32) {
        if !self.bindings.contains(&(stage, slot)) {
            self.bindings.push((stage, slot));
        }
    }

    /// Whether both buffers write the same device buffer.
    pub fn shares_with(&self, shared: &Arc<SharedConstantBuffer>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    /// Resolve a parameter for every field in use.
    pub fn prepare(&mut self, cx: &mut ResolveContext<'_>) -> Result<(), ResolutionError> {
        let layout = self.shared.layout().clone();
        let parameters = layout
            .entries()
            .iter()
            .map(|entry| {
                if entry.field.in_use() {
                    resolve(cx, &entry.name, entry.field.field_type()).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.bind_parameters(parameters)
    }

    /// Replace the bound parameters, one per layout entry.
    ///
    /// Fails without changing anything if a parameter's type differs from its
    /// field's.
    pub fn bind_parameters(&mut self, parameters: Vec<Option<ParamRef>>) -> Result<(), ResolutionError> {
        debug_assert_eq!(parameters.len(), self.shared.layout().count());
        for (entry, parameter) in self.shared.layout().entries().iter().zip(&parameters) {
            if let Some(parameter) = parameter {
                let expected = entry.field.field_type();
                if parameter.field_type() != expected {
                    return Err(ResolutionError::FieldTypeMismatch {
                        name: entry.name.clone(),
                        expected,
                        found: parameter.field_type(),
                    });
                }
            }
        }

        let mut hasher = Xxh3::new();
        let mut variability = MaterialVariability::Once;
        for parameter in &parameters {
            let identity = parameter.as_ref().map_or(0, |p| p.identity());
            hasher.update(&(identity as u64).to_le_bytes());
            if let Some(parameter) = parameter {
                variability = variability.most_variable(parameter.variability());
            }
        }

        self.header_hash = non_zero(hasher.digest());
        self.variability = variability;
        self.parameters = parameters;
        Ok(())
    }

    /// Recompute the raw bytes if needed. Returns whether they were recomputed.
    pub fn eval(&mut self, ctx: &EvalContext<'_>, debug_fill: bool) -> bool {
        if self.shared.last_header_hash() == self.header_hash
            && ctx.seeds.is_fresh(self.variability, self.seed)
        {
            self.data_hash = 0;
            return false;
        }

        lilium_core::profile_scope!("EffectConstantBuffer::eval");
        self.seed = ctx.seeds.get(self.variability);
        self.raw
            .fill(if debug_fill { DEBUG_FILL_BYTE } else { 0 });

        for (entry, parameter) in self.shared.layout().entries().iter().zip(&self.parameters) {
            if let Some(parameter) = parameter {
                parameter.eval(ctx);
                parameter.copy_to(&mut self.raw[entry.field.byte_range()]);
            }
        }

        self.raw_hash = non_zero(xxh3_64(&self.raw));
        self.data_hash = self.raw_hash;
        true
    }

    /// Upload the last evaluation unless the device buffer already holds it.
    ///
    /// A skipped evaluation still uploads when another binding wrote the
    /// device buffer since this one did.
    pub fn set_data_if_needed(&self, ctx: &mut dyn DeviceContext) -> bool {
        let data_hash = if self.data_hash != 0 {
            self.data_hash
        } else if self.shared.last_header_hash() != self.header_hash {
            self.raw_hash
        } else {
            0
        };
        let uploaded =
            self.shared
                .set_data_only_if_changed(ctx, self.header_hash, data_hash, &self.raw);
        if !uploaded {
            log::trace!("Skipped upload of `{}`", self.name());
        }
        uploaded
    }

    /// Bind the device buffer to every stage slot.
    pub fn set(&self, ctx: &mut dyn DeviceContext) {
        for &(stage, slot) in &self.bindings {
            ctx.set_constant_buffer(stage, slot, Some(self.shared.handle()));
        }
    }

    pub fn name(&self) -> &BindName {
        self.shared.name()
    }

    pub fn layout(&self) -> &Arc<ConstantBufferLayout> {
        self.shared.layout()
    }

    pub fn shared(&self) -> &Arc<SharedConstantBuffer> {
        &self.shared
    }

    pub fn bindings(&self) -> &[(ShaderStage, u32)] {
        &self.bindings
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw
    }

    /// Bytes of the field called `name`.
    pub fn field_bytes(&self, name: &BindName) -> Option<&[u8]> {
        self.shared
            .layout()
            .find(name)
            .map(|entry| &self.raw[entry.field.byte_range()])
    }

    pub fn header_hash(&self) -> u64 {
        self.header_hash
    }

    pub fn data_hash(&self) -> u64 {
        self.data_hash
    }

    /// The most volatile tier among the bound parameters.
    pub fn variability(&self) -> MaterialVariability {
        self.variability
    }

    pub fn parameters(&self) -> &[Option<ParamRef>] {
        &self.parameters
    }
}

// Zero is reserved for "nothing to upload" and "never written".
fn non_zero(hash: u64) -> u64 {
    if hash == 0 { 1 } else { hash }
}
