//! Device constant buffers shared between effects.
//!
//! Every effect reflecting a cbuffer with the same name and layout binds the
//! same device buffer. The factory holds weak references only. When the last
//! [`SharedConstantBuffer`] goes away its handle is queued and destroyed on the
//! next [`SharedConstantBufferFactory::collect_garbage`], since `Drop` has no
//! device to call into.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use lilium_core::thread::ThreadAffinity;
use parking_lot::Mutex;

use crate::backend::{BufferHandle, DeviceContext, RenderDevice};
use crate::bind_name::BindName;
use crate::constant::ConstantBufferLayout;
use crate::error::EffectResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SharedBufferKey {
    name: BindName,
    layout: Arc<ConstantBufferLayout>,
}

type Graveyard = Arc<Mutex<Vec<BufferHandle>>>;

/// One device constant buffer and the hashes of what was last uploaded to it.
///
/// The header hash identifies which set of parameters produced the bytes the
/// device buffer holds now. It is stamped on upload, not on evaluation, so an
/// effect constant buffer may skip evaluation only while its own data is on
/// the device.
#[derive(Debug)]
pub struct SharedConstantBuffer {
    key: SharedBufferKey,
    handle: BufferHandle,
    last_header_hash: AtomicU64,
    last_data_hash: AtomicU64,
    graveyard: Graveyard,
}

impl SharedConstantBuffer {
    pub fn name(&self) -> &BindName {
        &self.key.name
    }

    pub fn layout(&self) -> &Arc<ConstantBufferLayout> {
        &self.key.layout
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn last_header_hash(&self) -> u64 {
        self.last_header_hash.load(Ordering::Acquire)
    }

    pub fn last_data_hash(&self) -> u64 {
        self.last_data_hash.load(Ordering::Acquire)
    }

    /// Upload `data` produced by the parameters hashed as `header_hash` unless
    /// the buffer already holds data with `data_hash`.
    ///
    /// Both hashes are recorded on upload. A zero hash never uploads.
    pub fn set_data_only_if_changed(
        &self,
        ctx: &mut dyn DeviceContext,
        header_hash: u64,
        data_hash: u64,
        data: &[u8],
    ) -> bool {
        if data_hash == 0 || self.last_data_hash() == data_hash {
            if data_hash != 0 {
                self.last_header_hash.store(header_hash, Ordering::Release);
            }
            return false;
        }
        ctx.update_constant_buffer(self.handle, data);
        self.last_data_hash.store(data_hash, Ordering::Release);
        self.last_header_hash.store(header_hash, Ordering::Release);
        true
    }
}

impl Drop for SharedConstantBuffer {
    fn drop(&mut self) {
        self.graveyard.lock().push(self.handle);
    }
}

/// Deduplicates device constant buffers by name and layout.
pub struct SharedConstantBufferFactory {
    buffers: HashMap<SharedBufferKey, Weak<SharedConstantBuffer>>,
    graveyard: Graveyard,
    affinity: ThreadAffinity,
}

impl SharedConstantBufferFactory {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            graveyard: Graveyard::default(),
            affinity: ThreadAffinity::current(),
        }
    }

    /// The live buffer for `name` and `layout`, or a freshly created one.
    pub fn get_or_create(
        &mut self,
        device: &mut dyn RenderDevice,
        name: &BindName,
        layout: &Arc<ConstantBufferLayout>,
    ) -> EffectResult<Arc<SharedConstantBuffer>> {
        self.affinity.check("SharedConstantBufferFactory");
        let key = SharedBufferKey {
            name: name.clone(),
            layout: layout.clone(),
        };
        if let Some(buffer) = self.buffers.get(&key).and_then(Weak::upgrade) {
            return Ok(buffer);
        }

        let handle = device.create_constant_buffer(name, layout.byte_size())?;
        log::debug!(
            "Created shared constant buffer `{name}` ({} bytes)",
            layout.byte_size()
        );
        let buffer = Arc::new(SharedConstantBuffer {
            key: key.clone(),
            handle,
            last_header_hash: AtomicU64::new(0),
            last_data_hash: AtomicU64::new(0),
            graveyard: self.graveyard.clone(),
        });
        self.buffers.insert(key, Arc::downgrade(&buffer));
        Ok(buffer)
    }

    /// Destroy device buffers no effect references any more.
    pub fn collect_garbage(&mut self, device: &mut dyn RenderDevice) -> usize {
        self.affinity.check("SharedConstantBufferFactory");
        self.buffers.retain(|_, buffer| buffer.strong_count() > 0);

        let dead = std::mem::take(&mut *self.graveyard.lock());
        for &handle in &dead {
            device.destroy_constant_buffer(handle);
        }
        if !dead.is_empty() {
            log::debug!("Destroyed {} shared constant buffers", dead.len());
        }
        dead.len()
    }

    /// Number of buffers still referenced.
    pub fn live_count(&self) -> usize {
        self.buffers
            .values()
            .filter(|buffer| buffer.strong_count() > 0)
            .count()
    }

    /// Handles waiting for [`collect_garbage`](Self::collect_garbage).
    pub fn pending_destruction(&self) -> usize {
        self.graveyard.lock().len()
    }
}

impl Default for SharedConstantBufferFactory {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(SharedConstantBuffer: Send, Sync);
