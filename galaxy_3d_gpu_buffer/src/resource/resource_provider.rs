/// Buffer factory with scratch reuse
///
/// Dynamic buffers are rounded up to a power of two so that they carry a
/// scratch key; recycled buffers wait in the provider until a request with
/// the same `(size, role)` shows up. Everything else goes straight to the
/// backend factory.
///
/// Call `release_all()` (or `abandon_all()` after context loss) before
/// dropping a provider: pooled buffers still present at drop time have no
/// device to free them through and their native storage leaks.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::gpu::access_pattern::{AccessPattern, BufferRole};
use crate::gpu::backend_buffer::{BackendBuffer, DeviceBuffer};
use crate::gpu::buffer::BufferDesc;
use crate::gpu::device::Device;
use crate::gpu::scratch_key::ScratchKey;
use crate::resource::resource_cache::{Budgeted, ResourceCache, ResourceId};
use crate::{engine_debug, engine_trace, engine_warn};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Smallest dynamic allocation for non-uniform roles
    pub min_dynamic_size: usize,
    /// Smallest dynamic allocation for uniform buffers
    pub min_uniform_size: usize,
    /// Budget flag given to every created buffer
    pub budgeted: Budgeted,
    /// Round dynamic sizes up to the next power of two
    pub round_dynamic_to_pow2: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            min_dynamic_size: 1 << 12,
            min_uniform_size: 1 << 7,
            budgeted: Budgeted::Yes,
            round_dynamic_to_pow2: true,
        }
    }
}

pub struct ResourceProvider {
    config: ProviderConfig,
    cache: Rc<RefCell<ResourceCache>>,
    recycled: FxHashMap<ResourceId, DeviceBuffer>,
}

impl ResourceProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            cache: Rc::new(RefCell::new(ResourceCache::new())),
            recycled: FxHashMap::default(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Rc<RefCell<ResourceCache>> {
        &self.cache
    }

    /// Buffers waiting for reuse
    pub fn recycled_count(&self) -> usize {
        self.recycled.len()
    }

    /// Size actually allocated for a dynamic request of `size` bytes
    pub fn dynamic_allocation_size(&self, size: usize, role: BufferRole) -> usize {
        let min = if role == BufferRole::Uniform {
            self.config.min_uniform_size
        } else {
            self.config.min_dynamic_size
        };
        let size = size.max(min);
        if self.config.round_dynamic_to_pow2 {
            size.checked_next_power_of_two().unwrap_or(size)
        } else {
            size
        }
    }

    /// Create a buffer, reusing a recycled one when the shape matches
    ///
    /// Dynamic requests may return a buffer larger than `size`.
    pub fn create_buffer(
        &mut self,
        device: &mut dyn Device,
        size: usize,
        role: BufferRole,
        access_pattern: AccessPattern,
    ) -> Result<DeviceBuffer> {
        assert!(size > 0, "GPU buffers must have a non-zero size");
        let size = if access_pattern == AccessPattern::Dynamic {
            let alloc_size = self.dynamic_allocation_size(size, role);
            if let Some(buffer) = self.find_scratch_buffer(alloc_size, role) {
                return Ok(buffer);
            }
            alloc_size
        } else {
            size
        };
        let desc = BufferDesc { size, role, access_pattern };
        BackendBuffer::make(device, &self.cache, desc, self.config.budgeted)
    }

    /// Take a recycled dynamic buffer of exactly `size` bytes and `role`
    pub fn find_scratch_buffer(&mut self, size: usize, role: BufferRole) -> Option<DeviceBuffer> {
        if !size.is_power_of_two() {
            return None;
        }
        let key = ScratchKey::for_dynamic_buffer(size, role);
        let id = self.cache.borrow_mut().find_scratch(&key)?;
        let Some(buffer) = self.recycled.remove(&id) else {
            engine_warn!("galaxy3d::ResourceProvider",
                "Cache offered resource {:?} for {} bytes ({:?}) but it is not in the recycled pool",
                id, size, role);
            return None;
        };
        assert!(
            buffer.size() == size && buffer.role() == role,
            "scratch lookup for {:?}/{} returned buffer {} of shape {:?}/{}",
            role, size, buffer.unique_id(), buffer.role(), buffer.size()
        );
        engine_debug!("galaxy3d::ResourceProvider",
            "Reusing buffer {} ({} bytes, {:?})", buffer.unique_id(), size, role);
        Some(buffer)
    }

    /// Give a buffer back
    ///
    /// Buffers with a scratch key are kept for reuse (unmapped first); the
    /// rest are released. Destroyed buffers are ignored.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the buffer was created by another provider.
    /// It is released through `device` rather than pooled.
    pub fn recycle(&mut self, device: &mut dyn Device, mut buffer: DeviceBuffer) -> Result<()> {
        if buffer.was_destroyed() {
            return Ok(());
        }
        if !buffer.is_registered_with(&self.cache) {
            let unique_id = buffer.unique_id();
            engine_warn!("galaxy3d::ResourceProvider",
                "Buffer {} does not belong to this provider, releasing it", unique_id);
            buffer.release(device);
            return Err(Error::InvalidResource(format!(
                "buffer {} was recycled into a provider that did not create it", unique_id
            )));
        }
        if buffer.is_mapped() {
            buffer.unmap(device);
        }
        let made_available = match buffer.resource_id() {
            Some(id) => self.cache.borrow_mut().make_available(id),
            None => false,
        };
        match buffer.resource_id() {
            Some(id) if made_available => {
                engine_trace!("galaxy3d::ResourceProvider", "Recycled buffer {}", buffer.unique_id());
                self.recycled.insert(id, buffer);
            }
            _ => buffer.release(device),
        }
        Ok(())
    }

    /// Release every recycled buffer
    pub fn release_all(&mut self, device: &mut dyn Device) {
        for (_, mut buffer) in self.recycled.drain() {
            buffer.release(device);
        }
    }

    /// Abandon every recycled buffer (device context lost)
    pub fn abandon_all(&mut self) {
        for (_, mut buffer) in self.recycled.drain() {
            buffer.abandon();
        }
    }
}

impl Drop for ResourceProvider {
    fn drop(&mut self) {
        if self.recycled.is_empty() {
            return;
        }
        engine_warn!("galaxy3d::ResourceProvider",
            "Provider dropped with {} pooled buffers, their native storage leaks", self.recycled.len());
        for (_, mut buffer) in self.recycled.drain() {
            buffer.abandon();
        }
    }
}

impl Default for ResourceProvider {
    fn default() -> Self {
        Self::new(ProviderConfig::default())
    }
}

#[cfg(test)]
#[path = "resource_provider_tests.rs"]
mod tests;
