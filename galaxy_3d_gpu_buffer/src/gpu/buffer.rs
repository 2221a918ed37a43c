/// Device-independent GPU buffer
///
/// `GpuBuffer` owns the state every backend shares (size, role, access
/// pattern, map pointer, lifecycle) and enforces the map / unmap / update
/// contract. Native work is delegated to a `BufferBackend`.
///
/// Lifecycle:
/// - Live: created by a backend factory, registered with the resource cache
/// - Released: graceful teardown, native storage freed through the device
/// - Abandoned: the device context is gone, nothing is freed natively
///
/// Both teardown states are terminal: `map()` yields `None`, `update_data()`
/// yields `false`, `unmap()` does nothing.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};
use crate::gpu::access_pattern::{AccessPattern, BufferRole};
use crate::gpu::device::Device;
use crate::gpu::scratch_key::{is_scratch_eligible, ScratchKey};
use crate::resource::memory_dump::TraceMemoryDump;
use crate::resource::resource_cache::{Budgeted, ResourceCache, ResourceId};
use crate::{engine_trace, engine_warn};

// ===== DESCRIPTOR =====

/// Immutable shape of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Size in bytes (> 0)
    pub size: usize,
    pub role: BufferRole,
    pub access_pattern: AccessPattern,
}

/// Where a buffer is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Live,
    Released,
    Abandoned,
}

// ===== BACKEND TRAIT =====

/// Backend half of a buffer
///
/// Called only by `GpuBuffer`, which has already checked the lifecycle
/// state and the mapping preconditions.
pub trait BufferBackend {
    /// Produce a host pointer to the whole buffer, `None` on failure
    fn on_map(&mut self, device: &mut dyn Device, desc: &BufferDesc) -> Option<NonNull<u8>>;

    /// Undo `on_map`. `map_ptr` is the pointer `on_map` returned.
    fn on_unmap(&mut self, device: &mut dyn Device, desc: &BufferDesc, map_ptr: NonNull<u8>);

    /// Write `src` at offset 0 without mapping
    fn on_update_data(&mut self, device: &mut dyn Device, desc: &BufferDesc, src: &[u8]) -> bool;

    /// Free native storage
    fn on_release(&mut self, device: &mut dyn Device);

    /// Forget native storage without any device call
    fn on_abandon(&mut self);

    fn on_set_label(&mut self, _device: &mut dyn Device, _label: &str) {}

    /// Native storage exists
    fn is_valid(&self) -> bool;

    fn set_memory_backing(&self, _dump: &mut dyn TraceMemoryDump, _dump_name: &str) {}
}

// ===== GPU BUFFER =====

static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

/// Non-owning link back to the cache the buffer is registered with
struct CacheLink {
    cache: Weak<RefCell<ResourceCache>>,
    id: ResourceId,
}

pub struct GpuBuffer<B: BufferBackend> {
    desc: BufferDesc,
    unique_id: u32,
    map_ptr: Option<NonNull<u8>>,
    state: LifecycleState,
    label: String,
    cache_link: Option<CacheLink>,
    backend: B,
}

impl<B: BufferBackend> GpuBuffer<B> {
    /// Wrap an already constructed backend. Used by backend factories.
    pub(crate) fn new(desc: BufferDesc, backend: B) -> Self {
        assert!(desc.size > 0, "GPU buffers must have a non-zero size");
        Self {
            desc,
            unique_id: NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed),
            map_ptr: None,
            state: LifecycleState::Live,
            label: String::new(),
            cache_link: None,
            backend,
        }
    }

    // ===== ACCESSORS =====

    pub fn desc(&self) -> &BufferDesc { &self.desc }

    pub fn size(&self) -> usize { self.desc.size }

    pub fn role(&self) -> BufferRole { self.desc.role }

    pub fn access_pattern(&self) -> AccessPattern { self.desc.access_pattern }

    /// Process-unique id, stable for the buffer's lifetime
    pub fn unique_id(&self) -> u32 { self.unique_id }

    pub fn lifecycle_state(&self) -> LifecycleState { self.state }

    /// Released or abandoned
    pub fn was_destroyed(&self) -> bool { self.state != LifecycleState::Live }

    pub fn label(&self) -> &str { &self.label }

    pub fn backend(&self) -> &B { &self.backend }

    pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }

    /// Id in the resource cache, if registered
    pub fn resource_id(&self) -> Option<ResourceId> {
        self.cache_link.as_ref().map(|link| link.id)
    }

    // ===== CACHE REGISTRATION =====

    /// Register with `cache`, keyed by `compute_scratch_key()` when eligible
    pub(crate) fn register_with_cache(&mut self, cache: &Rc<RefCell<ResourceCache>>, budgeted: Budgeted) {
        assert!(self.cache_link.is_none(), "buffer registered with a cache twice");
        let id = cache.borrow_mut().insert(self.desc.size, budgeted, self.compute_scratch_key());
        self.cache_link = Some(CacheLink { cache: Rc::downgrade(cache), id });
    }

    /// Registered with this very cache instance (ids of different caches collide)
    pub fn is_registered_with(&self, cache: &Rc<RefCell<ResourceCache>>) -> bool {
        self.cache_link
            .as_ref()
            .is_some_and(|link| std::ptr::eq(link.cache.as_ptr(), Rc::as_ptr(cache)))
    }

    /// Make the buffer unreachable through scratch lookups
    pub(crate) fn remove_scratch_key(&mut self) {
        if let Some(link) = &self.cache_link {
            if let Some(cache) = link.cache.upgrade() {
                cache.borrow_mut().remove_scratch_key(link.id);
            }
        }
    }

    fn unregister_from_cache(&mut self) {
        if let Some(link) = self.cache_link.take() {
            if let Some(cache) = link.cache.upgrade() {
                cache.borrow_mut().remove(link.id);
            }
        }
    }

    // ===== MAP / UNMAP =====

    /// Map the whole buffer
    ///
    /// Returns the cached pointer when already mapped (no second native map),
    /// `None` after teardown or when the backend cannot map.
    /// The pointer is valid until the matching `unmap()`.
    pub fn map(&mut self, device: &mut dyn Device) -> Option<NonNull<u8>> {
        if self.was_destroyed() {
            return None;
        }
        if self.map_ptr.is_none() {
            self.map_ptr = self.backend.on_map(device, &self.desc);
            if self.map_ptr.is_none() {
                engine_warn!("galaxy3d::Buffer", "Map of buffer {} ({} bytes) failed",
                    self.unique_id, self.desc.size);
            }
        }
        self.map_ptr
    }

    /// Unmap a mapped buffer
    ///
    /// The pointer is cleared even if the backend reports a failure.
    ///
    /// # Panics
    ///
    /// If the buffer is live and not mapped.
    pub fn unmap(&mut self, device: &mut dyn Device) {
        if self.was_destroyed() {
            return;
        }
        let Some(map_ptr) = self.map_ptr.take() else {
            panic!("unmap() called on buffer {} which is not mapped", self.unique_id);
        };
        self.backend.on_unmap(device, &self.desc, map_ptr);
    }

    pub fn is_mapped(&self) -> bool {
        self.map_ptr.is_some()
    }

    // ===== UPDATE =====

    /// Overwrite the start of the buffer with `src` without mapping it
    ///
    /// Returns `false` after teardown, for readback buffers (never CPU
    /// writable), or when the backend fails.
    ///
    /// # Panics
    ///
    /// If the buffer is mapped, `src` is empty, or `src` is larger than the buffer.
    pub fn update_data(&mut self, device: &mut dyn Device, src: &[u8]) -> bool {
        assert!(!self.is_mapped(), "update_data() called on a mapped buffer");
        assert!(
            !src.is_empty() && src.len() <= self.desc.size,
            "update_data() source of {} bytes does not fit buffer of {} bytes",
            src.len(), self.desc.size
        );
        if self.was_destroyed() {
            return false;
        }
        if self.desc.role.is_readback() {
            return false;
        }
        self.backend.on_update_data(device, &self.desc, src)
    }

    /// Typed variant of `update_data`
    pub fn update_data_pod<T: bytemuck::Pod>(&mut self, device: &mut dyn Device, src: &[T]) -> bool {
        self.update_data(device, bytemuck::cast_slice(src))
    }

    // ===== SCRATCH KEY =====

    /// Key for opportunistic reuse, present only for power-of-two dynamic buffers
    pub fn compute_scratch_key(&self) -> Option<ScratchKey> {
        if is_scratch_eligible(self.desc.size, self.desc.access_pattern) {
            Some(ScratchKey::for_dynamic_buffer(self.desc.size, self.desc.role))
        } else {
            None
        }
    }

    // ===== LABEL / DIAGNOSTICS =====

    pub fn set_label(&mut self, device: &mut dyn Device, label: &str) {
        self.label = label.to_string();
        if !self.was_destroyed() {
            self.backend.on_set_label(device, &self.label);
        }
    }

    /// Report size and native backing to a memory dump
    pub fn dump_memory_statistics(&self, dump: &mut dyn TraceMemoryDump) {
        if self.was_destroyed() {
            return;
        }
        let dump_name = format!("galaxy3d/gpu_resources/resource_{}", self.unique_id);
        dump.dump_numeric_value(&dump_name, "size", "bytes", self.desc.size as u64);
        dump.dump_string_value(&dump_name, "type", "buffer");
        if !self.label.is_empty() {
            dump.dump_string_value(&dump_name, "label", &self.label);
        }
        self.backend.set_memory_backing(dump, &dump_name);
    }

    // ===== TEARDOWN =====

    /// Free native storage through `device`. Idempotent.
    pub fn release(&mut self, device: &mut dyn Device) {
        if self.was_destroyed() {
            return;
        }
        engine_trace!("galaxy3d::Buffer", "Releasing buffer {}", self.unique_id);
        self.backend.on_release(device);
        self.map_ptr = None;
        self.state = LifecycleState::Released;
        self.unregister_from_cache();
    }

    /// Forget native storage after context loss. Idempotent, no device calls.
    pub fn abandon(&mut self) {
        if self.was_destroyed() {
            return;
        }
        engine_trace!("galaxy3d::Buffer", "Abandoning buffer {}", self.unique_id);
        self.backend.on_abandon();
        self.map_ptr = None;
        self.state = LifecycleState::Abandoned;
        self.unregister_from_cache();
    }
}

impl<B: BufferBackend> Drop for GpuBuffer<B> {
    fn drop(&mut self) {
        if self.state == LifecycleState::Live {
            // No device available here; the native storage leaks
            engine_warn!("galaxy3d::Buffer",
                "Buffer {} dropped without release() or abandon()", self.unique_id);
            self.unregister_from_cache();
        }
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
