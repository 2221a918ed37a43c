/// Capability-driven buffer backend
///
/// Owns the native handle and implements one of the four mapping
/// strategies. Strategies and the usage hint are captured from the device
/// capabilities once, at construction.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;
use crate::error::{Error, Result};
use crate::gpu::access_pattern::{usage_hint, BufferRole, UsageHint};
use crate::gpu::buffer::{BufferBackend, BufferDesc, GpuBuffer};
use crate::gpu::caps::{InvalidateStrategy, MapStrategy};
use crate::gpu::device::{BufferTarget, Device, MapAccess, MapMode, NativeError, NativeHandle};
use crate::resource::memory_dump::TraceMemoryDump;
use crate::resource::resource_cache::{Budgeted, ResourceCache};
use crate::{engine_debug, engine_err, engine_error, engine_warn};

/// Buffer backed by a native device buffer
pub type DeviceBuffer = GpuBuffer<BackendBuffer>;

/// Prefix added to debug labels so they are recognisable in capture tools
const LABEL_PREFIX: &str = "galaxy3d::";

/// Outcome of the constructor's native allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocationStatus {
    Allocated,
    HandleCreationFailed,
    StorageFailed(NativeError),
}

/// Run an allocation call and report the error it raised.
///
/// With `skip_error_checks` the call is issued bare and assumed to succeed.
fn checked_alloc(
    device: &mut dyn Device,
    skip_error_checks: bool,
    call: impl FnOnce(&mut dyn Device),
) -> NativeError {
    if skip_error_checks {
        call(device);
        return NativeError::NoError;
    }
    device.clear_errors();
    call(&mut *device);
    device.get_error()
}

pub struct BackendBuffer {
    handle: NativeHandle,
    role: BufferRole,
    usage: UsageHint,
    map_strategy: MapStrategy,
    invalidate_strategy: InvalidateStrategy,
    debug_support: bool,
    skip_error_checks: bool,
    has_attached_aux_state: bool,
}

impl BackendBuffer {
    /// Create, allocate and register a buffer
    ///
    /// Nothing is returned unless native storage was allocated. The cache
    /// registration made during construction is withdrawn on failure.
    ///
    /// # Errors
    ///
    /// - `Error::Unsupported` for transfer roles on devices without transfer buffers
    /// - `Error::BackendError` if the device could not create a buffer name
    /// - `Error::OutOfMemory` if storage allocation ran out of memory
    pub fn make(
        device: &mut dyn Device,
        cache: &Rc<RefCell<ResourceCache>>,
        desc: BufferDesc,
        budgeted: Budgeted,
    ) -> Result<DeviceBuffer> {
        assert!(desc.size > 0, "GPU buffers must have a non-zero size");
        if desc.role.is_transfer() && !device.caps().supports_transfer_buffers() {
            engine_warn!("galaxy3d::BackendBuffer",
                "Device has no transfer buffer support for {:?} buffers", desc.role);
            return Err(Error::Unsupported(format!("{:?} buffers need transfer buffer support", desc.role)));
        }

        let (backend, status) = Self::new(device, &desc);
        let mut buffer = GpuBuffer::new(desc, backend);
        buffer.register_with_cache(cache, budgeted);
        if !buffer.backend().is_valid() {
            // An invalid buffer must never satisfy a scratch lookup
            buffer.remove_scratch_key();
            buffer.release(device);
        }

        match status {
            AllocationStatus::Allocated => {
                engine_debug!("galaxy3d::BackendBuffer",
                    "Created buffer {:?}: {} bytes, {:?}, {:?}",
                    buffer.backend().handle(), desc.size, desc.role, buffer.backend().usage_hint());
                Ok(buffer)
            }
            AllocationStatus::HandleCreationFailed => {
                Err(engine_err!("galaxy3d::BackendBuffer", "Device failed to create a buffer name"))
            }
            AllocationStatus::StorageFailed(NativeError::OutOfMemory) => {
                engine_error!("galaxy3d::BackendBuffer",
                    "Out of memory allocating {} bytes for a {:?} buffer", desc.size, desc.role);
                Err(Error::OutOfMemory)
            }
            AllocationStatus::StorageFailed(error) => {
                Err(engine_err!("galaxy3d::BackendBuffer",
                    "Storage allocation of {} bytes failed: {:?}", desc.size, error))
            }
        }
    }

    fn new(device: &mut dyn Device, desc: &BufferDesc) -> (Self, AllocationStatus) {
        let caps = device.caps();
        let usage = usage_hint(desc.role, desc.access_pattern, caps);
        let map_strategy = caps.map_strategy;
        let invalidate_strategy = caps.invalidate_strategy;
        let debug_support = caps.debug_support;
        let skip_error_checks = caps.skip_error_checks;

        let mut backend = Self {
            handle: device.create_buffer(),
            role: desc.role,
            usage,
            map_strategy,
            invalidate_strategy,
            debug_support,
            skip_error_checks,
            has_attached_aux_state: false,
        };
        if !backend.handle.is_valid() {
            return (backend, AllocationStatus::HandleCreationFailed);
        }

        let target = backend.bind(device);
        let size = desc.size;
        let error = checked_alloc(device, skip_error_checks, |d| {
            d.buffer_data(target, size, None, usage)
        });
        if error != NativeError::NoError {
            device.delete_buffer(backend.handle);
            backend.handle = NativeHandle::INVALID;
            return (backend, AllocationStatus::StorageFailed(error));
        }
        (backend, AllocationStatus::Allocated)
    }

    // ===== ACCESSORS =====

    pub fn handle(&self) -> NativeHandle { self.handle }

    pub fn usage_hint(&self) -> UsageHint { self.usage }

    pub fn map_strategy(&self) -> MapStrategy { self.map_strategy }

    pub fn invalidate_strategy(&self) -> InvalidateStrategy { self.invalidate_strategy }

    /// Another subsystem cached this buffer's identity
    pub fn has_attached_aux_state(&self) -> bool { self.has_attached_aux_state }

    /// Mark that another subsystem cached this buffer's identity. The device
    /// is told to forget it when the buffer is released.
    pub fn set_has_attached_aux_state(&mut self) {
        self.has_attached_aux_state = true;
    }

    // ===== NATIVE HELPERS =====

    fn bind(&self, device: &mut dyn Device) -> BufferTarget {
        device.handle_dirty_context();
        device.bind_buffer(self.role, self.handle)
    }

    /// Discard contents before a CPU write
    fn invalidate(&self, device: &mut dyn Device, target: BufferTarget, size: usize) -> NativeError {
        match self.invalidate_strategy {
            InvalidateStrategy::None => NativeError::NoError,
            InvalidateStrategy::NullDataReallocate => {
                let usage = self.usage;
                checked_alloc(device, self.skip_error_checks, |d| {
                    d.buffer_data(target, size, None, usage)
                })
            }
            InvalidateStrategy::ExplicitInvalidate => {
                device.invalidate_buffer_data(self.handle);
                NativeError::NoError
            }
        }
    }

    fn map_mode(read_only: bool) -> MapMode {
        if read_only { MapMode::ReadOnly } else { MapMode::WriteOnly }
    }
}

impl BufferBackend for BackendBuffer {
    fn on_map(&mut self, device: &mut dyn Device, desc: &BufferDesc) -> Option<NonNull<u8>> {
        assert!(self.handle.is_valid(), "mapping a buffer without native storage");
        let read_only = desc.role.is_readback();

        // Dirty context is handled by bind()
        match self.map_strategy {
            MapStrategy::Unsupported => None,
            MapStrategy::WholeBufferMap => {
                let target = self.bind(device);
                if !read_only {
                    let error = self.invalidate(device, target, desc.size);
                    if error != NativeError::NoError {
                        engine_warn!("galaxy3d::BackendBuffer",
                            "Invalidation before map of {:?} failed: {:?}", self.handle, error);
                        return None;
                    }
                }
                device.map_buffer(target, Self::map_mode(read_only))
            }
            MapStrategy::RangeMap => {
                let target = self.bind(device);
                let access = if read_only {
                    MapAccess::READ
                } else if desc.role == BufferRole::UploadToDevice {
                    MapAccess::WRITE
                } else {
                    MapAccess::WRITE | MapAccess::INVALIDATE_BUFFER
                };
                device.map_buffer_range(target, 0, desc.size, access)
            }
            MapStrategy::ShadowCopyMap => {
                let target = self.bind(device);
                device.map_buffer_sub_data(target, 0, desc.size, Self::map_mode(read_only))
            }
        }
    }

    fn on_unmap(&mut self, device: &mut dyn Device, _desc: &BufferDesc, map_ptr: NonNull<u8>) {
        if !self.handle.is_valid() {
            return;
        }
        match self.map_strategy {
            MapStrategy::Unsupported => {
                unreachable!("unmap on a device without map support")
            }
            MapStrategy::WholeBufferMap | MapStrategy::RangeMap => {
                let target = self.bind(device);
                if !device.unmap_buffer(target) {
                    engine_warn!("galaxy3d::BackendBuffer",
                        "Unmap of {:?} reported lost contents", self.handle);
                }
            }
            MapStrategy::ShadowCopyMap => {
                self.bind(device);
                device.unmap_buffer_sub_data(map_ptr);
            }
        }
    }

    fn on_update_data(&mut self, device: &mut dyn Device, desc: &BufferDesc, src: &[u8]) -> bool {
        assert!(self.handle.is_valid(), "updating a buffer without native storage");
        let target = self.bind(device);
        let error = self.invalidate(device, target, desc.size);
        if error != NativeError::NoError {
            engine_warn!("galaxy3d::BackendBuffer",
                "Invalidation before update of {:?} failed: {:?}", self.handle, error);
            return false;
        }
        device.buffer_sub_data(target, 0, src);
        true
    }

    fn on_release(&mut self, device: &mut dyn Device) {
        if self.handle.is_valid() {
            if self.has_attached_aux_state {
                device.forget_attached_state(self.handle);
            }
            device.delete_buffer(self.handle);
            self.handle = NativeHandle::INVALID;
        }
        self.has_attached_aux_state = false;
    }

    fn on_abandon(&mut self) {
        self.handle = NativeHandle::INVALID;
        self.has_attached_aux_state = false;
    }

    fn on_set_label(&mut self, device: &mut dyn Device, label: &str) {
        if !self.handle.is_valid() || label.is_empty() || !self.debug_support {
            return;
        }
        device.object_label(self.handle, &format!("{}{}", LABEL_PREFIX, label));
    }

    fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    fn set_memory_backing(&self, dump: &mut dyn TraceMemoryDump, dump_name: &str) {
        dump.set_memory_backing(dump_name, "gpu_buffer", &self.handle.0.to_string());
    }
}

#[cfg(test)]
#[path = "backend_buffer_tests.rs"]
mod tests;
