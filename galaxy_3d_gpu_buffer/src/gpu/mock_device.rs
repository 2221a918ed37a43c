/// Mock Device for unit tests (no GPU required)
///
/// Backs every buffer with host memory, records each native call, and can be
/// told to fail specific calls.

use std::ptr::NonNull;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::gpu::access_pattern::{BufferRole, UsageHint};
use crate::gpu::caps::{Caps, InvalidateStrategy, MapStrategy};
use crate::gpu::device::{BufferTarget, Device, MapAccess, MapMode, NativeError, NativeHandle};

// ============================================================================
// Recorded calls
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    HandleDirtyContext,
    CreateBuffer,
    DeleteBuffer(NativeHandle),
    BindBuffer(BufferRole, NativeHandle),
    BufferData { target: BufferTarget, size: usize, has_data: bool, usage: UsageHint },
    BufferSubData { target: BufferTarget, offset: usize, len: usize },
    MapBuffer(BufferTarget, MapMode),
    MapBufferRange { target: BufferTarget, offset: usize, length: usize, access: MapAccess },
    UnmapBuffer(BufferTarget),
    MapBufferSubData { target: BufferTarget, offset: usize, length: usize, mode: MapMode },
    UnmapBufferSubData,
    InvalidateBufferData(NativeHandle),
    ClearErrors,
    GetError,
    ObjectLabel(NativeHandle, String),
    ForgetAttachedState(NativeHandle),
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug)]
pub struct MockStorage {
    pub data: Vec<u8>,
    pub usage: Option<UsageHint>,
    pub label: Option<String>,
}

#[derive(Debug)]
struct Shadow {
    handle: NativeHandle,
    offset: usize,
    data: Box<[u8]>,
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    pub caps: Caps,
    pub calls: Vec<DeviceCall>,
    pub buffers: FxHashMap<NativeHandle, MockStorage>,
    bindings: FxHashMap<BufferTarget, NativeHandle>,
    mapped: FxHashSet<NativeHandle>,
    shadows: FxHashMap<usize, Shadow>,
    next_handle: u32,
    pending_error: NativeError,

    // Fault injection
    /// `create_buffer` returns the invalid handle
    pub fail_create: bool,
    /// Error raised by the next `buffer_data` call (one-shot)
    pub fail_next_buffer_data: Option<NativeError>,
    /// Number of `buffer_data` calls to let through before `fail_next_buffer_data` fires
    pub buffer_data_calls_before_failure: usize,
    /// Map calls return null
    pub fail_map: bool,
    /// `unmap_buffer` reports lost contents
    pub fail_unmap: bool,
}

impl MockDevice {
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            calls: Vec::new(),
            buffers: FxHashMap::default(),
            bindings: FxHashMap::default(),
            mapped: FxHashSet::default(),
            shadows: FxHashMap::default(),
            next_handle: 1,
            pending_error: NativeError::NoError,
            fail_create: false,
            fail_next_buffer_data: None,
            buffer_data_calls_before_failure: 0,
            fail_map: false,
            fail_unmap: false,
        }
    }

    pub fn with_strategies(map_strategy: MapStrategy, invalidate_strategy: InvalidateStrategy) -> Self {
        Self::new(Caps { map_strategy, invalidate_strategy, ..Caps::default() })
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn count_deletes(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::DeleteBuffer(_)))
    }

    pub fn count_maps(&self) -> usize {
        self.count(|c| matches!(
            c,
            DeviceCall::MapBuffer(..) | DeviceCall::MapBufferRange { .. } | DeviceCall::MapBufferSubData { .. }
        ))
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn storage(&self, handle: NativeHandle) -> Option<&MockStorage> {
        self.buffers.get(&handle)
    }

    pub fn is_native_mapped(&self, handle: NativeHandle) -> bool {
        self.mapped.contains(&handle)
    }

    fn bound(&self, target: BufferTarget) -> NativeHandle {
        *self.bindings.get(&target).unwrap_or(&NativeHandle::INVALID)
    }

    fn raise(&mut self, error: NativeError) {
        if self.pending_error == NativeError::NoError {
            self.pending_error = error;
        }
    }

    fn map_storage(&mut self, target: BufferTarget) -> Option<NonNull<u8>> {
        if self.fail_map {
            return None;
        }
        let handle = self.bound(target);
        let storage = self.buffers.get_mut(&handle)?;
        assert!(self.mapped.insert(handle), "native map of an already mapped buffer {:?}", handle);
        NonNull::new(storage.data.as_mut_ptr())
    }
}

impl Device for MockDevice {
    fn caps(&self) -> &Caps {
        &self.caps
    }

    fn handle_dirty_context(&mut self) {
        self.calls.push(DeviceCall::HandleDirtyContext);
    }

    fn create_buffer(&mut self) -> NativeHandle {
        self.calls.push(DeviceCall::CreateBuffer);
        if self.fail_create {
            return NativeHandle::INVALID;
        }
        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        self.buffers.insert(handle, MockStorage { data: Vec::new(), usage: None, label: None });
        handle
    }

    fn delete_buffer(&mut self, handle: NativeHandle) {
        self.calls.push(DeviceCall::DeleteBuffer(handle));
        self.buffers.remove(&handle);
        self.mapped.remove(&handle);
        self.bindings.retain(|_, bound| *bound != handle);
    }

    fn bind_buffer(&mut self, role: BufferRole, handle: NativeHandle) -> BufferTarget {
        self.calls.push(DeviceCall::BindBuffer(role, handle));
        let target = BufferTarget::for_role(role);
        self.bindings.insert(target, handle);
        target
    }

    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: UsageHint) {
        self.calls.push(DeviceCall::BufferData { target, size, has_data: data.is_some(), usage });
        if self.fail_next_buffer_data.is_some() {
            if self.buffer_data_calls_before_failure == 0 {
                if let Some(error) = self.fail_next_buffer_data.take() {
                    self.raise(error);
                    return;
                }
            } else {
                self.buffer_data_calls_before_failure -= 1;
            }
        }
        let handle = self.bound(target);
        if let Some(storage) = self.buffers.get_mut(&handle) {
            storage.data = vec![0; size];
            if let Some(data) = data {
                storage.data[..data.len()].copy_from_slice(data);
            }
            storage.usage = Some(usage);
        } else {
            self.raise(NativeError::InvalidOperation);
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.calls.push(DeviceCall::BufferSubData { target, offset, len: data.len() });
        let handle = self.bound(target);
        match self.buffers.get_mut(&handle) {
            Some(storage) if offset + data.len() <= storage.data.len() => {
                storage.data[offset..offset + data.len()].copy_from_slice(data);
            }
            _ => self.raise(NativeError::InvalidValue),
        }
    }

    fn map_buffer(&mut self, target: BufferTarget, mode: MapMode) -> Option<NonNull<u8>> {
        self.calls.push(DeviceCall::MapBuffer(target, mode));
        self.map_storage(target)
    }

    fn map_buffer_range(
        &mut self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    ) -> Option<NonNull<u8>> {
        self.calls.push(DeviceCall::MapBufferRange { target, offset, length, access });
        self.map_storage(target)
    }

    fn unmap_buffer(&mut self, target: BufferTarget) -> bool {
        self.calls.push(DeviceCall::UnmapBuffer(target));
        let handle = self.bound(target);
        self.mapped.remove(&handle);
        !self.fail_unmap
    }

    fn map_buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        mode: MapMode,
    ) -> Option<NonNull<u8>> {
        self.calls.push(DeviceCall::MapBufferSubData { target, offset, length, mode });
        if self.fail_map {
            return None;
        }
        let handle = self.bound(target);
        let storage = self.buffers.get(&handle)?;
        let mut data: Box<[u8]> = match mode {
            MapMode::ReadOnly => storage.data[offset..offset + length].into(),
            MapMode::WriteOnly => vec![0; length].into_boxed_slice(),
        };
        let ptr = NonNull::new(data.as_mut_ptr())?;
        self.shadows.insert(ptr.as_ptr() as usize, Shadow { handle, offset, data });
        Some(ptr)
    }

    fn unmap_buffer_sub_data(&mut self, ptr: NonNull<u8>) {
        self.calls.push(DeviceCall::UnmapBufferSubData);
        let Some(shadow) = self.shadows.remove(&(ptr.as_ptr() as usize)) else {
            self.raise(NativeError::InvalidValue);
            return;
        };
        if let Some(storage) = self.buffers.get_mut(&shadow.handle) {
            let end = shadow.offset + shadow.data.len();
            storage.data[shadow.offset..end].copy_from_slice(&shadow.data);
        }
    }

    fn invalidate_buffer_data(&mut self, handle: NativeHandle) {
        self.calls.push(DeviceCall::InvalidateBufferData(handle));
    }

    fn clear_errors(&mut self) {
        self.calls.push(DeviceCall::ClearErrors);
        self.pending_error = NativeError::NoError;
    }

    fn get_error(&mut self) -> NativeError {
        self.calls.push(DeviceCall::GetError);
        std::mem::replace(&mut self.pending_error, NativeError::NoError)
    }

    fn object_label(&mut self, handle: NativeHandle, label: &str) {
        self.calls.push(DeviceCall::ObjectLabel(handle, label.to_string()));
        if let Some(storage) = self.buffers.get_mut(&handle) {
            storage.label = Some(label.to_string());
        }
    }

    fn forget_attached_state(&mut self, handle: NativeHandle) {
        self.calls.push(DeviceCall::ForgetAttachedState(handle));
    }
}
