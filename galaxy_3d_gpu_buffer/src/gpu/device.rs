/// Native device call surface consumed by buffer backends
///
/// A `Device` is the device context: it reports capabilities and issues
/// native calls synchronously on its owning thread. Backends receive it as an
/// explicit `&mut dyn Device` argument on every operation.

use std::ptr::NonNull;
use bitflags::bitflags;
use crate::gpu::access_pattern::{BufferRole, UsageHint};
use crate::gpu::caps::Caps;

/// Native buffer name. `0` is never a valid buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NativeHandle(pub u32);

impl NativeHandle {
    pub const INVALID: NativeHandle = NativeHandle(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

/// Binding point a buffer is attached to for the duration of a native call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
    Uniform,
    DrawIndirect,
    PixelUnpack,
    PixelPack,
}

impl BufferTarget {
    /// Conventional target for a role
    pub fn for_role(role: BufferRole) -> Self {
        match role {
            BufferRole::Vertex => BufferTarget::Array,
            BufferRole::Index => BufferTarget::ElementArray,
            BufferRole::Uniform => BufferTarget::Uniform,
            BufferRole::IndirectDraw => BufferTarget::DrawIndirect,
            BufferRole::UploadToDevice => BufferTarget::PixelUnpack,
            BufferRole::ReadbackFromDevice => BufferTarget::PixelPack,
        }
    }
}

/// Access for whole-buffer and sub-data maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapMode {
    ReadOnly,
    WriteOnly,
}

bitflags! {
    /// Access bits for ranged maps
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapAccess: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const INVALIDATE_BUFFER = 1 << 3;
    }
}

/// Error reported by the device after a native call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeError {
    NoError,
    OutOfMemory,
    InvalidValue,
    InvalidOperation,
}

/// Native call surface
pub trait Device {
    /// Capability flags
    fn caps(&self) -> &Caps;

    /// Restore any state another subsystem may have changed behind our back.
    /// Called before every bind.
    fn handle_dirty_context(&mut self) {}

    /// Create a buffer name, `NativeHandle::INVALID` on failure
    fn create_buffer(&mut self) -> NativeHandle;

    fn delete_buffer(&mut self, handle: NativeHandle);

    /// Bind `handle` to the target appropriate for `role` and return that target
    fn bind_buffer(&mut self, role: BufferRole, handle: NativeHandle) -> BufferTarget;

    /// (Re)allocate storage of the buffer bound to `target`
    fn buffer_data(&mut self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: UsageHint);

    /// Write `data` at `offset` into the buffer bound to `target`
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: usize, data: &[u8]);

    fn map_buffer(&mut self, target: BufferTarget, mode: MapMode) -> Option<NonNull<u8>>;

    fn map_buffer_range(
        &mut self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
    ) -> Option<NonNull<u8>>;

    /// Returns `false` when the device reports the mapped contents were lost
    fn unmap_buffer(&mut self, target: BufferTarget) -> bool;

    /// Map into a host shadow copy of `[offset, offset + length)`
    fn map_buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        mode: MapMode,
    ) -> Option<NonNull<u8>>;

    /// Flush the shadow copy at `ptr` back to the device and free it
    fn unmap_buffer_sub_data(&mut self, ptr: NonNull<u8>);

    /// Discard contents by name
    fn invalidate_buffer_data(&mut self, handle: NativeHandle);

    /// Discard pending errors (and remember any out-of-memory among them)
    fn clear_errors(&mut self);

    /// Fetch the error raised since the last `clear_errors`
    fn get_error(&mut self) -> NativeError;

    fn object_label(&mut self, handle: NativeHandle, label: &str);

    /// A subsystem had cached state keyed on `handle`; the buffer is going away
    fn forget_attached_state(&mut self, _handle: NativeHandle) {}
}
