/*!
# Galaxy 3D GPU Buffer

Device-independent GPU buffer resources for the Galaxy3D engine.

A buffer is split in two halves, in the same spirit as the engine's other
backend-driven resources:

- **GpuBuffer**: the generic map / unmap / update contract and lifecycle
- **BufferBackend**: the native half, implemented by **BackendBuffer**, which
  picks a mapping strategy from the device **Caps**

Buffers register with a **ResourceCache** and, when dynamic and
power-of-two sized, carry a **ScratchKey** so the **ResourceProvider** can
hand them out again instead of allocating.

All operations run on the thread that owns the device context; the device is
passed explicitly to every call that reaches native code.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod gpu;
pub mod resource;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // GPU sub-module: buffers, backend, device interface
    pub mod gpu {
        pub use crate::gpu::*;
    }

    // Resource sub-module: cache and provider
    pub mod resource {
        pub use crate::resource::*;
    }
}
