/// GPU module - buffer resource, backend and device interfaces

// Module declarations
pub mod caps;
pub mod device;
pub mod access_pattern;
pub mod scratch_key;
pub mod buffer;
pub mod backend_buffer;

// Re-exports
pub use caps::*;
pub use device::*;
pub use access_pattern::*;
pub use scratch_key::*;
pub use buffer::*;
pub use backend_buffer::*;

// Mock device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
