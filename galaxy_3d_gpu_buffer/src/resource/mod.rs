//! Resource management module
//!
//! Cache registration, scratch reuse and memory accounting for GPU buffers.

pub mod memory_dump;
pub mod resource_cache;
pub mod resource_provider;

pub use memory_dump::TraceMemoryDump;
pub use resource_cache::{Budgeted, ResourceCache, ResourceId};
pub use resource_provider::{ProviderConfig, ResourceProvider};
