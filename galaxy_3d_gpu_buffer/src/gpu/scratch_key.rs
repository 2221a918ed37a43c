/// Scratch keys: content-independent identities for recyclable resources
///
/// A scratch key is a resource-type tag followed by a few 32-bit words.
/// Two resources with equal keys are interchangeable in the resource cache,
/// so the key must capture every property that makes them so.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU16, Ordering};
use crate::gpu::access_pattern::{AccessPattern, BufferRole};

/// Words needed to hold a `usize` byte size on this platform
const SIZE_WORDS: usize = (std::mem::size_of::<usize>() + 3) / 4;

/// Role word plus size words
const BUFFER_KEY_WORDS: usize = 1 + SIZE_WORDS;

/// Process-unique tag separating key spaces of different resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceType(u16);

static NEXT_RESOURCE_TYPE: AtomicU16 = AtomicU16::new(1);

impl ResourceType {
    /// Allocate a fresh tag
    pub fn generate() -> Self {
        let value = NEXT_RESOURCE_TYPE.fetch_add(1, Ordering::Relaxed);
        assert!(value != 0, "resource type tags exhausted");
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// Tag shared by every GPU buffer
    pub fn gpu_buffer() -> Self {
        static GPU_BUFFER: OnceLock<ResourceType> = OnceLock::new();
        *GPU_BUFFER.get_or_init(ResourceType::generate)
    }
}

/// Cache key for a recyclable GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScratchKey {
    resource_type: ResourceType,
    words: [u32; BUFFER_KEY_WORDS],
}

impl ScratchKey {
    /// Key for a dynamic buffer of `size` bytes with `role`
    ///
    /// Layout: `[role, size_lo, size_hi?]`, the high word present only on
    /// platforms where `usize` is wider than 32 bits.
    pub fn for_dynamic_buffer(size: usize, role: BufferRole) -> Self {
        let mut words = [0u32; BUFFER_KEY_WORDS];
        words[0] = role.as_u32();
        let size = size as u64;
        for (i, word) in words[1..].iter_mut().enumerate() {
            *word = (size >> (32 * i)) as u32;
        }
        Self {
            resource_type: ResourceType::gpu_buffer(),
            words,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Serialized form: type tag (LE) followed by each word (LE)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + 4 * self.words.len());
        bytes.extend_from_slice(&self.resource_type.0.to_le_bytes());
        for word in &self.words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }
}

/// Only power-of-two dynamic buffers are recycled through the cache
pub fn is_scratch_eligible(size: usize, pattern: AccessPattern) -> bool {
    pattern == AccessPattern::Dynamic && size.is_power_of_two()
}

#[cfg(test)]
#[path = "scratch_key_tests.rs"]
mod tests;
