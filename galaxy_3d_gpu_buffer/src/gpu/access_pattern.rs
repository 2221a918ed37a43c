/// Buffer roles, access patterns and the usage hint policy

use crate::gpu::caps::{Caps, TransferBufferMode};

/// Semantic purpose of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// Vertex data
    Vertex,
    /// Index data
    Index,
    /// Uniform block
    Uniform,
    /// Indirect draw arguments
    IndirectDraw,
    /// CPU-to-GPU staging
    UploadToDevice,
    /// GPU-to-CPU staging
    ReadbackFromDevice,
}

impl BufferRole {
    /// Every role, in declaration order
    pub const ALL: [BufferRole; 6] = [
        BufferRole::Vertex,
        BufferRole::Index,
        BufferRole::Uniform,
        BufferRole::IndirectDraw,
        BufferRole::UploadToDevice,
        BufferRole::ReadbackFromDevice,
    ];

    /// Stable small integer packed into scratch keys
    pub fn as_u32(&self) -> u32 {
        match self {
            BufferRole::Vertex => 0,
            BufferRole::Index => 1,
            BufferRole::Uniform => 2,
            BufferRole::IndirectDraw => 3,
            BufferRole::UploadToDevice => 4,
            BufferRole::ReadbackFromDevice => 5,
        }
    }

    /// Upload or readback staging buffer
    pub fn is_transfer(&self) -> bool {
        matches!(self, BufferRole::UploadToDevice | BufferRole::ReadbackFromDevice)
    }

    /// Readback buffers are never written from the CPU and are mapped read-only
    pub fn is_readback(&self) -> bool {
        *self == BufferRole::ReadbackFromDevice
    }
}

/// Expected mutation frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPattern {
    Static,
    Dynamic,
    Streaming,
}

impl AccessPattern {
    pub const ALL: [AccessPattern; 3] = [
        AccessPattern::Static,
        AccessPattern::Dynamic,
        AccessPattern::Streaming,
    ];
}

/// Usage hint passed to the device with every storage allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageHint {
    StaticDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
    StreamRead,
}

/// Hint used for dynamic draw buffers.
///
/// Stream-draw rather than dynamic-draw: some command-buffer proxies turn
/// stream-draw vertex buffers into client-side arrays on tilers.
pub const DYNAMIC_DRAW_USAGE: UsageHint = UsageHint::StreamDraw;

fn draw_usage(pattern: AccessPattern) -> UsageHint {
    match pattern {
        AccessPattern::Dynamic => DYNAMIC_DRAW_USAGE,
        AccessPattern::Static => UsageHint::StaticDraw,
        AccessPattern::Streaming => UsageHint::StreamDraw,
    }
}

fn read_usage(pattern: AccessPattern) -> UsageHint {
    match pattern {
        AccessPattern::Dynamic => UsageHint::DynamicRead,
        AccessPattern::Static => UsageHint::StaticRead,
        AccessPattern::Streaming => UsageHint::StreamRead,
    }
}

/// Map `(role, pattern)` to the device usage hint.
///
/// Readback buffers use the read family; every other role uses the draw
/// family. Devices in `TransferBufferMode::RestrictedUsage` only understand
/// draw hints, so everything degrades to the draw family there.
pub fn usage_hint(role: BufferRole, pattern: AccessPattern, caps: &Caps) -> UsageHint {
    if caps.transfer_buffer_mode == TransferBufferMode::RestrictedUsage {
        return draw_usage(pattern);
    }
    match role {
        BufferRole::Vertex
        | BufferRole::Index
        | BufferRole::IndirectDraw
        | BufferRole::UploadToDevice
        | BufferRole::Uniform => draw_usage(pattern),
        BufferRole::ReadbackFromDevice => read_usage(pattern),
    }
}

#[cfg(test)]
#[path = "access_pattern_tests.rs"]
mod tests;
