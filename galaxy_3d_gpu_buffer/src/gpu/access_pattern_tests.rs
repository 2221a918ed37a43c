use super::*;
use crate::gpu::caps::{Caps, TransferBufferMode};

fn caps_with_transfer(mode: TransferBufferMode) -> Caps {
    Caps { transfer_buffer_mode: mode, ..Caps::default() }
}

// ============================================================================
// Draw family
// ============================================================================

#[test]
fn test_draw_roles_use_draw_family() {
    let caps = Caps::default();
    for role in [
        BufferRole::Vertex,
        BufferRole::Index,
        BufferRole::Uniform,
        BufferRole::IndirectDraw,
        BufferRole::UploadToDevice,
    ] {
        assert_eq!(usage_hint(role, AccessPattern::Static, &caps), UsageHint::StaticDraw);
        assert_eq!(usage_hint(role, AccessPattern::Streaming, &caps), UsageHint::StreamDraw);
        assert_eq!(usage_hint(role, AccessPattern::Dynamic, &caps), DYNAMIC_DRAW_USAGE);
    }
}

#[test]
fn test_dynamic_draw_is_stream_optimized() {
    assert_eq!(DYNAMIC_DRAW_USAGE, UsageHint::StreamDraw);
}

// ============================================================================
// Read family
// ============================================================================

#[test]
fn test_readback_uses_read_family() {
    let caps = Caps::default();
    let role = BufferRole::ReadbackFromDevice;
    assert_eq!(usage_hint(role, AccessPattern::Dynamic, &caps), UsageHint::DynamicRead);
    assert_eq!(usage_hint(role, AccessPattern::Static, &caps), UsageHint::StaticRead);
    assert_eq!(usage_hint(role, AccessPattern::Streaming, &caps), UsageHint::StreamRead);
}

#[test]
fn test_readback_without_transfer_support_still_reads() {
    // Only the restricted mode degrades; the factory rejects mode None separately
    let caps = caps_with_transfer(TransferBufferMode::None);
    assert_eq!(
        usage_hint(BufferRole::ReadbackFromDevice, AccessPattern::Static, &caps),
        UsageHint::StaticRead
    );
}

// ============================================================================
// Restricted transfer mode
// ============================================================================

#[test]
fn test_restricted_transfer_mode_degrades_everything_to_draw() {
    let caps = caps_with_transfer(TransferBufferMode::RestrictedUsage);
    for role in BufferRole::ALL {
        for pattern in AccessPattern::ALL {
            let hint = usage_hint(role, pattern, &caps);
            assert!(
                matches!(hint, UsageHint::StaticDraw | UsageHint::StreamDraw),
                "{:?}/{:?} produced {:?}", role, pattern, hint
            );
        }
    }
    assert_eq!(
        usage_hint(BufferRole::ReadbackFromDevice, AccessPattern::Static, &caps),
        UsageHint::StaticDraw
    );
}

// ============================================================================
// Role helpers
// ============================================================================

#[test]
fn test_role_integers_are_distinct() {
    let mut seen = std::collections::HashSet::new();
    for role in BufferRole::ALL {
        assert!(seen.insert(role.as_u32()));
    }
}

#[test]
fn test_transfer_and_readback_predicates() {
    assert!(BufferRole::UploadToDevice.is_transfer());
    assert!(BufferRole::ReadbackFromDevice.is_transfer());
    assert!(!BufferRole::Vertex.is_transfer());
    assert!(BufferRole::ReadbackFromDevice.is_readback());
    assert!(!BufferRole::UploadToDevice.is_readback());
}
