/// Device capability set consulted by buffer backends
///
/// Queried once when a buffer is constructed. The backend copies the
/// strategies it needs, so a buffer never re-dispatches on capabilities.

/// How host-visible pointers into buffer storage are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapStrategy {
    /// No mapping support: `map()` always yields `None`
    Unsupported,
    /// Whole-buffer map with read-only or write-only access
    WholeBufferMap,
    /// Ranged map over `[0, size)` with an access bitmask
    RangeMap,
    /// Sub-data map into a host shadow copy, flushed back on unmap
    ShadowCopyMap,
}

impl MapStrategy {
    /// Every strategy, in declaration order
    pub const ALL: [MapStrategy; 4] = [
        MapStrategy::Unsupported,
        MapStrategy::WholeBufferMap,
        MapStrategy::RangeMap,
        MapStrategy::ShadowCopyMap,
    ];
}

/// How prior contents are discarded before a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidateStrategy {
    /// Skip invalidation
    None,
    /// Re-issue the full-size allocation with no initial data
    NullDataReallocate,
    /// Dedicated invalidate call by handle (no bind required)
    ExplicitInvalidate,
}

impl InvalidateStrategy {
    /// Every strategy, in declaration order
    pub const ALL: [InvalidateStrategy; 3] = [
        InvalidateStrategy::None,
        InvalidateStrategy::NullDataReallocate,
        InvalidateStrategy::ExplicitInvalidate,
    ];
}

/// Transfer (upload / readback) buffer support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferBufferMode {
    /// Transfer buffers cannot be created
    None,
    /// Full support, including read usage hints
    Standard,
    /// Legacy path: transfer buffers exist but only draw usage hints are accepted
    RestrictedUsage,
}

/// Capability flags reported by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caps {
    pub map_strategy: MapStrategy,
    pub invalidate_strategy: InvalidateStrategy,
    pub transfer_buffer_mode: TransferBufferMode,
    /// Object labels are accepted by the device
    pub debug_support: bool,
    /// Allocation calls are issued without surrounding error queries
    pub skip_error_checks: bool,
}

impl Caps {
    /// Whether upload / readback buffers can be created at all
    pub fn supports_transfer_buffers(&self) -> bool {
        self.transfer_buffer_mode != TransferBufferMode::None
    }
}

impl Default for Caps {
    fn default() -> Self {
        Self {
            map_strategy: MapStrategy::RangeMap,
            invalidate_strategy: InvalidateStrategy::ExplicitInvalidate,
            transfer_buffer_mode: TransferBufferMode::Standard,
            debug_support: true,
            skip_error_checks: false,
        }
    }
}
