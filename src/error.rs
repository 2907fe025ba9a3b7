//! Error types for famfair.

use thiserror::Error;

use super::*;

/// Errors raised by instance construction, protocol runs and the search.
#[derive(Debug, Error)]
pub enum FairError {
    /// Malformed input detected while building an instance.
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    /// A protocol produced bundles that are not a strict partition of the
    /// items. This is a protocol bug, never a user error.
    #[error("{protocol} produced an allocation that is not a partition of {} items: {allocation:?}", .instance.item_count())]
    PartitionInvariantViolation {
        protocol: ProtocolKind,
        instance: Box<Instance>,
        allocation: Allocation,
    },

    #[error("{protocol} does not support {count} families")]
    UnsupportedFamilyCount { protocol: ProtocolKind, count: usize },

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),
}
