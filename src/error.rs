use crate::alloc::AllocError;
use thiserror::Error;

/// Outcome of a failed table operation. Every call reports its own outcome;
/// nothing carries over from a previous call.
#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum TableError {
    /// A heap request was refused; nothing was stored.
    #[error("allocation failed: {0}")]
    Allocation(#[from] AllocError),
    /// The insert went through but the bucket array could not grow. The next
    /// insert of a new key tries again.
    #[error("entry stored, resize skipped: {0}")]
    ResizeSkipped(AllocError),
    #[error("key not found")]
    NotFound,
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),
}

impl TableError {
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Self::Allocation(_) | Self::ResizeSkipped(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
