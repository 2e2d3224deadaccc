//! Crate-wide error type.
//!
//! Every fallible operation reports failure through its return value.
//! Allocation failure inside the paint path is the one exception: it
//! degrades to direct opaque painting instead of surfacing an error,
//! because a partially wrong frame beats a frozen renderer.

use thiserror_no_std::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A `WidgetId` refers to a slot that was freed or reused.
    #[error("widget handle is stale or invalid")]
    InvalidHandle,

    /// Region table mutation attempted after the first allocation.
    #[error("memory regions are locked after first allocation")]
    RegionsLocked,

    /// No assigned region can satisfy the request.
    #[error("region allocator exhausted")]
    OutOfMemory,

    /// Out-of-range index, empty region table, or similar caller mistake.
    #[error("invalid argument")]
    InvalidArgument,
}
