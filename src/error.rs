//! Failure modes of the layout engine.
//!
//! All fatal: on any of these the pipeline aborts immediately, discards
//! partial state, and returns whatever [`crate::diag::Diagnostics`] had
//! accumulated so far alongside the error. One variant per failure kind,
//! with `#[error("...")]` messages that name the offending address/block
//! directly.

use thiserror::Error;

use crate::address::{ConcreteAddress, SymbolicAddress};

/// Fatal conditions that abort a layout run. Non-fatal conditions — a
/// chunk too big for the largest hole, say — are not errors; they trigger
/// bump-allocation and are recorded as [`crate::diag::Diagnostic`]s
/// instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Free-space spans overlap after collection; an upstream inconsistency
    /// in the block model, not something this crate can recover from.
    #[error("free spans overlap: ({a}, len {la}) and ({b}, len {lb})")]
    OverlappingFreeBlocks {
        a: ConcreteAddress,
        la: u32,
        b: ConcreteAddress,
        lb: u32,
    },

    /// Reification could not find the symbolic block at the post-block
    /// address for a non-unconditional-terminator block.
    #[error("block {0} has no layout successor to fall through to, and its last instruction is not an unconditional transfer")]
    MissingFallthroughSuccessor(SymbolicAddress),

    /// A block with no instructions reached reification.
    #[error("block {0} has no instructions")]
    EmptyBlock(SymbolicAddress),

    /// Grouping yielded a chunk whose status logic tried to treat an
    /// `Immutable` pair as modifiable.
    #[error("block {0} is marked immutable but was treated as modifiable")]
    ImmutableBlockModified(SymbolicAddress),

    /// The final address-tagging step found a block missing from the
    /// allocator's output.
    #[error("block {0} was never assigned a concrete address")]
    UnassignedSymbolicBlock(SymbolicAddress),
}
