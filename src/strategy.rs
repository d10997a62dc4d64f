//! Layout configuration: a plain record with three independent axes —
//! allocator, grouping, and trampoline strategy — each a runtime choice a
//! caller supplies per rewrite.

use crate::alloc::AllocatorKind;
use crate::freespace::TrampolineStrategy;
use crate::group::Grouping;

/// A complete layout configuration. The caller must supply a complete
/// strategy; there is deliberately no `Default` impl.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutStrategy {
    pub allocator: AllocatorKind,
    pub grouping: Grouping,
    pub trampolines: TrampolineStrategy,
}
