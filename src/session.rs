//! The owning session object for one layout run.
//!
//! All state for one rewrite — the symbolic-address counter, the input
//! block set, and the diagnostics log — is owned here and mutated in
//! place. One session corresponds to one rewrite; nothing in it is shared
//! across sessions.

use crate::address::{SymbolicAddress, SymbolicAddressAllocator};
use crate::block::{BlockStatus, ConcreteBlock, InstrVec, LayoutPair, SymbolicBlock};
use crate::diag::Diagnostics;

/// Owns everything that persists for the duration of one layout run: the
/// monotonic symbolic-address source, the ingested block set, and the
/// diagnostics log.
pub struct LayoutSession<I> {
    addresses: SymbolicAddressAllocator,
    pairs: Vec<LayoutPair<I>>,
    pub diagnostics: Diagnostics,
}

impl<I> Default for LayoutSession<I> {
    fn default() -> Self {
        Self {
            addresses: SymbolicAddressAllocator::new(),
            pairs: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }
}

impl<I> LayoutSession<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one original block with the status a transformation pass
    /// gave it, allocating its symbolic identity. `derived_instructions` is
    /// the (possibly unchanged) instruction list to carry forward.
    pub fn ingest(&mut self, original: ConcreteBlock<I>, derived_instructions: InstrVec<I>, status: BlockStatus) -> SymbolicAddress {
        let id = self.addresses.alloc();
        self.pairs.push(LayoutPair {
            id,
            derived: SymbolicBlock {
                origin: original,
                instructions: derived_instructions,
            },
            status,
        });
        id
    }

    pub fn pairs(&self) -> &[LayoutPair<I>] {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut [LayoutPair<I>] {
        &mut self.pairs
    }
}
