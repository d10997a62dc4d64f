//! The block-variant progression and the `(original, derived, status)`
//! triple the driver carries every block around in.
//!
//! Each variant enriches the previous one: concrete bytes -> symbolic
//! instructions -> fallthrough tags -> a concrete address.

use smallvec::SmallVec;

use crate::address::{ConcreteAddress, SymbolicAddress};

/// Typical instruction count per basic block; sized so the common case never
/// spills to the heap.
pub const INLINE_INSTRS: usize = 8;

/// An instruction list that stays inline for blocks of ordinary size.
pub type InstrVec<I> = SmallVec<[I; INLINE_INSTRS]>;

/// A contiguous byte range at a known concrete address, owning an ordered
/// sequence of decoded instructions.
///
/// Invariant: the sum of instruction sizes equals the block's
/// size. Callers can check this with [`ConcreteBlock::debug_assert_sized`];
/// it is not enforced on every access since instruction sizing is a
/// property of the (external) ISA capability, not of this type.
#[derive(Clone)]
pub struct ConcreteBlock<I> {
    pub address: ConcreteAddress,
    pub instructions: InstrVec<I>,
}

impl<I> ConcreteBlock<I> {
    pub fn new(address: ConcreteAddress, instructions: InstrVec<I>) -> Self {
        Self {
            address,
            instructions,
        }
    }

    /// Debug-only check that the block's instruction sizes sum to its
    /// reported byte size.
    pub fn debug_assert_sized(&self, block_size: u32, instruction_size: impl Fn(&I) -> u32) {
        if cfg!(debug_assertions) {
            let sum: u32 = self.instructions.iter().map(instruction_size).sum();
            debug_assert_eq!(
                sum, block_size,
                "concrete block at {} has instructions summing to {sum} bytes but a block size of {block_size}",
                self.address
            );
        }
    }
}

/// An ordered sequence of instructions whose branch targets reference
/// symbolic addresses, plus the original concrete block it was derived
/// from.
#[derive(Clone)]
pub struct SymbolicBlock<I> {
    pub origin: ConcreteBlock<I>,
    pub instructions: InstrVec<I>,
}

/// Tags a single instruction with whether control can fall through to it
/// from the previous instruction's absence of an unconditional transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FallthroughTag {
    NoFallthrough,
    Fallthrough(SymbolicAddress),
}

/// A list of per-instruction fallthrough tags, parallel to a block's
/// instruction list.
pub type TagVec = SmallVec<[FallthroughTag; INLINE_INSTRS]>;

/// A symbolic block whose last instruction (and only its last instruction,
/// once reification has run) carries an explicit fallthrough annotation.
#[derive(Clone)]
pub struct FallthroughBlock<I> {
    pub origin: ConcreteBlock<I>,
    pub instructions: InstrVec<I>,
    pub fallthrough_tags: TagVec,
}

impl<I> FallthroughBlock<I> {
    /// True once reification has run and, for a block whose final
    /// instruction is not an unconditional transfer, exactly one explicit
    /// fallthrough annotation sits on that last instruction.
    pub fn has_single_trailing_annotation(&self) -> bool {
        match self.fallthrough_tags.split_last() {
            Some((_last, rest)) => rest.iter().all(|t| *t == FallthroughTag::NoFallthrough),
            None => false,
        }
    }
}

/// A fallthrough block plus the final concrete address it was assigned and
/// the byte size reserved for it there.
#[derive(Clone)]
pub struct AddressAssignedBlock<I> {
    pub block: FallthroughBlock<I>,
    pub address: ConcreteAddress,
    pub reserved_size: u32,
}

/// Whether a transformation pass touched a block, and if so, how the layout
/// engine should treat its original bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockStatus {
    /// Pass did not touch it; keep in place, do not relocate.
    Unmodified,
    /// Pass altered it; must be relocated.
    Modified,
    /// Pass marked it as not relocatable; keep in place even if touched.
    Immutable,
    /// Its original bytes will be completely replaced by other blocks'
    /// redirections; space fully reclaimed.
    Subsumed,
}

/// The `(original concrete block, derived block, status)` triple every
/// block travels as through the layout pipeline, keyed by its own symbolic
/// identity.
#[derive(Clone)]
pub struct LayoutPair<I> {
    pub id: SymbolicAddress,
    pub derived: SymbolicBlock<I>,
    pub status: BlockStatus,
}

impl<I> LayoutPair<I> {
    pub fn original(&self) -> &ConcreteBlock<I> {
        &self.derived.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Segment;
    use smallvec::smallvec;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct TestInstr(u32);

    #[test]
    fn single_trailing_annotation_accepts_all_no_fallthrough() {
        let seg = Segment::new(0);
        let addr = ConcreteAddress::new(seg, 0);
        let block = FallthroughBlock {
            origin: ConcreteBlock::new(addr, smallvec![TestInstr(0), TestInstr(1)]),
            instructions: smallvec![TestInstr(0), TestInstr(1)],
            fallthrough_tags: smallvec![FallthroughTag::NoFallthrough, FallthroughTag::NoFallthrough],
        };
        assert!(block.has_single_trailing_annotation());
    }

    #[test]
    fn single_trailing_annotation_rejects_annotation_on_non_last() {
        let seg = Segment::new(0);
        let addr = ConcreteAddress::new(seg, 0);
        let sym = crate::address::SymbolicAddressAllocator::new().alloc();
        let block = FallthroughBlock {
            origin: ConcreteBlock::new(addr, smallvec![TestInstr(0), TestInstr(1)]),
            instructions: smallvec![TestInstr(0), TestInstr(1)],
            fallthrough_tags: smallvec![FallthroughTag::Fallthrough(sym), FallthroughTag::NoFallthrough],
        };
        assert!(!block.has_single_trailing_annotation());
    }
}
