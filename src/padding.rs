//! Padding emission.
//!
//! Turns whatever the allocator left in the heap into synthetic blocks
//! filled with ISA-defined trap bytes, so a stray control transfer into
//! reclaimed-but-unused space lands on a trap instead of the tail of a
//! partially overwritten instruction.

use crate::address::ConcreteAddress;
use crate::block::ConcreteBlock;
use crate::freespace::FreeSpan;
use crate::heap::FreeSpaceHeap;
use crate::isa::IsaCapability;

/// A synthetic filler block at a reclaimed address, never part of the
/// original symbolic block set.
#[derive(Clone)]
pub struct PaddingBlock<I> {
    pub address: ConcreteAddress,
    pub instructions: crate::block::InstrVec<I>,
}

/// Drain `heap` into padding blocks, ordered by ascending address.
pub fn drain_to_padding<I, C: IsaCapability<Instr = I>>(heap: &mut FreeSpaceHeap, isa: &C) -> Vec<PaddingBlock<I>> {
    let mut spans: Vec<FreeSpan> = heap.drain();
    spans.sort_unstable_by_key(|s| s.addr.value());
    spans
        .into_iter()
        .map(|span| PaddingBlock {
            address: span.addr,
            instructions: isa.make_padding(span.size),
        })
        .collect()
}

impl<I: Clone> From<PaddingBlock<I>> for ConcreteBlock<I> {
    fn from(padding: PaddingBlock<I>) -> Self {
        ConcreteBlock::new(padding.address, padding.instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Segment;
    use crate::isa::{Cond, JumpKind, MemoryView};
    use smallvec::{smallvec, SmallVec};

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct TestInstr;

    struct TestIsa;
    impl IsaCapability for TestIsa {
        type Instr = TestInstr;
        fn instruction_size(&self, _: &Self::Instr) -> u32 {
            1
        }
        fn concrete_block_size(&self, b: &ConcreteBlock<Self::Instr>) -> u32 {
            b.instructions.len() as u32
        }
        fn symbolic_block_size(
            &self,
            b: &crate::block::FallthroughBlock<Self::Instr>,
            _layout_base: ConcreteAddress,
        ) -> u32 {
            b.instructions.len() as u32
        }
        fn classify_jump(&self, _: &Self::Instr, _: &dyn MemoryView, _: ConcreteAddress) -> JumpKind {
            JumpKind::Return {
                cond: Cond::Unconditional,
            }
        }
        fn make_relative_jump(&self, _: ConcreteAddress, _: ConcreteAddress) -> SmallVec<[Self::Instr; 2]> {
            smallvec![]
        }
        fn trampoline_jump_size(&self) -> u32 {
            1
        }
        fn make_padding(&self, n_bytes: u32) -> SmallVec<[Self::Instr; 4]> {
            (0..n_bytes).map(|_| TestInstr).collect()
        }
        fn annotate_fallthrough(&self, _: &mut Self::Instr, _: crate::block::FallthroughTag) {}
    }

    #[test]
    fn drains_in_ascending_address_order() {
        let seg = Segment::new(0);
        let mut heap = FreeSpaceHeap::from_spans(vec![
            FreeSpan {
                addr: ConcreteAddress::new(seg, 0x1219),
                size: 7,
            },
            FreeSpan {
                addr: ConcreteAddress::new(seg, 0x102D),
                size: 3,
            },
            FreeSpan {
                addr: ConcreteAddress::new(seg, 0x110F),
                size: 1,
            },
        ]);
        let padding = drain_to_padding(&mut heap, &TestIsa);
        let addrs: Vec<u64> = padding.iter().map(|p| p.address.value()).collect();
        assert_eq!(addrs, vec![0x102D, 0x110F, 0x1219]);
        assert_eq!(padding[2].instructions.len(), 7);
    }
}
