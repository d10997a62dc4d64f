//! The ISA capability boundary and the memory-view collaborator the layout
//! engine expects an embedder to supply.
//!
//! The layout engine never reads or writes instruction bytes itself —
//! machine-code disassembly and instruction-set modeling live entirely on
//! the other side of this boundary — so the whole contract is one trait.

use smallvec::SmallVec;

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::block::{ConcreteBlock, FallthroughBlock, FallthroughTag};

/// A byte-addressable view of the original binary image, used only by the
/// reifier to resolve a fake relative address ahead of calling
/// [`IsaCapability::classify_jump`]. The core never reads instruction bytes
/// through this; it exists purely so `classify_jump` implementations that
/// need to resolve PC-relative encodings have somewhere to ask.
pub trait MemoryView {
    fn resolve_absolute(&self, addr: ConcreteAddress) -> Option<ConcreteAddress>;
}

/// Whether a jump is taken unconditionally or only sometimes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cond {
    Unconditional,
    Conditional,
}

/// What an instruction at the end of a block does to control flow.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpKind {
    /// Falls through unconditionally with no explicit transfer instruction.
    NoJump,
    /// A call to a direct, known target. Always returns, so always falls
    /// through afterward.
    DirectCall { target: SymbolicAddress },
    /// A call through a register or memory operand. Always falls through
    /// afterward.
    IndirectCall,
    /// A return instruction.
    Return { cond: Cond },
    /// A jump through a register or memory operand.
    IndirectJump { cond: Cond },
    /// A jump to an absolute target.
    AbsoluteJump { cond: Cond, target: SymbolicAddress },
    /// A jump to a PC-relative target.
    RelativeJump {
        cond: Cond,
        offset: crate::address::ByteOffset,
        target: SymbolicAddress,
    },
}

impl JumpKind {
    /// True for an unconditional return, indirect jump, absolute jump, or
    /// relative jump: control never falls through to the next instruction
    /// after one of these.
    pub fn is_unconditional_transfer(&self) -> bool {
        matches!(
            self,
            JumpKind::Return {
                cond: Cond::Unconditional
            } | JumpKind::IndirectJump {
                cond: Cond::Unconditional
            } | JumpKind::AbsoluteJump {
                cond: Cond::Unconditional,
                ..
            } | JumpKind::RelativeJump {
                cond: Cond::Unconditional,
                ..
            }
        )
    }
}

/// What the layout engine needs the (externally supplied) ISA backend to
/// answer or synthesize. `Instr` is opaque beyond what this trait exposes
/// about it.
pub trait IsaCapability {
    type Instr: Clone;

    /// Constant byte size of a decoded instruction.
    fn instruction_size(&self, instr: &Self::Instr) -> u32;

    /// Byte size of a block already at a concrete address.
    fn concrete_block_size(&self, block: &ConcreteBlock<Self::Instr>) -> u32;

    /// Upper-bound byte size of a (post-reification) symbolic block once its
    /// relative jumps are resolved against `layout_base`.
    fn symbolic_block_size(
        &self,
        block: &FallthroughBlock<Self::Instr>,
        layout_base: ConcreteAddress,
    ) -> u32;

    /// Classify the last instruction of a block. `fake_addr` is a
    /// placeholder concrete address supplied so PC-relative classification
    /// can resolve through `mem` without the block having a real address
    /// yet.
    fn classify_jump(
        &self,
        last_instr: &Self::Instr,
        mem: &dyn MemoryView,
        fake_addr: ConcreteAddress,
    ) -> JumpKind;

    /// Synthesize the trampoline redirecting `from` to `to`.
    fn make_relative_jump(&self, from: ConcreteAddress, to: ConcreteAddress) -> SmallVec<[Self::Instr; 2]>;

    /// The byte size `make_relative_jump` always produces, used for
    /// free-space accounting. Kept separate from actually calling
    /// `make_relative_jump` since accounting happens before either endpoint
    /// address is known.
    fn trampoline_jump_size(&self) -> u32;

    /// ISA-defined trap/no-op fill of exactly `n_bytes`.
    fn make_padding(&self, n_bytes: u32) -> SmallVec<[Self::Instr; 4]>;

    /// Record a fallthrough decision onto an instruction, so that whatever
    /// the backend assembler reads off `instr` afterward agrees with the
    /// engine's own bookkeeping in `FallthroughTag`.
    fn annotate_fallthrough(&self, instr: &mut Self::Instr, kind: FallthroughTag);
}
