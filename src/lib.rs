//! A symbolic basic-block layout engine for a static binary rewriter.
//!
//! Given a set of basic blocks recovered from an ELF's original `.text` —
//! some touched by transformation passes, some not — plus whatever free
//! space those passes reclaim, this crate reifies implicit fallthrough
//! control flow into explicit annotations, groups blocks that must stay
//! contiguous, packs them into reclaimed holes or a fresh code region via a
//! best-fit allocator, and fills whatever is left over with trap-padding.
//!
//! ELF parsing, disassembly, CFG recovery, and instruction encoding are not
//! this crate's concern; see [`isa::IsaCapability`] and [`isa::MemoryView`]
//! for the boundary it expects an embedder to fill in.
//!
//! The entry point is [`driver::run_layout`], driven by a
//! [`session::LayoutSession`] and a [`strategy::LayoutStrategy`].

pub mod address;
pub mod alloc;
pub mod block;
pub mod diag;
pub mod driver;
pub mod error;
pub mod freespace;
pub mod group;
pub mod heap;
pub mod isa;
pub mod padding;
pub mod reify;
pub mod session;
pub mod strategy;

pub use address::{ConcreteAddress, Segment, SymbolicAddress, SymbolicAddressAllocator};
pub use alloc::{AllocatorKind, InjectedCode, Order, Seed};
pub use block::{AddressAssignedBlock, BlockStatus, ConcreteBlock, FallthroughBlock, FallthroughTag, LayoutPair, SymbolicBlock};
pub use diag::{Diagnostic, Diagnostics};
pub use driver::{run_layout, Layout};
pub use error::LayoutError;
pub use freespace::TrampolineStrategy;
pub use group::{FunctionMap, Grouping, Wto};
pub use isa::{Cond, IsaCapability, JumpKind, MemoryView};
pub use padding::PaddingBlock;
pub use session::LayoutSession;
pub use strategy::LayoutStrategy;
