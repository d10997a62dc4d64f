//! Fallthrough reification: turning implicit fallthrough control flow into
//! an explicit annotation on the last instruction of a block.
//!
//! There is no layout order yet to consult here — blocks are still
//! symbolic — so the "successor" has to be recovered from where each block
//! originally sat in the pre-rewrite binary instead of from an assigned
//! position.

use rustc_hash::FxHashMap;

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::block::{FallthroughBlock, FallthroughTag, LayoutPair};
use crate::error::LayoutError;
use crate::isa::{IsaCapability, MemoryView};

/// Maps each original block's start address to its symbolic identity. A
/// block's fallthrough successor is whichever block started at the address
/// immediately following it, so reification looks this map up by that
/// following address. Built once over *all* input pairs — modified and
/// unmodified both contribute, since a modified block may fall through into
/// an unmodified one.
pub fn build_successor_map<I, C: IsaCapability<Instr = I>>(
    _isa: &C,
    pairs: &[LayoutPair<I>],
) -> FxHashMap<ConcreteAddress, SymbolicAddress> {
    let mut map = FxHashMap::default();
    map.reserve(pairs.len());
    for pair in pairs {
        let origin = pair.original();
        map.insert(origin.address, pair.id);
    }
    map
}

/// Reify one modifiable pair into a [`FallthroughBlock`].
///
/// `mem` and the block's own original address stand in for the fake
/// relative address the memory-view collaborator resolves against; the
/// reifier itself never reads bytes through `mem`, it only forwards it to
/// [`IsaCapability::classify_jump`].
pub fn reify_block<I, C: IsaCapability<Instr = I>>(
    isa: &C,
    mem: &dyn MemoryView,
    successors: &FxHashMap<ConcreteAddress, SymbolicAddress>,
    pair: &LayoutPair<I>,
) -> Result<FallthroughBlock<I>, LayoutError> {
    use crate::block::BlockStatus;

    if pair.status == BlockStatus::Immutable {
        return Err(LayoutError::ImmutableBlockModified(pair.id));
    }

    let origin = pair.original().clone();
    let mut instructions = pair.derived.instructions.clone();

    let Some(last) = instructions.last() else {
        return Err(LayoutError::EmptyBlock(pair.id));
    };

    let mut tags = crate::block::TagVec::with_capacity(instructions.len());
    for _ in 0..instructions.len() {
        tags.push(FallthroughTag::NoFallthrough);
    }

    let kind = isa.classify_jump(last, mem, origin.address);

    if !kind.is_unconditional_transfer() {
        let post_addr = origin.address.offset(isa.concrete_block_size(&origin) as i64);
        let successor = successors
            .get(&post_addr)
            .ok_or(LayoutError::MissingFallthroughSuccessor(pair.id))?;
        *tags.last_mut().expect("checked non-empty above") = FallthroughTag::Fallthrough(*successor);
    }

    for (instr, tag) in instructions.iter_mut().zip(tags.iter()) {
        isa.annotate_fallthrough(instr, *tag);
    }

    Ok(FallthroughBlock {
        origin,
        instructions,
        fallthrough_tags: tags,
    })
}

/// Reify every pair in `modifiable`, in order, failing on the first error.
pub fn reify_all<I, C: IsaCapability<Instr = I>>(
    isa: &C,
    mem: &dyn MemoryView,
    successors: &FxHashMap<ConcreteAddress, SymbolicAddress>,
    modifiable: &[LayoutPair<I>],
) -> Result<Vec<FallthroughBlock<I>>, LayoutError> {
    modifiable
        .iter()
        .map(|pair| reify_block(isa, mem, successors, pair))
        .collect()
}
