//! The layout driver: sequences grouping, reification, free-space
//! accounting, allocation, and padding into one pass.
//!
//! There's no fixpoint iteration here — this crate doesn't resize branches
//! after placement, since sizes are upper bounds computed once via
//! `symbolic_block_size` — just a fixed pipeline: group, split, reify,
//! account, coalesce, order, allocate, pad.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::alloc::{self, AllocatorKind, InjectedCode};
use crate::block::{AddressAssignedBlock, FallthroughBlock, FallthroughTag, LayoutPair, TagVec};
use crate::error::LayoutError;
use crate::freespace;
use crate::group::{self, ClassifiedChunk, Chunk, FunctionMap, Wto};
use crate::heap::FreeSpaceHeap;
use crate::isa::{IsaCapability, MemoryView};
use crate::padding::{self, PaddingBlock};
use crate::reify;
use crate::strategy::LayoutStrategy;

/// The final result of a layout run.
pub struct Layout<I> {
    /// Same traversal shape as the input block set, now address-assigned.
    pub program_block_layout: Vec<AddressAssignedBlock<I>>,
    /// Ordered by ascending address.
    pub layout_padding_blocks: Vec<PaddingBlock<I>>,
    /// `(symbolic_addr, concrete_addr, bytes)` triples for injected code.
    pub injected_block_layout: Vec<(SymbolicAddress, ConcreteAddress, Vec<u8>)>,
}

fn vacuous_fallthrough_block<I: Clone>(pair: &LayoutPair<I>) -> FallthroughBlock<I> {
    let origin = pair.original().clone();
    let instructions = pair.derived.instructions.clone();
    let tags: TagVec = instructions.iter().map(|_| FallthroughTag::NoFallthrough).collect();
    FallthroughBlock {
        origin,
        instructions,
        fallthrough_tags: tags,
    }
}

/// Run the full layout pipeline over every block currently held by
/// `session`.
#[allow(clippy::too_many_arguments)]
pub fn run_layout<I: Clone, C: IsaCapability<Instr = I>>(
    isa: &C,
    mem: &dyn MemoryView,
    session: &mut crate::session::LayoutSession<I>,
    strategy: &LayoutStrategy,
    layout_base: ConcreteAddress,
    wto: Option<&Wto>,
    function_map: Option<&FunctionMap>,
    injected: &[InjectedCode],
) -> Result<Layout<I>, LayoutError> {
    // The successor map needs every pair's original position, so it is
    // built before grouping splits anything off, and before free-space
    // accounting can flip any pair's status to `Subsumed`.
    let successors = reify::build_successor_map(isa, session.pairs());

    let chunks = group::group_blocks(strategy.grouping, session.pairs(), wto, function_map)?;

    let pairs_by_id: FxHashMap<SymbolicAddress, &LayoutPair<I>> =
        session.pairs().iter().map(|p| (p.id, p)).collect();

    let mut modifiable_chunks: Vec<Chunk> = Vec::new();
    let mut in_place: Vec<SymbolicAddress> = Vec::new();

    for chunk in &chunks {
        match group::classify_chunk(chunk, &pairs_by_id) {
            ClassifiedChunk::Unmodified(ids) => in_place.extend(ids),
            ClassifiedChunk::Modifiable {
                modifiable,
                immutable_in_place,
            } => {
                in_place.extend(immutable_in_place);
                if !modifiable.is_empty() {
                    modifiable_chunks.push(Chunk { blocks: modifiable });
                }
            }
        }
    }

    let modifiable_ids: FxHashSet<SymbolicAddress> =
        modifiable_chunks.iter().flat_map(|c| c.blocks.iter().copied()).collect();

    let mut reified: FxHashMap<SymbolicAddress, FallthroughBlock<I>> = FxHashMap::default();
    for (&id, pair) in pairs_by_id.iter().filter(|(id, _)| modifiable_ids.contains(id)) {
        reified.insert(id, reify::reify_block(isa, mem, &successors, pair)?);
    }
    drop(pairs_by_id);

    // Free-space accounting mutates status (Modified -> Subsumed) for
    // whole-function donors, so it runs against the session's own pairs.
    let donors = freespace::whole_function_donors(strategy.trampolines, session.pairs(), function_map, isa);
    let spans = freespace::build_preheap(session.pairs_mut(), &donors, isa, &mut session.diagnostics);
    let coalesced = freespace::coalesce(spans)?;
    let mut heap = FreeSpaceHeap::from_spans(coalesced);

    let sizes: FxHashMap<SymbolicAddress, u32> = reified
        .iter()
        .map(|(id, block)| (*id, isa.symbolic_block_size(block, layout_base)))
        .collect();

    let ordered = alloc::order_chunks(&strategy.allocator, modifiable_chunks, |chunk| {
        chunk.blocks.iter().map(|id| sizes[id]).sum()
    });

    let use_heap = !matches!(strategy.allocator, AllocatorKind::Parallel);
    let mut cursor = layout_base;
    let result = alloc::allocate(
        &ordered,
        &sizes,
        injected,
        &mut heap,
        &mut cursor,
        use_heap,
        &mut session.diagnostics,
    );

    let padding_blocks = padding::drain_to_padding(&mut heap, isa);

    let mut assigned: FxHashMap<SymbolicAddress, AddressAssignedBlock<I>> = FxHashMap::default();
    for (id, block) in reified {
        let (address, reserved_size) = *result
            .blocks
            .get(&id)
            .ok_or(LayoutError::UnassignedSymbolicBlock(id))?;
        assigned.insert(
            id,
            AddressAssignedBlock {
                block,
                address,
                reserved_size,
            },
        );
    }

    let pairs_by_id: FxHashMap<SymbolicAddress, &LayoutPair<I>> =
        session.pairs().iter().map(|p| (p.id, p)).collect();
    for id in in_place {
        let pair = pairs_by_id[&id];
        assigned.insert(
            id,
            AddressAssignedBlock {
                block: vacuous_fallthrough_block(pair),
                address: pair.original().address,
                reserved_size: 0,
            },
        );
    }
    drop(pairs_by_id);

    // Preserve input traversal order: same shape as the input block set.
    let mut program_block_layout = Vec::with_capacity(session.pairs().len());
    for pair in session.pairs() {
        let block = assigned
            .remove(&pair.id)
            .ok_or(LayoutError::UnassignedSymbolicBlock(pair.id))?;
        program_block_layout.push(block);
    }

    let injected_block_layout = injected
        .iter()
        .map(|item| {
            let addr = result.injected[&item.symbol];
            (item.symbol, addr, item.bytes.clone())
        })
        .collect();

    Ok(Layout {
        program_block_layout,
        layout_padding_blocks: padding_blocks,
        injected_block_layout,
    })
}
