//! The allocator: best-fit from the free-space heap, or bump-allocation into
//! a fresh code region.
//!
//! Each chunk gets the next free offset, whether that offset comes from a
//! heap extraction or a monotonic cursor into the fresh region.

use rustc_hash::FxHashMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::diag::{Diagnostic, Diagnostics};
use crate::freespace::FreeSpan;
use crate::group::Chunk;
use crate::heap::FreeSpaceHeap;

/// A 256-bit PRNG seed, so `RandomOrder` is deterministic and portable
/// across implementations given the same seed.
pub type Seed = [u8; 32];

/// How chunks are ordered before allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Order {
    SortedOrder,
    RandomOrder(Seed),
}

/// Which allocator strategy places chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Input order preserved; the heap is never consulted, every chunk
    /// bump-allocates into the fresh region.
    Parallel,
    Compact(Order),
}

/// A raw byte payload placed at a fresh symbolic address after all blocks.
#[derive(Clone, Debug)]
pub struct InjectedCode {
    pub symbol: SymbolicAddress,
    pub bytes: Vec<u8>,
}

/// Order `chunks` per `kind`. `chunk_size` must return the same total size
/// later used to allocate the chunk, so ordering and allocation never
/// disagree about how big a chunk is.
pub fn order_chunks(kind: &AllocatorKind, mut chunks: Vec<Chunk>, chunk_size: impl Fn(&Chunk) -> u32) -> Vec<Chunk> {
    match kind {
        AllocatorKind::Parallel => chunks,
        AllocatorKind::Compact(Order::SortedOrder) => {
            chunks.sort_by(|a, b| chunk_size(b).cmp(&chunk_size(a)));
            chunks
        }
        AllocatorKind::Compact(Order::RandomOrder(seed)) => {
            let mut rng = ChaCha8Rng::from_seed(*seed);
            chunks.shuffle(&mut rng);
            chunks
        }
    }
}

/// Assign addresses to one chunk's blocks, each already sized by the
/// caller. Returns `(assignments, reused_bytes)`; `assignments` is parallel
/// to `members` and gives each block's concrete address and reserved size
/// (equal to its own requested size; the chunk's total only matters for
/// choosing where it lands).
fn allocate_chunk(
    heap: &mut FreeSpaceHeap,
    cursor: &mut ConcreteAddress,
    use_heap: bool,
    members: &[(SymbolicAddress, u32)],
    diagnostics: &mut Diagnostics,
) -> (Vec<(SymbolicAddress, ConcreteAddress, u32)>, u64) {
    let total: u32 = members.iter().map(|(_, size)| *size).sum();

    let from_heap = use_heap
        && heap
            .peek()
            .map(|span| span.size >= total)
            .unwrap_or(false);

    if !from_heap {
        let base = *cursor;
        let mut addr = base;
        let mut assignments = Vec::with_capacity(members.len());
        for &(id, size) in members {
            assignments.push((id, addr, size));
            addr = addr.offset(size as i64);
        }
        *cursor = addr;
        if use_heap {
            if let Some(first) = members.first() {
                diagnostics.push(Diagnostic::BumpAllocated {
                    block: first.0,
                    bytes: total,
                });
            }
        }
        return (assignments, 0);
    }

    let span = heap.extract_max().expect("checked non-empty above");
    let mut addr = span.addr;
    let mut assignments = Vec::with_capacity(members.len());
    for &(id, size) in members {
        assignments.push((id, addr, size));
        addr = addr.offset(size as i64);
    }
    if span.size > total {
        heap.insert(FreeSpan {
            addr,
            size: span.size - total,
        });
    }
    (assignments, total as u64)
}

/// The result of allocating every chunk and every injected payload: each
/// symbolic block's concrete address and reserved size, each injected
/// symbol's concrete address, the total bytes reused from the heap, and
/// whatever remains in the heap for padding.
pub struct AllocationResult {
    pub blocks: FxHashMap<SymbolicAddress, (ConcreteAddress, u32)>,
    pub injected: FxHashMap<SymbolicAddress, ConcreteAddress>,
    pub reused_bytes: u64,
}

/// Allocate every ordered chunk, then every injected payload, consuming
/// `heap` and advancing `cursor` (the fresh-region bump pointer) as needed.
/// `use_heap` should be `false` for [`AllocatorKind::Parallel`], under which
/// the heap is never consulted at all.
#[allow(clippy::too_many_arguments)]
pub fn allocate(
    ordered_chunks: &[Chunk],
    chunk_block_sizes: &FxHashMap<SymbolicAddress, u32>,
    injected: &[InjectedCode],
    heap: &mut FreeSpaceHeap,
    cursor: &mut ConcreteAddress,
    use_heap: bool,
    diagnostics: &mut Diagnostics,
) -> AllocationResult {
    let mut blocks = FxHashMap::default();
    let mut reused_bytes: u64 = 0;

    for chunk in ordered_chunks {
        let members: Vec<(SymbolicAddress, u32)> = chunk
            .blocks
            .iter()
            .map(|id| (*id, chunk_block_sizes[id]))
            .collect();
        let (assignments, reused) = allocate_chunk(heap, cursor, use_heap, &members, diagnostics);
        reused_bytes += reused;
        for (id, addr, size) in assignments {
            blocks.insert(id, (addr, size));
        }
    }

    let mut injected_out = FxHashMap::default();
    for item in injected {
        let size = item.bytes.len() as u32;
        let members = [(item.symbol, size)];
        // Injected payloads are always fresh-region and never use heap
        // space, so they bypass the heap unconditionally here.
        let (assignments, _) = allocate_chunk(heap, cursor, false, &members, diagnostics);
        let (id, addr, _) = assignments[0];
        injected_out.insert(id, addr);
    }

    AllocationResult {
        blocks,
        injected: injected_out,
        reused_bytes,
    }
}
