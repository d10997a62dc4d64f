//! Free-space accounting and pre-heap construction.
//!
//! Walks every block once, accumulating reclaimable byte spans from the
//! original `.text`, then coalesces adjacent spans into the set the
//! allocator will draw from.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::block::{BlockStatus, LayoutPair};
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::LayoutError;
use crate::group::FunctionMap;
use crate::isa::IsaCapability;

/// Which redirect policy governs whether a `Modified` block gets its own
/// trampoline or donates its full original range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrampolineStrategy {
    AlwaysTrampoline,
    WholeFunctionTrampoline,
}

/// A reclaimed byte range in the original `.text`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FreeSpan {
    pub addr: ConcreteAddress,
    pub size: u32,
}

/// Determine which `Modified` blocks should skip their own trampoline and
/// instead donate their *full* original range, because redirecting only
/// their function's entry already redirects every caller.
///
/// Keyed by the function entry's symbolic id, with the list of interior
/// block ids that donate under it, so a caller can tell which function a
/// donor belongs to and how many siblings it has.
///
/// Under [`TrampolineStrategy::AlwaysTrampoline`] this is always empty.
pub fn whole_function_donors<I, C: IsaCapability<Instr = I>>(
    strategy: TrampolineStrategy,
    pairs: &[LayoutPair<I>],
    function_map: Option<&FunctionMap>,
    isa: &C,
) -> FxHashMap<SymbolicAddress, Vec<SymbolicAddress>> {
    let mut donors: FxHashMap<SymbolicAddress, Vec<SymbolicAddress>> = FxHashMap::default();
    if strategy != TrampolineStrategy::WholeFunctionTrampoline {
        return donors;
    }
    let Some(function_map) = function_map else {
        return donors;
    };

    let by_addr: FxHashMap<ConcreteAddress, &LayoutPair<I>> =
        pairs.iter().map(|p| (p.original().address, p)).collect();

    // A block address is shared if it appears in more than one function's
    // block list; such functions never qualify.
    let mut occurrence_count: FxHashMap<ConcreteAddress, u32> = FxHashMap::default();
    for blocks in function_map.values() {
        for addr in blocks {
            *occurrence_count.entry(*addr).or_insert(0) += 1;
        }
    }

    let jump_size = isa.trampoline_jump_size();

    for (&entry, blocks) in function_map {
        let disjoint = blocks.iter().all(|addr| occurrence_count[addr] == 1);
        if !disjoint {
            continue;
        }
        let Some(entry_pair) = by_addr.get(&entry) else {
            continue;
        };
        if entry_pair.status != BlockStatus::Modified {
            continue;
        }
        let entry_size = isa.concrete_block_size(entry_pair.original());
        if entry_size < jump_size {
            continue; // entry is a small block, cannot host a redirect
        }
        let all_modified = blocks.iter().all(|addr| {
            by_addr
                .get(addr)
                .map(|p| p.status == BlockStatus::Modified)
                .unwrap_or(false)
        });
        if !all_modified {
            continue;
        }
        let interior: Vec<SymbolicAddress> = blocks
            .iter()
            .filter(|&&addr| addr != entry)
            .map(|addr| by_addr[addr].id)
            .collect();
        donors.insert(entry_pair.id, interior);
    }

    donors
}

/// Build the pre-heap of reclaimable spans from `pairs`, mutating statuses
/// to `Subsumed` where the whole-function optimization or a pre-existing
/// `Subsumed` input applies.
pub fn build_preheap<I, C: IsaCapability<Instr = I>>(
    pairs: &mut [LayoutPair<I>],
    donors: &FxHashMap<SymbolicAddress, Vec<SymbolicAddress>>,
    isa: &C,
    diagnostics: &mut Diagnostics,
) -> Vec<FreeSpan> {
    let jump_size = isa.trampoline_jump_size();
    let mut spans = Vec::new();

    let mut interior_to_entry: FxHashMap<SymbolicAddress, SymbolicAddress> = FxHashMap::default();
    for (&entry, interior) in donors {
        for &id in interior {
            interior_to_entry.insert(id, entry);
        }
    }
    let mut reported_entries: FxHashSet<SymbolicAddress> = FxHashSet::default();

    for pair in pairs.iter_mut() {
        match pair.status {
            BlockStatus::Subsumed => {
                let size = isa.concrete_block_size(pair.original());
                spans.push(FreeSpan {
                    addr: pair.original().address,
                    size,
                });
            }
            BlockStatus::Modified => {
                let size = isa.concrete_block_size(pair.original());
                if size < jump_size {
                    diagnostics.push(Diagnostic::Redirected {
                        block: pair.id,
                        bytes_reclaimed: 0,
                    });
                    continue;
                }
                if let Some(&entry) = interior_to_entry.get(&pair.id) {
                    spans.push(FreeSpan {
                        addr: pair.original().address,
                        size,
                    });
                    if reported_entries.insert(entry) {
                        diagnostics.push(Diagnostic::WholeFunctionSubsumed {
                            entry,
                            interior_blocks: donors[&entry].len() as u32,
                        });
                    }
                    pair.status = BlockStatus::Subsumed;
                } else {
                    let reclaimed = size - jump_size;
                    spans.push(FreeSpan {
                        addr: pair.original().address.offset(jump_size as i64),
                        size: reclaimed,
                    });
                    diagnostics.push(Diagnostic::Redirected {
                        block: pair.id,
                        bytes_reclaimed: reclaimed,
                    });
                }
            }
            BlockStatus::Unmodified | BlockStatus::Immutable => {}
        }
    }

    spans
}

/// Merge adjacent spans in ascending-address order; fail if any two
/// overlap, which indicates a bug in the upstream block model.
pub fn coalesce(mut spans: Vec<FreeSpan>) -> Result<Vec<FreeSpan>, LayoutError> {
    spans.sort_unstable_by_key(|s| s.addr.value());
    let mut out: Vec<FreeSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = out.last_mut() {
            let last_end = last.addr.offset(last.size as i64);
            if span.addr.value() < last_end.value() {
                return Err(LayoutError::OverlappingFreeBlocks {
                    a: last.addr,
                    la: last.size,
                    b: span.addr,
                    lb: span.size,
                });
            }
            if span.addr == last_end {
                last.size += span.size;
                continue;
            }
        }
        out.push(span);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Segment;

    fn span(addr: u64, size: u32) -> FreeSpan {
        FreeSpan {
            addr: ConcreteAddress::new(Segment::new(0), addr),
            size,
        }
    }

    #[test]
    fn coalesce_merges_touching_spans() {
        let spans = vec![span(0x1000, 0x10), span(0x1010, 0x8)];
        let merged = coalesce(spans).unwrap();
        assert_eq!(merged, vec![span(0x1000, 0x18)]);
    }

    #[test]
    fn coalesce_keeps_gapped_spans_separate() {
        let spans = vec![span(0x1000, 0x10), span(0x1020, 0x8)];
        let merged = coalesce(spans).unwrap();
        assert_eq!(merged, vec![span(0x1000, 0x10), span(0x1020, 0x8)]);
    }

    #[test]
    fn coalesce_detects_overlap() {
        let spans = vec![span(0x1000, 20), span(0x100F, 8)];
        let err = coalesce(spans).unwrap_err();
        assert!(matches!(err, LayoutError::OverlappingFreeBlocks { .. }));
    }
}
