//! Grouping blocks into chunks that must be laid out contiguously.
//!
//! Union-find over concrete addresses (path compression plus union by
//! rank), keyed the way the rest of this crate keys everything else:
//! through `rustc_hash::FxHashMap` rather than a raw pointer graph.

use rustc_hash::FxHashMap;

use crate::address::{ConcreteAddress, SymbolicAddress};
use crate::block::{BlockStatus, LayoutPair};
use crate::error::LayoutError;

/// Which grouping strategy partitions blocks into chunks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Grouping {
    Block,
    Loop,
    Function,
}

/// A weak topological ordering of the CFG, supplied externally: one entry
/// per strongly-connected component, each naming the original addresses of
/// its member blocks. Order of components and of addresses within a
/// component carries no meaning here; only component membership does.
pub type Wto = Vec<Vec<ConcreteAddress>>;

/// Maps a function's entry address to the original addresses of every
/// block belonging to that function, supplied externally.
pub type FunctionMap = FxHashMap<ConcreteAddress, Vec<ConcreteAddress>>;

/// A group of blocks that must be placed at consecutive addresses, in the
/// order given here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chunk {
    pub blocks: Vec<SymbolicAddress>,
}

/// Union-find over concrete addresses, with path compression and union by
/// rank.
struct UnionFind {
    parent: FxHashMap<ConcreteAddress, ConcreteAddress>,
    rank: FxHashMap<ConcreteAddress, u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: FxHashMap::default(),
            rank: FxHashMap::default(),
        }
    }

    fn make_set(&mut self, addr: ConcreteAddress) {
        self.parent.entry(addr).or_insert(addr);
        self.rank.entry(addr).or_insert(0);
    }

    fn find(&mut self, addr: ConcreteAddress) -> ConcreteAddress {
        let parent = *self.parent.get(&addr).unwrap_or(&addr);
        if parent == addr {
            return addr;
        }
        let root = self.find(parent);
        self.parent.insert(addr, root);
        root
    }

    fn union(&mut self, a: ConcreteAddress, b: ConcreteAddress) {
        self.make_set(a);
        self.make_set(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let rank_a = *self.rank.get(&ra).unwrap_or(&0);
        let rank_b = *self.rank.get(&rb).unwrap_or(&0);
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra);
            self.rank.insert(ra, rank_a + 1);
        }
    }
}

/// Partition `pairs` into chunks per `grouping`. `wto` is required for
/// [`Grouping::Loop`], `function_map` for [`Grouping::Function`]; both are
/// ignored for [`Grouping::Block`].
pub fn group_blocks<I>(
    grouping: Grouping,
    pairs: &[LayoutPair<I>],
    wto: Option<&Wto>,
    function_map: Option<&FunctionMap>,
) -> Result<Vec<Chunk>, LayoutError> {
    let addr_to_id: FxHashMap<ConcreteAddress, SymbolicAddress> = pairs
        .iter()
        .map(|p| (p.original().address, p.id))
        .collect();

    if grouping == Grouping::Block {
        return Ok(pairs
            .iter()
            .map(|p| Chunk {
                blocks: vec![p.id],
            })
            .collect());
    }

    let mut uf = UnionFind::new();
    for pair in pairs {
        uf.make_set(pair.original().address);
    }

    match grouping {
        Grouping::Block => unreachable!("handled above"),
        Grouping::Loop => {
            if let Some(wto) = wto {
                for component in wto {
                    let mut iter = component.iter();
                    if let Some(&first) = iter.next() {
                        for &addr in iter {
                            uf.union(first, addr);
                        }
                    }
                }
            }
        }
        Grouping::Function => {
            if let Some(function_map) = function_map {
                for (&entry, members) in function_map {
                    uf.make_set(entry);
                    for &addr in members {
                        uf.union(entry, addr);
                    }
                }
            }
        }
    }

    // Group addresses by root, tracking first-appearance order of each
    // root in `pairs` so chunk ordering stays deterministic.
    let mut members_by_root: FxHashMap<ConcreteAddress, Vec<ConcreteAddress>> = FxHashMap::default();
    let mut root_order: Vec<ConcreteAddress> = Vec::new();
    for pair in pairs {
        let addr = pair.original().address;
        let root = uf.find(addr);
        if !members_by_root.contains_key(&root) {
            root_order.push(root);
        }
        members_by_root.entry(root).or_default().push(addr);
    }

    let mut chunks = Vec::with_capacity(root_order.len());
    for root in root_order {
        let mut members = members_by_root.remove(&root).unwrap_or_default();
        // Ordered internally by ascending original address to preserve
        // locality.
        members.sort_unstable();
        let blocks = members
            .into_iter()
            .map(|addr| addr_to_id[&addr])
            .collect();
        chunks.push(Chunk { blocks });
    }

    Ok(chunks)
}

/// The outcome of splitting a chunk's members by status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedChunk {
    /// At least one member is `Modified` or `Subsumed`. `modifiable` is the
    /// subset (in the chunk's original order) to carry through the rest of
    /// the pipeline; `immutable_in_place` lists members that stay where
    /// they are.
    Modifiable {
        modifiable: Vec<SymbolicAddress>,
        immutable_in_place: Vec<SymbolicAddress>,
    },
    /// No member is modified; the whole chunk is emitted in place untouched.
    Unmodified(Vec<SymbolicAddress>),
}

pub fn classify_chunk<I>(chunk: &Chunk, pairs_by_id: &FxHashMap<SymbolicAddress, &LayoutPair<I>>) -> ClassifiedChunk {
    let any_modified = chunk.blocks.iter().any(|id| {
        matches!(
            pairs_by_id[id].status,
            BlockStatus::Modified | BlockStatus::Subsumed
        )
    });

    if !any_modified {
        return ClassifiedChunk::Unmodified(chunk.blocks.clone());
    }

    let mut modifiable = Vec::new();
    let mut immutable_in_place = Vec::new();
    for &id in &chunk.blocks {
        match pairs_by_id[&id].status {
            BlockStatus::Immutable => immutable_in_place.push(id),
            _ => modifiable.push(id),
        }
    }
    ClassifiedChunk::Modifiable {
        modifiable,
        immutable_in_place,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Segment;
    use crate::block::{ConcreteBlock, SymbolicBlock};
    use smallvec::smallvec;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct TestInstr;

    fn pair(id: u32, addr: u64, status: BlockStatus) -> LayoutPair<TestInstr> {
        let seg = Segment::new(0);
        let address = ConcreteAddress::new(seg, addr);
        let block = ConcreteBlock::new(address, smallvec![TestInstr]);
        LayoutPair {
            id: SymbolicAddress::new(id as usize),
            derived: SymbolicBlock {
                origin: block.clone(),
                instructions: block.instructions,
            },
            status,
        }
    }

    #[test]
    fn block_grouping_is_all_singletons() {
        let pairs = vec![
            pair(0, 0x1000, BlockStatus::Modified),
            pair(1, 0x1010, BlockStatus::Modified),
        ];
        let chunks = group_blocks(Grouping::Block, &pairs, None, None).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.blocks.len() == 1));
    }

    #[test]
    fn loop_grouping_unifies_scc_and_sorts_by_address() {
        let seg = Segment::new(0);
        let a = ConcreteAddress::new(seg, 0x1020);
        let b = ConcreteAddress::new(seg, 0x1000);
        let c = ConcreteAddress::new(seg, 0x1010);
        let pairs = vec![
            pair(0, 0x1020, BlockStatus::Modified),
            pair(1, 0x1000, BlockStatus::Modified),
            pair(2, 0x1010, BlockStatus::Modified),
        ];
        let wto: Wto = vec![vec![a, b, c]];
        let chunks = group_blocks(Grouping::Loop, &pairs, Some(&wto), None).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].blocks,
            vec![SymbolicAddress::new(1), SymbolicAddress::new(2), SymbolicAddress::new(0)]
        );
    }

    #[test]
    fn classify_splits_immutable_members() {
        let pairs = vec![
            pair(0, 0x1000, BlockStatus::Modified),
            pair(1, 0x1010, BlockStatus::Immutable),
        ];
        let chunk = Chunk {
            blocks: vec![pairs[0].id, pairs[1].id],
        };
        let by_id: FxHashMap<_, _> = pairs.iter().map(|p| (p.id, p)).collect();
        let classified = classify_chunk(&chunk, &by_id);
        match classified {
            ClassifiedChunk::Modifiable {
                modifiable,
                immutable_in_place,
            } => {
                assert_eq!(modifiable, vec![pairs[0].id]);
                assert_eq!(immutable_in_place, vec![pairs[1].id]);
            }
            ClassifiedChunk::Unmodified(_) => panic!("expected Modifiable"),
        }
    }

    #[test]
    fn classify_treats_all_unmodified_chunk_as_unmodified() {
        let pairs = vec![
            pair(0, 0x1000, BlockStatus::Unmodified),
            pair(1, 0x1010, BlockStatus::Unmodified),
        ];
        let chunk = Chunk {
            blocks: vec![pairs[0].id, pairs[1].id],
        };
        let by_id: FxHashMap<_, _> = pairs.iter().map(|p| (p.id, p)).collect();
        assert_eq!(
            classify_chunk(&chunk, &by_id),
            ClassifiedChunk::Unmodified(chunk.blocks.clone())
        );
    }
}
