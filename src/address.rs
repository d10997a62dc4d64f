//! Concrete and symbolic addresses.
//!
//! A [`ConcreteAddress`] names a byte in some address space of the original
//! or rewritten binary; it carries a [`Segment`] tag so that addresses from
//! distinct address spaces (original `.text`, freshly appended code, a
//! second binary entirely) can't be silently mixed in arithmetic. A
//! [`SymbolicAddress`] is an opaque identifier handed out before a block has
//! a concrete address at all: a compact index into a table, not a pointer,
//! so blocks can refer to each other before layout decides where anything
//! lives.

use core::fmt;

use cranelift_entity::{entity_impl, EntityRef};

/// Tags the address space a [`ConcreteAddress`] lives in. Two addresses with
/// different segments must never be combined.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Segment(u32);
entity_impl!(Segment, "seg");

/// A signed byte distance used to walk a [`ConcreteAddress`] forward or
/// backward.
pub type ByteOffset = i64;

/// An address in the original or rewritten binary, tagged with the address
/// space it lives in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConcreteAddress {
    segment: Segment,
    value: u64,
}

impl ConcreteAddress {
    /// Construct an address at `value` within `segment`.
    pub fn new(segment: Segment, value: u64) -> Self {
        Self { segment, value }
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Add a signed byte offset, staying within the same segment.
    ///
    /// Panics on overflow/underflow; the layout engine never offsets an
    /// address past what the free-space or fresh-region bookkeeping already
    /// bounded, so an overflow here means an upstream accounting bug.
    pub fn offset(&self, by: ByteOffset) -> Self {
        let value = if by >= 0 {
            self.value.checked_add(by as u64)
        } else {
            self.value.checked_sub((-by) as u64)
        }
        .unwrap_or_else(|| panic!("address arithmetic overflow: {self} + {by}"));
        Self {
            segment: self.segment,
            value,
        }
    }

    /// The signed byte distance `self - other`. Both addresses must be in
    /// the same segment.
    pub fn distance_from(&self, other: &Self) -> ByteOffset {
        assert_eq!(
            self.segment, other.segment,
            "cannot subtract addresses from different segments ({} vs {})",
            self.segment, other.segment
        );
        self.value as i64 - other.value as i64
    }
}

impl fmt::Display for ConcreteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}@{}", self.value, self.segment)
    }
}

impl fmt::Debug for ConcreteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConcreteAddress({self})")
    }
}

/// An opaque reference to a not-yet-placed block, allocated monotonically
/// from a [`SymbolicAddressAllocator`] for the lifetime of one rewrite
/// session. Two blocks compare equal under this type only if they are the
/// same block.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolicAddress(u32);
entity_impl!(SymbolicAddress, "sym");

/// Hands out [`SymbolicAddress`] identifiers from a single monotonically
/// increasing source that lives for the full rewrite session.
#[derive(Default, Debug)]
pub struct SymbolicAddressAllocator {
    next: u32,
}

impl SymbolicAddressAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn alloc(&mut self) -> SymbolicAddress {
        let id = SymbolicAddress::new(self.next as usize);
        self.next += 1;
        id
    }
}
