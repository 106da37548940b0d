//! Bounded arena backing scheduled messages.
//!
//! The pool is sized once, from a kilobyte budget, when the context is built.
//! Storage is a flat slab of [`Element`] slots. Allocations are served from
//! power-of-two size classes (1 to [`MAX_BLOCK_ELEMENTS`] elements): a freed
//! block goes onto its class's free list and is reused by the next request of
//! that class; otherwise a bump pointer carves fresh space. Both operations are
//! O(1). No compaction happens and nothing here ever grows after construction.
//!
//! # Invariants
//!
//! - Every free list is preallocated to the maximum number of blocks its class
//!   could ever hold, so `free` never reallocates.
//! - `high_water_mark()` is the largest bump offset ever reached, in elements.
//!
//! Exhaustion is reported as `None`. The scheduler turns that into a fatal
//! panic naming the object that asked, since an undersized pool is a patch
//! configuration error rather than a runtime condition.

use core::mem::size_of;

use crate::message::Element;

/// Number of size classes.
const NUM_CLASSES: usize = 7;

/// Largest message, in elements, the pool can hold.
pub const MAX_BLOCK_ELEMENTS: usize = 1 << (NUM_CLASSES - 1);

/// A block of pool storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolBlock {
    offset: u32,
    len: u16,
    class: u8,
}

impl PoolBlock {
    /// Number of elements in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// True if the block holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn range(&self) -> core::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// Fixed-capacity element arena.
#[derive(Debug)]
pub struct MemoryPool {
    slots: Vec<Element>,
    bump: usize,
    high_water_mark: usize,
    free_lists: [Vec<u32>; NUM_CLASSES],
}

impl MemoryPool {
    /// Creates a pool from a kilobyte budget.
    pub fn new(kb: usize) -> Self {
        Self::with_capacity(kb * 1024 / size_of::<Element>())
    }

    /// Creates a pool holding exactly `elements` element slots.
    pub fn with_capacity(elements: usize) -> Self {
        let free_lists = core::array::from_fn(|class| Vec::with_capacity(elements >> class));
        Self {
            slots: vec![Element::Bang; elements],
            bump: 0,
            high_water_mark: 0,
            free_lists,
        }
    }

    /// Total capacity in element slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Largest bump offset ever reached, in elements.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Reserves space for `len` elements.
    ///
    /// Returns `None` when the pool is exhausted or `len` exceeds
    /// [`MAX_BLOCK_ELEMENTS`].
    pub fn alloc(&mut self, len: usize) -> Option<PoolBlock> {
        let class = class_for(len)?;
        let offset = match self.free_lists[class].pop() {
            Some(offset) => offset,
            None => {
                let size = 1usize << class;
                if self.bump + size > self.slots.len() {
                    return None;
                }
                let offset = self.bump as u32;
                self.bump += size;
                self.high_water_mark = self.high_water_mark.max(self.bump);
                offset
            }
        };
        Some(PoolBlock {
            offset,
            len: len as u16,
            class: class as u8,
        })
    }

    /// Allocates a block and copies `elements` into it.
    pub fn alloc_copy(&mut self, elements: &[Element]) -> Option<PoolBlock> {
        let block = self.alloc(elements.len())?;
        self.slots[block.range()].copy_from_slice(elements);
        Some(block)
    }

    /// Returns a block to its size class.
    pub fn free(&mut self, block: PoolBlock) {
        let list = &mut self.free_lists[block.class as usize];
        debug_assert!(list.len() < list.capacity(), "pool block freed twice");
        list.push(block.offset);
    }

    /// Elements stored in `block`.
    #[inline]
    pub fn slice(&self, block: PoolBlock) -> &[Element] {
        &self.slots[block.range()]
    }

    /// Mutable elements stored in `block`.
    #[inline]
    pub fn slice_mut(&mut self, block: PoolBlock) -> &mut [Element] {
        &mut self.slots[block.range()]
    }

    /// Forgets every allocation.
    pub fn reset(&mut self) {
        self.bump = 0;
        for list in &mut self.free_lists {
            list.clear();
        }
    }
}

fn class_for(len: usize) -> Option<usize> {
    if len > MAX_BLOCK_ELEMENTS {
        return None;
    }
    Some(len.max(1).next_power_of_two().trailing_zeros() as usize)
}
