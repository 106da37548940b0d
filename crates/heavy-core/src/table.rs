//! Named float buffers shared between objects.
//!
//! A [`Table`] holds `size` logical samples in a buffer whose physical length
//! (`allocated`) is always a multiple of [`N_SIMD`], zero-padded past `size`.
//! Vector reads may therefore touch up to `allocated` without leaving the
//! buffer; scalar access is limited to `size`.
//!
//! Each table carries one shared head. Linear readers and writers advance it
//! and, on reaching the end, either wrap to zero or stop there according to a
//! [`HeadPolicy`]. A stopped head reads silence until something moves it.
//!
//! Tables are owned by the [`TableRegistry`] and looked up by name hash. Many
//! objects may reference one table; all mutation happens serially on the audio
//! thread, last writer wins.
//!
//! Bounds checks on element access are debug assertions. In release builds an
//! index past `size` but below `allocated` reads or writes padding; past
//! `allocated` the slice index panics.

use crate::hash::string_to_hash;
use crate::simd::{Buf, N_SIMD, align_up};

/// What a linear access does when the head reaches the end of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadPolicy {
    /// Jump back to index zero (looping playback).
    #[default]
    Wrap,
    /// Stay at the end; reads return silence (one-shot playback).
    Stop,
}

/// A resizable float buffer with a shared read/write head.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    buffer: Vec<f32>,
    size: usize,
    head: usize,
}

impl Table {
    /// Creates a zeroed table of `size` samples.
    pub fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; align_up(size)],
            size,
            head: 0,
        }
    }

    /// Creates a table holding a copy of `samples`.
    pub fn from_samples(samples: &[f32]) -> Self {
        let mut table = Self::new(samples.len());
        table.buffer[..samples.len()].copy_from_slice(samples);
        table
    }

    /// Logical length in samples.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Physical length in samples, a multiple of [`N_SIMD`].
    #[inline]
    pub fn allocated(&self) -> usize {
        self.buffer.len()
    }

    /// Current head position.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Moves the head. Positions past `size` are clamped to `size`.
    pub fn set_head(&mut self, head: usize) {
        self.head = head.min(self.size);
    }

    /// Logical contents.
    pub fn samples(&self) -> &[f32] {
        &self.buffer[..self.size]
    }

    /// Mutable logical contents.
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.buffer[..self.size]
    }

    /// Changes the logical size, reallocating only when the aligned length
    /// grows. Samples past the new size are zeroed and the head is clamped.
    ///
    /// Must not be called from inside signal processing.
    pub fn resize(&mut self, new_size: usize) {
        let aligned = align_up(new_size);
        if aligned > self.buffer.len() {
            self.buffer.resize(aligned, 0.0);
        }
        if new_size < self.size {
            self.buffer[new_size..].fill(0.0);
        }
        self.size = new_size;
        self.head = self.head.min(new_size);
    }

    /// Sample at `index`.
    #[inline]
    pub fn read(&self, index: usize) -> f32 {
        debug_assert!(
            index < self.size,
            "table read at {index} out of bounds (size {})",
            self.size
        );
        self.buffer[index]
    }

    /// Writes `value` at `index`.
    #[inline]
    pub fn write(&mut self, index: usize, value: f32) {
        debug_assert!(
            index < self.size,
            "table write at {index} out of bounds (size {})",
            self.size
        );
        self.buffer[index] = value;
    }

    /// Reads one vector starting at `index`.
    #[inline]
    pub fn read_vector(&self, index: usize) -> Buf {
        debug_assert!(
            index + N_SIMD <= self.allocated(),
            "table vector read at {index} out of bounds (allocated {})",
            self.allocated()
        );
        Buf::load(&self.buffer[index..])
    }

    /// Gathers one sample per lane from arbitrary indices. Indices at or past
    /// `allocated` read zero in release builds.
    #[inline]
    pub fn gather(&self, indices: [usize; N_SIMD]) -> Buf {
        for &index in &indices {
            debug_assert!(
                index < self.size,
                "table gather at {index} out of bounds (size {})",
                self.size
            );
        }
        Buf::from_fn(|i| self.buffer.get(indices[i]).copied().unwrap_or(0.0))
    }

    /// Reads the sample under the head and advances it.
    pub fn read_linear(&mut self, policy: HeadPolicy) -> f32 {
        if self.head >= self.size {
            return 0.0;
        }
        let value = self.buffer[self.head];
        self.advance(1, policy);
        value
    }

    /// Writes at the head and advances it. Returns false if the head is
    /// stopped at the end.
    pub fn write_linear(&mut self, value: f32, policy: HeadPolicy) -> bool {
        if self.head >= self.size {
            return false;
        }
        self.buffer[self.head] = value;
        self.advance(1, policy);
        true
    }

    /// Reads one vector at the head and advances by [`N_SIMD`]. Lanes past
    /// `size` read zero.
    pub fn read_block(&mut self, policy: HeadPolicy) -> Buf {
        if self.head >= self.size {
            return Buf::zero();
        }
        let head = self.head;
        let size = self.size;
        let out = Buf::from_fn(|i| {
            let idx = head + i;
            if idx < size {
                self.buffer[idx]
            } else {
                0.0
            }
        });
        self.advance(N_SIMD, policy);
        out
    }

    /// Writes one vector at the head and advances by [`N_SIMD`]. Lanes that
    /// fall past `size` are discarded.
    pub fn write_block(&mut self, block: Buf, policy: HeadPolicy) {
        if self.head >= self.size {
            return;
        }
        let end = (self.head + N_SIMD).min(self.size);
        let n = end - self.head;
        self.buffer[self.head..end].copy_from_slice(&block.0[..n]);
        self.advance(N_SIMD, policy);
    }

    fn advance(&mut self, by: usize, policy: HeadPolicy) {
        self.head += by;
        if self.head >= self.size {
            self.head = match policy {
                HeadPolicy::Wrap => 0,
                HeadPolicy::Stop => self.size,
            };
        }
    }
}

/// Index of a table inside a [`TableRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub(crate) u32);

/// Owns every table of a context, addressed by name hash.
#[derive(Debug, Default)]
pub struct TableRegistry {
    entries: Vec<(u32, Table)>,
}

impl TableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `name` and returns its id.
    pub fn insert(&mut self, name: &str, table: Table) -> TableId {
        self.insert_hashed(string_to_hash(name), table)
    }

    /// Registers `table` under a precomputed hash.
    pub fn insert_hashed(&mut self, hash: u32, table: Table) -> TableId {
        self.entries.push((hash, table));
        TableId((self.entries.len() - 1) as u32)
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a name hash. The first registered match wins.
    pub fn find(&self, hash: u32) -> Option<TableId> {
        self.entries
            .iter()
            .position(|(h, _)| *h == hash)
            .map(|i| TableId(i as u32))
    }

    /// Table registered under `hash`.
    pub fn get(&self, hash: u32) -> Option<&Table> {
        self.find(hash).map(|id| self.by_id(id))
    }

    /// Mutable table registered under `hash`.
    pub fn get_mut(&mut self, hash: u32) -> Option<&mut Table> {
        self.find(hash).map(|id| self.by_id_mut(id))
    }

    /// Table by id.
    #[inline]
    pub fn by_id(&self, id: TableId) -> &Table {
        &self.entries[id.0 as usize].1
    }

    /// Mutable table by id.
    #[inline]
    pub fn by_id_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.entries[id.0 as usize].1
    }
}
