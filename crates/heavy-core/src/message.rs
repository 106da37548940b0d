//! Timestamped, variant-typed messages exchanged between objects.
//!
//! A message is a fixed-length sequence of [`Element`]s carrying one timestamp
//! in samples since context start. Two forms exist:
//!
//! - [`Message`] - a borrowed, `Copy` view. This is the stack-transient form:
//!   build the elements in a local array, wrap them, send, discard.
//! - [`OwnedMessage`] - a retained message whose element count is fixed at
//!   construction. Element values may be overwritten in place.
//!
//! Messages that outlive the call that created them (scheduled for a later
//! timestamp) are copied into the [`MemoryPool`](crate::pool::MemoryPool) by the
//! scheduler.
//!
//! # Example
//!
//! ```rust
//! use heavy_core::message::{Element, Message};
//!
//! let elements = [Element::Float(440.0), Element::symbol("hz")];
//! let msg = Message::new(64, &elements);
//! assert!(msg.has_format("fs"));
//! assert_eq!(msg.to_string(), "440 hz");
//! ```

use core::fmt;

use crate::hash::{BANG_HASH, float_hash, string_to_hash};

/// Maximum number of UTF-8 bytes kept inline for symbol display text.
pub const SYMBOL_CAPACITY: usize = 27;

/// An interned-by-hash symbol with inline display text.
///
/// Identity is the hash of the full name. Names longer than
/// [`SYMBOL_CAPACITY`] bytes keep their full hash but display truncated.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    hash: u32,
    len: u8,
    text: [u8; SYMBOL_CAPACITY],
}

impl Symbol {
    /// Creates a symbol from a name.
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(SYMBOL_CAPACITY);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut text = [0u8; SYMBOL_CAPACITY];
        text[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self {
            hash: string_to_hash(name),
            len: end as u8,
            text,
        }
    }

    /// Rebuilds a symbol from a hash and (possibly truncated) display text.
    pub(crate) fn from_parts(hash: u32, text: &[u8]) -> Self {
        let mut end = text.len().min(SYMBOL_CAPACITY);
        while end > 0 && core::str::from_utf8(&text[..end]).is_err() {
            end -= 1;
        }
        let mut buf = [0u8; SYMBOL_CAPACITY];
        buf[..end].copy_from_slice(&text[..end]);
        Self {
            hash,
            len: end as u8,
            text: buf,
        }
    }

    /// Hash of the full symbol name.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Display text (truncated for long names).
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.text[..self.len as usize]).unwrap_or_default()
    }

    /// Returns true if this symbol names `name`.
    pub fn is(&self, name: &str) -> bool {
        self.hash == string_to_hash(name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

/// One slot of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Element {
    /// An event with no value.
    #[default]
    Bang,
    /// A 32-bit float.
    Float(f32),
    /// A symbol with printable text.
    Symbol(Symbol),
    /// A pre-hashed symbol.
    Hash(u32),
}

impl Element {
    /// Shorthand for `Element::Symbol(Symbol::new(name))`.
    pub fn symbol(name: &str) -> Self {
        Element::Symbol(Symbol::new(name))
    }

    /// Element hash: float bit pattern, `0xFFFFFFFF` for bang, name hash for
    /// symbols, the value itself for hashes.
    pub fn hash(&self) -> u32 {
        match self {
            Element::Bang => BANG_HASH,
            Element::Float(f) => float_hash(*f),
            Element::Symbol(s) => s.hash(),
            Element::Hash(h) => *h,
        }
    }

    /// Single-character format code: `b`, `f`, `s` or `h`.
    pub fn format_char(&self) -> char {
        match self {
            Element::Bang => 'b',
            Element::Float(_) => 'f',
            Element::Symbol(_) => 's',
            Element::Hash(_) => 'h',
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bang => f.write_str("bang"),
            Element::Float(v) => write!(f, "{v}"),
            Element::Symbol(s) => f.write_str(s.as_str()),
            Element::Hash(h) => write!(f, "0x{h:X}"),
        }
    }
}

/// Borrowed message view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message<'a> {
    timestamp: u32,
    elements: &'a [Element],
}

impl<'a> Message<'a> {
    /// Wraps `elements` with a timestamp.
    #[inline]
    pub fn new(timestamp: u32, elements: &'a [Element]) -> Self {
        Self {
            timestamp,
            elements,
        }
    }

    /// Timestamp in samples since context start.
    #[inline]
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// The same elements at a different timestamp.
    #[inline]
    pub fn with_timestamp(&self, timestamp: u32) -> Message<'a> {
        Message::new(timestamp, self.elements)
    }

    /// All elements.
    #[inline]
    pub fn elements(&self) -> &'a [Element] {
        self.elements
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the message has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`.
    #[inline]
    pub fn element(&self, index: usize) -> Option<&'a Element> {
        self.elements.get(index)
    }

    /// True if element `index` is a bang.
    pub fn is_bang(&self, index: usize) -> bool {
        matches!(self.element(index), Some(Element::Bang))
    }

    /// True if element `index` is a float.
    pub fn is_float(&self, index: usize) -> bool {
        matches!(self.element(index), Some(Element::Float(_)))
    }

    /// True if element `index` is a symbol.
    pub fn is_symbol(&self, index: usize) -> bool {
        matches!(self.element(index), Some(Element::Symbol(_)))
    }

    /// True if element `index` is a pre-hashed symbol.
    pub fn is_hash(&self, index: usize) -> bool {
        matches!(self.element(index), Some(Element::Hash(_)))
    }

    /// True if element `index` is a symbol or a hash.
    pub fn is_hash_like(&self, index: usize) -> bool {
        matches!(
            self.element(index),
            Some(Element::Symbol(_) | Element::Hash(_))
        )
    }

    /// Float value of element `index`, if it is a float.
    #[inline]
    pub fn float(&self, index: usize) -> Option<f32> {
        match self.element(index) {
            Some(Element::Float(f)) => Some(*f),
            _ => None,
        }
    }

    /// Hash of element `index`, or 0 when out of range.
    pub fn hash(&self, index: usize) -> u32 {
        self.element(index).map_or(0, Element::hash)
    }

    /// True if element `index` is a symbol or hash matching `name`.
    pub fn compare_symbol(&self, index: usize, name: &str) -> bool {
        match self.element(index) {
            Some(Element::Symbol(s)) => s.is(name),
            Some(Element::Hash(h)) => *h == string_to_hash(name),
            _ => false,
        }
    }

    /// Checks the element types against a format string of `b`, `f`, `s`, `h`.
    pub fn has_format(&self, format: &str) -> bool {
        format.len() == self.len()
            && format
                .chars()
                .zip(self.elements)
                .all(|(c, e)| c == e.format_char())
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// A retained message with a fixed element count.
///
/// Allocated once (at object construction or on a non-real-time path) and then
/// only mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedMessage {
    timestamp: u32,
    elements: Vec<Element>,
}

impl OwnedMessage {
    /// Creates a message holding a copy of `elements`.
    pub fn new(timestamp: u32, elements: &[Element]) -> Self {
        Self {
            timestamp,
            elements: elements.to_vec(),
        }
    }

    /// Creates a single-float message.
    pub fn float(timestamp: u32, value: f32) -> Self {
        Self::new(timestamp, &[Element::Float(value)])
    }

    /// Creates a single-bang message.
    pub fn bang(timestamp: u32) -> Self {
        Self::new(timestamp, &[Element::Bang])
    }

    /// Copies a borrowed message.
    pub fn from_message(msg: &Message<'_>) -> Self {
        Self::new(msg.timestamp(), msg.elements())
    }

    /// Borrowed view.
    #[inline]
    pub fn as_message(&self) -> Message<'_> {
        Message::new(self.timestamp, &self.elements)
    }

    /// Timestamp in samples.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Replaces the timestamp.
    pub fn set_timestamp(&mut self, timestamp: u32) {
        self.timestamp = timestamp;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element slice.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Overwrites element `index`. Returns false when out of range.
    pub fn set_element(&mut self, index: usize, element: Element) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for OwnedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_message().fmt(f)
    }
}
