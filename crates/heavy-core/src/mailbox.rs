//! Cross-thread message mailboxes.
//!
//! A mailbox is a bounded single-producer/single-consumer byte ring
//! ([`rtrb`]). Messages are variable-length, so each one is packed into a
//! length-prefixed record:
//!
//! ```text
//! u32 record length (bytes, header included)
//! u32 receiver hash
//! u32 time            (absolute timestamp or delay in samples)
//! u8  timing kind     (0 = at, 1 = after)
//! u8  reserved
//! u16 element count
//! elements:           u8 tag, then payload
//!   0 bang            -
//!   1 float           f32
//!   2 hash            u32
//!   3 symbol          u32 hash, u8 length, text bytes
//! ```
//!
//! All integers are little-endian. A record is published in one commit, so the
//! consumer never sees half of one.
//!
//! [`MailboxSender::try_send`] never blocks: if the record does not fit in the
//! free space, or carries more than [`MAX_BLOCK_ELEMENTS`] elements, it is
//! dropped and `false` is returned. Records already in the
//! ring are untouched. Both ends keep a preallocated scratch buffer sized to the
//! ring, so neither side allocates after construction.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::message::{Element, Message, Symbol};
use crate::pool::MAX_BLOCK_ELEMENTS;

const HEADER_LEN: usize = 16;
const TAG_BANG: u8 = 0;
const TAG_FLOAT: u8 = 1;
const TAG_HASH: u8 = 2;
const TAG_SYMBOL: u8 = 3;

/// When a mailbox message should be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// At an absolute timestamp in samples.
    At(u32),
    /// This many samples after the start of the block that drains it.
    After(u32),
}

/// Header of a received record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Receiver the message is addressed to.
    pub receiver_hash: u32,
    /// Requested timing.
    pub timing: Timing,
}

/// Creates a mailbox with room for `capacity` bytes of records.
pub fn mailbox(capacity: usize) -> (MailboxSender, MailboxReceiver) {
    let (producer, consumer) = RingBuffer::new(capacity);
    (
        MailboxSender {
            producer,
            scratch: Vec::with_capacity(capacity),
        },
        MailboxReceiver {
            consumer,
            scratch: Vec::with_capacity(capacity),
        },
    )
}

/// Encoded size of one element.
fn element_len(element: &Element) -> usize {
    match element {
        Element::Bang => 1,
        Element::Float(_) | Element::Hash(_) => 5,
        Element::Symbol(s) => 6 + s.as_str().len(),
    }
}

/// Encoded size of a record carrying `elements`.
pub fn record_len(elements: &[Element]) -> usize {
    HEADER_LEN + elements.iter().map(element_len).sum::<usize>()
}

/// Producer end of a mailbox.
pub struct MailboxSender {
    producer: Producer<u8>,
    scratch: Vec<u8>,
}

impl MailboxSender {
    /// Ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.producer.buffer().capacity()
    }

    /// Free space in bytes.
    pub fn free_space(&self) -> usize {
        self.producer.slots()
    }

    /// Enqueues a message for `receiver_hash`. Returns false, dropping the
    /// message, if the ring lacks space or the message is longer than
    /// [`MAX_BLOCK_ELEMENTS`].
    pub fn try_send(&mut self, receiver_hash: u32, timing: Timing, elements: &[Element]) -> bool {
        let len = record_len(elements);
        if len > self.producer.slots() || elements.len() > MAX_BLOCK_ELEMENTS {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                receiver = receiver_hash,
                bytes = len,
                "mailbox full, message dropped"
            );
            return false;
        }

        let (kind, time) = match timing {
            Timing::At(t) => (0u8, t),
            Timing::After(d) => (1u8, d),
        };
        self.scratch.clear();
        self.scratch.extend_from_slice(&(len as u32).to_le_bytes());
        self.scratch.extend_from_slice(&receiver_hash.to_le_bytes());
        self.scratch.extend_from_slice(&time.to_le_bytes());
        self.scratch.push(kind);
        self.scratch.push(0);
        self.scratch
            .extend_from_slice(&(elements.len() as u16).to_le_bytes());
        for element in elements {
            match element {
                Element::Bang => self.scratch.push(TAG_BANG),
                Element::Float(f) => {
                    self.scratch.push(TAG_FLOAT);
                    self.scratch.extend_from_slice(&f.to_le_bytes());
                }
                Element::Hash(h) => {
                    self.scratch.push(TAG_HASH);
                    self.scratch.extend_from_slice(&h.to_le_bytes());
                }
                Element::Symbol(s) => {
                    let text = s.as_str().as_bytes();
                    self.scratch.push(TAG_SYMBOL);
                    self.scratch.extend_from_slice(&s.hash().to_le_bytes());
                    self.scratch.push(text.len() as u8);
                    self.scratch.extend_from_slice(text);
                }
            }
        }
        debug_assert_eq!(self.scratch.len(), len);

        match self.producer.write_chunk_uninit(len) {
            Ok(chunk) => chunk.fill_from_iter(self.scratch.iter().copied()) == len,
            Err(_) => false,
        }
    }

    /// Enqueues `msg` at its own timestamp.
    pub fn try_send_message(&mut self, receiver_hash: u32, msg: &Message<'_>) -> bool {
        self.try_send(receiver_hash, Timing::At(msg.timestamp()), msg.elements())
    }
}

impl core::fmt::Debug for MailboxSender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MailboxSender")
            .field("capacity", &self.capacity())
            .field("free", &self.free_space())
            .finish()
    }
}

/// Consumer end of a mailbox.
pub struct MailboxReceiver {
    consumer: Consumer<u8>,
    scratch: Vec<u8>,
}

impl MailboxReceiver {
    /// Bytes waiting to be read.
    pub fn pending_bytes(&self) -> usize {
        self.consumer.slots()
    }

    /// True if no record is waiting.
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Takes the next record, replacing the contents of `elements`.
    ///
    /// `elements` is grown to [`MAX_BLOCK_ELEMENTS`] once if it is smaller and
    /// never beyond its capacity, so a preallocated buffer is not reallocated.
    pub fn try_recv(&mut self, elements: &mut Vec<Element>) -> Option<Delivery> {
        let len = {
            let chunk = self.consumer.read_chunk(4).ok()?;
            let (a, b) = chunk.as_slices();
            let mut bytes = [0u8; 4];
            for (dst, src) in bytes.iter_mut().zip(a.iter().chain(b)) {
                *dst = *src;
            }
            u32::from_le_bytes(bytes) as usize
        };
        let chunk = self.consumer.read_chunk(len).ok()?;
        let (a, b) = chunk.as_slices();
        self.scratch.clear();
        self.scratch.extend_from_slice(a);
        self.scratch.extend_from_slice(b);
        chunk.commit_all();
        decode(&self.scratch, elements)
    }

    /// Delivers every waiting record to `f`.
    pub fn drain(&mut self, elements: &mut Vec<Element>, mut f: impl FnMut(Delivery, &[Element])) {
        while let Some(delivery) = self.try_recv(elements) {
            f(delivery, elements);
        }
    }
}

impl core::fmt::Debug for MailboxReceiver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MailboxReceiver")
            .field("pending", &self.pending_bytes())
            .finish()
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn u8(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let out = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(out)
    }

    fn u16(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn decode(record: &[u8], elements: &mut Vec<Element>) -> Option<Delivery> {
    let mut r = Reader {
        bytes: record,
        pos: 4,
    };
    let receiver_hash = r.u32()?;
    let time = r.u32()?;
    let timing = match r.u8()? {
        0 => Timing::At(time),
        _ => Timing::After(time),
    };
    r.u8()?;
    let count = r.u16()?;

    elements.clear();
    elements.reserve(MAX_BLOCK_ELEMENTS);
    for _ in 0..count {
        let element = match r.u8()? {
            TAG_BANG => Element::Bang,
            TAG_FLOAT => Element::Float(f32::from_bits(r.u32()?)),
            TAG_HASH => Element::Hash(r.u32()?),
            TAG_SYMBOL => {
                let hash = r.u32()?;
                let n = r.u8()? as usize;
                Element::Symbol(Symbol::from_parts(hash, r.take(n)?))
            }
            _ => return None,
        };
        if elements.len() < elements.capacity() {
            elements.push(element);
        }
    }
    Some(Delivery {
        receiver_hash,
        timing,
    })
}
