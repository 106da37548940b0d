//! Timestamp-ordered message scheduler.
//!
//! Pending messages are nodes in a preallocated slab, threaded into a
//! doubly-linked list sorted by `(timestamp, insertion order)`. Payloads live
//! in the [`MemoryPool`]. Insertion walks backwards from the tail, so the
//! common case (scheduling at or after the latest pending time) is O(1), and
//! equal timestamps keep FIFO order for deterministic replay.
//!
//! Nodes are identified by [`MessageHandle`], a generational index: freeing a
//! slot bumps its generation so a stale handle never cancels the message that
//! later reuses the slot.
//!
//! # Dispatch boundary
//!
//! [`has_message_before`](MessageQueue::has_message_before) and
//! [`pop_before`](MessageQueue::pop_before) use a strict `<`. The driver asks
//! for everything before the end of the current sub-block, so a message due at
//! exactly the end boundary waits for the next sub-block.

use crate::message::{Element, Message};
use crate::object::ObjectId;
use crate::pool::{MemoryPool, PoolBlock};

const NIL: u32 = u32::MAX;

/// Where a scheduled message is delivered when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Deliver to an inlet of an object (receiver and host traffic).
    Inlet {
        /// Receiving object.
        object: ObjectId,
        /// Inlet index.
        inlet: u16,
    },
    /// Emit from an outlet of an object (its own delayed output).
    Outlet {
        /// Emitting object.
        object: ObjectId,
        /// Outlet index.
        outlet: u16,
    },
}

impl Target {
    /// Object this target belongs to.
    pub fn object(&self) -> ObjectId {
        match *self {
            Target::Inlet { object, .. } | Target::Outlet { object, .. } => object,
        }
    }
}

/// Generational handle to a pending message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    index: u32,
    generation: u32,
}

/// A message removed from the queue by [`MessageQueue::pop_before`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    /// Handle the message was scheduled under (now stale).
    pub handle: MessageHandle,
    /// Delivery target.
    pub target: Target,
    /// Due time in samples.
    pub timestamp: u32,
    /// Number of elements copied into the caller's buffer.
    pub len: usize,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    timestamp: u32,
    target: Target,
    block: PoolBlock,
    generation: u32,
    prev: u32,
    next: u32,
    live: bool,
}

/// Ordered set of pending messages.
#[derive(Debug)]
pub struct MessageQueue {
    pool: MemoryPool,
    nodes: Vec<Node>,
    free: Vec<u32>,
    node_capacity: usize,
    head: u32,
    tail: u32,
    len: usize,
}

impl MessageQueue {
    /// Creates a queue that stores payloads in `pool`.
    ///
    /// The node slab is sized so the pool, not the slab, is always the limit.
    pub fn new(pool: MemoryPool) -> Self {
        let capacity = pool.capacity();
        Self {
            pool,
            nodes: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            node_capacity: capacity,
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing pool.
    pub fn pool(&self) -> &MemoryPool {
        &self.pool
    }

    /// Due time of the earliest pending message.
    pub fn next_timestamp(&self) -> Option<u32> {
        (self.head != NIL).then(|| self.nodes[self.head as usize].timestamp)
    }

    /// True if a message is due strictly before `timestamp`.
    #[inline]
    pub fn has_message_before(&self, timestamp: u32) -> bool {
        self.next_timestamp().is_some_and(|t| t < timestamp)
    }

    /// Schedules a copy of `msg` for `target` at `msg.timestamp()`.
    ///
    /// Returns `None` if the pool cannot hold the payload.
    pub fn schedule(&mut self, target: Target, msg: &Message<'_>) -> Option<MessageHandle> {
        let block = self.pool.alloc_copy(msg.elements())?;
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.nodes.len() < self.node_capacity => {
                self.nodes.push(Node {
                    timestamp: 0,
                    target,
                    block,
                    generation: 0,
                    prev: NIL,
                    next: NIL,
                    live: false,
                });
                (self.nodes.len() - 1) as u32
            }
            None => {
                self.pool.free(block);
                return None;
            }
        };

        let timestamp = msg.timestamp();
        // Last node that is due at or before the new one.
        let mut after = self.tail;
        while after != NIL && self.nodes[after as usize].timestamp > timestamp {
            after = self.nodes[after as usize].prev;
        }
        let before = if after == NIL {
            self.head
        } else {
            self.nodes[after as usize].next
        };

        let node = &mut self.nodes[index as usize];
        node.timestamp = timestamp;
        node.target = target;
        node.block = block;
        node.prev = after;
        node.next = before;
        node.live = true;
        let generation = node.generation;

        if after == NIL {
            self.head = index;
        } else {
            self.nodes[after as usize].next = index;
        }
        if before == NIL {
            self.tail = index;
        } else {
            self.nodes[before as usize].prev = index;
        }
        self.len += 1;

        Some(MessageHandle { index, generation })
    }

    /// Returns the pending message behind `handle`, if it has not fired or been
    /// cancelled.
    pub fn peek(&self, handle: MessageHandle) -> Option<Message<'_>> {
        let node = self.live_node(handle)?;
        Some(Message::new(node.timestamp, self.pool.slice(node.block)))
    }

    /// Target of the pending message behind `handle`.
    pub fn target(&self, handle: MessageHandle) -> Option<Target> {
        self.live_node(handle).map(|n| n.target)
    }

    /// Removes a pending message without delivering it.
    ///
    /// Returns false if the handle is stale.
    pub fn cancel(&mut self, handle: MessageHandle) -> bool {
        if self.live_node(handle).is_none() {
            return false;
        }
        self.release(handle.index);
        true
    }

    /// Removes the earliest message if it is due strictly before `timestamp`,
    /// copying its elements into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than the message.
    pub fn pop_before(&mut self, timestamp: u32, dst: &mut [Element]) -> Option<Fired> {
        if !self.has_message_before(timestamp) {
            return None;
        }
        let index = self.head;
        let node = self.nodes[index as usize];
        let src = self.pool.slice(node.block);
        assert!(
            src.len() <= dst.len(),
            "dispatch stack too small for a {}-element message",
            src.len()
        );
        dst[..src.len()].copy_from_slice(src);
        let fired = Fired {
            handle: MessageHandle {
                index,
                generation: node.generation,
            },
            target: node.target,
            timestamp: node.timestamp,
            len: src.len(),
        };
        self.release(index);
        Some(fired)
    }

    /// Cancels everything.
    pub fn clear(&mut self) {
        while self.head != NIL {
            self.release(self.head);
        }
    }

    fn live_node(&self, handle: MessageHandle) -> Option<&Node> {
        self.nodes
            .get(handle.index as usize)
            .filter(|n| n.live && n.generation == handle.generation)
    }

    fn release(&mut self, index: u32) {
        let node = self.nodes[index as usize];
        if node.prev == NIL {
            self.head = node.next;
        } else {
            self.nodes[node.prev as usize].next = node.next;
        }
        if node.next == NIL {
            self.tail = node.prev;
        } else {
            self.nodes[node.next as usize].prev = node.prev;
        }
        self.pool.free(node.block);

        let slot = &mut self.nodes[index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = NIL;
        slot.next = NIL;
        self.free.push(index);
        self.len -= 1;
    }
}
