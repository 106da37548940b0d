//! Object model shared by control and signal objects.
//!
//! Every node of a patch implements [`Object`]. Control behaviour lives in
//! [`on_message`](Object::on_message), which receives one message on one inlet
//! and emits zero or more messages through an [`Outbox`]. Signal behaviour
//! lives in [`process`](Object::process), called once per sub-block in
//! topological order with the object's input vectors.
//!
//! Objects never hold references to each other. Everything shared (the
//! scheduler, tables, hooks, timing) is reached through an [`ObjectContext`]
//! that the driver builds around each call.
//!
//! # Emission order
//!
//! Emissions are recorded in the order `send` is called. After the handler
//! returns, the driver delivers each one depth-first to every connected inlet
//! before moving to the next. The outbox writes into a preallocated stack
//! owned by the context; running out of stack is fatal.

use core::fmt;

use crate::error::PatchError;
use crate::hash::string_to_hash;
use crate::mailbox::{MailboxSender, Timing};
use crate::message::{Element, Message};
use crate::queue::{MessageHandle, MessageQueue, Target};
use crate::simd::Buf;
use crate::table::{Table, TableId, TableRegistry};

/// Most signal inlets or outlets a single object may declare.
pub const MAX_SIGNAL_PORTS: usize = 8;

/// Callback for print objects: `(print name, message)`.
pub type PrintHook = Box<dyn FnMut(&str, &Message<'_>) + Send>;

/// Callback for extern send objects: `(send name, send hash, message)`.
pub type SendHook = Box<dyn FnMut(&str, u32, &Message<'_>) + Send>;

/// Index of an object inside a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    /// Position in the patch's object list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// A control and/or signal processing node.
pub trait Object: Send {
    /// Short class name used in diagnostics, e.g. `"delay"`.
    fn class_name(&self) -> &'static str;

    /// Number of control inlets.
    fn inlets(&self) -> usize {
        1
    }

    /// Number of control outlets.
    fn outlets(&self) -> usize {
        1
    }

    /// Number of signal inlets.
    fn signal_inlets(&self) -> usize {
        0
    }

    /// Number of signal outlets.
    fn signal_outlets(&self) -> usize {
        0
    }

    /// Called once when the context is built. Resolve tables here.
    fn init(&mut self, _cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        Ok(())
    }

    /// Handles a message arriving on a control inlet.
    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        _msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
    }

    /// Processes one sub-block. `inputs` has `signal_inlets()` vectors and
    /// `outputs` has `signal_outlets()` vectors.
    fn process(&mut self, _cx: &mut ObjectContext<'_>, _inputs: &[Buf], _outputs: &mut [Buf]) {}

    /// A message this object scheduled for one of its outlets is firing now.
    fn on_scheduled(&mut self, _handle: MessageHandle) {}
}

/// What an object sees at construction time.
pub struct InitContext<'a> {
    pub(crate) object: ObjectId,
    pub(crate) class: &'static str,
    pub(crate) sample_rate: f64,
    pub(crate) tables: &'a TableRegistry,
}

impl InitContext<'_> {
    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Resolves a table by name hash or fails with [`PatchError::UnknownTable`].
    pub fn require_table(&self, hash: u32) -> Result<TableId, PatchError> {
        self.tables.find(hash).ok_or(PatchError::UnknownTable {
            object: self.object,
            class: self.class,
            hash,
        })
    }

    /// Resolves a table by name hash.
    pub fn find_table(&self, hash: u32) -> Option<TableId> {
        self.tables.find(hash)
    }

    /// Table by id.
    pub fn table(&self, id: TableId) -> &Table {
        self.tables.by_id(id)
    }
}

/// A table named by an object, resolved at init and re-resolved when a
/// symbol arrives on the object's table inlet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableRef {
    pub(crate) hash: u32,
    pub(crate) id: Option<TableId>,
}

impl TableRef {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            hash: string_to_hash(name),
            id: None,
        }
    }

    /// Resolves the name; an unknown table fails the patch.
    pub(crate) fn init(&mut self, cx: &InitContext<'_>) -> Result<(), PatchError> {
        self.id = Some(cx.require_table(self.hash)?);
        Ok(())
    }

    /// Switches to the table named by element 0. An unknown name detaches.
    pub(crate) fn retarget(&mut self, cx: &ObjectContext<'_>, msg: &Message<'_>) {
        if msg.is_hash_like(0) {
            self.hash = msg.hash(0);
            self.id = cx.find_table(self.hash);
        }
    }
}

/// Engine state reachable from object callbacks.
pub(crate) struct Runtime {
    pub(crate) queue: MessageQueue,
    pub(crate) tables: TableRegistry,
    pub(crate) sample_rate: f64,
    pub(crate) block_start: u32,
    pub(crate) num_inputs: usize,
    pub(crate) num_outputs: usize,
    pub(crate) print_hook: Option<PrintHook>,
    pub(crate) send_hook: Option<SendHook>,
    pub(crate) outbound: Option<MailboxSender>,
    /// Last float published per output parameter hash.
    pub(crate) param_outputs: Vec<(u32, f32)>,
}

impl Runtime {
    pub(crate) fn new(
        queue: MessageQueue,
        tables: TableRegistry,
        sample_rate: f64,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Self {
        Self {
            queue,
            tables,
            sample_rate,
            block_start: 0,
            num_inputs,
            num_outputs,
            print_hook: None,
            send_hook: None,
            outbound: None,
            param_outputs: Vec::new(),
        }
    }

    pub(crate) fn context(&mut self, object: ObjectId, class: &'static str) -> ObjectContext<'_> {
        ObjectContext {
            object,
            class,
            rt: self,
        }
    }
}

/// Per-call view of the engine handed to object callbacks.
pub struct ObjectContext<'a> {
    object: ObjectId,
    class: &'static str,
    rt: &'a mut Runtime,
}

impl ObjectContext<'_> {
    /// Id of the object being called.
    pub fn object_id(&self) -> ObjectId {
        self.object
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.rt.sample_rate
    }

    /// Start of the current sub-block, in samples since context start.
    pub fn current_sample(&self) -> u32 {
        self.rt.block_start
    }

    /// Converts milliseconds to samples.
    pub fn ms_to_samples(&self, ms: f64) -> f64 {
        ms * self.rt.sample_rate / 1000.0
    }

    /// Converts samples to milliseconds.
    pub fn samples_to_ms(&self, samples: f64) -> f64 {
        samples * 1000.0 / self.rt.sample_rate
    }

    /// Number of host input channels.
    pub fn num_input_channels(&self) -> usize {
        self.rt.num_inputs
    }

    /// Number of host output channels.
    pub fn num_output_channels(&self) -> usize {
        self.rt.num_outputs
    }

    /// Schedules `msg` to leave `outlet` of this object at `msg.timestamp()`.
    ///
    /// # Panics
    ///
    /// Panics if the message pool is exhausted. The pool is sized per patch;
    /// running out means the configured `pool_kb` is too small.
    pub fn schedule(&mut self, outlet: usize, msg: &Message<'_>) -> MessageHandle {
        let target = Target::Outlet {
            object: self.object,
            outlet: outlet as u16,
        };
        match self.rt.queue.schedule(target, msg) {
            Some(handle) => handle,
            None => panic!(
                "message pool exhausted while scheduling for {} {} ({} elements, {} pending); increase pool_kb",
                self.class,
                self.object,
                msg.len(),
                self.rt.queue.len()
            ),
        }
    }

    /// Cancels a pending message. Returns false if it already fired.
    pub fn cancel(&mut self, handle: MessageHandle) -> bool {
        self.rt.queue.cancel(handle)
    }

    /// Pending message behind `handle`.
    pub fn scheduled(&self, handle: MessageHandle) -> Option<Message<'_>> {
        self.rt.queue.peek(handle)
    }

    /// Resolves a table by name hash.
    pub fn find_table(&self, hash: u32) -> Option<TableId> {
        self.rt.tables.find(hash)
    }

    /// Table by id.
    pub fn table(&self, id: TableId) -> &Table {
        self.rt.tables.by_id(id)
    }

    /// Mutable table by id.
    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        self.rt.tables.by_id_mut(id)
    }

    /// All tables.
    pub fn tables(&self) -> &TableRegistry {
        &self.rt.tables
    }

    /// Calls the print hook, if one is installed.
    pub fn print(&mut self, name: &str, msg: &Message<'_>) {
        if let Some(hook) = self.rt.print_hook.as_mut() {
            hook(name, msg);
        }
    }

    /// Publishes a message leaving the patch: calls the send hook and copies
    /// it into the output mailbox, if either is configured.
    pub fn send_extern(&mut self, name: &str, hash: u32, msg: &Message<'_>) {
        if let Some(hook) = self.rt.send_hook.as_mut() {
            hook(name, hash, msg);
        }
        if let Some(value) = msg.float(0)
            && let Some(slot) = self.rt.param_outputs.iter_mut().find(|(h, _)| *h == hash)
        {
            slot.1 = value;
        }
        if let Some(outbound) = self.rt.outbound.as_mut() {
            outbound.try_send(hash, Timing::At(msg.timestamp()), msg.elements());
        }
    }
}

/// One recorded emission.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Emission {
    pub(crate) outlet: u16,
    pub(crate) timestamp: u32,
    pub(crate) start: u32,
    pub(crate) len: u32,
}

/// Collects the messages an object emits during one callback.
pub struct Outbox<'a> {
    elements: &'a mut [Element],
    emissions: &'a mut [Emission],
    used: usize,
    count: usize,
}

impl<'a> Outbox<'a> {
    pub(crate) fn new(elements: &'a mut [Element], emissions: &'a mut [Emission]) -> Self {
        Self {
            elements,
            emissions,
            used: 0,
            count: 0,
        }
    }

    /// Emits a copy of `msg` from `outlet`.
    ///
    /// # Panics
    ///
    /// Panics if the dispatch stack is exhausted.
    pub fn send(&mut self, outlet: usize, msg: &Message<'_>) {
        let len = msg.len();
        assert!(
            self.used + len <= self.elements.len() && self.count < self.emissions.len(),
            "message dispatch stack exhausted"
        );
        self.elements[self.used..self.used + len].copy_from_slice(msg.elements());
        self.emissions[self.count] = Emission {
            outlet: outlet as u16,
            timestamp: msg.timestamp(),
            start: self.used as u32,
            len: len as u32,
        };
        self.used += len;
        self.count += 1;
    }

    /// Emits a one-float message.
    pub fn send_float(&mut self, outlet: usize, timestamp: u32, value: f32) {
        self.send(outlet, &Message::new(timestamp, &[Element::Float(value)]));
    }

    /// Emits a bang.
    pub fn send_bang(&mut self, outlet: usize, timestamp: u32) {
        self.send(outlet, &Message::new(timestamp, &[Element::Bang]));
    }

    /// Emits a one-element message.
    pub fn send_element(&mut self, outlet: usize, timestamp: u32, element: Element) {
        self.send(outlet, &Message::new(timestamp, &[element]));
    }

    /// Number of emissions so far.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn used(&self) -> (usize, usize) {
        (self.used, self.count)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Drives a single object outside a full context.

    use super::*;
    use crate::message::OwnedMessage;
    use crate::pool::MemoryPool;

    /// Owns the engine state one object needs in unit tests.
    pub(crate) struct Harness {
        pub(crate) rt: Runtime,
        elements: Vec<Element>,
        emissions: Vec<Emission>,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            Self::with_tables(TableRegistry::new())
        }

        pub(crate) fn with_tables(tables: TableRegistry) -> Self {
            let queue = MessageQueue::new(MemoryPool::new(16));
            Self {
                rt: Runtime::new(queue, tables, 48_000.0, 2, 2),
                elements: vec![Element::Bang; 256],
                emissions: vec![Emission::default(); 64],
            }
        }

        pub(crate) fn init(&mut self, obj: &mut dyn Object) {
            let mut cx = InitContext {
                object: ObjectId(0),
                class: obj.class_name(),
                sample_rate: self.rt.sample_rate,
                tables: &self.rt.tables,
            };
            obj.init(&mut cx).unwrap();
        }

        /// Sends `elements` at `timestamp` to `inlet`, returning emissions.
        pub(crate) fn send(
            &mut self,
            obj: &mut dyn Object,
            inlet: usize,
            timestamp: u32,
            elements: &[Element],
        ) -> Vec<(usize, OwnedMessage)> {
            let msg = Message::new(timestamp, elements);
            let mut out = Outbox::new(&mut self.elements, &mut self.emissions);
            let mut cx = self.rt.context(ObjectId(0), obj.class_name());
            obj.on_message(&mut cx, inlet, &msg, &mut out);
            let (_, count) = out.used();
            self.emissions[..count]
                .iter()
                .map(|e| {
                    let start = e.start as usize;
                    let els = &self.elements[start..start + e.len as usize];
                    (e.outlet as usize, OwnedMessage::new(e.timestamp, els))
                })
                .collect()
        }

        pub(crate) fn float(
            &mut self,
            obj: &mut dyn Object,
            inlet: usize,
            value: f32,
        ) -> Vec<(usize, OwnedMessage)> {
            self.send(obj, inlet, 0, &[Element::Float(value)])
        }

        pub(crate) fn process(&mut self, obj: &mut dyn Object, inputs: &[Buf]) -> Vec<Buf> {
            let mut outputs = vec![Buf::zero(); obj.signal_outlets()];
            let mut cx = self.rt.context(ObjectId(0), obj.class_name());
            obj.process(&mut cx, inputs, &mut outputs);
            outputs
        }

        /// Pops every scheduled message due before `before`.
        pub(crate) fn fire_until(&mut self, before: u32) -> Vec<(Target, OwnedMessage)> {
            let mut out = Vec::new();
            let mut buf = [Element::Bang; 64];
            while let Some(f) = self.rt.queue.pop_before(before, &mut buf) {
                out.push((f.target, OwnedMessage::new(f.timestamp, &buf[..f.len])));
            }
            out
        }
    }

    /// First float of the single emission on `outlet`.
    pub(crate) fn only_float(out: &[(usize, OwnedMessage)], outlet: usize) -> f32 {
        assert_eq!(out.len(), 1, "expected one emission, got {out:?}");
        assert_eq!(out[0].0, outlet);
        out[0].1.as_message().float(0).expect("float element")
    }
}
