//! The engine driver.
//!
//! A [`Context`] owns a compiled [`Patch`], the memory pool and scheduler,
//! the tables, and both mailboxes. Each `process` call:
//!
//! 1. drains the input mailbox into the scheduler,
//! 2. for every sub-block `[b, b + N_SIMD)`, fires each pending message with
//!    timestamp `t < b + N_SIMD` (delivering emissions depth-first), loads the
//!    host inputs, runs the signal program and stores the host outputs.
//!
//! Message timing resolution is therefore one sub-block: a message due
//! mid-vector fires at the start of the vector that contains it. A message due
//! exactly at the end of the last sub-block of a call fires in the next call.
//!
//! # Threads
//!
//! `process` and every `&mut self` method run on the thread that owns the
//! context. Other threads talk to it through a [`ContextSender`] (the input
//! mailbox producer) and read published messages from the output mailbox
//! returned by [`take_output_receiver`](Context::take_output_receiver).
//! Nothing on the processing path allocates, locks or blocks.
//!
//! # Example
//!
//! ```rust
//! use heavy_core::graph::PatchBuilder;
//! use heavy_core::signal::SignalVar;
//! use heavy_core::{Context, ContextOptions, hash::string_to_hash};
//!
//! let mut b = PatchBuilder::new(0, 1);
//! let level = b.add_receive("level");
//! let var = b.add(SignalVar::new(0.0));
//! b.connect(level, 0, var, 0).unwrap();
//! b.dac(var, 0, 0).unwrap();
//!
//! let mut cx = Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default()).unwrap();
//! cx.send_float_to_receiver(string_to_hash("level"), 0.25);
//!
//! let mut out = [0.0f32; 64];
//! let done = cx.process(&[], &mut [&mut out[..]], 64);
//! assert_eq!(done, 64);
//! assert!(out.iter().all(|&s| s == 0.25));
//! ```

use core::fmt;

use crate::error::ContextError;
use crate::graph::{Patch, Routes, SignalStep, receivers_for};
use crate::hash::INIT_RECEIVER_HASH;
use crate::mailbox::{MailboxReceiver, MailboxSender, Timing, mailbox};
use crate::message::{Element, Message, Symbol};
use crate::object::{
    Emission, InitContext, MAX_SIGNAL_PORTS, Object, ObjectId, Outbox, Runtime,
};
use crate::param_info::{ParamDescriptor, ParamKind, ParameterInfo};
use crate::pool::{MAX_BLOCK_ELEMENTS, MemoryPool};
use crate::queue::{MessageQueue, Target};
use crate::simd::{Buf, N_SIMD, align_down};
use crate::table::Table;

/// Elements available to one dispatch chain.
const DISPATCH_ELEMENTS: usize = 4096;
/// Emissions available to one dispatch chain.
const DISPATCH_EMISSIONS: usize = 1024;

/// Sizing for a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Message pool budget in kilobytes.
    pub pool_kb: usize,
    /// Input mailbox size in kilobytes; 0 disables [`ContextSender`].
    pub input_queue_kb: usize,
    /// Output mailbox size in kilobytes; 0 disables the output mailbox.
    pub output_queue_kb: usize,
    /// Largest block the interleaved path handles in one pass.
    pub max_block_size: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            pool_kb: 10,
            input_queue_kb: 2,
            output_queue_kb: 0,
            max_block_size: 4096,
        }
    }
}

impl ContextOptions {
    /// Sets the pool budget.
    pub const fn with_pool_kb(mut self, kb: usize) -> Self {
        self.pool_kb = kb;
        self
    }

    /// Sets the input mailbox size.
    pub const fn with_input_queue_kb(mut self, kb: usize) -> Self {
        self.input_queue_kb = kb;
        self
    }

    /// Sets the output mailbox size.
    pub const fn with_output_queue_kb(mut self, kb: usize) -> Self {
        self.output_queue_kb = kb;
        self
    }

    /// Sets the interleaved block limit.
    pub const fn with_max_block_size(mut self, frames: usize) -> Self {
        self.max_block_size = frames;
        self
    }
}

/// Sends messages to a context from another thread.
///
/// Every method returns false, dropping the message, if the input mailbox is
/// full. Messages are scheduled when the next `process` call begins.
pub struct ContextSender {
    tx: MailboxSender,
    sample_rate: f64,
}

impl ContextSender {
    /// Sends a float to `receiver_hash` at the start of the next block.
    pub fn send_float_to_receiver(&mut self, receiver_hash: u32, value: f32) -> bool {
        self.tx
            .try_send(receiver_hash, Timing::After(0), &[Element::Float(value)])
    }

    /// Sends a bang to `receiver_hash` at the start of the next block.
    pub fn send_bang_to_receiver(&mut self, receiver_hash: u32) -> bool {
        self.tx
            .try_send(receiver_hash, Timing::After(0), &[Element::Bang])
    }

    /// Sends a symbol to `receiver_hash` at the start of the next block.
    pub fn send_symbol_to_receiver(&mut self, receiver_hash: u32, symbol: &str) -> bool {
        self.tx.try_send(
            receiver_hash,
            Timing::After(0),
            &[Element::Symbol(Symbol::new(symbol))],
        )
    }

    /// Sends a message due at an absolute timestamp. Past timestamps fire in
    /// the next block.
    pub fn send_message_to_receiver(
        &mut self,
        receiver_hash: u32,
        timestamp: u32,
        elements: &[Element],
    ) -> bool {
        self.tx
            .try_send(receiver_hash, Timing::At(timestamp), elements)
    }

    /// Sends a message `delay_ms` after the start of the next block.
    pub fn send_message_to_receiver_after(
        &mut self,
        receiver_hash: u32,
        delay_ms: f64,
        elements: &[Element],
    ) -> bool {
        let delay = (delay_ms.max(0.0) * self.sample_rate / 1000.0) as u32;
        self.tx
            .try_send(receiver_hash, Timing::After(delay), elements)
    }

    /// Free mailbox space in bytes.
    pub fn free_space(&self) -> usize {
        self.tx.free_space()
    }
}

impl fmt::Debug for ContextSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSender")
            .field("free_space", &self.tx.free_space())
            .finish_non_exhaustive()
    }
}

/// Schedules `msg` on inlet 0 of every receiver listening on `hash`.
/// Returns false if nothing listens.
///
/// # Panics
///
/// Panics if `msg` is longer than [`MAX_BLOCK_ELEMENTS`] or the message pool
/// is exhausted. Both mean the patch is configured too small.
fn schedule_to_receivers(
    queue: &mut MessageQueue,
    receivers: &[(u32, ObjectId)],
    hash: u32,
    msg: &Message<'_>,
) -> bool {
    assert!(
        msg.len() <= MAX_BLOCK_ELEMENTS,
        "message of {} elements for receiver 0x{hash:08X} exceeds {MAX_BLOCK_ELEMENTS}",
        msg.len()
    );
    let targets = receivers_for(receivers, hash);
    for &(_, object) in targets {
        let target = Target::Inlet { object, inlet: 0 };
        if queue.schedule(target, msg).is_none() {
            panic!(
                "message pool exhausted while scheduling for receiver 0x{hash:08X} ({} elements, {} pending); increase pool_kb",
                msg.len(),
                queue.len()
            );
        }
    }
    !targets.is_empty()
}

/// Preallocated scratch for message delivery.
struct Scratch {
    elements: Vec<Element>,
    emissions: Vec<Emission>,
    fired: Vec<Element>,
    inbound: Vec<Element>,
}

/// Routes messages through the control graph.
struct Dispatcher<'a> {
    objects: &'a mut [Box<dyn Object>],
    routes: &'a Routes,
    rt: &'a mut Runtime,
}

impl Dispatcher<'_> {
    /// Emits `msg` from `outlet` of `from` to every connected inlet, in
    /// connection order.
    fn route(
        &mut self,
        elements: &mut [Element],
        emissions: &mut [Emission],
        from: ObjectId,
        outlet: usize,
        msg: &Message<'_>,
    ) {
        let routes = self.routes;
        for &(to, inlet) in routes.targets(from, outlet) {
            self.deliver(elements, emissions, to, inlet as usize, msg);
        }
    }

    /// Calls the object's handler, then routes each of its emissions before
    /// the next one. Emissions live on the scratch stack below the slices
    /// handed further down.
    fn deliver(
        &mut self,
        elements: &mut [Element],
        emissions: &mut [Emission],
        to: ObjectId,
        inlet: usize,
        msg: &Message<'_>,
    ) {
        let Some(object) = self.objects.get_mut(to.index()) else {
            return;
        };
        let (used, count) = {
            let mut out = Outbox::new(elements, emissions);
            let mut cx = self.rt.context(to, object.class_name());
            object.on_message(&mut cx, inlet, msg, &mut out);
            out.used()
        };
        let (emitted, rest) = elements.split_at_mut(used);
        let (sent, rest_emissions) = emissions.split_at_mut(count);
        for e in sent.iter() {
            let start = e.start as usize;
            let m = Message::new(e.timestamp, &emitted[start..start + e.len as usize]);
            self.route(rest, rest_emissions, to, e.outlet as usize, &m);
        }
    }
}

/// A running patch.
pub struct Context {
    objects: Vec<Box<dyn Object>>,
    routes: Routes,
    receivers: Vec<(u32, ObjectId)>,
    steps: Vec<SignalStep>,
    dac: Vec<u16>,
    registers: Vec<Buf>,
    rt: Runtime,
    params: Vec<ParamDescriptor>,
    param_values: Vec<f32>,
    inbound: Option<MailboxReceiver>,
    sender: Option<MailboxSender>,
    outbound: Option<MailboxReceiver>,
    scratch: Scratch,
    interleave: Vec<f32>,
    interleave_frames: usize,
    elapsed: u32,
}

impl Context {
    /// Initialises every object of `patch` and fires the load bang.
    pub fn new(
        patch: Patch,
        sample_rate: f64,
        options: ContextOptions,
    ) -> Result<Self, ContextError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ContextError::InvalidSampleRate(sample_rate));
        }
        if options.max_block_size < N_SIMD {
            return Err(ContextError::InvalidBlockSize(options.max_block_size));
        }

        let Patch {
            mut objects,
            routes,
            receivers,
            steps,
            dac,
            register_count,
            tables,
            parameters,
            num_inputs,
            num_outputs,
        } = patch;

        let queue = MessageQueue::new(MemoryPool::new(options.pool_kb));
        let mut rt = Runtime::new(queue, tables, sample_rate, num_inputs, num_outputs);
        rt.param_outputs = parameters
            .iter()
            .filter(|p| p.kind == ParamKind::ParameterOut)
            .map(|p| (p.hash, p.default))
            .collect();

        for (i, object) in objects.iter_mut().enumerate() {
            let mut cx = InitContext {
                object: ObjectId(i as u32),
                class: object.class_name(),
                sample_rate,
                tables: &rt.tables,
            };
            object.init(&mut cx)?;
        }

        let (sender, inbound) = if options.input_queue_kb > 0 {
            let (tx, rx) = mailbox(options.input_queue_kb * 1024);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let outbound = if options.output_queue_kb > 0 {
            let (tx, rx) = mailbox(options.output_queue_kb * 1024);
            rt.outbound = Some(tx);
            Some(rx)
        } else {
            None
        };

        let interleave_frames = align_down(options.max_block_size);
        let param_values = parameters.iter().map(|p| p.default).collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "context_new: {} objects, {} registers, sr={sample_rate}, pool={}kb, in={}kb, out={}kb",
            objects.len(),
            register_count,
            options.pool_kb,
            options.input_queue_kb,
            options.output_queue_kb
        );

        let mut cx = Self {
            objects,
            routes,
            receivers,
            steps,
            dac,
            registers: vec![Buf::zero(); register_count],
            rt,
            params: parameters,
            param_values,
            inbound,
            sender,
            outbound,
            scratch: Scratch {
                elements: vec![Element::Bang; DISPATCH_ELEMENTS],
                emissions: vec![Emission::default(); DISPATCH_EMISSIONS],
                fired: vec![Element::Bang; MAX_BLOCK_ELEMENTS],
                inbound: Vec::with_capacity(MAX_BLOCK_ELEMENTS),
            },
            interleave: vec![0.0; interleave_frames * (num_inputs + num_outputs)],
            interleave_frames,
            elapsed: 0,
        };

        for i in 0..cx.params.len() {
            let p = &cx.params[i];
            if p.kind == ParamKind::ParameterIn {
                let (hash, value) = (p.hash, p.default);
                cx.schedule_for_receiver(hash, &Message::new(0, &[Element::Float(value)]));
            }
        }
        cx.schedule_for_receiver(INIT_RECEIVER_HASH, &Message::new(0, &[Element::Bang]));
        Ok(cx)
    }

    // --- Host messages ---

    /// Schedules `msg` for every receiver listening on `hash`. Returns false
    /// if nothing listens.
    fn schedule_for_receiver(&mut self, hash: u32, msg: &Message<'_>) -> bool {
        schedule_to_receivers(&mut self.rt.queue, &self.receivers, hash, msg)
    }

    /// Sends a float to `receiver_hash`, due at the start of the next block.
    pub fn send_float_to_receiver(&mut self, receiver_hash: u32, value: f32) -> bool {
        let now = self.elapsed;
        self.schedule_for_receiver(receiver_hash, &Message::new(now, &[Element::Float(value)]))
    }

    /// Sends a bang to `receiver_hash`, due at the start of the next block.
    pub fn send_bang_to_receiver(&mut self, receiver_hash: u32) -> bool {
        let now = self.elapsed;
        self.schedule_for_receiver(receiver_hash, &Message::new(now, &[Element::Bang]))
    }

    /// Sends a symbol to `receiver_hash`, due at the start of the next block.
    pub fn send_symbol_to_receiver(&mut self, receiver_hash: u32, symbol: &str) -> bool {
        let now = self.elapsed;
        let elements = [Element::Symbol(Symbol::new(symbol))];
        self.schedule_for_receiver(receiver_hash, &Message::new(now, &elements))
    }

    /// Sends a message due at `timestamp` (samples since start). Timestamps in
    /// the past fire at the start of the next block.
    ///
    /// # Panics
    ///
    /// Panics if the message pool cannot hold the message, like every other
    /// send on this thread.
    pub fn send_message_to_receiver(
        &mut self,
        receiver_hash: u32,
        timestamp: u32,
        elements: &[Element],
    ) -> bool {
        let at = timestamp.max(self.elapsed);
        self.schedule_for_receiver(receiver_hash, &Message::new(at, elements))
    }

    /// Sends a message due `delay_ms` after the start of the next block.
    pub fn send_message_to_receiver_after(
        &mut self,
        receiver_hash: u32,
        delay_ms: f64,
        elements: &[Element],
    ) -> bool {
        let delay = self.ms_to_samples(delay_ms.max(0.0)) as u32;
        let at = self.elapsed.wrapping_add(delay);
        self.schedule_for_receiver(receiver_hash, &Message::new(at, elements))
    }

    /// Hands out the input mailbox producer for use on another thread.
    /// Returns `None` after the first call or if the input mailbox is disabled.
    pub fn sender(&mut self) -> Option<ContextSender> {
        let sample_rate = self.rt.sample_rate;
        self.sender
            .take()
            .map(|tx| ContextSender { tx, sample_rate })
    }

    /// Takes the consumer end of the output mailbox, if one was configured.
    pub fn take_output_receiver(&mut self) -> Option<MailboxReceiver> {
        self.outbound.take()
    }

    /// Installs the callback for print objects.
    pub fn set_print_hook(&mut self, hook: impl FnMut(&str, &Message<'_>) + Send + 'static) {
        self.rt.print_hook = Some(Box::new(hook));
    }

    /// Installs the callback for external sends.
    pub fn set_send_hook(
        &mut self,
        hook: impl FnMut(&str, u32, &Message<'_>) + Send + 'static,
    ) {
        self.rt.send_hook = Some(Box::new(hook));
    }

    // --- Processing ---

    /// Processes `n` frames of non-interleaved audio.
    ///
    /// Only the largest multiple of `N_SIMD` not exceeding `n` (and the
    /// shortest channel) is processed; the count is returned. Missing input
    /// channels read silence; missing output channels are skipped.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], n: usize) -> usize {
        let mut frames = n;
        for ch in inputs.iter().take(self.rt.num_inputs) {
            frames = frames.min(ch.len());
        }
        for ch in outputs.iter().take(self.rt.num_outputs) {
            frames = frames.min(ch.len());
        }
        self.render(
            frames,
            |c, off| inputs.get(c).map_or(Buf::zero(), |ch| Buf::load(&ch[off..])),
            |c, off, v| {
                if let Some(ch) = outputs.get_mut(c) {
                    v.store(&mut ch[off..]);
                }
            },
        )
    }

    /// Processes channel-major buffers: channel `c` occupies
    /// `[c * n, (c + 1) * n)`.
    pub fn process_inline(&mut self, input: &[f32], output: &mut [f32], n: usize) -> usize {
        let (nin, nout) = (self.rt.num_inputs, self.rt.num_outputs);
        if input.len() < nin * n || output.len() < nout * n {
            debug_assert!(false, "process_inline buffers shorter than {n} frames");
            return 0;
        }
        self.render(
            n,
            |c, off| Buf::load(&input[c * n + off..]),
            |c, off, v| v.store(&mut output[c * n + off..]),
        )
    }

    /// Processes frame-major (interleaved) buffers, at most
    /// `max_block_size` frames per pass.
    pub fn process_inline_interleaved(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        n: usize,
    ) -> usize {
        let (nin, nout) = (self.rt.num_inputs, self.rt.num_outputs);
        let mut frames = n;
        if nin > 0 {
            frames = frames.min(input.len() / nin);
        }
        if nout > 0 {
            frames = frames.min(output.len() / nout);
        }
        let frames = align_down(frames);

        let mut scratch = core::mem::take(&mut self.interleave);
        let mut done = 0;
        while done < frames {
            let chunk = (frames - done).min(self.interleave_frames);
            let (ins, outs) = scratch.split_at_mut(nin * chunk);
            for c in 0..nin {
                for i in 0..chunk {
                    ins[c * chunk + i] = input[(done + i) * nin + c];
                }
            }
            self.render(
                chunk,
                |c, off| Buf::load(&ins[c * chunk + off..]),
                |c, off, v| v.store(&mut outs[c * chunk + off..]),
            );
            for c in 0..nout {
                for i in 0..chunk {
                    output[(done + i) * nout + c] = outs[c * chunk + i];
                }
            }
            done += chunk;
        }
        self.interleave = scratch;
        frames
    }

    /// Drains the mailbox, then runs sub-blocks over `n` frames.
    fn render(
        &mut self,
        n: usize,
        mut load: impl FnMut(usize, usize) -> Buf,
        mut store: impl FnMut(usize, usize, Buf),
    ) -> usize {
        let n = align_down(n);
        self.drain_inbound();
        let mut off = 0;
        while off < n {
            let start = self.elapsed;
            self.rt.block_start = start;
            self.dispatch_before(start.wrapping_add(N_SIMD as u32));
            for c in 0..self.rt.num_inputs {
                self.registers[1 + c] = load(c, off);
            }
            self.run_signal();
            for (c, &reg) in self.dac.iter().enumerate() {
                store(c, off, self.registers[reg as usize]);
            }
            off += N_SIMD;
            self.elapsed = self.elapsed.wrapping_add(N_SIMD as u32);
        }
        self.rt.block_start = self.elapsed;
        n
    }

    /// Moves mailbox records into the scheduler.
    fn drain_inbound(&mut self) {
        let Some(inbound) = self.inbound.as_mut() else {
            return;
        };
        let now = self.elapsed;
        while let Some(delivery) = inbound.try_recv(&mut self.scratch.inbound) {
            let at = match delivery.timing {
                Timing::At(t) => t.max(now),
                Timing::After(delay) => now.wrapping_add(delay),
            };
            let msg = Message::new(at, &self.scratch.inbound);
            schedule_to_receivers(
                &mut self.rt.queue,
                &self.receivers,
                delivery.receiver_hash,
                &msg,
            );
        }
    }

    /// Fires every pending message due before `boundary`.
    fn dispatch_before(&mut self, boundary: u32) {
        let Scratch {
            elements,
            emissions,
            fired,
            ..
        } = &mut self.scratch;
        let mut dispatcher = Dispatcher {
            objects: &mut self.objects,
            routes: &self.routes,
            rt: &mut self.rt,
        };
        while let Some(f) = dispatcher.rt.queue.pop_before(boundary, fired) {
            let msg = Message::new(f.timestamp, &fired[..f.len]);
            match f.target {
                Target::Inlet { object, inlet } => {
                    dispatcher.deliver(elements, emissions, object, inlet as usize, &msg);
                }
                Target::Outlet { object, outlet } => {
                    if let Some(o) = dispatcher.objects.get_mut(object.index()) {
                        o.on_scheduled(f.handle);
                    }
                    dispatcher.route(elements, emissions, object, outlet as usize, &msg);
                }
            }
        }
    }

    /// Runs the signal program for one sub-block.
    fn run_signal(&mut self) {
        let Self {
            steps,
            objects,
            registers,
            rt,
            ..
        } = self;
        for step in steps.iter() {
            match *step {
                SignalStep::Clear { dst } => registers[dst as usize] = Buf::zero(),
                SignalStep::Accumulate { src, dst } => {
                    let v = registers[src as usize];
                    registers[dst as usize] += v;
                }
                SignalStep::Process {
                    object,
                    inputs,
                    outputs,
                } => {
                    let obj = &mut objects[object.index()];
                    let (n_in, n_out) = (obj.signal_inlets(), obj.signal_outlets());
                    let mut ins = [Buf::zero(); MAX_SIGNAL_PORTS];
                    for (dst, &reg) in ins.iter_mut().zip(&inputs[..n_in]) {
                        *dst = registers[reg as usize];
                    }
                    let mut outs = [Buf::zero(); MAX_SIGNAL_PORTS];
                    let mut cx = rt.context(object, obj.class_name());
                    obj.process(&mut cx, &ins[..n_in], &mut outs[..n_out]);
                    for (&reg, out) in outputs[..n_out].iter().zip(&outs) {
                        registers[reg as usize] = *out;
                    }
                }
            }
        }
    }

    // --- Tables ---

    /// Table named by `hash`.
    pub fn table(&self, hash: u32) -> Option<&Table> {
        self.rt.tables.get(hash)
    }

    /// Mutable table named by `hash`.
    pub fn table_mut(&mut self, hash: u32) -> Option<&mut Table> {
        self.rt.tables.get_mut(hash)
    }

    /// Resizes a table. Not for the audio thread. Returns false for an
    /// unknown table.
    pub fn resize_table(&mut self, hash: u32, size: usize) -> bool {
        let Some(table) = self.rt.tables.get_mut(hash) else {
            return false;
        };
        table.resize(size);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "table_resize: 0x{hash:08X} -> {size} ({} allocated)",
            table.allocated()
        );
        true
    }

    // --- Introspection ---

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.rt.sample_rate
    }

    /// Samples processed so far; the start time of the next block.
    pub fn current_sample(&self) -> u32 {
        self.elapsed
    }

    /// Host input channels.
    pub fn num_input_channels(&self) -> usize {
        self.rt.num_inputs
    }

    /// Host output channels.
    pub fn num_output_channels(&self) -> usize {
        self.rt.num_outputs
    }

    /// Converts samples to milliseconds.
    pub fn samples_to_ms(&self, samples: f64) -> f64 {
        samples * 1000.0 / self.rt.sample_rate
    }

    /// Converts milliseconds to samples.
    pub fn ms_to_samples(&self, ms: f64) -> f64 {
        ms * self.rt.sample_rate / 1000.0
    }

    /// Pool high-water mark in elements.
    pub fn pool_high_water_mark(&self) -> usize {
        self.rt.queue.pool().high_water_mark()
    }

    /// Pool capacity in elements.
    pub fn pool_capacity(&self) -> usize {
        self.rt.queue.pool().capacity()
    }

    /// Messages waiting in the scheduler.
    pub fn pending_messages(&self) -> usize {
        self.rt.queue.len()
    }

    /// Number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Exposed parameters and events.
    pub fn parameters(&self) -> &[ParamDescriptor] {
        &self.params
    }
}

impl ParameterInfo for Context {
    fn param_count(&self) -> usize {
        self.params.len()
    }

    fn param_info(&self, index: usize) -> Option<&ParamDescriptor> {
        self.params.get(index)
    }

    fn get_param(&self, index: usize) -> f32 {
        let Some(p) = self.params.get(index) else {
            return 0.0;
        };
        match p.kind {
            ParamKind::ParameterIn => self.param_values[index],
            ParamKind::ParameterOut => self
                .rt
                .param_outputs
                .iter()
                .find(|(h, _)| *h == p.hash)
                .map_or(p.default, |&(_, v)| v),
            ParamKind::EventIn | ParamKind::EventOut => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        let Some(p) = self.params.get(index) else {
            return;
        };
        let (kind, hash, value) = (p.kind, p.hash, p.clamp(value));
        match kind {
            ParamKind::ParameterIn => {
                self.param_values[index] = value;
                self.send_float_to_receiver(hash, value);
            }
            ParamKind::EventIn => {
                self.send_bang_to_receiver(hash);
            }
            ParamKind::ParameterOut | ParamKind::EventOut => {}
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("objects", &self.objects.len())
            .field("sample_rate", &self.rt.sample_rate)
            .field("elapsed", &self.elapsed)
            .field("pending", &self.rt.queue.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Delay, Print, Tabwrite};
    use crate::graph::PatchBuilder;
    use crate::hash::string_to_hash;
    use crate::message::OwnedMessage;
    use crate::signal::{Del1, SignalVar};
    use std::sync::{Arc, Mutex};

    const LEVEL: u32 = string_to_hash("level");

    /// receive "level" → var~ → dac 0.
    fn level_patch() -> PatchBuilder {
        let mut b = PatchBuilder::new(0, 1);
        let r = b.add_receive("level");
        let v = b.add(SignalVar::new(0.0));
        b.connect(r, 0, v, 0).unwrap();
        b.dac(v, 0, 0).unwrap();
        b
    }

    fn context(b: PatchBuilder) -> Context {
        Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default()).unwrap()
    }

    fn render(cx: &mut Context, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n];
        assert_eq!(cx.process(&[], &mut [&mut out[..]], n), n);
        out
    }

    fn printed(cx: &mut Context) -> Arc<Mutex<Vec<(String, OwnedMessage)>>> {
        let log: Arc<Mutex<Vec<(String, OwnedMessage)>>> = Arc::default();
        let sink = Arc::clone(&log);
        cx.set_print_hook(move |name, msg| {
            sink.lock()
                .unwrap()
                .push((name.to_owned(), OwnedMessage::from_message(msg)));
        });
        log
    }

    #[test]
    fn rejects_bad_options() {
        let patch = || PatchBuilder::new(0, 0).build().unwrap();
        assert_eq!(
            Context::new(patch(), 0.0, ContextOptions::default()).unwrap_err(),
            ContextError::InvalidSampleRate(0.0)
        );
        assert!(Context::new(patch(), f64::NAN, ContextOptions::default()).is_err());
        let opts = ContextOptions::default().with_max_block_size(N_SIMD - 1);
        assert_eq!(
            Context::new(patch(), 48_000.0, opts).unwrap_err(),
            ContextError::InvalidBlockSize(N_SIMD - 1)
        );
    }

    #[test]
    fn unknown_table_fails_init() {
        let mut b = PatchBuilder::new(0, 0);
        b.add(Tabwrite::new("missing"));
        let err = Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ContextError::Patch(crate::error::PatchError::UnknownTable { .. })
        ));
    }

    #[test]
    fn load_bang_fires_in_first_block() {
        let mut b = PatchBuilder::new(0, 0);
        let init = b.add_receive("__hv_init");
        let p = b.add(Print::new("init"));
        b.connect(init, 0, p, 0).unwrap();
        let mut cx = context(b);
        let log = printed(&mut cx);
        assert_eq!(cx.pending_messages(), 1);
        render(&mut cx, N_SIMD);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "init");
        assert_eq!(log[0].1.to_string(), "bang");
    }

    #[test]
    fn messages_fire_at_sub_block_start() {
        let mut cx = context(level_patch());
        let t = N_SIMD as u32 + 1;
        assert!(cx.send_message_to_receiver(LEVEL, t, &[Element::Float(1.0)]));
        let out = render(&mut cx, 4 * N_SIMD);
        let boundary = (t as usize / N_SIMD) * N_SIMD;
        assert!(out[..boundary].iter().all(|&s| s == 0.0));
        assert!(out[boundary..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn end_boundary_defers_to_next_call() {
        let mut cx = context(level_patch());
        let n = 2 * N_SIMD;
        cx.send_message_to_receiver(LEVEL, n as u32, &[Element::Float(2.0)]);
        assert!(render(&mut cx, n).iter().all(|&s| s == 0.0));
        assert_eq!(cx.pending_messages(), 1);
        assert_eq!(render(&mut cx, N_SIMD)[0], 2.0);
    }

    #[test]
    fn partial_blocks_are_truncated() {
        let mut cx = context(level_patch());
        let mut out = vec![0.0; N_SIMD + N_SIMD.saturating_sub(1)];
        let n = out.len();
        assert_eq!(cx.process(&[], &mut [&mut out[..]], n), align_down(n));
        assert_eq!(cx.current_sample(), align_down(n) as u32);
    }

    #[test]
    fn unknown_receiver_is_ignored() {
        let mut cx = context(level_patch());
        assert!(!cx.send_float_to_receiver(string_to_hash("nobody"), 1.0));
        assert_eq!(cx.pending_messages(), 0);
    }

    #[test]
    fn delay_then_print() {
        let mut b = PatchBuilder::new(0, 0);
        let r = b.add_receive("go");
        let d = b.add(Delay::new(1.0));
        let p = b.add(Print::new("late"));
        b.connect(r, 0, d, 0).unwrap();
        b.connect(d, 0, p, 0).unwrap();
        let mut cx = context(b);
        let log = printed(&mut cx);
        cx.send_bang_to_receiver(string_to_hash("go"));
        render(&mut cx, 32);
        assert!(log.lock().unwrap().is_empty());
        render(&mut cx, 32);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1.timestamp(), 48);
    }

    #[test]
    fn adc_to_dac_with_one_sample_delay() {
        let mut b = PatchBuilder::new(1, 2);
        let d = b.add(Del1::new());
        b.adc(0, d, 0).unwrap();
        b.dac(d, 0, 0).unwrap();
        b.dac(d, 0, 1).unwrap();
        let mut cx = context(b);
        let input: Vec<f32> = (1..=16).map(|i| i as f32).collect();
        let (mut l, mut r) = (vec![0.0; 16], vec![0.0; 16]);
        cx.process(&[&input], &mut [&mut l, &mut r], 16);
        assert_eq!(l[0], 0.0);
        assert_eq!(&l[1..], &input[..15]);
        assert_eq!(l, r);
    }

    /// Two independent one-sample delays, adc n → dac n.
    fn stereo_delay(options: ContextOptions) -> Context {
        let mut b = PatchBuilder::new(2, 2);
        for ch in 0..2 {
            let d = b.add(Del1::new());
            b.adc(ch, d, 0).unwrap();
            b.dac(d, 0, ch).unwrap();
        }
        Context::new(b.build().unwrap(), 48_000.0, options).unwrap()
    }

    #[test]
    fn inline_layouts_match_process() {
        let n = 8 * N_SIMD;
        let left: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let right: Vec<f32> = (0..n).map(|i| -(i as f32) * 0.5).collect();

        let mut a = stereo_delay(ContextOptions::default());
        let (mut l, mut r) = (vec![0.0; n], vec![0.0; n]);
        a.process(&[&left, &right], &mut [&mut l, &mut r], n);
        assert_eq!(&l[1..], &left[..n - 1]);

        let mut b = stereo_delay(ContextOptions::default());
        let planar_in: Vec<f32> = left.iter().chain(&right).copied().collect();
        let mut planar_out = vec![0.0; 2 * n];
        assert_eq!(b.process_inline(&planar_in, &mut planar_out, n), n);
        assert_eq!(&planar_out[..n], &l[..]);
        assert_eq!(&planar_out[n..], &r[..]);

        // Smaller than the buffer, so the interleaved path runs in chunks.
        let mut c = stereo_delay(ContextOptions::default().with_max_block_size(3 * N_SIMD));
        let interleaved_in: Vec<f32> = left
            .iter()
            .zip(&right)
            .flat_map(|(&x, &y)| [x, y])
            .collect();
        let mut interleaved_out = vec![0.0; 2 * n];
        assert_eq!(
            c.process_inline_interleaved(&interleaved_in, &mut interleaved_out, n),
            n
        );
        for i in 0..n {
            assert_eq!(interleaved_out[2 * i], l[i]);
            assert_eq!(interleaved_out[2 * i + 1], r[i]);
        }
    }

    #[test]
    fn sender_crosses_threads() {
        let mut cx = context(level_patch());
        let mut tx = cx.sender().unwrap();
        assert!(cx.sender().is_none());
        std::thread::spawn(move || assert!(tx.send_float_to_receiver(LEVEL, 0.5)))
            .join()
            .unwrap();
        assert_eq!(render(&mut cx, N_SIMD)[0], 0.5);
    }

    #[test]
    fn disabled_input_queue_has_no_sender() {
        let opts = ContextOptions::default().with_input_queue_kb(0);
        let mut cx = Context::new(level_patch().build().unwrap(), 48_000.0, opts).unwrap();
        assert!(cx.sender().is_none());
        assert!(cx.send_float_to_receiver(LEVEL, 3.0));
        assert_eq!(render(&mut cx, N_SIMD)[0], 3.0);
    }

    #[test]
    fn parameters_round_trip() {
        let mut b = level_patch();
        let s = b.add_send("meter", true);
        let r = b.add_receive("level");
        b.connect(r, 0, s, 0).unwrap();
        b.add_parameter(ParamDescriptor::new("level", ParamKind::ParameterIn, 0.0, 1.0, 0.25));
        b.add_parameter(ParamDescriptor::new("meter", ParamKind::ParameterOut, 0.0, 1.0, 0.0));
        let opts = ContextOptions::default().with_output_queue_kb(1);
        let mut cx = Context::new(b.build().unwrap(), 48_000.0, opts).unwrap();
        let mut outbox = cx.take_output_receiver().unwrap();

        // Defaults are applied at start.
        assert_eq!(render(&mut cx, N_SIMD)[0], 0.25);
        assert_eq!(cx.get_param(1), 0.25);

        let level = cx.find_param_by_name("LEVEL").unwrap();
        cx.set_param(level, 4.0);
        assert_eq!(cx.get_param(level), 1.0);
        assert_eq!(render(&mut cx, N_SIMD)[0], 1.0);
        assert_eq!(cx.get_param(1), 1.0);

        let mut scratch = Vec::new();
        let mut published = Vec::new();
        outbox.drain(&mut scratch, |d, els| published.push((d.receiver_hash, els.to_vec())));
        assert_eq!(
            published,
            vec![
                (string_to_hash("meter"), vec![Element::Float(0.25)]),
                (string_to_hash("meter"), vec![Element::Float(1.0)]),
            ]
        );
    }

    #[test]
    fn tables_by_hash() {
        let mut b = PatchBuilder::new(0, 0);
        b.add_table("buf", 10);
        let mut cx = context(b);
        let h = string_to_hash("buf");
        assert_eq!(cx.table(h).unwrap().size(), 10);
        cx.table_mut(h).unwrap().write(3, 1.5);
        assert!(cx.resize_table(h, 20));
        assert_eq!(cx.table(h).unwrap().size(), 20);
        assert_eq!(cx.table(h).unwrap().read(3), 1.5);
        assert!(!cx.resize_table(1, 4));
    }

    #[test]
    fn time_conversions() {
        let cx = context(PatchBuilder::new(0, 0));
        assert_eq!(cx.ms_to_samples(1.0), 48.0);
        assert_eq!(cx.samples_to_ms(480.0), 10.0);
        assert_eq!(cx.sample_rate(), 48_000.0);
        assert_eq!(cx.num_output_channels(), 0);
    }
}
