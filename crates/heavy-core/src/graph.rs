//! Patch construction and compilation.
//!
//! A patch is edited through [`PatchBuilder`] (objects, control and signal
//! connections, named receivers, tables, exposed parameters) and compiled once
//! by [`build()`](PatchBuilder::build) into an immutable [`Patch`] that a
//! [`Context`](crate::Context) executes.
//!
//! # Compilation
//!
//! 1. Validate port and channel indices (also checked eagerly on connect).
//! 2. Wire every [`Send`] to every [`Receive`] with the same name hash.
//! 3. Flatten control connections into per-outlet target lists, in the order
//!    they were declared.
//! 4. Sort the signal objects topologically (Kahn's algorithm, lowest object
//!    id first among ready nodes, so the order is deterministic).
//! 5. Assign signal registers and emit a flat [`SignalStep`] list.
//!
//! # Signal registers
//!
//! | Register | Holds |
//! |----------|-------|
//! | 0 | silence, never written |
//! | `1..=inputs` | host input channels |
//! | next | every signal outlet, in topological order |
//! | next | mix registers for inlets and dac channels fed by several outlets |
//!
//! An unconnected signal inlet reads register 0. An inlet with several sources
//! reads their sum, accumulated into its mix register just before the object
//! runs.
//!
//! # Example
//!
//! ```rust
//! use heavy_core::control::{Binop, BinopOp};
//! use heavy_core::graph::PatchBuilder;
//!
//! let mut b = PatchBuilder::new(0, 2);
//! let freq = b.add_receive("freq");
//! let double = b.add(Binop::new(BinopOp::Multiply, 2.0));
//! b.connect(freq, 0, double, 0).unwrap();
//! let patch = b.build().unwrap();
//! assert_eq!(patch.object_count(), 2);
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::control::{Receive, Send};
use crate::error::PatchError;
use crate::hash::string_to_hash;
use crate::object::{MAX_SIGNAL_PORTS, Object, ObjectId};
use crate::param_info::{ParamDescriptor, ParamKind};
use crate::table::{Table, TableRegistry};

/// Register that always holds silence.
pub const ZERO_REGISTER: u16 = 0;

/// Where a signal connection starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Adc(usize),
    Outlet(ObjectId, usize),
}

/// Where a signal connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Inlet(ObjectId, usize),
    Dac(usize),
}

#[derive(Debug, Clone, Copy)]
struct ControlEdge {
    from: ObjectId,
    outlet: usize,
    to: ObjectId,
    inlet: usize,
}

/// One instruction of the per-sub-block signal program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStep {
    /// Zero a mix register.
    Clear {
        /// Register to clear.
        dst: u16,
    },
    /// Add one register into another.
    Accumulate {
        /// Register to read.
        src: u16,
        /// Mix register to add into.
        dst: u16,
    },
    /// Run one object's [`process`](Object::process).
    Process {
        /// Object to run.
        object: ObjectId,
        /// Input registers; the first `signal_inlets()` are used.
        inputs: [u16; MAX_SIGNAL_PORTS],
        /// Output registers; the first `signal_outlets()` are used.
        outputs: [u16; MAX_SIGNAL_PORTS],
    },
}

/// Flattened control connections: object → outlet → targets.
#[derive(Debug, Default)]
pub(crate) struct Routes {
    first_outlet: Vec<u32>,
    outlets: Vec<(u32, u32)>,
    targets: Vec<(ObjectId, u16)>,
}

impl Routes {
    fn build(objects: &[Box<dyn Object>], edges: &[ControlEdge]) -> Self {
        let mut first_outlet = Vec::with_capacity(objects.len());
        let mut per_outlet: Vec<Vec<(ObjectId, u16)>> = Vec::new();
        for obj in objects {
            first_outlet.push(per_outlet.len() as u32);
            per_outlet.extend((0..obj.outlets()).map(|_| Vec::new()));
        }
        for e in edges {
            let slot = first_outlet[e.from.index()] as usize + e.outlet;
            per_outlet[slot].push((e.to, e.inlet as u16));
        }
        let mut outlets = Vec::with_capacity(per_outlet.len());
        let mut targets = Vec::with_capacity(edges.len());
        for list in per_outlet {
            outlets.push((targets.len() as u32, list.len() as u32));
            targets.extend(list);
        }
        Self {
            first_outlet,
            outlets,
            targets,
        }
    }

    /// Inlets connected to `outlet` of `object`; empty for unknown outlets.
    pub(crate) fn targets(&self, object: ObjectId, outlet: usize) -> &[(ObjectId, u16)] {
        let Some(&first) = self.first_outlet.get(object.index()) else {
            return &[];
        };
        let next = self
            .first_outlet
            .get(object.index() + 1)
            .map_or(self.outlets.len(), |&n| n as usize);
        let slot = first as usize + outlet;
        if slot >= next {
            return &[];
        }
        let (start, len) = self.outlets[slot];
        &self.targets[start as usize..(start + len) as usize]
    }

    fn edge_count(&self) -> usize {
        self.targets.len()
    }
}

/// Mutable patch under construction.
pub struct PatchBuilder {
    objects: Vec<Box<dyn Object>>,
    control: Vec<ControlEdge>,
    signal: Vec<(Source, Sink)>,
    receives: Vec<(u32, ObjectId)>,
    sends: Vec<(u32, ObjectId, bool)>,
    tables: Vec<(String, Table)>,
    parameters: Vec<ParamDescriptor>,
    num_inputs: usize,
    num_outputs: usize,
}

impl PatchBuilder {
    /// Starts a patch with the given host channel counts.
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            objects: Vec::new(),
            control: Vec::new(),
            signal: Vec::new(),
            receives: Vec::new(),
            sends: Vec::new(),
            tables: Vec::new(),
            parameters: Vec::new(),
            num_inputs,
            num_outputs,
        }
    }

    /// Adds an object and returns its id.
    pub fn add(&mut self, object: impl Object + 'static) -> ObjectId {
        self.add_boxed(Box::new(object))
    }

    /// Adds an already boxed object.
    pub fn add_boxed(&mut self, object: Box<dyn Object>) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("patch_add: {} {id}", object.class_name());
        self.objects.push(object);
        id
    }

    /// Adds a [`Receive`] for `name`. Host messages addressed to the name and
    /// every send with the same name are delivered to its inlet.
    pub fn add_receive(&mut self, name: &str) -> ObjectId {
        let receive = Receive::new(name);
        let hash = receive.hash();
        let id = self.add(receive);
        self.receives.push((hash, id));
        id
    }

    /// Adds a [`Send`] for `name`. External sends are also published to the
    /// host through the send hook and output mailbox.
    pub fn add_send(&mut self, name: &str, external: bool) -> ObjectId {
        let send = Send::new(name, external);
        let hash = send.hash();
        let id = self.add(send);
        self.sends.push((hash, id, external));
        id
    }

    /// Declares a zero-filled table.
    pub fn add_table(&mut self, name: &str, size: usize) {
        self.tables.push((name.to_owned(), Table::new(size)));
    }

    /// Declares a table holding `samples`.
    pub fn add_table_samples(&mut self, name: &str, samples: &[f32]) {
        self.tables.push((name.to_owned(), Table::from_samples(samples)));
    }

    /// Exposes a parameter or event to the host. Input kinds must name a
    /// receiver; output kinds must name an external send.
    pub fn add_parameter(&mut self, descriptor: ParamDescriptor) {
        self.parameters.push(descriptor);
    }

    /// Number of objects added so far.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn object(&self, id: ObjectId) -> Result<&dyn Object, PatchError> {
        self.objects
            .get(id.index())
            .map(|o| &**o)
            .ok_or(PatchError::ObjectNotFound(id))
    }

    /// Connects control `outlet` of `from` to `inlet` of `to`.
    pub fn connect(
        &mut self,
        from: ObjectId,
        outlet: usize,
        to: ObjectId,
        inlet: usize,
    ) -> Result<(), PatchError> {
        let src = self.object(from)?;
        if outlet >= src.outlets() {
            return Err(PatchError::NoSuchOutlet {
                object: from,
                class: src.class_name(),
                outlet,
            });
        }
        let dst = self.object(to)?;
        if inlet >= dst.inlets() {
            return Err(PatchError::NoSuchInlet {
                object: to,
                class: dst.class_name(),
                inlet,
            });
        }
        self.control.push(ControlEdge {
            from,
            outlet,
            to,
            inlet,
        });
        Ok(())
    }

    fn check_signal_outlet(&self, id: ObjectId, port: usize) -> Result<(), PatchError> {
        let obj = self.object(id)?;
        if port >= obj.signal_outlets() {
            return Err(PatchError::NoSuchSignalPort {
                object: id,
                class: obj.class_name(),
                direction: "outlet",
                port,
            });
        }
        Ok(())
    }

    fn check_signal_inlet(&self, id: ObjectId, port: usize) -> Result<(), PatchError> {
        let obj = self.object(id)?;
        if port >= obj.signal_inlets() {
            return Err(PatchError::NoSuchSignalPort {
                object: id,
                class: obj.class_name(),
                direction: "inlet",
                port,
            });
        }
        Ok(())
    }

    /// Connects signal `outlet` of `from` to signal `inlet` of `to`.
    /// Several connections into one inlet are summed.
    pub fn connect_signal(
        &mut self,
        from: ObjectId,
        outlet: usize,
        to: ObjectId,
        inlet: usize,
    ) -> Result<(), PatchError> {
        self.check_signal_outlet(from, outlet)?;
        self.check_signal_inlet(to, inlet)?;
        self.signal
            .push((Source::Outlet(from, outlet), Sink::Inlet(to, inlet)));
        Ok(())
    }

    /// Feeds host input `channel` into signal `inlet` of `to`.
    pub fn adc(&mut self, channel: usize, to: ObjectId, inlet: usize) -> Result<(), PatchError> {
        if channel >= self.num_inputs {
            return Err(PatchError::NoSuchChannel {
                direction: "input",
                channel,
            });
        }
        self.check_signal_inlet(to, inlet)?;
        self.signal.push((Source::Adc(channel), Sink::Inlet(to, inlet)));
        Ok(())
    }

    /// Adds signal `outlet` of `from` to host output `channel`.
    pub fn dac(&mut self, from: ObjectId, outlet: usize, channel: usize) -> Result<(), PatchError> {
        if channel >= self.num_outputs {
            return Err(PatchError::NoSuchChannel {
                direction: "output",
                channel,
            });
        }
        self.check_signal_outlet(from, outlet)?;
        self.signal.push((Source::Outlet(from, outlet), Sink::Dac(channel)));
        Ok(())
    }

    /// Validates and compiles the patch.
    pub fn build(self) -> Result<Patch, PatchError> {
        for (i, obj) in self.objects.iter().enumerate() {
            let ports = obj.signal_inlets().max(obj.signal_outlets());
            if ports > MAX_SIGNAL_PORTS {
                return Err(PatchError::TooManySignalPorts {
                    object: ObjectId(i as u32),
                    class: obj.class_name(),
                    ports,
                    max: MAX_SIGNAL_PORTS,
                });
            }
        }

        let mut tables = TableRegistry::new();
        for (name, table) in self.tables {
            let hash = string_to_hash(&name);
            if tables.get(hash).is_some() {
                return Err(PatchError::DuplicateTable(hash));
            }
            tables.insert(&name, table);
        }

        let mut receivers = self.receives.clone();
        receivers.sort_by_key(|&(hash, _)| hash);

        for p in &self.parameters {
            if !p.is_valid() {
                return Err(PatchError::InvalidParameterRange {
                    name: p.name.clone(),
                    min: p.min,
                    max: p.max,
                    default: p.default,
                });
            }
            let bound = if p.kind.is_input() {
                receivers.iter().any(|&(h, _)| h == p.hash)
            } else {
                self.sends.iter().any(|&(h, _, ext)| ext && h == p.hash)
            };
            if !bound {
                return Err(PatchError::UnboundParameter(p.name.clone()));
            }
        }

        let mut control = self.control;
        for &(hash, send, _) in &self.sends {
            for &(_, receive) in receivers.iter().filter(|&&(h, _)| h == hash) {
                control.push(ControlEdge {
                    from: send,
                    outlet: 0,
                    to: receive,
                    inlet: 0,
                });
            }
        }
        let routes = Routes::build(&self.objects, &control);

        let order = signal_order(&self.objects, &self.signal)?;
        let (steps, dac, register_count) =
            assign_registers(&self.objects, &self.signal, &order, self.num_inputs, self.num_outputs);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "patch_build: {} objects, {} control edges, {} signal objects, {} steps, {} registers",
            self.objects.len(),
            routes.edge_count(),
            order.len(),
            steps.len(),
            register_count
        );

        Ok(Patch {
            objects: self.objects,
            routes,
            receivers,
            steps,
            dac,
            register_count,
            tables,
            parameters: self.parameters,
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
        })
    }
}

impl Default for PatchBuilder {
    fn default() -> Self {
        Self::new(0, 2)
    }
}

fn is_signal(object: &dyn Object) -> bool {
    object.signal_inlets() > 0 || object.signal_outlets() > 0
}

/// Kahn sort over objects with signal ports. Ready objects are taken lowest
/// id first.
fn signal_order(
    objects: &[Box<dyn Object>],
    edges: &[(Source, Sink)],
) -> Result<Vec<ObjectId>, PatchError> {
    let mut in_degree = vec![0u32; objects.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); objects.len()];
    for &(src, dst) in edges {
        if let (Source::Outlet(from, _), Sink::Inlet(to, _)) = (src, dst) {
            in_degree[to.index()] += 1;
            successors[from.index()].push(to.index());
        }
    }

    let active = objects.iter().filter(|o| is_signal(&***o)).count();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..objects.len())
        .filter(|&i| is_signal(&*objects[i]) && in_degree[i] == 0)
        .map(Reverse)
        .collect();

    let mut sorted = Vec::with_capacity(active);
    while let Some(Reverse(i)) = ready.pop() {
        sorted.push(ObjectId(i as u32));
        for &next in &successors[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if sorted.len() != active {
        let stuck = (0..objects.len())
            .find(|&i| in_degree[i] > 0)
            .unwrap_or_default();
        return Err(PatchError::SignalCycle(ObjectId(stuck as u32)));
    }
    Ok(sorted)
}

/// Allocates registers along `order` and emits the step list. Returns the
/// steps, the register read for each dac channel, and the register count.
fn assign_registers(
    objects: &[Box<dyn Object>],
    edges: &[(Source, Sink)],
    order: &[ObjectId],
    num_inputs: usize,
    num_outputs: usize,
) -> (Vec<SignalStep>, Vec<u16>, usize) {
    let mut next = 1 + num_inputs;
    let mut outlet_base = vec![0usize; objects.len()];
    for &id in order {
        outlet_base[id.index()] = next;
        next += objects[id.index()].signal_outlets();
    }

    let register_of = |src: Source| -> u16 {
        match src {
            Source::Adc(ch) => (1 + ch) as u16,
            Source::Outlet(id, port) => (outlet_base[id.index()] + port) as u16,
        }
    };

    let mut steps = Vec::with_capacity(order.len());
    let mix_input = |sink: Sink, steps: &mut Vec<SignalStep>, next: &mut usize| -> u16 {
        let sources: Vec<u16> = edges
            .iter()
            .filter(|&&(_, s)| s == sink)
            .map(|&(src, _)| register_of(src))
            .collect();
        match sources.as_slice() {
            [] => ZERO_REGISTER,
            [one] => *one,
            many => {
                let dst = *next as u16;
                *next += 1;
                steps.push(SignalStep::Clear { dst });
                for &src in many {
                    steps.push(SignalStep::Accumulate { src, dst });
                }
                dst
            }
        }
    };

    for &id in order {
        let obj = &objects[id.index()];
        let mut inputs = [ZERO_REGISTER; MAX_SIGNAL_PORTS];
        for (port, reg) in inputs.iter_mut().enumerate().take(obj.signal_inlets()) {
            *reg = mix_input(Sink::Inlet(id, port), &mut steps, &mut next);
        }
        let mut outputs = [ZERO_REGISTER; MAX_SIGNAL_PORTS];
        for (port, reg) in outputs.iter_mut().enumerate().take(obj.signal_outlets()) {
            *reg = (outlet_base[id.index()] + port) as u16;
        }
        steps.push(SignalStep::Process {
            object: id,
            inputs,
            outputs,
        });
    }

    let dac = (0..num_outputs)
        .map(|ch| mix_input(Sink::Dac(ch), &mut steps, &mut next))
        .collect();
    (steps, dac, next)
}

/// A compiled, immutable patch.
pub struct Patch {
    pub(crate) objects: Vec<Box<dyn Object>>,
    pub(crate) routes: Routes,
    pub(crate) receivers: Vec<(u32, ObjectId)>,
    pub(crate) steps: Vec<SignalStep>,
    pub(crate) dac: Vec<u16>,
    pub(crate) register_count: usize,
    pub(crate) tables: TableRegistry,
    pub(crate) parameters: Vec<ParamDescriptor>,
    pub(crate) num_inputs: usize,
    pub(crate) num_outputs: usize,
}

impl Patch {
    /// Number of objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Class name of an object.
    pub fn class_name(&self, id: ObjectId) -> Option<&'static str> {
        self.objects.get(id.index()).map(|o| o.class_name())
    }

    /// Host input channels.
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Host output channels.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Signal registers needed per sub-block, silence included.
    pub fn register_count(&self) -> usize {
        self.register_count
    }

    /// The compiled signal program.
    pub fn steps(&self) -> &[SignalStep] {
        &self.steps
    }

    /// Signal objects in execution order.
    pub fn signal_order(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.steps.iter().filter_map(|s| match s {
            SignalStep::Process { object, .. } => Some(*object),
            _ => None,
        })
    }

    /// Receive objects listening on `hash`, in the order they were added.
    pub fn receivers(&self, hash: u32) -> impl Iterator<Item = ObjectId> + '_ {
        receivers_for(&self.receivers, hash).iter().map(|&(_, id)| id)
    }

    /// Total number of control connections, send-to-receive wiring included.
    pub fn control_edge_count(&self) -> usize {
        self.routes.edge_count()
    }

    /// Control inlets fed by `outlet` of `object`.
    pub fn connections(&self, object: ObjectId, outlet: usize) -> &[(ObjectId, u16)] {
        self.routes.targets(object, outlet)
    }

    /// Declared tables.
    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Exposed parameters and events.
    pub fn parameters(&self) -> &[ParamDescriptor] {
        &self.parameters
    }

    /// Parameters of one kind.
    pub fn parameters_of(&self, kind: ParamKind) -> impl Iterator<Item = &ParamDescriptor> {
        self.parameters.iter().filter(move |p| p.kind == kind)
    }
}

impl core::fmt::Debug for PatchBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PatchBuilder")
            .field("objects", &self.objects.len())
            .field("control_edges", &self.control.len())
            .field("signal_edges", &self.signal.len())
            .field("tables", &self.tables.len())
            .field("inputs", &self.num_inputs)
            .field("outputs", &self.num_outputs)
            .finish_non_exhaustive()
    }
}

impl core::fmt::Debug for Patch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Patch")
            .field("objects", &self.objects.len())
            .field("steps", &self.steps.len())
            .field("registers", &self.register_count)
            .field("inputs", &self.num_inputs)
            .field("outputs", &self.num_outputs)
            .finish_non_exhaustive()
    }
}

/// Entries of a hash-sorted receiver list matching `hash`.
pub(crate) fn receivers_for(receivers: &[(u32, ObjectId)], hash: u32) -> &[(u32, ObjectId)] {
    let start = receivers.partition_point(|&(h, _)| h < hash);
    let end = start + receivers[start..].partition_point(|&(h, _)| h == hash);
    &receivers[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Binop, BinopOp, Print};
    use crate::signal::{Del1, SignalBinop, SignalBinopOp, SignalVar};

    #[test]
    fn connect_validates_ports() {
        let mut b = PatchBuilder::new(1, 1);
        let a = b.add(Binop::new(BinopOp::Add, 1.0));
        let p = b.add(Print::new("p"));
        assert!(b.connect(a, 0, p, 0).is_ok());
        assert!(matches!(
            b.connect(p, 0, a, 0),
            Err(PatchError::NoSuchOutlet { outlet: 0, .. })
        ));
        assert!(matches!(
            b.connect(a, 0, a, 2),
            Err(PatchError::NoSuchInlet { inlet: 2, .. })
        ));
        assert_eq!(
            b.connect(a, 0, ObjectId(9), 0),
            Err(PatchError::ObjectNotFound(ObjectId(9)))
        );
        assert!(matches!(
            b.connect_signal(a, 0, p, 0),
            Err(PatchError::NoSuchSignalPort {
                direction: "outlet",
                ..
            })
        ));
        assert_eq!(
            b.adc(1, a, 0),
            Err(PatchError::NoSuchChannel {
                direction: "input",
                channel: 1
            })
        );
    }

    #[test]
    fn sends_wire_to_receivers() {
        let mut b = PatchBuilder::new(0, 0);
        let s = b.add_send("bus", false);
        let r1 = b.add_receive("bus");
        let r2 = b.add_receive("bus");
        let other = b.add_receive("other");
        let patch = b.build().unwrap();
        assert_eq!(patch.connections(s, 0), &[(r1, 0), (r2, 0)]);
        let bus: Vec<_> = patch.receivers(string_to_hash("bus")).collect();
        assert_eq!(bus, vec![r1, r2]);
        assert_eq!(
            patch.receivers(string_to_hash("other")).collect::<Vec<_>>(),
            vec![other]
        );
        assert_eq!(patch.receivers(1).count(), 0);
    }

    #[test]
    fn topological_order_follows_edges() {
        let mut b = PatchBuilder::new(1, 1);
        let mul = b.add(SignalBinop::new(SignalBinopOp::Mul));
        let delay = b.add(Del1::new());
        let gain = b.add(SignalVar::new(0.5));
        b.adc(0, delay, 0).unwrap();
        b.connect_signal(delay, 0, mul, 0).unwrap();
        b.connect_signal(gain, 0, mul, 1).unwrap();
        b.dac(mul, 0, 0).unwrap();
        let patch = b.build().unwrap();
        let order: Vec<_> = patch.signal_order().collect();
        assert_eq!(order, vec![delay, gain, mul]);
        // zero + adc + three outlets
        assert_eq!(patch.register_count(), 5);
        assert_eq!(patch.dac, vec![4]);
    }

    #[test]
    fn fan_in_gets_mix_register() {
        let mut b = PatchBuilder::new(0, 2);
        let x = b.add(SignalVar::new(1.0));
        let y = b.add(SignalVar::new(2.0));
        b.dac(x, 0, 0).unwrap();
        b.dac(y, 0, 0).unwrap();
        let patch = b.build().unwrap();
        assert_eq!(
            &patch.steps()[2..],
            &[
                SignalStep::Clear { dst: 3 },
                SignalStep::Accumulate { src: 1, dst: 3 },
                SignalStep::Accumulate { src: 2, dst: 3 },
            ]
        );
        assert_eq!(patch.dac, vec![3, ZERO_REGISTER]);
    }

    #[test]
    fn signal_cycle_is_rejected() {
        let mut b = PatchBuilder::new(0, 0);
        let a = b.add(Del1::new());
        let c = b.add(Del1::new());
        b.connect_signal(a, 0, c, 0).unwrap();
        b.connect_signal(c, 0, a, 0).unwrap();
        assert!(matches!(b.build(), Err(PatchError::SignalCycle(_))));
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let mut b = PatchBuilder::new(0, 0);
        b.add_table("t", 4);
        b.add_table("t", 8);
        assert_eq!(
            b.build().unwrap_err(),
            PatchError::DuplicateTable(string_to_hash("t"))
        );
    }

    #[test]
    fn parameters_must_bind() {
        let mut b = PatchBuilder::new(0, 0);
        b.add_parameter(ParamDescriptor::new("gain", ParamKind::ParameterIn, 0.0, 1.0, 0.5));
        assert_eq!(
            b.build().unwrap_err(),
            PatchError::UnboundParameter("gain".into())
        );

        let mut b = PatchBuilder::new(0, 0);
        b.add_receive("gain");
        b.add_send("level", false);
        b.add_parameter(ParamDescriptor::new("gain", ParamKind::ParameterIn, 0.0, 1.0, 0.5));
        b.add_parameter(ParamDescriptor::new("level", ParamKind::ParameterOut, 0.0, 1.0, 0.0));
        assert_eq!(
            b.build().unwrap_err(),
            PatchError::UnboundParameter("level".into())
        );

        let mut b = PatchBuilder::new(0, 0);
        b.add_receive("gain");
        b.add_parameter(ParamDescriptor::new("gain", ParamKind::ParameterIn, 0.0, 1.0, 3.0));
        assert!(matches!(
            b.build(),
            Err(PatchError::InvalidParameterRange { .. })
        ));
    }

    #[test]
    fn routes_ignore_unknown_outlets() {
        let mut b = PatchBuilder::new(0, 0);
        let a = b.add(Binop::new(BinopOp::Add, 0.0));
        let patch = b.build().unwrap();
        assert!(patch.connections(a, 0).is_empty());
        assert!(patch.connections(a, 5).is_empty());
        assert!(patch.connections(ObjectId(3), 0).is_empty());
        assert_eq!(patch.class_name(a), Some("binop"));
    }
}
