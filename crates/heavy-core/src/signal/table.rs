//! Signal-rate table access.
//!
//! Linear readers and writers move the table's shared head by one vector per
//! sub-block: [`AccessMode::Linear`] wraps at the end (loops, delay lines),
//! [`AccessMode::Stoppable`] stops there and then reads silence or stops
//! writing until it is restarted. [`AccessMode::Random`] takes indices as a
//! signal and leaves the head alone.
//!
//! Every object resolves its table at init (unknown name is a patch error) and
//! accepts a symbol on its last control inlet to switch tables. A detached
//! object reads silence and writes nothing.

use crate::error::PatchError;
use crate::message::Message;
use crate::object::{InitContext, Object, ObjectContext, Outbox, TableRef};
use crate::simd::{Buf, N_SIMD};
use crate::table::{HeadPolicy, Table};

/// How a signal table object walks its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Indices come from a signal inlet.
    Random,
    /// One vector per sub-block from the head, wrapping at the end.
    Linear,
    /// One vector per sub-block from the head, stopping at the end.
    Stoppable,
}

impl AccessMode {
    fn policy(self) -> HeadPolicy {
        match self {
            AccessMode::Stoppable => HeadPolicy::Stop,
            AccessMode::Random | AccessMode::Linear => HeadPolicy::Wrap,
        }
    }
}

/// Table index for a float; negative positions count back from the end.
fn head_from_float(table: &Table, position: f32) -> usize {
    let h = position.abs() as usize;
    if position < 0.0 {
        table.size().saturating_sub(h)
    } else {
        h
    }
}

/// Signal table reader.
///
/// Control inlet 0: `bang` rewinds the head, a float moves it and reports the
/// new position on outlet 0, `stop` parks a stoppable reader at the end.
/// Control inlet 1 switches tables.
#[derive(Debug, Clone, Copy)]
pub struct SignalTabread {
    table: TableRef,
    mode: AccessMode,
}

impl SignalTabread {
    /// Creates a reader of table `name`.
    pub fn new(name: &str, mode: AccessMode) -> Self {
        Self {
            table: TableRef::new(name),
            mode,
        }
    }

    /// Access mode.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl Object for SignalTabread {
    fn class_name(&self) -> &'static str {
        "tabread~"
    }

    fn inlets(&self) -> usize {
        2
    }

    fn signal_inlets(&self) -> usize {
        usize::from(self.mode == AccessMode::Random)
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        if inlet == 1 {
            self.table.retarget(cx, msg);
            return;
        }
        let Some(id) = self.table.id else {
            return;
        };
        let table = cx.table_mut(id);
        if msg.is_bang(0) {
            table.set_head(0);
        } else if let Some(position) = msg.float(0) {
            let head = head_from_float(table, position);
            table.set_head(head);
            out.send_float(0, msg.timestamp(), table.head() as f32);
        } else if msg.compare_symbol(0, "stop") && self.mode == AccessMode::Stoppable {
            let end = table.size();
            table.set_head(end);
        }
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let Some(id) = self.table.id else {
            outputs[0] = Buf::zero();
            return;
        };
        let table = cx.table_mut(id);
        outputs[0] = match self.mode {
            AccessMode::Random => {
                let index = inputs[0];
                table.gather(core::array::from_fn(|j| index.lane(j).max(0.0) as usize))
            }
            mode => table.read_block(mode.policy()),
        };
    }
}

/// Signal table writer.
///
/// Linear and stoppable writers take one signal inlet; a random writer takes
/// `index, value`. Control inlet 1: `bang` rewinds, a non-negative float moves
/// the head, a negative float or `stop` halts writing. Control inlet 2
/// switches tables.
#[derive(Debug, Clone, Copy)]
pub struct SignalTabwrite {
    table: TableRef,
    mode: AccessMode,
}

impl SignalTabwrite {
    /// Creates a writer to table `name`.
    pub fn new(name: &str, mode: AccessMode) -> Self {
        Self {
            table: TableRef::new(name),
            mode,
        }
    }
}

impl Object for SignalTabwrite {
    fn class_name(&self) -> &'static str {
        "tabwrite~"
    }

    fn inlets(&self) -> usize {
        3
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        if self.mode == AccessMode::Random { 2 } else { 1 }
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        match inlet {
            1 => {
                let Some(id) = self.table.id else {
                    return;
                };
                let table = cx.table_mut(id);
                let end = table.size();
                if msg.is_bang(0) {
                    table.set_head(0);
                } else if let Some(position) = msg.float(0) {
                    table.set_head(if position >= 0.0 { position as usize } else { end });
                } else if msg.compare_symbol(0, "stop") {
                    table.set_head(end);
                }
            }
            2 => self.table.retarget(cx, msg),
            _ => {}
        }
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, inputs: &[Buf], _outputs: &mut [Buf]) {
        let Some(id) = self.table.id else {
            return;
        };
        let table = cx.table_mut(id);
        match self.mode {
            AccessMode::Random => {
                let (index, value) = (inputs[0], inputs[1]);
                for j in 0..N_SIMD {
                    let i = index.lane(j);
                    if i >= 0.0 && (i as usize) < table.size() {
                        table.write(i as usize, value.lane(j));
                    }
                }
            }
            mode => table.write_block(inputs[0], mode.policy()),
        }
    }
}

/// Outputs a table's head position as a constant signal. Inlet 0 switches
/// tables.
#[derive(Debug, Clone, Copy)]
pub struct SignalTabhead {
    table: TableRef,
}

impl SignalTabhead {
    /// Creates a head reader on table `name`.
    pub fn new(name: &str) -> Self {
        Self {
            table: TableRef::new(name),
        }
    }
}

impl Object for SignalTabhead {
    fn class_name(&self) -> &'static str {
        "tabhead~"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        self.table.retarget(cx, msg);
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, _inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = match self.table.id {
            Some(id) => Buf::splat(cx.table(id).head() as f32),
            None => Buf::zero(),
        };
    }
}
