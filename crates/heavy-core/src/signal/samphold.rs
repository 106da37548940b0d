//! Sample and hold.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::Buf;

/// Holds its input whenever the control signal falls.
///
/// Signal inlets: `x, control`. Lane `n` samples `x[n]` when
/// `control[n] < control[n-1]`, comparing across vector boundaries too, so a
/// phasor on the control inlet samples once per cycle.
///
/// | Message | Effect |
/// |---------|--------|
/// | `set v` | hold `v` now |
/// | `reset v` | treat `v` as the previous control sample |
/// | `reset` | force a sample on the next control value |
#[derive(Debug, Clone, Copy)]
pub struct Samphold {
    held: f32,
    last_control: f32,
}

impl Default for Samphold {
    fn default() -> Self {
        Self::new()
    }
}

impl Samphold {
    /// Creates a sample-and-hold holding zero.
    pub fn new() -> Self {
        Self {
            held: 0.0,
            last_control: 0.0,
        }
    }

    /// Currently held value.
    pub fn held(&self) -> f32 {
        self.held
    }
}

impl Object for Samphold {
    fn class_name(&self) -> &'static str {
        "samphold~"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        2
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        if msg.compare_symbol(0, "set") {
            if let Some(v) = msg.float(1) {
                self.held = v;
            }
        } else if msg.compare_symbol(0, "reset") {
            self.last_control = msg.float(1).unwrap_or(f32::INFINITY);
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let (x, control) = (inputs[0], inputs[1]);
        outputs[0] = Buf::from_fn(|j| {
            let c = control.lane(j);
            if c < self.last_control {
                self.held = x.lane(j);
            }
            self.last_control = c;
            self.held
        });
    }
}
