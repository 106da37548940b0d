//! One-sample delay.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::Buf;

/// `y[n] = x[n-1]`. The last lane of each vector carries into lane 0 of the
/// next. `clear` zeroes the carried sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct Del1 {
    last: f32,
}

impl Del1 {
    /// Creates a delay holding zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for Del1 {
    fn class_name(&self) -> &'static str {
        "del1~"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
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
        if msg.compare_symbol(0, "clear") {
            self.last = 0.0;
        }
    }

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let (shifted, carry) = inputs[0].shift_in(self.last);
        self.last = carry;
        outputs[0] = shifted;
    }
}
