//! Signal-to-control snapshot.

use crate::message::{Element, Message};
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::{Buf, N_SIMD};

/// Reports one sample of its signal inlet as a control float.
///
/// Any message on inlet 0 arms the snapshot. During the next sub-block the
/// lane matching the message's timestamp is read and scheduled on outlet 0
/// at the start of the following sub-block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sample {
    armed: Option<u32>,
}

impl Sample {
    /// Creates an idle snapshot object.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for Sample {
    fn class_name(&self) -> &'static str {
        "sample~"
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        self.armed = Some(msg.timestamp());
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, inputs: &[Buf], _outputs: &mut [Buf]) {
        let Some(ts) = self.armed.take() else {
            return;
        };
        let start = cx.current_sample();
        let lane = (ts.saturating_sub(start) as usize).min(N_SIMD - 1);
        let value = inputs[0].lane(lane);
        let when = start + N_SIMD as u32;
        cx.schedule(0, &Message::new(when, &[Element::Float(value)]));
    }
}
