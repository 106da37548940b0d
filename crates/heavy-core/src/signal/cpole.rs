//! Complex one-pole filter.
//!
//! ```text
//! y[n] = x[n] - a[n] * y[n-1]      (complex arithmetic)
//! ```
//!
//! Signal inlets: `x.re, x.im, a.re, a.im`. Signal outlets: `y.re, y.im`.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::Buf;

/// Complex pole with signal-rate coefficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct CPole {
    ymr: f32,
    ymi: f32,
}

impl CPole {
    /// Creates a filter with zeroed history.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for CPole {
    fn class_name(&self) -> &'static str {
        "cpole~"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        4
    }

    fn signal_outlets(&self) -> usize {
        2
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        if msg.compare_symbol(0, "clear") {
            *self = Self::default();
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let [xr, xi, ar, ai] = [inputs[0], inputs[1], inputs[2], inputs[3]];
        let mut re = Buf::zero();
        let mut im = Buf::zero();
        for j in 0..re.0.len() {
            let (a_re, a_im) = (ar.lane(j), ai.lane(j));
            let yr = xr.lane(j) - (a_re * self.ymr - a_im * self.ymi);
            let yi = xi.lane(j) - (a_re * self.ymi + a_im * self.ymr);
            self.ymr = yr;
            self.ymi = yi;
            re.0[j] = yr;
            im.0[j] = yi;
        }
        outputs[0] = re;
        outputs[1] = im;
    }
}
