//! One-pole recursive filters: `y[n] = x[n] - a * y[n-1]`.
//!
//! The transfer function is `1 / (1 + a z^-1)`, a biquad with `b0 = 1`,
//! `a1 = a` and every other coefficient zero, so [`RPoleK`] reuses the biquad
//! block form for its control-rate coefficient.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::{Buf, N_SIMD};

use super::biquad::{BiquadMatrix, BiquadState};

/// Real pole with a signal-rate coefficient. Signal inlets: `x, a`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RPole {
    ym1: f32,
}

impl RPole {
    /// Creates a filter with zeroed history.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for RPole {
    fn class_name(&self) -> &'static str {
        "rpole~"
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
        if msg.compare_symbol(0, "clear") {
            self.ym1 = 0.0;
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let (x, a) = (inputs[0], inputs[1]);
        outputs[0] = Buf::from_fn(|j| {
            self.ym1 = x.lane(j) - a.lane(j) * self.ym1;
            self.ym1
        });
    }
}

/// Real pole with a control-rate coefficient on inlet 1.
#[derive(Debug, Clone)]
pub struct RPoleK {
    a: f32,
    matrix: BiquadMatrix<N_SIMD>,
    state: BiquadState,
}

impl RPoleK {
    /// Creates a filter with coefficient `a`.
    pub fn new(a: f32) -> Self {
        Self {
            a,
            matrix: BiquadMatrix::new([1.0, 0.0, 0.0, a, 0.0]),
            state: BiquadState::default(),
        }
    }

    /// Current coefficient.
    pub fn coefficient(&self) -> f32 {
        self.a
    }
}

impl Object for RPoleK {
    fn class_name(&self) -> &'static str {
        "rpole_k~"
    }

    fn inlets(&self) -> usize {
        2
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
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 if msg.compare_symbol(0, "clear") => self.state.reset(),
            1 => {
                if let Some(a) = msg.float(0) {
                    *self = Self {
                        state: self.state,
                        ..Self::new(a)
                    };
                }
            }
            _ => {}
        }
    }

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = self.matrix.apply(&mut self.state, inputs[0]);
    }
}
