//! Second-order recursive filters.
//!
//! Direct Form I:
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
//!                - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! [`Biquad`] takes all five coefficients as signals and therefore has to run
//! the recursion one lane at a time. [`BiquadK`] takes control-rate
//! coefficients, which lets it evaluate a whole vector without any serial
//! dependency between lanes.
//!
//! # Block form
//!
//! Over one vector of `W` samples every output lane is a linear function of
//! the `W` inputs and the four samples of state carried from the previous
//! vector:
//!
//! ```text
//! y[j] = sum_k Cx[k][j] * x[k]
//!      + Cxm1[j]*x[-1] + Cxm2[j]*x[-2] + Cym1[j]*y[-1] + Cym2[j]*y[-2]
//! ```
//!
//! [`BiquadMatrix`] holds those `W + 4` coefficient vectors. They are found
//! by running the scalar recursion on each basis input (in `f64`) whenever a
//! coefficient changes, never per sample.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::{Buf, N_SIMD, Vf};

/// Filter history carried between vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    /// x[n-1]
    pub xm1: f32,
    /// x[n-2]
    pub xm2: f32,
    /// y[n-1]
    pub ym1: f32,
    /// y[n-2]
    pub ym2: f32,
}

impl BiquadState {
    /// Runs one sample of the direct-form recursion.
    #[inline]
    pub fn tick(&mut self, x: f32, [b0, b1, b2, a1, a2]: [f32; 5]) -> f32 {
        let y = b0 * x + b1 * self.xm1 + b2 * self.xm2 - a1 * self.ym1 - a2 * self.ym2;
        self.xm2 = self.xm1;
        self.xm1 = x;
        self.ym2 = self.ym1;
        self.ym1 = y;
        y
    }

    /// Zeroes the history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Block-form coefficients of a biquad for `W` lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadMatrix<const W: usize> {
    x: [Vf<W>; W],
    xm1: Vf<W>,
    xm2: Vf<W>,
    ym1: Vf<W>,
    ym2: Vf<W>,
}

/// Runs `W` steps of the recursion from the given start state.
fn respond<const W: usize>(
    [b0, b1, b2, a1, a2]: [f64; 5],
    input: impl Fn(usize) -> f64,
    [mut x1, mut x2, mut y1, mut y2]: [f64; 4],
) -> Vf<W> {
    Vf::from_fn(|n| {
        let x = input(n);
        let y = b0 * x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;
        x2 = x1;
        x1 = x;
        y2 = y1;
        y1 = y;
        y as f32
    })
}

impl<const W: usize> BiquadMatrix<W> {
    /// Precomputes the block form of `[b0, b1, b2, a1, a2]`.
    pub fn new(coefficients: [f32; 5]) -> Self {
        let c = coefficients.map(f64::from);
        let silent = |_: usize| 0.0;
        Self {
            x: core::array::from_fn(|k| {
                respond(c, |n| if n == k { 1.0 } else { 0.0 }, [0.0; 4])
            }),
            xm1: respond(c, silent, [1.0, 0.0, 0.0, 0.0]),
            xm2: respond(c, silent, [0.0, 1.0, 0.0, 0.0]),
            ym1: respond(c, silent, [0.0, 0.0, 1.0, 0.0]),
            ym2: respond(c, silent, [0.0, 0.0, 0.0, 1.0]),
        }
    }

    /// Filters one vector and advances `state`.
    #[inline]
    pub fn apply(&self, state: &mut BiquadState, x: Vf<W>) -> Vf<W> {
        let mut y = self.xm1 * state.xm1
            + self.xm2 * state.xm2
            + self.ym1 * state.ym1
            + self.ym2 * state.ym2;
        for (k, column) in self.x.iter().enumerate() {
            y += *column * x.lane(k);
        }
        if W >= 2 {
            state.xm2 = x.lane(W - 2);
            state.ym2 = y.lane(W - 2);
        } else {
            state.xm2 = state.xm1;
            state.ym2 = state.ym1;
        }
        state.xm1 = x.last();
        state.ym1 = y.last();
        y
    }
}

/// Biquad with signal-rate coefficients.
///
/// Signal inlets: `x, b0, b1, b2, a1, a2`. A `clear` message zeroes the
/// history.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    state: BiquadState,
}

impl Biquad {
    /// Creates a filter with zeroed history.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for Biquad {
    fn class_name(&self) -> &'static str {
        "biquad~"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        6
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
            self.state.reset();
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let [x, b0, b1, b2, a1, a2] = [0, 1, 2, 3, 4, 5].map(|i| inputs[i]);
        outputs[0] = Buf::from_fn(|j| {
            let c = [b0.lane(j), b1.lane(j), b2.lane(j), a1.lane(j), a2.lane(j)];
            self.state.tick(x.lane(j), c)
        });
    }
}

/// Biquad with control-rate coefficients.
///
/// One signal inlet. Control inlets 1 through 5 set `b0, b1, b2, a1, a2` and
/// recompute the block form; inlet 0 accepts `clear`.
#[derive(Debug, Clone)]
pub struct BiquadK {
    coefficients: [f32; 5],
    matrix: BiquadMatrix<N_SIMD>,
    state: BiquadState,
}

impl BiquadK {
    /// Creates a filter from `[b0, b1, b2, a1, a2]`.
    pub fn new(coefficients: [f32; 5]) -> Self {
        Self {
            coefficients,
            matrix: BiquadMatrix::new(coefficients),
            state: BiquadState::default(),
        }
    }

    /// Current `[b0, b1, b2, a1, a2]`.
    pub fn coefficients(&self) -> [f32; 5] {
        self.coefficients
    }
}

impl Default for BiquadK {
    fn default() -> Self {
        Self::new([1.0, 0.0, 0.0, 0.0, 0.0])
    }
}

impl Object for BiquadK {
    fn class_name(&self) -> &'static str {
        "biquad_k~"
    }

    fn inlets(&self) -> usize {
        6
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
            1..=5 => {
                if let Some(v) = msg.float(0) {
                    self.coefficients[inlet - 1] = v;
                    self.matrix = BiquadMatrix::new(self.coefficients);
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
