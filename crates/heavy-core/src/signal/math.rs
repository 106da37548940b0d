//! Lane-wise signal arithmetic and constant sources.
//!
//! Every operator here is stateless and maps input vectors to one output
//! vector lane by lane. Guards match the control operators: division by zero,
//! `sqrt` of a negative number and `pow` with a non-finite result all yield 0,
//! so a patch never injects NaN into the signal path.

use libm::{ceilf, cosf, floorf, powf, sinf, sqrtf, tanhf};

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::Buf;

/// Two-input signal operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalBinopOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`, 0 where `b == 0`
    Div,
    /// Lane-wise minimum.
    Min,
    /// Lane-wise maximum.
    Max,
    /// `a ^ b`, 0 where the result is not finite.
    Pow,
}

impl SignalBinopOp {
    /// Every operator.
    pub const ALL: [SignalBinopOp; 7] = [
        SignalBinopOp::Add,
        SignalBinopOp::Sub,
        SignalBinopOp::Mul,
        SignalBinopOp::Div,
        SignalBinopOp::Min,
        SignalBinopOp::Max,
        SignalBinopOp::Pow,
    ];

    /// Patch-language name, e.g. `"+~"`.
    pub fn name(self) -> &'static str {
        match self {
            SignalBinopOp::Add => "+~",
            SignalBinopOp::Sub => "-~",
            SignalBinopOp::Mul => "*~",
            SignalBinopOp::Div => "/~",
            SignalBinopOp::Min => "min~",
            SignalBinopOp::Max => "max~",
            SignalBinopOp::Pow => "pow~",
        }
    }

    /// Looks up an operator by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Applies the operator to whole vectors.
    #[inline]
    pub fn apply(self, a: Buf, b: Buf) -> Buf {
        match self {
            SignalBinopOp::Add => a + b,
            SignalBinopOp::Sub => a - b,
            SignalBinopOp::Mul => a * b,
            SignalBinopOp::Div => a.zip_map(b, |x, y| if y == 0.0 { 0.0 } else { x / y }),
            SignalBinopOp::Min => a.min(b),
            SignalBinopOp::Max => a.max(b),
            SignalBinopOp::Pow => a.zip_map(b, |x, y| {
                let r = powf(x, y);
                if r.is_finite() { r } else { 0.0 }
            }),
        }
    }
}

/// One-input signal operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalUnopOp {
    /// `|x|`
    Abs,
    /// `sqrt(x)`, 0 for `x <= 0`
    Sqrt,
    /// `-x`
    Neg,
    /// Round towards negative infinity.
    Floor,
    /// Round towards positive infinity.
    Ceil,
    /// Cosine of `x` radians.
    Cos,
    /// Sine of `x` radians.
    Sin,
    /// Hyperbolic tangent.
    Tanh,
}

impl SignalUnopOp {
    /// Every operator.
    pub const ALL: [SignalUnopOp; 8] = [
        SignalUnopOp::Abs,
        SignalUnopOp::Sqrt,
        SignalUnopOp::Neg,
        SignalUnopOp::Floor,
        SignalUnopOp::Ceil,
        SignalUnopOp::Cos,
        SignalUnopOp::Sin,
        SignalUnopOp::Tanh,
    ];

    /// Patch-language name, e.g. `"abs~"`.
    pub fn name(self) -> &'static str {
        match self {
            SignalUnopOp::Abs => "abs~",
            SignalUnopOp::Sqrt => "sqrt~",
            SignalUnopOp::Neg => "neg~",
            SignalUnopOp::Floor => "floor~",
            SignalUnopOp::Ceil => "ceil~",
            SignalUnopOp::Cos => "cos~",
            SignalUnopOp::Sin => "sin~",
            SignalUnopOp::Tanh => "tanh~",
        }
    }

    /// Looks up an operator by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Applies the operator to a whole vector.
    #[inline]
    pub fn apply(self, x: Buf) -> Buf {
        match self {
            SignalUnopOp::Abs => x.abs(),
            SignalUnopOp::Sqrt => x.map(|v| if v > 0.0 { sqrtf(v) } else { 0.0 }),
            SignalUnopOp::Neg => -x,
            SignalUnopOp::Floor => x.map(floorf),
            SignalUnopOp::Ceil => x.map(ceilf),
            SignalUnopOp::Cos => x.map(cosf),
            SignalUnopOp::Sin => x.map(sinf),
            SignalUnopOp::Tanh => x.map(tanhf),
        }
    }
}

/// Two signal inlets, one signal outlet.
#[derive(Debug, Clone, Copy)]
pub struct SignalBinop {
    op: SignalBinopOp,
}

impl SignalBinop {
    /// Creates a signal operator.
    pub fn new(op: SignalBinopOp) -> Self {
        Self { op }
    }

    /// The operator.
    pub fn op(&self) -> SignalBinopOp {
        self.op
    }
}

impl Object for SignalBinop {
    fn class_name(&self) -> &'static str {
        self.op.name()
    }

    fn inlets(&self) -> usize {
        0
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

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = self.op.apply(inputs[0], inputs[1]);
    }
}

/// One signal inlet, one signal outlet.
#[derive(Debug, Clone, Copy)]
pub struct SignalUnop {
    op: SignalUnopOp,
}

impl SignalUnop {
    /// Creates a signal operator.
    pub fn new(op: SignalUnopOp) -> Self {
        Self { op }
    }
}

impl Object for SignalUnop {
    fn class_name(&self) -> &'static str {
        self.op.name()
    }

    fn inlets(&self) -> usize {
        0
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

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = self.op.apply(inputs[0]);
    }
}

/// `a * b + c` over three signal inlets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fma;

impl Fma {
    /// Creates a fused multiply-add.
    pub fn new() -> Self {
        Self
    }
}

impl Object for Fma {
    fn class_name(&self) -> &'static str {
        "fma~"
    }

    fn inlets(&self) -> usize {
        0
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        3
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = inputs[0].fma(inputs[1], inputs[2]);
    }
}

/// A signal held constant between control updates.
///
/// Lane `i` outputs `value + i * step`; a non-zero step turns the variable
/// into a per-block ramp (used for sample indices). A float on inlet 0 sets
/// `value`.
#[derive(Debug, Clone, Copy)]
pub struct SignalVar {
    value: f32,
    step: f32,
    lanes: Buf,
}

impl SignalVar {
    /// A constant signal.
    pub fn new(value: f32) -> Self {
        Self::with_step(value, 0.0)
    }

    /// A signal whose lanes rise by `step`.
    pub fn with_step(value: f32, step: f32) -> Self {
        let mut var = Self {
            value,
            step,
            lanes: Buf::zero(),
        };
        var.refresh();
        var
    }

    /// Lane 0 value.
    pub fn value(&self) -> f32 {
        self.value
    }

    fn refresh(&mut self) {
        self.lanes = Buf::ramp().fma(Buf::splat(self.step), Buf::splat(self.value));
    }
}

impl Object for SignalVar {
    fn class_name(&self) -> &'static str {
        "var~"
    }

    fn outlets(&self) -> usize {
        0
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
        if let Some(v) = msg.float(0) {
            self.value = v;
            self.refresh();
        }
    }

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, _inputs: &[Buf], outputs: &mut [Buf]) {
        outputs[0] = self.lanes;
    }
}
