//! Single-operand math on floats.
//!
//! Functions with a restricted domain (`sqrt` and the logarithms) return zero
//! for non-positive input instead of NaN.

use libm::{
    acosf, acoshf, asinf, asinhf, atanf, atanhf, ceilf, cosf, coshf, expf, fabsf, floorf, logf,
    roundf, sinf, sinhf, sqrtf, tanf, tanhf,
};

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

/// The function applied by a [`Unop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnopOp {
    /// Sine.
    Sin,
    /// Hyperbolic sine.
    Sinh,
    /// Cosine.
    Cos,
    /// Hyperbolic cosine.
    Cosh,
    /// Tangent.
    Tan,
    /// Hyperbolic tangent.
    Tanh,
    /// Arcsine.
    Asin,
    /// Inverse hyperbolic sine.
    Asinh,
    /// Arccosine.
    Acos,
    /// Inverse hyperbolic cosine.
    Acosh,
    /// Arctangent.
    Atan,
    /// Inverse hyperbolic tangent.
    Atanh,
    /// `e^x`.
    Exp,
    /// Absolute value.
    Abs,
    /// Square root, zero for `x <= 0`.
    Sqrt,
    /// Natural log, zero for `x <= 0`.
    Log,
    /// Base-2 log, zero for `x <= 0`.
    Log2,
    /// Base-10 log, zero for `x <= 0`.
    Log10,
    /// Round up.
    Ceil,
    /// Round down.
    Floor,
    /// Round half away from zero.
    Round,
}

impl UnopOp {
    /// Every function, in declaration order.
    pub const ALL: [UnopOp; 21] = [
        UnopOp::Sin,
        UnopOp::Sinh,
        UnopOp::Cos,
        UnopOp::Cosh,
        UnopOp::Tan,
        UnopOp::Tanh,
        UnopOp::Asin,
        UnopOp::Asinh,
        UnopOp::Acos,
        UnopOp::Acosh,
        UnopOp::Atan,
        UnopOp::Atanh,
        UnopOp::Exp,
        UnopOp::Abs,
        UnopOp::Sqrt,
        UnopOp::Log,
        UnopOp::Log2,
        UnopOp::Log10,
        UnopOp::Ceil,
        UnopOp::Floor,
        UnopOp::Round,
    ];

    /// Patch-file spelling of the function.
    pub fn name(self) -> &'static str {
        match self {
            UnopOp::Sin => "sin",
            UnopOp::Sinh => "sinh",
            UnopOp::Cos => "cos",
            UnopOp::Cosh => "cosh",
            UnopOp::Tan => "tan",
            UnopOp::Tanh => "tanh",
            UnopOp::Asin => "asin",
            UnopOp::Asinh => "asinh",
            UnopOp::Acos => "acos",
            UnopOp::Acosh => "acosh",
            UnopOp::Atan => "atan",
            UnopOp::Atanh => "atanh",
            UnopOp::Exp => "exp",
            UnopOp::Abs => "abs",
            UnopOp::Sqrt => "sqrt",
            UnopOp::Log => "log",
            UnopOp::Log2 => "log2",
            UnopOp::Log10 => "log10",
            UnopOp::Ceil => "ceil",
            UnopOp::Floor => "floor",
            UnopOp::Round => "round",
        }
    }

    /// Parses a patch-file function name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Applies the function.
    pub fn apply(self, f: f32) -> f32 {
        match self {
            UnopOp::Sin => sinf(f),
            UnopOp::Sinh => sinhf(f),
            UnopOp::Cos => cosf(f),
            UnopOp::Cosh => coshf(f),
            UnopOp::Tan => tanf(f),
            UnopOp::Tanh => tanhf(f),
            UnopOp::Asin => asinf(f),
            UnopOp::Asinh => asinhf(f),
            UnopOp::Acos => acosf(f),
            UnopOp::Acosh => acoshf(f),
            UnopOp::Atan => atanf(f),
            UnopOp::Atanh => atanhf(f),
            UnopOp::Exp => expf(f),
            UnopOp::Abs => fabsf(f),
            UnopOp::Sqrt => positive(f, sqrtf),
            UnopOp::Log => positive(f, logf),
            UnopOp::Log2 => positive(f, |x| core::f32::consts::LOG2_E * logf(x)),
            UnopOp::Log10 => positive(f, |x| core::f32::consts::LOG10_E * logf(x)),
            UnopOp::Ceil => ceilf(f),
            UnopOp::Floor => floorf(f),
            UnopOp::Round => roundf(f),
        }
    }
}

#[inline]
fn positive(f: f32, op: impl Fn(f32) -> f32) -> f32 {
    if f > 0.0 { op(f) } else { 0.0 }
}

/// Unary operator object. One inlet, one outlet.
#[derive(Debug, Clone, Copy)]
pub struct Unop {
    op: UnopOp,
}

impl Unop {
    /// Creates a unop applying `op`.
    pub fn new(op: UnopOp) -> Self {
        Self { op }
    }
}

impl Object for Unop {
    fn class_name(&self) -> &'static str {
        "unop"
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        if let Some(f) = msg.float(0) {
            out.send_float(0, msg.timestamp(), self.op.apply(f));
        }
    }
}
