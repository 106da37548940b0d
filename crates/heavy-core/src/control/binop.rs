//! Two-operand arithmetic, comparison and bitwise operators on floats.
//!
//! A [`Binop`] with two inlets latches its right operand from inlet 1 and
//! emits `op(left, right)` for every float on inlet 0. A left-inlet message of
//! two floats also sets the right operand first, so `[3 4(` into `+` emits 7.
//!
//! A constant binop ([`Binop::constant`]) has one inlet. Its operand is fixed;
//! a second float in the message overrides it for that message only.
//!
//! Bangs and symbols are ignored. There is no "repeat last output" on bang.

use libm::{atan2f, fabsf, powf};

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

/// The operator applied by a [`Binop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinopOp {
    /// `f + k`
    Add,
    /// `f - k`
    Subtract,
    /// `f * k`
    Multiply,
    /// `f / k`, zero when `k == 0`
    Divide,
    /// Integer division after truncation, zero when `k` truncates to zero.
    IntDivide,
    /// Truncated remainder keeping the sign of `f`.
    ModBipolar,
    /// Remainder shifted into `[0, |k|)`.
    ModUnipolar,
    /// `f << k` on truncated integers.
    ShiftLeft,
    /// `f >> k` on truncated integers (arithmetic).
    ShiftRight,
    /// Bitwise and.
    BitAnd,
    /// Bitwise exclusive or.
    BitXor,
    /// Bitwise or.
    BitOr,
    /// `1` if equal.
    Equal,
    /// `1` if not equal.
    NotEqual,
    /// `1` if both are non-zero.
    LogicalAnd,
    /// `1` if either is non-zero.
    LogicalOr,
    /// `1` if `f < k`.
    Less,
    /// `1` if `f <= k`.
    LessEqual,
    /// `1` if `f > k`.
    Greater,
    /// `1` if `f >= k`.
    GreaterEqual,
    /// Larger operand.
    Max,
    /// Smaller operand.
    Min,
    /// `f` raised to `k`, zero when `f <= 0`.
    Pow,
    /// `atan2(f, k)`, zero when both are zero.
    Atan2,
}

impl BinopOp {
    /// Every operator, in declaration order.
    pub const ALL: [BinopOp; 24] = [
        BinopOp::Add,
        BinopOp::Subtract,
        BinopOp::Multiply,
        BinopOp::Divide,
        BinopOp::IntDivide,
        BinopOp::ModBipolar,
        BinopOp::ModUnipolar,
        BinopOp::ShiftLeft,
        BinopOp::ShiftRight,
        BinopOp::BitAnd,
        BinopOp::BitXor,
        BinopOp::BitOr,
        BinopOp::Equal,
        BinopOp::NotEqual,
        BinopOp::LogicalAnd,
        BinopOp::LogicalOr,
        BinopOp::Less,
        BinopOp::LessEqual,
        BinopOp::Greater,
        BinopOp::GreaterEqual,
        BinopOp::Max,
        BinopOp::Min,
        BinopOp::Pow,
        BinopOp::Atan2,
    ];

    /// Patch-file spelling of the operator.
    pub fn name(self) -> &'static str {
        match self {
            BinopOp::Add => "+",
            BinopOp::Subtract => "-",
            BinopOp::Multiply => "*",
            BinopOp::Divide => "/",
            BinopOp::IntDivide => "div",
            BinopOp::ModBipolar => "%",
            BinopOp::ModUnipolar => "mod",
            BinopOp::ShiftLeft => "<<",
            BinopOp::ShiftRight => ">>",
            BinopOp::BitAnd => "&",
            BinopOp::BitXor => "^",
            BinopOp::BitOr => "|",
            BinopOp::Equal => "==",
            BinopOp::NotEqual => "!=",
            BinopOp::LogicalAnd => "&&",
            BinopOp::LogicalOr => "||",
            BinopOp::Less => "<",
            BinopOp::LessEqual => "<=",
            BinopOp::Greater => ">",
            BinopOp::GreaterEqual => ">=",
            BinopOp::Max => "max",
            BinopOp::Min => "min",
            BinopOp::Pow => "pow",
            BinopOp::Atan2 => "atan2",
        }
    }

    /// Parses a patch-file operator name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Applies the operator.
    pub fn apply(self, f: f32, k: f32) -> f32 {
        let bool_f = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            BinopOp::Add => f + k,
            BinopOp::Subtract => f - k,
            BinopOp::Multiply => f * k,
            BinopOp::Divide => {
                if k != 0.0 {
                    f / k
                } else {
                    0.0
                }
            }
            BinopOp::IntDivide => {
                let ik = k as i32;
                if ik != 0 {
                    (f as i32).wrapping_div(ik) as f32
                } else {
                    0.0
                }
            }
            BinopOp::ModBipolar => {
                let ik = k as i32;
                if ik != 0 {
                    (f as i32).wrapping_rem(ik) as f32
                } else {
                    0.0
                }
            }
            BinopOp::ModUnipolar => {
                let ik = k as i32;
                if ik == 0 {
                    return 0.0;
                }
                let r = (f as i32).wrapping_rem(ik) as f32;
                if r < 0.0 { r + fabsf(k) } else { r }
            }
            BinopOp::ShiftLeft => shift(f, k, i32::checked_shl),
            BinopOp::ShiftRight => shift(f, k, i32::checked_shr),
            BinopOp::BitAnd => ((f as i32) & (k as i32)) as f32,
            BinopOp::BitXor => ((f as i32) ^ (k as i32)) as f32,
            BinopOp::BitOr => ((f as i32) | (k as i32)) as f32,
            BinopOp::Equal => bool_f(f == k),
            BinopOp::NotEqual => bool_f(f != k),
            BinopOp::LogicalAnd => bool_f(f != 0.0 && k != 0.0),
            BinopOp::LogicalOr => bool_f(f != 0.0 || k != 0.0),
            BinopOp::Less => bool_f(f < k),
            BinopOp::LessEqual => bool_f(f <= k),
            BinopOp::Greater => bool_f(f > k),
            BinopOp::GreaterEqual => bool_f(f >= k),
            BinopOp::Max => f.max(k),
            BinopOp::Min => f.min(k),
            BinopOp::Pow => {
                if f > 0.0 {
                    powf(f, k)
                } else {
                    0.0
                }
            }
            BinopOp::Atan2 => {
                if f == 0.0 && k == 0.0 {
                    0.0
                } else {
                    atan2f(f, k)
                }
            }
        }
    }
}

// Shift amounts outside 0..32 produce zero.
fn shift(f: f32, k: f32, op: fn(i32, u32) -> Option<i32>) -> f32 {
    let amount = k as i32;
    if amount < 0 {
        return 0.0;
    }
    op(f as i32, amount as u32).map_or(0.0, |v| v as f32)
}

/// Binary operator object.
#[derive(Debug, Clone)]
pub struct Binop {
    op: BinopOp,
    k: f32,
    latching: bool,
}

impl Binop {
    /// Creates a two-inlet binop whose right operand starts at `k`.
    pub fn new(op: BinopOp, k: f32) -> Self {
        Self {
            op,
            k,
            latching: true,
        }
    }

    /// Creates a one-inlet binop with a fixed operand.
    pub fn constant(op: BinopOp, k: f32) -> Self {
        Self {
            op,
            k,
            latching: false,
        }
    }

    /// The operator.
    pub fn op(&self) -> BinopOp {
        self.op
    }

    /// Current right operand.
    pub fn operand(&self) -> f32 {
        self.k
    }
}

impl Object for Binop {
    fn class_name(&self) -> &'static str {
        "binop"
    }

    fn inlets(&self) -> usize {
        if self.latching { 2 } else { 1 }
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        match (inlet, self.latching) {
            (0, true) => {
                if let Some(f) = msg.float(0) {
                    if let Some(k) = msg.float(1) {
                        self.k = k;
                    }
                    out.send_float(0, msg.timestamp(), self.op.apply(f, self.k));
                }
            }
            (0, false) => {
                if let Some(f) = msg.float(0) {
                    let k = msg.float(1).unwrap_or(self.k);
                    out.send_float(0, msg.timestamp(), self.op.apply(f, k));
                }
            }
            (1, true) => {
                if let Some(k) = msg.float(0) {
                    self.k = k;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Element;
    use crate::object::test_support::{Harness, only_float};

    #[test]
    fn names_round_trip() {
        for op in BinopOp::ALL {
            assert_eq!(BinopOp::from_name(op.name()), Some(op));
        }
        assert_eq!(BinopOp::from_name("nope"), None);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(BinopOp::Divide.apply(5.0, 0.0), 0.0);
        assert_eq!(BinopOp::IntDivide.apply(5.0, 0.4), 0.0);
        assert_eq!(BinopOp::ModBipolar.apply(5.0, 0.0), 0.0);
        assert_eq!(BinopOp::ModUnipolar.apply(5.0, 0.0), 0.0);
    }

    #[test]
    fn modulo_variants() {
        assert_eq!(BinopOp::ModBipolar.apply(-7.0, 3.0), -1.0);
        assert_eq!(BinopOp::ModUnipolar.apply(-7.0, 3.0), 2.0);
        assert_eq!(BinopOp::ModUnipolar.apply(7.0, 3.0), 1.0);
        assert_eq!(BinopOp::IntDivide.apply(7.9, 2.0), 3.0);
    }

    #[test]
    fn bit_operators() {
        assert_eq!(BinopOp::ShiftLeft.apply(1.0, 4.0), 16.0);
        assert_eq!(BinopOp::ShiftRight.apply(-16.0, 2.0), -4.0);
        assert_eq!(BinopOp::ShiftLeft.apply(1.0, 40.0), 0.0);
        assert_eq!(BinopOp::BitAnd.apply(6.0, 3.0), 2.0);
        assert_eq!(BinopOp::BitXor.apply(6.0, 3.0), 5.0);
        assert_eq!(BinopOp::BitOr.apply(6.0, 3.0), 7.0);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(BinopOp::Less.apply(1.0, 2.0), 1.0);
        assert_eq!(BinopOp::GreaterEqual.apply(1.0, 2.0), 0.0);
        assert_eq!(BinopOp::LogicalAnd.apply(1.0, 0.0), 0.0);
        assert_eq!(BinopOp::LogicalOr.apply(1.0, 0.0), 1.0);
        assert_eq!(BinopOp::NotEqual.apply(2.0, 2.0), 0.0);
    }

    #[test]
    fn pow_and_atan2_guards() {
        assert_eq!(BinopOp::Pow.apply(-2.0, 2.0), 0.0);
        assert_eq!(BinopOp::Pow.apply(2.0, 3.0), 8.0);
        assert_eq!(BinopOp::Atan2.apply(0.0, 0.0), 0.0);
        assert!((BinopOp::Atan2.apply(1.0, 1.0) - core::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn right_inlet_latches() {
        let mut h = Harness::new();
        let mut add = Binop::new(BinopOp::Add, 1.0);
        assert_eq!(only_float(&h.float(&mut add, 0, 2.0), 0), 3.0);
        assert!(h.float(&mut add, 1, 10.0).is_empty());
        assert_eq!(only_float(&h.float(&mut add, 0, 2.0), 0), 12.0);
    }

    #[test]
    fn two_float_list_sets_operand() {
        let mut h = Harness::new();
        let mut sub = Binop::new(BinopOp::Subtract, 0.0);
        let out = h.send(&mut sub, 0, 7, &[Element::Float(10.0), Element::Float(4.0)]);
        assert_eq!(only_float(&out, 0), 6.0);
        assert_eq!(out[0].1.timestamp(), 7);
        assert_eq!(sub.operand(), 4.0);
    }

    #[test]
    fn constant_binop_does_not_latch() {
        let mut h = Harness::new();
        let mut mul = Binop::constant(BinopOp::Multiply, 2.0);
        assert_eq!(mul.inlets(), 1);
        let out = h.send(&mut mul, 0, 0, &[Element::Float(3.0), Element::Float(5.0)]);
        assert_eq!(only_float(&out, 0), 15.0);
        assert_eq!(only_float(&h.float(&mut mul, 0, 3.0), 0), 6.0);
    }

    #[test]
    fn bang_is_ignored() {
        let mut h = Harness::new();
        let mut add = Binop::new(BinopOp::Add, 1.0);
        assert!(h.send(&mut add, 0, 0, &[Element::Bang]).is_empty());
    }
}
