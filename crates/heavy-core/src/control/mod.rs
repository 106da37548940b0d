//! Control-rate objects.
//!
//! Each object is a small state machine over its inlets. Inlet 0 is "hot"
//! (usually triggers output), the others are "cold" (update state only),
//! unless an object documents otherwise. Malformed input is ignored; objects
//! never report errors at run time.
//!
//! | Object | Inlets | Outlets | Behaviour |
//! |--------|--------|---------|-----------|
//! | [`Binop`] | 2 (1 constant) | 1 | `op(left, right)` over 24 operators |
//! | [`Unop`] | 1 | 1 | trig, log, rounding |
//! | [`Delay`] | 3 | 1 | reschedule by a fixed delay, `clear`, `flush` |
//! | [`Pack`] | n | 1 | combine latched values |
//! | [`Slice`] | 3 | 2 | element sub-range |
//! | [`Var`] | 2 | 1 | store one value |
//! | [`Random`] | 2 | 1 | Lehmer LCG in `[0, 1)` |
//! | [`If`] | 2 | 2 | two-way gate |
//! | [`Switchcase`] | 1 | n + 1 | route by first-element hash |
//! | [`Cast`] | 1 | 1 | bang, float or symbol conversion |
//! | [`MessageBox`] | 1 | 1 | constant messages with `$n` |
//! | [`Tabread`], [`Tabwrite`], [`Tabhead`] | 2–3 | 0–1 | table access |
//! | [`System`] | 1 | 1 | sample rate, channels, time, table info |
//! | [`Print`], [`Send`], [`Receive`] | 1 | 0–1 | hooks and named routing |

mod binop;
mod cast;
mod delay;
mod io;
mod pack;
mod random;
mod route;
mod slice;
mod system;
mod table;
mod unop;
mod var;

pub use binop::{Binop, BinopOp};
pub use cast::{Cast, CastKind, MessageBox, Slot};
pub use delay::{Delay, MAX_PENDING};
pub use io::{Print, Receive, Send};
pub use pack::Pack;
pub use random::Random;
pub use route::{If, Switchcase};
pub use slice::Slice;
pub use system::System;
pub use table::{Tabhead, Tabread, Tabwrite};
pub use unop::{Unop, UnopOp};
pub use var::Var;
