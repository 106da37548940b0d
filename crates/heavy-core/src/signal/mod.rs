//! Signal-rate objects.
//!
//! Each kernel processes one vector of [`N_SIMD`](crate::simd::N_SIMD) lanes
//! per sub-block in topological order. Kernels keep only their own history;
//! anything shared (tables, the scheduler) comes through the
//! [`ObjectContext`](crate::object::ObjectContext).
//!
//! | Object | Signal in | Signal out | Notes |
//! |--------|-----------|------------|-------|
//! | [`SignalBinop`], [`SignalUnop`], [`Fma`] | 1–3 | 1 | lane-wise math |
//! | [`SignalVar`] | 0 | 1 | control-set constant |
//! | [`Phasor`], [`PhasorK`] | 0–1 | 1 | sawtooth in `[0, 1)` |
//! | [`Biquad`], [`BiquadK`] | 6 / 1 | 1 | second-order IIR |
//! | [`RPole`], [`RPoleK`] | 2 / 1 | 1 | real one-pole |
//! | [`CPole`] | 4 | 2 | complex one-pole |
//! | [`Del1`] | 1 | 1 | one-sample delay |
//! | [`Line`] | 0 | 1 | linear ramps |
//! | [`Envelope`] | 1 | 0 | RMS in dB to control |
//! | [`Convolution`] | 1 | 1 | FIR from a table |
//! | [`Samphold`] | 2 | 1 | sample on falling control |
//! | [`Sample`] | 1 | 0 | one sample to control |
//! | [`SignalTabread`], [`SignalTabwrite`], [`SignalTabhead`] | 0–2 | 0–1 | table streaming |
//!
//! The `K` variants take their coefficients at control rate, which lets them
//! evaluate a whole vector at once instead of lane by lane.

mod biquad;
mod convolution;
mod cpole;
mod del1;
mod envelope;
mod line;
mod math;
mod phasor;
mod rpole;
mod sample;
mod samphold;
mod table;

pub use biquad::{Biquad, BiquadK, BiquadMatrix, BiquadState};
pub use convolution::Convolution;
pub use cpole::CPole;
pub use del1::Del1;
pub use envelope::Envelope;
pub use line::Line;
pub use math::{Fma, SignalBinop, SignalBinopOp, SignalUnop, SignalUnopOp, SignalVar};
pub use phasor::{Phasor, PhasorK};
pub use rpole::{RPole, RPoleK};
pub use sample::Sample;
pub use samphold::Samphold;
pub use table::{AccessMode, SignalTabhead, SignalTabread, SignalTabwrite};
