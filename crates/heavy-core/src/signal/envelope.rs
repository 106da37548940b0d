//! RMS envelope follower reporting in decibels.
//!
//! The follower squares its input into a history of `window` samples. Every
//! `period` samples, once the history is full, it takes the Hann-weighted mean
//! square and reports `10 * log10(mean) + 100`, so a full-scale sine reads
//! about 97 dB and silence reads 0. Reports are scheduled one vector after
//! the sub-block that completed the window, so they reach the control graph
//! through the scheduler like any other timed message.
//!
//! Both sizes are rounded up to whole vectors. The period is clamped to
//! `[W, window]`.

use libm::{cos, log};

use crate::message::{Element, Message};
use crate::object::{Object, ObjectContext};
use crate::simd::{Buf, N_SIMD, align_up};

/// 10 / ln(10)
const DB_PER_NEPER_POWER: f64 = 4.342_944_819_032_518;

/// Envelope follower with one signal inlet and one control outlet.
#[derive(Debug, Clone)]
pub struct Envelope {
    window: usize,
    period: usize,
    weights: Vec<f32>,
    history: Vec<f32>,
    filled: usize,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(1024, 512)
    }
}

impl Envelope {
    /// Creates a follower over `window` samples reporting every `period`.
    pub fn new(window: usize, period: usize) -> Self {
        let window = align_up(window.max(N_SIMD));
        let period = align_up(period.clamp(N_SIMD, window)).min(window);
        Self {
            window,
            period,
            weights: hann(window),
            history: vec![0.0; window],
            filled: 0,
        }
    }

    /// Window length in samples.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Report period in samples.
    pub fn period(&self) -> usize {
        self.period
    }

    fn level(&self) -> f32 {
        let mean: f64 = self
            .weights
            .iter()
            .zip(&self.history)
            .map(|(&w, &x)| f64::from(w) * f64::from(x))
            .sum();
        (DB_PER_NEPER_POWER * log(mean) + 100.0).max(0.0) as f32
    }
}

/// Hann window normalised to unit sum.
fn hann(n: usize) -> Vec<f32> {
    if n == 1 {
        return vec![1.0];
    }
    let raw: Vec<f64> = (0..n)
        .map(|i| 0.5 * (1.0 - cos(2.0 * core::f64::consts::PI * i as f64 / (n - 1) as f64)))
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|w| (w / sum) as f32).collect()
}

impl Object for Envelope {
    fn class_name(&self) -> &'static str {
        "env~"
    }

    fn inlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, inputs: &[Buf], _outputs: &mut [Buf]) {
        let x = inputs[0];
        (x * x).store(&mut self.history[self.filled..]);
        self.filled += N_SIMD;
        if self.filled < self.window {
            return;
        }
        let db = self.level();
        let when = cx.current_sample().wrapping_add(N_SIMD as u32);
        cx.schedule(0, &Message::new(when, &[Element::Float(db)]));
        self.history.copy_within(self.period.., 0);
        self.filled -= self.period;
    }
}
