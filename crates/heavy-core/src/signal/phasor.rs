//! Sawtooth ramps in `[0, 1)`.
//!
//! Both phasors accept a float on inlet 1 that resets the phase (wrapped into
//! `[0, 1)`). [`Phasor`] reads its frequency as a signal and accumulates one
//! lane at a time; [`PhasorK`] takes a control-rate frequency on inlet 0 and
//! computes a whole vector from one phase and one increment.

use libm::floor;

use crate::error::PatchError;
use crate::message::Message;
use crate::object::{InitContext, Object, ObjectContext, Outbox};
use crate::simd::{Buf, N_SIMD};

#[inline]
fn wrap(phase: f64) -> f64 {
    phase - floor(phase)
}

/// Phasor driven by a frequency signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phasor {
    phase: f64,
    inv_sample_rate: f64,
}

impl Phasor {
    /// Creates a phasor at phase 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Object for Phasor {
    fn class_name(&self) -> &'static str {
        "phasor~"
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

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.inv_sample_rate = 1.0 / cx.sample_rate();
        Ok(())
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        if let (1, Some(p)) = (inlet, msg.float(0)) {
            self.phase = wrap(f64::from(p));
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let freq = inputs[0];
        outputs[0] = Buf::from_fn(|j| {
            let out = self.phase as f32;
            self.phase = wrap(self.phase + f64::from(freq.lane(j)) * self.inv_sample_rate);
            out
        });
    }
}

/// Phasor with a control-rate frequency.
#[derive(Debug, Clone, Copy)]
pub struct PhasorK {
    frequency: f32,
    phase: f64,
    step: f64,
    sample_rate: f64,
}

impl PhasorK {
    /// Creates a phasor at `frequency` Hz.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency,
            phase: 0.0,
            step: 0.0,
            sample_rate: 0.0,
        }
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.step = f64::from(frequency) / self.sample_rate;
    }
}

impl Object for PhasorK {
    fn class_name(&self) -> &'static str {
        "phasor_k~"
    }

    fn inlets(&self) -> usize {
        2
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.sample_rate = cx.sample_rate();
        self.set_frequency(self.frequency);
        Ok(())
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        let Some(v) = msg.float(0) else {
            return;
        };
        match inlet {
            0 => self.set_frequency(v),
            1 => self.phase = wrap(f64::from(v)),
            _ => {}
        }
    }

    #[inline]
    fn process(&mut self, _cx: &mut ObjectContext<'_>, _inputs: &[Buf], outputs: &mut [Buf]) {
        let (phase, step) = (self.phase, self.step);
        outputs[0] = Buf::from_fn(|j| wrap(phase + j as f64 * step) as f32);
        self.phase = wrap(phase + N_SIMD as f64 * step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::Harness;

    fn run(h: &mut Harness, obj: &mut dyn Object, inputs: &[Buf], blocks: usize) -> Vec<f32> {
        (0..blocks).flat_map(|_| h.process(obj, inputs)[0].0).collect()
    }

    #[test]
    fn control_phasor_ramps_and_wraps() {
        let mut h = Harness::new();
        // 12 kHz at 48 kHz: a quarter per sample.
        let mut p = PhasorK::new(12_000.0);
        h.init(&mut p);
        let out = run(&mut h, &mut p, &[], 8 / N_SIMD);
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn signal_phasor_matches_control_phasor() {
        let mut h = Harness::new();
        let mut sig = Phasor::new();
        let mut ctl = PhasorK::new(440.0);
        h.init(&mut sig);
        h.init(&mut ctl);
        let a = run(&mut h, &mut sig, &[Buf::splat(440.0)], 64);
        let b = run(&mut h, &mut ctl, &[], 64);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-4, "{x} vs {y}");
        }
        assert!(a.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn phase_reset_and_frequency_change() {
        let mut h = Harness::new();
        let mut p = PhasorK::new(0.0);
        h.init(&mut p);
        h.float(&mut p, 1, 1.25);
        assert_eq!(h.process(&mut p, &[])[0], Buf::splat(0.25));
        h.float(&mut p, 0, 24_000.0);
        assert_eq!(p.frequency(), 24_000.0);
        assert_eq!(h.process(&mut p, &[])[0].lane(0), 0.25);
    }
}
