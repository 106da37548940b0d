//! Linear ramp generator.
//!
//! Each lane carries its own position and remaining sample count so a ramp
//! can start and finish on any lane. While a lane's count is non-negative it
//! outputs its position; once the count goes negative it outputs the target.
//! Per vector the positions advance by `W * slope` and the counts drop by `W`.
//!
//! | Message | Effect |
//! |---------|--------|
//! | `target ms` | ramp from the current value to `target` over `ms` |
//! | `target` | ramp over the time latched on inlet 1, or jump if none |
//! | `stop` | freeze at the current value |
//!
//! A float on inlet 1 latches the duration for the next bare target only.
//! Durations of less than one sample jump.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};
use crate::simd::{Buf, N_SIMD};

/// Ramp generator with one signal outlet.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    target: f32,
    position: Buf,
    slope: Buf,
    remaining: [i32; N_SIMD],
    latched_ms: Option<f32>,
}

impl Default for Line {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Line {
    /// Creates a line resting at `value`.
    pub fn new(value: f32) -> Self {
        Self {
            target: value,
            position: Buf::splat(value),
            slope: Buf::zero(),
            remaining: [-1; N_SIMD],
            latched_ms: None,
        }
    }

    /// The next sample lane 0 will output.
    pub fn current(&self) -> f32 {
        if self.remaining[0] >= 0 {
            self.position.lane(0)
        } else {
            self.target
        }
    }

    /// True while any lane is still ramping.
    pub fn is_ramping(&self) -> bool {
        self.remaining.iter().any(|&n| n >= 0)
    }

    fn jump(&mut self, value: f32) {
        self.target = value;
        self.remaining = [-1; N_SIMD];
    }

    fn ramp(&mut self, target: f32, samples: f64) {
        let n = samples as i32;
        if n <= 0 {
            self.jump(target);
            return;
        }
        let start = self.current();
        let step = (target - start) / n as f32;
        self.target = target;
        self.position = Buf::ramp().fma(Buf::splat(step), Buf::splat(start));
        self.slope = Buf::splat(step * N_SIMD as f32);
        self.remaining = core::array::from_fn(|j| n - j as i32);
    }
}

impl Object for Line {
    fn class_name(&self) -> &'static str {
        "line~"
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

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        if inlet == 1 {
            if let Some(ms) = msg.float(0) {
                self.latched_ms = Some(ms);
            }
            return;
        }
        if msg.compare_symbol(0, "stop") {
            self.jump(self.current());
            return;
        }
        let Some(target) = msg.float(0) else {
            return;
        };
        let ms = msg.float(1).or(self.latched_ms.take());
        match ms {
            Some(ms) => self.ramp(target, cx.ms_to_samples(f64::from(ms))),
            None => self.jump(target),
        }
    }

    fn process(&mut self, _cx: &mut ObjectContext<'_>, _inputs: &[Buf], outputs: &mut [Buf]) {
        let mask = self.remaining.map(|n| n >= 0);
        outputs[0] = Buf::select(mask, self.position, Buf::splat(self.target));
        if mask.iter().any(|&m| m) {
            self.position += self.slope;
            for n in &mut self.remaining {
                if *n >= 0 {
                    *n -= N_SIMD as i32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Element;
    use crate::object::test_support::Harness;

    fn render(h: &mut Harness, line: &mut Line, samples: usize) -> Vec<f32> {
        (0..samples / N_SIMD)
            .flat_map(|_| h.process(line, &[])[0].0)
            .collect()
    }

    fn ramp_msg(target: f32, ms: f32) -> [Element; 2] {
        [Element::Float(target), Element::Float(ms)]
    }

    #[test]
    fn ramps_then_holds_target() {
        let mut h = Harness::new();
        let mut line = Line::new(0.0);
        // 1 ms at 48 kHz is 48 samples.
        h.send(&mut line, 0, 0, &ramp_msg(48.0, 1.0));
        let out = render(&mut h, &mut line, 64);
        for (i, v) in out.iter().enumerate() {
            let expected = (i as f32).min(48.0);
            assert!((v - expected).abs() < 1e-3, "sample {i}: {v}");
        }
        assert!(!line.is_ramping());
        assert_eq!(line.current(), 48.0);
    }

    #[test]
    fn bare_float_jumps() {
        let mut h = Harness::new();
        let mut line = Line::new(1.0);
        h.float(&mut line, 0, -3.0);
        assert_eq!(h.process(&mut line, &[])[0], Buf::splat(-3.0));
    }

    #[test]
    fn zero_duration_jumps() {
        let mut h = Harness::new();
        let mut line = Line::new(0.0);
        h.send(&mut line, 0, 0, &ramp_msg(5.0, 0.0));
        assert_eq!(h.process(&mut line, &[])[0], Buf::splat(5.0));
    }

    #[test]
    fn stop_freezes_mid_ramp() {
        let mut h = Harness::new();
        let mut line = Line::new(0.0);
        h.send(&mut line, 0, 0, &ramp_msg(96.0, 2.0));
        render(&mut h, &mut line, 16);
        h.send(&mut line, 0, 0, &[Element::symbol("stop")]);
        assert_eq!(line.current(), 16.0);
        assert_eq!(h.process(&mut line, &[])[0], Buf::splat(16.0));
    }

    #[test]
    fn retarget_starts_from_current_value() {
        let mut h = Harness::new();
        let mut line = Line::new(0.0);
        h.send(&mut line, 0, 0, &ramp_msg(48.0, 1.0));
        render(&mut h, &mut line, 24);
        h.send(&mut line, 0, 0, &ramp_msg(0.0, 0.5));
        let out = render(&mut h, &mut line, 32);
        assert!((out[0] - 24.0).abs() < 1e-3);
        assert!(out[23].abs() < 1.5);
        assert_eq!(out[31], 0.0);
    }

    #[test]
    fn latched_time_applies_once() {
        let mut h = Harness::new();
        let mut line = Line::new(0.0);
        h.float(&mut line, 1, 1.0);
        h.float(&mut line, 0, 48.0);
        assert!(line.is_ramping());
        h.float(&mut line, 0, 7.0);
        assert!(!line.is_ramping());
        assert_eq!(line.current(), 7.0);
    }
}
