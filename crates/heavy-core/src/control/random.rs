//! Deterministic pseudo-random floats.
//!
//! A Lehmer generator: `state = state * 279470273 mod (2^31 - 1)`. Any message
//! on inlet 0 advances the state and emits `(state >> 8) / 2^23`, a float in
//! `[0, 1)`. A float on inlet 1 reseeds. A zero seed (which would lock the
//! generator at zero) is replaced by one.
//!
//! The same seed yields the same sequence on every platform.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

const MULTIPLIER: u64 = 279_470_273;
const MODULUS: u64 = 2_147_483_647;
const SCALE: f32 = 1.0 / 8_388_608.0;

/// Seeded random number generator object.
#[derive(Debug, Clone, Copy)]
pub struct Random {
    state: u32,
}

impl Random {
    /// Creates a generator with `seed`.
    pub fn new(seed: u32) -> Self {
        let mut r = Self { state: 1 };
        r.seed(seed);
        r
    }

    /// Resets the state.
    pub fn seed(&mut self, seed: u32) {
        let s = (u64::from(seed) % MODULUS) as u32;
        self.state = if s == 0 { 1 } else { s };
    }

    /// Current state.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advances the state and returns the next value in `[0, 1)`.
    pub fn next_value(&mut self) -> f32 {
        self.state = ((u64::from(self.state) * MULTIPLIER) % MODULUS) as u32;
        (self.state >> 8) as f32 * SCALE
    }
}

impl Object for Random {
    fn class_name(&self) -> &'static str {
        "random"
    }

    fn inlets(&self) -> usize {
        2
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 => {
                let value = self.next_value();
                out.send_float(0, msg.timestamp(), value);
            }
            1 => {
                if let Some(seed) = msg.float(0) {
                    self.seed(seed.max(0.0) as u32);
                }
            }
            _ => {}
        }
    }
}
