//! Message delay.
//!
//! Every message arriving on inlet 0 is rescheduled `delay` samples later on
//! outlet 0, except the two commands:
//!
//! - `clear` cancels everything pending without output.
//! - `flush` emits everything pending immediately (restamped to the flush
//!   time, in slot order) and then cancels it.
//!
//! Inlet 1 sets the delay in milliseconds, inlet 2 in samples. Negative values
//! clamp to zero. A new delay applies to messages scheduled afterwards.
//!
//! # Invariants
//!
//! At most [`MAX_PENDING`] messages may be in flight per delay object.
//! Scheduling one more is a fatal error.

use crate::error::PatchError;
use crate::message::Message;
use crate::object::{InitContext, Object, ObjectContext, Outbox};
use crate::queue::MessageHandle;

/// Most messages one delay object tracks at once.
pub const MAX_PENDING: usize = 8;

/// Delays messages by a fixed number of samples.
#[derive(Debug, Clone)]
pub struct Delay {
    delay_ms: f32,
    delay: u32,
    pending: [Option<MessageHandle>; MAX_PENDING],
}

impl Delay {
    /// Creates a delay of `delay_ms` milliseconds. The sample count is fixed
    /// once the sample rate is known.
    pub fn new(delay_ms: f32) -> Self {
        Self {
            delay_ms,
            delay: 0,
            pending: [None; MAX_PENDING],
        }
    }

    /// Current delay in samples.
    pub fn delay_samples(&self) -> u32 {
        self.delay
    }

    /// Number of messages in flight.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|p| p.is_some()).count()
    }
}

fn ms_to_samples(ms: f32, sample_rate: f64) -> u32 {
    (f64::from(ms.max(0.0)) * sample_rate / 1000.0) as u32
}

impl Object for Delay {
    fn class_name(&self) -> &'static str {
        "delay"
    }

    fn inlets(&self) -> usize {
        3
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.delay = ms_to_samples(self.delay_ms, cx.sample_rate());
        Ok(())
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 if msg.compare_symbol(0, "flush") => {
                for slot in &mut self.pending {
                    if let Some(handle) = slot.take() {
                        if let Some(m) = cx.scheduled(handle) {
                            out.send(0, &m.with_timestamp(msg.timestamp()));
                        }
                        cx.cancel(handle);
                    }
                }
            }
            0 if msg.compare_symbol(0, "clear") => {
                for slot in &mut self.pending {
                    if let Some(handle) = slot.take() {
                        cx.cancel(handle);
                    }
                }
            }
            0 => {
                let Some(slot) = self.pending.iter_mut().find(|p| p.is_none()) else {
                    panic!(
                        "delay {} cannot track more than {MAX_PENDING} pending messages",
                        cx.object_id()
                    );
                };
                let due = msg.timestamp().wrapping_add(self.delay);
                *slot = Some(cx.schedule(0, &msg.with_timestamp(due)));
            }
            1 => {
                if let Some(ms) = msg.float(0) {
                    self.delay = ms_to_samples(ms, cx.sample_rate());
                }
            }
            2 => {
                if let Some(samples) = msg.float(0) {
                    self.delay = samples.max(0.0) as u32;
                }
            }
            _ => {}
        }
    }

    fn on_scheduled(&mut self, handle: MessageHandle) {
        if let Some(slot) = self.pending.iter_mut().find(|p| **p == Some(handle)) {
            *slot = None;
        }
    }
}
