//! Queries about the running context.
//!
//! | Message | Reply |
//! |---------|-------|
//! | `samplerate` | sample rate in Hz |
//! | `numInputChannels` | host input channels |
//! | `numOutputChannels` | host output channels |
//! | `currentTime` | message timestamp in samples |
//! | `table <name> length` | logical table size |
//! | `table <name> size` | allocated table size |
//! | `table <name> head` | table head position |
//!
//! Unknown queries and unknown tables produce nothing.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

/// Context query object.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl System {
    /// Creates a system object.
    pub fn new() -> Self {
        Self
    }
}

fn query(cx: &ObjectContext<'_>, msg: &Message<'_>) -> Option<f32> {
    if msg.compare_symbol(0, "samplerate") {
        Some(cx.sample_rate() as f32)
    } else if msg.compare_symbol(0, "numInputChannels") {
        Some(cx.num_input_channels() as f32)
    } else if msg.compare_symbol(0, "numOutputChannels") {
        Some(cx.num_output_channels() as f32)
    } else if msg.compare_symbol(0, "currentTime") {
        Some(msg.timestamp() as f32)
    } else if msg.compare_symbol(0, "table") {
        let table = cx.tables().get(msg.hash(1))?;
        if msg.compare_symbol(2, "length") {
            Some(table.size() as f32)
        } else if msg.compare_symbol(2, "size") {
            Some(table.allocated() as f32)
        } else if msg.compare_symbol(2, "head") {
            Some(table.head() as f32)
        } else {
            None
        }
    } else {
        None
    }
}

impl Object for System {
    fn class_name(&self) -> &'static str {
        "system"
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        if let Some(value) = query(cx, msg) {
            out.send_float(0, msg.timestamp(), value);
        }
    }
}
