//! Extracts a run of elements from a message.
//!
//! Emits elements `start .. start + count` of each inlet-0 message on outlet 0
//! (`count <= 0` means "to the end"). When `start` is past the end of the
//! message a bang leaves outlet 1 instead. Inlet 1 sets `start` (and `count`
//! if a second float follows); inlet 2 sets `count`.

use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

/// Sub-message extractor.
#[derive(Debug, Clone, Copy)]
pub struct Slice {
    start: i32,
    count: i32,
}

impl Slice {
    /// Creates a slice of `count` elements starting at `start`.
    pub fn new(start: i32, count: i32) -> Self {
        Self { start, count }
    }
}

impl Object for Slice {
    fn class_name(&self) -> &'static str {
        "slice"
    }

    fn inlets(&self) -> usize {
        3
    }

    fn outlets(&self) -> usize {
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
                let len = msg.len();
                match usize::try_from(self.start) {
                    Ok(start) if start < len => {
                        let mut n = len - start;
                        if self.count > 0 {
                            n = n.min(self.count as usize);
                        }
                        let part = &msg.elements()[start..start + n];
                        out.send(0, &Message::new(msg.timestamp(), part));
                    }
                    _ => out.send_bang(1, msg.timestamp()),
                }
            }
            1 => {
                if let Some(start) = msg.float(0) {
                    self.start = start as i32;
                    if let Some(count) = msg.float(1) {
                        self.count = count as i32;
                    }
                }
            }
            2 => {
                if let Some(count) = msg.float(0) {
                    self.count = count as i32;
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
    use crate::object::test_support::Harness;

    fn list() -> Vec<Element> {
        (0..5).map(|i| Element::Float(i as f32)).collect()
    }

    #[test]
    fn slices_bounded_run() {
        let mut h = Harness::new();
        let mut s = Slice::new(1, 2);
        let out = h.send(&mut s, 0, 3, &list());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 0);
        assert_eq!(out[0].1.elements(), &[Element::Float(1.0), Element::Float(2.0)]);
        assert_eq!(out[0].1.timestamp(), 3);
    }

    #[test]
    fn non_positive_count_takes_the_rest() {
        let mut h = Harness::new();
        let mut s = Slice::new(3, -1);
        let out = h.send(&mut s, 0, 0, &list());
        assert_eq!(out[0].1.len(), 2);
    }

    #[test]
    fn start_past_end_bangs_right_outlet() {
        let mut h = Harness::new();
        let mut s = Slice::new(5, 1);
        let out = h.send(&mut s, 0, 0, &list());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 1);
        assert!(out[0].1.as_message().is_bang(0));
    }

    #[test]
    fn inlets_update_bounds() {
        let mut h = Harness::new();
        let mut s = Slice::new(0, 1);
        h.send(&mut s, 1, 0, &[Element::Float(2.0), Element::Float(3.0)]);
        let out = h.send(&mut s, 0, 0, &list());
        assert_eq!(out[0].1.len(), 3);
        h.float(&mut s, 2, 1.0);
        let out = h.send(&mut s, 0, 0, &list());
        assert_eq!(out[0].1.elements(), &[Element::Float(2.0)]);
    }
}
