//! Combines values from several inlets into one message.
//!
//! The object keeps one retained message with one slot per inlet. Inlet 0
//! merges every float or symbol of the incoming message into the matching
//! slots and emits the whole message. Other inlets store their first element
//! into their own slot without emitting. Bangs never overwrite a slot.

use crate::message::{Element, Message, OwnedMessage};
use crate::object::{Object, ObjectContext, Outbox};

/// Retains one value per inlet and emits them together.
#[derive(Debug, Clone)]
pub struct Pack {
    values: OwnedMessage,
}

impl Pack {
    /// Creates a pack with one slot per initial value.
    pub fn new(initial: &[f32]) -> Self {
        let elements: Vec<Element> = initial.iter().copied().map(Element::Float).collect();
        Self {
            values: OwnedMessage::new(0, &elements),
        }
    }

    /// Current slot values.
    pub fn values(&self) -> &[Element] {
        self.values.elements()
    }
}

fn storable(e: &Element) -> bool {
    !matches!(e, Element::Bang)
}

impl Object for Pack {
    fn class_name(&self) -> &'static str {
        "pack"
    }

    fn inlets(&self) -> usize {
        self.values.len().max(1)
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        if inlet == 0 {
            for (i, e) in msg.elements().iter().enumerate().take(self.values.len()) {
                if storable(e) {
                    self.values.set_element(i, *e);
                }
            }
            self.values.set_timestamp(msg.timestamp());
            out.send(0, &self.values.as_message());
        } else if let Some(e) = msg.element(0).filter(|e| storable(e)) {
            self.values.set_element(inlet, *e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::Harness;

    #[test]
    fn cold_inlets_store_hot_inlet_emits() {
        let mut h = Harness::new();
        let mut p = Pack::new(&[0.0, 0.0, 0.0]);
        assert_eq!(p.inlets(), 3);
        assert!(h.float(&mut p, 1, 2.0).is_empty());
        assert!(h.send(&mut p, 2, 0, &[Element::symbol("x")]).is_empty());
        let out = h.send(&mut p, 0, 9, &[Element::Float(1.0)]);
        assert_eq!(out.len(), 1);
        let m = out[0].1.as_message();
        assert_eq!(m.timestamp(), 9);
        assert!(m.has_format("ffs"));
        assert_eq!(m.float(1), Some(2.0));
        assert!(m.compare_symbol(2, "x"));
    }

    #[test]
    fn hot_inlet_list_merges_prefix() {
        let mut h = Harness::new();
        let mut p = Pack::new(&[1.0, 2.0, 3.0]);
        let out = h.send(
            &mut p,
            0,
            0,
            &[Element::Float(7.0), Element::Bang, Element::Float(9.0), Element::Float(4.0)],
        );
        assert_eq!(
            out[0].1.elements(),
            &[Element::Float(7.0), Element::Float(2.0), Element::Float(9.0)]
        );
    }

    #[test]
    fn bang_on_hot_inlet_outputs_current_values() {
        let mut h = Harness::new();
        let mut p = Pack::new(&[5.0, 6.0]);
        let out = h.send(&mut p, 0, 0, &[Element::Bang]);
        assert_eq!(out[0].1.elements(), &[Element::Float(5.0), Element::Float(6.0)]);
    }
}
