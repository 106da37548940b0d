//! Stores one float or symbol.
//!
//! A bang on inlet 0 outputs the stored value. A float or symbol on inlet 0
//! replaces it and passes straight through; on inlet 1 it only replaces it.

use crate::message::{Element, Message};
use crate::object::{Object, ObjectContext, Outbox};

/// Single-value store.
#[derive(Debug, Clone, Copy)]
pub struct Var {
    value: Element,
}

impl Var {
    /// Creates a var holding a float.
    pub fn float(value: f32) -> Self {
        Self {
            value: Element::Float(value),
        }
    }

    /// Creates a var holding a symbol.
    pub fn symbol(name: &str) -> Self {
        Self {
            value: Element::symbol(name),
        }
    }

    /// The stored value.
    pub fn value(&self) -> Element {
        self.value
    }
}

impl Object for Var {
    fn class_name(&self) -> &'static str {
        "var"
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
        let Some(first) = msg.element(0).copied() else {
            return;
        };
        match (inlet, first) {
            (0, Element::Bang) => out.send_element(0, msg.timestamp(), self.value),
            (0, e) => {
                self.value = e;
                out.send(0, msg);
            }
            (1, Element::Bang) => {}
            (1, e) => self.value = e,
            _ => {}
        }
    }
}
