//! Message routing by condition or by first-element value.

use crate::message::{Element, Message};
use crate::object::{Object, ObjectContext, Outbox};

/// Two-way gate. Inlet-0 messages leave outlet 1 while the condition is
/// true and outlet 0 while it is false. A float on inlet 1 sets the
/// condition (non-zero is true).
#[derive(Debug, Clone, Copy)]
pub struct If {
    condition: bool,
}

impl If {
    /// Creates a gate with an initial condition.
    pub fn new(condition: bool) -> Self {
        Self { condition }
    }
}

impl Object for If {
    fn class_name(&self) -> &'static str {
        "if"
    }

    fn inlets(&self) -> usize {
        2
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
            0 => out.send(usize::from(self.condition), msg),
            1 => {
                if let Some(f) = msg.float(0) {
                    self.condition = f != 0.0;
                }
            }
            _ => {}
        }
    }
}

/// Routes a message by the hash of its first element.
///
/// Case `i` matches when the first element hashes to `cases[i]`; the whole
/// message leaves outlet `i`. Anything unmatched leaves the last outlet.
/// Floats match by bit pattern, so `1.0` and a case built from
/// `Element::Float(1.0)` agree.
#[derive(Debug, Clone)]
pub struct Switchcase {
    cases: Vec<u32>,
}

impl Switchcase {
    /// Creates a router over case hashes.
    pub fn new(cases: Vec<u32>) -> Self {
        Self { cases }
    }

    /// Creates a router from case elements.
    pub fn from_elements(cases: &[Element]) -> Self {
        Self::new(cases.iter().map(Element::hash).collect())
    }
}

impl Object for Switchcase {
    fn class_name(&self) -> &'static str {
        "switchcase"
    }

    fn outlets(&self) -> usize {
        self.cases.len() + 1
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        let hash = msg.hash(0);
        let outlet = self
            .cases
            .iter()
            .position(|c| *c == hash)
            .unwrap_or(self.cases.len());
        out.send(outlet, msg);
    }
}
