//! Type conversion and constant message boxes.

use crate::message::{Element, Message};
use crate::object::{Object, ObjectContext, Outbox};

/// Target type of a [`Cast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    /// Anything becomes a bang.
    Bang,
    /// Floats pass, everything else is dropped.
    Float,
    /// Symbols and hashes pass; bangs and floats become the symbols `bang`
    /// and `float`.
    Symbol,
}

/// Converts the first element of each message to a single typed element.
#[derive(Debug, Clone, Copy)]
pub struct Cast {
    kind: CastKind,
}

impl Cast {
    /// Creates a cast to `kind`.
    pub fn new(kind: CastKind) -> Self {
        Self { kind }
    }
}

impl Object for Cast {
    fn class_name(&self) -> &'static str {
        "cast"
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        let ts = msg.timestamp();
        match self.kind {
            CastKind::Bang => out.send_bang(0, ts),
            CastKind::Float => {
                if let Some(f) = msg.float(0) {
                    out.send_float(0, ts, f);
                }
            }
            CastKind::Symbol => match msg.element(0) {
                Some(Element::Bang) => out.send_element(0, ts, Element::symbol("bang")),
                Some(Element::Float(_)) => out.send_element(0, ts, Element::symbol("float")),
                Some(e @ (Element::Symbol(_) | Element::Hash(_))) => out.send_element(0, ts, *e),
                None => {}
            },
        }
    }
}

/// One slot of a message box template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// A constant element.
    Literal(Element),
    /// `$n`: element `n - 1` of the triggering message.
    Arg(usize),
}

impl Slot {
    /// Parses one whitespace-free token: `$n`, a number, `bang`, or a symbol.
    pub fn parse(token: &str) -> Self {
        if let Some(n) = token.strip_prefix('$').and_then(|n| n.parse::<usize>().ok()) {
            if n > 0 {
                return Slot::Arg(n);
            }
        }
        if token == "bang" {
            return Slot::Literal(Element::Bang);
        }
        match token.parse::<f32>() {
            Ok(f) => Slot::Literal(Element::Float(f)),
            Err(_) => Slot::Literal(Element::symbol(token)),
        }
    }
}

/// Emits one or more constant messages whenever it receives anything.
///
/// `$n` slots are filled from the triggering message; out-of-range arguments
/// become `0`. Messages are emitted in template order.
#[derive(Debug, Clone)]
pub struct MessageBox {
    templates: Vec<Vec<Slot>>,
    scratch: Vec<Element>,
}

impl MessageBox {
    /// Creates a message box from pre-split templates.
    pub fn new(templates: Vec<Vec<Slot>>) -> Self {
        let longest = templates.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            templates,
            scratch: vec![Element::Bang; longest],
        }
    }

    /// Parses message box text. Commas separate messages, whitespace
    /// separates elements: `"1 2, $1 hz"`.
    pub fn parse(text: &str) -> Self {
        let templates = text
            .split(',')
            .map(|m| m.split_whitespace().map(Slot::parse).collect::<Vec<_>>())
            .filter(|m| !m.is_empty())
            .collect();
        Self::new(templates)
    }

    /// Number of messages emitted per trigger.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if the box emits nothing.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Object for MessageBox {
    fn class_name(&self) -> &'static str {
        "message"
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        for template in &self.templates {
            let dst = &mut self.scratch[..template.len()];
            for (slot, e) in template.iter().zip(dst.iter_mut()) {
                *e = match *slot {
                    Slot::Literal(e) => e,
                    Slot::Arg(n) => msg.element(n - 1).copied().unwrap_or(Element::Float(0.0)),
                };
            }
            out.send(0, &Message::new(msg.timestamp(), dst));
        }
    }
}
