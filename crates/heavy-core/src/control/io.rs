//! Objects at the edges of the control graph.
//!
//! A [`Receive`] is the entry point for messages addressed to a receiver name,
//! whether they come from the host or from a [`Send`] inside the patch. The
//! patch builder connects each send to every receive with the same name hash,
//! so internal delivery is an ordinary synchronous outlet emission. A send
//! marked extern also publishes the message to the host through the send
//! hook and the output mailbox.

use crate::hash::string_to_hash;
use crate::message::Message;
use crate::object::{Object, ObjectContext, Outbox};

/// Hands every message to the print hook, tagged with a name.
#[derive(Debug, Clone)]
pub struct Print {
    name: String,
}

impl Print {
    /// Creates a print object labelled `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl Object for Print {
    fn class_name(&self) -> &'static str {
        "print"
    }

    fn outlets(&self) -> usize {
        0
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        cx.print(&self.name, msg);
    }
}

/// Named message sender.
#[derive(Debug, Clone)]
pub struct Send {
    name: String,
    hash: u32,
    external: bool,
}

impl Send {
    /// Creates a send to receivers named `name`. `external` sends are also
    /// visible to the host.
    pub fn new(name: &str, external: bool) -> Self {
        Self {
            name: name.to_owned(),
            hash: string_to_hash(name),
            external,
        }
    }

    /// Receiver name hash.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Receiver name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if messages also leave the patch.
    pub fn is_external(&self) -> bool {
        self.external
    }
}

impl Object for Send {
    fn class_name(&self) -> &'static str {
        "send"
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        if self.external {
            cx.send_extern(&self.name, self.hash, msg);
        }
        out.send(0, msg);
    }
}

/// Named message entry point.
#[derive(Debug, Clone)]
pub struct Receive {
    name: String,
    hash: u32,
}

impl Receive {
    /// Creates a receiver named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            hash: string_to_hash(name),
        }
    }

    /// Name hash.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Object for Receive {
    fn class_name(&self) -> &'static str {
        "receive"
    }

    fn on_message(
        &mut self,
        _cx: &mut ObjectContext<'_>,
        _inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        out.send(0, msg);
    }
}
