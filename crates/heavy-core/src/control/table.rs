//! Control-rate table access.
//!
//! All three objects name a table at construction (resolved at init, an
//! unknown name is a patch error) and accept a symbol on their last inlet to
//! switch tables at run time. Switching to an unknown table detaches the
//! object until a known name arrives.

use crate::error::PatchError;
use crate::message::Message;
use crate::object::{InitContext, Object, ObjectContext, Outbox, TableRef};

/// Reads one sample per float index. Indices outside the table are ignored.
#[derive(Debug, Clone, Copy)]
pub struct Tabread {
    table: TableRef,
}

impl Tabread {
    /// Creates a reader on table `name`.
    pub fn new(name: &str) -> Self {
        Self {
            table: TableRef::new(name),
        }
    }
}

impl Object for Tabread {
    fn class_name(&self) -> &'static str {
        "tabread"
    }

    fn inlets(&self) -> usize {
        2
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 => {
                let (Some(index), Some(id)) = (msg.float(0), self.table.id) else {
                    return;
                };
                let table = cx.table(id);
                if index >= 0.0 && (index as usize) < table.size() {
                    out.send_float(0, msg.timestamp(), table.read(index as usize));
                }
            }
            1 => self.table.retarget(cx, msg),
            _ => {}
        }
    }
}

/// Writes floats into a table at a latched index.
///
/// Inlet 0 takes the value, inlet 1 the index. Writes outside the table are
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct Tabwrite {
    table: TableRef,
    index: usize,
}

impl Tabwrite {
    /// Creates a writer on table `name`.
    pub fn new(name: &str) -> Self {
        Self {
            table: TableRef::new(name),
            index: 0,
        }
    }
}

impl Object for Tabwrite {
    fn class_name(&self) -> &'static str {
        "tabwrite"
    }

    fn inlets(&self) -> usize {
        3
    }

    fn outlets(&self) -> usize {
        0
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 => {
                let (Some(value), Some(id)) = (msg.float(0), self.table.id) else {
                    return;
                };
                let table = cx.table_mut(id);
                if self.index < table.size() {
                    table.write(self.index, value);
                }
            }
            1 => {
                if let Some(index) = msg.float(0) {
                    self.index = index.max(0.0) as usize;
                }
            }
            2 => self.table.retarget(cx, msg),
            _ => {}
        }
    }
}

/// Reports a table's head position on bang.
#[derive(Debug, Clone, Copy)]
pub struct Tabhead {
    table: TableRef,
}

impl Tabhead {
    /// Creates a head reader on table `name`.
    pub fn new(name: &str) -> Self {
        Self {
            table: TableRef::new(name),
        }
    }
}

impl Object for Tabhead {
    fn class_name(&self) -> &'static str {
        "tabhead"
    }

    fn inlets(&self) -> usize {
        2
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        out: &mut Outbox<'_>,
    ) {
        match inlet {
            0 if msg.is_bang(0) => {
                if let Some(id) = self.table.id {
                    out.send_float(0, msg.timestamp(), cx.table(id).head() as f32);
                }
            }
            1 => self.table.retarget(cx, msg),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::string_to_hash;
    use crate::message::Element;
    use crate::object::test_support::{Harness, only_float};
    use crate::table::{Table, TableRegistry};

    fn harness() -> Harness {
        let mut tables = TableRegistry::new();
        tables.insert("a", Table::from_samples(&[1.0, 2.0, 3.0]));
        tables.insert("b", Table::from_samples(&[10.0, 20.0]));
        Harness::with_tables(tables)
    }

    #[test]
    fn unknown_table_fails_init() {
        let h = harness();
        let mut r = Tabread::new("missing");
        let mut cx = InitContext {
            object: crate::object::ObjectId(0),
            class: "tabread",
            sample_rate: 48_000.0,
            tables: &h.rt.tables,
        };
        assert!(matches!(
            r.init(&mut cx),
            Err(PatchError::UnknownTable { class: "tabread", .. })
        ));
    }

    #[test]
    fn tabread_reads_in_range_only() {
        let mut h = harness();
        let mut r = Tabread::new("a");
        h.init(&mut r);
        assert_eq!(only_float(&h.float(&mut r, 0, 1.7), 0), 2.0);
        assert!(h.float(&mut r, 0, 3.0).is_empty());
        assert!(h.float(&mut r, 0, -1.0).is_empty());
    }

    #[test]
    fn tabread_switches_tables() {
        let mut h = harness();
        let mut r = Tabread::new("a");
        h.init(&mut r);
        h.send(&mut r, 1, 0, &[Element::symbol("b")]);
        assert_eq!(only_float(&h.float(&mut r, 0, 1.0), 0), 20.0);
        h.send(&mut r, 1, 0, &[Element::symbol("nope")]);
        assert!(h.float(&mut r, 0, 0.0).is_empty());
    }

    #[test]
    fn tabwrite_writes_at_latched_index() {
        let mut h = harness();
        let mut w = Tabwrite::new("a");
        h.init(&mut w);
        h.float(&mut w, 1, 2.0);
        h.float(&mut w, 0, 9.0);
        h.float(&mut w, 1, 7.0);
        h.float(&mut w, 0, 5.0);
        let table = h.rt.tables.get(string_to_hash("a")).unwrap();
        assert_eq!(table.samples(), &[1.0, 2.0, 9.0]);
    }

    #[test]
    fn tabhead_reports_head() {
        let mut h = harness();
        let mut t = Tabhead::new("a");
        h.init(&mut t);
        h.rt.tables.get_mut(string_to_hash("a")).unwrap().set_head(2);
        assert_eq!(only_float(&h.send(&mut t, 0, 0, &[Element::Bang]), 0), 2.0);
    }
}
