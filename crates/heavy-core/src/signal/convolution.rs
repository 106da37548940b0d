//! FIR convolution against a table.
//!
//! `y[n] = sum_{k < taps} h[k] * x[n - k]` where `h` is the named table and
//! `taps` is the requested size, limited by both the table length and the
//! input history allocated at init. A symbol on inlet 1 switches tables, a
//! float on inlet 2 changes the size.

use crate::error::PatchError;
use crate::message::Message;
use crate::object::{InitContext, Object, ObjectContext, Outbox, TableRef};
use crate::simd::Buf;

/// Direct-form FIR with one signal inlet and one signal outlet.
#[derive(Debug, Clone)]
pub struct Convolution {
    table: TableRef,
    size: usize,
    history: Vec<f32>,
    pos: usize,
}

impl Convolution {
    /// Creates a convolution with the first `size` samples of table `name`.
    pub fn new(name: &str, size: usize) -> Self {
        Self {
            table: TableRef::new(name),
            size,
            history: Vec::new(),
            pos: 0,
        }
    }

    /// Requested kernel length.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Object for Convolution {
    fn class_name(&self) -> &'static str {
        "conv~"
    }

    fn inlets(&self) -> usize {
        3
    }

    fn outlets(&self) -> usize {
        0
    }

    fn signal_inlets(&self) -> usize {
        1
    }

    fn signal_outlets(&self) -> usize {
        1
    }

    fn init(&mut self, cx: &mut InitContext<'_>) -> Result<(), PatchError> {
        self.table.init(cx)?;
        let len = self.table.id.map_or(0, |id| cx.table(id).size());
        self.history = vec![0.0; self.size.max(len).max(1)];
        Ok(())
    }

    fn on_message(
        &mut self,
        cx: &mut ObjectContext<'_>,
        inlet: usize,
        msg: &Message<'_>,
        _out: &mut Outbox<'_>,
    ) {
        match inlet {
            1 => self.table.retarget(cx, msg),
            2 => {
                if let Some(size) = msg.float(0) {
                    self.size = size.max(0.0) as usize;
                }
            }
            _ => {}
        }
    }

    fn process(&mut self, cx: &mut ObjectContext<'_>, inputs: &[Buf], outputs: &mut [Buf]) {
        let kernel = match self.table.id {
            Some(id) => cx.table(id).samples(),
            None => &[][..],
        };
        let cap = self.history.len();
        let taps = self.size.min(kernel.len()).min(cap);
        let x = inputs[0];
        outputs[0] = Buf::from_fn(|j| {
            self.pos = (self.pos + 1) % cap;
            self.history[self.pos] = x.lane(j);
            let mut idx = self.pos;
            let mut acc = 0.0;
            for &h in &kernel[..taps] {
                acc += h * self.history[idx];
                idx = if idx == 0 { cap - 1 } else { idx - 1 };
            }
            acc
        });
    }
}
