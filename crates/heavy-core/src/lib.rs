//! Heavy Core - runtime for compiled audio dataflow patches
//!
//! This crate executes a static dataflow graph of control and signal objects
//! in real time: a timestamped message scheduler over a bounded pool, a
//! block-vectorized signal processor, shared tables, and lock-free mailboxes
//! between the audio thread and everything else.
//!
//! # Core Abstractions
//!
//! ## Messages and Scheduling
//!
//! - [`Message`] / [`OwnedMessage`] - Timestamped element sequences (bang, float, symbol, hash)
//! - [`MemoryPool`] - Bounded arena for scheduled payloads
//! - [`MessageQueue`] - Timestamp-ordered scheduler with generational [`MessageHandle`]s
//! - [`mailbox`] - SPSC byte rings crossing the real-time boundary
//!
//! ## Patches
//!
//! - [`Object`] - Trait implemented by every control and signal node
//! - [`PatchBuilder`] / [`Patch`] - Graph construction, validation and compilation
//! - [`Context`] - Owns a patch and drives `process()`
//!
//! ## Objects
//!
//! - [`control`] - Operators, delay, pack, slice, var, random, routing, tables, I/O
//! - [`signal`] - Vectorized DSP kernels (filters, ramps, envelope, table streaming)
//!
//! ## Utilities
//!
//! - [`hash::string_to_hash`] - The receiver/table name hash hosts address the patch with
//! - [`Vf`] / [`Buf`] - Fixed-width float vectors, width chosen at build time
//! - [`Table`] - Shared, resizable float buffers with a read/write head
//! - [`ParameterInfo`] - Host-facing parameter introspection
//!
//! # Example
//!
//! ```rust
//! use heavy_core::graph::PatchBuilder;
//! use heavy_core::signal::{PhasorK, SignalBinop, SignalBinopOp, SignalVar};
//! use heavy_core::{Context, ContextOptions};
//!
//! // phasor~ 440 * 0.5 -> both outputs
//! let mut b = PatchBuilder::new(0, 2);
//! let osc = b.add(PhasorK::new(440.0));
//! let gain = b.add(SignalVar::new(0.5));
//! let mul = b.add(SignalBinop::new(SignalBinopOp::Mul));
//! b.connect_signal(osc, 0, mul, 0).unwrap();
//! b.connect_signal(gain, 0, mul, 1).unwrap();
//! b.dac(mul, 0, 0).unwrap();
//! b.dac(mul, 0, 1).unwrap();
//!
//! let mut cx = Context::new(b.build().unwrap(), 48_000.0, ContextOptions::default()).unwrap();
//! let (mut l, mut r) = (vec![0.0; 256], vec![0.0; 256]);
//! cx.process(&[], &mut [&mut l, &mut r], 256);
//! assert!(l.iter().all(|&s| (0.0..0.5).contains(&s)));
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocation, locking or I/O inside `process()`
//! - **Deterministic**: Fixed topological order, FIFO ties in the scheduler
//! - **Fail fast at setup**: Patch and context errors are `Result`s; audio-thread
//!   faults are either ignored input or fatal misconfiguration

pub mod context;
pub mod control;
pub mod error;
pub mod graph;
pub mod hash;
pub mod mailbox;
pub mod message;
pub mod object;
pub mod param_info;
pub mod pool;
pub mod queue;
pub mod signal;
pub mod simd;
pub mod table;

// Re-export main types at crate root
pub use context::{Context, ContextOptions, ContextSender};
pub use error::{ContextError, PatchError};
pub use graph::{Patch, PatchBuilder, SignalStep};
pub use hash::{INIT_RECEIVER_HASH, string_to_hash};
pub use mailbox::{Delivery, MailboxReceiver, MailboxSender, Timing};
pub use message::{Element, Message, OwnedMessage, Symbol};
pub use object::{
    InitContext, MAX_SIGNAL_PORTS, Object, ObjectContext, ObjectId, Outbox, PrintHook, SendHook,
};
pub use param_info::{ParamDescriptor, ParamKind, ParamScale, ParameterInfo};
pub use pool::{MAX_BLOCK_ELEMENTS, MemoryPool, PoolBlock};
pub use queue::{Fired, MessageHandle, MessageQueue, Target};
pub use simd::{Buf, N_SIMD, Vf, align_down, align_up};
pub use table::{HeadPolicy, Table, TableId, TableRegistry};
