//! Errors for the non-real-time setup paths.
//!
//! Patch building and context construction return these. Nothing on the
//! audio thread does: faults there are either ignored (malformed input to an
//! object) or fatal panics (pool or stack exhaustion, table bounds in debug).

use thiserror::Error;

use crate::object::ObjectId;

/// Problems found while building a patch.
#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    /// An object id does not belong to this patch.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// A control connection names an outlet the object does not have.
    #[error("{class} {object} has no outlet {outlet}")]
    NoSuchOutlet {
        /// Source object.
        object: ObjectId,
        /// Its class name.
        class: &'static str,
        /// Requested outlet.
        outlet: usize,
    },

    /// A control connection names an inlet the object does not have.
    #[error("{class} {object} has no inlet {inlet}")]
    NoSuchInlet {
        /// Destination object.
        object: ObjectId,
        /// Its class name.
        class: &'static str,
        /// Requested inlet.
        inlet: usize,
    },

    /// A signal connection names a port the object does not have.
    #[error("{class} {object} has no signal {direction} {port}")]
    NoSuchSignalPort {
        /// Object at either end.
        object: ObjectId,
        /// Its class name.
        class: &'static str,
        /// `"inlet"` or `"outlet"`.
        direction: &'static str,
        /// Requested port.
        port: usize,
    },

    /// An adc or dac connection names a host channel the patch does not have.
    #[error("patch has no {direction} channel {channel}")]
    NoSuchChannel {
        /// `"input"` or `"output"`.
        direction: &'static str,
        /// Requested channel.
        channel: usize,
    },

    /// An object declares more signal ports than the engine supports.
    #[error("{class} {object} declares {ports} signal ports (max {max})")]
    TooManySignalPorts {
        /// Offending object.
        object: ObjectId,
        /// Its class name.
        class: &'static str,
        /// Declared count.
        ports: usize,
        /// Supported maximum.
        max: usize,
    },

    /// The signal graph has a cycle.
    #[error("signal graph contains a cycle through {0}")]
    SignalCycle(ObjectId),

    /// A table name was declared twice.
    #[error("table 0x{0:08X} declared twice")]
    DuplicateTable(u32),

    /// An object references a table that was never declared.
    #[error("{class} {object} references unknown table 0x{hash:08X}")]
    UnknownTable {
        /// Referencing object.
        object: ObjectId,
        /// Its class name.
        class: &'static str,
        /// Table name hash.
        hash: u32,
    },

    /// A parameter references a receiver that no receive object listens on.
    #[error("parameter '{0}' has no matching receiver")]
    UnboundParameter(String),

    /// A parameter's range is empty or its default lies outside it.
    #[error("parameter '{name}' has invalid range [{min}, {max}] with default {default}")]
    InvalidParameterRange {
        /// Parameter name.
        name: String,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
        /// Default value.
        default: f32,
    },
}

/// Problems constructing a [`Context`](crate::Context).
#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    /// The sample rate is not a positive finite number.
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f64),

    /// The maximum block size must hold at least one sub-block.
    #[error("max block size {0} is smaller than one vector")]
    InvalidBlockSize(usize),

    /// An object failed to initialise.
    #[error(transparent)]
    Patch(#[from] PatchError),
}
