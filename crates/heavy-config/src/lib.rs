//! Declarative patch configuration for the heavy runtime.
//!
//! Patches can be written as TOML files instead of builder code. A file
//! describes host channels, context sizing, tables, host parameters, objects
//! and their wiring; this crate parses it with serde and lowers it into a
//! [`heavy_core::Patch`] and a ready-to-run [`heavy_core::Context`].
//!
//! # Features
//!
//! - **Patch files**: Load and save [`PatchFile`]s as TOML
//! - **Object factory**: Every control and signal object addressable by kind
//! - **Lowering**: Id resolution and patch validation with typed errors
//!
//! # Example
//!
//! ```rust
//! use heavy_config::PatchFile;
//!
//! let file = PatchFile::from_toml(r#"
//!     outputs = 1
//!
//!     [[objects]]
//!     id = "level"
//!     kind = "var~"
//!     value = 0.25
//!
//!     [[dac]]
//!     from = "level"
//!     channel = 0
//! "#).unwrap();
//!
//! let mut cx = file.build_context().unwrap();
//! let mut out = vec![0.0; 64];
//! cx.process(&[], &mut [&mut out], 64);
//! assert!(out.iter().all(|&s| s == 0.25));
//! ```

mod error;
mod lower;
mod object_config;
mod patch_file;

pub use error::ConfigError;
pub use lower::LoweredPatch;
pub use object_config::ObjectConfig;
pub use patch_file::{
    AdcConfig, Connection, ContextConfig, DacConfig, ParamKindConfig, ParameterConfig, PatchFile,
    ScaleConfig, TableConfig,
};
