//! Patch file format and operations.

use heavy_core::{ContextOptions, ParamDescriptor, ParamKind, ParamScale};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::object_config::ObjectConfig;

/// A complete patch: host channels, context sizing, tables, parameters,
/// objects and their wiring.
///
/// # TOML Format
///
/// ```toml
/// name = "filtered saw"
/// inputs = 0
/// outputs = 2
///
/// [context]
/// sample_rate = 48000.0
/// pool_kb = 10
///
/// [[parameters]]
/// name = "gain"
/// kind = "parameter_in"
/// min = 0.0
/// max = 1.0
/// default = 0.5
///
/// [[objects]]
/// id = "osc"
/// kind = "phasor_k~"
/// frequency = 220.0
///
/// [[objects]]
/// id = "gain_in"
/// kind = "receive"
/// name = "gain"
///
/// [[objects]]
/// id = "gain"
/// kind = "var~"
///
/// [[objects]]
/// id = "mul"
/// kind = "*~"
///
/// [[connections]]
/// from = "gain_in"
/// to = "gain"
///
/// [[signal_connections]]
/// from = "osc"
/// to = "mul"
///
/// [[signal_connections]]
/// from = "gain"
/// to = "mul"
/// inlet = 1
///
/// [[dac]]
/// from = "mul"
/// channel = 0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchFile {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host input channels.
    #[serde(default)]
    pub inputs: usize,

    /// Host output channels (defaults to 2).
    #[serde(default = "default_outputs")]
    pub outputs: usize,

    /// Context sizing.
    #[serde(default)]
    pub context: ContextConfig,

    /// Named tables.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableConfig>,

    /// Host-facing parameters and events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterConfig>,

    /// Objects, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectConfig>,

    /// Control connections. Fan-out follows declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,

    /// Signal connections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signal_connections: Vec<Connection>,

    /// Host input channels feeding signal inlets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adc: Vec<AdcConfig>,

    /// Signal outlets feeding host output channels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dac: Vec<DacConfig>,
}

fn default_outputs() -> usize {
    2
}

impl Default for PatchFile {
    fn default() -> Self {
        Self {
            name: None,
            inputs: 0,
            outputs: default_outputs(),
            context: ContextConfig::default(),
            tables: Vec::new(),
            parameters: Vec::new(),
            objects: Vec::new(),
            connections: Vec::new(),
            signal_connections: Vec::new(),
            adc: Vec::new(),
            dac: Vec::new(),
        }
    }
}

impl PatchFile {
    /// Create an empty patch with the given channel counts.
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self {
            inputs,
            outputs,
            ..Self::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add an object.
    pub fn with_object(mut self, object: ObjectConfig) -> Self {
        self.objects.push(object);
        self
    }

    /// Add a control connection.
    pub fn with_connection(mut self, from: &str, outlet: usize, to: &str, inlet: usize) -> Self {
        self.connections.push(Connection::new(from, outlet, to, inlet));
        self
    }

    /// Add a signal connection.
    pub fn with_signal_connection(
        mut self,
        from: &str,
        outlet: usize,
        to: &str,
        inlet: usize,
    ) -> Self {
        self.signal_connections
            .push(Connection::new(from, outlet, to, inlet));
        self
    }

    /// Route host input `channel` to a signal inlet.
    pub fn with_adc(mut self, channel: usize, to: &str, inlet: usize) -> Self {
        self.adc.push(AdcConfig {
            channel,
            to: to.to_owned(),
            inlet,
        });
        self
    }

    /// Route a signal outlet to host output `channel`.
    pub fn with_dac(mut self, from: &str, outlet: usize, channel: usize) -> Self {
        self.dac.push(DacConfig {
            from: from.to_owned(),
            outlet,
            channel,
        });
        self
    }

    /// Add a table.
    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.tables.push(table);
        self
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, parameter: ParameterConfig) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch = Self::from_toml(&content)?;
        tracing::debug!(
            "config_load: {} objects, {} connections from {}",
            patch.objects.len(),
            patch.connections.len() + patch.signal_connections.len(),
            path.display()
        );
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!("config_save: {}", path.display());
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Find an object entry by id.
    pub fn object(&self, id: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// `[context]` section: sample rate and [`ContextOptions`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Message pool budget in kilobytes.
    pub pool_kb: usize,
    /// Input mailbox size in kilobytes.
    pub input_queue_kb: usize,
    /// Output mailbox size in kilobytes.
    pub output_queue_kb: usize,
    /// Largest interleaved block handled in one pass.
    pub max_block_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        let o = ContextOptions::default();
        Self {
            sample_rate: 48_000.0,
            pool_kb: o.pool_kb,
            input_queue_kb: o.input_queue_kb,
            output_queue_kb: o.output_queue_kb,
            max_block_size: o.max_block_size,
        }
    }
}

impl ContextConfig {
    /// The runtime sizing options.
    pub fn options(&self) -> ContextOptions {
        ContextOptions::default()
            .with_pool_kb(self.pool_kb)
            .with_input_queue_kb(self.input_queue_kb)
            .with_output_queue_kb(self.output_queue_kb)
            .with_max_block_size(self.max_block_size)
    }
}

/// `[[tables]]` entry. `samples`, when present, sets both contents and size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableConfig {
    /// Table name.
    pub name: String,
    /// Length in samples.
    #[serde(default)]
    pub size: usize,
    /// Initial contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<f32>>,
}

impl TableConfig {
    /// A zeroed table of `size` samples.
    pub fn new(name: &str, size: usize) -> Self {
        Self {
            name: name.to_owned(),
            size,
            samples: None,
        }
    }

    /// A table holding `samples`.
    pub fn with_samples(name: &str, samples: Vec<f32>) -> Self {
        Self {
            name: name.to_owned(),
            size: samples.len(),
            samples: Some(samples),
        }
    }
}

/// Parameter direction as written in patch files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamKindConfig {
    /// See [`ParamKind::ParameterIn`].
    ParameterIn,
    /// See [`ParamKind::ParameterOut`].
    ParameterOut,
    /// See [`ParamKind::EventIn`].
    EventIn,
    /// See [`ParamKind::EventOut`].
    EventOut,
}

impl From<ParamKindConfig> for ParamKind {
    fn from(kind: ParamKindConfig) -> Self {
        match kind {
            ParamKindConfig::ParameterIn => ParamKind::ParameterIn,
            ParamKindConfig::ParameterOut => ParamKind::ParameterOut,
            ParamKindConfig::EventIn => ParamKind::EventIn,
            ParamKindConfig::EventOut => ParamKind::EventOut,
        }
    }
}

/// Normalisation curve as written in patch files: `"linear"`,
/// `"logarithmic"` or `{ power = 2.0 }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleConfig {
    /// See [`ParamScale::Linear`].
    #[default]
    Linear,
    /// See [`ParamScale::Logarithmic`].
    Logarithmic,
    /// See [`ParamScale::Power`].
    Power(f32),
}

impl From<ScaleConfig> for ParamScale {
    fn from(scale: ScaleConfig) -> Self {
        match scale {
            ScaleConfig::Linear => ParamScale::Linear,
            ScaleConfig::Logarithmic => ParamScale::Logarithmic,
            ScaleConfig::Power(exp) => ParamScale::Power(exp),
        }
    }
}

/// `[[parameters]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterConfig {
    /// Receiver name (inputs) or extern send name (outputs).
    pub name: String,
    /// Direction and type.
    pub kind: ParamKindConfig,
    /// Lower bound.
    #[serde(default)]
    pub min: f32,
    /// Upper bound.
    #[serde(default = "default_max")]
    pub max: f32,
    /// Initial value.
    #[serde(default)]
    pub default: f32,
    /// Normalisation curve.
    #[serde(default)]
    pub scale: ScaleConfig,
}

fn default_max() -> f32 {
    1.0
}

impl ParameterConfig {
    /// A parameter with range `[min, max]`.
    pub fn new(name: &str, kind: ParamKindConfig, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            min,
            max,
            default,
            scale: ScaleConfig::Linear,
        }
    }

    /// The runtime descriptor.
    pub fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor::new(&self.name, self.kind.into(), self.min, self.max, self.default)
            .with_scale(self.scale.into())
    }
}

/// `[[connections]]` / `[[signal_connections]]` entry. Ports default to 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    /// Source object id.
    pub from: String,
    /// Source outlet.
    #[serde(default)]
    pub outlet: usize,
    /// Destination object id.
    pub to: String,
    /// Destination inlet.
    #[serde(default)]
    pub inlet: usize,
}

impl Connection {
    /// Connect `from:outlet` to `to:inlet`.
    pub fn new(from: &str, outlet: usize, to: &str, inlet: usize) -> Self {
        Self {
            from: from.to_owned(),
            outlet,
            to: to.to_owned(),
            inlet,
        }
    }
}

/// `[[adc]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdcConfig {
    /// Host input channel.
    pub channel: usize,
    /// Destination object id.
    pub to: String,
    /// Destination signal inlet.
    #[serde(default)]
    pub inlet: usize,
}

/// `[[dac]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DacConfig {
    /// Source object id.
    pub from: String,
    /// Source signal outlet.
    #[serde(default)]
    pub outlet: usize,
    /// Host output channel.
    pub channel: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let patch = PatchFile::from_toml("").unwrap();
        assert_eq!(patch, PatchFile::default());
        assert_eq!(patch.outputs, 2);
        assert_eq!(patch.context.options(), ContextOptions::default());
    }

    #[test]
    fn parses_context_and_parameters() {
        let patch = PatchFile::from_toml(
            r#"
            inputs = 1
            outputs = 1

            [context]
            sample_rate = 44100.0
            pool_kb = 32

            [[parameters]]
            name = "cutoff"
            kind = "parameter_in"
            min = 20.0
            max = 20000.0
            default = 1000.0
            scale = "logarithmic"

            [[parameters]]
            name = "shape"
            kind = "parameter_in"
            scale = { power = 2.0 }

            [[parameters]]
            name = "hit"
            kind = "event_in"
            "#,
        )
        .unwrap();

        assert_eq!(patch.context.sample_rate, 44_100.0);
        assert_eq!(patch.context.options().pool_kb, 32);
        assert_eq!(patch.context.options().input_queue_kb, 2);

        let cutoff = patch.parameters[0].descriptor();
        assert_eq!(cutoff.kind, ParamKind::ParameterIn);
        assert_eq!(cutoff.scale, ParamScale::Logarithmic);
        assert_eq!(patch.parameters[1].scale, ScaleConfig::Power(2.0));
        assert_eq!(patch.parameters[2].max, 1.0);
        assert_eq!(patch.parameters[2].descriptor().kind, ParamKind::EventIn);
    }

    #[test]
    fn connections_default_to_port_zero() {
        let patch = PatchFile::from_toml(
            r#"
            [[connections]]
            from = "a"
            to = "b"

            [[dac]]
            from = "b"
            channel = 1
            "#,
        )
        .unwrap();
        assert_eq!(patch.connections[0], Connection::new("a", 0, "b", 0));
        assert_eq!(patch.dac[0].outlet, 0);
        assert_eq!(patch.dac[0].channel, 1);
    }

    #[test]
    fn unknown_parameter_kind_is_a_parse_error() {
        let err = PatchFile::from_toml(
            r#"
            [[parameters]]
            name = "x"
            kind = "sideways"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let patch = PatchFile::new(1, 2)
            .with_name("thru")
            .with_table(TableConfig::with_samples("ir", vec![1.0, 0.5]))
            .with_parameter(ParameterConfig::new(
                "gain",
                ParamKindConfig::ParameterIn,
                0.0,
                2.0,
                1.0,
            ))
            .with_object(ObjectConfig::new("d", "del1~"))
            .with_adc(0, "d", 0)
            .with_dac("d", 0, 0)
            .with_dac("d", 0, 1);
        let text = patch.to_toml().unwrap();
        assert_eq!(PatchFile::from_toml(&text).unwrap(), patch);
    }
}
