//! Lowering a [`PatchFile`] into a runtime patch and context.
//!
//! Objects are added in declaration order, so a file's object order is the
//! patch's object order and control fan-out follows connection order. Ids are
//! resolved here; port ranges, tables and parameters are validated by
//! [`PatchBuilder::build`].

use std::collections::HashMap;

use heavy_core::{Context, ObjectId, Patch, PatchBuilder};

use crate::error::ConfigError;
use crate::object_config::Lowered;
use crate::patch_file::PatchFile;

/// A builder populated from a patch file, with the id → object mapping.
#[derive(Debug)]
pub struct LoweredPatch {
    /// Builder holding every object, table, parameter and connection.
    pub builder: PatchBuilder,
    /// Object ids by their patch file id.
    pub ids: HashMap<String, ObjectId>,
}

impl PatchFile {
    /// Lowers the file into a populated builder.
    pub fn to_builder(&self) -> Result<LoweredPatch, ConfigError> {
        let mut b = PatchBuilder::new(self.inputs, self.outputs);

        for table in &self.tables {
            match &table.samples {
                Some(samples) => b.add_table_samples(&table.name, samples),
                None => b.add_table(&table.name, table.size),
            }
        }
        for parameter in &self.parameters {
            b.add_parameter(parameter.descriptor());
        }

        let mut ids = HashMap::with_capacity(self.objects.len());
        for object in &self.objects {
            if ids.contains_key(&object.id) {
                return Err(ConfigError::DuplicateObject(object.id.clone()));
            }
            let id = match object.lower()? {
                Lowered::Object(o) => b.add_boxed(o),
                Lowered::Receive(name) => b.add_receive(&name),
                Lowered::Send { name, external } => b.add_send(&name, external),
            };
            ids.insert(object.id.clone(), id);
        }

        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ConfigError::UnknownObject(name.to_owned()))
        };
        for c in &self.connections {
            b.connect(lookup(&c.from)?, c.outlet, lookup(&c.to)?, c.inlet)?;
        }
        for c in &self.signal_connections {
            b.connect_signal(lookup(&c.from)?, c.outlet, lookup(&c.to)?, c.inlet)?;
        }
        for a in &self.adc {
            b.adc(a.channel, lookup(&a.to)?, a.inlet)?;
        }
        for d in &self.dac {
            b.dac(lookup(&d.from)?, d.outlet, d.channel)?;
        }

        tracing::debug!(
            "config_lower: {} objects, {} tables, {} parameters",
            ids.len(),
            self.tables.len(),
            self.parameters.len()
        );
        Ok(LoweredPatch { builder: b, ids })
    }

    /// Lowers and compiles the file into a [`Patch`].
    pub fn build_patch(&self) -> Result<Patch, ConfigError> {
        Ok(self.to_builder()?.builder.build()?)
    }

    /// Lowers, compiles and starts a [`Context`] using the `[context]`
    /// section.
    pub fn build_context(&self) -> Result<Context, ConfigError> {
        let patch = self.build_patch()?;
        let cx = Context::new(patch, self.context.sample_rate, self.context.options())?;
        tracing::info!(
            sample_rate = self.context.sample_rate,
            objects = cx.object_count(),
            "context ready"
        );
        Ok(cx)
    }
}
