//! Parameter introspection for host adapters.
//!
//! A patch exposes named parameters and events to its host. Each one is
//! described by a [`ParamDescriptor`] carrying the receiver name, its hash
//! (the wire identity hosts use to address it), direction and range. Hosts
//! enumerate them through [`ParameterInfo`], implemented by
//! [`Context`](crate::Context), to build plugin parameter lists and generic
//! UIs.
//!
//! | Kind | Direction | `set_param` | `get_param` |
//! |------|-----------|-------------|-------------|
//! | [`ParamKind::ParameterIn`] | host → patch | clamps, sends a float | last value set |
//! | [`ParamKind::EventIn`] | host → patch | sends a bang | 0 |
//! | [`ParamKind::ParameterOut`] | patch → host | ignored | last float sent |
//! | [`ParamKind::EventOut`] | patch → host | ignored | 0 |
//!
//! # Example
//!
//! ```rust
//! use heavy_core::{ParamDescriptor, ParamKind, ParamScale};
//!
//! let cutoff = ParamDescriptor::new("cutoff", ParamKind::ParameterIn, 20.0, 20_000.0, 1_000.0)
//!     .with_scale(ParamScale::Logarithmic);
//! assert_eq!(cutoff.clamp(50_000.0), 20_000.0);
//! assert!((cutoff.denormalize(cutoff.normalize(440.0)) - 440.0).abs() < 0.01);
//! ```

use crate::hash::string_to_hash;

/// Direction and type of an exposed receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Continuous input, delivered as a float to the receiver.
    ParameterIn,
    /// Continuous output, published by an extern send.
    ParameterOut,
    /// Trigger input, delivered as a bang.
    EventIn,
    /// Trigger output, published by an extern send.
    EventOut,
}

impl ParamKind {
    /// True for kinds the host writes.
    pub fn is_input(self) -> bool {
        matches!(self, ParamKind::ParameterIn | ParamKind::EventIn)
    }
}

/// Mapping between a parameter's plain value and `[0, 1]`.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// More resolution at low values. Requires `min > 0`.
    Logarithmic,
    /// Power curve; exponents below 1 favour the low end.
    Power(f32),
}

/// Metadata for one exposed parameter or event.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Receiver (or send) name.
    pub name: String,
    /// `string_to_hash(name)`.
    pub hash: u32,
    /// Direction and type.
    pub kind: ParamKind,
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Value applied when the context starts.
    pub default: f32,
    /// Normalisation curve.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Describes a parameter named `name`.
    pub fn new(name: &str, kind: ParamKind, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.to_owned(),
            hash: string_to_hash(name),
            kind,
            min,
            max,
            default,
            scale: ParamScale::Linear,
        }
    }

    /// Describes an event (range `[0, 1]`, default 0).
    pub fn event(name: &str, kind: ParamKind) -> Self {
        Self::new(name, kind, 0.0, 1.0, 0.0)
    }

    /// Sets the normalisation curve.
    pub fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// True if `min <= default <= max` and the bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && (self.min..=self.max).contains(&self.default)
    }

    /// Clamps `value` into `[min, max]`.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Maps a plain value to `[0, 1]`. An empty range maps to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => libm::powf((value - self.min) / range, 1.0 / exp),
        }
    }

    /// Maps `[0, 1]` back to a plain value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => self.min + libm::powf(normalized, exp) * (self.max - self.min),
        }
    }
}

/// Index-based access to exposed parameters.
///
/// Indices are stable for the lifetime of the implementor: `0..param_count()`.
pub trait ParameterInfo {
    /// Number of parameters and events.
    fn param_count(&self) -> usize;

    /// Descriptor at `index`, or `None` past the end.
    fn param_info(&self, index: usize) -> Option<&ParamDescriptor>;

    /// Current value at `index`; 0 for events and out-of-range indices.
    fn get_param(&self, index: usize) -> f32;

    /// Sets the value at `index`, clamped to its range. Output parameters and
    /// out-of-range indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Index of the parameter named `name` (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i)
                .is_some_and(|d| d.name.eq_ignore_ascii_case(name))
        })
    }

    /// Index of the parameter whose receiver hash is `hash`.
    fn param_index_by_hash(&self, hash: u32) -> Option<usize> {
        (0..self.param_count()).find(|&i| self.param_info(i).is_some_and(|d| d.hash == hash))
    }
}
