//! Object entries and the kind → object factory.
//!
//! Each `[[objects]]` entry has an `id` (referenced by connections), a `kind`
//! and kind-specific arguments written inline:
//!
//! ```toml
//! [[objects]]
//! id = "lp"
//! kind = "biquad_k~"
//! coefficients = [0.067, 0.135, 0.067, -1.143, 0.413]
//! ```
//!
//! Operator spellings are kinds in their own right (`"+"`, `"sin"`, `"*~"`,
//! `"abs~"`); a control binop takes its right operand from `k`.
//!
//! | Kind | Arguments |
//! |------|-----------|
//! | `binop`, `+`, `-`, `*`, … | `op` (for `binop`), `k = 0` |
//! | `unop`, `sin`, `abs`, … | `op` (for `unop`) |
//! | `delay` | `ms = 0` |
//! | `pack` | `values` |
//! | `slice` | `start`, `count = -1` |
//! | `var` | `value = 0` (number or string) |
//! | `random` | `seed = 0` |
//! | `if` | `condition = false` |
//! | `switchcase` | `cases` (numbers or strings) |
//! | `cast` | `to` (`bang`, `float`, `symbol`) |
//! | `message` | `text` |
//! | `tabread`, `tabwrite`, `tabhead` | `table` |
//! | `system` | |
//! | `print` | `name` |
//! | `send` | `name`, `external = false` |
//! | `receive` | `name` |
//! | `+~`, `*~`, … `abs~`, … `fma~` | |
//! | `var~` | `value = 0`, `step` |
//! | `phasor~`, `biquad~`, `rpole~`, `cpole~`, `del1~`, `samphold~`, `sample~` | |
//! | `phasor_k~` | `frequency` |
//! | `biquad_k~` | `coefficients` (5 numbers) |
//! | `rpole_k~` | `a` |
//! | `line~` | `value = 0` |
//! | `envelope~` | `window = 1024`, `period = 512` |
//! | `convolution~` | `table`, `size` |
//! | `tabread~`, `tabwrite~` | `table`, `mode` (`random`, `linear`, `stoppable`) |
//! | `tabhead~` | `table` |

use heavy_core::control::{
    Binop, BinopOp, Cast, CastKind, Delay, If, MessageBox, Pack, Print, Random, Slice,
    Switchcase, System, Tabhead, Tabread, Tabwrite, Unop, UnopOp, Var,
};
use heavy_core::signal::{
    AccessMode, Biquad, BiquadK, CPole, Convolution, Del1, Envelope, Fma, Line, Phasor, PhasorK,
    RPole, RPoleK, Sample, Samphold, SignalBinop, SignalBinopOp, SignalTabhead, SignalTabread,
    SignalTabwrite, SignalUnop, SignalUnopOp, SignalVar,
};
use heavy_core::{Element, Object};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One `[[objects]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectConfig {
    /// Identifier used by connections.
    pub id: String,
    /// Object kind, e.g. `"delay"` or `"*~"`.
    pub kind: String,
    /// Kind-specific arguments.
    #[serde(flatten)]
    pub args: toml::Table,
}

/// What an entry lowers to. Sends and receives are registered through the
/// patch builder so it can wire them by name.
pub(crate) enum Lowered {
    Object(Box<dyn Object>),
    Receive(String),
    Send { name: String, external: bool },
}

impl ObjectConfig {
    /// Create an entry with no arguments.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            args: toml::Table::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    fn missing(&self, arg: &str) -> ConfigError {
        ConfigError::bad_argument(&self.id, arg, "missing")
    }

    fn number(&self, arg: &str) -> Result<Option<f64>, ConfigError> {
        match self.args.get(arg) {
            None => Ok(None),
            Some(v) => value_as_f64(v)
                .map(Some)
                .ok_or_else(|| ConfigError::bad_argument(&self.id, arg, "expected a number")),
        }
    }

    fn float_or(&self, arg: &str, default: f32) -> Result<f32, ConfigError> {
        Ok(self.number(arg)?.map_or(default, |v| v as f32))
    }

    fn float(&self, arg: &str) -> Result<f32, ConfigError> {
        self.number(arg)?
            .map(|v| v as f32)
            .ok_or_else(|| self.missing(arg))
    }

    fn integer_or(&self, arg: &str, default: i64) -> Result<i64, ConfigError> {
        match self.args.get(arg) {
            None => Ok(default),
            Some(v) => v
                .as_integer()
                .ok_or_else(|| ConfigError::bad_argument(&self.id, arg, "expected an integer")),
        }
    }

    fn count_or(&self, arg: &str, default: usize) -> Result<usize, ConfigError> {
        let n = self.integer_or(arg, default as i64)?;
        usize::try_from(n)
            .map_err(|_| ConfigError::bad_argument(&self.id, arg, "must not be negative"))
    }

    fn boolean_or(&self, arg: &str, default: bool) -> Result<bool, ConfigError> {
        match self.args.get(arg) {
            None => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| ConfigError::bad_argument(&self.id, arg, "expected a boolean")),
        }
    }

    fn string(&self, arg: &str) -> Result<&str, ConfigError> {
        match self.args.get(arg) {
            None => Err(self.missing(arg)),
            Some(v) => v
                .as_str()
                .ok_or_else(|| ConfigError::bad_argument(&self.id, arg, "expected a string")),
        }
    }

    fn elements(&self, arg: &str) -> Result<Vec<Element>, ConfigError> {
        let array = match self.args.get(arg) {
            None => return Err(self.missing(arg)),
            Some(v) => v
                .as_array()
                .ok_or_else(|| ConfigError::bad_argument(&self.id, arg, "expected an array"))?,
        };
        array
            .iter()
            .map(|v| {
                value_as_element(v).ok_or_else(|| {
                    ConfigError::bad_argument(&self.id, arg, "expected numbers or strings")
                })
            })
            .collect()
    }

    fn floats(&self, arg: &str) -> Result<Vec<f32>, ConfigError> {
        self.elements(arg)?
            .into_iter()
            .map(|e| match e {
                Element::Float(f) => Ok(f),
                _ => Err(ConfigError::bad_argument(&self.id, arg, "expected numbers")),
            })
            .collect()
    }

    fn access_mode(&self) -> Result<AccessMode, ConfigError> {
        match self.string("mode")? {
            "random" => Ok(AccessMode::Random),
            "linear" => Ok(AccessMode::Linear),
            "stoppable" => Ok(AccessMode::Stoppable),
            other => Err(ConfigError::bad_argument(
                &self.id,
                "mode",
                format!("unknown access mode '{other}'"),
            )),
        }
    }

    fn binop(&self, op: BinopOp) -> Result<Lowered, ConfigError> {
        Ok(Lowered::Object(Box::new(Binop::new(op, self.float_or("k", 0.0)?))))
    }

    /// Builds the object this entry describes.
    pub(crate) fn lower(&self) -> Result<Lowered, ConfigError> {
        let kind = self.kind.as_str();

        if let Some(op) = BinopOp::from_name(kind) {
            return self.binop(op);
        }
        if let Some(op) = UnopOp::from_name(kind) {
            return Ok(boxed(Unop::new(op)));
        }
        if let Some(op) = SignalBinopOp::from_name(kind) {
            return Ok(boxed(SignalBinop::new(op)));
        }
        if let Some(op) = SignalUnopOp::from_name(kind) {
            return Ok(boxed(SignalUnop::new(op)));
        }

        let object = match kind {
            // --- control ---
            "binop" => {
                let name = self.string("op")?;
                let op = BinopOp::from_name(name).ok_or_else(|| {
                    ConfigError::bad_argument(&self.id, "op", format!("unknown operator '{name}'"))
                })?;
                return self.binop(op);
            }
            "unop" => {
                let name = self.string("op")?;
                let op = UnopOp::from_name(name).ok_or_else(|| {
                    ConfigError::bad_argument(&self.id, "op", format!("unknown function '{name}'"))
                })?;
                boxed(Unop::new(op))
            }
            "delay" => boxed(Delay::new(self.float_or("ms", 0.0)?)),
            "pack" => boxed(Pack::new(&self.floats("values")?)),
            "slice" => {
                let start = self.integer_or("start", 0)?;
                let count = self.integer_or("count", -1)?;
                boxed(Slice::new(start as i32, count as i32))
            }
            "var" => match self.args.get("value") {
                Some(toml::Value::String(s)) => boxed(Var::symbol(s)),
                _ => boxed(Var::float(self.float_or("value", 0.0)?)),
            },
            "random" => {
                let seed = u32::try_from(self.integer_or("seed", 0)?).map_err(|_| {
                    ConfigError::bad_argument(&self.id, "seed", "must fit in 32 bits")
                })?;
                boxed(Random::new(seed))
            }
            "if" => boxed(If::new(self.boolean_or("condition", false)?)),
            "switchcase" => boxed(Switchcase::from_elements(&self.elements("cases")?)),
            "cast" => {
                let to = match self.string("to")? {
                    "bang" => CastKind::Bang,
                    "float" => CastKind::Float,
                    "symbol" => CastKind::Symbol,
                    other => {
                        return Err(ConfigError::bad_argument(
                            &self.id,
                            "to",
                            format!("cannot cast to '{other}'"),
                        ));
                    }
                };
                boxed(Cast::new(to))
            }
            "message" => boxed(MessageBox::parse(self.string("text")?)),
            "tabread" => boxed(Tabread::new(self.string("table")?)),
            "tabwrite" => boxed(Tabwrite::new(self.string("table")?)),
            "tabhead" => boxed(Tabhead::new(self.string("table")?)),
            "system" => boxed(System::new()),
            "print" => boxed(Print::new(self.string("name")?)),
            "send" => {
                return Ok(Lowered::Send {
                    name: self.string("name")?.to_owned(),
                    external: self.boolean_or("external", false)?,
                });
            }
            "receive" => return Ok(Lowered::Receive(self.string("name")?.to_owned())),

            // --- signal ---
            "fma~" => boxed(Fma::new()),
            "var~" => {
                let value = self.float_or("value", 0.0)?;
                match self.number("step")? {
                    Some(step) => boxed(SignalVar::with_step(value, step as f32)),
                    None => boxed(SignalVar::new(value)),
                }
            }
            "phasor~" => boxed(Phasor::new()),
            "phasor_k~" => boxed(PhasorK::new(self.float("frequency")?)),
            "biquad~" => boxed(Biquad::new()),
            "biquad_k~" => {
                let c: [f32; 5] = self.floats("coefficients")?.try_into().map_err(|_| {
                    ConfigError::bad_argument(&self.id, "coefficients", "expected 5 numbers")
                })?;
                boxed(BiquadK::new(c))
            }
            "rpole~" => boxed(RPole::new()),
            "rpole_k~" => boxed(RPoleK::new(self.float("a")?)),
            "cpole~" => boxed(CPole::new()),
            "del1~" => boxed(Del1::new()),
            "line~" => boxed(Line::new(self.float_or("value", 0.0)?)),
            "envelope~" => boxed(Envelope::new(
                self.count_or("window", 1024)?,
                self.count_or("period", 512)?,
            )),
            "convolution~" => {
                let size = self.count_or("size", 0)?;
                if size == 0 {
                    return Err(ConfigError::bad_argument(&self.id, "size", "must be positive"));
                }
                boxed(Convolution::new(self.string("table")?, size))
            }
            "samphold~" => boxed(Samphold::new()),
            "sample~" => boxed(Sample::new()),
            "tabread~" => boxed(SignalTabread::new(self.string("table")?, self.access_mode()?)),
            "tabwrite~" => boxed(SignalTabwrite::new(self.string("table")?, self.access_mode()?)),
            "tabhead~" => boxed(SignalTabhead::new(self.string("table")?)),

            _ => {
                return Err(ConfigError::UnknownObjectKind {
                    id: self.id.clone(),
                    kind: self.kind.clone(),
                });
            }
        };
        Ok(object)
    }
}

fn boxed(object: impl Object + 'static) -> Lowered {
    Lowered::Object(Box::new(object))
}

fn value_as_f64(v: &toml::Value) -> Option<f64> {
    match v {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn value_as_element(v: &toml::Value) -> Option<Element> {
    match v {
        toml::Value::String(s) if s == "bang" => Some(Element::Bang),
        toml::Value::String(s) => Some(Element::symbol(s)),
        other => value_as_f64(other).map(|f| Element::Float(f as f32)),
    }
}
