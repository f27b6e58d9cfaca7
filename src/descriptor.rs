//! # Function descriptors
//!
//! Typed view of one function's native metadata record. The native parameter
//! table is walked once and split into inputs, optional inputs and outputs,
//! each keeping native order and the native flag bits verbatim.
//!
//! Descriptors are immutable and cached per name inside the owning
//! [`TaLibrary`], so resolving the same name twice yields the same `Arc`.

use std::sync::{Arc, PoisonError};

use log::debug;
use serde::Serialize;

use crate::engine::{OptValue, RawDataSet, RawFuncInfo, RawInputType, RawOutputType, RawParamInfo, RetCode};
use crate::error::{AbstractError, Result};
use crate::library::TaLibrary;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    Price,
    Real,
    Integer,
}

impl ParameterType {
    /// Native type label.
    pub fn type_name(self) -> &'static str {
        match self {
            ParameterType::Price => "Price",
            ParameterType::Real => "Real",
            ParameterType::Integer => "Integer",
        }
    }
}

impl From<RawInputType> for ParameterType {
    fn from(kind: RawInputType) -> Self {
        match kind {
            RawInputType::Price => ParameterType::Price,
            RawInputType::Real => ParameterType::Real,
            RawInputType::Integer => ParameterType::Integer,
        }
    }
}

impl From<RawOutputType> for ParameterType {
    fn from(kind: RawOutputType) -> Self {
        match kind {
            RawOutputType::Real => ParameterType::Real,
            RawOutputType::Integer => ParameterType::Integer,
        }
    }
}

/// An input or output of a function.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub flags: u32,
}

impl ParameterDescription {
    #[inline]
    pub fn has_flag(&self, bit: u32) -> bool {
        self.flags & bit != 0
    }
}

/// Value domain of an optional input, with its default.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OptionalKind {
    IntegerRange { default: i32, min: i32, max: i32 },
    IntegerList { default: i32, values: Vec<(i32, String)> },
    RealRange { default: f64, min: f64, max: f64, precision: i32 },
    RealList { default: f64, values: Vec<(f64, String)> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionalParameterDescription {
    pub name: String,
    pub display_name: String,
    pub hint: String,
    pub flags: u32,
    #[serde(flatten)]
    pub kind: OptionalKind,
}

impl OptionalParameterDescription {
    pub fn default_value(&self) -> OptValue {
        match &self.kind {
            OptionalKind::IntegerRange { default, .. } | OptionalKind::IntegerList { default, .. } => {
                OptValue::Integer(*default)
            }
            OptionalKind::RealRange { default, .. } | OptionalKind::RealList { default, .. } => {
                OptValue::Real(*default)
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            OptionalKind::IntegerRange { .. } => "IntegerRange",
            OptionalKind::IntegerList { .. } => "IntegerList",
            OptionalKind::RealRange { .. } => "RealRange",
            OptionalKind::RealList { .. } => "RealList",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.kind,
            OptionalKind::IntegerRange { .. } | OptionalKind::IntegerList { .. }
        )
    }

    /// Enumerated values for list kinds; `None` for ranges.
    pub fn legal_values(&self) -> Option<Vec<OptValue>> {
        match &self.kind {
            OptionalKind::IntegerList { values, .. } => {
                Some(values.iter().map(|(v, _)| OptValue::Integer(*v)).collect())
            }
            OptionalKind::RealList { values, .. } => Some(values.iter().map(|(v, _)| OptValue::Real(*v)).collect()),
            _ => None,
        }
    }

    /// Parameter name without the `optIn` prefix, lower-cased
    /// (`optInTimePeriod` -> `timeperiod`).
    pub fn short_name(&self) -> String {
        self.name
            .strip_prefix("optIn")
            .unwrap_or(&self.name)
            .to_ascii_lowercase()
    }

    /// Coerces `value` to this parameter's native type. Integer parameters
    /// accept integral reals.
    pub fn coerce(&self, value: OptValue) -> std::result::Result<OptValue, String> {
        if !self.is_integer() {
            return Ok(OptValue::Real(value.as_f64()));
        }
        match value {
            OptValue::Integer(v) => Ok(OptValue::Integer(v)),
            OptValue::Real(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => {
                Ok(OptValue::Integer(v as i32))
            }
            OptValue::Real(v) => Err(format!("{} expects an integer, got {v}", self.name)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub group: String,
    pub hint: String,
    pub camel_case_name: String,
    pub flags: u32,
    pub inputs: Vec<ParameterDescription>,
    pub outputs: Vec<ParameterDescription>,
    pub optional_inputs: Vec<OptionalParameterDescription>,
}

impl FunctionDescriptor {
    #[inline]
    pub fn nb_input(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn nb_output(&self) -> usize {
        self.outputs.len()
    }

    #[inline]
    pub fn nb_opt_input(&self) -> usize {
        self.optional_inputs.len()
    }

    #[inline]
    pub fn has_flag(&self, bit: u32) -> bool {
        self.flags & bit != 0
    }

    /// Finds an optional input by native name or by its short name.
    pub fn optional_input(&self, name: &str) -> Option<(usize, &OptionalParameterDescription)> {
        self.optional_inputs
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
            .or_else(|| {
                let wanted = name.to_ascii_lowercase();
                self.optional_inputs
                    .iter()
                    .enumerate()
                    .find(|(_, p)| p.short_name() == wanted)
            })
    }

    /// Flat optional-value list holding every default, in native order.
    pub fn default_opt_values(&self) -> Vec<OptValue> {
        self.optional_inputs.iter().map(|p| p.default_value()).collect()
    }

    pub fn from_raw(raw: RawFuncInfo) -> Self {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut optional_inputs = Vec::new();

        for param in raw.params {
            match param {
                RawParamInfo::Input { name, kind, flags } => inputs.push(ParameterDescription {
                    name,
                    param_type: kind.into(),
                    flags,
                }),
                RawParamInfo::Output { name, kind, flags } => outputs.push(ParameterDescription {
                    name,
                    param_type: kind.into(),
                    flags,
                }),
                RawParamInfo::OptInput {
                    name,
                    display_name,
                    hint,
                    flags,
                    default_value,
                    data_set,
                } => {
                    let kind = match data_set {
                        RawDataSet::IntegerRange { min, max } => OptionalKind::IntegerRange {
                            default: default_value as i32,
                            min,
                            max,
                        },
                        RawDataSet::IntegerList(values) => OptionalKind::IntegerList {
                            default: default_value as i32,
                            values,
                        },
                        RawDataSet::RealRange { min, max, precision } => OptionalKind::RealRange {
                            default: default_value,
                            min,
                            max,
                            precision,
                        },
                        RawDataSet::RealList(values) => OptionalKind::RealList {
                            default: default_value,
                            values,
                        },
                    };
                    optional_inputs.push(OptionalParameterDescription {
                        name,
                        display_name,
                        hint,
                        flags,
                        kind,
                    });
                }
            }
        }

        FunctionDescriptor {
            name: raw.name,
            group: raw.group,
            hint: raw.hint,
            camel_case_name: raw.camel_case_name,
            flags: raw.flags,
            inputs,
            outputs,
            optional_inputs,
        }
    }
}

impl TaLibrary {
    /// Descriptor for `name`, fetched from the engine on first use and
    /// cached for the lifetime of this handle.
    pub fn resolve(&self, name: &str) -> Result<Arc<FunctionDescriptor>> {
        let engine = self.engine()?;

        if let Some(found) = self
            .inner
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(found));
        }

        debug!("descriptor cache miss: {name}");
        let raw = engine.function_info(name).map_err(|status| match status {
            RetCode::FUNC_NOT_FOUND => AbstractError::UnknownFunction(name.to_string()),
            status => AbstractError::Catalog { status },
        })?;
        let descriptor = Arc::new(FunctionDescriptor::from_raw(raw));

        let mut cache = self
            .inner
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(name.to_string()).or_insert(descriptor)))
    }
}
