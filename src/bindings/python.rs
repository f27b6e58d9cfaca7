use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use numpy::{IntoPyArray, PyReadonlyArray1};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};

use crate::descriptor::{
	FunctionDescriptor, OptionalKind, OptionalParameterDescription, ParameterDescription, ParameterType,
};
use crate::engine::{func_flags, input_flags, opt_input_flags, output_flags};
use crate::engine::{InputData, OptValue, OutputBuffer, PriceData};
use crate::error::AbstractError;
use crate::library::TaLibrary;

static LIBRARY: Mutex<Option<TaLibrary>> = Mutex::new(None);

fn to_py_err(e: AbstractError) -> PyErr {
	match e {
		AbstractError::InvalidArgument(_) | AbstractError::UnknownFunction(_) => PyValueError::new_err(e.to_string()),
		_ => PyRuntimeError::new_err(e.to_string()),
	}
}

/// Live handle held for the interpreter; started lazily, dropped by `finalize()`.
fn library() -> PyResult<TaLibrary> {
	let mut slot = LIBRARY.lock().unwrap_or_else(PoisonError::into_inner);
	if let Some(lib) = slot.as_ref().filter(|l| !l.is_finalized()) {
		return Ok(lib.clone());
	}
	let lib = TaLibrary::initialize().map_err(to_py_err)?;
	*slot = Some(lib.clone());
	Ok(lib)
}

#[pyfunction]
fn function_groups() -> PyResult<Vec<String>> {
	library()?.function_groups().map_err(to_py_err)
}

#[pyfunction]
fn functions_in_group(group: &str) -> PyResult<Vec<String>> {
	library()?.functions_in_group(group).map_err(to_py_err)
}

#[pyfunction]
fn finalize() -> PyResult<()> {
	let taken = LIBRARY.lock().unwrap_or_else(PoisonError::into_inner).take();
	match taken {
		Some(lib) => lib.finalize().map_err(to_py_err),
		None => Ok(()),
	}
}

#[pyclass(name = "ParameterDescription", module = "ta_abstract", frozen)]
#[derive(Clone)]
pub struct ParameterDescriptionPy {
	#[pyo3(get)]
	name: String,
	#[pyo3(get, name = "type")]
	type_name: String,
	#[pyo3(get)]
	flags: u32,
}

impl From<&ParameterDescription> for ParameterDescriptionPy {
	fn from(p: &ParameterDescription) -> Self {
		Self {
			name: p.name.clone(),
			type_name: p.param_type.type_name().to_string(),
			flags: p.flags,
		}
	}
}

#[pymethods]
impl ParameterDescriptionPy {
	fn __repr__(&self) -> String {
		format!("<{} type={} flags={:#x}>", self.name, self.type_name, self.flags)
	}
}

#[pyclass(name = "OptionalParameterDescription", module = "ta_abstract", frozen)]
#[derive(Clone)]
pub struct OptionalParameterDescriptionPy {
	inner: OptionalParameterDescription,
}

fn opt_to_py(py: Python<'_>, v: OptValue) -> PyResult<Py<PyAny>> {
	Ok(match v {
		OptValue::Integer(i) => i.into_pyobject(py)?.into_any().unbind(),
		OptValue::Real(x) => x.into_pyobject(py)?.into_any().unbind(),
	})
}

#[pymethods]
impl OptionalParameterDescriptionPy {
	#[getter]
	fn name(&self) -> &str {
		&self.inner.name
	}
	#[getter]
	#[pyo3(name = "type")]
	fn type_name(&self) -> &'static str {
		self.inner.type_name()
	}
	#[getter]
	fn flags(&self) -> u32 {
		self.inner.flags
	}
	#[getter]
	fn display_name(&self) -> &str {
		&self.inner.display_name
	}
	#[getter]
	fn hint(&self) -> &str {
		&self.inner.hint
	}
	#[getter]
	fn default(&self, py: Python<'_>) -> PyResult<Py<PyAny>> {
		opt_to_py(py, self.inner.default_value())
	}
	/// `(min, max)` for range kinds, `None` for lists.
	#[getter]
	fn range(&self) -> Option<(f64, f64)> {
		match &self.inner.kind {
			OptionalKind::IntegerRange { min, max, .. } => Some((*min as f64, *max as f64)),
			OptionalKind::RealRange { min, max, .. } => Some((*min, *max)),
			_ => None,
		}
	}
	/// `[(value, label), ...]` for list kinds, `None` for ranges.
	#[getter]
	fn values(&self) -> Option<Vec<(f64, String)>> {
		match &self.inner.kind {
			OptionalKind::IntegerList { values, .. } => {
				Some(values.iter().map(|(v, s)| (*v as f64, s.clone())).collect())
			}
			OptionalKind::RealList { values, .. } => Some(values.clone()),
			_ => None,
		}
	}
	fn __repr__(&self) -> String {
		format!(
			"<{} type={} default={}>",
			self.inner.name,
			self.inner.type_name(),
			self.inner.default_value()
		)
	}
}

enum HeldInput {
	Real(Vec<f64>),
	Integer(Vec<i32>),
	Price(HashMap<String, Vec<f64>>),
}

impl HeldInput {
	fn extract(desc: &ParameterDescription, obj: &Bound<'_, PyAny>) -> PyResult<Self> {
		match desc.param_type {
			ParameterType::Real => {
				let arr: PyReadonlyArray1<f64> = obj.extract()?;
				Ok(HeldInput::Real(arr.as_slice()?.to_vec()))
			}
			ParameterType::Integer => {
				let arr: PyReadonlyArray1<i32> = obj.extract()?;
				Ok(HeldInput::Integer(arr.as_slice()?.to_vec()))
			}
			ParameterType::Price => {
				let dict = obj.downcast::<PyDict>().map_err(|_| {
					PyValueError::new_err(format!(
						"{} expects a dict of price arrays (open, high, low, close, volume, open_interest)",
						desc.name
					))
				})?;
				let mut series = HashMap::new();
				for (k, v) in dict.iter() {
					let key: String = k.extract()?;
					let arr: PyReadonlyArray1<f64> = v.extract()?;
					series.insert(key.to_ascii_lowercase(), arr.as_slice()?.to_vec());
				}
				Ok(HeldInput::Price(series))
			}
		}
	}

	fn as_input(&self) -> InputData<'_> {
		match self {
			HeldInput::Real(v) => InputData::Real(v),
			HeldInput::Integer(v) => InputData::Integer(v),
			HeldInput::Price(m) => {
				let get = |k: &str| m.get(k).map(Vec::as_slice);
				InputData::Price(PriceData {
					open: get("open"),
					high: get("high"),
					low: get("low"),
					close: get("close"),
					volume: get("volume"),
					open_interest: get("open_interest"),
				})
			}
		}
	}
}

#[pyclass(name = "TaFunction", module = "ta_abstract", frozen)]
pub struct TaFunctionPy {
	descriptor: Arc<FunctionDescriptor>,
}

#[pymethods]
impl TaFunctionPy {
	#[new]
	fn new(name: &str) -> PyResult<Self> {
		let descriptor = library()?
			.resolve(&name.to_ascii_uppercase())
			.map_err(to_py_err)?;
		Ok(TaFunctionPy { descriptor })
	}

	#[getter]
	fn name(&self) -> &str {
		&self.descriptor.name
	}
	#[getter]
	fn group(&self) -> &str {
		&self.descriptor.group
	}
	#[getter]
	fn hint(&self) -> &str {
		&self.descriptor.hint
	}
	#[getter]
	fn camel_case_name(&self) -> &str {
		&self.descriptor.camel_case_name
	}
	#[getter]
	fn flags(&self) -> u32 {
		self.descriptor.flags
	}
	#[getter]
	fn nb_input(&self) -> usize {
		self.descriptor.nb_input()
	}
	#[getter]
	fn nb_output(&self) -> usize {
		self.descriptor.nb_output()
	}
	#[getter]
	fn nb_opt_input(&self) -> usize {
		self.descriptor.nb_opt_input()
	}
	#[getter]
	fn input_description(&self) -> Vec<ParameterDescriptionPy> {
		self.descriptor.inputs.iter().map(Into::into).collect()
	}
	#[getter]
	fn output_description(&self) -> Vec<ParameterDescriptionPy> {
		self.descriptor.outputs.iter().map(Into::into).collect()
	}
	#[getter]
	fn optional_input_description(&self) -> Vec<OptionalParameterDescriptionPy> {
		self.descriptor
			.optional_inputs
			.iter()
			.map(|p| OptionalParameterDescriptionPy { inner: p.clone() })
			.collect()
	}

	/// `f(start, end, *inputs, **optional)` -> `(outputs, begin, count)`, each
	/// output trimmed to `count` values.
	#[pyo3(signature = (start, end, *inputs, **opt_overrides))]
	fn __call__(
		&self,
		py: Python<'_>,
		start: usize,
		end: usize,
		inputs: &Bound<'_, PyTuple>,
		opt_overrides: Option<&Bound<'_, PyDict>>,
	) -> PyResult<(Vec<Py<PyAny>>, usize, usize)> {
		let d = &self.descriptor;
		if inputs.len() != d.nb_input() {
			return Err(PyValueError::new_err(format!(
				"{} expects {} inputs, got {}",
				d.name,
				d.nb_input(),
				inputs.len()
			)));
		}
		let held = d
			.inputs
			.iter()
			.zip(inputs.iter())
			.map(|(desc, obj)| HeldInput::extract(desc, &obj))
			.collect::<PyResult<Vec<_>>>()?;

		let mut overrides: Vec<(String, OptValue)> = Vec::new();
		if let Some(kw) = opt_overrides {
			for (k, v) in kw.iter() {
				let key: String = k.extract()?;
				let value = match v.extract::<i32>() {
					Ok(i) => OptValue::Integer(i),
					Err(_) => OptValue::Real(v.extract::<f64>()?),
				};
				overrides.push((key, value));
			}
		}

		let lib = library()?;
		let result = py
			.allow_threads(|| {
				let data: Vec<InputData<'_>> = held.iter().map(HeldInput::as_input).collect();
				let ov: Vec<(&str, OptValue)> = overrides.iter().map(|(k, v)| (k.as_str(), *v)).collect();
				lib.invoke(d, start, end, &data, &ov)
			})
			.map_err(to_py_err)?
			.into_trimmed();

		let outputs = result
			.outputs
			.into_iter()
			.map(|out| match out {
				OutputBuffer::Real(v) => v.into_pyarray(py).into_any().unbind(),
				OutputBuffer::Integer(v) => v.into_pyarray(py).into_any().unbind(),
			})
			.collect();
		Ok((outputs, result.begin, result.count))
	}

	fn __repr__(&self) -> String {
		format!("<TaFunction {} ({})>", self.descriptor.name, self.descriptor.group)
	}
}

#[pymodule]
fn ta_abstract(m: &Bound<'_, PyModule>) -> PyResult<()> {
	m.add_function(wrap_pyfunction!(function_groups, m)?)?;
	m.add_function(wrap_pyfunction!(functions_in_group, m)?)?;
	m.add_function(wrap_pyfunction!(finalize, m)?)?;
	m.add_class::<TaFunctionPy>()?;
	m.add_class::<ParameterDescriptionPy>()?;
	m.add_class::<OptionalParameterDescriptionPy>()?;

	// Input flags
	m.add("IN_PRICE_OPEN", input_flags::PRICE_OPEN)?;
	m.add("IN_PRICE_HIGH", input_flags::PRICE_HIGH)?;
	m.add("IN_PRICE_LOW", input_flags::PRICE_LOW)?;
	m.add("IN_PRICE_CLOSE", input_flags::PRICE_CLOSE)?;
	m.add("IN_PRICE_VOLUME", input_flags::PRICE_VOLUME)?;
	m.add("IN_PRICE_OPENINTEREST", input_flags::PRICE_OPENINTEREST)?;
	m.add("IN_PRICE_TIMESTAMP", input_flags::PRICE_TIMESTAMP)?;

	// Optional input flags
	m.add("OPT_IN_PERCENT", opt_input_flags::IS_PERCENT)?;
	m.add("OPT_IN_DEGREE", opt_input_flags::IS_DEGREE)?;
	m.add("OPT_IN_CURRENCY", opt_input_flags::IS_CURRENCY)?;
	m.add("OPT_IN_ADVANCED", opt_input_flags::ADVANCED)?;

	// Output flags
	m.add("OUT_LINE", output_flags::LINE)?;
	m.add("OUT_DOT_LINE", output_flags::DOT_LINE)?;
	m.add("OUT_DASH_LINE", output_flags::DASH_LINE)?;
	m.add("OUT_DOT", output_flags::DOT)?;
	m.add("OUT_HISTO", output_flags::HISTO)?;
	m.add("OUT_PATTERN_BOOL", output_flags::PATTERN_BOOL)?;
	m.add("OUT_PATTERN_BULL_BEAR", output_flags::PATTERN_BULL_BEAR)?;
	m.add("OUT_PATTERN_STRENGTH", output_flags::PATTERN_STRENGTH)?;
	m.add("OUT_POSITIVE", output_flags::POSITIVE)?;
	m.add("OUT_NEGATIVE", output_flags::NEGATIVE)?;
	m.add("OUT_ZERO", output_flags::ZERO)?;
	m.add("OUT_UPPER_LIMIT", output_flags::UPPER_LIMIT)?;
	m.add("OUT_LOWER_LIMIT", output_flags::LOWER_LIMIT)?;

	// Function flags
	m.add("FUNC_OVERLAP", func_flags::OVERLAP)?;
	m.add("FUNC_VOLUME", func_flags::VOLUME)?;
	m.add("FUNC_UNST_PER", func_flags::UNST_PER)?;
	m.add("FUNC_CANDLESTICK", func_flags::CANDLESTICK)?;
	Ok(())
}
