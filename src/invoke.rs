//! # Invocation
//!
//! Runs any resolved function through the engine's single generic entry
//! point. Arguments are checked against the descriptor before the engine is
//! touched: input count and kinds, required price components, array lengths
//! against the requested range, and optional-parameter names and types.
//!
//! Output buffers are sized `end - start + 1` and filled from index 0. The
//! engine reports the absolute index of the first valid value (`begin`) and
//! how many values are valid (`count`); only `outputs[k][..count]` is
//! meaningful.
//!
//! ## Example
//! ```no_run
//! use ta_abstract::{Invocation, TaLibrary};
//!
//! let lib = TaLibrary::initialize()?;
//! let ma = lib.resolve("MA")?;
//! let close: Vec<f64> = (0..100).map(|i| i as f64).collect();
//! let res = Invocation::new(&ma)
//!     .range(0, 99)
//!     .input(&close)
//!     .opt("optInTimePeriod", 12)
//!     .call(&lib)?;
//! assert_eq!(res.begin + res.count, 100);
//! # Ok::<(), ta_abstract::AbstractError>(())
//! ```

use std::ops::Range;

use log::{trace, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::descriptor::{FunctionDescriptor, ParameterType};
use crate::engine::{InputData, OptValue, OutputBuffer};
use crate::error::{AbstractError, Result};
use crate::library::TaLibrary;

#[derive(Clone, Debug, Serialize)]
pub struct InvocationResult {
    pub outputs: Vec<OutputBuffer>,
    pub begin: usize,
    pub count: usize,
}

impl InvocationResult {
    /// Valid values of real output `k`.
    pub fn real(&self, k: usize) -> Option<&[f64]> {
        match self.outputs.get(k)? {
            OutputBuffer::Real(v) => Some(&v[..self.count.min(v.len())]),
            OutputBuffer::Integer(_) => None,
        }
    }

    /// Valid values of integer output `k`.
    pub fn integer(&self, k: usize) -> Option<&[i32]> {
        match self.outputs.get(k)? {
            OutputBuffer::Integer(v) => Some(&v[..self.count.min(v.len())]),
            OutputBuffer::Real(_) => None,
        }
    }

    /// Absolute input indices covered by the valid values.
    pub fn valid_range(&self) -> Range<usize> {
        self.begin..self.begin + self.count
    }

    /// Drops everything past `count` from every output.
    pub fn into_trimmed(mut self) -> Self {
        for out in &mut self.outputs {
            out.truncate(self.count);
        }
        self
    }
}

/// Two results are equal when they report the same window and agree on every
/// value inside it. Buffer contents past `count` are not compared.
impl PartialEq for InvocationResult {
    fn eq(&self, other: &Self) -> bool {
        let n = self.count;
        self.begin == other.begin
            && n == other.count
            && self.outputs.len() == other.outputs.len()
            && self.outputs.iter().zip(&other.outputs).all(|pair| match pair {
                (OutputBuffer::Real(a), OutputBuffer::Real(b)) => a.get(..n) == b.get(..n),
                (OutputBuffer::Integer(a), OutputBuffer::Integer(b)) => a.get(..n) == b.get(..n),
                _ => false,
            })
    }
}

fn invalid(msg: String) -> AbstractError {
    AbstractError::InvalidArgument(msg)
}

fn check_len(function: &str, idx: usize, what: &str, len: usize, end: usize) -> Result<()> {
    if len < end + 1 {
        return Err(invalid(format!(
            "{function}: input {idx} ({what}) holds {len} values, range ends at index {end}"
        )));
    }
    Ok(())
}

/// Validates arguments and builds the flat optional-value list.
fn prepare(
    descriptor: &FunctionDescriptor,
    start: usize,
    end: usize,
    inputs: &[InputData<'_>],
    overrides: &[(&str, OptValue)],
) -> Result<Vec<OptValue>> {
    let function = descriptor.name.as_str();

    if start > end {
        return Err(invalid(format!("{function}: start index {start} is past end index {end}")));
    }
    if end > i32::MAX as usize {
        return Err(invalid(format!("{function}: end index {end} exceeds the native index range")));
    }
    if inputs.len() != descriptor.nb_input() {
        return Err(invalid(format!(
            "{function}: expected {} inputs, got {}",
            descriptor.nb_input(),
            inputs.len()
        )));
    }

    for (idx, (desc, data)) in descriptor.inputs.iter().zip(inputs).enumerate() {
        match (desc.param_type, data) {
            (ParameterType::Real, InputData::Real(s)) => check_len(function, idx, &desc.name, s.len(), end)?,
            (ParameterType::Integer, InputData::Integer(s)) => check_len(function, idx, &desc.name, s.len(), end)?,
            (ParameterType::Price, InputData::Price(price)) => {
                for (bit, label, series) in price.components() {
                    if !desc.has_flag(bit) {
                        continue;
                    }
                    let series = series.ok_or_else(|| {
                        invalid(format!("{function}: input {idx} ({}) is missing the {label} series", desc.name))
                    })?;
                    check_len(function, idx, label, series.len(), end)?;
                }
            }
            (expected, got) => {
                return Err(invalid(format!(
                    "{function}: input {idx} ({}) expects {} data, got {}",
                    desc.name,
                    expected.type_name(),
                    got.kind_name()
                )))
            }
        }
    }

    let mut values = descriptor.default_opt_values();
    for (name, value) in overrides {
        let (idx, param) = descriptor
            .optional_input(name)
            .ok_or_else(|| invalid(format!("{function}: no optional parameter named '{name}'")))?;
        values[idx] = param
            .coerce(*value)
            .map_err(|e| invalid(format!("{function}: {e}")))?;
    }
    Ok(values)
}

impl TaLibrary {
    /// Runs `descriptor` over `[start, end]`. Optional parameters not named in
    /// `overrides` take their defaults.
    pub fn invoke(
        &self,
        descriptor: &FunctionDescriptor,
        start: usize,
        end: usize,
        inputs: &[InputData<'_>],
        overrides: &[(&str, OptValue)],
    ) -> Result<InvocationResult> {
        let engine = self.engine()?;
        let opt_values = prepare(descriptor, start, end, inputs, overrides)?;

        let len = end - start + 1;
        let mut outputs: Vec<OutputBuffer> = descriptor
            .outputs
            .iter()
            .map(|o| match o.param_type {
                ParameterType::Integer => OutputBuffer::Integer(vec![0; len]),
                _ => OutputBuffer::Real(vec![f64::NAN; len]),
            })
            .collect();

        trace!(
            "{} call [{start}, {end}] opts={:?} on {}",
            descriptor.name,
            opt_values,
            engine.name()
        );
        let range = engine
            .call(&descriptor.name, start, end, inputs, &opt_values, &mut outputs)
            .map_err(|status| {
                warn!("{} returned {status}", descriptor.name);
                AbstractError::Computation {
                    function: descriptor.name.clone(),
                    status,
                }
            })?;

        Ok(InvocationResult {
            outputs,
            begin: range.beg_idx,
            count: range.nb_element,
        })
    }

    /// One invocation per entry of `series`, spread over the rayon pool.
    /// Results come back in `series` order; the first failure fails the batch.
    pub fn invoke_many(
        &self,
        descriptor: &FunctionDescriptor,
        start: usize,
        end: usize,
        series: &[Vec<InputData<'_>>],
        overrides: &[(&str, OptValue)],
    ) -> Result<Vec<InvocationResult>> {
        series
            .par_iter()
            .map(|inputs| self.invoke(descriptor, start, end, inputs, overrides))
            .collect()
    }
}

/// Builder over [`TaLibrary::invoke`]. The range defaults to the whole of
/// the shortest input.
#[derive(Clone, Debug)]
pub struct Invocation<'d, 'a> {
    descriptor: &'d FunctionDescriptor,
    range: Option<(usize, usize)>,
    inputs: Vec<InputData<'a>>,
    overrides: Vec<(String, OptValue)>,
}

impl<'d, 'a> Invocation<'d, 'a> {
    #[inline(always)]
    pub fn new(descriptor: &'d FunctionDescriptor) -> Self {
        Self {
            descriptor,
            range: None,
            inputs: Vec::new(),
            overrides: Vec::new(),
        }
    }
    #[inline(always)]
    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }
    #[inline(always)]
    pub fn input<I: Into<InputData<'a>>>(mut self, data: I) -> Self {
        self.inputs.push(data.into());
        self
    }
    #[inline(always)]
    pub fn opt<S: Into<String>, V: Into<OptValue>>(mut self, name: S, value: V) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    fn shortest_input(&self) -> usize {
        self.inputs
            .iter()
            .map(|i| match i {
                InputData::Real(s) => s.len(),
                InputData::Integer(s) => s.len(),
                InputData::Price(p) => p
                    .components()
                    .iter()
                    .filter_map(|(_, _, s)| s.map(|s| s.len()))
                    .min()
                    .unwrap_or(0),
            })
            .min()
            .unwrap_or(0)
    }

    pub fn call(self, lib: &TaLibrary) -> Result<InvocationResult> {
        let (start, end) = match self.range {
            Some(r) => r,
            None => {
                let n = self.shortest_input();
                if n == 0 {
                    return Err(invalid(format!("{}: no input data", self.descriptor.name)));
                }
                (0, n - 1)
            }
        };
        let overrides: Vec<(&str, OptValue)> = self.overrides.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        lib.invoke(self.descriptor, start, end, &self.inputs, &overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reference::ReferenceEngine;
    use crate::engine::{PriceData, RetCode};

    fn lib() -> TaLibrary {
        TaLibrary::with_engine(ReferenceEngine::new()).unwrap()
    }

    #[test]
    fn test_sma_defaults_and_override() {
        let lib = lib();
        let sma = lib.resolve("SMA").unwrap();
        let data: Vec<f64> = (1..=40).map(|x| x as f64).collect();

        let res = lib.invoke(&sma, 0, 39, &[InputData::Real(&data)], &[]).unwrap();
        assert_eq!(res.begin, 29);
        assert_eq!(res.count, 11);
        assert!((res.real(0).unwrap()[0] - 15.5).abs() < 1e-12);

        let res = lib
            .invoke(&sma, 0, 39, &[InputData::Real(&data)], &[("optInTimePeriod", OptValue::Integer(4))])
            .unwrap();
        assert_eq!(res.valid_range(), 3..40);
        assert!((res.real(0).unwrap()[0] - 2.5).abs() < 1e-12);
        assert_eq!(res.outputs[0].len(), 40);
    }

    #[test]
    fn test_short_input_rejected_before_engine() {
        let lib = lib();
        let add = lib.resolve("ADD").unwrap();
        let a = vec![1.0; 5];
        let b = vec![1.0; 10];
        let err = lib
            .invoke(&add, 0, 9, &[InputData::Real(&a), InputData::Real(&b)], &[])
            .unwrap_err();
        match err {
            AbstractError::InvalidArgument(msg) => assert!(msg.contains("input 0"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_argument_checks() {
        let lib = lib();
        let sma = lib.resolve("SMA").unwrap();
        let data = vec![1.0; 10];
        let ints = vec![1; 10];

        assert!(matches!(
            lib.invoke(&sma, 5, 4, &[InputData::Real(&data)], &[]),
            Err(AbstractError::InvalidArgument(_))
        ));
        assert!(matches!(
            lib.invoke(&sma, 0, 9, &[], &[]),
            Err(AbstractError::InvalidArgument(_))
        ));
        assert!(matches!(
            lib.invoke(&sma, 0, 9, &[InputData::Integer(&ints)], &[]),
            Err(AbstractError::InvalidArgument(_))
        ));
        assert!(matches!(
            lib.invoke(&sma, 0, 9, &[InputData::Real(&data)], &[("optInBogus", OptValue::Integer(1))]),
            Err(AbstractError::InvalidArgument(_))
        ));
        assert!(matches!(
            lib.invoke(&sma, 0, 9, &[InputData::Real(&data)], &[("optInTimePeriod", OptValue::Real(2.5))]),
            Err(AbstractError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_price_component() {
        let lib = lib();
        let trange = lib.resolve("TRANGE").unwrap();
        let h = vec![2.0; 4];
        let l = vec![1.0; 4];
        let price = PriceData::hl(&h, &l);
        match lib.invoke(&trange, 0, 3, &[InputData::Price(price)], &[]) {
            Err(AbstractError::InvalidArgument(msg)) => assert!(msg.contains("close"), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_engine_failure_is_computation_error() {
        let lib = lib();
        let sma = lib.resolve("SMA").unwrap();
        let data = vec![1.0; 10];
        match lib.invoke(&sma, 0, 9, &[InputData::Real(&data)], &[("optInTimePeriod", OptValue::Integer(1))]) {
            Err(AbstractError::Computation { function, status }) => {
                assert_eq!(function, "SMA");
                assert_eq!(status, RetCode::BAD_PARAM);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_builder_defaults_range_and_short_names() {
        let lib = lib();
        let ma = lib.resolve("MA").unwrap();
        let data: Vec<f64> = (0..50).map(|x| x as f64).collect();
        let res = Invocation::new(&ma)
            .input(&data)
            .opt("timeperiod", 10)
            .opt("matype", 1)
            .call(&lib)
            .unwrap();
        assert_eq!(res.begin, 9);
        assert_eq!(res.count, 41);
        let trimmed = res.into_trimmed();
        assert_eq!(trimmed.outputs[0].len(), 41);
    }

    #[test]
    fn test_maxindex_is_integer_output() {
        let lib = lib();
        let d = lib.resolve("MAXINDEX").unwrap();
        let data = [1.0, 3.0, 2.0, 5.0, 4.0];
        let res = Invocation::new(&d).input(&data[..]).opt("optInTimePeriod", 2).call(&lib).unwrap();
        assert_eq!(res.integer(0).unwrap(), &[1, 1, 3, 3]);
        assert!(res.real(0).is_none());
    }

    #[test]
    fn test_invoke_many_keeps_order() {
        let lib = lib();
        let sum = lib.resolve("SUM").unwrap();
        let series: Vec<Vec<f64>> = (1..=8).map(|k| vec![k as f64; 20]).collect();
        let batch: Vec<Vec<InputData<'_>>> = series.iter().map(|s| vec![InputData::Real(s)]).collect();
        let results = lib
            .invoke_many(&sum, 0, 19, &batch, &[("optInTimePeriod", OptValue::Integer(5))])
            .unwrap();
        assert_eq!(results.len(), 8);
        for (k, r) in results.iter().enumerate() {
            assert_eq!(r.begin, 4);
            assert!((r.real(0).unwrap()[0] - 5.0 * (k + 1) as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_repeated_call_compares_equal() {
        let lib = lib();
        let sma = lib.resolve("SMA").unwrap();
        let data: Vec<f64> = (0..40).map(|x| (x as f64 * 0.4).sin()).collect();

        let a = lib.invoke(&sma, 0, 39, &[InputData::Real(&data)], &[]).unwrap();
        let b = lib.invoke(&sma, 0, 39, &[InputData::Real(&data)], &[]).unwrap();
        assert!(a.count < a.outputs[0].len(), "tail past count must exist");
        assert_eq!(a, b);
        assert_eq!(a, b.clone().into_trimmed());

        let other = lib
            .invoke(&sma, 0, 39, &[InputData::Real(&data)], &[("optInTimePeriod", OptValue::Integer(5))])
            .unwrap();
        assert_ne!(a, other);
    }
}
