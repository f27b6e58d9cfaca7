//! # Simple Moving Average (SMA)
//!
//! Arithmetic mean of the last `period` values. Each output at index `i` covers
//! `data[i + 1 - period..=i]`, so the first `period - 1` samples are consumed as
//! lookback.
//!
//! ## Parameters
//! - **period**: Window size. Defaults to 30, native range `2..=100000`.
//!
//! ## Errors
//! - **TA_BAD_PARAM**: `period` outside its native range, or an output buffer
//!   shorter than the requested range.
//! - **TA_OUT_OF_RANGE_END_INDEX**: `end < start` or `end` past the data.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct SmaParams {
    pub period: Option<usize>,
}

impl Default for SmaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl SmaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn sma_lookback(params: &SmaParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

#[inline]
pub fn sma_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &SmaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(sma_core(data, start, end, period, out))
}

/// Unchecked kernel shared with `MA` and `TRIMA`-style callers.
pub(crate) fn sma_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let mut sum: f64 = data[first - lookback..first].iter().sum();
    let mut n = 0;
    for i in first..=end {
        sum += data[i];
        out[n] = sum / period as f64;
        sum -= data[i - lookback];
        n += 1;
    }

    NativeRange {
        beg_idx: first,
        nb_element: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_accuracy() {
        let data: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let params = SmaParams { period: Some(4) };
        let mut out = vec![0.0; data.len()];
        let range = sma_into(&data, 0, 9, &params, &mut out).expect("Failed to calculate SMA");

        assert_eq!(range.beg_idx, 3, "SMA begin index mismatch");
        assert_eq!(range.nb_element, 7, "SMA element count mismatch");
        let expected = [2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5];
        for (i, &value) in out[..range.nb_element].iter().enumerate() {
            assert!(
                (value - expected[i]).abs() < 1e-12,
                "SMA mismatch at index {}: expected {}, got {}",
                i,
                expected[i],
                value
            );
        }
    }

    #[test]
    fn test_sma_start_past_lookback() {
        let data: Vec<f64> = (0..20).map(|x| (x * x) as f64).collect();
        let params = SmaParams { period: Some(3) };
        let mut out = vec![0.0; 6];
        let range = sma_into(&data, 10, 15, &params, &mut out).unwrap();
        assert_eq!(range, NativeRange { beg_idx: 10, nb_element: 6 });
        assert!((out[0] - (64.0 + 81.0 + 100.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_sma_range_shorter_than_lookback() {
        let data = [1.0, 2.0, 3.0];
        let params = SmaParams { period: Some(5) };
        let mut out = vec![0.0; 3];
        let range = sma_into(&data, 0, 2, &params, &mut out).unwrap();
        assert_eq!(range, NativeRange::EMPTY);
    }

    #[test]
    fn test_sma_with_invalid_period() {
        let data = [10.0, 20.0, 30.0];
        let mut out = vec![0.0; 3];
        let result = sma_into(&data, 0, 2, &SmaParams { period: Some(1) }, &mut out);
        assert_eq!(result, Err(RetCode::BAD_PARAM));
        assert_eq!(sma_lookback(&SmaParams::default()), Ok(29));
    }
}
