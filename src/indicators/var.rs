//! # Variance (VAR)
//!
//! Population variance of the trailing window, `mean(x^2) - mean(x)^2`.
//!
//! ## Parameters
//! - **period**: Defaults to 5, native range `1..=100000`.
//! - **nbdev**: Published by the native table (default 1.0) but not applied to
//!   the variance itself.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct VarParams {
    pub period: Option<usize>,
    pub nbdev: Option<f64>,
}

impl Default for VarParams {
    fn default() -> Self {
        Self {
            period: Some(5),
            nbdev: Some(1.0),
        }
    }
}

impl VarParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 5, 1, 100_000)
    }
}

#[inline]
pub fn var_lookback(params: &VarParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn var_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &VarParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(var_core(data, start, end, period, out))
}

pub(crate) fn var_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let inv = 1.0 / period as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &x in &data[first - lookback..first] {
        sum += x;
        sum_sq += x * x;
    }

    let mut n = 0;
    for i in first..=end {
        let x = data[i];
        sum += x;
        sum_sq += x * x;
        let mean = sum * inv;
        out[n] = sum_sq * inv - mean * mean;
        let old = data[i - lookback];
        sum -= old;
        sum_sq -= old * old;
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
    fn test_var_accuracy() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let params = VarParams {
            period: Some(8),
            nbdev: None,
        };
        let mut out = [0.0; 8];
        let r = var_into(&data, 0, 7, &params, &mut out).expect("Failed to calculate VAR");
        assert_eq!(r, NativeRange { beg_idx: 7, nb_element: 1 });
        assert!((out[0] - 4.0).abs() < 1e-12, "expected 4.0, got {}", out[0]);
    }

    #[test]
    fn test_var_period_one_is_zero() {
        let data = [3.0, -1.0, 8.0];
        let params = VarParams {
            period: Some(1),
            nbdev: None,
        };
        let mut out = [9.9; 3];
        let r = var_into(&data, 0, 2, &params, &mut out).unwrap();
        assert_eq!(r.nb_element, 3);
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_var_begins_at_lookback() {
        let data: Vec<f64> = (0..40).map(|i| (i as f64 * 0.2).sin()).collect();
        let params = VarParams::default();
        let mut out = vec![0.0; 40];
        let r = var_into(&data, 0, 39, &params, &mut out).unwrap();
        assert_eq!(var_lookback(&params), Ok(4));
        assert_eq!(r.beg_idx, 4);
        assert_eq!(r.nb_element, 36);
    }
}
