//! # Weighted Moving Average (WMA)
//!
//! Linearly weighted mean: the newest value weighs `period`, the oldest `1`,
//! normalized by `period * (period + 1) / 2`.
//!
//! ## Parameters
//! - **period**: Defaults to 30, native range `2..=100000`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct WmaParams {
    pub period: Option<usize>,
}

impl Default for WmaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl WmaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn wma_lookback(params: &WmaParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn wma_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &WmaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(wma_core(data, start, end, period, out))
}

pub(crate) fn wma_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let divider = (period * (period + 1)) as f64 / 2.0;

    // Rolling form: `weighted` is the numerator, `plain` the unweighted window sum.
    let window = &data[first - lookback..first];
    let mut weighted = 0.0;
    let mut plain = 0.0;
    for (j, &x) in window.iter().enumerate() {
        weighted += x * (j + 1) as f64;
        plain += x;
    }

    let mut n = 0;
    for i in first..=end {
        let x = data[i];
        weighted += x * period as f64;
        plain += x;
        out[n] = weighted / divider;
        weighted -= plain;
        plain -= data[i - lookback];
        n += 1;
    }

    NativeRange {
        beg_idx: first,
        nb_element: n,
    }
}
