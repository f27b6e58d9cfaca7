//! # Triangular Moving Average (TRIMA)
//!
//! Weighted mean with triangular weights `1, 2, .., peak, .., 2, 1` over
//! `period` samples. For even periods the peak weight appears twice
//! (`1, 2, 2, 1` for a period of 4).
//!
//! ## Parameters
//! - **period**: Defaults to 30, native range `2..=100000`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct TrimaParams {
    pub period: Option<usize>,
}

impl Default for TrimaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl TrimaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn trima_lookback(params: &TrimaParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn trima_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &TrimaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(trima_core(data, start, end, period, out))
}

#[inline]
fn trima_weights(period: usize) -> Vec<f64> {
    (0..period).map(|j| (j + 1).min(period - j) as f64).collect()
}

pub(crate) fn trima_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let weights = trima_weights(period);
    let norm: f64 = weights.iter().sum();

    let mut n = 0;
    for i in first..=end {
        let window = &data[i - lookback..=i];
        let acc: f64 = window.iter().zip(&weights).map(|(x, w)| x * w).sum();
        out[n] = acc / norm;
        n += 1;
    }

    NativeRange {
        beg_idx: first,
        nb_element: n,
    }
}
