//! # Exponential Moving Average (EMA)
//!
//! Seeded with the simple average of the first `period` values ending at the
//! first output index, then `ema = (x - ema) * k + ema` with
//! `k = 2 / (period + 1)`. Because the seed sits at the first output, values
//! depend on where the requested range starts.
//!
//! ## Parameters
//! - **period**: Defaults to 30, native range `2..=100000`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct EmaParams {
    pub period: Option<usize>,
}

impl Default for EmaParams {
    fn default() -> Self {
        EmaParams { period: Some(30) }
    }
}

impl EmaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn ema_lookback(params: &EmaParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

#[inline]
pub fn ema_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &EmaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(ema_core(data, start, end, period, out))
}

pub(crate) fn ema_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let k = 2.0 / (period as f64 + 1.0);
    let seed_start = first - lookback;
    let mut last_ema = data[seed_start..=first].iter().sum::<f64>() / period as f64;
    out[0] = last_ema;

    let mut n = 1;
    for &x in &data[first + 1..=end] {
        last_ema = (x - last_ema) * k + last_ema;
        out[n] = last_ema;
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
    fn test_ema_accuracy() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let params = EmaParams { period: Some(3) };
        let mut out = vec![0.0; data.len()];
        let range = ema_into(&data, 0, 5, &params, &mut out).expect("Failed to calculate EMA");

        assert_eq!(range.beg_idx, 2);
        assert_eq!(range.nb_element, 4);
        // seed = mean(1, 2, 3) = 2, k = 0.5
        let expected = [2.0, 3.0, 4.0, 5.0];
        for (i, &value) in out[..range.nb_element].iter().enumerate() {
            assert!(
                (value - expected[i]).abs() < 1e-12,
                "EMA value mismatch at index {}: expected {}, got {}",
                i,
                expected[i],
                value
            );
        }
    }

    #[test]
    fn test_ema_constant_series() {
        let data = vec![7.5; 50];
        let mut out = vec![0.0; 50];
        let range = ema_into(&data, 0, 49, &EmaParams::default(), &mut out).unwrap();
        assert_eq!(range.beg_idx, 29);
        assert!(out[..range.nb_element].iter().all(|v| (v - 7.5).abs() < 1e-12));
    }
}
