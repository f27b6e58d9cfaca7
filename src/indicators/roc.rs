//! # Rate of change (ROC)
//!
//! `((price / prevPrice) - 1) * 100` with `prevPrice = data[i - period]`. A zero
//! previous price yields 0 instead of an infinity.
//!
//! ## Parameters
//! - **period**: Defaults to 10, native range `1..=100000`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct RocParams {
    pub period: Option<usize>,
}

impl Default for RocParams {
    fn default() -> Self {
        Self { period: Some(10) }
    }
}

impl RocParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 10, 1, 100_000)
    }
}

#[inline]
pub fn roc_lookback(params: &RocParams) -> Result<usize, RetCode> {
    params.get_period()
}

pub fn roc_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &RocParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    let first = match first_output(start, end, period) {
        Some(idx) => idx,
        None => return Ok(NativeRange::EMPTY),
    };

    for (k, i) in (first..=end).enumerate() {
        let prev = data[i - period];
        out[k] = if prev != 0.0 {
            ((data[i] / prev) - 1.0) * 100.0
        } else {
            0.0
        };
    }

    Ok(NativeRange {
        beg_idx: first,
        nb_element: end - first + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roc_accuracy() {
        let data = [100.0, 0.0, 110.0, 50.0];
        let mut out = [0.0; 4];
        let r = roc_into(&data, 0, 3, &RocParams { period: Some(1) }, &mut out).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 1, nb_element: 3 });
        assert!((out[0] + 100.0).abs() < 1e-12);
        assert_eq!(out[1], 0.0, "zero previous price must yield 0");
        assert!((out[2] - (50.0 / 110.0 - 1.0) * 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_begins_at_lookback() {
        let data: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        let params = RocParams { period: Some(5) };
        let mut out = [0.0; 25];
        let r = roc_into(&data, 0, 24, &params, &mut out).unwrap();
        assert_eq!(r.beg_idx, roc_lookback(&params).unwrap());
        assert!((out[0] - (6.0 / 1.0 - 1.0) * 100.0).abs() < 1e-12);
    }
}
