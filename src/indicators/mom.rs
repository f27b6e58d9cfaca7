//! # Momentum (MOM)
//!
//! `momentum[i] = data[i] - data[i - period]`.
//!
//! ## Parameters
//! - **period**: Defaults to 10, native range `1..=100000`. The lookback equals
//!   the period.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct MomParams {
    pub period: Option<usize>,
}

impl Default for MomParams {
    fn default() -> Self {
        Self { period: Some(10) }
    }
}

impl MomParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 10, 1, 100_000)
    }
}

#[inline]
pub fn mom_lookback(params: &MomParams) -> Result<usize, RetCode> {
    params.get_period()
}

pub fn mom_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &MomParams,
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
        out[k] = data[i] - data[i - period];
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
    fn test_mom_accuracy() {
        let data = [10.0, 11.0, 13.0, 12.0, 15.0];
        let mut out = [0.0; 5];
        let r = mom_into(&data, 0, 4, &MomParams { period: Some(2) }, &mut out).expect("Failed to calculate MOM");
        assert_eq!(r, NativeRange { beg_idx: 2, nb_element: 3 });
        assert_eq!(&out[..3], &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_mom_zero_period() {
        let data = [1.0, 2.0];
        let mut out = [0.0; 2];
        let r = mom_into(&data, 0, 1, &MomParams { period: Some(0) }, &mut out);
        assert_eq!(r, Err(RetCode::BAD_PARAM));
    }

    #[test]
    fn test_mom_begins_at_lookback() {
        let data: Vec<f64> = (0..25).map(|x| (x * x) as f64).collect();
        let params = MomParams::default();
        let mut out = [0.0; 25];
        let r = mom_into(&data, 0, 24, &params, &mut out).unwrap();
        assert_eq!(mom_lookback(&params), Ok(10));
        assert_eq!(r.beg_idx, 10);
        assert_eq!(r.nb_element, 15);
    }
}
