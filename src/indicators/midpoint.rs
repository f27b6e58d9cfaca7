//! # MidPoint over period (MIDPOINT)
//!
//! `(highest + lowest) / 2` of the trailing `period` values.
//!
//! ## Parameters
//! - **period**: Defaults to 14, native range `2..=100000`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct MidpointParams {
    pub period: Option<usize>,
}

impl Default for MidpointParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

impl MidpointParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 14, 2, 100_000)
    }
}

#[inline]
pub fn midpoint_lookback(params: &MidpointParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn midpoint_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &MidpointParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return Ok(NativeRange::EMPTY),
    };

    let mut n = 0;
    for i in first..=end {
        let window = &data[i - lookback..=i];
        let (lo, hi) = window
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
        out[n] = (hi + lo) / 2.0;
        n += 1;
    }

    Ok(NativeRange {
        beg_idx: first,
        nb_element: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_accuracy() {
        let data = [1.0, 9.0, 4.0, 2.0, 8.0];
        let mut out = [0.0; 5];
        let r = midpoint_into(&data, 0, 4, &MidpointParams { period: Some(3) }, &mut out).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 2, nb_element: 3 });
        assert_eq!(&out[..3], &[5.0, 5.5, 5.0]);
    }

    #[test]
    fn test_midpoint_default_period() {
        assert_eq!(midpoint_lookback(&MidpointParams::default()), Ok(13));
    }
}
