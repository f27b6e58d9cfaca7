//! # Double Exponential Moving Average (DEMA)
//!
//! `2 * EMA(x) - EMA(EMA(x))`. The inner EMA starts `period - 1` samples before
//! the requested start so the outer EMA can seed on it; total lookback is
//! `2 * (period - 1)`.
//!
//! ## Parameters
//! - **period**: Defaults to 30, native range `2..=100000`.

use super::ema::ema_core;
use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct DemaParams {
    pub period: Option<usize>,
}

impl Default for DemaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl DemaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn dema_lookback(params: &DemaParams) -> Result<usize, RetCode> {
    Ok(2 * (params.get_period()? - 1))
}

pub fn dema_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &DemaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(dema_core(data, start, end, period, out))
}

pub(crate) fn dema_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lb = period - 1;
    let first = match first_output(start, end, 2 * lb) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let mut first_ema = vec![0.0; end - (first - lb) + 1];
    let r1 = ema_core(data, first - lb, end, period, &mut first_ema);
    if r1.nb_element == 0 {
        return NativeRange::EMPTY;
    }

    let mut second_ema = vec![0.0; r1.nb_element];
    let r2 = ema_core(&first_ema[..r1.nb_element], 0, r1.nb_element - 1, period, &mut second_ema);

    for i in 0..r2.nb_element {
        out[i] = 2.0 * first_ema[r2.beg_idx + i] - second_ema[i];
    }

    NativeRange {
        beg_idx: r1.beg_idx + r2.beg_idx,
        nb_element: r2.nb_element,
    }
}
