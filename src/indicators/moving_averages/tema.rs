//! # Triple Exponential Moving Average (TEMA)
//!
//! `3 * e1 - 3 * e2 + e3` where `e1 = EMA(x)`, `e2 = EMA(e1)`, `e3 = EMA(e2)`.
//! Total lookback is `3 * (period - 1)`.

use super::ema::ema_core;
use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Debug, Clone)]
pub struct TemaParams {
    pub period: Option<usize>,
}

impl Default for TemaParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl TemaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn tema_lookback(params: &TemaParams) -> Result<usize, RetCode> {
    Ok(3 * (params.get_period()? - 1))
}

pub fn tema_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &TemaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(tema_core(data, start, end, period, out))
}

pub(crate) fn tema_core(data: &[f64], start: usize, end: usize, period: usize, out: &mut [f64]) -> NativeRange {
    let lb = period - 1;
    let first = match first_output(start, end, 3 * lb) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let mut e1 = vec![0.0; end - (first - 2 * lb) + 1];
    let r1 = ema_core(data, first - 2 * lb, end, period, &mut e1);
    if r1.nb_element == 0 {
        return NativeRange::EMPTY;
    }

    let mut e2 = vec![0.0; r1.nb_element];
    let r2 = ema_core(&e1[..r1.nb_element], 0, r1.nb_element - 1, period, &mut e2);
    if r2.nb_element == 0 {
        return NativeRange::EMPTY;
    }

    let mut e3 = vec![0.0; r2.nb_element];
    let r3 = ema_core(&e2[..r2.nb_element], 0, r2.nb_element - 1, period, &mut e3);

    let off1 = r2.beg_idx + r3.beg_idx;
    let off2 = r3.beg_idx;
    for i in 0..r3.nb_element {
        out[i] = 3.0 * e1[off1 + i] - 3.0 * e2[off2 + i] + e3[i];
    }

    NativeRange {
        beg_idx: r1.beg_idx + off1,
        nb_element: r3.nb_element,
    }
}
