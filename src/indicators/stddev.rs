//! # Standard Deviation (STDDEV)
//!
//! `sqrt(VAR) * nbdev`. Non-positive variances (rounding on flat windows)
//! produce 0.
//!
//! ## Parameters
//! - **period**: Defaults to 5, native range `2..=100000`.
//! - **nbdev**: Multiplier, defaults to 1.0.

use super::var::var_core;
use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, resolve_period};

#[derive(Debug, Clone)]
pub struct StdDevParams {
    pub period: Option<usize>,
    pub nbdev: Option<f64>,
}

impl Default for StdDevParams {
    fn default() -> Self {
        Self {
            period: Some(5),
            nbdev: Some(1.0),
        }
    }
}

impl StdDevParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 5, 2, 100_000)
    }

    pub fn get_nbdev(&self) -> Result<f64, RetCode> {
        let nbdev = self.nbdev.unwrap_or(1.0);
        if !nbdev.is_finite() || nbdev.abs() > 3.0e37 {
            return Err(RetCode::BAD_PARAM);
        }
        Ok(nbdev)
    }
}

#[inline]
pub fn stddev_lookback(params: &StdDevParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn stddev_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &StdDevParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    let nbdev = params.get_nbdev()?;

    let r = var_core(data, start, end, period, out);
    for v in &mut out[..r.nb_element] {
        *v = if *v > 0.0 { v.sqrt() * nbdev } else { 0.0 };
    }
    Ok(r)
}
