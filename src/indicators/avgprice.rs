//! # Average Price (AVGPRICE)
//!
//! `(open + high + low + close) / 4` for each index. No lookback.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range};

pub fn avgprice_into(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start: usize,
    end: usize,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    for series in [open, high, low, close] {
        check_range(start, end, series.len())?;
    }
    check_output(out.len(), start, end)?;

    for (k, i) in (start..=end).enumerate() {
        out[k] = (open[i] + high[i] + low[i] + close[i]) / 4.0;
    }

    Ok(NativeRange {
        beg_idx: start,
        nb_element: end - start + 1,
    })
}

/// # Typical Price (TYPPRICE)
///
/// `(high + low + close) / 3` for each index. No lookback.
pub fn typprice_into(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start: usize,
    end: usize,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    for series in [high, low, close] {
        check_range(start, end, series.len())?;
    }
    check_output(out.len(), start, end)?;

    for (k, i) in (start..=end).enumerate() {
        out[k] = (high[i] + low[i] + close[i]) / 3.0;
    }

    Ok(NativeRange {
        beg_idx: start,
        nb_element: end - start + 1,
    })
}
