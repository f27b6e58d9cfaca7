//! # True Range (TRANGE)
//!
//! Greatest of `high - low`, `|high - prev_close|` and `|low - prev_close|`.
//! Needs the previous close, so the lookback is 1.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output};

pub const TRANGE_LOOKBACK: usize = 1;

pub fn trange_into(
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
    let first = match first_output(start, end, TRANGE_LOOKBACK) {
        Some(idx) => idx,
        None => return Ok(NativeRange::EMPTY),
    };

    for (k, i) in (first..=end).enumerate() {
        let prev_close = close[i - 1];
        let mut greatest = high[i] - low[i];
        let up = (prev_close - high[i]).abs();
        if up > greatest {
            greatest = up;
        }
        let down = (prev_close - low[i]).abs();
        if down > greatest {
            greatest = down;
        }
        out[k] = greatest;
    }

    Ok(NativeRange {
        beg_idx: first,
        nb_element: end - first + 1,
    })
}
