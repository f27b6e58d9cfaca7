//! # Median Price (MEDPRICE)
//!
//! `(high + low) / 2` for each index. No lookback.
//!
//! ## Parameters
//! *None*
//!
//! ## Errors
//! - **TA_OUT_OF_RANGE_END_INDEX**: `end` past either input, or `end < start`.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range};

pub fn medprice_into(
    high: &[f64],
    low: &[f64],
    start: usize,
    end: usize,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, high.len())?;
    check_range(start, end, low.len())?;
    check_output(out.len(), start, end)?;

    for (k, i) in (start..=end).enumerate() {
        out[k] = (high[i] + low[i]) / 2.0;
    }

    Ok(NativeRange {
        beg_idx: start,
        nb_element: end - start + 1,
    })
}
