use std::sync::OnceLock;

use crate::engine::RetCode;
use crate::utilities::enums::Backend;

static BEST_BACKEND: OnceLock<Backend> = OnceLock::new();

/// Resolves `Backend::Auto` once per process.
#[inline(always)]
pub fn detect_best_backend() -> Backend {
    *BEST_BACKEND.get_or_init(|| {
        if cfg!(feature = "ta-lib") {
            return Backend::TaLib;
        }
        Backend::Reference
    })
}

#[inline(always)]
pub fn resolve_backend(requested: Backend) -> Backend {
    match requested {
        Backend::Auto => detect_best_backend(),
        other => other,
    }
}

/// Native-style range check: `start <= end < len`.
#[inline]
pub fn check_range(start: usize, end: usize, len: usize) -> Result<(), RetCode> {
    if end < start {
        return Err(RetCode::OUT_OF_RANGE_END_INDEX);
    }
    if end >= len {
        return Err(RetCode::OUT_OF_RANGE_END_INDEX);
    }
    Ok(())
}

/// Output buffers must hold at least `end - start + 1` values.
#[inline]
pub fn check_output(out_len: usize, start: usize, end: usize) -> Result<(), RetCode> {
    if out_len < end - start + 1 {
        return Err(RetCode::BAD_PARAM);
    }
    Ok(())
}

/// First index that can be produced once `lookback` samples are consumed,
/// or `None` when nothing in `[start, end]` is computable.
#[inline(always)]
pub fn first_output(start: usize, end: usize, lookback: usize) -> Option<usize> {
    let first = start.max(lookback);
    if first > end {
        None
    } else {
        Some(first)
    }
}

/// Applies the default and checks the native `[min, max]` range of an
/// integer time period.
#[inline]
pub fn resolve_period(value: Option<usize>, default: usize, min: usize, max: usize) -> Result<usize, RetCode> {
    let period = value.unwrap_or(default);
    if period < min || period > max {
        return Err(RetCode::BAD_PARAM);
    }
    Ok(period)
}
