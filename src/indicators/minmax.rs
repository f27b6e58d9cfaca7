//! # Highest / lowest value over a period
//!
//! `MAX` and `MIN` report the extreme value of each trailing window; `MAXINDEX`
//! and `MININDEX` report its absolute index in the input. On ties the most
//! recent occurrence wins.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Extreme {
    Highest,
    Lowest,
}

#[derive(Debug, Clone)]
pub struct MinmaxParams {
    pub period: Option<usize>,
}

impl Default for MinmaxParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl MinmaxParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn minmax_lookback(params: &MinmaxParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

/// Index of the extreme in `data[i + 1 - period..=i]`, recomputed only when the
/// previous extreme leaves the window.
fn scan_extremes<F>(
    data: &[f64],
    start: usize,
    end: usize,
    period: usize,
    which: Extreme,
    mut emit: F,
) -> NativeRange
where
    F: FnMut(usize, usize),
{
    let lookback = period - 1;
    let first = match first_output(start, end, lookback) {
        Some(idx) => idx,
        None => return NativeRange::EMPTY,
    };

    let better = |candidate: f64, current: f64| match which {
        Extreme::Highest => candidate >= current,
        Extreme::Lowest => candidate <= current,
    };

    let mut best_idx: Option<usize> = None;
    let mut n = 0;
    for i in first..=end {
        let trailing = i - lookback;
        match best_idx {
            Some(b) if b >= trailing => {
                if better(data[i], data[b]) {
                    best_idx = Some(i);
                }
            }
            _ => {
                let mut b = trailing;
                for j in trailing + 1..=i {
                    if better(data[j], data[b]) {
                        b = j;
                    }
                }
                best_idx = Some(b);
            }
        }
        if let Some(b) = best_idx {
            emit(n, b);
        }
        n += 1;
    }

    NativeRange {
        beg_idx: first,
        nb_element: n,
    }
}

pub fn extreme_value_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &MinmaxParams,
    which: Extreme,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;
    Ok(scan_extremes(data, start, end, period, which, |k, idx| out[k] = data[idx]))
}

pub fn extreme_index_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &MinmaxParams,
    which: Extreme,
    out: &mut [i32],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    if end > i32::MAX as usize {
        return Err(RetCode::OUT_OF_RANGE_END_INDEX);
    }
    let period = params.get_period()?;
    Ok(scan_extremes(data, start, end, period, which, |k, idx| out[k] = idx as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_max(data: &[f64], i: usize, period: usize) -> f64 {
        data[i + 1 - period..=i].iter().cloned().fold(f64::MIN, f64::max)
    }

    #[test]
    fn test_max_matches_naive() {
        let data: Vec<f64> = (0..64).map(|i| ((i * 37) % 11) as f64 - (i as f64 * 0.7).sin()).collect();
        let params = MinmaxParams { period: Some(6) };
        let mut out = vec![0.0; data.len()];
        let r = extreme_value_into(&data, 0, 63, &params, Extreme::Highest, &mut out).unwrap();
        assert_eq!(r.beg_idx, 5);
        for k in 0..r.nb_element {
            let expected = naive_max(&data, r.beg_idx + k, 6);
            assert_eq!(out[k], expected, "MAX mismatch at index {}", k);
        }
    }

    #[test]
    fn test_min_and_index() {
        let data = [5.0, 3.0, 4.0, 3.0, 6.0, 7.0];
        let params = MinmaxParams { period: Some(3) };
        let mut vals = [0.0; 6];
        let mut idxs = [0i32; 6];
        let r = extreme_value_into(&data, 0, 5, &params, Extreme::Lowest, &mut vals).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 2, nb_element: 4 });
        assert_eq!(&vals[..4], &[3.0, 3.0, 3.0, 3.0]);

        extreme_index_into(&data, 0, 5, &params, Extreme::Lowest, &mut idxs).unwrap();
        // ties resolve to the latest index
        assert_eq!(&idxs[..4], &[1, 3, 3, 3]);

        extreme_index_into(&data, 0, 5, &params, Extreme::Highest, &mut idxs).unwrap();
        assert_eq!(&idxs[..4], &[0, 2, 4, 5]);
    }

    #[test]
    fn test_extremes_begin_at_lookback() {
        let data: Vec<f64> = (0..30).map(|i| (i as f64 * 0.3).cos()).collect();
        let params = MinmaxParams { period: Some(7) };
        let lookback = minmax_lookback(&params).unwrap();
        assert_eq!(lookback, 6);
        let mut vals = vec![0.0; 30];
        let mut idxs = vec![0i32; 30];
        let r = extreme_value_into(&data, 0, 29, &params, Extreme::Highest, &mut vals).unwrap();
        assert_eq!(r.beg_idx, lookback);
        let r = extreme_index_into(&data, 0, 29, &params, Extreme::Lowest, &mut idxs).unwrap();
        assert_eq!(r.beg_idx, lookback);
        assert_eq!(r.nb_element, 30 - lookback);
    }
}
