//! # Math operators
//!
//! Element-wise vector arithmetic (`ADD`, `SUB`, `MULT`, `DIV`) over two real
//! inputs and the rolling `SUM`. The element-wise operators have no lookback.

use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, first_output, resolve_period};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VectorOp {
    Add,
    Sub,
    Mult,
    Div,
}

impl VectorOp {
    #[inline(always)]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            VectorOp::Add => a + b,
            VectorOp::Sub => a - b,
            VectorOp::Mult => a * b,
            VectorOp::Div => a / b,
        }
    }
}

/// `out[k] = op(a[start + k], b[start + k])` for every index in the range.
pub fn vector_op_into(
    op: VectorOp,
    a: &[f64],
    b: &[f64],
    start: usize,
    end: usize,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, a.len())?;
    check_range(start, end, b.len())?;
    check_output(out.len(), start, end)?;

    let mut n = 0;
    for (x, y) in a[start..=end].iter().zip(&b[start..=end]) {
        out[n] = op.apply(*x, *y);
        n += 1;
    }

    Ok(NativeRange {
        beg_idx: start,
        nb_element: n,
    })
}

#[derive(Debug, Clone)]
pub struct SumParams {
    pub period: Option<usize>,
}

impl Default for SumParams {
    fn default() -> Self {
        Self { period: Some(30) }
    }
}

impl SumParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 2, 100_000)
    }
}

#[inline]
pub fn sum_lookback(params: &SumParams) -> Result<usize, RetCode> {
    Ok(params.get_period()? - 1)
}

pub fn sum_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &SumParams,
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

    let mut sum: f64 = data[first - lookback..first].iter().sum();
    let mut n = 0;
    for i in first..=end {
        sum += data[i];
        out[n] = sum;
        sum -= data[i - lookback];
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
    fn test_vector_ops() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [4.0, 3.0, 2.0, 1.0];
        let mut out = [0.0; 3];

        let r = vector_op_into(VectorOp::Add, &a, &b, 1, 3, &mut out).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 1, nb_element: 3 });
        assert_eq!(out, [5.0, 5.0, 5.0]);

        vector_op_into(VectorOp::Sub, &a, &b, 1, 3, &mut out).unwrap();
        assert_eq!(out, [-1.0, 1.0, 3.0]);

        vector_op_into(VectorOp::Mult, &a, &b, 1, 3, &mut out).unwrap();
        assert_eq!(out, [6.0, 6.0, 4.0]);

        vector_op_into(VectorOp::Div, &a, &b, 1, 3, &mut out).unwrap();
        assert_eq!(out, [2.0 / 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_vector_op_rejects_short_second_input() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0];
        let mut out = [0.0; 3];
        let r = vector_op_into(VectorOp::Add, &a, &b, 0, 2, &mut out);
        assert_eq!(r, Err(RetCode::OUT_OF_RANGE_END_INDEX));
    }

    #[test]
    fn test_sum_rolling() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0; 5];
        let r = sum_into(&data, 0, 4, &SumParams { period: Some(2) }, &mut out).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 1, nb_element: 4 });
        assert_eq!(&out[..4], &[3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_sum_begins_at_lookback() {
        let data: Vec<f64> = (0..20).map(|x| x as f64).collect();
        let params = SumParams { period: Some(4) };
        let mut out = vec![0.0; 20];
        let r = sum_into(&data, 0, 19, &params, &mut out).unwrap();
        assert_eq!(r.beg_idx, sum_lookback(&params).unwrap());
        assert_eq!(r.nb_element, 20 - 3);
        assert_eq!(sum_lookback(&SumParams { period: Some(1) }), Err(RetCode::BAD_PARAM));
    }
}
