//! # Moving average selector (MA)
//!
//! Dispatches to one of the moving averages by `optInMAType`, using the
//! native numbering. A period of 1 copies the input through unchanged.

use super::dema::dema_core;
use super::ema::ema_core;
use super::sma::sma_core;
use super::tema::tema_core;
use super::trima::trima_core;
use super::wma::wma_core;
use crate::engine::{NativeRange, RetCode};
use crate::utilities::helpers::{check_output, check_range, resolve_period};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaType {
    Sma,
    Ema,
    Wma,
    Dema,
    Tema,
    Trima,
    Kama,
    Mama,
    T3,
}

impl MaType {
    /// Value/label pairs as published in the native option list.
    pub const OPTIONS: [(i32, &'static str); 9] = [
        (0, "SMA"),
        (1, "EMA"),
        (2, "WMA"),
        (3, "DEMA"),
        (4, "TEMA"),
        (5, "TRIMA"),
        (6, "KAMA"),
        (7, "MAMA"),
        (8, "T3"),
    ];

    pub fn from_native(v: i32) -> Result<Self, RetCode> {
        Ok(match v {
            0 => MaType::Sma,
            1 => MaType::Ema,
            2 => MaType::Wma,
            3 => MaType::Dema,
            4 => MaType::Tema,
            5 => MaType::Trima,
            6 => MaType::Kama,
            7 => MaType::Mama,
            8 => MaType::T3,
            _ => return Err(RetCode::BAD_PARAM),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MaParams {
    pub period: Option<usize>,
    pub ma_type: Option<MaType>,
}

impl Default for MaParams {
    fn default() -> Self {
        Self {
            period: Some(30),
            ma_type: Some(MaType::Sma),
        }
    }
}

impl MaParams {
    pub fn get_period(&self) -> Result<usize, RetCode> {
        resolve_period(self.period, 30, 1, 100_000)
    }

    pub fn get_ma_type(&self) -> MaType {
        self.ma_type.unwrap_or(MaType::Sma)
    }
}

pub fn ma_lookback(params: &MaParams) -> Result<usize, RetCode> {
    let period = params.get_period()?;
    if period == 1 {
        return Ok(0);
    }
    let lb = period - 1;
    match params.get_ma_type() {
        MaType::Sma | MaType::Ema | MaType::Wma | MaType::Trima => Ok(lb),
        MaType::Dema => Ok(2 * lb),
        MaType::Tema => Ok(3 * lb),
        MaType::Kama | MaType::Mama | MaType::T3 => Err(RetCode::NOT_SUPPORTED),
    }
}

pub fn ma_into(
    data: &[f64],
    start: usize,
    end: usize,
    params: &MaParams,
    out: &mut [f64],
) -> Result<NativeRange, RetCode> {
    check_range(start, end, data.len())?;
    check_output(out.len(), start, end)?;
    let period = params.get_period()?;

    if period == 1 {
        let n = end - start + 1;
        out[..n].copy_from_slice(&data[start..=end]);
        return Ok(NativeRange {
            beg_idx: start,
            nb_element: n,
        });
    }

    match params.get_ma_type() {
        MaType::Sma => Ok(sma_core(data, start, end, period, out)),
        MaType::Ema => Ok(ema_core(data, start, end, period, out)),
        MaType::Wma => Ok(wma_core(data, start, end, period, out)),
        MaType::Dema => Ok(dema_core(data, start, end, period, out)),
        MaType::Tema => Ok(tema_core(data, start, end, period, out)),
        MaType::Trima => Ok(trima_core(data, start, end, period, out)),
        MaType::Kama | MaType::Mama | MaType::T3 => Err(RetCode::NOT_SUPPORTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::moving_averages::sma::{sma_into, SmaParams};

    #[test]
    fn test_ma_default_is_sma() {
        let data: Vec<f64> = (0..100).map(|i| (i % 7) as f64 + i as f64).collect();
        let mut via_ma = vec![0.0; 100];
        let mut via_sma = vec![0.0; 100];
        let params = MaParams {
            period: Some(12),
            ma_type: None,
        };
        let a = ma_into(&data, 0, 99, &params, &mut via_ma).unwrap();
        let b = sma_into(&data, 0, 99, &SmaParams { period: Some(12) }, &mut via_sma).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.beg_idx, 11);
        assert_eq!(a.nb_element, 89);
        assert_eq!(&via_ma[..a.nb_element], &via_sma[..b.nb_element]);
    }

    #[test]
    fn test_ma_period_one_copies_input() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0];
        let mut out = [0.0; 3];
        let params = MaParams {
            period: Some(1),
            ma_type: Some(MaType::Tema),
        };
        let r = ma_into(&data, 1, 3, &params, &mut out).unwrap();
        assert_eq!(r, NativeRange { beg_idx: 1, nb_element: 3 });
        assert_eq!(out, [1.0, 4.0, 1.0]);
    }

    #[test]
    fn test_ma_unsupported_types() {
        let data = vec![1.0; 50];
        let mut out = vec![0.0; 50];
        let params = MaParams {
            period: Some(10),
            ma_type: Some(MaType::Kama),
        };
        assert_eq!(ma_into(&data, 0, 49, &params, &mut out), Err(RetCode::NOT_SUPPORTED));
        assert_eq!(MaType::from_native(9), Err(RetCode::BAD_PARAM));
        assert_eq!(MaType::from_native(4), Ok(MaType::Tema));
    }

    #[test]
    fn test_ma_lookback_by_type() {
        let mut params = MaParams {
            period: Some(5),
            ma_type: Some(MaType::Dema),
        };
        assert_eq!(ma_lookback(&params), Ok(8));
        params.ma_type = Some(MaType::Tema);
        assert_eq!(ma_lookback(&params), Ok(12));
        params.period = Some(1);
        assert_eq!(ma_lookback(&params), Ok(0));
    }
}
