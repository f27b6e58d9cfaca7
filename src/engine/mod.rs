//! # Native engine boundary
//!
//! The reflective half of TA-Lib is a read-only metadata table keyed by
//! function name plus one generic call entry point. [`NativeEngine`] is that
//! boundary; everything above it (catalog, descriptors, invocation) is written
//! against the trait and never against a concrete backend.
//!
//! Status codes travel as [`RetCode`], numbered exactly like `TA_RetCode`.

pub mod reference;
#[cfg(feature = "ta-lib")]
pub mod ta_lib;

use std::fmt;

use serde::Serialize;

/// Native status code (`TA_RetCode`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RetCode(pub u32);

impl RetCode {
    pub const SUCCESS: RetCode = RetCode(0);
    pub const LIB_NOT_INITIALIZE: RetCode = RetCode(1);
    pub const BAD_PARAM: RetCode = RetCode(2);
    pub const ALLOC_ERR: RetCode = RetCode(3);
    pub const GROUP_NOT_FOUND: RetCode = RetCode(4);
    pub const FUNC_NOT_FOUND: RetCode = RetCode(5);
    pub const INVALID_HANDLE: RetCode = RetCode(6);
    pub const INVALID_PARAM_HOLDER: RetCode = RetCode(7);
    pub const INVALID_PARAM_HOLDER_TYPE: RetCode = RetCode(8);
    pub const INVALID_PARAM_FUNCTION: RetCode = RetCode(9);
    pub const INPUT_NOT_ALL_INITIALIZE: RetCode = RetCode(10);
    pub const OUTPUT_NOT_ALL_INITIALIZE: RetCode = RetCode(11);
    pub const OUT_OF_RANGE_START_INDEX: RetCode = RetCode(12);
    pub const OUT_OF_RANGE_END_INDEX: RetCode = RetCode(13);
    pub const INVALID_LIST_TYPE: RetCode = RetCode(14);
    pub const BAD_OBJECT: RetCode = RetCode(15);
    pub const NOT_SUPPORTED: RetCode = RetCode(16);
    pub const INTERNAL_ERROR: RetCode = RetCode(5000);
    pub const UNKNOWN_ERR: RetCode = RetCode(0xFFFF);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Turns a raw status into `Ok(())` or `Err(self)`.
    #[inline]
    pub fn check(self) -> Result<(), RetCode> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "TA_SUCCESS",
            1 => "TA_LIB_NOT_INITIALIZE",
            2 => "TA_BAD_PARAM",
            3 => "TA_ALLOC_ERR",
            4 => "TA_GROUP_NOT_FOUND",
            5 => "TA_FUNC_NOT_FOUND",
            6 => "TA_INVALID_HANDLE",
            7 => "TA_INVALID_PARAM_HOLDER",
            8 => "TA_INVALID_PARAM_HOLDER_TYPE",
            9 => "TA_INVALID_PARAM_FUNCTION",
            10 => "TA_INPUT_NOT_ALL_INITIALIZE",
            11 => "TA_OUTPUT_NOT_ALL_INITIALIZE",
            12 => "TA_OUT_OF_RANGE_START_INDEX",
            13 => "TA_OUT_OF_RANGE_END_INDEX",
            14 => "TA_INVALID_LIST_TYPE",
            15 => "TA_BAD_OBJECT",
            16 => "TA_NOT_SUPPORTED",
            5000..=5999 => "TA_INTERNAL_ERROR",
            _ => "TA_UNKNOWN_ERR",
        }
    }
}

impl fmt::Display for RetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// Input flag bits (`TA_InputFlags`).
pub mod input_flags {
    pub const PRICE_OPEN: u32 = 0x0000_0001;
    pub const PRICE_HIGH: u32 = 0x0000_0002;
    pub const PRICE_LOW: u32 = 0x0000_0004;
    pub const PRICE_CLOSE: u32 = 0x0000_0008;
    pub const PRICE_VOLUME: u32 = 0x0000_0010;
    pub const PRICE_OPENINTEREST: u32 = 0x0000_0020;
    pub const PRICE_TIMESTAMP: u32 = 0x0000_0040;
}

/// Optional input flag bits (`TA_OptInputFlags`).
pub mod opt_input_flags {
    pub const IS_PERCENT: u32 = 0x0010_0000;
    pub const IS_DEGREE: u32 = 0x0020_0000;
    pub const IS_CURRENCY: u32 = 0x0040_0000;
    pub const ADVANCED: u32 = 0x0100_0000;
}

/// Output flag bits (`TA_OutputFlags`).
pub mod output_flags {
    pub const LINE: u32 = 0x0000_0001;
    pub const DOT_LINE: u32 = 0x0000_0002;
    pub const DASH_LINE: u32 = 0x0000_0004;
    pub const DOT: u32 = 0x0000_0008;
    pub const HISTO: u32 = 0x0000_0010;
    pub const PATTERN_BOOL: u32 = 0x0000_0020;
    pub const PATTERN_BULL_BEAR: u32 = 0x0000_0040;
    pub const PATTERN_STRENGTH: u32 = 0x0000_0080;
    pub const POSITIVE: u32 = 0x0000_0100;
    pub const NEGATIVE: u32 = 0x0000_0200;
    pub const ZERO: u32 = 0x0000_0400;
    pub const UPPER_LIMIT: u32 = 0x0000_0800;
    pub const LOWER_LIMIT: u32 = 0x0000_1000;
}

/// Function flag bits (`TA_FuncFlags`).
pub mod func_flags {
    pub const OVERLAP: u32 = 0x0100_0000;
    pub const VOLUME: u32 = 0x0400_0000;
    pub const UNST_PER: u32 = 0x0800_0000;
    pub const CANDLESTICK: u32 = 0x1000_0000;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RawInputType {
    Price,
    Real,
    Integer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RawOutputType {
    Real,
    Integer,
}

/// The `dataSet` an optional input points at.
#[derive(Clone, Debug, PartialEq)]
pub enum RawDataSet {
    RealRange { min: f64, max: f64, precision: i32 },
    RealList(Vec<(f64, String)>),
    IntegerRange { min: i32, max: i32 },
    IntegerList(Vec<(i32, String)>),
}

/// One entry of a function's native parameter table.
#[derive(Clone, Debug, PartialEq)]
pub enum RawParamInfo {
    Input {
        name: String,
        kind: RawInputType,
        flags: u32,
    },
    OptInput {
        name: String,
        display_name: String,
        hint: String,
        flags: u32,
        default_value: f64,
        data_set: RawDataSet,
    },
    Output {
        name: String,
        kind: RawOutputType,
        flags: u32,
    },
}

/// The native metadata record for one function (`TA_FuncInfo` plus its
/// parameter table flattened in native order).
#[derive(Clone, Debug, PartialEq)]
pub struct RawFuncInfo {
    pub name: String,
    pub group: String,
    pub hint: String,
    pub camel_case_name: String,
    pub flags: u32,
    pub params: Vec<RawParamInfo>,
}

/// One value of the flat optional-parameter list handed to [`NativeEngine::call`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptValue {
    Integer(i32),
    Real(f64),
}

impl OptValue {
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            OptValue::Integer(v) => v as f64,
            OptValue::Real(v) => v,
        }
    }
}

impl From<i32> for OptValue {
    fn from(v: i32) -> Self {
        OptValue::Integer(v)
    }
}

impl From<f64> for OptValue {
    fn from(v: f64) -> Self {
        OptValue::Real(v)
    }
}

impl fmt::Display for OptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptValue::Integer(v) => write!(f, "{v}"),
            OptValue::Real(v) => write!(f, "{v}"),
        }
    }
}

/// Price components bound to one `Price` input.
#[derive(Copy, Clone, Debug, Default)]
pub struct PriceData<'a> {
    pub open: Option<&'a [f64]>,
    pub high: Option<&'a [f64]>,
    pub low: Option<&'a [f64]>,
    pub close: Option<&'a [f64]>,
    pub volume: Option<&'a [f64]>,
    pub open_interest: Option<&'a [f64]>,
}

impl<'a> PriceData<'a> {
    pub fn hl(high: &'a [f64], low: &'a [f64]) -> Self {
        Self {
            high: Some(high),
            low: Some(low),
            ..Self::default()
        }
    }

    pub fn hlc(high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self {
            high: Some(high),
            low: Some(low),
            close: Some(close),
            ..Self::default()
        }
    }

    pub fn ohlc(open: &'a [f64], high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self {
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            ..Self::default()
        }
    }

    /// Components paired with the input flag bit that requests them.
    pub fn components(&self) -> [(u32, &'static str, Option<&'a [f64]>); 6] {
        [
            (input_flags::PRICE_OPEN, "open", self.open),
            (input_flags::PRICE_HIGH, "high", self.high),
            (input_flags::PRICE_LOW, "low", self.low),
            (input_flags::PRICE_CLOSE, "close", self.close),
            (input_flags::PRICE_VOLUME, "volume", self.volume),
            (input_flags::PRICE_OPENINTEREST, "open_interest", self.open_interest),
        ]
    }
}

/// One caller-supplied input buffer.
#[derive(Copy, Clone, Debug)]
pub enum InputData<'a> {
    Real(&'a [f64]),
    Integer(&'a [i32]),
    Price(PriceData<'a>),
}

impl<'a> InputData<'a> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            InputData::Real(_) => "Real",
            InputData::Integer(_) => "Integer",
            InputData::Price(_) => "Price",
        }
    }
}

impl<'a> From<&'a [f64]> for InputData<'a> {
    fn from(s: &'a [f64]) -> Self {
        InputData::Real(s)
    }
}

impl<'a> From<&'a Vec<f64>> for InputData<'a> {
    fn from(v: &'a Vec<f64>) -> Self {
        InputData::Real(v.as_slice())
    }
}

impl<'a> From<&'a [i32]> for InputData<'a> {
    fn from(s: &'a [i32]) -> Self {
        InputData::Integer(s)
    }
}

impl<'a> From<PriceData<'a>> for InputData<'a> {
    fn from(p: PriceData<'a>) -> Self {
        InputData::Price(p)
    }
}

/// One output buffer, typed after its output description.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputBuffer {
    Real(Vec<f64>),
    Integer(Vec<i32>),
}

impl OutputBuffer {
    pub fn len(&self) -> usize {
        match self {
            OutputBuffer::Real(v) => v.len(),
            OutputBuffer::Integer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            OutputBuffer::Real(v) => v.truncate(len),
            OutputBuffer::Integer(v) => v.truncate(len),
        }
    }
}

/// `outBegIdx` / `outNBElement` as reported by the native routine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeRange {
    pub beg_idx: usize,
    pub nb_element: usize,
}

impl NativeRange {
    pub const EMPTY: NativeRange = NativeRange {
        beg_idx: 0,
        nb_element: 0,
    };
}

/// Reflective metadata table plus generic call entry point of a native
/// technical-analysis library.
///
/// Implementations must be callable from several threads at once between a
/// successful [`initialize`](NativeEngine::initialize) and
/// [`shutdown`](NativeEngine::shutdown).
pub trait NativeEngine: Send + Sync {
    /// Short backend name used in log lines.
    fn name(&self) -> &'static str;

    fn initialize(&self) -> RetCode;

    fn shutdown(&self) -> RetCode;

    fn group_table(&self) -> Result<Vec<String>, RetCode>;

    /// `TA_GROUP_NOT_FOUND` for a group the engine does not know.
    fn function_table(&self, group: &str) -> Result<Vec<String>, RetCode>;

    /// `TA_FUNC_NOT_FOUND` for a name the engine does not know.
    fn function_info(&self, name: &str) -> Result<RawFuncInfo, RetCode>;

    /// Runs `name` over `[start, end]`.
    ///
    /// `opt_values` is the flat optional-parameter list in native order, one
    /// value per optional input. `outputs` holds one pre-sized buffer per
    /// output parameter; results are written from index 0.
    fn call(
        &self,
        name: &str,
        start: usize,
        end: usize,
        inputs: &[InputData<'_>],
        opt_values: &[OptValue],
        outputs: &mut [OutputBuffer],
    ) -> Result<NativeRange, RetCode>;
}
