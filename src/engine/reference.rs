//! In-process engine publishing a TA-Lib compatible abstract table.
//!
//! Group names and their order, function names, hints, parameter names,
//! flags, defaults and ranges follow the native library so code written
//! against this engine behaves the same once linked to TA-Lib. Only a subset
//! of functions is computed; the remaining groups are listed but empty.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    func_flags, input_flags, output_flags, InputData, NativeEngine, NativeRange, OptValue, OutputBuffer,
    RawDataSet, RawFuncInfo, RawInputType, RawOutputType, RawParamInfo, RetCode,
};
use crate::indicators::avgprice::{avgprice_into, typprice_into};
use crate::indicators::math_operators::{sum_into, vector_op_into, SumParams, VectorOp};
use crate::indicators::medprice::medprice_into;
use crate::indicators::midpoint::{midpoint_into, MidpointParams};
use crate::indicators::minmax::{extreme_index_into, extreme_value_into, Extreme, MinmaxParams};
use crate::indicators::mom::{mom_into, MomParams};
use crate::indicators::moving_averages::{
    dema_into, ema_into, ma_into, sma_into, tema_into, trima_into, wma_into, DemaParams, EmaParams, MaParams,
    MaType, SmaParams, TemaParams, TrimaParams, WmaParams,
};
use crate::indicators::roc::{roc_into, RocParams};
use crate::indicators::stddev::{stddev_into, StdDevParams};
use crate::indicators::trange::trange_into;
use crate::indicators::var::{var_into, VarParams};

/// Native group enumeration order.
pub const GROUPS: [&str; 10] = [
    "Math Operators",
    "Math Transform",
    "Overlap Studies",
    "Volatility Indicators",
    "Momentum Indicators",
    "Cycle Indicators",
    "Volume Indicators",
    "Pattern Recognition",
    "Statistic Functions",
    "Price Transform",
];

const MATH_OPERATORS: usize = 0;
const OVERLAP_STUDIES: usize = 2;
const VOLATILITY_INDICATORS: usize = 3;
const MOMENTUM_INDICATORS: usize = 4;
const STATISTIC_FUNCTIONS: usize = 8;
const PRICE_TRANSFORM: usize = 9;

type Kernel = fn(&mut Frame<'_, '_>) -> Result<NativeRange, RetCode>;

struct InputDef {
    name: &'static str,
    kind: RawInputType,
    flags: u32,
}

struct OutputDef {
    name: &'static str,
    kind: RawOutputType,
    flags: u32,
}

enum OptSetDef {
    IntegerRange { min: i32, max: i32 },
    IntegerList(&'static [(i32, &'static str)]),
    RealRange { min: f64, max: f64, precision: i32 },
}

struct OptDef {
    name: &'static str,
    display_name: &'static str,
    hint: &'static str,
    flags: u32,
    default_value: f64,
    set: OptSetDef,
}

struct FuncDef {
    name: &'static str,
    group: usize,
    hint: &'static str,
    camel_case_name: &'static str,
    flags: u32,
    inputs: &'static [InputDef],
    opt_inputs: &'static [OptDef],
    outputs: &'static [OutputDef],
    kernel: Kernel,
}

const fn time_period(default_value: f64, min: i32) -> OptDef {
    OptDef {
        name: "optInTimePeriod",
        display_name: "Time Period",
        hint: "Number of period",
        flags: 0,
        default_value,
        set: OptSetDef::IntegerRange { min, max: 100_000 },
    }
}

const NB_DEV: OptDef = OptDef {
    name: "optInNbDev",
    display_name: "Deviations",
    hint: "Nb of deviations",
    flags: 0,
    default_value: 1.0,
    set: OptSetDef::RealRange {
        min: -3.0e37,
        max: 3.0e37,
        precision: 2,
    },
};

const MA_TYPE: OptDef = OptDef {
    name: "optInMAType",
    display_name: "MA Type",
    hint: "Type of Moving Average",
    flags: 0,
    default_value: 0.0,
    set: OptSetDef::IntegerList(&MaType::OPTIONS),
};

const IN_REAL: &[InputDef] = &[InputDef {
    name: "inReal",
    kind: RawInputType::Real,
    flags: 0,
}];

const IN_REAL_PAIR: &[InputDef] = &[
    InputDef {
        name: "inReal0",
        kind: RawInputType::Real,
        flags: 0,
    },
    InputDef {
        name: "inReal1",
        kind: RawInputType::Real,
        flags: 0,
    },
];

const IN_PRICE_HL: &[InputDef] = &[InputDef {
    name: "inPriceHL",
    kind: RawInputType::Price,
    flags: input_flags::PRICE_HIGH | input_flags::PRICE_LOW,
}];

const IN_PRICE_HLC: &[InputDef] = &[InputDef {
    name: "inPriceHLC",
    kind: RawInputType::Price,
    flags: input_flags::PRICE_HIGH | input_flags::PRICE_LOW | input_flags::PRICE_CLOSE,
}];

const IN_PRICE_OHLC: &[InputDef] = &[InputDef {
    name: "inPriceOHLC",
    kind: RawInputType::Price,
    flags: input_flags::PRICE_OPEN | input_flags::PRICE_HIGH | input_flags::PRICE_LOW | input_flags::PRICE_CLOSE,
}];

const OUT_REAL: &[OutputDef] = &[OutputDef {
    name: "outReal",
    kind: RawOutputType::Real,
    flags: output_flags::LINE,
}];

const OUT_INTEGER: &[OutputDef] = &[OutputDef {
    name: "outInteger",
    kind: RawOutputType::Integer,
    flags: output_flags::LINE,
}];

const PERIOD_2: &[OptDef] = &[time_period(30.0, 2)];
const PERIOD_1_DEFAULT_10: &[OptDef] = &[time_period(10.0, 1)];

/// Sorted by name, as the native function tables are.
static FUNCTIONS: &[FuncDef] = &[
    FuncDef {
        name: "ADD",
        group: MATH_OPERATORS,
        hint: "Vector Arithmetic Add",
        camel_case_name: "Add",
        flags: 0,
        inputs: IN_REAL_PAIR,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_add,
    },
    FuncDef {
        name: "AVGPRICE",
        group: PRICE_TRANSFORM,
        hint: "Average Price",
        camel_case_name: "AvgPrice",
        flags: func_flags::OVERLAP,
        inputs: IN_PRICE_OHLC,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_avgprice,
    },
    FuncDef {
        name: "DEMA",
        group: OVERLAP_STUDIES,
        hint: "Double Exponential Moving Average",
        camel_case_name: "Dema",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_dema,
    },
    FuncDef {
        name: "DIV",
        group: MATH_OPERATORS,
        hint: "Vector Arithmetic Div",
        camel_case_name: "Div",
        flags: 0,
        inputs: IN_REAL_PAIR,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_div,
    },
    FuncDef {
        name: "EMA",
        group: OVERLAP_STUDIES,
        hint: "Exponential Moving Average",
        camel_case_name: "Ema",
        flags: func_flags::OVERLAP | func_flags::UNST_PER,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_ema,
    },
    FuncDef {
        name: "MA",
        group: OVERLAP_STUDIES,
        hint: "Moving average",
        camel_case_name: "MovingAverage",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: &[time_period(30.0, 1), MA_TYPE],
        outputs: OUT_REAL,
        kernel: run_ma,
    },
    FuncDef {
        name: "MAX",
        group: MATH_OPERATORS,
        hint: "Highest value over a specified period",
        camel_case_name: "Max",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_max,
    },
    FuncDef {
        name: "MAXINDEX",
        group: MATH_OPERATORS,
        hint: "Index of highest value over a specified period",
        camel_case_name: "MaxIndex",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_INTEGER,
        kernel: run_maxindex,
    },
    FuncDef {
        name: "MEDPRICE",
        group: PRICE_TRANSFORM,
        hint: "Median Price",
        camel_case_name: "MedPrice",
        flags: func_flags::OVERLAP,
        inputs: IN_PRICE_HL,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_medprice,
    },
    FuncDef {
        name: "MIDPOINT",
        group: OVERLAP_STUDIES,
        hint: "MidPoint over period",
        camel_case_name: "MidPoint",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: &[time_period(14.0, 2)],
        outputs: OUT_REAL,
        kernel: run_midpoint,
    },
    FuncDef {
        name: "MIN",
        group: MATH_OPERATORS,
        hint: "Lowest value over a specified period",
        camel_case_name: "Min",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_min,
    },
    FuncDef {
        name: "MININDEX",
        group: MATH_OPERATORS,
        hint: "Index of lowest value over a specified period",
        camel_case_name: "MinIndex",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_INTEGER,
        kernel: run_minindex,
    },
    FuncDef {
        name: "MOM",
        group: MOMENTUM_INDICATORS,
        hint: "Momentum",
        camel_case_name: "Mom",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: PERIOD_1_DEFAULT_10,
        outputs: OUT_REAL,
        kernel: run_mom,
    },
    FuncDef {
        name: "MULT",
        group: MATH_OPERATORS,
        hint: "Vector Arithmetic Mult",
        camel_case_name: "Mult",
        flags: 0,
        inputs: IN_REAL_PAIR,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_mult,
    },
    FuncDef {
        name: "ROC",
        group: MOMENTUM_INDICATORS,
        hint: "Rate of change : ((price/prevPrice)-1)*100",
        camel_case_name: "Roc",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: PERIOD_1_DEFAULT_10,
        outputs: OUT_REAL,
        kernel: run_roc,
    },
    FuncDef {
        name: "SMA",
        group: OVERLAP_STUDIES,
        hint: "Simple Moving Average",
        camel_case_name: "Sma",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_sma,
    },
    FuncDef {
        name: "STDDEV",
        group: STATISTIC_FUNCTIONS,
        hint: "Standard Deviation",
        camel_case_name: "StdDev",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: &[time_period(5.0, 2), NB_DEV],
        outputs: OUT_REAL,
        kernel: run_stddev,
    },
    FuncDef {
        name: "SUB",
        group: MATH_OPERATORS,
        hint: "Vector Arithmetic Substraction",
        camel_case_name: "Sub",
        flags: 0,
        inputs: IN_REAL_PAIR,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_sub,
    },
    FuncDef {
        name: "SUM",
        group: MATH_OPERATORS,
        hint: "Summation",
        camel_case_name: "Sum",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_sum,
    },
    FuncDef {
        name: "TEMA",
        group: OVERLAP_STUDIES,
        hint: "Triple Exponential Moving Average",
        camel_case_name: "Tema",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_tema,
    },
    FuncDef {
        name: "TRANGE",
        group: VOLATILITY_INDICATORS,
        hint: "True Range",
        camel_case_name: "TrueRange",
        flags: 0,
        inputs: IN_PRICE_HLC,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_trange,
    },
    FuncDef {
        name: "TRIMA",
        group: OVERLAP_STUDIES,
        hint: "Triangular Moving Average",
        camel_case_name: "Trima",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_trima,
    },
    FuncDef {
        name: "TYPPRICE",
        group: PRICE_TRANSFORM,
        hint: "Typical Price",
        camel_case_name: "TypPrice",
        flags: func_flags::OVERLAP,
        inputs: IN_PRICE_HLC,
        opt_inputs: &[],
        outputs: OUT_REAL,
        kernel: run_typprice,
    },
    FuncDef {
        name: "VAR",
        group: STATISTIC_FUNCTIONS,
        hint: "Variance",
        camel_case_name: "Variance",
        flags: 0,
        inputs: IN_REAL,
        opt_inputs: &[time_period(5.0, 1), NB_DEV],
        outputs: OUT_REAL,
        kernel: run_var,
    },
    FuncDef {
        name: "WMA",
        group: OVERLAP_STUDIES,
        hint: "Weighted Moving Average",
        camel_case_name: "Wma",
        flags: func_flags::OVERLAP,
        inputs: IN_REAL,
        opt_inputs: PERIOD_2,
        outputs: OUT_REAL,
        kernel: run_wma,
    },
];

fn find(name: &str) -> Option<&'static FuncDef> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Bound arguments of one call, with typed accessors that fail the way the
/// native parameter holder does.
struct Frame<'f, 'a> {
    start: usize,
    end: usize,
    inputs: &'f [InputData<'a>],
    opts: &'f [OptValue],
    outputs: &'f mut [OutputBuffer],
}

impl<'f, 'a> Frame<'f, 'a> {
    fn real_input(&self, idx: usize) -> Result<&'a [f64], RetCode> {
        match self.inputs.get(idx) {
            Some(InputData::Real(s)) => Ok(*s),
            Some(_) => Err(RetCode::INVALID_PARAM_HOLDER_TYPE),
            None => Err(RetCode::INPUT_NOT_ALL_INITIALIZE),
        }
    }

    fn price_input(&self, idx: usize, flag: u32) -> Result<&'a [f64], RetCode> {
        let price = match self.inputs.get(idx) {
            Some(InputData::Price(p)) => *p,
            Some(_) => return Err(RetCode::INVALID_PARAM_HOLDER_TYPE),
            None => return Err(RetCode::INPUT_NOT_ALL_INITIALIZE),
        };
        price
            .components()
            .iter()
            .find(|(bit, _, _)| *bit == flag)
            .and_then(|(_, _, series)| *series)
            .ok_or(RetCode::INPUT_NOT_ALL_INITIALIZE)
    }

    fn int_opt(&self, idx: usize) -> Result<i32, RetCode> {
        match self.opts.get(idx) {
            Some(OptValue::Integer(v)) => Ok(*v),
            Some(OptValue::Real(v)) if v.fract() == 0.0 && *v >= i32::MIN as f64 && *v <= i32::MAX as f64 => {
                Ok(*v as i32)
            }
            Some(OptValue::Real(_)) => Err(RetCode::BAD_PARAM),
            None => Err(RetCode::INVALID_PARAM_HOLDER),
        }
    }

    fn period_opt(&self, idx: usize) -> Result<Option<usize>, RetCode> {
        let v = self.int_opt(idx)?;
        if v < 0 {
            return Err(RetCode::BAD_PARAM);
        }
        Ok(Some(v as usize))
    }

    fn real_opt(&self, idx: usize) -> Result<f64, RetCode> {
        self.opts
            .get(idx)
            .map(|v| v.as_f64())
            .ok_or(RetCode::INVALID_PARAM_HOLDER)
    }

    fn real_output(&mut self, idx: usize) -> Result<&mut [f64], RetCode> {
        match self.outputs.get_mut(idx) {
            Some(OutputBuffer::Real(v)) => Ok(v.as_mut_slice()),
            Some(_) => Err(RetCode::INVALID_PARAM_HOLDER_TYPE),
            None => Err(RetCode::OUTPUT_NOT_ALL_INITIALIZE),
        }
    }

    fn int_output(&mut self, idx: usize) -> Result<&mut [i32], RetCode> {
        match self.outputs.get_mut(idx) {
            Some(OutputBuffer::Integer(v)) => Ok(v.as_mut_slice()),
            Some(_) => Err(RetCode::INVALID_PARAM_HOLDER_TYPE),
            None => Err(RetCode::OUTPUT_NOT_ALL_INITIALIZE),
        }
    }
}

fn vector(f: &mut Frame<'_, '_>, op: VectorOp) -> Result<NativeRange, RetCode> {
    let a = f.real_input(0)?;
    let b = f.real_input(1)?;
    let (start, end) = (f.start, f.end);
    vector_op_into(op, a, b, start, end, f.real_output(0)?)
}

fn run_add(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    vector(f, VectorOp::Add)
}

fn run_sub(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    vector(f, VectorOp::Sub)
}

fn run_mult(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    vector(f, VectorOp::Mult)
}

fn run_div(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    vector(f, VectorOp::Div)
}

fn run_sum(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = SumParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    sum_into(data, start, end, &params, f.real_output(0)?)
}

fn extreme_value(f: &mut Frame<'_, '_>, which: Extreme) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = MinmaxParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    extreme_value_into(data, start, end, &params, which, f.real_output(0)?)
}

fn extreme_index(f: &mut Frame<'_, '_>, which: Extreme) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = MinmaxParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    extreme_index_into(data, start, end, &params, which, f.int_output(0)?)
}

fn run_max(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    extreme_value(f, Extreme::Highest)
}

fn run_min(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    extreme_value(f, Extreme::Lowest)
}

fn run_maxindex(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    extreme_index(f, Extreme::Highest)
}

fn run_minindex(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    extreme_index(f, Extreme::Lowest)
}

fn run_ma(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = MaParams {
        period: f.period_opt(0)?,
        ma_type: Some(MaType::from_native(f.int_opt(1)?)?),
    };
    let (start, end) = (f.start, f.end);
    ma_into(data, start, end, &params, f.real_output(0)?)
}

fn run_sma(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = SmaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    sma_into(data, start, end, &params, f.real_output(0)?)
}

fn run_ema(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = EmaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    ema_into(data, start, end, &params, f.real_output(0)?)
}

fn run_wma(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = WmaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    wma_into(data, start, end, &params, f.real_output(0)?)
}

fn run_dema(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = DemaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    dema_into(data, start, end, &params, f.real_output(0)?)
}

fn run_tema(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = TemaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    tema_into(data, start, end, &params, f.real_output(0)?)
}

fn run_trima(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = TrimaParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    trima_into(data, start, end, &params, f.real_output(0)?)
}

fn run_midpoint(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = MidpointParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    midpoint_into(data, start, end, &params, f.real_output(0)?)
}

fn run_mom(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = MomParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    mom_into(data, start, end, &params, f.real_output(0)?)
}

fn run_roc(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = RocParams {
        period: f.period_opt(0)?,
    };
    let (start, end) = (f.start, f.end);
    roc_into(data, start, end, &params, f.real_output(0)?)
}

fn run_stddev(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = StdDevParams {
        period: f.period_opt(0)?,
        nbdev: Some(f.real_opt(1)?),
    };
    let (start, end) = (f.start, f.end);
    stddev_into(data, start, end, &params, f.real_output(0)?)
}

fn run_var(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let data = f.real_input(0)?;
    let params = VarParams {
        period: f.period_opt(0)?,
        nbdev: Some(f.real_opt(1)?),
    };
    let (start, end) = (f.start, f.end);
    var_into(data, start, end, &params, f.real_output(0)?)
}

fn run_medprice(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let high = f.price_input(0, input_flags::PRICE_HIGH)?;
    let low = f.price_input(0, input_flags::PRICE_LOW)?;
    let (start, end) = (f.start, f.end);
    medprice_into(high, low, start, end, f.real_output(0)?)
}

fn run_typprice(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let high = f.price_input(0, input_flags::PRICE_HIGH)?;
    let low = f.price_input(0, input_flags::PRICE_LOW)?;
    let close = f.price_input(0, input_flags::PRICE_CLOSE)?;
    let (start, end) = (f.start, f.end);
    typprice_into(high, low, close, start, end, f.real_output(0)?)
}

fn run_avgprice(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let open = f.price_input(0, input_flags::PRICE_OPEN)?;
    let high = f.price_input(0, input_flags::PRICE_HIGH)?;
    let low = f.price_input(0, input_flags::PRICE_LOW)?;
    let close = f.price_input(0, input_flags::PRICE_CLOSE)?;
    let (start, end) = (f.start, f.end);
    avgprice_into(open, high, low, close, start, end, f.real_output(0)?)
}

fn run_trange(f: &mut Frame<'_, '_>) -> Result<NativeRange, RetCode> {
    let high = f.price_input(0, input_flags::PRICE_HIGH)?;
    let low = f.price_input(0, input_flags::PRICE_LOW)?;
    let close = f.price_input(0, input_flags::PRICE_CLOSE)?;
    let (start, end) = (f.start, f.end);
    trange_into(high, low, close, start, end, f.real_output(0)?)
}

impl FuncDef {
    fn to_raw(&self) -> RawFuncInfo {
        let inputs = self.inputs.iter().map(|p| RawParamInfo::Input {
            name: p.name.to_string(),
            kind: p.kind,
            flags: p.flags,
        });
        let opt_inputs = self.opt_inputs.iter().map(|p| RawParamInfo::OptInput {
            name: p.name.to_string(),
            display_name: p.display_name.to_string(),
            hint: p.hint.to_string(),
            flags: p.flags,
            default_value: p.default_value,
            data_set: match &p.set {
                OptSetDef::IntegerRange { min, max } => RawDataSet::IntegerRange { min: *min, max: *max },
                OptSetDef::IntegerList(values) => {
                    RawDataSet::IntegerList(values.iter().map(|(v, s)| (*v, s.to_string())).collect())
                }
                OptSetDef::RealRange { min, max, precision } => RawDataSet::RealRange {
                    min: *min,
                    max: *max,
                    precision: *precision,
                },
            },
        });
        let outputs = self.outputs.iter().map(|p| RawParamInfo::Output {
            name: p.name.to_string(),
            kind: p.kind,
            flags: p.flags,
        });

        RawFuncInfo {
            name: self.name.to_string(),
            group: GROUPS[self.group].to_string(),
            hint: self.hint.to_string(),
            camel_case_name: self.camel_case_name.to_string(),
            flags: self.flags,
            params: inputs.chain(opt_inputs).chain(outputs).collect(),
        }
    }
}

/// Built-in engine; see the module docs.
#[derive(Debug, Default)]
pub struct ReferenceEngine {
    initialized: AtomicBool,
}

impl ReferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialized(&self) -> Result<(), RetCode> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(RetCode::LIB_NOT_INITIALIZE)
        }
    }
}

impl NativeEngine for ReferenceEngine {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn initialize(&self) -> RetCode {
        self.initialized.store(true, Ordering::Release);
        RetCode::SUCCESS
    }

    fn shutdown(&self) -> RetCode {
        if self.initialized.swap(false, Ordering::AcqRel) {
            RetCode::SUCCESS
        } else {
            RetCode::LIB_NOT_INITIALIZE
        }
    }

    fn group_table(&self) -> Result<Vec<String>, RetCode> {
        self.ensure_initialized()?;
        Ok(GROUPS.iter().map(|g| g.to_string()).collect())
    }

    fn function_table(&self, group: &str) -> Result<Vec<String>, RetCode> {
        self.ensure_initialized()?;
        let gid = GROUPS
            .iter()
            .position(|g| *g == group)
            .ok_or(RetCode::GROUP_NOT_FOUND)?;
        Ok(FUNCTIONS
            .iter()
            .filter(|f| f.group == gid)
            .map(|f| f.name.to_string())
            .collect())
    }

    fn function_info(&self, name: &str) -> Result<RawFuncInfo, RetCode> {
        self.ensure_initialized()?;
        find(name).map(FuncDef::to_raw).ok_or(RetCode::FUNC_NOT_FOUND)
    }

    fn call(
        &self,
        name: &str,
        start: usize,
        end: usize,
        inputs: &[InputData<'_>],
        opt_values: &[OptValue],
        outputs: &mut [OutputBuffer],
    ) -> Result<NativeRange, RetCode> {
        self.ensure_initialized()?;
        let def = find(name).ok_or(RetCode::FUNC_NOT_FOUND)?;
        if inputs.len() != def.inputs.len() {
            return Err(RetCode::INPUT_NOT_ALL_INITIALIZE);
        }
        if opt_values.len() != def.opt_inputs.len() {
            return Err(RetCode::INVALID_PARAM_HOLDER);
        }
        if outputs.len() != def.outputs.len() {
            return Err(RetCode::OUTPUT_NOT_ALL_INITIALIZE);
        }
        if end < start {
            return Err(RetCode::OUT_OF_RANGE_END_INDEX);
        }

        let mut frame = Frame {
            start,
            end,
            inputs,
            opts: opt_values,
            outputs,
        };
        (def.kernel)(&mut frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PriceData;

    fn engine() -> ReferenceEngine {
        let e = ReferenceEngine::new();
        assert!(e.initialize().is_success());
        e
    }

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in FUNCTIONS.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} must sort before {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn test_uninitialized_engine_rejects_queries() {
        let e = ReferenceEngine::new();
        assert_eq!(e.group_table(), Err(RetCode::LIB_NOT_INITIALIZE));
        assert_eq!(e.shutdown(), RetCode::LIB_NOT_INITIALIZE);
    }

    #[test]
    fn test_function_table_and_unknown_group() {
        let e = engine();
        let math = e.function_table("Math Operators").unwrap();
        assert_eq!(
            math,
            vec!["ADD", "DIV", "MAX", "MAXINDEX", "MIN", "MININDEX", "MULT", "SUB", "SUM"]
        );
        assert!(e.function_table("Cycle Indicators").unwrap().is_empty());
        assert_eq!(e.function_table("Astrology"), Err(RetCode::GROUP_NOT_FOUND));
    }

    #[test]
    fn test_raw_info_orders_params_native_way() {
        let e = engine();
        let info = e.function_info("STDDEV").unwrap();
        assert_eq!(info.params.len(), 4);
        assert!(matches!(info.params[0], RawParamInfo::Input { .. }));
        assert!(matches!(info.params[1], RawParamInfo::OptInput { .. }));
        assert!(matches!(info.params[2], RawParamInfo::OptInput { .. }));
        assert!(matches!(info.params[3], RawParamInfo::Output { .. }));
        assert_eq!(e.function_info("NOPE"), Err(RetCode::FUNC_NOT_FOUND));
    }

    #[test]
    fn test_call_checks_holder_shape() {
        let e = engine();
        let data = [1.0, 2.0, 3.0];
        let mut outputs = vec![OutputBuffer::Real(vec![0.0; 3])];
        let r = e.call("SMA", 0, 2, &[InputData::Real(&data)], &[], &mut outputs);
        assert_eq!(r, Err(RetCode::INVALID_PARAM_HOLDER));

        let r = e.call(
            "SMA",
            0,
            2,
            &[InputData::Real(&data)],
            &[OptValue::Integer(2)],
            &mut outputs,
        );
        assert_eq!(r, Ok(NativeRange { beg_idx: 1, nb_element: 2 }));

        let mut wrong = vec![OutputBuffer::Integer(vec![0; 3])];
        let r = e.call("SMA", 0, 2, &[InputData::Real(&data)], &[OptValue::Integer(2)], &mut wrong);
        assert_eq!(r, Err(RetCode::INVALID_PARAM_HOLDER_TYPE));
    }

    #[test]
    fn test_call_price_input_missing_component() {
        let e = engine();
        let high = [2.0, 3.0];
        let price = PriceData {
            high: Some(&high),
            ..Default::default()
        };
        let mut outputs = vec![OutputBuffer::Real(vec![0.0; 2])];
        let r = e.call("MEDPRICE", 0, 1, &[InputData::Price(price)], &[], &mut outputs);
        assert_eq!(r, Err(RetCode::INPUT_NOT_ALL_INITIALIZE));
    }

    #[test]
    fn test_ma_type_out_of_list() {
        let e = engine();
        let data = vec![1.0; 40];
        let mut outputs = vec![OutputBuffer::Real(vec![0.0; 40])];
        let r = e.call(
            "MA",
            0,
            39,
            &[InputData::Real(&data)],
            &[OptValue::Integer(10), OptValue::Integer(42)],
            &mut outputs,
        );
        assert_eq!(r, Err(RetCode::BAD_PARAM));
    }
}
