//! Engine backed by the TA-Lib C library through its abstract interface.
//!
//! Linking is set up by `build.rs` (`TA_LIBRARY_NAME`, `TA_LIBRARY_PATH`).
//! TA-Lib keeps its state in globals, so `TA_Initialize` / `TA_Shutdown` are
//! reference counted across every [`TaLibEngine`] in the process.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int, c_uint, c_void};
use std::ptr;
use std::sync::{Mutex, PoisonError};

use log::debug;

use super::{
    InputData, NativeEngine, NativeRange, OptValue, OutputBuffer, RawDataSet, RawFuncInfo, RawInputType,
    RawOutputType, RawParamInfo, RetCode,
};

type TaFuncHandle = c_uint;

#[repr(C)]
#[allow(dead_code)]
struct TaStringTable {
    size: c_uint,
    string: *const *const c_char,
    hidden_data: *mut c_void,
}

#[repr(C)]
#[allow(dead_code)]
struct TaFuncInfo {
    name: *const c_char,
    group: *const c_char,
    hint: *const c_char,
    camel_case_name: *const c_char,
    flags: c_int,
    nb_input: c_uint,
    nb_opt_input: c_uint,
    nb_output: c_uint,
    handle: *const TaFuncHandle,
}

#[repr(C)]
struct TaInputParameterInfo {
    kind: c_int,
    param_name: *const c_char,
    flags: c_int,
}

#[repr(C)]
#[allow(dead_code)]
struct TaOptInputParameterInfo {
    kind: c_int,
    param_name: *const c_char,
    flags: c_int,
    display_name: *const c_char,
    data_set: *const c_void,
    default_value: c_double,
    hint: *const c_char,
    help_file: *const c_char,
}

#[repr(C)]
struct TaOutputParameterInfo {
    kind: c_int,
    param_name: *const c_char,
    flags: c_int,
}

#[repr(C)]
#[allow(dead_code)]
struct TaRealRange {
    min: c_double,
    max: c_double,
    precision: c_int,
    suggested_start: c_double,
    suggested_end: c_double,
    suggested_increment: c_double,
}

#[repr(C)]
#[allow(dead_code)]
struct TaIntegerRange {
    min: c_int,
    max: c_int,
    suggested_start: c_int,
    suggested_end: c_int,
    suggested_increment: c_int,
}

#[repr(C)]
struct TaRealDataPair {
    value: c_double,
    string: *const c_char,
}

#[repr(C)]
struct TaRealList {
    data: *const TaRealDataPair,
    nb_element: c_uint,
}

#[repr(C)]
struct TaIntegerDataPair {
    value: c_int,
    string: *const c_char,
}

#[repr(C)]
struct TaIntegerList {
    data: *const TaIntegerDataPair,
    nb_element: c_uint,
}

#[repr(C)]
struct TaParamHolder {
    _private: [u8; 0],
}

const TA_INPUT_PRICE: c_int = 0;
const TA_INPUT_REAL: c_int = 1;
const TA_INPUT_INTEGER: c_int = 2;

const TA_OPT_INPUT_REAL_RANGE: c_int = 0;
const TA_OPT_INPUT_REAL_LIST: c_int = 1;
const TA_OPT_INPUT_INTEGER_RANGE: c_int = 2;
const TA_OPT_INPUT_INTEGER_LIST: c_int = 3;

const TA_OUTPUT_REAL: c_int = 0;
const TA_OUTPUT_INTEGER: c_int = 1;

extern "C" {
    fn TA_Initialize() -> c_int;
    fn TA_Shutdown() -> c_int;

    fn TA_GroupTableAlloc(table: *mut *mut TaStringTable) -> c_int;
    fn TA_GroupTableFree(table: *mut TaStringTable) -> c_int;
    fn TA_FuncTableAlloc(group: *const c_char, table: *mut *mut TaStringTable) -> c_int;
    fn TA_FuncTableFree(table: *mut TaStringTable) -> c_int;

    fn TA_GetFuncHandle(name: *const c_char, handle: *mut *const TaFuncHandle) -> c_int;
    fn TA_GetFuncInfo(handle: *const TaFuncHandle, info: *mut *const TaFuncInfo) -> c_int;
    fn TA_GetInputParameterInfo(
        handle: *const TaFuncHandle,
        idx: c_uint,
        info: *mut *const TaInputParameterInfo,
    ) -> c_int;
    fn TA_GetOptInputParameterInfo(
        handle: *const TaFuncHandle,
        idx: c_uint,
        info: *mut *const TaOptInputParameterInfo,
    ) -> c_int;
    fn TA_GetOutputParameterInfo(
        handle: *const TaFuncHandle,
        idx: c_uint,
        info: *mut *const TaOutputParameterInfo,
    ) -> c_int;

    fn TA_ParamHolderAlloc(handle: *const TaFuncHandle, params: *mut *mut TaParamHolder) -> c_int;
    fn TA_ParamHolderFree(params: *mut TaParamHolder) -> c_int;
    fn TA_SetInputParamIntegerPtr(params: *mut TaParamHolder, idx: c_uint, value: *const c_int) -> c_int;
    fn TA_SetInputParamRealPtr(params: *mut TaParamHolder, idx: c_uint, value: *const c_double) -> c_int;
    fn TA_SetInputParamPricePtr(
        params: *mut TaParamHolder,
        idx: c_uint,
        open: *const c_double,
        high: *const c_double,
        low: *const c_double,
        close: *const c_double,
        volume: *const c_double,
        open_interest: *const c_double,
    ) -> c_int;
    fn TA_SetOptInputParamInteger(params: *mut TaParamHolder, idx: c_uint, value: c_int) -> c_int;
    fn TA_SetOptInputParamReal(params: *mut TaParamHolder, idx: c_uint, value: c_double) -> c_int;
    fn TA_SetOutputParamIntegerPtr(params: *mut TaParamHolder, idx: c_uint, out: *mut c_int) -> c_int;
    fn TA_SetOutputParamRealPtr(params: *mut TaParamHolder, idx: c_uint, out: *mut c_double) -> c_int;
    fn TA_CallFunc(
        params: *const TaParamHolder,
        start: c_int,
        end: c_int,
        out_beg_idx: *mut c_int,
        out_nb_element: *mut c_int,
    ) -> c_int;
}

static INIT_COUNT: Mutex<usize> = Mutex::new(0);

#[inline]
fn status(code: c_int) -> RetCode {
    RetCode(code as u32)
}

#[inline]
fn check(code: c_int) -> Result<(), RetCode> {
    status(code).check()
}

/// Owned copy of a C string; null becomes empty.
unsafe fn owned(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

fn c_name(name: &str) -> Result<CString, RetCode> {
    CString::new(name).map_err(|_| RetCode::BAD_PARAM)
}

struct StringTable {
    raw: *mut TaStringTable,
    free: unsafe extern "C" fn(*mut TaStringTable) -> c_int,
}

impl StringTable {
    fn to_vec(&self) -> Vec<String> {
        // SAFETY: TA-Lib guarantees `size` valid entries while the table is alive.
        unsafe {
            let table = &*self.raw;
            (0..table.size as usize).map(|i| owned(*table.string.add(i))).collect()
        }
    }
}

impl Drop for StringTable {
    fn drop(&mut self) {
        unsafe {
            (self.free)(self.raw);
        }
    }
}

struct ParamHolder(*mut TaParamHolder);

impl Drop for ParamHolder {
    fn drop(&mut self) {
        unsafe {
            TA_ParamHolderFree(self.0);
        }
    }
}

fn handle_of(name: &str) -> Result<*const TaFuncHandle, RetCode> {
    let c = c_name(name)?;
    let mut handle: *const TaFuncHandle = ptr::null();
    check(unsafe { TA_GetFuncHandle(c.as_ptr(), &mut handle) })?;
    Ok(handle)
}

unsafe fn data_set(kind: c_int, raw: *const c_void) -> Result<RawDataSet, RetCode> {
    if raw.is_null() {
        return Err(RetCode::INTERNAL_ERROR);
    }
    Ok(match kind {
        TA_OPT_INPUT_REAL_RANGE => {
            let r = &*(raw as *const TaRealRange);
            RawDataSet::RealRange {
                min: r.min,
                max: r.max,
                precision: r.precision,
            }
        }
        TA_OPT_INPUT_INTEGER_RANGE => {
            let r = &*(raw as *const TaIntegerRange);
            RawDataSet::IntegerRange { min: r.min, max: r.max }
        }
        TA_OPT_INPUT_REAL_LIST => {
            let l = &*(raw as *const TaRealList);
            RawDataSet::RealList(
                (0..l.nb_element as usize)
                    .map(|i| {
                        let pair = &*l.data.add(i);
                        (pair.value, owned(pair.string))
                    })
                    .collect(),
            )
        }
        TA_OPT_INPUT_INTEGER_LIST => {
            let l = &*(raw as *const TaIntegerList);
            RawDataSet::IntegerList(
                (0..l.nb_element as usize)
                    .map(|i| {
                        let pair = &*l.data.add(i);
                        (pair.value, owned(pair.string))
                    })
                    .collect(),
            )
        }
        _ => return Err(RetCode::INVALID_LIST_TYPE),
    })
}

/// Engine over the linked TA-Lib.
#[derive(Debug, Default)]
pub struct TaLibEngine {
    _private: (),
}

impl TaLibEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NativeEngine for TaLibEngine {
    fn name(&self) -> &'static str {
        "ta-lib"
    }

    fn initialize(&self) -> RetCode {
        let mut count = INIT_COUNT.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            let rc = status(unsafe { TA_Initialize() });
            if !rc.is_success() {
                return rc;
            }
            debug!("TA_Initialize done");
        }
        *count += 1;
        RetCode::SUCCESS
    }

    fn shutdown(&self) -> RetCode {
        let mut count = INIT_COUNT.lock().unwrap_or_else(PoisonError::into_inner);
        match *count {
            0 => RetCode::LIB_NOT_INITIALIZE,
            1 => {
                *count = 0;
                debug!("last handle released, calling TA_Shutdown");
                status(unsafe { TA_Shutdown() })
            }
            _ => {
                *count -= 1;
                RetCode::SUCCESS
            }
        }
    }

    fn group_table(&self) -> Result<Vec<String>, RetCode> {
        let mut raw = ptr::null_mut();
        check(unsafe { TA_GroupTableAlloc(&mut raw) })?;
        let table = StringTable {
            raw,
            free: TA_GroupTableFree,
        };
        Ok(table.to_vec())
    }

    fn function_table(&self, group: &str) -> Result<Vec<String>, RetCode> {
        let c = c_name(group)?;
        let mut raw = ptr::null_mut();
        check(unsafe { TA_FuncTableAlloc(c.as_ptr(), &mut raw) })?;
        let table = StringTable {
            raw,
            free: TA_FuncTableFree,
        };
        Ok(table.to_vec())
    }

    fn function_info(&self, name: &str) -> Result<RawFuncInfo, RetCode> {
        let handle = handle_of(name)?;
        let mut info: *const TaFuncInfo = ptr::null();
        check(unsafe { TA_GetFuncInfo(handle, &mut info) })?;

        // SAFETY: the records below are static tables inside TA-Lib.
        unsafe {
            let info = &*info;
            let mut params = Vec::with_capacity((info.nb_input + info.nb_opt_input + info.nb_output) as usize);

            for idx in 0..info.nb_input {
                let mut p: *const TaInputParameterInfo = ptr::null();
                check(TA_GetInputParameterInfo(handle, idx, &mut p))?;
                let p = &*p;
                let kind = match p.kind {
                    TA_INPUT_PRICE => RawInputType::Price,
                    TA_INPUT_REAL => RawInputType::Real,
                    TA_INPUT_INTEGER => RawInputType::Integer,
                    _ => return Err(RetCode::INTERNAL_ERROR),
                };
                params.push(RawParamInfo::Input {
                    name: owned(p.param_name),
                    kind,
                    flags: p.flags as u32,
                });
            }

            for idx in 0..info.nb_opt_input {
                let mut p: *const TaOptInputParameterInfo = ptr::null();
                check(TA_GetOptInputParameterInfo(handle, idx, &mut p))?;
                let p = &*p;
                params.push(RawParamInfo::OptInput {
                    name: owned(p.param_name),
                    display_name: owned(p.display_name),
                    hint: owned(p.hint),
                    flags: p.flags as u32,
                    default_value: p.default_value,
                    data_set: data_set(p.kind, p.data_set)?,
                });
            }

            for idx in 0..info.nb_output {
                let mut p: *const TaOutputParameterInfo = ptr::null();
                check(TA_GetOutputParameterInfo(handle, idx, &mut p))?;
                let p = &*p;
                let kind = match p.kind {
                    TA_OUTPUT_REAL => RawOutputType::Real,
                    TA_OUTPUT_INTEGER => RawOutputType::Integer,
                    _ => return Err(RetCode::INTERNAL_ERROR),
                };
                params.push(RawParamInfo::Output {
                    name: owned(p.param_name),
                    kind,
                    flags: p.flags as u32,
                });
            }

            Ok(RawFuncInfo {
                name: owned(info.name),
                group: owned(info.group),
                hint: owned(info.hint),
                camel_case_name: owned(info.camel_case_name),
                flags: info.flags as u32,
                params,
            })
        }
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
        let start = c_int::try_from(start).map_err(|_| RetCode::OUT_OF_RANGE_START_INDEX)?;
        let end = c_int::try_from(end).map_err(|_| RetCode::OUT_OF_RANGE_END_INDEX)?;
        let handle = handle_of(name)?;

        let mut raw = ptr::null_mut();
        check(unsafe { TA_ParamHolderAlloc(handle, &mut raw) })?;
        let holder = ParamHolder(raw);

        // Every pointer handed over below outlives `holder`, which is
        // dropped before this function returns.
        unsafe {
            for (idx, input) in inputs.iter().enumerate() {
                let idx = idx as c_uint;
                let rc = match input {
                    InputData::Real(s) => TA_SetInputParamRealPtr(holder.0, idx, s.as_ptr()),
                    InputData::Integer(s) => TA_SetInputParamIntegerPtr(holder.0, idx, s.as_ptr()),
                    InputData::Price(p) => {
                        let ptr_of = |s: Option<&[f64]>| s.map_or(ptr::null(), |s| s.as_ptr());
                        TA_SetInputParamPricePtr(
                            holder.0,
                            idx,
                            ptr_of(p.open),
                            ptr_of(p.high),
                            ptr_of(p.low),
                            ptr_of(p.close),
                            ptr_of(p.volume),
                            ptr_of(p.open_interest),
                        )
                    }
                };
                check(rc)?;
            }

            for (idx, value) in opt_values.iter().enumerate() {
                let idx = idx as c_uint;
                let rc = match *value {
                    OptValue::Integer(v) => TA_SetOptInputParamInteger(holder.0, idx, v),
                    OptValue::Real(v) => TA_SetOptInputParamReal(holder.0, idx, v),
                };
                check(rc)?;
            }

            for (idx, out) in outputs.iter_mut().enumerate() {
                let idx = idx as c_uint;
                let rc = match out {
                    OutputBuffer::Real(v) => TA_SetOutputParamRealPtr(holder.0, idx, v.as_mut_ptr()),
                    OutputBuffer::Integer(v) => TA_SetOutputParamIntegerPtr(holder.0, idx, v.as_mut_ptr()),
                };
                check(rc)?;
            }

            let mut beg: c_int = 0;
            let mut nb: c_int = 0;
            check(TA_CallFunc(holder.0, start, end, &mut beg, &mut nb))?;
            Ok(NativeRange {
                beg_idx: beg.max(0) as usize,
                nb_element: nb.max(0) as usize,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_catalog_matches_abstract_table() {
        let engine = TaLibEngine::new();
        assert!(engine.initialize().is_success());
        let groups = engine.group_table().unwrap();
        assert_eq!(groups[0], "Math Operators");
        let info = engine.function_info("MA").unwrap();
        assert_eq!(info.group, "Overlap Studies");
        assert_eq!(info.hint, "Moving average");
        assert_eq!(engine.function_info("NOPE"), Err(RetCode::FUNC_NOT_FOUND));
        assert!(engine.shutdown().is_success());
    }
}
