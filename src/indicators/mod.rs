//! Computation kernels behind the reference engine.
//!
//! Every kernel follows the native range convention: it is handed the
//! requested `[start, end]`, skips its own lookback, writes valid values from
//! index 0 of the output and reports where they begin and how many there are.

pub mod avgprice;
pub mod math_operators;
pub mod medprice;
pub mod midpoint;
pub mod minmax;
pub mod mom;
pub mod moving_averages;
pub mod roc;
pub mod stddev;
pub mod trange;
pub mod var;
