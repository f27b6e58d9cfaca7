//! Reflective access to a technical-analysis function library.
//!
//! The crate exposes the "abstract interface" of TA-Lib: enumerate function
//! groups and functions, obtain a structured [`FunctionDescriptor`] for any
//! function by name, and run any function through one uniform call that
//! returns its output buffers together with the valid computed sub-range.
//!
//! All of it hangs off a [`TaLibrary`] handle. The engine behind the handle is
//! either the linked TA-Lib (feature `ta-lib`) or the built-in reference
//! engine, chosen through [`EngineConfig`].
#![allow(clippy::needless_range_loop)]

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod invoke;
pub mod library;
pub mod utilities;

pub mod bindings {
    #[cfg(feature = "python")]
    pub mod python;
}

pub use config::EngineConfig;
pub use descriptor::{
    FunctionDescriptor, OptionalKind, OptionalParameterDescription, ParameterDescription, ParameterType,
};
pub use engine::{InputData, NativeEngine, OptValue, OutputBuffer, PriceData, RetCode};
pub use error::AbstractError;
pub use invoke::{Invocation, InvocationResult};
pub use library::TaLibrary;
pub use utilities::enums::Backend;
