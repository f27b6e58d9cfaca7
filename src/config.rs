//! Engine selection.
//!
//! `TA_ABSTRACT_BACKEND` accepts `auto`, `reference` or `ta-lib`. `auto`
//! picks the linked TA-Lib when the crate is built with the `ta-lib` feature
//! and the in-process reference engine otherwise.

use std::env;
use std::sync::Arc;

use log::debug;

use crate::engine::reference::ReferenceEngine;
use crate::engine::NativeEngine;
use crate::error::{AbstractError, Result};
use crate::utilities::enums::Backend;
use crate::utilities::helpers::resolve_backend;

pub const BACKEND_ENV: &str = "TA_ABSTRACT_BACKEND";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub backend: Backend,
}

impl EngineConfig {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Reads the backend from the environment; unset means `Auto`.
    pub fn from_env() -> Result<Self> {
        match env::var(BACKEND_ENV) {
            Ok(raw) => {
                let backend = raw
                    .parse::<Backend>()
                    .map_err(|e| AbstractError::Initialization(format!("{BACKEND_ENV}: {e}")))?;
                Ok(Self { backend })
            }
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(AbstractError::Initialization(format!("{BACKEND_ENV}: {e}"))),
        }
    }

    /// Builds the engine for the resolved backend. Nothing is initialized yet.
    pub fn build_engine(&self) -> Result<Arc<dyn NativeEngine>> {
        let chosen = resolve_backend(self.backend);
        debug!("engine backend requested={} resolved={}", self.backend, chosen);
        match chosen {
            Backend::TaLib => native_engine(),
            Backend::Reference | Backend::Auto => Ok(Arc::new(ReferenceEngine::new())),
        }
    }
}

#[cfg(feature = "ta-lib")]
fn native_engine() -> Result<Arc<dyn NativeEngine>> {
    Ok(Arc::new(crate::engine::ta_lib::TaLibEngine::new()))
}

#[cfg(not(feature = "ta-lib"))]
fn native_engine() -> Result<Arc<dyn NativeEngine>> {
    Err(AbstractError::Initialization(
        "backend 'ta-lib' requested but the crate was built without the `ta-lib` feature".to_string(),
    ))
}
