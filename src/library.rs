//! # Library handle
//!
//! [`TaLibrary`] owns one engine from successful initialization until
//! [`finalize`](TaLibrary::finalize). Every catalog, descriptor and invocation
//! call goes through a handle, so no query can reach an engine that was never
//! started or has already been shut down.
//!
//! [`TaLibrary::initialize`] hands out one process-wide handle: while it is
//! alive and not finalized, repeated calls return clones sharing the same
//! engine and descriptor cache. [`TaLibrary::with_engine`] builds a private
//! handle over an explicit engine instead.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::descriptor::FunctionDescriptor;
use crate::engine::NativeEngine;
use crate::error::{AbstractError, Result};

static SHARED: Mutex<Weak<Inner>> = Mutex::new(Weak::new());

pub(crate) struct Inner {
    pub(crate) engine: Arc<dyn NativeEngine>,
    pub(crate) descriptors: RwLock<HashMap<String, Arc<FunctionDescriptor>>>,
    finalized: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if !self.finalized.load(Ordering::Acquire) {
            let status = self.engine.shutdown();
            debug!("{} engine released without finalize: {}", self.engine.name(), status);
        }
    }
}

/// Initialized handle to a native technical-analysis library.
#[derive(Clone)]
pub struct TaLibrary {
    pub(crate) inner: Arc<Inner>,
}

impl TaLibrary {
    /// Returns the process-wide handle, starting the engine chosen by
    /// [`EngineConfig::from_env`] if no live handle exists.
    pub fn initialize() -> Result<TaLibrary> {
        let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(inner) = slot.upgrade() {
            if !inner.finalized.load(Ordering::Acquire) {
                return Ok(TaLibrary { inner });
            }
        }

        let config = EngineConfig::from_env()?;
        let lib = Self::open(config.build_engine()?)?;
        *slot = Arc::downgrade(&lib.inner);
        Ok(lib)
    }

    /// Private handle over the engine selected by `config`.
    pub fn with_config(config: &EngineConfig) -> Result<TaLibrary> {
        Self::open(config.build_engine()?)
    }

    /// Private handle over an explicit engine.
    pub fn with_engine<E: NativeEngine + 'static>(engine: E) -> Result<TaLibrary> {
        Self::open(Arc::new(engine))
    }

    fn open(engine: Arc<dyn NativeEngine>) -> Result<TaLibrary> {
        let status = engine.initialize();
        if !status.is_success() {
            warn!("{} engine failed to initialize: {}", engine.name(), status);
            return Err(AbstractError::Initialization(format!(
                "{} engine returned {}",
                engine.name(),
                status
            )));
        }
        debug!("{} engine initialized", engine.name());

        Ok(TaLibrary {
            inner: Arc::new(Inner {
                engine,
                descriptors: RwLock::new(HashMap::new()),
                finalized: AtomicBool::new(false),
            }),
        })
    }

    /// Shuts the engine down. Only the first call on a handle (or any of its
    /// clones) reaches the engine; later calls fail.
    pub fn finalize(&self) -> Result<()> {
        let _guard = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        if self.inner.finalized.swap(true, Ordering::AcqRel) {
            return Err(AbstractError::Initialization("library already finalized".to_string()));
        }

        self.inner
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let status = self.inner.engine.shutdown();
        debug!("{} engine shut down: {}", self.inner.engine.name(), status);
        status
            .check()
            .map_err(|s| AbstractError::Initialization(format!("shutdown returned {s}")))
    }

    pub fn is_finalized(&self) -> bool {
        self.inner.finalized.load(Ordering::Acquire)
    }

    /// Name of the engine behind this handle (`"reference"` or `"ta-lib"`).
    pub fn backend_name(&self) -> &'static str {
        self.inner.engine.name()
    }

    /// True when both handles share one engine and descriptor cache.
    pub fn same_handle(&self, other: &TaLibrary) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn engine(&self) -> Result<&dyn NativeEngine> {
        if self.is_finalized() {
            return Err(AbstractError::Initialization("library has been finalized".to_string()));
        }
        Ok(self.inner.engine.as_ref())
    }
}

impl fmt::Debug for TaLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaLibrary")
            .field("backend", &self.backend_name())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reference::ReferenceEngine;
    use crate::engine::RetCode;

    #[test]
    fn test_finalize_runs_once() {
        let lib = TaLibrary::with_engine(ReferenceEngine::new()).unwrap();
        let clone = lib.clone();
        assert!(lib.same_handle(&clone));
        assert!(lib.finalize().is_ok());
        assert!(clone.is_finalized());
        assert!(matches!(clone.finalize(), Err(AbstractError::Initialization(_))));
        assert!(matches!(lib.engine(), Err(AbstractError::Initialization(_))));
    }

    #[test]
    fn test_standalone_handles_are_distinct() {
        let a = TaLibrary::with_engine(ReferenceEngine::new()).unwrap();
        let b = TaLibrary::with_engine(ReferenceEngine::new()).unwrap();
        assert!(!a.same_handle(&b));
        assert_eq!(a.backend_name(), "reference");
    }

    struct BrokenEngine;

    impl NativeEngine for BrokenEngine {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn initialize(&self) -> RetCode {
            RetCode::ALLOC_ERR
        }
        fn shutdown(&self) -> RetCode {
            RetCode::SUCCESS
        }
        fn group_table(&self) -> std::result::Result<Vec<String>, RetCode> {
            Err(RetCode::LIB_NOT_INITIALIZE)
        }
        fn function_table(&self, _group: &str) -> std::result::Result<Vec<String>, RetCode> {
            Err(RetCode::LIB_NOT_INITIALIZE)
        }
        fn function_info(&self, _name: &str) -> std::result::Result<crate::engine::RawFuncInfo, RetCode> {
            Err(RetCode::LIB_NOT_INITIALIZE)
        }
        fn call(
            &self,
            _name: &str,
            _start: usize,
            _end: usize,
            _inputs: &[crate::engine::InputData<'_>],
            _opt_values: &[crate::engine::OptValue],
            _outputs: &mut [crate::engine::OutputBuffer],
        ) -> std::result::Result<crate::engine::NativeRange, RetCode> {
            Err(RetCode::LIB_NOT_INITIALIZE)
        }
    }

    #[test]
    fn test_failed_engine_start_is_initialization_error() {
        let err = TaLibrary::with_engine(BrokenEngine).unwrap_err();
        match err {
            AbstractError::Initialization(msg) => assert!(msg.contains("TA_ALLOC_ERR"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_with_config_builds_private_handle() {
        let config = EngineConfig::new(crate::utilities::enums::Backend::Reference);
        let a = TaLibrary::with_config(&config).unwrap();
        let b = TaLibrary::with_config(&config).unwrap();
        assert_eq!(a.backend_name(), "reference");
        assert!(!a.same_handle(&b));
        assert!(a.resolve("SMA").is_ok());
        a.finalize().unwrap();
        assert!(!b.is_finalized());
    }

    /// Starts fine, then fails every metadata query with `status`, except the
    /// lookups that name `"missing"`.
    struct FailingCatalog {
        status: RetCode,
    }

    impl NativeEngine for FailingCatalog {
        fn name(&self) -> &'static str {
            "failing-catalog"
        }
        fn initialize(&self) -> RetCode {
            RetCode::SUCCESS
        }
        fn shutdown(&self) -> RetCode {
            RetCode::SUCCESS
        }
        fn group_table(&self) -> std::result::Result<Vec<String>, RetCode> {
            Err(self.status)
        }
        fn function_table(&self, group: &str) -> std::result::Result<Vec<String>, RetCode> {
            if group == "missing" {
                return Err(RetCode::GROUP_NOT_FOUND);
            }
            Err(self.status)
        }
        fn function_info(&self, name: &str) -> std::result::Result<crate::engine::RawFuncInfo, RetCode> {
            if name == "missing" {
                return Err(RetCode::FUNC_NOT_FOUND);
            }
            Err(self.status)
        }
        fn call(
            &self,
            _name: &str,
            _start: usize,
            _end: usize,
            _inputs: &[crate::engine::InputData<'_>],
            _opt_values: &[crate::engine::OptValue],
            _outputs: &mut [crate::engine::OutputBuffer],
        ) -> std::result::Result<crate::engine::NativeRange, RetCode> {
            Err(self.status)
        }
    }

    #[test]
    fn test_native_metadata_failures_are_catalog_errors() {
        let lib = TaLibrary::with_engine(FailingCatalog {
            status: RetCode::ALLOC_ERR,
        })
        .unwrap();

        assert!(matches!(
            lib.function_groups(),
            Err(AbstractError::Catalog { status: RetCode::ALLOC_ERR })
        ));
        assert!(matches!(
            lib.functions_in_group("Math Operators"),
            Err(AbstractError::Catalog { status: RetCode::ALLOC_ERR })
        ));
        assert!(matches!(
            lib.function_table(),
            Err(AbstractError::Catalog { status: RetCode::ALLOC_ERR })
        ));
        assert!(matches!(
            lib.resolve("SMA"),
            Err(AbstractError::Catalog { status: RetCode::ALLOC_ERR })
        ));

        assert_eq!(lib.functions_in_group("missing").unwrap(), Vec::<String>::new());
        match lib.resolve("missing") {
            Err(AbstractError::UnknownFunction(name)) => assert_eq!(name, "missing"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(lib.resolve("SMA").unwrap_err().status(), Some(RetCode::ALLOC_ERR));
    }
}
