use ta_abstract::{AbstractError, TaLibrary};

// Single test: the process-wide handle is shared state.
#[test]
fn shared_handle_lifecycle() {
    let first = TaLibrary::initialize().expect("Failed to initialize");
    let second = TaLibrary::initialize().expect("Failed to initialize twice");
    assert!(first.same_handle(&second), "initialize must be idempotent");

    let ma = first.resolve("MA").unwrap();
    let again = second.resolve("MA").unwrap();
    assert!(std::sync::Arc::ptr_eq(&ma, &again), "descriptor cache is shared");

    first.finalize().expect("Failed to finalize");
    assert!(matches!(second.finalize(), Err(AbstractError::Initialization(_))));
    assert!(matches!(second.function_groups(), Err(AbstractError::Initialization(_))));
    assert!(matches!(second.resolve("MA"), Err(AbstractError::Initialization(_))));
    assert!(matches!(
        second.invoke(&ma, 0, 0, &[], &[]),
        Err(AbstractError::Initialization(_))
    ));

    let fresh = TaLibrary::initialize().expect("Failed to re-initialize");
    assert!(!fresh.same_handle(&first));
    assert!(!fresh.function_groups().unwrap().is_empty());
    fresh.finalize().unwrap();
}
