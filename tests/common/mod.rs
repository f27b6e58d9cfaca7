/// Shared helpers for the integration tests.
use ta_abstract::engine::reference::ReferenceEngine;
use ta_abstract::TaLibrary;

/// Private handle over the built-in engine, so tests never share lifecycle
/// state with each other.
pub fn reference_library() -> TaLibrary {
    TaLibrary::with_engine(ReferenceEngine::new()).expect("Failed to start reference engine")
}

/// `n` samples of one sine period over `[0, 2*pi]`, endpoints included.
pub fn sine_wave(n: usize) -> Vec<f64> {
    let step = 2.0 * std::f64::consts::PI / (n - 1) as f64;
    (0..n).map(|i| (i as f64 * step).sin()).collect()
}

/// Deterministic OHLC series with a wandering close and a positive spread.
pub struct TestData {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl TestData {
    pub fn generate(n: usize) -> Self {
        let mut open = Vec::with_capacity(n);
        let mut high = Vec::with_capacity(n);
        let mut low = Vec::with_capacity(n);
        let mut close = Vec::with_capacity(n);
        let mut last = 100.0;
        for i in 0..n {
            let x = i as f64;
            let c = 100.0 + 10.0 * (x * 0.07).sin() + 3.0 * (x * 0.31).cos();
            let spread = 1.0 + 0.5 * (x * 0.13).sin().abs();
            open.push(last);
            high.push(c.max(last) + spread);
            low.push(c.min(last) - spread);
            close.push(c);
            last = c;
        }
        TestData { open, high, low, close }
    }
}

/// Compare two arrays with a tolerance
pub fn assert_array_close(actual: &[f64], expected: &[f64], rtol: f64, atol: f64, name: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: Length mismatch: actual {} vs expected {}",
        name,
        actual.len(),
        expected.len()
    );

    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        if a.is_nan() && e.is_nan() {
            continue;
        }

        let diff = (a - e).abs();
        let tol = atol + rtol * e.abs();

        assert!(
            diff <= tol,
            "{}: Value mismatch at index {}: actual {} vs expected {} (diff: {}, tol: {})",
            name,
            i,
            a,
            e,
            diff,
            tol
        );
    }
}
