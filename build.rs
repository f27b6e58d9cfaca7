use std::env;

fn main() {
    // Only link TA-Lib when the crate feature `ta-lib` is enabled.
    // Cargo exposes active features to build.rs via env vars like CARGO_FEATURE_TA_LIB.
    if env::var("CARGO_FEATURE_TA_LIB").is_ok() {
        link_ta_lib();
    }
}

fn link_ta_lib() {
    println!("cargo:rerun-if-env-changed=TA_LIBRARY_PATH");
    println!("cargo:rerun-if-env-changed=TA_LIBRARY_NAME");
    println!("cargo:rerun-if-env-changed=TA_LIBRARY_STATIC");

    // Locating the library is left to the linker unless a directory is given.
    if let Ok(dir) = env::var("TA_LIBRARY_PATH") {
        for d in env::split_paths(&dir) {
            println!("cargo:rustc-link-search=native={}", d.display());
        }
    }

    let name = env::var("TA_LIBRARY_NAME").unwrap_or_else(|_| "ta_lib".to_string());
    let kind = if env::var("TA_LIBRARY_STATIC").is_ok() {
        "static"
    } else {
        "dylib"
    };
    println!("cargo:rustc-link-lib={kind}={name}");
}
