use std::env;
use std::path::PathBuf;

// Bake a data-root hint into the binaries: CATALOG_ROOT_HINT when given at
// build time, otherwise this checkout (which ships catalogs/ and schema/).
fn main() {
    println!("cargo:rerun-if-env-changed=CATALOG_ROOT_HINT");

    let root = env::var("CATALOG_ROOT_HINT")
        .ok()
        .filter(|hint| !hint.trim().is_empty())
        .or_else(|| env::var("CARGO_MANIFEST_DIR").ok());

    if let Some(raw) = root {
        let candidate = PathBuf::from(raw);
        let canonical = candidate.canonicalize().unwrap_or(candidate);
        println!("cargo:rustc-env=CATALOG_ROOT_HINT={}", canonical.display());
    }
}
