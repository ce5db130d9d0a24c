#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Output};

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

/// Run a command to completion, failing only when it cannot be spawned.
pub fn run_command(cmd: &mut Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to spawn {:?}", cmd.get_program()))
}

/// The command for one of the crate's binaries, pinned to this checkout's
/// data root and with catalog env overrides cleared.
pub fn catalog_command(bin: &str) -> Command {
    let mut cmd = Command::new(bin);
    cmd.env("CATALOG_ROOT", repo_root());
    for name in [
        "CATALOG_PATH",
        "CATALOG_BACKEND",
        "CATALOG_PAGE_SIZE",
        "CATALOG_SUBCATEGORIES",
        "CATALOG_ASSET_BASE_URL",
        "CATALOG_SCHEMA_PATH",
        "CATALOG_ALLOWED_SCHEMAS",
        "RUST_LOG",
    ] {
        cmd.env_remove(name);
    }
    cmd
}
