//! Build script: composes `PHONETRACK_VERSION` for `--version`.
//!
//! `<pkg version>+<short hash>` inside a git checkout, the plain package
//! version otherwise (crates.io tarballs, CI without `.git`).

use std::env;
use std::process::Command;

fn short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let full = match short_hash() {
        Some(hash) => format!("{}+{}", version, hash),
        None => version,
    };
    println!("cargo:rustc-env=PHONETRACK_VERSION={}", full);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
