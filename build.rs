// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=ROLLCALL_VERSION");

    // Packagers can pin the reported version
    let version = std::env::var("ROLLCALL_VERSION").unwrap_or_else(|_| {
        let base = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
        match short_commit() {
            Some(hash) => format!("{}-{}", base, hash),
            None => base,
        }
    });

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
