//! Build script for StreamKey
//!
//! Sets `STREAMKEY_GIT_VERSION` to the nearest release tag as reported by
//! `git describe` (e.g. `v1.0.2-3-gabc1234-dirty`) and `STREAMKEY_BUILD_DATE`
//! to the UTC build date. Both show up in `streamkey --version`.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let git_version = git(&["describe", "--tags", "--always", "--dirty"])
        .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION")));
    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();

    println!("cargo:rustc-env=STREAMKEY_GIT_VERSION={}", git_version);
    println!("cargo:rustc-env=STREAMKEY_BUILD_DATE={}", build_date);

    // New commits and new tags both change the describe output
    if let Some(git_dir) = git(&["rev-parse", "--git-dir"]) {
        println!("cargo:rerun-if-changed={}/HEAD", git_dir);
        println!("cargo:rerun-if-changed={}/refs/tags", git_dir);
        println!("cargo:rerun-if-changed={}/index", git_dir);
    }
}
