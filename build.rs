//! Build script for changelog-updater: embeds a version string for
//! `--version`.
//!
//! The string is `CARGO_PKG_VERSION (<git version>) <rustc version>`, where
//! the git version is `git describe --tags --always --dirty` when a tag is
//! reachable, and otherwise a pseudo-version of the form
//! `v{CARGO_PKG_VERSION}-{commit timestamp}-{short sha}[+dirty]`. Outside a
//! git checkout the build timestamp stands in for the commit timestamp.

use std::process::Command;

use chrono::Utc;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn main() {
    for path in ["src", "build.rs", "Cargo.toml", "Cargo.lock"] {
        println!("cargo:rerun-if-changed={path}");
    }

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

/// Runs a command and returns its trimmed stdout if it succeeded with
/// non-empty output.
fn run(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn git(args: &[&str]) -> Option<String> {
    run("git", args)
}

/// `.cargo-ok` is written by `cargo install --git` and does not count.
fn working_tree_dirty() -> Option<bool> {
    git(&["status", "--porcelain"]).map(|status| {
        status
            .lines()
            .filter_map(|line| line.get(3..))
            .any(|path| path != ".cargo-ok")
    })
}

fn pseudo_version() -> String {
    let sha = git(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    let dirty = working_tree_dirty() == Some(true);

    let build_time = || Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let timestamp = if dirty {
        build_time()
    } else {
        git(&["log", "-1", "--format=%ct"])
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(build_time)
    };

    let suffix = if dirty { "+dirty" } else { "" };
    format!("v{}-{timestamp}-{sha}{suffix}", env!("CARGO_PKG_VERSION"))
}

fn git_version() -> String {
    match git(&["describe", "--tags", "--always", "--dirty"]) {
        // A bare hash means no tag is reachable.
        Some(desc) if desc.contains('v') || desc.contains("-g") => desc,
        _ => pseudo_version(),
    }
}

fn build_info() -> String {
    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        Some(format!("({})", git_version())),
        run("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
