//! Integration Test: Blocking I/O Prohibition
//!
//! The bridge runs on a single tokio reactor; a blocking call in any task
//! stalls the probe loop, the reader, and the writer at once. Production
//! code must therefore use `tokio::fs` / `tokio::net` / `tokio::process`,
//! never their `std` counterparts, inside async functions.
//!
//! Allowed: test code, and non-async functions (startup work such as CLI
//! and config parsing that runs before the forwarding loop matters).

use std::path::{Path, PathBuf};

/// Source patterns that block the reactor when used from async code.
const FORBIDDEN: &[&str] = &[
    "std::fs::",
    "std::net::",
    "std::thread::sleep",
    "std::process::Command",
    "reqwest::blocking",
];

/// Production source trees, relative to the workspace root.
const PRODUCTION_DIRS: &[&str] = &["bridge/core/src", "bridge/host/src"];

#[test]
fn test_no_blocking_io_in_async_production_code() {
    let mut violations = Vec::new();
    for dir in PRODUCTION_DIRS {
        check_directory(&workspace_root().join(dir), &mut violations);
    }

    assert!(
        violations.is_empty(),
        "blocking I/O in async production code:\n  {}",
        violations.join("\n  ")
    );
}

/// The workspace root, two levels up from this crate's manifest.
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .canonicalize()
        .expect("workspace root")
}

fn check_directory(dir: &Path, violations: &mut Vec<String>) {
    assert!(dir.exists(), "production dir {dir:?} is missing");

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
            check_file(entry.path(), violations);
        }
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };

    // Unit test modules sit at the bottom of each file
    let mut in_test_code = false;
    // Whether the most recent fn declaration was async
    let mut in_async_fn = false;

    for (idx, line) in content.lines().enumerate() {
        if line.contains("#[cfg(test)]") {
            in_test_code = true;
        }
        if in_test_code {
            continue;
        }

        if line.contains("fn ") {
            in_async_fn = line.contains("async fn");
        }
        if !in_async_fn {
            continue;
        }

        let code = line.split("//").next().unwrap_or(line);
        for pattern in FORBIDDEN {
            if code.contains(pattern) {
                violations.push(format!("{}:{}: {}", path.display(), idx + 1, line.trim()));
            }
        }
    }
}
