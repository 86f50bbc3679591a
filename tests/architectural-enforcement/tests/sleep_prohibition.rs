//! Integration Test: Sleep Discipline
//!
//! The only voluntary suspension point in the bridge is the probe loop's
//! fixed-interval wait, which must go through the retry combinator so the
//! policy stays in one place. Ad-hoc `tokio::time::sleep` calls elsewhere
//! in production code are almost always papering over a missing await on
//! real I/O.
//!
//! Allowed: the retry module itself, `tokio::time::interval` (periodic
//! tasks), and test code.

use std::path::{Path, PathBuf};

const PRODUCTION_DIRS: &[&str] = &["bridge/core/src", "bridge/host/src"];

/// Files permitted to sleep: the retry combinator owns the probe wait.
const ALLOWED_FILES: &[&str] = &["retry.rs"];

#[test]
fn test_sleep_only_in_retry_combinator() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .canonicalize()
        .expect("workspace root");

    let mut violations = Vec::new();
    for dir in PRODUCTION_DIRS {
        check_directory(&root.join(dir), &mut violations);
    }

    assert!(
        violations.is_empty(),
        "sleep calls outside the retry combinator:\n  {}",
        violations.join("\n  ")
    );
}

fn check_directory(dir: &Path, violations: &mut Vec<String>) {
    assert!(dir.exists(), "production dir {dir:?} is missing");

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if ALLOWED_FILES.contains(&name) {
            continue;
        }
        check_file(path, violations);
    }
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };

    let mut in_test_code = false;
    for (idx, line) in content.lines().enumerate() {
        if line.contains("#[cfg(test)]") {
            in_test_code = true;
        }
        if in_test_code {
            continue;
        }

        let code = line.split("//").next().unwrap_or(line);
        if code.contains("time::sleep") || code.contains("thread::sleep") {
            violations.push(format!("{}:{}: {}", path.display(), idx + 1, line.trim()));
        }
    }
}
