//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that the domain / application /
//! infra boundaries hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(") && trimmed.contains("test") && !trimmed.contains("cfg_attr")
        {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-test, non-comment lines of every file under `src/<layer>`, with
/// their location.
fn production_lines(layer: &str) -> Vec<(String, String)> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut out = Vec::new();
    for file in collect_rs_files(&root.join("src").join(layer)) {
        let rel = file
            .strip_prefix(root)
            .unwrap_or(&file)
            .display()
            .to_string();
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            out.push((format!("{rel}:{}", i + 1), line.to_string()));
        }
    }
    out
}

fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    production_lines(layer)
        .into_iter()
        .filter(|(_, line)| forbidden.iter().any(|f| line.contains(f)))
        .map(|(at, line)| format!("{at}: {}", line.trim()))
        .collect()
}

#[test]
fn domain_is_pure() {
    let found = violations(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
            "tonic::",
        ],
    );
    assert!(
        found.is_empty(),
        "domain/ must stay free of I/O and outer layers:\n{}",
        found.join("\n")
    );
}

#[test]
fn application_does_not_reach_into_infra() {
    let found = violations(
        "application",
        &["crate::infra", "crate::cli", "crate::commands", "tonic::", "std::fs"],
    );
    assert!(
        found.is_empty(),
        "application/ may only depend on domain/ and its own ports:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_cli() {
    let found = violations("infra", &["crate::commands", "crate::cli", "crate::app"]);
    assert!(
        found.is_empty(),
        "infra/ must not import from commands/, cli or app:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let found = violations("infra", &["println!", "eprintln!"]);
    assert!(
        found.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        found.join("\n")
    );
}

#[test]
fn services_are_generic_over_ports() {
    let found: Vec<String> = production_lines("application")
        .into_iter()
        .filter(|(_, line)| {
            ["TokioCommandRunner", "RpcToolExecutor", "GrpcDeviceManager", "SystemClock"]
                .iter()
                .any(|concrete| line.contains(concrete))
        })
        .map(|(at, line)| format!("{at}: {}", line.trim()))
        .collect();
    assert!(
        found.is_empty(),
        "application/ must use port traits, not concrete adapters:\n{}",
        found.join("\n")
    );
}
