//! Hygiene — enforces coding standards at test time
//!
//! Scans the overlay crate's production sources for antipatterns. Each
//! pattern has a budget (zero). If you must add an occurrence, you have to
//! fix an existing one first — the budget never grows.

use std::fs;
use std::path::Path;

/// (pattern, budget) pairs checked against every production source line.
const BUDGETS: &[(&str, usize)] = &[
    // Panics — these crash the wasm module.
    (".unwrap()", 0),
    (".expect(", 0),
    ("panic!(", 0),
    ("unreachable!(", 0),
    ("todo!(", 0),
    ("unimplemented!(", 0),
    // Silent loss — discards errors without inspecting.
    ("let _ =", 0),
    (".ok()", 0),
    // Structure.
    ("#[allow(dead_code)]", 0),
];

struct SourceFile {
    path: String,
    content: String,
}

/// Collect production `.rs` files from `src/`, excluding sibling test files.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let path_str = path.to_string_lossy().to_string();
            if path_str.ends_with("_test.rs") {
                continue;
            }
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path: path_str, content });
            }
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file
                .content
                .lines()
                .filter(|line| line.contains(pattern))
                .count();
            if count > 0 {
                Some((file.path.clone(), count))
            } else {
                None
            }
        })
        .collect()
}

#[test]
fn source_stays_within_budgets() {
    let files = source_files();
    assert!(!files.is_empty(), "no production sources found under src/");
    let mut report = String::new();
    for (pattern, budget) in BUDGETS {
        let found = hits(&files, pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > *budget {
            report.push_str(&format!("`{pattern}` budget exceeded: found {count}, max {budget}\n"));
            for (path, count) in &found {
                report.push_str(&format!("  {path}: {count}\n"));
            }
        }
    }
    assert!(report.is_empty(), "{report}");
}
