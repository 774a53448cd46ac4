//! Test harness for the Unke parser against fixture files.
//!
//! Every .unk file in test/unk/ must parse, match the dictionary form stored
//! in test/json/, and survive a dump/parse cycle in both layouts. Every .nok
//! file in test/nok/ must fail with the message in the matching .error file.

use std::fs;
use std::path::{Path, PathBuf};

use libunke::{
    document_to_value, dumps, json_to_document, parse, parse_with_filename, Document,
    DumpOptions,
};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files matching `*.<ext>` in a subdirectory of test/, sorted.
fn get_files_in_subdir(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(format!("*.{}", ext));
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .unwrap()
        .flatten()
        .collect();
    files.sort();
    files
}

fn sibling(path: &Path, subdir: &str, ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap().to_string_lossy();
    test_root().join(subdir).join(format!("{}.{}", stem, ext))
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single .unk fixture (expected to succeed).
fn run_unk_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let doc = parse(&content).map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;

    let json_path = sibling(path, "json", "json");
    let expected_text = fs::read_to_string(&json_path)
        .map_err(|e| format!("{}: Missing expected output: {}", filename, e))?;
    let expected: serde_json::Value = serde_json::from_str(&expected_text)
        .map_err(|e| format!("{}: Bad expected output: {}", filename, e))?;

    let actual = document_to_value(&doc).map_err(|e| format!("{}: {}", filename, e))?;
    if actual != expected {
        return Err(format!(
            "{}: Output mismatch\n    expected: {}\n    actual:   {}",
            filename, expected, actual
        ));
    }

    let rebuilt = json_to_document(&expected_text).map_err(|e| format!("{}: {}", filename, e))?;
    if rebuilt != doc {
        return Err(format!("{}: Document rebuilt from JSON differs", filename));
    }

    for options in [DumpOptions::default(), DumpOptions::compact()] {
        check_round_trip(&filename, &doc, &options)?;
    }

    println!("  {} => ok", filename);
    Ok(())
}

fn check_round_trip(filename: &str, doc: &Document, options: &DumpOptions) -> Result<(), String> {
    let text = dumps(doc, options).map_err(|e| format!("{}: {}", filename, e))?;
    match parse(&text) {
        Ok(reparsed) if reparsed == *doc => Ok(()),
        Ok(_) => Err(format!(
            "{}: Round trip changed the document ({:?})\n{}",
            filename, options, text
        )),
        Err(e) => Err(format!(
            "{}: Dumped text does not parse ({:?}): {}\n{}",
            filename, options, e, text
        )),
    }
}

/// Run a single .nok fixture (expected to fail with a specific error).
fn run_nok_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    match parse_with_filename(&content, Some(&filename)) {
        Ok(doc) => Err(format!(
            "{}: Expected parse error, but got success: {:?}",
            filename,
            document_to_value(&doc)
        )),
        Err(e) => {
            let actual_error = e.to_string();
            match fs::read_to_string(sibling(path, "nok", "error")) {
                Ok(expected) if expected.trim() == actual_error => {
                    println!("  {} => error (as expected)", filename);
                    Ok(())
                }
                Ok(expected) => Err(format!(
                    "{}: Error mismatch\n    expected: {}\n    actual:   {}",
                    filename,
                    expected.trim(),
                    actual_error
                )),
                Err(_) => {
                    println!(
                        "  {} => error: {} (no .error file to compare)",
                        filename, actual_error
                    );
                    Ok(())
                }
            }
        }
    }
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "No .{} test files found!", kind);
    println!("\nRunning {} .{} test files:", files.len(), kind);

    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();
    for file in files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => errors.push(e),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} .{} tests failed", errors.len(), kind);
}

#[test]
fn test_all_unk_fixtures() {
    run_all("unk", &get_files_in_subdir("unk", "unk"), run_unk_test);
}

#[test]
fn test_all_nok_fixtures() {
    run_all("nok", &get_files_in_subdir("nok", "nok"), run_nok_test);
}

#[test]
fn test_every_fixture_has_expected_output() {
    for file in get_files_in_subdir("unk", "unk") {
        assert!(
            sibling(&file, "json", "json").exists(),
            "{} has no expected JSON",
            file.display()
        );
    }
    for file in get_files_in_subdir("nok", "nok") {
        assert!(
            sibling(&file, "nok", "error").exists(),
            "{} has no .error file",
            file.display()
        );
    }
}

#[test]
fn test_comments_are_dropped_by_dump() {
    let content = fs::read_to_string(test_root().join("unk").join("comments.unk")).unwrap();
    let doc = parse(&content).unwrap();
    let text = dumps(&doc, &DumpOptions::default()).unwrap();
    assert!(!text.contains("/*"));
    assert!(!text.contains("line comment"));
    assert!(text.contains("\"text // not a comment\""));
}

#[test]
fn test_duplicate_property_keeps_first_position() {
    let content =
        fs::read_to_string(test_root().join("unk").join("duplicate-property.unk")).unwrap();
    let doc = parse(&content).unwrap();
    let keys: Vec<_> = doc.root_object().unwrap().properties().keys().cloned().collect();
    assert_eq!(keys, vec!["a", "b"]);
}
