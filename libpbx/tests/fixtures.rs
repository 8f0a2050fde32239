//! Test harness for the reader and writer against fixture files.
//!
//! Every .pbxproj file under test/pbxproj/ must read and write back byte
//! for byte, and writing must be idempotent. Every .pbxproj file under
//! test/nay/ must fail to read with the message in its .error file.

use std::fs;
use std::path::{Path, PathBuf};

use libpbx::{LineEnding, Project, SectionName};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All .pbxproj files in a subdirectory of test/.
fn fixture_files(subdir: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join("*.pbxproj");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .unwrap()
        .flatten()
        .collect();
    files.sort();
    files
}

/// Read the expected error message for a failing document.
fn read_expected_error(path: &Path) -> Option<String> {
    fs::read_to_string(path.with_extension("error")).ok()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single well-formed document.
fn run_roundtrip_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let project = Project::read_from_string_with_filename(&content, Some(&filename))
        .map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;
    let written = project.write_to_string();
    if written != content {
        return Err(format!(
            "{}: Output mismatch at line {}",
            filename,
            first_difference(&content, &written)
        ));
    }

    let reread = Project::read_from_string(&written)
        .map_err(|e| format!("{}: Output does not read back: {}", filename, e))?;
    if reread.write_to_string() != written {
        return Err(format!("{}: Second write differs from the first", filename));
    }

    println!(
        "  {} => {} sections, {} bytes",
        filename,
        project.section_order().len(),
        written.len()
    );
    Ok(())
}

/// 1-based line of the first difference, with both versions of it.
fn first_difference(expected: &str, actual: &str) -> String {
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();
    let mut line = 1;
    loop {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => line += 1,
            (e, a) => {
                return format!(
                    "{}\n    expected: {:?}\n    actual:   {:?}",
                    line,
                    e.unwrap_or_default(),
                    a.unwrap_or_default()
                )
            }
        }
    }
}

/// Run a single malformed document (expected to fail with specific error).
fn run_nay_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    match Project::read_from_string_with_filename(&content, Some(&filename)) {
        Ok(_) => Err(format!(
            "{}: Expected parse error, but got success",
            filename
        )),
        Err(e) => {
            let actual_error = e.to_string();
            if let Some(expected) = read_expected_error(path) {
                let expected = expected.trim();
                if actual_error == expected {
                    println!("  {} => error (as expected)", filename);
                    Ok(())
                } else {
                    Err(format!(
                        "{}: Error mismatch\n    expected: {}\n    actual:   {}",
                        filename, expected, actual_error
                    ))
                }
            } else {
                println!(
                    "  {} => error: {} (no .error file to compare)",
                    filename, actual_error
                );
                Ok(())
            }
        }
    }
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    println!("\nRunning {} {} files:", files.len(), kind);

    let mut passed = 0;
    let mut failed = 0;
    let mut errors: Vec<String> = Vec::new();

    for file in files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => {
                failed += 1;
                errors.push(e);
            }
        }
    }

    println!("\nResults: {} passed, {} failed", passed, failed);

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(failed == 0, "{} {} tests failed", failed, kind);
}

#[test]
fn test_all_roundtrip_fixtures() {
    let files = fixture_files("pbxproj");
    assert!(!files.is_empty(), "No .pbxproj fixtures found!");
    run_all("round-trip", &files, run_roundtrip_test);
}

#[test]
fn test_all_nay_fixtures() {
    let files = fixture_files("nay");
    assert!(!files.is_empty(), "No failing fixtures found!");
    run_all("failing", &files, run_nay_test);
}

#[test]
fn test_passthrough_sections_keep_their_place() {
    let path = test_root().join("pbxproj").join("external-project.pbxproj");
    let project = Project::read_from_string(&fs::read_to_string(path).unwrap()).unwrap();
    let names: Vec<&str> = project.section_order().iter().map(SectionName::as_str).collect();

    let rule = names.iter().position(|n| *n == "PBXBuildRule").unwrap();
    assert_eq!(names[rule - 1], "PBXBuildFile");
    assert_eq!(names[rule + 1], "PBXContainerItemProxy");
    assert_eq!(names.last(), Some(&"XCVersionGroup"));

    let rule = project.opaque_section("PBXBuildRule").unwrap();
    assert_eq!(rule.lines.len(), 10);
    assert!(project.contains_guid(&"0A1B2C3D4E5F60718293A020".into()));
    assert!(project.contains_guid(&"0A1B2C3D4E5F60718293A030".into()));
}

#[test]
fn test_line_endings_are_kept() {
    let path = test_root().join("pbxproj").join("unity-iphone.pbxproj");
    let lf = fs::read_to_string(path).unwrap();
    let crlf = lf.replace('\n', "\r\n");

    let project = Project::read_from_string(&crlf).unwrap();
    assert_eq!(project.line_ending(), LineEnding::CrLf);
    let written = project.write_to_string();
    assert!(written == crlf, "CRLF mismatch at line {}", first_difference(&crlf, &written));

    for text in [lf.trim_end(), crlf.trim_end()] {
        let project = Project::read_from_string(text).unwrap();
        assert!(project.is_unterminated());
        assert_eq!(project.write_to_string(), text);
    }
}
