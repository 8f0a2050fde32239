//! Edit sessions against copies of the fixture projects.

use std::fs;
use std::path::{Path, PathBuf};

use libpbx::{EditSession, SessionError, SourceTree};

fn fixture(dir: &Path, name: &str) -> PathBuf {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
        .join("pbxproj")
        .join(name);
    let path = dir.join("project.pbxproj");
    fs::copy(source, &path).unwrap();
    path
}

#[test]
fn test_close_writes_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "unity-iphone.pbxproj");

    let mut session = EditSession::open(&path).unwrap();
    let target = session.target_guid_by_name("Unity-iPhone").unwrap();
    let file = session
        .add_file("Classes/Foo.m", "Classes/Foo.m", SourceTree::Source)
        .unwrap();
    session.add_file_to_build(&target, &file).unwrap();
    session.close().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("/* Foo.m in Sources */"));
}

#[test]
fn test_drop_flushes() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "unity-iphone.pbxproj");

    {
        let mut session = EditSession::open(&path).unwrap();
        let target = session.target_guid_by_name("Unity-iPhone").unwrap();
        session
            .set_build_property(&target, "ENABLE_BITCODE", "NO")
            .unwrap();
    }

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("ENABLE_BITCODE = NO;").count(), 2);
}

#[test]
fn test_untouched_session_rewrites_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture(dir.path(), "external-project.pbxproj");
    let before = fs::read_to_string(&path).unwrap();

    EditSession::open(&path).unwrap().close().unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_open_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pbxproj");
    fs::write(&path, "{\n\tarchiveVersion = 1;\n}\n").unwrap();

    let err = EditSession::open(&path).unwrap_err();
    assert!(matches!(err, SessionError::Parse(_)));
    assert!(err.to_string().starts_with("Missing \"objects = {\" line of <"));
    // A failed open leaves the file alone.
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\n\tarchiveVersion = 1;\n}\n"
    );
}
