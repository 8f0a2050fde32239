//! Read-modify-write access to a project file on disk.
//!
//! ```no_run
//! use libpbx::EditSession;
//!
//! let mut session = EditSession::open("Unity-iPhone.xcodeproj/project.pbxproj")?;
//! let target = session.target_guid_by_name("Unity-iPhone").unwrap();
//! session.set_build_property(&target, "ENABLE_BITCODE", "NO")?;
//! session.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::encode::WriteOptions;
use crate::error::SessionError;
use crate::project::Project;

/// A project loaded from a file and written back exactly once: by
/// [`close`](EditSession::close), or when the session is dropped.
#[derive(Debug)]
pub struct EditSession {
    path: PathBuf,
    project: Project,
    options: WriteOptions,
    flushed: bool,
}

impl EditSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path)?;
        let filename = path.display().to_string();
        let project = Project::read_from_string_with_filename(&text, Some(&filename))?;
        debug!(path = %path.display(), "opened project");
        Ok(Self {
            path,
            project,
            options: WriteOptions::default(),
            flushed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options used when the project is written back.
    pub fn set_write_options(&mut self, options: WriteOptions) {
        self.options = options;
    }

    /// Write the project back and end the session.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.flush()
    }

    /// End the session without writing, leaving the file as it was.
    pub fn discard(mut self) {
        self.flushed = true;
        debug!(path = %self.path.display(), "discarded changes");
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        fs::write(&self.path, self.project.write_to_string_with(&self.options))?;
        debug!(path = %self.path.display(), "wrote project");
        Ok(())
    }
}

impl Deref for EditSession {
    type Target = Project;

    fn deref(&self) -> &Project {
        &self.project
    }
}

impl DerefMut for EditSession {
    fn deref_mut(&mut self) -> &mut Project {
        &mut self.project
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(path = %self.path.display(), "failed to write project: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "{\n\tobjects = {\n\n/* Begin PBXGroup section */\n\t\tMAIN = {\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n\t\t\t);\n\t\t\tsourceTree = \"<group>\";\n\t\t};\n/* End PBXGroup section */\n\t};\n\trootObject = ROOT;\n}\n";

    #[test]
    fn test_close_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        fs::write(&path, DOC).unwrap();

        let mut session = EditSession::open(&path).unwrap();
        assert_eq!(session.path(), path.as_path());
        session.groups_mut().get_mut(&"MAIN".into()).unwrap().name = Some("Root".into());
        assert!(session.flush().is_ok());
        fs::write(&path, "overwritten").unwrap();
        session.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "overwritten");
    }

    #[test]
    fn test_write_options_apply_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        fs::write(&path, DOC).unwrap();

        let mut session = EditSession::open(&path).unwrap();
        session.set_write_options(WriteOptions {
            project_name: "Game".to_string(),
        });
        assert_eq!(session.options.project_name, "Game");
        session.close().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DOC);
    }

    #[test]
    fn test_discard_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        fs::write(&path, "{\n\tobjects = {\n\t};\n}\n").unwrap();

        let session = EditSession::open(&path).unwrap();
        fs::write(&path, "overwritten").unwrap();
        session.discard();
        assert_eq!(fs::read_to_string(&path).unwrap(), "overwritten");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EditSession::open(dir.path().join("absent.pbxproj")).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }
}
