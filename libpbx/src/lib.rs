//! Reader, editor and writer for Xcode `project.pbxproj` documents.
//!
//! A pbxproj document is an old-style property list whose `objects` table is
//! split into `/* Begin X section */` blocks. The reader keeps the text
//! outside the table verbatim, types the entries of the sections it knows and
//! keeps the lines of the others as they are, so that reading and writing an
//! untouched document reproduces it byte for byte.
//!
//! # Reading Pipeline
//!
//! 1. **Scanner**: splits the document into header, section blocks and footer.
//!
//! 2. **Lexer**: turns each section body into tokens, recording comments
//!    and line numbers.
//!
//! 3. **Parser**: reads `GUID = { ... };` entries from the tokens into
//!    ordered dictionaries.
//!
//! 4. **Objects**: builds a typed entry for each dictionary in a known
//!    section; the [`Project`] holds them per section.
//!
//! Writing rebuilds the `/* ... */` annotations from the object graph (see
//! [`build_comment_map`]) and serializes every section in Xcode's layout.
//!
//! # Example
//!
//! ```
//! use libpbx::Project;
//!
//! let text = "{\n\tobjects = {\n\t};\n}\n";
//! let project = Project::read_from_string(text).unwrap();
//! assert_eq!(project.write_to_string(), text);
//! ```

mod capability;
mod comments;
mod edit;
mod encode;
mod error;
pub mod file_types;
mod grammar;
mod guid;
mod lexer;
mod objects;
mod parser;
mod project;
mod scanner;
mod section;
mod session;
mod targets;
mod value;

pub use capability::Capability;
pub use comments::{build_comment_map, CommentMap};
pub use encode::{WriteOptions, DEFAULT_PROJECT_NAME};
pub use error::{EditError, ParseError, Result, SessionError};
pub use file_types::FileCategory;
pub use guid::Guid;
pub use lexer::{tokenize, Token, TokenKind};
pub use objects::{
    AnyEntry, BuildConfiguration, BuildFile, BuildPhase, ConfigurationList, ContainerItemProxy,
    Entry, FileReference, Group, NativeTarget, ProjectObject, ProjectReference, ReferenceProxy,
    SourceTree, TargetDependency,
};
pub use project::Project;
pub use scanner::LineEnding;
pub use section::{OpaqueSection, Section, SectionKind, SectionName};
pub use session::EditSession;
pub use value::{Dict, Value};
