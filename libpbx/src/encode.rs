//! Serialize a project back to pbxproj text.
//!
//! The header and footer are written verbatim. Sections follow the project's
//! section order, each preceded by a blank line, in the layout Xcode itself
//! writes: entries indented by two tabs, properties by three, build files and
//! file references kept on a single line. Every string value the comment map
//! knows is followed by ` /* label */`. Lines end the way the document
//! read in ended them.

use crate::comments::CommentMap;
use crate::grammar::quote;
use crate::project::Project;
use crate::scanner::LineEnding;
use crate::section::SectionName;
use crate::value::{Dict, Value};

/// Label used for the project's own configuration list when none is given.
pub const DEFAULT_PROJECT_NAME: &str = "Unity-iPhone";

/// Properties whose values Xcode never annotates.
const UNANNOTATED_KEYS: &[&str] = &["remoteGlobalIDString"];

/// Serializer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Name embedded in the comment on the project's configuration list.
    pub project_name: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            project_name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }
}

/// Write the whole document.
pub fn write_project(project: &Project, comments: &CommentMap) -> String {
    let mut out = String::new();
    for line in project.header() {
        push_line(&mut out, line);
    }

    for name in project.section_order() {
        match name {
            SectionName::Known(kind) => {
                let entries = project.section_entries(*kind);
                if entries.is_empty() {
                    continue;
                }
                begin_section(&mut out, kind.name());
                for (guid, props) in &entries {
                    out.push_str("\t\t");
                    write_string(&mut out, guid.as_str(), None, comments);
                    out.push_str(" = ");
                    if kind.is_compact() {
                        write_inline_dict(&mut out, props, comments);
                    } else {
                        write_dict(&mut out, props, 2, comments);
                    }
                    out.push_str(";\n");
                }
                end_section(&mut out, kind.name());
            }
            SectionName::Opaque(name) => {
                let Some(section) = project.opaque_section(name) else {
                    continue;
                };
                if section.lines.is_empty() {
                    continue;
                }
                begin_section(&mut out, name);
                for line in &section.lines {
                    push_line(&mut out, line);
                }
                end_section(&mut out, name);
            }
        }
    }

    for line in project.footer() {
        push_line(&mut out, line);
    }

    if project.is_unterminated() {
        out.pop();
    }
    match project.line_ending() {
        LineEnding::Lf => out,
        LineEnding::CrLf => out.replace('\n', LineEnding::CrLf.as_str()),
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn begin_section(out: &mut String, name: &str) {
    out.push_str("\n/* Begin ");
    out.push_str(name);
    out.push_str(" section */\n");
}

fn end_section(out: &mut String, name: &str) {
    out.push_str("/* End ");
    out.push_str(name);
    out.push_str(" section */\n");
}

fn write_string(out: &mut String, s: &str, key: Option<&str>, comments: &CommentMap) {
    out.push_str(&quote(s));
    if key.is_some_and(|k| UNANNOTATED_KEYS.contains(&k)) {
        return;
    }
    if let Some(label) = comments.get(s) {
        out.push_str(" /* ");
        out.push_str(label);
        out.push_str(" */");
    }
}

// =============================================================================
// Multi-line layout
// =============================================================================

/// Write a dictionary whose closing brace sits at `indent` tabs.
fn write_dict(out: &mut String, dict: &Dict, indent: usize, comments: &CommentMap) {
    let pad = "\t".repeat(indent + 1);
    out.push_str("{\n");
    for (key, value) in dict {
        out.push_str(&pad);
        out.push_str(&quote(key));
        out.push_str(" = ");
        write_value(out, key, value, indent + 1, comments);
        out.push_str(";\n");
    }
    out.push_str(&"\t".repeat(indent));
    out.push('}');
}

fn write_value(out: &mut String, key: &str, value: &Value, indent: usize, comments: &CommentMap) {
    match value {
        Value::String(s) => write_string(out, s, Some(key), comments),
        Value::Dict(dict) => write_dict(out, dict, indent, comments),
        Value::Array(items) => {
            let pad = "\t".repeat(indent + 1);
            out.push_str("(\n");
            for item in items {
                out.push_str(&pad);
                write_value(out, key, item, indent + 1, comments);
                out.push_str(",\n");
            }
            out.push_str(&"\t".repeat(indent));
            out.push(')');
        }
    }
}

// =============================================================================
// Single-line layout
// =============================================================================

fn write_inline_dict(out: &mut String, dict: &Dict, comments: &CommentMap) {
    out.push('{');
    for (key, value) in dict {
        out.push_str(&quote(key));
        out.push_str(" = ");
        write_inline_value(out, key, value, comments);
        out.push_str("; ");
    }
    out.push('}');
}

fn write_inline_value(out: &mut String, key: &str, value: &Value, comments: &CommentMap) {
    match value {
        Value::String(s) => write_string(out, s, Some(key), comments),
        Value::Dict(dict) => write_inline_dict(out, dict, comments),
        Value::Array(items) => {
            out.push('(');
            for item in items {
                write_inline_value(out, key, item, comments);
                out.push_str(", ");
            }
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: &[(&str, Value)]) -> Dict {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_inline_layout() {
        let settings = dict(&[("ATTRIBUTES", Value::Array(vec!["Weak".into()]))]);
        let props = dict(&[
            ("isa", "PBXBuildFile".into()),
            ("fileRef", "F".into()),
            ("settings", Value::Dict(settings)),
        ]);
        let mut out = String::new();
        write_inline_dict(&mut out, &props, &CommentMap::default());
        assert_eq!(
            out,
            "{isa = PBXBuildFile; fileRef = F; settings = {ATTRIBUTES = (Weak, ); }; }"
        );
    }

    #[test]
    fn test_multi_line_layout() {
        let settings = dict(&[
            ("OTHER_LDFLAGS", Value::Array(vec!["-ObjC".into()])),
            ("SDKROOT", "iphoneos".into()),
        ]);
        let props = dict(&[
            ("isa", "XCBuildConfiguration".into()),
            ("buildSettings", Value::Dict(settings)),
            ("empty", Value::Array(vec![])),
            ("name", "Release".into()),
        ]);
        let mut out = String::new();
        write_dict(&mut out, &props, 2, &CommentMap::default());
        assert_eq!(
            out,
            "{\n\t\t\tisa = XCBuildConfiguration;\n\t\t\tbuildSettings = {\n\t\t\t\tOTHER_LDFLAGS = (\n\t\t\t\t\t\"-ObjC\",\n\t\t\t\t);\n\t\t\t\tSDKROOT = iphoneos;\n\t\t\t};\n\t\t\tempty = (\n\t\t\t);\n\t\t\tname = Release;\n\t\t}"
        );
    }

    #[test]
    fn test_write_skips_empty_sections() {
        let doc = "{\n\tobjects = {\n\n/* Begin PBXGroup section */\n/* End PBXGroup section */\n\n/* Begin PBXLegacyTarget section */\n/* End PBXLegacyTarget section */\n\t};\n}\n";
        let project = Project::read_from_string(doc).unwrap();
        assert_eq!(project.write_to_string(), "{\n\tobjects = {\n\t};\n}\n");
    }

    #[test]
    fn test_escapes_are_written_as_read() {
        let doc = "{\n\tobjects = {\n\n/* Begin XCBuildConfiguration section */\n\t\tC1 /* Debug */ = {\n\t\t\tisa = XCBuildConfiguration;\n\t\t\tbuildSettings = {\n\t\t\t\tSCRIPT = \"echo \\$(SRCROOT) \\\\$HOME \\\"$USER\\\"\";\n\t\t\t};\n\t\t\tname = Debug;\n\t\t};\n/* End XCBuildConfiguration section */\n\t};\n}\n";
        let written = Project::read_from_string(doc).unwrap().write_to_string();
        assert!(written.contains("\t\t\t\tSCRIPT = \"echo \\$(SRCROOT) \\\\$HOME \\\"$USER\\\"\";\n"));
        assert_eq!(written, doc);
    }
}
