//! Conversion of a project into other data formats.
//!
//! The project becomes a tree of strings, lists and dictionaries:
//!
//! ```text
//! rootObject: <project GUID>
//! objects:
//!   <section name>:
//!     <GUID>: { isa: ..., ... }      # modelled sections
//!   <section name>: [ <line>, ... ]  # sections kept as text
//! ```
//!
//! Sections keep document order and entries keep section order. The
//! `/* ... */` annotations are derived data and are not included.

pub mod toml;
pub mod yaml;

use libpbx::{Dict, Project, SectionName, Value};

/// Build the tree for `project`.
pub fn project_tree(project: &Project) -> Dict {
    let mut objects = Dict::new();
    for name in project.section_order() {
        let value = match name {
            SectionName::Known(kind) => {
                let entries = project
                    .section_entries(*kind)
                    .into_iter()
                    .map(|(guid, props)| (guid.to_string(), Value::Dict(props)))
                    .collect::<Dict>();
                if entries.is_empty() {
                    continue;
                }
                Value::Dict(entries)
            }
            SectionName::Opaque(section) => match project.opaque_section(section) {
                Some(opaque) => Value::Array(
                    opaque
                        .lines
                        .iter()
                        .map(|line| Value::String(line.trim().to_string()))
                        .collect(),
                ),
                None => continue,
            },
        };
        objects.insert(name.as_str().to_string(), value);
    }

    let mut tree = Dict::new();
    if let Some(root) = project.project_guid() {
        tree.insert("rootObject".to_string(), Value::String(root.to_string()));
    }
    tree.insert("objects".to_string(), Value::Dict(objects));
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "// !$*UTF8*$!\n{\n\tobjects = {\n\n/* Begin PBXBuildRule section */\n\t\tR1 /* PBXBuildRule */ = {\n\t\t\tisa = PBXBuildRule;\n\t\t};\n/* End PBXBuildRule section */\n\n/* Begin PBXGroup section */\n\t\tMAIN = {\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n\t\t\t);\n\t\t\tsourceTree = \"<group>\";\n\t\t};\n/* End PBXGroup section */\n\t};\n\trootObject = ROOT;\n}\n";

    #[test]
    fn test_project_tree() {
        let project = Project::read_from_string(DOC).unwrap();
        let tree = project_tree(&project);
        let objects = tree["objects"].as_dict().unwrap();

        let names: Vec<&str> = objects.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["PBXBuildRule", "PBXGroup"]);

        let rule = objects["PBXBuildRule"].as_array().unwrap();
        assert_eq!(rule[0], Value::String("R1 /* PBXBuildRule */ = {".to_string()));

        let main = objects["PBXGroup"].as_dict().unwrap()["MAIN"].as_dict().unwrap();
        assert_eq!(main["isa"], Value::String("PBXGroup".to_string()));
        assert_eq!(main["sourceTree"], Value::String("<group>".to_string()));
    }
}
