//! GUID annotations written as `/* label */` after each reference.
//!
//! The map is rebuilt from the object graph before every write and is never
//! consulted for identity. When two rules label the same GUID the first one
//! applied wins.

use std::collections::HashMap;

use crate::encode::WriteOptions;
use crate::guid::Guid;
use crate::objects::{BuildPhase, Entry};
use crate::project::Project;

/// GUID to label table for one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentMap {
    labels: HashMap<Guid, String>,
}

impl CommentMap {
    pub fn get(&self, guid: &str) -> Option<&str> {
        self.labels.get(guid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Empty labels are not recorded; Xcode writes no comment for them.
    fn add(&mut self, guid: &Guid, label: impl Into<String>) {
        let label = label.into();
        if label.is_empty() {
            return;
        }
        self.labels.entry(guid.clone()).or_insert(label);
    }

    fn add_opt(&mut self, guid: Option<&Guid>, label: impl Into<String>) {
        if let Some(guid) = guid {
            self.add(guid, label);
        }
    }
}

/// Label every entry the graph can name.
pub fn build_comment_map(project: &Project, options: &WriteOptions) -> CommentMap {
    let mut map = CommentMap::default();

    for group in project.groups().iter() {
        map.add(group.guid(), group.display_name());
    }
    for proxy in project.container_proxies().iter() {
        map.add(proxy.guid(), "PBXContainerItemProxy");
    }
    for proxy in project.reference_proxies().iter() {
        map.add(proxy.guid(), proxy.path.as_deref().unwrap_or_default());
    }

    // Only copy-files phases carry their own name.
    let labelled_phases = [
        (project.sources_phases(), "Sources", false),
        (project.resources_phases(), "Resources", false),
        (project.frameworks_phases(), "Frameworks", false),
        (project.copy_files_phases(), "CopyFiles", true),
    ];
    for (phases, default, named) in labelled_phases {
        for phase in phases {
            let label = match phase.name.as_deref() {
                Some(name) if named => name,
                _ => default,
            };
            map.add(phase.guid(), label);
            label_build_files(&mut map, project, phase, label);
        }
    }
    for phase in project.shell_script_phases() {
        map.add(phase.guid(), "ShellScript");
    }

    for dependency in project.target_dependencies().iter() {
        map.add(dependency.guid(), "PBXTargetDependency");
    }
    for target in project.native_targets().iter() {
        let name = target.display_name();
        map.add(target.guid(), name);
        map.add_opt(
            target.build_config_list.as_ref(),
            format!("Build configuration list for PBXNativeTarget \"{}\"", name),
        );
    }
    for group in project.variant_groups().iter() {
        map.add(group.guid(), group.display_name());
    }
    for config in project.build_configs().iter() {
        map.add(config.guid(), config.display_name());
    }
    for root in project.project_section().iter() {
        map.add(root.guid(), "Project object");
        map.add_opt(
            root.build_config_list.as_ref(),
            format!(
                "Build configuration list for PBXProject \"{}\"",
                options.project_name
            ),
        );
    }
    for file in project.file_refs().iter() {
        map.add(file.guid(), file.display_name());
    }

    // Entries of passthrough sections keep the label of their declaration.
    for section in project.opaque_sections() {
        for line in &section.lines {
            if let Some((guid, label)) = declared_label(line) {
                map.add(&Guid::new(guid), label);
            }
        }
    }

    map
}

/// Split `GUID /* label */ = {` into its GUID and label.
fn declared_label(line: &str) -> Option<(&str, &str)> {
    let (head, _) = line.trim().split_once(" = {")?;
    let (guid, comment) = head.split_once(' ')?;
    let label = comment.strip_prefix("/*")?.strip_suffix("*/")?.trim();
    Some((guid, label))
}

/// `"<file> in <phase>"` for each build file of a phase. The file may be a
/// reference, a variant group or a reference proxy; build files whose
/// reference cannot be resolved get no label.
fn label_build_files(map: &mut CommentMap, project: &Project, phase: &BuildPhase, label: &str) {
    for guid in &phase.files {
        let Some(file_ref) = project
            .build_files()
            .get(guid)
            .and_then(|b| b.file_ref.as_ref())
        else {
            continue;
        };
        let name = project
            .file_refs()
            .get(file_ref)
            .map(|f| f.display_name())
            .or_else(|| project.variant_groups().get(file_ref).map(|g| g.display_name()))
            .or_else(|| {
                project
                    .reference_proxies()
                    .get(file_ref)
                    .and_then(|p| p.path.as_deref())
            });
        if let Some(name) = name {
            map.add(guid, format!("{} in {}", name, label));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"// !$*UTF8*$!
{
	objects = {

/* Begin PBXBuildFile section */
		B1 = {isa = PBXBuildFile; fileRef = F1; };
		B2 = {isa = PBXBuildFile; fileRef = MISSING; };
		B3 = {isa = PBXBuildFile; fileRef = R1; };
/* End PBXBuildFile section */

/* Begin PBXCopyFilesBuildPhase section */
		C1 = {isa = PBXCopyFilesBuildPhase; files = (B3, ); };
/* End PBXCopyFilesBuildPhase section */

/* Begin PBXFileReference section */
		F1 = {isa = PBXFileReference; path = Foo.m; sourceTree = "<group>"; };
/* End PBXFileReference section */

/* Begin PBXNativeTarget section */
		T1 = {isa = PBXNativeTarget; buildConfigurationList = L1; name = App; };
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		P1 = {isa = PBXProject; buildConfigurationList = L2; };
/* End PBXProject section */

/* Begin PBXReferenceProxy section */
		R1 = {isa = PBXReferenceProxy; path = libOther.a; };
/* End PBXReferenceProxy section */

/* Begin PBXSourcesBuildPhase section */
		S1 = {isa = PBXSourcesBuildPhase; files = (B1, B2, ); };
/* End PBXSourcesBuildPhase section */
	};
	rootObject = P1;
}
"#;

    #[test]
    fn test_labels() {
        let project = Project::read_from_string(DOC).unwrap();
        let map = build_comment_map(&project, &WriteOptions::default());
        assert_eq!(map.get("B1"), Some("Foo.m in Sources"));
        assert_eq!(map.get("B2"), None);
        assert_eq!(map.get("B3"), Some("libOther.a in CopyFiles"));
        assert_eq!(map.get("C1"), Some("CopyFiles"));
        assert_eq!(map.get("S1"), Some("Sources"));
        assert_eq!(map.get("F1"), Some("Foo.m"));
        assert_eq!(map.get("T1"), Some("App"));
        assert_eq!(
            map.get("L1"),
            Some("Build configuration list for PBXNativeTarget \"App\"")
        );
        assert_eq!(map.get("P1"), Some("Project object"));
        assert_eq!(
            map.get("L2"),
            Some("Build configuration list for PBXProject \"Unity-iPhone\"")
        );
    }

    #[test]
    fn test_project_name_option() {
        let project = Project::read_from_string(DOC).unwrap();
        let options = WriteOptions {
            project_name: "Game".to_string(),
        };
        let map = build_comment_map(&project, &options);
        assert_eq!(
            map.get("L2"),
            Some("Build configuration list for PBXProject \"Game\"")
        );
    }

    #[test]
    fn test_unnamed_group_has_no_label() {
        let doc = "{\n\tobjects = {\n\n/* Begin PBXGroup section */\n\t\tG0 = {isa = PBXGroup; children = (G1); sourceTree = \"<group>\"; };\n\t\tG1 = {isa = PBXGroup; path = Classes; sourceTree = \"<group>\"; };\n/* End PBXGroup section */\n\t};\n}\n";
        let project = Project::read_from_string(doc).unwrap();
        let map = build_comment_map(&project, &WriteOptions::default());
        assert_eq!(map.get("G0"), None);
        assert_eq!(map.get("G1"), Some("Classes"));
        assert!(project.write_to_string().contains("\t\tG0 = {\n"));
    }

    #[test]
    fn test_declared_label() {
        assert_eq!(
            declared_label("\t\tR1 /* PBXBuildRule */ = {"),
            Some(("R1", "PBXBuildRule"))
        );
        assert_eq!(declared_label("\t\tR1 = {"), None);
        assert_eq!(declared_label("\t\t\tisa = PBXBuildRule;"), None);
    }
}
