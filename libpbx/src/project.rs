//! The in-memory project: header, typed sections, passthrough sections,
//! section order and footer.

use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::comments::build_comment_map;
use crate::encode::{write_project, WriteOptions};
use crate::error::{EditError, ParseContext, ParseError, Result};
use crate::guid::Guid;
use crate::objects::{
    AnyEntry, BuildConfiguration, BuildFile, BuildPhase, ConfigurationList, ContainerItemProxy,
    Entry, FileReference, Group, NativeTarget, ProjectObject, ReferenceProxy, TargetDependency,
};
use crate::parser::parse_section;
use crate::scanner::{scan, LineEnding};
use crate::section::{OpaqueSection, Section, SectionKind, SectionName};
use crate::value::Dict;

/// A parsed `project.pbxproj` document.
#[derive(Debug, Clone, Default)]
pub struct Project {
    header: Vec<String>,
    footer: Vec<String>,
    order: Vec<SectionName>,
    line_ending: LineEnding,
    /// The document did not end with a line terminator.
    unterminated: bool,

    build_files: Section<BuildFile>,
    container_proxies: Section<ContainerItemProxy>,
    copy_files_phases: Section<BuildPhase>,
    file_refs: Section<FileReference>,
    frameworks_phases: Section<BuildPhase>,
    groups: Section<Group>,
    native_targets: Section<NativeTarget>,
    project: Section<ProjectObject>,
    reference_proxies: Section<ReferenceProxy>,
    resources_phases: Section<BuildPhase>,
    shell_script_phases: Section<BuildPhase>,
    sources_phases: Section<BuildPhase>,
    target_dependencies: Section<TargetDependency>,
    variant_groups: Section<Group>,
    build_configs: Section<BuildConfiguration>,
    config_lists: Section<ConfigurationList>,

    opaque: Vec<OpaqueSection>,
    /// GUIDs declared in passthrough sections.
    passthrough: HashSet<Guid>,
    /// GUIDs handed out by `new_guid`.
    issued: HashSet<Guid>,
}

impl Project {
    /// Parse a document.
    pub fn read_from_string(text: &str) -> Result<Self> {
        Self::read_from_string_with_filename(text, None)
    }

    /// Parse a document, naming `filename` in error messages.
    pub fn read_from_string_with_filename(text: &str, filename: Option<&str>) -> Result<Self> {
        let ctx = ParseContext::new(filename);

        // Phase 1: Split into header, section blocks and footer
        let scanned = scan(text, &ctx)?;

        let mut project = Project {
            header: scanned.header,
            footer: scanned.footer,
            line_ending: scanned.line_ending,
            unterminated: scanned.unterminated,
            ..Default::default()
        };

        let mut previous: Option<usize> = None;
        for block in &scanned.blocks {
            let name = SectionName::from_name(&block.name);
            let at = match project.order.iter().position(|n| *n == name) {
                Some(at) => {
                    warn!(section = %block.name, "merging repeated section");
                    at
                }
                None => {
                    let at = previous.map_or(0, |p| p + 1);
                    project.order.insert(at, name.clone());
                    at
                }
            };
            previous = Some(at);

            match name {
                SectionName::Known(kind) => {
                    // Phases 2 and 3: Tokenize and parse the entries
                    let entries = parse_section(block, &ctx)?;
                    trace!(section = %kind, entries = entries.len(), "read section");
                    for (guid, props) in entries {
                        project.read_entry(kind, guid, props, &ctx)?;
                    }
                }
                SectionName::Opaque(name) => {
                    trace!(section = %name, lines = block.lines.len(), "kept opaque section");
                    project.passthrough.extend(opaque_guids(&block.lines));
                    match project.opaque.iter_mut().find(|s| s.name == name) {
                        Some(existing) => existing.lines.extend(block.lines.iter().cloned()),
                        None => project.opaque.push(OpaqueSection {
                            name,
                            lines: block.lines.clone(),
                        }),
                    }
                }
            }
        }
        project.complete_order();

        debug!(
            sections = project.order.len(),
            opaque = project.opaque.len(),
            "read project"
        );
        Ok(project)
    }

    fn read_entry(
        &mut self,
        kind: SectionKind,
        guid: Guid,
        props: Dict,
        ctx: &ParseContext,
    ) -> Result<()> {
        if !props.contains_key("isa") {
            return Err(ParseError::MissingIsa {
                guid: guid.to_string(),
                section: kind.name().to_string(),
                suffix: ctx.loc_suffix(),
            });
        }
        if self.contains_guid(&guid) {
            return Err(ParseError::DuplicateGuid {
                guid: guid.to_string(),
                suffix: ctx.loc_suffix(),
            });
        }
        let entry = AnyEntry::from_dict(kind, guid.clone(), props).map_err(|message| {
            ParseError::InvalidEntry {
                guid: guid.to_string(),
                message,
                suffix: ctx.loc_suffix(),
            }
        })?;
        self.put(entry);
        Ok(())
    }

    /// Give every known kind a place in the order, next to its neighbours in
    /// the default layout.
    fn complete_order(&mut self) {
        for (i, kind) in SectionKind::DEFAULT_ORDER.iter().enumerate() {
            let name = SectionName::Known(*kind);
            if self.order.contains(&name) {
                continue;
            }
            let at = SectionKind::DEFAULT_ORDER[..i]
                .iter()
                .rev()
                .find_map(|prev| {
                    self.order
                        .iter()
                        .position(|n| *n == SectionName::Known(*prev))
                })
                .map_or(0, |p| p + 1);
            self.order.insert(at, name);
        }
    }

    /// Serialize with default options.
    pub fn write_to_string(&self) -> String {
        self.write_to_string_with(&WriteOptions::default())
    }

    /// Serialize, regenerating every comment from the current graph.
    pub fn write_to_string_with(&self, options: &WriteOptions) -> String {
        let comments = build_comment_map(self, options);
        let text = write_project(self, &comments);
        debug!(bytes = text.len(), comments = comments.len(), "wrote project");
        text
    }

    // ========================================================================
    // Document parts
    // ========================================================================

    /// Lines up to and including the one that opens the object table.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lines after the last section.
    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    /// Line ending the document was read with.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Whether the document ended without a line terminator.
    pub fn is_unterminated(&self) -> bool {
        self.unterminated
    }

    /// Serialization order of all sections, known and passthrough.
    pub fn section_order(&self) -> &[SectionName] {
        &self.order
    }

    /// Sections kept as raw lines, in the order they were read.
    pub fn opaque_sections(&self) -> &[OpaqueSection] {
        &self.opaque
    }

    pub fn opaque_section(&self, name: &str) -> Option<&OpaqueSection> {
        self.opaque.iter().find(|s| s.name == name)
    }

    /// Property dictionaries of one known section, as they will be written.
    pub fn section_entries(&self, kind: SectionKind) -> Vec<(Guid, Dict)> {
        fn dicts<T: Entry>(section: &Section<T>) -> Vec<(Guid, Dict)> {
            section
                .iter()
                .map(|e| (e.guid().clone(), e.to_dict()))
                .collect()
        }
        match kind {
            SectionKind::BuildFile => dicts(&self.build_files),
            SectionKind::ContainerItemProxy => dicts(&self.container_proxies),
            SectionKind::FileReference => dicts(&self.file_refs),
            SectionKind::Group => dicts(&self.groups),
            SectionKind::NativeTarget => dicts(&self.native_targets),
            SectionKind::Project => dicts(&self.project),
            SectionKind::ReferenceProxy => dicts(&self.reference_proxies),
            SectionKind::TargetDependency => dicts(&self.target_dependencies),
            SectionKind::VariantGroup => dicts(&self.variant_groups),
            SectionKind::BuildConfiguration => dicts(&self.build_configs),
            SectionKind::ConfigurationList => dicts(&self.config_lists),
            SectionKind::CopyFilesBuildPhase
            | SectionKind::FrameworksBuildPhase
            | SectionKind::ResourcesBuildPhase
            | SectionKind::ShellScriptBuildPhase
            | SectionKind::SourcesBuildPhase => self
                .phase_section(kind)
                .map(dicts)
                .unwrap_or_default(),
        }
    }

    // ========================================================================
    // GUIDs
    // ========================================================================

    /// Whether `guid` names an entry in any section or has been handed out.
    pub fn contains_guid(&self, guid: &Guid) -> bool {
        self.kind_of(guid).is_some()
            || self.passthrough.contains(guid)
            || self.issued.contains(guid)
    }

    /// The known section holding `guid`, if any.
    pub fn kind_of(&self, guid: &Guid) -> Option<SectionKind> {
        SectionKind::DEFAULT_ORDER.into_iter().find(|kind| match kind {
            SectionKind::BuildFile => self.build_files.contains(guid),
            SectionKind::ContainerItemProxy => self.container_proxies.contains(guid),
            SectionKind::FileReference => self.file_refs.contains(guid),
            SectionKind::Group => self.groups.contains(guid),
            SectionKind::NativeTarget => self.native_targets.contains(guid),
            SectionKind::Project => self.project.contains(guid),
            SectionKind::ReferenceProxy => self.reference_proxies.contains(guid),
            SectionKind::TargetDependency => self.target_dependencies.contains(guid),
            SectionKind::VariantGroup => self.variant_groups.contains(guid),
            SectionKind::BuildConfiguration => self.build_configs.contains(guid),
            SectionKind::ConfigurationList => self.config_lists.contains(guid),
            phase => self
                .phase_section(*phase)
                .is_some_and(|s| s.contains(guid)),
        })
    }

    /// Allocate a GUID not used anywhere in the project, nor handed out before.
    pub fn new_guid(&mut self) -> Guid {
        loop {
            let guid = Guid::generate();
            if !self.contains_guid(&guid) {
                self.issued.insert(guid.clone());
                return guid;
            }
        }
    }

    // ========================================================================
    // Generic entry access
    // ========================================================================

    /// Add an entry to the section of its kind.
    pub fn insert_entry(&mut self, entry: AnyEntry) -> std::result::Result<(), EditError> {
        let guid = entry.guid();
        // GUIDs from new_guid are issued but not yet placed.
        if self.kind_of(guid).is_some() || self.passthrough.contains(guid) {
            return Err(EditError::DuplicateGuid(guid.clone()));
        }
        trace!(section = %entry.kind(), guid = %guid, "insert entry");
        self.put(entry);
        Ok(())
    }

    /// Remove one entry. References to it elsewhere are left alone.
    pub fn remove_entry(&mut self, kind: SectionKind, guid: &Guid) -> Option<AnyEntry> {
        trace!(section = %kind, guid = %guid, "remove entry");
        match kind {
            SectionKind::BuildFile => self.build_files.remove(guid).map(AnyEntry::BuildFile),
            SectionKind::ContainerItemProxy => self
                .container_proxies
                .remove(guid)
                .map(AnyEntry::ContainerItemProxy),
            SectionKind::CopyFilesBuildPhase => self
                .copy_files_phases
                .remove(guid)
                .map(AnyEntry::CopyFilesBuildPhase),
            SectionKind::FileReference => {
                self.file_refs.remove(guid).map(AnyEntry::FileReference)
            }
            SectionKind::FrameworksBuildPhase => self
                .frameworks_phases
                .remove(guid)
                .map(AnyEntry::FrameworksBuildPhase),
            SectionKind::Group => self.groups.remove(guid).map(AnyEntry::Group),
            SectionKind::NativeTarget => {
                self.native_targets.remove(guid).map(AnyEntry::NativeTarget)
            }
            SectionKind::Project => self.project.remove(guid).map(AnyEntry::Project),
            SectionKind::ReferenceProxy => self
                .reference_proxies
                .remove(guid)
                .map(AnyEntry::ReferenceProxy),
            SectionKind::ResourcesBuildPhase => self
                .resources_phases
                .remove(guid)
                .map(AnyEntry::ResourcesBuildPhase),
            SectionKind::ShellScriptBuildPhase => self
                .shell_script_phases
                .remove(guid)
                .map(AnyEntry::ShellScriptBuildPhase),
            SectionKind::SourcesBuildPhase => self
                .sources_phases
                .remove(guid)
                .map(AnyEntry::SourcesBuildPhase),
            SectionKind::TargetDependency => self
                .target_dependencies
                .remove(guid)
                .map(AnyEntry::TargetDependency),
            SectionKind::VariantGroup => {
                self.variant_groups.remove(guid).map(AnyEntry::VariantGroup)
            }
            SectionKind::BuildConfiguration => self
                .build_configs
                .remove(guid)
                .map(AnyEntry::BuildConfiguration),
            SectionKind::ConfigurationList => self
                .config_lists
                .remove(guid)
                .map(AnyEntry::ConfigurationList),
        }
    }

    fn put(&mut self, entry: AnyEntry) {
        match entry {
            AnyEntry::BuildFile(e) => self.build_files.insert(e),
            AnyEntry::FileReference(e) => self.file_refs.insert(e),
            AnyEntry::Group(e) => self.groups.insert(e),
            AnyEntry::ContainerItemProxy(e) => self.container_proxies.insert(e),
            AnyEntry::ReferenceProxy(e) => self.reference_proxies.insert(e),
            AnyEntry::SourcesBuildPhase(e) => self.sources_phases.insert(e),
            AnyEntry::FrameworksBuildPhase(e) => self.frameworks_phases.insert(e),
            AnyEntry::ResourcesBuildPhase(e) => self.resources_phases.insert(e),
            AnyEntry::CopyFilesBuildPhase(e) => self.copy_files_phases.insert(e),
            AnyEntry::ShellScriptBuildPhase(e) => self.shell_script_phases.insert(e),
            AnyEntry::NativeTarget(e) => self.native_targets.insert(e),
            AnyEntry::TargetDependency(e) => self.target_dependencies.insert(e),
            AnyEntry::VariantGroup(e) => self.variant_groups.insert(e),
            AnyEntry::BuildConfiguration(e) => self.build_configs.insert(e),
            AnyEntry::ConfigurationList(e) => self.config_lists.insert(e),
            AnyEntry::Project(e) => self.project.insert(e),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    pub fn build_files(&self) -> &Section<BuildFile> {
        &self.build_files
    }

    pub fn build_files_mut(&mut self) -> &mut Section<BuildFile> {
        &mut self.build_files
    }

    pub fn file_refs(&self) -> &Section<FileReference> {
        &self.file_refs
    }

    pub fn file_refs_mut(&mut self) -> &mut Section<FileReference> {
        &mut self.file_refs
    }

    pub fn groups(&self) -> &Section<Group> {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut Section<Group> {
        &mut self.groups
    }

    pub fn variant_groups(&self) -> &Section<Group> {
        &self.variant_groups
    }

    pub fn variant_groups_mut(&mut self) -> &mut Section<Group> {
        &mut self.variant_groups
    }

    pub fn container_proxies(&self) -> &Section<ContainerItemProxy> {
        &self.container_proxies
    }

    pub fn reference_proxies(&self) -> &Section<ReferenceProxy> {
        &self.reference_proxies
    }

    pub fn native_targets(&self) -> &Section<NativeTarget> {
        &self.native_targets
    }

    pub fn native_targets_mut(&mut self) -> &mut Section<NativeTarget> {
        &mut self.native_targets
    }

    pub fn target_dependencies(&self) -> &Section<TargetDependency> {
        &self.target_dependencies
    }

    pub fn build_configs(&self) -> &Section<BuildConfiguration> {
        &self.build_configs
    }

    pub fn build_configs_mut(&mut self) -> &mut Section<BuildConfiguration> {
        &mut self.build_configs
    }

    pub fn config_lists(&self) -> &Section<ConfigurationList> {
        &self.config_lists
    }

    pub fn config_lists_mut(&mut self) -> &mut Section<ConfigurationList> {
        &mut self.config_lists
    }

    pub fn project_section(&self) -> &Section<ProjectObject> {
        &self.project
    }

    pub fn sources_phases(&self) -> &Section<BuildPhase> {
        &self.sources_phases
    }

    pub fn resources_phases(&self) -> &Section<BuildPhase> {
        &self.resources_phases
    }

    pub fn frameworks_phases(&self) -> &Section<BuildPhase> {
        &self.frameworks_phases
    }

    pub fn copy_files_phases(&self) -> &Section<BuildPhase> {
        &self.copy_files_phases
    }

    pub fn shell_script_phases(&self) -> &Section<BuildPhase> {
        &self.shell_script_phases
    }

    /// The build phase section of `kind`; `None` for non-phase kinds.
    pub fn phase_section(&self, kind: SectionKind) -> Option<&Section<BuildPhase>> {
        match kind {
            SectionKind::SourcesBuildPhase => Some(&self.sources_phases),
            SectionKind::FrameworksBuildPhase => Some(&self.frameworks_phases),
            SectionKind::ResourcesBuildPhase => Some(&self.resources_phases),
            SectionKind::CopyFilesBuildPhase => Some(&self.copy_files_phases),
            SectionKind::ShellScriptBuildPhase => Some(&self.shell_script_phases),
            _ => None,
        }
    }

    pub fn phase_section_mut(&mut self, kind: SectionKind) -> Option<&mut Section<BuildPhase>> {
        match kind {
            SectionKind::SourcesBuildPhase => Some(&mut self.sources_phases),
            SectionKind::FrameworksBuildPhase => Some(&mut self.frameworks_phases),
            SectionKind::ResourcesBuildPhase => Some(&mut self.resources_phases),
            SectionKind::CopyFilesBuildPhase => Some(&mut self.copy_files_phases),
            SectionKind::ShellScriptBuildPhase => Some(&mut self.shell_script_phases),
            _ => None,
        }
    }

    /// The project root object.
    pub fn project_object(&self) -> Option<&ProjectObject> {
        self.project.iter().next()
    }

    pub fn project_object_mut(&mut self) -> Option<&mut ProjectObject> {
        self.project.iter_mut().next()
    }
}

/// GUIDs that open entries in raw section lines (`\t\tGUID ... = {`).
fn opaque_guids(lines: &[String]) -> Vec<Guid> {
    lines
        .iter()
        .filter(|line| line.contains("= {"))
        .filter_map(|line| {
            let word: String = line
                .trim_start()
                .chars()
                .take_while(|c| crate::grammar::is_bare_char(*c))
                .collect();
            (!word.is_empty()).then(|| Guid::new(word))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "// !$*UTF8*$!\n{\n\tobjects = {\n\n/* Begin PBXLegacyTarget section */\n\t\tL1 /* Legacy */ = {\n\t\t\tisa = PBXLegacyTarget;\n\t\t};\n/* End PBXLegacyTarget section */\n\n/* Begin PBXGroup section */\n\t\tG1 = {isa = PBXGroup; children = (); sourceTree = \"<group>\"; };\n/* End PBXGroup section */\n\t};\n\trootObject = P1;\n}\n";

    #[test]
    fn test_order_places_known_kinds_around_read_ones() {
        let project = Project::read_from_string(DOC).unwrap();
        let order: Vec<&str> = project.section_order().iter().map(|n| n.as_str()).collect();
        let legacy = order.iter().position(|n| *n == "PBXLegacyTarget").unwrap();
        let group = order.iter().position(|n| *n == "PBXGroup").unwrap();
        assert_eq!(group, legacy + 1);
        let native = order.iter().position(|n| *n == "PBXNativeTarget").unwrap();
        assert_eq!(native, group + 1);
        let build_file = order.iter().position(|n| *n == "PBXBuildFile").unwrap();
        assert_eq!(build_file, 0);
        let frameworks = order
            .iter()
            .position(|n| *n == "PBXFrameworksBuildPhase")
            .unwrap();
        assert_eq!(frameworks + 1, legacy);
        assert_eq!(order.len(), 17);
    }

    #[test]
    fn test_opaque_guids_are_reserved() {
        let project = Project::read_from_string(DOC).unwrap();
        assert!(project.contains_guid(&Guid::new("L1")));
        assert!(project.contains_guid(&Guid::new("G1")));
        assert_eq!(project.kind_of(&Guid::new("G1")), Some(SectionKind::Group));
        assert_eq!(project.kind_of(&Guid::new("L1")), None);

        let mut project = project;
        let clash = Group::new(Guid::new("L1"), "Clash");
        assert_eq!(
            project.insert_entry(AnyEntry::Group(clash)),
            Err(EditError::DuplicateGuid(Guid::new("L1")))
        );
    }

    #[test]
    fn test_missing_isa() {
        let doc = "objects = {\n/* Begin PBXGroup section */\n\t\tG1 = {children = (); };\n/* End PBXGroup section */\n};\n";
        let err = Project::read_from_string_with_filename(doc, Some("a.pbxproj")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entry G1 in PBXGroup section has no isa of <a.pbxproj>"
        );
    }

    #[test]
    fn test_duplicate_guid_across_sections() {
        let doc = "objects = {\n/* Begin PBXGroup section */\n\t\tX = {isa = PBXGroup; };\n/* End PBXGroup section */\n/* Begin PBXVariantGroup section */\n\t\tX = {isa = PBXVariantGroup; };\n/* End PBXVariantGroup section */\n};\n";
        let err = Project::read_from_string(doc).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateGuid { .. }));
    }

    #[test]
    fn test_repeated_section_merges() {
        let doc = "objects = {\n/* Begin PBXGroup section */\n\t\tA = {isa = PBXGroup; };\n/* End PBXGroup section */\n/* Begin PBXGroup section */\n\t\tB = {isa = PBXGroup; };\n/* End PBXGroup section */\n};\n";
        let project = Project::read_from_string(doc).unwrap();
        assert_eq!(project.groups().len(), 2);
        let groups = project
            .section_order()
            .iter()
            .filter(|n| **n == SectionName::Known(SectionKind::Group))
            .count();
        assert_eq!(groups, 1);
    }

    #[test]
    fn test_insert_and_remove_entry() {
        let mut project = Project::read_from_string(DOC).unwrap();
        let guid = project.new_guid();
        let group = Group::new(guid.clone(), "Extra");
        project.insert_entry(AnyEntry::Group(group.clone())).unwrap();
        assert_eq!(
            project.insert_entry(AnyEntry::Group(group)),
            Err(EditError::DuplicateGuid(guid.clone()))
        );
        let removed = project.remove_entry(SectionKind::Group, &guid);
        assert!(matches!(removed, Some(AnyEntry::Group(_))));
        assert!(project.groups().get(&guid).is_none());
    }
}
