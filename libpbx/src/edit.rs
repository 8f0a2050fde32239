//! File, group and build-file operations on a [`Project`].
//!
//! Paths use `/` separators; backslashes in arguments are converted. A file's
//! "project path" is its location in the group tree below the main group
//! (`Classes/Foo.m`), its "real path" the `path` stored on the reference.

use tracing::{debug, warn};

use crate::error::EditError;
use crate::file_types;
use crate::guid::Guid;
use crate::objects::{
    AnyEntry, BuildFile, ContainerItemProxy, Entry, FileReference, Group, ProjectReference,
    ReferenceProxy, SourceTree,
};
use crate::project::Project;
use crate::section::{Section, SectionKind};

/// Where system frameworks live, relative to the SDK root.
const SYSTEM_FRAMEWORKS: &str = "System/Library/Frameworks/";

/// `proxyType` of a container proxy pointing at another project's product.
const PROXY_TYPE_REFERENCE: &str = "2";

pub(crate) fn fix_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Split `a/b/c.m` into `("a/b", "c.m")`.
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

impl Project {
    /// GUID of the project root object.
    pub fn project_guid(&self) -> Option<Guid> {
        self.project_object().map(|p| p.guid().clone())
    }

    /// GUID of the first native target called `name`.
    pub fn target_guid_by_name(&self, name: &str) -> Option<Guid> {
        self.native_targets()
            .iter()
            .find(|t| t.name.as_deref() == Some(name))
            .map(|t| t.guid().clone())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn find_file_guid_by_real_path(&self, path: &str) -> Option<Guid> {
        let path = fix_slashes(path);
        self.file_refs()
            .iter()
            .find(|f| f.path.as_deref() == Some(path.as_str()))
            .map(|f| f.guid().clone())
    }

    pub fn find_file_guid_by_project_path(&self, path: &str) -> Option<Guid> {
        let path = fix_slashes(path);
        let (dir, name) = split_path(&path);
        let group = self.groups().get(&self.source_group(dir)?)?;
        group
            .children
            .iter()
            .filter_map(|child| self.file_refs().get(child))
            .find(|f| f.display_name() == name)
            .map(|f| f.guid().clone())
    }

    pub fn contains_file_by_real_path(&self, path: &str) -> bool {
        self.find_file_guid_by_real_path(path).is_some()
    }

    pub fn contains_file_by_project_path(&self, path: &str) -> bool {
        self.find_file_guid_by_project_path(path).is_some()
    }

    /// Whether the system framework `name` (with its `.framework` suffix)
    /// is referenced.
    pub fn has_framework(&self, name: &str) -> bool {
        self.contains_file_by_real_path(&format!("{}{}", SYSTEM_FRAMEWORKS, name))
    }

    // ========================================================================
    // Group tree
    // ========================================================================

    pub(crate) fn main_group(&self) -> Option<Guid> {
        let guid = self.project_object()?.main_group.clone()?;
        self.groups().contains(&guid).then_some(guid)
    }

    fn child_group_named(&self, parent: &Guid, name: &str) -> Option<Guid> {
        self.groups()
            .get(parent)?
            .children
            .iter()
            .find(|child| {
                self.groups()
                    .get(child)
                    .is_some_and(|g| g.display_name() == name)
            })
            .cloned()
    }

    /// The group at `dir` below the main group; the main group for `""`.
    fn source_group(&self, dir: &str) -> Option<Guid> {
        let mut current = self.main_group()?;
        for name in dir.split('/').filter(|s| !s.is_empty()) {
            current = self.child_group_named(&current, name)?;
        }
        Some(current)
    }

    /// Like `source_group`, creating missing groups on the way.
    pub(crate) fn create_source_group(&mut self, dir: &str) -> Result<Guid, EditError> {
        let mut current = self
            .main_group()
            .ok_or_else(|| EditError::not_found("group", "main group"))?;
        for name in dir.split('/').filter(|s| !s.is_empty()) {
            current = match self.child_group_named(&current, name) {
                Some(child) => child,
                None => {
                    let guid = self.new_guid();
                    self.insert_entry(AnyEntry::Group(Group::new(guid.clone(), name)))?;
                    if let Some(parent) = self.groups_mut().get_mut(&current) {
                        parent.children.push(guid.clone());
                    }
                    debug!(group = name, guid = %guid, "created group");
                    guid
                }
            };
        }
        Ok(current)
    }

    /// The group or variant group listing `guid` among its children.
    fn owning_group(&self, guid: &Guid) -> Option<(SectionKind, Guid)> {
        let find = |groups: &Section<Group>| {
            groups
                .iter()
                .find(|g| g.children.contains(guid))
                .map(|g| g.guid().clone())
        };
        find(self.groups())
            .map(|g| (SectionKind::Group, g))
            .or_else(|| find(self.variant_groups()).map(|g| (SectionKind::VariantGroup, g)))
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Reference the file at `real_path`, shown at `project_path` in the
    /// group tree, and return its GUID.
    ///
    /// An existing reference found by project path, then by real path, is
    /// returned as is. Missing groups along `project_path` are created.
    pub fn add_file(
        &mut self,
        real_path: &str,
        project_path: &str,
        tree: SourceTree,
    ) -> Result<Guid, EditError> {
        let real_path = fix_slashes(real_path);
        let project_path = fix_slashes(project_path);
        if file_types::extension(&real_path) != file_types::extension(&project_path) {
            return Err(EditError::FileTypeMismatch {
                real: real_path,
                project: project_path,
            });
        }

        if let Some(existing) = self
            .find_file_guid_by_project_path(&project_path)
            .or_else(|| self.find_file_guid_by_real_path(&real_path))
        {
            return Ok(existing);
        }

        let (dir, name) = split_path(&project_path);
        let group = self.create_source_group(dir)?;
        let guid = self.new_guid();
        let file = FileReference::new(guid.clone(), &real_path, name, tree);
        self.insert_entry(AnyEntry::FileReference(file))?;
        if let Some(group) = self.groups_mut().get_mut(&group) {
            group.children.push(guid.clone());
        }
        debug!(path = %real_path, project_path = %project_path, guid = %guid, "added file");
        Ok(guid)
    }

    /// Reference the system framework `name` and link it into `target`.
    /// Returns the build file GUID.
    pub fn add_framework_to_project(
        &mut self,
        target: &Guid,
        name: &str,
        weak: bool,
    ) -> Result<Guid, EditError> {
        self.target_phase(target, SectionKind::FrameworksBuildPhase)?;
        let file = self.add_file(
            &format!("{}{}", SYSTEM_FRAMEWORKS, name),
            &format!("Frameworks/{}", name),
            SourceTree::Sdk,
        )?;
        self.add_build_file(target, &file, weak, None)
    }

    // ========================================================================
    // Build files
    // ========================================================================

    /// Add `file` to the build phase of `target` that matches its type.
    /// Returns the build file GUID; adding a file twice returns the first one.
    pub fn add_file_to_build(&mut self, target: &Guid, file: &Guid) -> Result<Guid, EditError> {
        self.add_build_file(target, file, false, None)
    }

    pub fn add_file_to_build_with_flags(
        &mut self,
        target: &Guid,
        file: &Guid,
        compile_flags: &str,
    ) -> Result<Guid, EditError> {
        self.add_build_file(target, file, false, Some(compile_flags))
    }

    /// Add `file` to a specific build phase of `target`.
    pub fn add_file_to_build_section(
        &mut self,
        target: &Guid,
        phase: &Guid,
        file: &Guid,
    ) -> Result<Guid, EditError> {
        let owned = self
            .native_targets()
            .get(target)
            .ok_or_else(|| EditError::not_found("target", target))?
            .phases
            .contains(phase);
        let kind = self
            .kind_of(phase)
            .filter(|k| k.is_phase() && owned)
            .ok_or_else(|| EditError::not_found("build phase", phase))?;
        if !self.file_refs().contains(file) && !self.reference_proxies().contains(file) {
            return Err(EditError::not_found("file reference", file));
        }
        Ok(self.put_build_file(kind, phase, file, false, None))
    }

    fn add_build_file(
        &mut self,
        target: &Guid,
        file: &Guid,
        weak: bool,
        compile_flags: Option<&str>,
    ) -> Result<Guid, EditError> {
        let path = self
            .file_refs()
            .get(file)
            .ok_or_else(|| EditError::not_found("file reference", file))?
            .path
            .clone()
            .unwrap_or_default();
        let ext = file_types::extension(&path);
        let kind = file_types::category(&ext)
            .phase()
            .ok_or_else(|| EditError::NotBuildable(ext.clone()))?;
        let phase = self.target_phase(target, kind)?;
        Ok(self.put_build_file(kind, &phase, file, weak, compile_flags))
    }

    /// The first phase of `kind` in `target`'s phase list.
    pub(crate) fn target_phase(&self, target: &Guid, kind: SectionKind) -> Result<Guid, EditError> {
        let target_entry = self
            .native_targets()
            .get(target)
            .ok_or_else(|| EditError::not_found("target", target))?;
        let section = self.phase_section(kind);
        target_entry
            .phases
            .iter()
            .find(|g| section.is_some_and(|s| s.contains(g)))
            .cloned()
            .ok_or_else(|| EditError::MissingPhase {
                target: target.clone(),
                phase: kind.name(),
            })
    }

    /// Create a build file for `file` in a phase known to exist, unless the
    /// phase already has one.
    fn put_build_file(
        &mut self,
        kind: SectionKind,
        phase: &Guid,
        file: &Guid,
        weak: bool,
        compile_flags: Option<&str>,
    ) -> Guid {
        let existing = self
            .phase_section(kind)
            .and_then(|s| s.get(phase))
            .and_then(|p| {
                p.files.iter().find(|b| {
                    self.build_files()
                        .get(b)
                        .is_some_and(|bf| bf.file_ref.as_ref() == Some(file))
                })
            })
            .cloned();
        if let Some(existing) = existing {
            return existing;
        }

        let guid = self.new_guid();
        self.build_files_mut()
            .insert(BuildFile::new(guid.clone(), file.clone(), weak, compile_flags));
        if let Some(phase) = self.phase_section_mut(kind).and_then(|s| s.get_mut(phase)) {
            phase.files.push(guid.clone());
        }
        debug!(file = %file, phase = %kind, build_file = %guid, "added file to build");
        guid
    }

    /// Remove `file` from every build phase of `target`.
    pub fn remove_file_from_build(&mut self, target: &Guid, file: &Guid) -> Result<(), EditError> {
        let phases = self
            .native_targets()
            .get(target)
            .ok_or_else(|| EditError::not_found("target", target))?
            .phases
            .clone();

        for phase_guid in &phases {
            let Some(kind) = self.kind_of(phase_guid).filter(|k| k.is_phase()) else {
                warn!(target = %target, phase = %phase_guid, "target lists a missing build phase");
                continue;
            };
            let doomed: Vec<Guid> = self
                .phase_section(kind)
                .and_then(|s| s.get(phase_guid))
                .map(|p| {
                    p.files
                        .iter()
                        .filter(|b| {
                            self.build_files()
                                .get(b)
                                .is_some_and(|bf| bf.file_ref.as_ref() == Some(file))
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            for build_file in &doomed {
                if let Some(phase) = self
                    .phase_section_mut(kind)
                    .and_then(|s| s.get_mut(phase_guid))
                {
                    phase.remove_file(build_file);
                }
                self.build_files_mut().remove(build_file);
                debug!(file = %file, build_file = %build_file, "removed file from build");
            }
        }
        Ok(())
    }

    /// Remove a file reference and everything that refers to it: its build
    /// files in every phase and its place in the group tree.
    ///
    /// Nothing is changed when the file or its group cannot be found.
    pub fn remove_file(&mut self, file: &Guid) -> Result<(), EditError> {
        if !self.file_refs().contains(file) {
            return Err(EditError::not_found("file reference", file));
        }
        let (group_kind, group) = self
            .owning_group(file)
            .ok_or_else(|| EditError::not_found("group containing", file))?;

        let build_files: Vec<Guid> = self
            .build_files()
            .iter()
            .filter(|b| b.file_ref.as_ref() == Some(file))
            .map(|b| b.guid().clone())
            .collect();
        for kind in SectionKind::PHASES {
            if let Some(section) = self.phase_section_mut(kind) {
                for phase in section.iter_mut() {
                    for build_file in &build_files {
                        phase.remove_file(build_file);
                    }
                }
            }
        }
        for build_file in &build_files {
            self.build_files_mut().remove(build_file);
        }

        self.file_refs_mut().remove(file);
        let groups = match group_kind {
            SectionKind::VariantGroup => self.variant_groups_mut(),
            _ => self.groups_mut(),
        };
        if let Some(group) = groups.get_mut(&group) {
            group.remove_child(file);
        }
        debug!(file = %file, build_files = build_files.len(), "removed file");
        Ok(())
    }

    // ========================================================================
    // External projects
    // ========================================================================

    /// Reference another Xcode project at `path`, shown at `project_path`.
    /// Returns the GUID of its file reference.
    pub fn add_external_project_dependency(
        &mut self,
        path: &str,
        project_path: &str,
        tree: SourceTree,
    ) -> Result<Guid, EditError> {
        let path = fix_slashes(path);
        let project_path = fix_slashes(project_path);
        if self.project_object().is_none() {
            return Err(EditError::not_found("project object", "rootObject"));
        }

        let products = self.create_source_group("Products")?;
        let (dir, name) = split_path(&project_path);
        let group = self.create_source_group(dir)?;

        let guid = self.new_guid();
        self.insert_entry(AnyEntry::FileReference(FileReference::new(
            guid.clone(),
            &path,
            name,
            tree,
        )))?;
        if let Some(group) = self.groups_mut().get_mut(&group) {
            group.children.push(guid.clone());
        }
        if let Some(root) = self.project_object_mut() {
            root.project_references.push(ProjectReference {
                product_group: products,
                project_ref: guid.clone(),
            });
        }
        debug!(path = %path, guid = %guid, "added external project");
        Ok(guid)
    }

    /// Link `filename`, a product of the external project at `project_path`
    /// (added with [`add_external_project_dependency`](Self::add_external_project_dependency)),
    /// into `target`. `remote_file_guid` is the product's GUID in that project.
    /// Returns the GUID of the new reference proxy.
    pub fn add_external_library_dependency(
        &mut self,
        target: &Guid,
        filename: &str,
        remote_file_guid: &Guid,
        project_path: &str,
        remote_info: &str,
    ) -> Result<Guid, EditError> {
        let filename = fix_slashes(filename);
        let project_path = fix_slashes(project_path);

        let project_file = self
            .find_file_guid_by_real_path(&project_path)
            .ok_or_else(|| EditError::not_found("project file", &project_path))?;
        let product_group = self
            .project_object()
            .and_then(|root| {
                root.project_references
                    .iter()
                    .find(|r| r.project_ref == project_file)
            })
            .map(|r| r.product_group.clone())
            .filter(|g| self.groups().contains(g))
            .ok_or_else(|| EditError::not_found("project reference", &project_path))?;

        let ext = file_types::extension(&filename);
        let kind = file_types::category(&ext)
            .phase()
            .ok_or_else(|| EditError::NotBuildable(ext.clone()))?;
        let phase = self.target_phase(target, kind)?;

        let proxy = self.new_guid();
        self.insert_entry(AnyEntry::ContainerItemProxy(ContainerItemProxy::new(
            proxy.clone(),
            project_file,
            PROXY_TYPE_REFERENCE,
            remote_file_guid.clone(),
            remote_info,
        )))?;

        let reference = self.new_guid();
        let file_type = file_types::type_name(&ext).unwrap_or("file");
        self.insert_entry(AnyEntry::ReferenceProxy(ReferenceProxy::new(
            reference.clone(),
            &filename,
            file_type,
            proxy,
            SourceTree::Build,
        )))?;

        self.put_build_file(kind, &phase, &reference, false, None);
        if let Some(group) = self.groups_mut().get_mut(&product_group) {
            group.children.push(reference.clone());
        }
        debug!(library = %filename, reference = %reference, "added external library");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("a/b/c.m"), ("a/b", "c.m"));
        assert_eq!(split_path("c.m"), ("", "c.m"));
        assert_eq!(split_path("/c.m"), ("", "c.m"));
    }

    #[test]
    fn test_fix_slashes() {
        assert_eq!(fix_slashes("Classes\\Native\\Foo.mm"), "Classes/Native/Foo.mm");
    }
}
