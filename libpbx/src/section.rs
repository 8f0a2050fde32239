//! GUID-keyed collections of entries and the registry of section kinds.

use indexmap::IndexMap;
use std::fmt;

use crate::guid::Guid;
use crate::objects::Entry;

/// The section kinds this crate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    BuildFile,
    ContainerItemProxy,
    CopyFilesBuildPhase,
    FileReference,
    FrameworksBuildPhase,
    Group,
    NativeTarget,
    Project,
    ReferenceProxy,
    ResourcesBuildPhase,
    ShellScriptBuildPhase,
    SourcesBuildPhase,
    TargetDependency,
    VariantGroup,
    BuildConfiguration,
    ConfigurationList,
}

impl SectionKind {
    /// Order in which known sections are laid out in a new document.
    pub const DEFAULT_ORDER: [SectionKind; 16] = [
        SectionKind::BuildFile,
        SectionKind::ContainerItemProxy,
        SectionKind::CopyFilesBuildPhase,
        SectionKind::FileReference,
        SectionKind::FrameworksBuildPhase,
        SectionKind::Group,
        SectionKind::NativeTarget,
        SectionKind::Project,
        SectionKind::ReferenceProxy,
        SectionKind::ResourcesBuildPhase,
        SectionKind::ShellScriptBuildPhase,
        SectionKind::SourcesBuildPhase,
        SectionKind::TargetDependency,
        SectionKind::VariantGroup,
        SectionKind::BuildConfiguration,
        SectionKind::ConfigurationList,
    ];

    /// The build phase sections, which all hold [`BuildPhase`](crate::BuildPhase).
    pub const PHASES: [SectionKind; 5] = [
        SectionKind::SourcesBuildPhase,
        SectionKind::FrameworksBuildPhase,
        SectionKind::ResourcesBuildPhase,
        SectionKind::CopyFilesBuildPhase,
        SectionKind::ShellScriptBuildPhase,
    ];

    /// The section name, which is also the `isa` of its entries.
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::BuildFile => "PBXBuildFile",
            SectionKind::ContainerItemProxy => "PBXContainerItemProxy",
            SectionKind::CopyFilesBuildPhase => "PBXCopyFilesBuildPhase",
            SectionKind::FileReference => "PBXFileReference",
            SectionKind::FrameworksBuildPhase => "PBXFrameworksBuildPhase",
            SectionKind::Group => "PBXGroup",
            SectionKind::NativeTarget => "PBXNativeTarget",
            SectionKind::Project => "PBXProject",
            SectionKind::ReferenceProxy => "PBXReferenceProxy",
            SectionKind::ResourcesBuildPhase => "PBXResourcesBuildPhase",
            SectionKind::ShellScriptBuildPhase => "PBXShellScriptBuildPhase",
            SectionKind::SourcesBuildPhase => "PBXSourcesBuildPhase",
            SectionKind::TargetDependency => "PBXTargetDependency",
            SectionKind::VariantGroup => "PBXVariantGroup",
            SectionKind::BuildConfiguration => "XCBuildConfiguration",
            SectionKind::ConfigurationList => "XCConfigurationList",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::DEFAULT_ORDER.into_iter().find(|k| k.name() == name)
    }

    /// Whether entries of this kind are written on a single line.
    pub fn is_compact(self) -> bool {
        matches!(self, SectionKind::BuildFile | SectionKind::FileReference)
    }

    pub fn is_phase(self) -> bool {
        Self::PHASES.contains(&self)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A name in the section order: a modelled kind or a passthrough section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionName {
    Known(SectionKind),
    Opaque(String),
}

impl SectionName {
    pub fn from_name(name: &str) -> Self {
        match SectionKind::from_name(name) {
            Some(kind) => SectionName::Known(kind),
            None => SectionName::Opaque(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectionName::Known(kind) => kind.name(),
            SectionName::Opaque(name) => name,
        }
    }
}

/// Entries of one schema, indexed by GUID, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    entries: IndexMap<Guid, T>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Entry> Section<T> {
    pub fn get(&self, guid: &Guid) -> Option<&T> {
        self.entries.get(guid)
    }

    /// Mutable access for in-place edits of an existing entry.
    pub fn get_mut(&mut self, guid: &Guid) -> Option<&mut T> {
        self.entries.get_mut(guid)
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.entries.contains_key(guid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    pub fn guids(&self) -> impl Iterator<Item = &Guid> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callers check project-wide uniqueness first.
    pub(crate) fn insert(&mut self, entry: T) {
        self.entries.insert(entry.guid().clone(), entry);
    }

    pub(crate) fn remove(&mut self, guid: &Guid) -> Option<T> {
        self.entries.shift_remove(guid)
    }
}

impl<'a, T> IntoIterator for &'a Section<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, Guid, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// A section with no schema, kept as the raw lines between its markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueSection {
    pub name: String,
    pub lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in SectionKind::DEFAULT_ORDER {
            assert_eq!(SectionKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(SectionKind::from_name("PBXLegacyTarget"), None);
        assert_eq!(
            SectionName::from_name("PBXLegacyTarget"),
            SectionName::Opaque("PBXLegacyTarget".to_string())
        );
    }

    #[test]
    fn test_phase_kinds() {
        assert!(SectionKind::CopyFilesBuildPhase.is_phase());
        assert!(!SectionKind::BuildFile.is_phase());
        assert!(SectionKind::BuildFile.is_compact());
        assert!(!SectionKind::Group.is_compact());
    }
}
