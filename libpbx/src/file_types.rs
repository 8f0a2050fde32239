//! File extension table: Xcode file type names and which build phase a file
//! of each type belongs to.

use std::path::Path;

use crate::section::SectionKind;

/// How a file takes part in a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Referenced from the project but never built (headers, products).
    NotBuildable,
    Source,
    Resource,
    Framework,
    /// Embedded by a copy-files phase (app extensions).
    CopyFile,
}

impl FileCategory {
    /// The build phase section that holds files of this category.
    pub fn phase(self) -> Option<SectionKind> {
        match self {
            FileCategory::NotBuildable => None,
            FileCategory::Source => Some(SectionKind::SourcesBuildPhase),
            FileCategory::Resource => Some(SectionKind::ResourcesBuildPhase),
            FileCategory::Framework => Some(SectionKind::FrameworksBuildPhase),
            FileCategory::CopyFile => Some(SectionKind::CopyFilesBuildPhase),
        }
    }
}

const TYPES: &[(&str, &str, FileCategory)] = &[
    (".a", "archive.ar", FileCategory::Framework),
    (".app", "wrapper.application", FileCategory::NotBuildable),
    (".appex", "wrapper.app-extension", FileCategory::CopyFile),
    (".bin", "archive.macbinary", FileCategory::Resource),
    (".s", "sourcecode.asm", FileCategory::Source),
    (".c", "sourcecode.c.c", FileCategory::Source),
    (".cc", "sourcecode.cpp.cpp", FileCategory::Source),
    (".cpp", "sourcecode.cpp.cpp", FileCategory::Source),
    (".swift", "sourcecode.swift", FileCategory::Source),
    (".dll", "file", FileCategory::Resource),
    (".framework", "wrapper.framework", FileCategory::Framework),
    (".h", "sourcecode.c.h", FileCategory::NotBuildable),
    (".pch", "sourcecode.c.h", FileCategory::NotBuildable),
    (".icns", "image.icns", FileCategory::Resource),
    (".xcassets", "folder.assetcatalog", FileCategory::Resource),
    (".inc", "sourcecode.inc", FileCategory::NotBuildable),
    (".m", "sourcecode.c.objc", FileCategory::Source),
    (".mm", "sourcecode.cpp.objcpp", FileCategory::Source),
    (".nib", "wrapper.nib", FileCategory::Resource),
    (".plist", "text.plist.xml", FileCategory::Resource),
    (".png", "image.png", FileCategory::Resource),
    (".rtf", "text.rtf", FileCategory::Resource),
    (".tiff", "image.tiff", FileCategory::Resource),
    (".txt", "text", FileCategory::Resource),
    (".json", "text.json", FileCategory::Resource),
    (".xcodeproj", "wrapper.pb-project", FileCategory::NotBuildable),
    (".xib", "file.xib", FileCategory::Resource),
    (".strings", "text.plist.strings", FileCategory::Resource),
    (".storyboard", "file.storyboard", FileCategory::Resource),
    (".bundle", "wrapper.plug-in", FileCategory::Resource),
    (".dylib", "compiled.mach-o.dylib", FileCategory::Framework),
    (".tbd", "sourcecode.text-based-dylib-definition", FileCategory::Framework),
];

/// Lowercased extension of `path` including the dot, or `""` when it has none.
pub fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn lookup(ext: &str) -> Option<&'static (&'static str, &'static str, FileCategory)> {
    let ext = ext.to_lowercase();
    TYPES.iter().find(|(e, _, _)| *e == ext)
}

/// Xcode's name for the type of files with extension `ext`.
pub fn type_name(ext: &str) -> Option<&'static str> {
    lookup(ext).map(|(_, name, _)| *name)
}

/// Build category of `ext`. Files without an extension are not built;
/// unknown extensions are treated as resources.
pub fn category(ext: &str) -> FileCategory {
    if ext.is_empty() {
        return FileCategory::NotBuildable;
    }
    lookup(ext).map_or(FileCategory::Resource, |(_, _, category)| *category)
}

pub fn is_buildable(ext: &str) -> bool {
    category(ext) != FileCategory::NotBuildable
}

/// Build products get an explicit file type rather than a last known one.
pub fn is_product_wrapper(ext: &str) -> bool {
    matches!(ext.to_lowercase().as_str(), ".app" | ".appex")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("Classes/Foo.M"), ".m");
        assert_eq!(extension("System/Library/Frameworks/UIKit.framework"), ".framework");
        assert_eq!(extension("Makefile"), "");
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(type_name(".PNG"), Some("image.png"));
        assert_eq!(type_name(".unknown"), None);
        assert_eq!(category(".MM"), FileCategory::Source);
    }

    #[test]
    fn test_categories() {
        assert_eq!(category(".h"), FileCategory::NotBuildable);
        assert_eq!(category(".appex"), FileCategory::CopyFile);
        assert_eq!(category(".dat"), FileCategory::Resource);
        assert_eq!(category(""), FileCategory::NotBuildable);
        assert!(is_buildable(".tbd"));
        assert!(!is_buildable(".xcodeproj"));
        assert_eq!(
            category(".a").phase(),
            Some(SectionKind::FrameworksBuildPhase)
        );
        assert_eq!(category(".h").phase(), None);
    }

    #[test]
    fn test_product_wrappers() {
        assert!(is_product_wrapper(".app"));
        assert!(is_product_wrapper(".appex"));
        assert!(!is_product_wrapper(".framework"));
    }
}
