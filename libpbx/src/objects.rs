//! Typed entries of the object table.
//!
//! Each entry keeps the full property dictionary it was read from, so
//! properties it does not model survive a round trip in their original
//! position. The typed fields are authoritative for their own keys and are
//! written back over the dictionary on output: existing keys keep their
//! place, new keys are appended and cleared optional fields are removed.

use crate::guid::Guid;
use crate::section::SectionKind;
use crate::value::{Dict, Value};

/// Common interface of every typed entry.
pub trait Entry: Sized {
    /// GUID keying this entry.
    fn guid(&self) -> &Guid;

    /// Build the typed entry from its parsed property dictionary.
    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String>;

    /// Property dictionary to serialize, typed fields applied.
    fn to_dict(&self) -> Dict;
}

// ============================================================================
// Field helpers
// ============================================================================

fn string_field(props: &Dict, key: &str) -> Result<Option<String>, String> {
    match props.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("\"{}\" must be a string", key)),
    }
}

fn guid_field(props: &Dict, key: &str) -> Result<Option<Guid>, String> {
    Ok(string_field(props, key)?.map(Guid::new))
}

fn guid_list(props: &Dict, key: &str) -> Result<Vec<Guid>, String> {
    match props.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(Guid::new(s.as_str())),
                _ => Err(format!("\"{}\" must list GUIDs", key)),
            })
            .collect(),
        Some(_) => Err(format!("\"{}\" must be a list", key)),
    }
}

fn put_string(props: &mut Dict, key: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            props.insert(key.to_string(), Value::from(v));
        }
        None => {
            props.shift_remove(key);
        }
    }
}

fn put_guid(props: &mut Dict, key: &str, value: Option<&Guid>) {
    put_string(props, key, value.map(Guid::as_str));
}

/// Lists that were never present stay absent while empty.
fn put_guid_list(props: &mut Dict, key: &str, items: &[Guid]) {
    if items.is_empty() && !props.contains_key(key) {
        return;
    }
    let arr = items.iter().map(|g| Value::from(g.as_str())).collect();
    props.insert(key.to_string(), Value::Array(arr));
}

fn with_isa(isa: &str) -> Dict {
    let mut props = Dict::new();
    props.insert("isa".to_string(), Value::from(isa));
    props
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}

// ============================================================================
// Source trees
// ============================================================================

/// What a reference's path is relative to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceTree {
    /// `<absolute>`
    Absolute,
    /// `<group>`
    Group,
    /// `BUILT_PRODUCTS_DIR`
    Build,
    /// `DEVELOPER_DIR`
    Developer,
    /// `SDKROOT`
    Sdk,
    /// `SOURCE_ROOT`
    Source,
    /// Any other build-setting name.
    Other(String),
}

impl SourceTree {
    pub fn as_str(&self) -> &str {
        match self {
            SourceTree::Absolute => "<absolute>",
            SourceTree::Group => "<group>",
            SourceTree::Build => "BUILT_PRODUCTS_DIR",
            SourceTree::Developer => "DEVELOPER_DIR",
            SourceTree::Sdk => "SDKROOT",
            SourceTree::Source => "SOURCE_ROOT",
            SourceTree::Other(s) => s,
        }
    }

    pub fn from_name(s: &str) -> Self {
        match s {
            "<absolute>" => SourceTree::Absolute,
            "<group>" => SourceTree::Group,
            "BUILT_PRODUCTS_DIR" => SourceTree::Build,
            "DEVELOPER_DIR" => SourceTree::Developer,
            "SDKROOT" => SourceTree::Sdk,
            "SOURCE_ROOT" => SourceTree::Source,
            other => SourceTree::Other(other.to_string()),
        }
    }
}

// ============================================================================
// PBXBuildFile
// ============================================================================

/// Membership of one file in one build phase.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFile {
    guid: Guid,
    pub file_ref: Option<Guid>,
    props: Dict,
}

impl BuildFile {
    pub fn new(guid: Guid, file_ref: Guid, weak: bool, compile_flags: Option<&str>) -> Self {
        let mut props = with_isa("PBXBuildFile");
        props.insert("fileRef".to_string(), Value::from(file_ref.as_str()));
        let mut settings = Dict::new();
        if let Some(flags) = compile_flags.filter(|f| !f.is_empty()) {
            settings.insert("COMPILER_FLAGS".to_string(), Value::from(flags));
        }
        if weak {
            settings.insert(
                "ATTRIBUTES".to_string(),
                Value::Array(vec![Value::from("Weak")]),
            );
        }
        if !settings.is_empty() {
            props.insert("settings".to_string(), Value::Dict(settings));
        }
        Self {
            guid,
            file_ref: Some(file_ref),
            props,
        }
    }

    fn settings(&self) -> Option<&Dict> {
        self.props.get("settings").and_then(Value::as_dict)
    }

    pub fn compile_flags(&self) -> Option<&str> {
        self.settings()?.get("COMPILER_FLAGS")?.as_str()
    }

    pub fn is_weak(&self) -> bool {
        self.settings()
            .and_then(|s| s.get("ATTRIBUTES"))
            .is_some_and(|attrs| attrs.string_items().contains(&"Weak"))
    }
}

impl Entry for BuildFile {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            file_ref: guid_field(&props, "fileRef")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid(&mut props, "fileRef", self.file_ref.as_ref());
        props
    }
}

// ============================================================================
// PBXFileReference
// ============================================================================

/// A file on disk (or in an SDK, or a build product) known to the project.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReference {
    guid: Guid,
    pub name: Option<String>,
    pub path: Option<String>,
    /// Absent when the document leaves it out; Xcode reads that as `<group>`.
    pub source_tree: Option<SourceTree>,
    props: Dict,
}

impl FileReference {
    /// Create a reference to `path`, displayed as `name`.
    pub fn new(guid: Guid, path: &str, name: &str, tree: SourceTree) -> Self {
        let mut props = with_isa("PBXFileReference");
        let ext = crate::file_types::extension(path);
        if let Some(type_name) = crate::file_types::type_name(&ext) {
            if crate::file_types::is_product_wrapper(&ext) {
                props.insert("explicitFileType".to_string(), Value::from(type_name));
                props.insert("includeInIndex".to_string(), Value::from("0"));
            } else {
                props.insert("lastKnownFileType".to_string(), Value::from(type_name));
            }
        }
        Self {
            guid,
            name: Some(name.to_string()),
            path: Some(path.to_string()),
            source_tree: Some(tree),
            props,
        }
    }

    /// Name shown in Xcode: the name, falling back to the path.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or_default()
    }
}

impl Entry for FileReference {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            name: string_field(&props, "name")?,
            path: string_field(&props, "path")?,
            source_tree: string_field(&props, "sourceTree")?.map(|s| SourceTree::from_name(&s)),
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_string(&mut props, "name", self.name.as_deref());
        put_string(&mut props, "path", self.path.as_deref());
        put_string(
            &mut props,
            "sourceTree",
            self.source_tree.as_ref().map(SourceTree::as_str),
        );
        props
    }
}

// ============================================================================
// PBXGroup / PBXVariantGroup
// ============================================================================

/// A folder in the project navigator. Also used for variant groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    guid: Guid,
    pub name: Option<String>,
    pub path: Option<String>,
    pub children: Vec<Guid>,
    props: Dict,
}

impl Group {
    pub fn new(guid: Guid, name: &str) -> Self {
        let mut props = with_isa("PBXGroup");
        props.insert("children".to_string(), empty_list());
        props.insert("name".to_string(), Value::from(name));
        props.insert(
            "sourceTree".to_string(),
            Value::from(SourceTree::Group.as_str()),
        );
        Self {
            guid,
            name: Some(name.to_string()),
            path: None,
            children: Vec::new(),
            props,
        }
    }

    /// Name shown in Xcode: the name, falling back to the path.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or_default()
    }

    pub(crate) fn remove_child(&mut self, child: &Guid) -> bool {
        let before = self.children.len();
        self.children.retain(|g| g != child);
        self.children.len() != before
    }
}

impl Entry for Group {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            name: string_field(&props, "name")?,
            path: string_field(&props, "path")?,
            children: guid_list(&props, "children")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid_list(&mut props, "children", &self.children);
        put_string(&mut props, "name", self.name.as_deref());
        put_string(&mut props, "path", self.path.as_deref());
        props
    }
}

// ============================================================================
// PBXContainerItemProxy
// ============================================================================

/// Indirection to an object living in this or another project file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerItemProxy {
    guid: Guid,
    pub container_portal: Option<Guid>,
    pub proxy_type: Option<String>,
    pub remote_global_id: Option<Guid>,
    pub remote_info: Option<String>,
    props: Dict,
}

impl ContainerItemProxy {
    pub fn new(
        guid: Guid,
        container_portal: Guid,
        proxy_type: &str,
        remote_global_id: Guid,
        remote_info: &str,
    ) -> Self {
        Self {
            guid,
            container_portal: Some(container_portal),
            proxy_type: Some(proxy_type.to_string()),
            remote_global_id: Some(remote_global_id),
            remote_info: Some(remote_info.to_string()),
            props: with_isa("PBXContainerItemProxy"),
        }
    }
}

impl Entry for ContainerItemProxy {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            container_portal: guid_field(&props, "containerPortal")?,
            proxy_type: string_field(&props, "proxyType")?,
            remote_global_id: guid_field(&props, "remoteGlobalIDString")?,
            remote_info: string_field(&props, "remoteInfo")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid(&mut props, "containerPortal", self.container_portal.as_ref());
        put_string(&mut props, "proxyType", self.proxy_type.as_deref());
        put_guid(
            &mut props,
            "remoteGlobalIDString",
            self.remote_global_id.as_ref(),
        );
        put_string(&mut props, "remoteInfo", self.remote_info.as_deref());
        props
    }
}

// ============================================================================
// PBXReferenceProxy
// ============================================================================

/// A product of another project, referenced through a container proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceProxy {
    guid: Guid,
    pub file_type: Option<String>,
    pub path: Option<String>,
    pub remote_ref: Option<Guid>,
    pub source_tree: Option<SourceTree>,
    props: Dict,
}

impl ReferenceProxy {
    pub fn new(
        guid: Guid,
        path: &str,
        file_type: &str,
        remote_ref: Guid,
        source_tree: SourceTree,
    ) -> Self {
        Self {
            guid,
            file_type: Some(file_type.to_string()),
            path: Some(path.to_string()),
            remote_ref: Some(remote_ref),
            source_tree: Some(source_tree),
            props: with_isa("PBXReferenceProxy"),
        }
    }
}

impl Entry for ReferenceProxy {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            file_type: string_field(&props, "fileType")?,
            path: string_field(&props, "path")?,
            remote_ref: guid_field(&props, "remoteRef")?,
            source_tree: string_field(&props, "sourceTree")?.map(|s| SourceTree::from_name(&s)),
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_string(&mut props, "fileType", self.file_type.as_deref());
        put_string(&mut props, "path", self.path.as_deref());
        put_guid(&mut props, "remoteRef", self.remote_ref.as_ref());
        put_string(
            &mut props,
            "sourceTree",
            self.source_tree.as_ref().map(SourceTree::as_str),
        );
        props
    }
}

// ============================================================================
// Build phases
// ============================================================================

/// Default `buildActionMask` Xcode writes for new phases.
const BUILD_ACTION_MASK: &str = "2147483647";

/// An ordered list of build files processed at one stage of a build.
///
/// Shared by the sources, frameworks, resources, copy-files and shell-script
/// phase sections; only copy-files and shell-script phases carry a name.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPhase {
    guid: Guid,
    pub name: Option<String>,
    pub files: Vec<Guid>,
    props: Dict,
}

impl BuildPhase {
    /// A plain phase of the given `isa` (sources, frameworks, resources).
    pub fn new(guid: Guid, isa: &str) -> Self {
        let mut props = with_isa(isa);
        props.insert("buildActionMask".to_string(), Value::from(BUILD_ACTION_MASK));
        props.insert("files".to_string(), empty_list());
        props.insert(
            "runOnlyForDeploymentPostprocessing".to_string(),
            Value::from("0"),
        );
        Self {
            guid,
            name: None,
            files: Vec::new(),
            props,
        }
    }

    pub fn copy_files(guid: Guid, name: &str, dst_path: &str, subfolder_spec: &str) -> Self {
        let mut props = with_isa("PBXCopyFilesBuildPhase");
        props.insert("buildActionMask".to_string(), Value::from(BUILD_ACTION_MASK));
        props.insert("dstPath".to_string(), Value::from(dst_path));
        props.insert("dstSubfolderSpec".to_string(), Value::from(subfolder_spec));
        props.insert("files".to_string(), empty_list());
        props.insert("name".to_string(), Value::from(name));
        props.insert(
            "runOnlyForDeploymentPostprocessing".to_string(),
            Value::from("0"),
        );
        Self {
            guid,
            name: Some(name.to_string()),
            files: Vec::new(),
            props,
        }
    }

    pub fn shell_script(guid: Guid, name: &str, shell_path: &str, script: &str) -> Self {
        let mut props = with_isa("PBXShellScriptBuildPhase");
        props.insert("buildActionMask".to_string(), Value::from(BUILD_ACTION_MASK));
        props.insert("files".to_string(), empty_list());
        props.insert("inputPaths".to_string(), empty_list());
        props.insert("name".to_string(), Value::from(name));
        props.insert("outputPaths".to_string(), empty_list());
        props.insert(
            "runOnlyForDeploymentPostprocessing".to_string(),
            Value::from("0"),
        );
        props.insert("shellPath".to_string(), Value::from(shell_path));
        props.insert("shellScript".to_string(), Value::from(script));
        Self {
            guid,
            name: Some(name.to_string()),
            files: Vec::new(),
            props,
        }
    }

    pub(crate) fn remove_file(&mut self, build_file: &Guid) -> bool {
        let before = self.files.len();
        self.files.retain(|g| g != build_file);
        self.files.len() != before
    }
}

impl Entry for BuildPhase {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            name: string_field(&props, "name")?,
            files: guid_list(&props, "files")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid_list(&mut props, "files", &self.files);
        put_string(&mut props, "name", self.name.as_deref());
        props
    }
}

// ============================================================================
// PBXNativeTarget
// ============================================================================

/// A product built from sources: app, extension, framework, library.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTarget {
    guid: Guid,
    pub name: Option<String>,
    pub build_config_list: Option<Guid>,
    pub phases: Vec<Guid>,
    pub dependencies: Vec<Guid>,
    pub product_reference: Option<Guid>,
    pub product_type: Option<String>,
    props: Dict,
}

impl NativeTarget {
    pub fn new(
        guid: Guid,
        name: &str,
        product_reference: Guid,
        product_type: &str,
        build_config_list: Guid,
    ) -> Self {
        let mut props = with_isa("PBXNativeTarget");
        props.insert("buildConfigurationList".to_string(), Value::from(""));
        props.insert("buildPhases".to_string(), empty_list());
        props.insert("buildRules".to_string(), empty_list());
        props.insert("dependencies".to_string(), empty_list());
        props.insert("name".to_string(), Value::from(name));
        props.insert("productName".to_string(), Value::from(name));
        Self {
            guid,
            name: Some(name.to_string()),
            build_config_list: Some(build_config_list),
            phases: Vec::new(),
            dependencies: Vec::new(),
            product_reference: Some(product_reference),
            product_type: Some(product_type.to_string()),
            props,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl Entry for NativeTarget {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            name: string_field(&props, "name")?,
            build_config_list: guid_field(&props, "buildConfigurationList")?,
            phases: guid_list(&props, "buildPhases")?,
            dependencies: guid_list(&props, "dependencies")?,
            product_reference: guid_field(&props, "productReference")?,
            product_type: string_field(&props, "productType")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid(
            &mut props,
            "buildConfigurationList",
            self.build_config_list.as_ref(),
        );
        put_guid_list(&mut props, "buildPhases", &self.phases);
        put_guid_list(&mut props, "dependencies", &self.dependencies);
        put_string(&mut props, "name", self.name.as_deref());
        put_guid(&mut props, "productReference", self.product_reference.as_ref());
        put_string(&mut props, "productType", self.product_type.as_deref());
        props
    }
}

// ============================================================================
// PBXTargetDependency
// ============================================================================

/// A target that must be built before another.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDependency {
    guid: Guid,
    pub target: Option<Guid>,
    pub target_proxy: Option<Guid>,
    props: Dict,
}

impl TargetDependency {
    pub fn new(guid: Guid, target: Guid, target_proxy: Guid) -> Self {
        Self {
            guid,
            target: Some(target),
            target_proxy: Some(target_proxy),
            props: with_isa("PBXTargetDependency"),
        }
    }
}

impl Entry for TargetDependency {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            target: guid_field(&props, "target")?,
            target_proxy: guid_field(&props, "targetProxy")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid(&mut props, "target", self.target.as_ref());
        put_guid(&mut props, "targetProxy", self.target_proxy.as_ref());
        props
    }
}

// ============================================================================
// XCBuildConfiguration
// ============================================================================

/// A named set of build settings (Debug, Release, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfiguration {
    guid: Guid,
    pub name: Option<String>,
    pub build_settings: Dict,
    props: Dict,
}

impl BuildConfiguration {
    pub fn new(guid: Guid, name: &str) -> Self {
        let mut props = with_isa("XCBuildConfiguration");
        props.insert("buildSettings".to_string(), Value::Dict(Dict::new()));
        Self {
            guid,
            name: Some(name.to_string()),
            build_settings: Dict::new(),
            props,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.build_settings.get(name)
    }

    /// Add `value` to a property, turning a single value into a list.
    pub fn add_property(&mut self, name: &str, value: &str) {
        match self.build_settings.get_mut(name) {
            None => {
                self.build_settings
                    .insert(name.to_string(), Value::from(value));
            }
            Some(slot @ Value::String(_)) => {
                if slot.as_str() != Some(value) {
                    let first = std::mem::replace(slot, Value::Array(Vec::new()));
                    *slot = Value::Array(vec![first, Value::from(value)]);
                }
            }
            Some(Value::Array(items)) => {
                if !items.iter().any(|v| v.as_str() == Some(value)) {
                    items.push(Value::from(value));
                }
            }
            Some(slot @ Value::Dict(_)) => {
                *slot = Value::from(value);
            }
        }
    }

    /// Replace a property with a single value.
    pub fn set_property(&mut self, name: &str, value: &str) {
        self.build_settings
            .insert(name.to_string(), Value::from(value));
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.build_settings.shift_remove(name)
    }

    /// Treat a property as a set of values: drop `remove`, then append the
    /// members of `add` that are missing.
    pub fn update_property(&mut self, name: &str, add: &[&str], remove: &[&str]) {
        let (mut items, as_array): (Vec<String>, bool) = match self.build_settings.get(name) {
            None => (Vec::new(), false),
            Some(Value::String(s)) => (s.split_whitespace().map(String::from).collect(), false),
            Some(Value::Array(arr)) => (
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect(),
                true,
            ),
            Some(Value::Dict(_)) => (Vec::new(), false),
        };

        items.retain(|item| !remove.contains(&item.as_str()));
        for value in add {
            if !items.iter().any(|item| item == value) {
                items.push((*value).to_string());
            }
        }

        if items.is_empty() {
            self.build_settings.shift_remove(name);
        } else if as_array {
            let arr = items.into_iter().map(Value::from).collect();
            self.build_settings
                .insert(name.to_string(), Value::Array(arr));
        } else {
            self.build_settings
                .insert(name.to_string(), Value::from(items.join(" ")));
        }
    }
}

impl Entry for BuildConfiguration {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        let build_settings = match props.get("buildSettings") {
            None => Dict::new(),
            Some(Value::Dict(d)) => d.clone(),
            Some(_) => return Err("\"buildSettings\" must be a dictionary".to_string()),
        };
        Ok(Self {
            guid,
            name: string_field(&props, "name")?,
            build_settings,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        props.insert(
            "buildSettings".to_string(),
            Value::Dict(self.build_settings.clone()),
        );
        put_string(&mut props, "name", self.name.as_deref());
        props
    }
}

// ============================================================================
// XCConfigurationList
// ============================================================================

/// The configurations owned by a target or by the project.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationList {
    guid: Guid,
    pub build_configs: Vec<Guid>,
    props: Dict,
}

impl ConfigurationList {
    pub fn new(guid: Guid) -> Self {
        let mut props = with_isa("XCConfigurationList");
        props.insert("buildConfigurations".to_string(), empty_list());
        props.insert(
            "defaultConfigurationIsVisible".to_string(),
            Value::from("0"),
        );
        props.insert(
            "defaultConfigurationName".to_string(),
            Value::from("Release"),
        );
        Self {
            guid,
            build_configs: Vec::new(),
            props,
        }
    }
}

impl Entry for ConfigurationList {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            build_configs: guid_list(&props, "buildConfigurations")?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid_list(&mut props, "buildConfigurations", &self.build_configs);
        props
    }
}

// ============================================================================
// PBXProject
// ============================================================================

/// One `projectReferences` item: an external project and the group that
/// holds its products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReference {
    pub product_group: Guid,
    pub project_ref: Guid,
}

/// The root object of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectObject {
    guid: Guid,
    pub main_group: Option<Guid>,
    pub build_config_list: Option<Guid>,
    pub targets: Vec<Guid>,
    pub project_references: Vec<ProjectReference>,
    props: Dict,
}

impl ProjectObject {
    /// Run `f` on the dictionary at `path` inside `attributes`, creating
    /// the levels on first use.
    pub fn with_attributes<R>(&mut self, path: &[&str], f: impl FnOnce(&mut Dict) -> R) -> R {
        let full = [&["attributes"][..], path].concat();
        crate::value::with_dict_path(&mut self.props, &full, f)
    }

    pub fn attributes(&self) -> Option<&Dict> {
        self.props.get("attributes").and_then(Value::as_dict)
    }
}

fn project_references(props: &Dict) -> Result<Vec<ProjectReference>, String> {
    let Some(value) = props.get("projectReferences") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| "\"projectReferences\" must be a list".to_string())?;
    items
        .iter()
        .map(|item| {
            let dict = item
                .as_dict()
                .ok_or_else(|| "\"projectReferences\" must list dictionaries".to_string())?;
            match (guid_field(dict, "ProductGroup")?, guid_field(dict, "ProjectRef")?) {
                (Some(product_group), Some(project_ref)) => Ok(ProjectReference {
                    product_group,
                    project_ref,
                }),
                _ => Err("project reference lacks ProductGroup or ProjectRef".to_string()),
            }
        })
        .collect()
}

impl Entry for ProjectObject {
    fn guid(&self) -> &Guid {
        &self.guid
    }

    fn from_dict(guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(Self {
            guid,
            main_group: guid_field(&props, "mainGroup")?,
            build_config_list: guid_field(&props, "buildConfigurationList")?,
            targets: guid_list(&props, "targets")?,
            project_references: project_references(&props)?,
            props,
        })
    }

    fn to_dict(&self) -> Dict {
        let mut props = self.props.clone();
        put_guid(
            &mut props,
            "buildConfigurationList",
            self.build_config_list.as_ref(),
        );
        put_guid(&mut props, "mainGroup", self.main_group.as_ref());
        if !self.project_references.is_empty() || props.contains_key("projectReferences") {
            let refs = self
                .project_references
                .iter()
                .map(|r| {
                    let mut dict = Dict::new();
                    dict.insert(
                        "ProductGroup".to_string(),
                        Value::from(r.product_group.as_str()),
                    );
                    dict.insert("ProjectRef".to_string(), Value::from(r.project_ref.as_str()));
                    Value::Dict(dict)
                })
                .collect();
            props.insert("projectReferences".to_string(), Value::Array(refs));
        }
        put_guid_list(&mut props, "targets", &self.targets);
        props
    }
}

// ============================================================================
// AnyEntry
// ============================================================================

/// An entry of any known section, tagged by the section it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyEntry {
    BuildFile(BuildFile),
    FileReference(FileReference),
    Group(Group),
    ContainerItemProxy(ContainerItemProxy),
    ReferenceProxy(ReferenceProxy),
    SourcesBuildPhase(BuildPhase),
    FrameworksBuildPhase(BuildPhase),
    ResourcesBuildPhase(BuildPhase),
    CopyFilesBuildPhase(BuildPhase),
    ShellScriptBuildPhase(BuildPhase),
    NativeTarget(NativeTarget),
    TargetDependency(TargetDependency),
    VariantGroup(Group),
    BuildConfiguration(BuildConfiguration),
    ConfigurationList(ConfigurationList),
    Project(ProjectObject),
}

impl AnyEntry {
    /// Build the typed entry for a section of kind `kind`.
    pub fn from_dict(kind: SectionKind, guid: Guid, props: Dict) -> Result<Self, String> {
        Ok(match kind {
            SectionKind::BuildFile => AnyEntry::BuildFile(BuildFile::from_dict(guid, props)?),
            SectionKind::FileReference => {
                AnyEntry::FileReference(FileReference::from_dict(guid, props)?)
            }
            SectionKind::Group => AnyEntry::Group(Group::from_dict(guid, props)?),
            SectionKind::ContainerItemProxy => {
                AnyEntry::ContainerItemProxy(ContainerItemProxy::from_dict(guid, props)?)
            }
            SectionKind::ReferenceProxy => {
                AnyEntry::ReferenceProxy(ReferenceProxy::from_dict(guid, props)?)
            }
            SectionKind::SourcesBuildPhase => {
                AnyEntry::SourcesBuildPhase(BuildPhase::from_dict(guid, props)?)
            }
            SectionKind::FrameworksBuildPhase => {
                AnyEntry::FrameworksBuildPhase(BuildPhase::from_dict(guid, props)?)
            }
            SectionKind::ResourcesBuildPhase => {
                AnyEntry::ResourcesBuildPhase(BuildPhase::from_dict(guid, props)?)
            }
            SectionKind::CopyFilesBuildPhase => {
                AnyEntry::CopyFilesBuildPhase(BuildPhase::from_dict(guid, props)?)
            }
            SectionKind::ShellScriptBuildPhase => {
                AnyEntry::ShellScriptBuildPhase(BuildPhase::from_dict(guid, props)?)
            }
            SectionKind::NativeTarget => {
                AnyEntry::NativeTarget(NativeTarget::from_dict(guid, props)?)
            }
            SectionKind::TargetDependency => {
                AnyEntry::TargetDependency(TargetDependency::from_dict(guid, props)?)
            }
            SectionKind::VariantGroup => AnyEntry::VariantGroup(Group::from_dict(guid, props)?),
            SectionKind::BuildConfiguration => {
                AnyEntry::BuildConfiguration(BuildConfiguration::from_dict(guid, props)?)
            }
            SectionKind::ConfigurationList => {
                AnyEntry::ConfigurationList(ConfigurationList::from_dict(guid, props)?)
            }
            SectionKind::Project => AnyEntry::Project(ProjectObject::from_dict(guid, props)?),
        })
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            AnyEntry::BuildFile(_) => SectionKind::BuildFile,
            AnyEntry::FileReference(_) => SectionKind::FileReference,
            AnyEntry::Group(_) => SectionKind::Group,
            AnyEntry::ContainerItemProxy(_) => SectionKind::ContainerItemProxy,
            AnyEntry::ReferenceProxy(_) => SectionKind::ReferenceProxy,
            AnyEntry::SourcesBuildPhase(_) => SectionKind::SourcesBuildPhase,
            AnyEntry::FrameworksBuildPhase(_) => SectionKind::FrameworksBuildPhase,
            AnyEntry::ResourcesBuildPhase(_) => SectionKind::ResourcesBuildPhase,
            AnyEntry::CopyFilesBuildPhase(_) => SectionKind::CopyFilesBuildPhase,
            AnyEntry::ShellScriptBuildPhase(_) => SectionKind::ShellScriptBuildPhase,
            AnyEntry::NativeTarget(_) => SectionKind::NativeTarget,
            AnyEntry::TargetDependency(_) => SectionKind::TargetDependency,
            AnyEntry::VariantGroup(_) => SectionKind::VariantGroup,
            AnyEntry::BuildConfiguration(_) => SectionKind::BuildConfiguration,
            AnyEntry::ConfigurationList(_) => SectionKind::ConfigurationList,
            AnyEntry::Project(_) => SectionKind::Project,
        }
    }

    pub fn guid(&self) -> &Guid {
        match self {
            AnyEntry::BuildFile(e) => e.guid(),
            AnyEntry::FileReference(e) => e.guid(),
            AnyEntry::Group(e) | AnyEntry::VariantGroup(e) => e.guid(),
            AnyEntry::ContainerItemProxy(e) => e.guid(),
            AnyEntry::ReferenceProxy(e) => e.guid(),
            AnyEntry::SourcesBuildPhase(e)
            | AnyEntry::FrameworksBuildPhase(e)
            | AnyEntry::ResourcesBuildPhase(e)
            | AnyEntry::CopyFilesBuildPhase(e)
            | AnyEntry::ShellScriptBuildPhase(e) => e.guid(),
            AnyEntry::NativeTarget(e) => e.guid(),
            AnyEntry::TargetDependency(e) => e.guid(),
            AnyEntry::BuildConfiguration(e) => e.guid(),
            AnyEntry::ConfigurationList(e) => e.guid(),
            AnyEntry::Project(e) => e.guid(),
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
    fn test_unmodelled_properties_keep_position() {
        let props = dict(&[
            ("isa", "PBXFileReference".into()),
            ("fileEncoding", "4".into()),
            ("lastKnownFileType", "sourcecode.c.objc".into()),
            ("path", "main.m".into()),
            ("sourceTree", "<group>".into()),
        ]);
        let mut file = FileReference::from_dict(Guid::new("A"), props.clone()).unwrap();
        assert_eq!(file.to_dict(), props);

        file.name = Some("Main.m".to_string());
        let keys: Vec<_> = file.to_dict().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["isa", "fileEncoding", "lastKnownFileType", "path", "sourceTree", "name"]
        );
    }

    #[test]
    fn test_absent_source_tree_stays_absent() {
        let props = dict(&[
            ("isa", "PBXFileReference".into()),
            ("path", "main.m".into()),
        ]);
        let mut file = FileReference::from_dict(Guid::new("A"), props.clone()).unwrap();
        assert_eq!(file.source_tree, None);
        assert_eq!(file.to_dict(), props);

        file.source_tree = Some(SourceTree::Source);
        assert_eq!(file.to_dict()["sourceTree"], Value::from("SOURCE_ROOT"));
    }

    #[test]
    fn test_cleared_field_is_removed() {
        let props = dict(&[
            ("isa", "PBXGroup".into()),
            ("children", Value::Array(vec![])),
            ("name", "Classes".into()),
            ("sourceTree", "<group>".into()),
        ]);
        let mut group = Group::from_dict(Guid::new("G"), props).unwrap();
        group.name = None;
        assert!(!group.to_dict().contains_key("name"));
        assert_eq!(group.display_name(), "");
    }

    #[test]
    fn test_absent_list_stays_absent() {
        let props = dict(&[("isa", "PBXNativeTarget".into()), ("name", "App".into())]);
        let target = NativeTarget::from_dict(Guid::new("T"), props.clone()).unwrap();
        assert_eq!(target.to_dict(), props);
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let props = dict(&[("isa", "PBXGroup".into()), ("children", "oops".into())]);
        let err = Group::from_dict(Guid::new("G"), props).unwrap_err();
        assert!(err.contains("children"));
    }

    #[test]
    fn test_build_file_settings() {
        let file = BuildFile::new(Guid::new("B"), Guid::new("F"), true, Some("-fno-objc-arc"));
        assert!(file.is_weak());
        assert_eq!(file.compile_flags(), Some("-fno-objc-arc"));
        let plain = BuildFile::new(Guid::new("C"), Guid::new("F"), false, Some(""));
        assert!(!plain.to_dict().contains_key("settings"));
    }

    #[test]
    fn test_add_property_promotes_to_list() {
        let mut config = BuildConfiguration::new(Guid::new("C"), "Debug");
        config.add_property("OTHER_LDFLAGS", "-ObjC");
        config.add_property("OTHER_LDFLAGS", "-ObjC");
        assert_eq!(config.property("OTHER_LDFLAGS"), Some(&Value::from("-ObjC")));
        config.add_property("OTHER_LDFLAGS", "-lz");
        assert_eq!(
            config.property("OTHER_LDFLAGS"),
            Some(&Value::Array(vec!["-ObjC".into(), "-lz".into()]))
        );
    }

    #[test]
    fn test_update_property() {
        let mut config = BuildConfiguration::new(Guid::new("C"), "Release");
        config.set_property("OTHER_CFLAGS", "-DA -DB");
        config.update_property("OTHER_CFLAGS", &["-DC", "-DA"], &["-DB"]);
        assert_eq!(config.property("OTHER_CFLAGS"), Some(&Value::from("-DA -DC")));

        config.update_property("OTHER_CFLAGS", &[], &["-DA", "-DC"]);
        assert_eq!(config.property("OTHER_CFLAGS"), None);

        config.build_settings.insert(
            "HEADER_SEARCH_PATHS".to_string(),
            Value::Array(vec!["$(inherited)".into()]),
        );
        config.update_property("HEADER_SEARCH_PATHS", &["Libraries"], &[]);
        assert_eq!(
            config.property("HEADER_SEARCH_PATHS"),
            Some(&Value::Array(vec!["$(inherited)".into(), "Libraries".into()]))
        );
    }

    #[test]
    fn test_project_references() {
        let mut reference = Dict::new();
        reference.insert("ProductGroup".into(), "P".into());
        reference.insert("ProjectRef".into(), "R".into());
        let props = dict(&[
            ("isa", "PBXProject".into()),
            ("projectReferences", Value::Array(vec![Value::Dict(reference)])),
        ]);
        let project = ProjectObject::from_dict(Guid::new("X"), props.clone()).unwrap();
        assert_eq!(
            project.project_references,
            vec![ProjectReference {
                product_group: Guid::new("P"),
                project_ref: Guid::new("R"),
            }]
        );
        assert_eq!(project.to_dict(), props);
    }
}
