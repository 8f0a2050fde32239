//! Targets, their build phases and their build configurations.
//!
//! Target-wide build property edits apply to every configuration in the
//! target's configuration list; the `*_for_config` variants touch one.

use tracing::debug;

use crate::error::EditError;
use crate::guid::Guid;
use crate::objects::{
    AnyEntry, BuildConfiguration, BuildPhase, ConfigurationList, ContainerItemProxy, Entry,
    FileReference, NativeTarget, SourceTree, TargetDependency,
};
use crate::project::Project;
use crate::section::SectionKind;
use crate::value::Value;

/// `proxyType` of a container proxy pointing at a target of this project.
const PROXY_TYPE_TARGET: &str = "1";

/// Configurations given to a new target when the project lists none.
const DEFAULT_CONFIGS: [&str; 2] = ["Debug", "Release"];

impl Project {
    // ========================================================================
    // Targets
    // ========================================================================

    /// Create a native target called `name` whose product is `name` + `ext`
    /// (`.app`, `.appex`, ...). The target gets one configuration per
    /// project configuration and no build phases.
    pub fn add_target(
        &mut self,
        name: &str,
        ext: &str,
        product_type: &str,
    ) -> Result<Guid, EditError> {
        if self.project_object().is_none() {
            return Err(EditError::not_found("project object", "rootObject"));
        }
        let ext = ext.trim_start_matches('.');
        let product_path = if ext.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, ext)
        };

        let products = self.create_source_group("Products")?;
        let product = self.new_guid();
        self.insert_entry(AnyEntry::FileReference(FileReference::new(
            product.clone(),
            &product_path,
            &product_path,
            SourceTree::Build,
        )))?;
        if let Some(group) = self.groups_mut().get_mut(&products) {
            group.children.push(product.clone());
        }

        let mut config_names = self.build_config_names();
        if config_names.is_empty() {
            config_names = DEFAULT_CONFIGS.iter().map(|s| s.to_string()).collect();
        }
        let list = self.new_guid();
        let mut config_list = ConfigurationList::new(list.clone());
        for config_name in &config_names {
            let config = self.new_guid();
            self.insert_entry(AnyEntry::BuildConfiguration(BuildConfiguration::new(
                config.clone(),
                config_name,
            )))?;
            config_list.build_configs.push(config);
        }
        self.insert_entry(AnyEntry::ConfigurationList(config_list))?;

        let guid = self.new_guid();
        self.insert_entry(AnyEntry::NativeTarget(NativeTarget::new(
            guid.clone(),
            name,
            product,
            product_type,
            list,
        )))?;
        if let Some(root) = self.project_object_mut() {
            root.targets.push(guid.clone());
        }
        debug!(target = name, guid = %guid, product_type, "added target");
        Ok(guid)
    }

    /// The file reference of the product `target` builds.
    pub fn target_product_file_ref(&self, target: &Guid) -> Option<Guid> {
        self.native_targets().get(target)?.product_reference.clone()
    }

    /// Make `target` depend on `dependency`, another target of this project.
    /// Returns the GUID of the new dependency entry.
    pub fn add_target_dependency(
        &mut self,
        target: &Guid,
        dependency: &Guid,
    ) -> Result<Guid, EditError> {
        if !self.native_targets().contains(target) {
            return Err(EditError::not_found("target", target));
        }
        let remote_info = self
            .native_targets()
            .get(dependency)
            .ok_or_else(|| EditError::not_found("target", dependency))?
            .display_name()
            .to_string();
        let portal = self
            .project_guid()
            .ok_or_else(|| EditError::not_found("project object", "rootObject"))?;

        let proxy = self.new_guid();
        self.insert_entry(AnyEntry::ContainerItemProxy(ContainerItemProxy::new(
            proxy.clone(),
            portal,
            PROXY_TYPE_TARGET,
            dependency.clone(),
            &remote_info,
        )))?;
        let guid = self.new_guid();
        self.insert_entry(AnyEntry::TargetDependency(TargetDependency::new(
            guid.clone(),
            dependency.clone(),
            proxy,
        )))?;
        if let Some(target) = self.native_targets_mut().get_mut(target) {
            target.dependencies.push(guid.clone());
        }
        debug!(target = %target, dependency = %dependency, "added target dependency");
        Ok(guid)
    }

    // ========================================================================
    // Build phases
    // ========================================================================

    /// The target's sources phase, created if it has none.
    pub fn add_sources_build_phase(&mut self, target: &Guid) -> Result<Guid, EditError> {
        self.ensure_phase(target, SectionKind::SourcesBuildPhase)
    }

    /// The target's resources phase, created if it has none.
    pub fn add_resources_build_phase(&mut self, target: &Guid) -> Result<Guid, EditError> {
        self.ensure_phase(target, SectionKind::ResourcesBuildPhase)
    }

    /// The target's frameworks phase, created if it has none.
    pub fn add_frameworks_build_phase(&mut self, target: &Guid) -> Result<Guid, EditError> {
        self.ensure_phase(target, SectionKind::FrameworksBuildPhase)
    }

    /// Append a copy-files phase to `target`. `subfolder_spec` is Xcode's
    /// destination code (`"13"` for plug-ins, `"16"` for products).
    pub fn add_copy_files_build_phase(
        &mut self,
        target: &Guid,
        name: &str,
        dst_path: &str,
        subfolder_spec: &str,
    ) -> Result<Guid, EditError> {
        let guid = self.new_guid();
        let phase = BuildPhase::copy_files(guid, name, dst_path, subfolder_spec);
        self.append_phase(target, AnyEntry::CopyFilesBuildPhase(phase))
    }

    /// Append a run-script phase to `target`.
    pub fn add_shell_script_build_phase(
        &mut self,
        target: &Guid,
        name: &str,
        shell_path: &str,
        script: &str,
    ) -> Result<Guid, EditError> {
        let guid = self.new_guid();
        let phase = BuildPhase::shell_script(guid, name, shell_path, script);
        self.append_phase(target, AnyEntry::ShellScriptBuildPhase(phase))
    }

    fn ensure_phase(&mut self, target: &Guid, kind: SectionKind) -> Result<Guid, EditError> {
        match self.target_phase(target, kind) {
            Ok(existing) => Ok(existing),
            Err(EditError::MissingPhase { .. }) => {
                let phase = BuildPhase::new(self.new_guid(), kind.name());
                let entry = match kind {
                    SectionKind::SourcesBuildPhase => AnyEntry::SourcesBuildPhase(phase),
                    SectionKind::ResourcesBuildPhase => AnyEntry::ResourcesBuildPhase(phase),
                    _ => AnyEntry::FrameworksBuildPhase(phase),
                };
                self.append_phase(target, entry)
            }
            Err(err) => Err(err),
        }
    }

    fn append_phase(&mut self, target: &Guid, phase: AnyEntry) -> Result<Guid, EditError> {
        if !self.native_targets().contains(target) {
            return Err(EditError::not_found("target", target));
        }
        let guid = phase.guid().clone();
        let kind = phase.kind();
        self.insert_entry(phase)?;
        if let Some(target) = self.native_targets_mut().get_mut(target) {
            target.phases.push(guid.clone());
        }
        debug!(target = %target, phase = %kind, guid = %guid, "added build phase");
        Ok(guid)
    }

    // ========================================================================
    // Build configurations
    // ========================================================================

    /// Names of the project-level configurations, in list order.
    pub fn build_config_names(&self) -> Vec<String> {
        let Some(list) = self
            .project_object()
            .and_then(|root| root.build_config_list.as_ref())
            .and_then(|guid| self.config_lists().get(guid))
        else {
            return Vec::new();
        };
        list.build_configs
            .iter()
            .filter_map(|guid| self.build_configs().get(guid))
            .map(|config| config.display_name().to_string())
            .collect()
    }

    /// The configuration of `target` called `name`.
    pub fn build_config_by_name(&self, target: &Guid, name: &str) -> Option<Guid> {
        self.target_config_guids(target)
            .ok()?
            .into_iter()
            .find(|guid| {
                self.build_configs()
                    .get(guid)
                    .is_some_and(|c| c.name.as_deref() == Some(name))
            })
    }

    /// Give `target` a configuration called `name` with empty settings.
    /// An existing configuration of that name is returned unchanged.
    pub fn add_build_config_for_target(
        &mut self,
        target: &Guid,
        name: &str,
    ) -> Result<Guid, EditError> {
        if let Some(existing) = self.build_config_by_name(target, name) {
            return Ok(existing);
        }
        let list = self.target_config_list(target)?;
        let guid = self.new_guid();
        self.insert_entry(AnyEntry::BuildConfiguration(BuildConfiguration::new(
            guid.clone(),
            name,
        )))?;
        if let Some(list) = self.config_lists_mut().get_mut(&list) {
            list.build_configs.push(guid.clone());
        }
        debug!(target = %target, config = name, guid = %guid, "added build configuration");
        Ok(guid)
    }

    pub(crate) fn target_config_list(&self, target: &Guid) -> Result<Guid, EditError> {
        let list = self
            .native_targets()
            .get(target)
            .ok_or_else(|| EditError::not_found("target", target))?
            .build_config_list
            .clone()
            .filter(|guid| self.config_lists().contains(guid))
            .ok_or_else(|| EditError::not_found("configuration list of target", target))?;
        Ok(list)
    }

    fn target_config_guids(&self, target: &Guid) -> Result<Vec<Guid>, EditError> {
        let list = self.target_config_list(target)?;
        Ok(self
            .config_lists()
            .get(&list)
            .map(|l| l.build_configs.clone())
            .unwrap_or_default())
    }

    // ========================================================================
    // Build properties
    // ========================================================================

    /// Add `value` to the property `name` in every configuration of
    /// `target`, turning a single value into a list when they differ.
    pub fn add_build_property(
        &mut self,
        target: &Guid,
        name: &str,
        value: &str,
    ) -> Result<(), EditError> {
        self.edit_target_configs(target, |config| config.add_property(name, value))
    }

    /// Replace the property `name` in every configuration of `target`.
    pub fn set_build_property(
        &mut self,
        target: &Guid,
        name: &str,
        value: &str,
    ) -> Result<(), EditError> {
        self.edit_target_configs(target, |config| config.set_property(name, value))
    }

    /// Treat the property as a set of values: drop `remove`, then append
    /// whatever of `add` is missing, in every configuration of `target`.
    pub fn update_build_property(
        &mut self,
        target: &Guid,
        name: &str,
        add: &[&str],
        remove: &[&str],
    ) -> Result<(), EditError> {
        self.edit_target_configs(target, |config| config.update_property(name, add, remove))
    }

    pub fn add_build_property_for_config(
        &mut self,
        config: &Guid,
        name: &str,
        value: &str,
    ) -> Result<(), EditError> {
        self.config_mut(config)?.add_property(name, value);
        Ok(())
    }

    pub fn set_build_property_for_config(
        &mut self,
        config: &Guid,
        name: &str,
        value: &str,
    ) -> Result<(), EditError> {
        self.config_mut(config)?.set_property(name, value);
        Ok(())
    }

    pub fn update_build_property_for_config(
        &mut self,
        config: &Guid,
        name: &str,
        add: &[&str],
        remove: &[&str],
    ) -> Result<(), EditError> {
        self.config_mut(config)?.update_property(name, add, remove);
        Ok(())
    }

    pub fn build_property_for_config(&self, config: &Guid, name: &str) -> Option<&Value> {
        self.build_configs().get(config)?.property(name)
    }

    fn config_mut(&mut self, config: &Guid) -> Result<&mut BuildConfiguration, EditError> {
        self.build_configs_mut()
            .get_mut(config)
            .ok_or_else(|| EditError::not_found("build configuration", config))
    }

    fn edit_target_configs(
        &mut self,
        target: &Guid,
        mut edit: impl FnMut(&mut BuildConfiguration),
    ) -> Result<(), EditError> {
        let configs = self.target_config_guids(target)?;
        for guid in &configs {
            if let Some(config) = self.build_configs_mut().get_mut(guid) {
                edit(config);
            }
        }
        debug!(target = %target, configs = configs.len(), "edited build settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "{
\tobjects = {

/* Begin PBXGroup section */
\t\tMAIN = {isa = PBXGroup; children = (); sourceTree = \"<group>\"; };
/* End PBXGroup section */

/* Begin PBXProject section */
\t\tROOT = {isa = PBXProject; buildConfigurationList = PCL; mainGroup = MAIN; targets = (); };
/* End PBXProject section */

/* Begin XCBuildConfiguration section */
\t\tPDBG = {isa = XCBuildConfiguration; buildSettings = {}; name = Debug; };
\t\tPREL = {isa = XCBuildConfiguration; buildSettings = {}; name = Release; };
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
\t\tPCL = {isa = XCConfigurationList; buildConfigurations = (PDBG, PREL); };
/* End XCConfigurationList section */
\t};
\trootObject = ROOT;
}
";

    fn project() -> Project {
        Project::read_from_string(DOC).unwrap()
    }

    #[test]
    fn test_add_target() {
        let mut p = project();
        let t = p
            .add_target("Widget", ".appex", "com.apple.product-type.app-extension")
            .unwrap();
        assert_eq!(p.target_guid_by_name("Widget"), Some(t.clone()));
        assert_eq!(p.project_object().unwrap().targets, vec![t.clone()]);

        let product = p.target_product_file_ref(&t).unwrap();
        let file = p.file_refs().get(&product).unwrap();
        assert_eq!(file.path.as_deref(), Some("Widget.appex"));
        assert_eq!(file.source_tree, Some(SourceTree::Build));
        assert!(p.contains_file_by_project_path("Products/Widget.appex"));

        assert!(p.build_config_by_name(&t, "Debug").is_some());
        assert!(p.build_config_by_name(&t, "Release").is_some());
        assert_eq!(p.build_config_by_name(&t, "Profile"), None);
    }

    #[test]
    fn test_phases() {
        let mut p = project();
        let t = p.add_target("App", "app", "com.apple.product-type.application").unwrap();
        let sources = p.add_sources_build_phase(&t).unwrap();
        assert_eq!(p.add_sources_build_phase(&t).unwrap(), sources);
        let frameworks = p.add_frameworks_build_phase(&t).unwrap();
        let resources = p.add_resources_build_phase(&t).unwrap();
        let script = p
            .add_shell_script_build_phase(&t, "Lint", "/bin/sh", "echo hi\n")
            .unwrap();
        let copy = p
            .add_copy_files_build_phase(&t, "Embed App Extensions", "", "13")
            .unwrap();
        let copy2 = p
            .add_copy_files_build_phase(&t, "Embed Watch Content", "$(CONTENTS_FOLDER_PATH)/Watch", "16")
            .unwrap();
        assert_ne!(copy, copy2);
        assert_eq!(
            p.native_targets().get(&t).unwrap().phases,
            vec![sources, frameworks, resources, script, copy.clone(), copy2]
        );
        assert_eq!(p.kind_of(&copy), Some(SectionKind::CopyFilesBuildPhase));
        assert_eq!(
            p.copy_files_phases().get(&copy).unwrap().name.as_deref(),
            Some("Embed App Extensions")
        );
    }

    #[test]
    fn test_phase_for_missing_target() {
        let mut p = project();
        let err = p.add_sources_build_phase(&Guid::from("NOPE")).unwrap_err();
        assert!(matches!(err, EditError::NotFound { kind: "target", .. }));
    }

    #[test]
    fn test_target_dependency() {
        let mut p = project();
        let app = p.add_target("App", ".app", "com.apple.product-type.application").unwrap();
        let ext = p.add_target("Ext", ".appex", "com.apple.product-type.app-extension").unwrap();
        let dep = p.add_target_dependency(&app, &ext).unwrap();
        assert_eq!(p.native_targets().get(&app).unwrap().dependencies, vec![dep.clone()]);

        let dep = p.target_dependencies().get(&dep).unwrap();
        assert_eq!(dep.target.as_ref(), Some(&ext));
        let proxy = p
            .container_proxies()
            .get(dep.target_proxy.as_ref().unwrap())
            .unwrap();
        assert_eq!(proxy.proxy_type.as_deref(), Some("1"));
        assert_eq!(proxy.remote_info.as_deref(), Some("Ext"));
        assert_eq!(proxy.container_portal, p.project_guid());
    }

    #[test]
    fn test_build_configs() {
        let mut p = project();
        assert_eq!(p.build_config_names(), vec!["Debug", "Release"]);
        let t = p.add_target("App", ".app", "com.apple.product-type.application").unwrap();
        let profile = p.add_build_config_for_target(&t, "Profile").unwrap();
        assert_eq!(p.add_build_config_for_target(&t, "Profile").unwrap(), profile);
        assert_eq!(p.build_config_by_name(&t, "Profile"), Some(profile));
        // Project-level names are unaffected.
        assert_eq!(p.build_config_names(), vec!["Debug", "Release"]);
    }

    #[test]
    fn test_build_properties() {
        let mut p = project();
        let t = p.add_target("App", ".app", "com.apple.product-type.application").unwrap();
        let debug = p.build_config_by_name(&t, "Debug").unwrap();
        let release = p.build_config_by_name(&t, "Release").unwrap();

        p.set_build_property(&t, "ENABLE_BITCODE", "NO").unwrap();
        p.add_build_property(&t, "OTHER_LDFLAGS", "-ObjC").unwrap();
        p.add_build_property_for_config(&debug, "OTHER_LDFLAGS", "-lz").unwrap();
        p.update_build_property(&t, "GCC_PREPROCESSOR_DEFINITIONS", &["A=1", "B=2"], &[])
            .unwrap();
        p.update_build_property_for_config(&release, "GCC_PREPROCESSOR_DEFINITIONS", &[], &["A=1"])
            .unwrap();
        p.set_build_property_for_config(&release, "ENABLE_BITCODE", "YES").unwrap();

        assert_eq!(
            p.build_property_for_config(&debug, "ENABLE_BITCODE"),
            Some(&Value::from("NO"))
        );
        assert_eq!(
            p.build_property_for_config(&release, "ENABLE_BITCODE"),
            Some(&Value::from("YES"))
        );
        assert_eq!(
            p.build_property_for_config(&debug, "OTHER_LDFLAGS"),
            Some(&Value::Array(vec!["-ObjC".into(), "-lz".into()]))
        );
        assert_eq!(
            p.build_property_for_config(&release, "OTHER_LDFLAGS"),
            Some(&Value::from("-ObjC"))
        );
        assert_eq!(
            p.build_property_for_config(&debug, "GCC_PREPROCESSOR_DEFINITIONS"),
            Some(&Value::from("A=1 B=2"))
        );
        assert_eq!(
            p.build_property_for_config(&release, "GCC_PREPROCESSOR_DEFINITIONS"),
            Some(&Value::from("B=2"))
        );
        assert_eq!(p.build_property_for_config(&release, "MISSING"), None);
    }

    #[test]
    fn test_property_on_missing_config() {
        let mut p = project();
        let err = p
            .set_build_property_for_config(&Guid::from("NOPE"), "A", "b")
            .unwrap_err();
        assert_eq!(err.to_string(), "No build configuration found for NOPE");
    }
}
