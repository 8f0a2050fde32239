//! Registry of Xcode capabilities and enabling one for a target.
//!
//! Only the project file side is handled here: the entitlements file
//! reference, `CODE_SIGN_ENTITLEMENTS`, the framework a capability needs and
//! the `SystemCapabilities` flag. Editing entitlements or Info.plist content
//! is left to the caller.

use tracing::debug;

use crate::error::EditError;
use crate::guid::Guid;
use crate::objects::SourceTree;
use crate::project::Project;
use crate::section::SectionKind;
use crate::value::Value;

/// A capability that can be switched on in Xcode's Signing & Capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ApplePay,
    AppGroups,
    AssociatedDomains,
    BackgroundModes,
    DataProtection,
    GameCenter,
    HealthKit,
    HomeKit,
    ICloud,
    InAppPurchase,
    InterAppAudio,
    KeychainSharing,
    Maps,
    PersonalVpn,
    PushNotifications,
    Siri,
    Wallet,
    WirelessAccessoryConfiguration,
}

impl Capability {
    pub const ALL: [Capability; 18] = [
        Capability::ApplePay,
        Capability::AppGroups,
        Capability::AssociatedDomains,
        Capability::BackgroundModes,
        Capability::DataProtection,
        Capability::GameCenter,
        Capability::HealthKit,
        Capability::HomeKit,
        Capability::ICloud,
        Capability::InAppPurchase,
        Capability::InterAppAudio,
        Capability::KeychainSharing,
        Capability::Maps,
        Capability::PersonalVpn,
        Capability::PushNotifications,
        Capability::Siri,
        Capability::Wallet,
        Capability::WirelessAccessoryConfiguration,
    ];

    /// Key under `SystemCapabilities` in the project attributes.
    pub fn id(self) -> &'static str {
        match self {
            Capability::ApplePay => "com.apple.ApplePay",
            Capability::AppGroups => "com.apple.ApplicationGroups.iOS",
            Capability::AssociatedDomains => "com.apple.SafariKeychain",
            Capability::BackgroundModes => "com.apple.BackgroundModes",
            Capability::DataProtection => "com.apple.DataProtection",
            Capability::GameCenter => "com.apple.GameCenter",
            Capability::HealthKit => "com.apple.HealthKit",
            Capability::HomeKit => "com.apple.HomeKit",
            Capability::ICloud => "com.apple.iCloud",
            Capability::InAppPurchase => "com.apple.InAppPurchase",
            Capability::InterAppAudio => "com.apple.InterAppAudio",
            Capability::KeychainSharing => "com.apple.KeychainSharing",
            Capability::Maps => "com.apple.Maps.iOS",
            Capability::PersonalVpn => "com.apple.VPNLite",
            Capability::PushNotifications => "com.apple.Push",
            Capability::Siri => "com.apple.Siri",
            Capability::Wallet => "com.apple.Wallet",
            Capability::WirelessAccessoryConfiguration => "com.apple.WAC",
        }
    }

    pub fn requires_entitlements(self) -> bool {
        !matches!(
            self,
            Capability::BackgroundModes
                | Capability::GameCenter
                | Capability::InAppPurchase
                | Capability::Maps
        )
    }

    /// System framework linked when the capability is enabled.
    pub fn framework(self) -> Option<&'static str> {
        match self {
            Capability::GameCenter => Some("GameKit.framework"),
            Capability::HealthKit => Some("HealthKit.framework"),
            Capability::HomeKit => Some("HomeKit.framework"),
            Capability::ICloud => Some("CloudKit.framework"),
            Capability::InterAppAudio => Some("AudioToolbox.framework"),
            Capability::Maps => Some("MapKit.framework"),
            Capability::PersonalVpn => Some("NetworkExtension.framework"),
            Capability::Wallet => Some("PassKit.framework"),
            Capability::WirelessAccessoryConfiguration => Some("ExternalAccessory.framework"),
            _ => None,
        }
    }

    /// Whether the framework is only needed for some of the capability's
    /// options (CloudKit for iCloud).
    pub fn optional_framework(self) -> bool {
        self == Capability::ICloud
    }
}

impl Project {
    /// Enable `capability` on `target`.
    ///
    /// `entitlements_path` is required when the capability needs
    /// entitlements; `add_optional_framework` links a framework the
    /// capability only needs for some of its options.
    pub fn add_capability(
        &mut self,
        target: &Guid,
        capability: Capability,
        entitlements_path: Option<&str>,
        add_optional_framework: bool,
    ) -> Result<(), EditError> {
        if !self.native_targets().contains(target) {
            return Err(EditError::not_found("target", target));
        }
        if self.project_object().is_none() {
            return Err(EditError::not_found("project object", "rootObject"));
        }
        let entitlements = match (capability.requires_entitlements(), entitlements_path) {
            (true, None) => return Err(EditError::MissingEntitlements(capability.id())),
            (true, Some(path)) => Some(path),
            (false, _) => None,
        };
        let framework = capability
            .framework()
            .filter(|_| !capability.optional_framework() || add_optional_framework);

        // Everything that can fail is checked before the first change.
        if entitlements.is_some() || framework.is_some() {
            self.main_group()
                .ok_or_else(|| EditError::not_found("group", "main group"))?;
        }
        if entitlements.is_some() {
            self.target_config_list(target)?;
        }
        if framework.is_some() {
            self.target_phase(target, SectionKind::FrameworksBuildPhase)?;
        }

        if let Some(path) = entitlements {
            self.add_file(path, path, SourceTree::Source)?;
            self.set_build_property(target, "CODE_SIGN_ENTITLEMENTS", path)?;
        }
        if let Some(framework) = framework {
            self.add_framework_to_project(target, framework, false)?;
        }

        if let Some(root) = self.project_object_mut() {
            root.with_attributes(
                &[
                    "TargetAttributes",
                    target.as_str(),
                    "SystemCapabilities",
                    capability.id(),
                ],
                |enabled| enabled.insert("enabled".to_string(), Value::from("1")),
            );
        }
        debug!(target = %target, capability = capability.id(), "enabled capability");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        assert_eq!(Capability::AssociatedDomains.id(), "com.apple.SafariKeychain");
        assert_eq!(Capability::PersonalVpn.id(), "com.apple.VPNLite");
        assert!(!Capability::Maps.requires_entitlements());
        assert!(Capability::Siri.requires_entitlements());
        assert_eq!(Capability::Siri.framework(), None);
        assert_eq!(Capability::Maps.framework(), Some("MapKit.framework"));
        assert!(Capability::ICloud.optional_framework());
        assert!(!Capability::Wallet.optional_framework());
    }

    #[test]
    fn test_ids_are_distinct() {
        let mut ids: Vec<_> = Capability::ALL.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Capability::ALL.len());
    }

    #[test]
    fn test_entitlements_free_set() {
        let free: Vec<_> = Capability::ALL
            .into_iter()
            .filter(|c| !c.requires_entitlements())
            .collect();
        assert_eq!(
            free,
            vec![
                Capability::BackgroundModes,
                Capability::GameCenter,
                Capability::InAppPurchase,
                Capability::Maps,
            ]
        );
    }
}
