//! Object identifiers.
//!
//! Every entry in the object table is keyed by a GUID, and every reference
//! between entries is spelled as one. Xcode writes them as 24 uppercase hex
//! digits; documents produced by other tools sometimes use other widths, so
//! reading accepts any bare word while [`Guid::generate`] always produces the
//! Xcode form.

use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Width of a GUID produced by Xcode.
pub const GUID_LEN: usize = 24;

/// A GUID naming one entry of the object graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(String);

impl Guid {
    /// Wrap an identifier read from a document or supplied by a caller.
    pub fn new(s: impl Into<String>) -> Self {
        Guid(s.into())
    }

    /// Produce a fresh random identifier in Xcode's 24-digit form.
    ///
    /// This is not checked against any project; use
    /// [`Project::new_guid`](crate::Project::new_guid) for that.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Guid(hex[hex.len() - GUID_LEN..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this looks like an identifier Xcode itself would write.
    pub fn is_xcode_form(&self) -> bool {
        self.0.len() == GUID_LEN && self.0.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Guid {
    fn from(s: &str) -> Self {
        Guid(s.to_string())
    }
}

impl From<String> for Guid {
    fn from(s: String) -> Self {
        Guid(s)
    }
}

impl Borrow<str> for Guid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Guid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let guid = Guid::generate();
        assert_eq!(guid.as_str().len(), GUID_LEN);
        assert!(guid.is_xcode_form());
        assert_eq!(guid.as_str(), guid.as_str().to_ascii_uppercase());
    }

    #[test]
    fn test_foreign_form() {
        assert!(!Guid::new("main_group").is_xcode_form());
        assert!(Guid::new("1D6058900D05DD3D006BFB54").is_xcode_form());
    }
}
