//! Org identifiers and client nonces
//!
//! Provides [`OrgId`] and [`Nonce`]. The empty org id is reserved for the
//! root org; `"root"` is accepted as an alias for it on lookup.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Alias accepted on lookup for the root org
pub const ROOT_ORG_ALIAS: &str = "root";

/// Display name given to the root org
pub const ROOT_ORG_NAME: &str = "<root org>";

/// Prefix of generated org ids
const GENERATED_ID_PREFIX: char = 'O';

/// Org identifier
///
/// Serialized transparently as a string. The empty string is the root org.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

impl OrgId {
    /// The root org id (empty)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Generate a fresh, globally unique org id
    ///
    /// `O` followed by a lowercase ULID, so ids sort by creation time.
    #[must_use]
    pub fn generate() -> Self {
        let ulid = Ulid::new().to_string().to_lowercase();
        Self(format!("{GENERATED_ID_PREFIX}{ulid}"))
    }

    /// Normalize an id presented for lookup
    ///
    /// `"root"` and `""` both map to the root org. No validation happens
    /// here: an id that could never have been created simply won't be found.
    #[must_use]
    pub fn lookup(id: &str) -> Self {
        if id == ROOT_ORG_ALIAS {
            Self::root()
        } else {
            Self(id.to_string())
        }
    }

    /// Parse an explicit id requested for a new org
    ///
    /// # Errors
    /// - [`IdError::Reserved`] for `""` and `"root"`
    /// - [`IdError::InvalidPathComponent`] when the id cannot be used as a
    ///   single storage path segment
    pub fn parse(id: &str) -> Result<Self, IdError> {
        if id.is_empty() || id == ROOT_ORG_ALIAS {
            return Err(IdError::Reserved(id.to_string()));
        }
        if id == "." || id == ".." || id.contains(['/', '\\']) || id.chars().any(char::is_control)
        {
            return Err(IdError::InvalidPathComponent(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    /// Is this the root org
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw id string (empty for root)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrgId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(ROOT_ORG_ALIAS)
        } else {
            f.write_str(&self.0)
        }
    }
}

impl AsRef<str> for OrgId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque client nonce
///
/// Handed to clients in place of the org id; maps back to the org on the
/// server side only.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Wrap an existing nonce value
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh random nonce (16 bytes, hex)
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    /// The empty nonce
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Is the nonce unset
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw nonce string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Nonce {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors for explicitly requested org ids
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Id belongs to the root org
    #[error("org id '{0}' is reserved for the root org")]
    Reserved(String),

    /// Id is not usable as a storage path segment
    #[error("org id '{0}' is not a valid path component")]
    InvalidPathComponent(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn root_id_is_empty() {
        let root = OrgId::root();
        assert!(root.is_root());
        assert_eq!(root.as_str(), "");
        assert_eq!(root.to_string(), "root");
    }

    #[test]
    fn lookup_aliases_root() {
        assert_eq!(OrgId::lookup("root"), OrgId::root());
        assert_eq!(OrgId::lookup(""), OrgId::root());
        assert_eq!(OrgId::lookup("O123").as_str(), "O123");
    }

    #[test]
    fn generated_ids_are_unique_and_non_empty() {
        let ids: HashSet<OrgId> = (0..1000).map(|_| OrgId::generate()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| !id.is_root() && id.as_str().starts_with('O')));
    }

    #[test]
    fn generated_ids_parse_back() {
        let id = OrgId::generate();
        assert_eq!(OrgId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_reserved() {
        assert_eq!(OrgId::parse(""), Err(IdError::Reserved(String::new())));
        assert_eq!(OrgId::parse("root"), Err(IdError::Reserved("root".into())));
    }

    #[test]
    fn parse_rejects_path_traversal() {
        for bad in ["..", ".", "a/b", "a\\b", "x\n"] {
            assert!(
                matches!(OrgId::parse(bad), Err(IdError::InvalidPathComponent(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn nonce_generate_is_hex() {
        let nonce = Nonce::generate();
        assert_eq!(nonce.as_str().len(), 32);
        assert!(hex::decode(nonce.as_str()).is_ok());
        assert_ne!(nonce, Nonce::generate());
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&OrgId::parse("OABC").unwrap()).unwrap();
        assert_eq!(json, "\"OABC\"");
    }

    proptest! {
        #[test]
        fn parse_accepts_simple_ids(id in "[A-Za-z0-9_-]{1,32}") {
            prop_assume!(id != "root");
            let parsed = OrgId::parse(&id).unwrap();
            prop_assert_eq!(parsed.as_str(), id.as_str());
        }
    }
}
