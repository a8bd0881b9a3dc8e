//! Datastore paths
//!
//! Provides [`DatastorePath`] for addressing subjects in the hierarchical
//! keyspace.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of a subject in the datastore
///
/// Hierarchical, `/`-separated. Every segment is usable as a single file
/// name, so backends can map paths straight onto a directory tree.
///
/// # Examples
/// - `["orgs"]` → `/orgs`
/// - `["orgs", "O01J..."]` → `/orgs/O01J...`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DatastorePath(Vec<String>);

impl DatastorePath {
    /// Empty path (root of the keyspace)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build from segments
    ///
    /// # Errors
    /// Returns error if any segment is not a valid path component
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        segments
            .into_iter()
            .map(|seg| validate_segment(seg.into()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Single segment path for known-good constants
    pub(crate) fn single_unchecked(segment: &str) -> Self {
        Self(vec![segment.to_string()])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Check if path is the keyspace root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment (if not root)
    #[inline]
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Parent path (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning new path
    ///
    /// # Errors
    /// Returns error if `segment` is not a valid path component
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = validate_segment(segment.into())?;
        let mut new = self.clone();
        new.0.push(segment);
        Ok(new)
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Immediate child of `self` on the way to `descendant`
    #[must_use]
    pub fn child_towards(&self, descendant: &Self) -> Option<Self> {
        if !self.is_ancestor_of(descendant) {
            return None;
        }
        Some(Self(descendant.0[..=self.0.len()].to_vec()))
    }
}

fn validate_segment(segment: String) -> Result<String, PathError> {
    if segment.is_empty() {
        Err(PathError::EmptySegment)
    } else if segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.chars().any(char::is_control)
    {
        Err(PathError::InvalidSegment(segment))
    } else {
        Ok(segment)
    }
}

impl Display for DatastorePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.0 {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for DatastorePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::new(trimmed.split('/'))
    }
}

/// Errors related to datastore paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment is not a single path component
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),
}
