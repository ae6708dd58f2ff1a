use serde::{Deserialize, Serialize};

use crate::errors::{CmError, Result};

/// One `(class, instanceId)` step of a distinguished name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathSegment {
    pub class: String,
    pub id: String,
}

impl PathSegment {
    pub fn new(class: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
        }
    }

    /// Segment built from user input; an id may not contain the `/` separator
    ///
    /// # Errors
    ///
    /// Returns `InvalidDistName` for an empty class or id, or an id holding `/`.
    pub fn checked(class: &str, id: &str) -> Result<Self> {
        let invalid = |reason: &str| CmError::InvalidDistName {
            input: format!("{}-{}", class, id),
            reason: reason.to_string(),
        };
        if class.is_empty() || id.is_empty() {
            return Err(invalid("empty class or id"));
        }
        if id.contains('/') {
            return Err(invalid("id must not contain '/'"));
        }
        Ok(Self::new(class, id))
    }

    /// Parse `CLASS-id`; the class ends at the first `-`
    pub fn parse(input: &str) -> Result<Self> {
        let (class, id) = input.split_once('-').ok_or_else(|| CmError::InvalidDistName {
            input: input.to_string(),
            reason: "segment must have the form CLASS-id".to_string(),
        })?;
        Self::checked(class, id)
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.class, self.id)
    }
}

/// Distinguished name: the ordered path from the root to an object
///
/// Rendered as `CLASS-id` segments joined by `/`. Ordering is segment-wise,
/// so a parent always sorts before its descendants and siblings stay
/// adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistName(Vec<PathSegment>);

impl DistName {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse `A-1/B-2/...`
    ///
    /// # Errors
    ///
    /// Returns `InvalidDistName` for an empty input or a malformed segment.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CmError::InvalidDistName {
                input: input.to_string(),
                reason: "empty".to_string(),
            });
        }
        trimmed
            .split('/')
            .map(PathSegment::parse)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Class of the addressed object
    pub fn class(&self) -> Option<&str> {
        self.last().map(|s| s.class.as_str())
    }

    /// Instance id of the addressed object
    pub fn id(&self) -> Option<&str> {
        self.last().map(|s| s.id.as_str())
    }

    /// Path of the enclosing object, `None` for the root and the empty path
    pub fn parent(&self) -> Option<DistName> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, class: impl Into<String>, id: impl Into<String>) -> DistName {
        let mut segments = self.0.clone();
        segments.push(PathSegment::new(class, id));
        Self(segments)
    }

    /// True when `self` equals `other` or is one of its ancestors
    pub fn is_prefix_of(&self, other: &DistName) -> bool {
        !self.0.is_empty() && other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// True when `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &DistName) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Number of leading segments shared with `other`
    pub fn common_prefix_len(&self, other: &DistName) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Replace the leading `old` prefix with `new`; `None` when `old` is not a prefix
    pub fn with_prefix_replaced(&self, old: &DistName, new: &DistName) -> Option<DistName> {
        if !old.is_prefix_of(self) {
            return None;
        }
        let mut segments = new.0.clone();
        segments.extend_from_slice(&self.0[old.0.len()..]);
        Some(Self(segments))
    }
}

impl std::fmt::Display for DistName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for DistName {
    type Err = CmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DistName {
    type Error = CmError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DistName> for String {
    fn from(value: DistName) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dn = DistName::parse("ROOT-1/A-1/B-2").unwrap();
        assert_eq!(dn.len(), 3);
        assert_eq!(dn.class(), Some("B"));
        assert_eq!(dn.id(), Some("2"));
        assert_eq!(dn.to_string(), "ROOT-1/A-1/B-2");
    }

    #[test]
    fn test_class_ends_at_first_dash() {
        let segment = PathSegment::parse("IPIF-1-a").unwrap();
        assert_eq!(segment.class, "IPIF");
        assert_eq!(segment.id, "1-a");
    }

    #[test]
    fn test_rejects_malformed_segments() {
        assert!(DistName::parse("").is_err());
        assert!(DistName::parse("ROOT").is_err());
        assert!(DistName::parse("ROOT-1//A-1").is_err());
        assert!(DistName::parse("-1").is_err());
    }

    #[test]
    fn test_id_with_separator_is_rejected() {
        let err = PathSegment::parse("A-1/2").unwrap_err();
        assert!(matches!(err, CmError::InvalidDistName { .. }));
        assert!(PathSegment::checked("A", "x/y").is_err());
        assert!(PathSegment::checked("A", "").is_err());

        let segment = PathSegment::checked("A", "1-b").unwrap();
        let dn = DistName::new(vec![segment]);
        assert_eq!(DistName::parse(&dn.to_string()).unwrap(), dn);
    }

    #[test]
    fn test_prefix_relations() {
        let root = DistName::parse("R-1").unwrap();
        let a = DistName::parse("R-1/A-1").unwrap();
        let a10 = DistName::parse("R-1/A-10").unwrap();
        assert!(root.is_prefix_of(&a));
        assert!(a.is_prefix_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(root.is_ancestor_of(&a));
        assert!(!a.is_prefix_of(&a10));
        assert_eq!(a.common_prefix_len(&a10), 1);
        assert_eq!(a.parent(), Some(root));
    }

    #[test]
    fn test_prefix_replacement() {
        let old = DistName::parse("R-1/A-1").unwrap();
        let new = DistName::parse("R-1/A-7").unwrap();
        let child = DistName::parse("R-1/A-1/B-3").unwrap();
        assert_eq!(
            child.with_prefix_replaced(&old, &new).unwrap().to_string(),
            "R-1/A-7/B-3"
        );
        let other = DistName::parse("R-1/A-2").unwrap();
        assert!(other.with_prefix_replaced(&old, &new).is_none());
    }

    #[test]
    fn test_ordering_keeps_children_after_parent() {
        let mut names: Vec<DistName> = ["R-1/A-10", "R-1/A-1/B-1", "R-1", "R-1/A-1"]
            .iter()
            .map(|s| DistName::parse(s).unwrap())
            .collect();
        names.sort();
        let rendered: Vec<String> = names.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["R-1", "R-1/A-1", "R-1/A-1/B-1", "R-1/A-10"]);
    }

    #[test]
    fn test_serde_as_string() {
        let dn = DistName::parse("R-1/A-1").unwrap();
        let json = serde_json::to_string(&dn).unwrap();
        assert_eq!(json, "\"R-1/A-1\"");
        let back: DistName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dn);
    }
}
