use std::fmt::{Display, Formatter};
use std::ops::Deref;

use crate::error::{invalid_argument, DocSqlResult};

/// A slash-delimited location in the hierarchical namespace.
///
/// Segments are opaque byte strings: no case folding or whitespace trimming is
/// applied, so callers must canonicalize (e.g. lower-case tenant slugs) before
/// building a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Builds a path from individual segments, rejecting empty ones.
    pub fn from_segments<I, S>(segments: I) -> DocSqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid_argument("Path segments must be non-empty strings"));
        }
        Ok(Self { segments })
    }

    /// Parses a slash-delimited path. Empty segments are a caller error, not
    /// silently dropped.
    pub fn from_string(path: &str) -> DocSqlResult<Self> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(path.split('/'))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(|s| s.as_str())
    }

    /// The root collection name, when the path is non-empty.
    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(|s| s.as_str())
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Returns a new path with `segments` appended.
    pub fn child<I, S>(&self, segments: I) -> DocSqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut new_segments = self.segments.clone();
        for segment in segments {
            let segment = segment.into();
            if segment.is_empty() {
                return Err(invalid_argument("Path segments must be non-empty strings"));
            }
            new_segments.push(segment);
        }
        Ok(Self {
            segments: new_segments,
        })
    }

    pub fn pop_last(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    pub fn without_last(&self) -> Self {
        self.pop_last().unwrap_or_else(Self::root)
    }

    pub fn as_vec(&self) -> &Vec<String> {
        &self.segments
    }

    pub fn canonical_string(&self) -> String {
        self.segments.join("/")
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

impl Deref for ResourcePath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render_path() {
        let path = ResourcePath::from_string("cities/mumbai/wards/a1").unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.first_segment(), Some("cities"));
        assert_eq!(path.last_segment(), Some("a1"));
        assert_eq!(path.canonical_string(), "cities/mumbai/wards/a1");
    }

    #[test]
    fn handles_root_path() {
        let path = ResourcePath::from_string("").unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn rejects_empty_segments() {
        let err = ResourcePath::from_string("cities//mumbai").unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
        let err = ResourcePath::from_string("cities/").unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }

    #[test]
    fn preserves_casing() {
        let path = ResourcePath::from_string("Cities/Mumbai").unwrap();
        assert_eq!(path.canonical_string(), "Cities/Mumbai");
    }

    #[test]
    fn equal_segments_yield_equal_paths() {
        let left = ResourcePath::from_string("jobs/j1").unwrap();
        let right = ResourcePath::from_segments(["jobs", "j1"]).unwrap();
        assert_eq!(left, right);
    }
}
