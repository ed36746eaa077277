//! Nested key-path resolution over JSON documents.
//!
//! Resolution is total: a missing key, an out-of-range index, or a scalar
//! where a container was expected all yield `None` (absent). A present JSON
//! `null` resolves to `Some(&Value::Null)`, which callers may treat the same
//! way but can still tell apart.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// An ordered sequence of keys, written `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a path from its dotted form. Empty segments are dropped, so
    /// `""` is the root path.
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Return a new path with `segment` appended.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Walk `path` through `doc`, returning `None` as soon as a segment is absent.
///
/// Objects are indexed by key. Arrays are indexed when the segment parses as
/// a `usize`. Any other intermediate (string, number, bool, null) ends the
/// walk with `None`.
pub fn resolve<'a>(doc: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.segments() {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`resolve`], but folds a present `null` into absent.
pub fn resolve_present<'a>(doc: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    resolve(doc, path).filter(|v| !v.is_null())
}

/// Resolve to a string slice. Non-string values are treated as absent.
pub fn resolve_str<'a>(doc: &'a Value, path: &FieldPath) -> Option<&'a str> {
    resolve(doc, path).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_first_segment_is_absent() {
        let doc = json!({});
        assert_eq!(resolve(&doc, &FieldPath::parse("a.b")), None);
    }

    #[test]
    fn nested_lookup() {
        let doc = json!({"result": {"imit_stats": {"return_mean": 3.5}}});
        let path = FieldPath::parse("result.imit_stats.return_mean");
        assert_eq!(resolve(&doc, &path), Some(&json!(3.5)));
    }

    #[test]
    fn scalar_intermediate_is_absent() {
        let doc = json!({"result": 7});
        assert_eq!(resolve(&doc, &FieldPath::parse("result.imit_stats")), None);
    }

    #[test]
    fn null_intermediate_is_absent() {
        let doc = json!({"result": null});
        assert_eq!(resolve(&doc, &FieldPath::parse("result.imit_stats")), None);
    }

    #[test]
    fn present_null_differs_from_absent() {
        let doc = json!({"status": null});
        let path = FieldPath::parse("status");
        assert_eq!(resolve(&doc, &path), Some(&Value::Null));
        assert_eq!(resolve_present(&doc, &path), None);
    }

    #[test]
    fn array_index_segment() {
        let doc = json!({"seeds": [11, 22, 33]});
        assert_eq!(resolve(&doc, &FieldPath::parse("seeds.1")), Some(&json!(22)));
        assert_eq!(resolve(&doc, &FieldPath::parse("seeds.9")), None);
        assert_eq!(resolve(&doc, &FieldPath::parse("seeds.x")), None);
    }

    #[test]
    fn root_path_returns_document() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, &FieldPath::parse("")), Some(&doc));
    }

    #[test]
    fn display_and_join() {
        let path = FieldPath::parse("result").join("expert_stats");
        assert_eq!(path.to_string(), "result.expert_stats");
        assert_eq!(path, FieldPath::from_segments(["result", "expert_stats"]));
    }

    #[test]
    fn resolve_str_ignores_non_strings() {
        let doc = json!({"env_name": 5, "algorithm": "gail"});
        assert_eq!(resolve_str(&doc, &FieldPath::parse("env_name")), None);
        assert_eq!(resolve_str(&doc, &FieldPath::parse("algorithm")), Some("gail"));
    }
}
