//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile `/user/:id` style patterns into fixed-arity segment lists
//! - Match concrete paths, extracting captures in declared order
//! - Resolve a pattern back into a URL from positional arguments
//! - Detect structurally overlapping patterns
//!
//! # Design Decisions
//! - Purely structural: no query string, fragment or regex handling
//! - A single trailing slash is ignored on both patterns and paths
//! - Capture values are returned verbatim (no percent-decoding)
//! - No match is `None`, never an error

use serde_json::Value;

use crate::error::RegistryError;

/// Sentinel prefix marking a capture segment.
pub const CAPTURE_PREFIX: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// A compiled URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pattern: String,
    segments: Vec<Segment>,
}

/// Captured path parameters, in the order they appear in the pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    entries: Vec<(String, String)>,
}

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Captured values in declared order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl RoutePattern {
    /// Compile a pattern. Capture names must be non-empty and unique.
    pub fn compile(pattern: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for raw in split_path(pattern) {
            match raw.strip_prefix(CAPTURE_PREFIX) {
                Some("") => return Err(invalid("capture segment without a name")),
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Capture(existing) if existing == name));
                    if duplicate {
                        return Err(invalid("duplicate capture name"));
                    }
                    segments.push(Segment::Capture(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Capture names in declared order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn capture_count(&self) -> usize {
        self.keys().count()
    }

    /// Match a concrete path. Segment counts must be equal.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => params.entries.push((name.clone(), part.to_string())),
            }
        }
        Some(params)
    }

    /// Build a concrete path by filling captures with the leading `args`.
    ///
    /// Returns `None` when there are fewer arguments than captures.
    pub fn resolve(&self, args: &[Value]) -> Option<String> {
        let mut values = args.iter();
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(literal.clone()),
                Segment::Capture(_) => parts.push(segment_value(values.next()?)),
            }
        }
        Some(format!("/{}", parts.join("/")))
    }

    /// True when some concrete path matches both patterns.
    pub fn overlaps(&self, other: &RoutePattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                _ => true,
            })
    }
}

fn segment_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capture_matching() {
        let route = RoutePattern::compile("/user/:id").unwrap();

        let params = route.matches("/user/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);

        assert!(route.matches("/user/42/extra").is_none());
        assert!(route.matches("/user").is_none());
        assert!(route.matches("/account/42").is_none());

        assert!(route.matches("/user//").is_none());
        assert!(route.matches("//user/42").is_none());
        assert!(route.matches("/user/42/").is_some());
    }

    #[test]
    fn test_literal_only_pattern() {
        let route = RoutePattern::compile("/v1/foo/bar").unwrap();
        assert_eq!(route.capture_count(), 0);
        assert!(route.matches("/v1/foo/bar").unwrap().is_empty());
        assert!(route.matches("/v1/foo/baz").is_none());
        assert!(route.matches("/v1/foo").is_none());
    }

    #[test]
    fn test_captures_in_declared_order() {
        let route = RoutePattern::compile("/org/:org/repo/:repo").unwrap();
        let params = route.matches("/org/acme/repo/rocket").unwrap();
        assert_eq!(params.values().collect::<Vec<_>>(), vec!["acme", "rocket"]);
        assert_eq!(route.keys().collect::<Vec<_>>(), vec!["org", "repo"]);
    }

    #[test]
    fn test_trailing_slash_and_root() {
        let route = RoutePattern::compile("/user/:id").unwrap();
        assert!(route.matches("/user/42/").is_some());

        let root = RoutePattern::compile("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("").is_some());
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            RoutePattern::compile("/user/:"),
            Err(RegistryError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/:id/:id"),
            Err(RegistryError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_resolve_from_args() {
        let route = RoutePattern::compile("/v1/user/:id/post/:post").unwrap();
        assert_eq!(
            route.resolve(&[json!(42), json!("intro"), json!(true)]).as_deref(),
            Some("/v1/user/42/post/intro")
        );
        assert!(route.resolve(&[json!(42)]).is_none());
    }

    #[test]
    fn test_overlap_detection() {
        let by_id = RoutePattern::compile("/user/:id").unwrap();
        let me = RoutePattern::compile("/user/me").unwrap();
        let other = RoutePattern::compile("/account/me").unwrap();
        let deeper = RoutePattern::compile("/user/:id/posts").unwrap();

        assert!(by_id.overlaps(&me));
        assert!(me.overlaps(&by_id));
        assert!(!me.overlaps(&other));
        assert!(!by_id.overlaps(&deeper));
    }
}
