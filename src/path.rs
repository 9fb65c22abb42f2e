//! Dotted property paths with `*` wildcard segments.
//!
//! Paths are compiled once into a segment list and reused; recursive
//! traversal never re-splits or re-compiles. A segment containing `*` is
//! matched as a glob (converted to an anchored regex), everything else is a
//! literal key comparison.

use crate::problem::Error;
use regex::Regex;

/// One dot-delimited token of a property path.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Exact key comparison.
    Literal(String),
    /// Glob segment; `*` spans any run of characters.
    Pattern { raw: String, regex: Regex },
}

impl Segment {
    /// Whether `key` matches this segment.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Segment::Literal(name) => name == key,
            Segment::Pattern { regex, .. } => regex.is_match(key),
        }
    }

    /// The raw token text as written in the path.
    pub fn raw(&self) -> &str {
        match self {
            Segment::Literal(name) => name,
            Segment::Pattern { raw, .. } => raw,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Segment::Pattern { .. })
    }
}

/// A parsed dotted path, e.g. `sites.station.id` or `items.val*`.
#[derive(Debug, Clone)]
pub struct PathExpr {
    raw: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse a dotted path. Fails on an empty path.
    pub fn parse(path: &str) -> Result<Self, Error> {
        if path.is_empty() {
            return Err(Error::MalformedPath(path.to_string()));
        }

        let mut segments = Vec::new();
        for token in path.split('.') {
            if token.contains('*') {
                let regex = compile_glob(token)
                    .map_err(|_| Error::MalformedPath(path.to_string()))?;
                segments.push(Segment::Pattern {
                    raw: token.to_string(),
                    regex,
                });
            } else {
                segments.push(Segment::Literal(token.to_string()));
            }
        }

        Ok(PathExpr {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments; always >= 1 for a parsed path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, naming the leaf property.
    pub fn leaf(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }
}

/// Convert a glob token to an anchored regex: `*` -> `.*`, everything else
/// matched literally.
fn compile_glob(token: &str) -> Result<Regex, regex::Error> {
    let escaped: Vec<String> = token.split('*').map(regex::escape).collect();
    Regex::new(&format!("^{}$", escaped.join(".*")))
}
