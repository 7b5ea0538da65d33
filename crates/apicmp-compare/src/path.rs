//! JSON paths and ignore rules
//!
//! Paths are displayed as `root['key'][0]`. Ignore rules accept a looser
//! grammar so that `ts`, `root.ts` and `root['ts']` all name the same field:
//!
//! ```text
//! rule    := ["root"] segment*
//! segment := name | "." name | "['" name "']" | "[\"" name "\"]" | "[" N "]" | "[*]" | "*"
//! ```
//!
//! A rule matches a path only when every segment matches, so a rule names one
//! subtree and everything beneath it.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{CompareError, CompareResult};

/// One step into a JSON value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a JSON document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path to an object member below this one
    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// Path to an array element below this one
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, "['{}']", key.replace('\'', "\\'"))?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleSegment {
    Key(String),
    Index(usize),
    Any,
}

impl RuleSegment {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (RuleSegment::Any, _) => true,
            (RuleSegment::Key(a), PathSegment::Key(b)) => a == b,
            (RuleSegment::Index(a), PathSegment::Index(b)) => a == b,
            _ => false,
        }
    }
}

/// A single parsed ignore rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    source: String,
    segments: Vec<RuleSegment>,
}

impl IgnoreRule {
    /// The rule as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if this rule names exactly the given path
    pub fn matches(&self, path: &JsonPath) -> bool {
        self.segments.len() == path.segments.len()
            && self
                .segments
                .iter()
                .zip(path.segments.iter())
                .all(|(rule, segment)| rule.matches(segment))
    }
}

impl FromStr for IgnoreRule {
    type Err = CompareError;

    fn from_str(rule: &str) -> CompareResult<Self> {
        let invalid = |reason: &str| CompareError::InvalidIgnorePath {
            rule: rule.to_string(),
            reason: reason.to_string(),
        };

        let text = rule.trim();
        if text.is_empty() {
            return Err(invalid("empty rule"));
        }

        let mut rest = text;
        // `root` alone, or followed by `.` / `[`, is the document root
        if let Some(after) = rest.strip_prefix("root") {
            if after.is_empty() || after.starts_with('.') || after.starts_with('[') {
                rest = after;
            }
        }

        let mut segments = Vec::new();
        let mut first = true;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let inner = after[..close].trim();
                rest = &after[close + 1..];
                segments.push(parse_bracket(inner).ok_or_else(|| invalid("bad bracket segment"))?);
            } else {
                let body = match rest.strip_prefix('.') {
                    Some(after) => after,
                    None if first => rest,
                    None => return Err(invalid("expected '.' or '['")),
                };
                let end = body.find(['.', '[']).unwrap_or(body.len());
                let name = &body[..end];
                if name.is_empty() {
                    return Err(invalid("empty field name"));
                }
                if name.contains(']') {
                    return Err(invalid("unexpected ']'"));
                }
                segments.push(if name == "*" {
                    RuleSegment::Any
                } else {
                    RuleSegment::Key(name.to_string())
                });
                rest = &body[end..];
            }
            first = false;
        }

        Ok(Self {
            source: rule.to_string(),
            segments,
        })
    }
}

fn parse_bracket(inner: &str) -> Option<RuleSegment> {
    if inner == "*" {
        return Some(RuleSegment::Any);
    }
    for quote in ['\'', '"'] {
        if let Some(name) = inner
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return Some(RuleSegment::Key(name.to_string()));
        }
    }
    inner.parse().ok().map(RuleSegment::Index)
}

/// The set of ignore rules a diff is computed with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// No ignored paths
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse every rule, failing on the first invalid one
    pub fn parse<I, S>(rules: I) -> CompareResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|rule| rule.as_ref().parse())
            .collect::<CompareResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Check if a path is covered by any rule
    pub fn is_ignored(&self, path: &JsonPath) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    /// The rules as written
    pub fn sources(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.source.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
