//! Path patterns used by the admission gate.
//!
//! Three pattern forms are accepted:
//! - `*.ico`            wildcard suffix on the last path segment
//! - `/favicon.ico`     exact literal path
//! - `/admin(.*)`       anything with groups or `*` compiles to an anchored regex.
//!   Text inside `( … )` is regex, text outside is literal, `*` stays within one
//!   segment and `**` crosses segments.
//!
//! All forms match ASCII case-insensitively, so `/ADMIN/users` falls under
//! `/admin(.*)` the same way it would in the identity provider's own matcher.
//!
//! The `regex` crate has no lookaround, so "everything except …" is expressed as
//! separate skip rules rather than a `(?!…)` group.
use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("pattern must start with '/' or '*.': {0}")]
    MissingLeadingSlash(String),
    #[error("unbalanced group in pattern: {0}")]
    Unbalanced(String),
    #[error("invalid pattern {pattern}: {reason}")]
    Regex { pattern: String, reason: String },
}

#[derive(Debug, Clone)]
enum Kind {
    Exact(String),
    Extension(String),
    Regex(Regex),
}

/// A single compiled path rule.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    kind: Kind,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let source = raw.trim();
        if source.is_empty() {
            return Err(PatternError::Empty);
        }

        if let Some(ext) = source.strip_prefix("*.") {
            if ext.is_empty() || ext.contains('/') {
                return Err(PatternError::MissingLeadingSlash(source.to_string()));
            }
            return Ok(Self {
                source: source.to_string(),
                kind: Kind::Extension(format!(".{}", ext.to_ascii_lowercase())),
            });
        }

        if !source.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(source.to_string()));
        }

        let kind = if source.contains(['(', ')', '*']) {
            let expr = translate(source)?;
            let re = RegexBuilder::new(&expr)
                .case_insensitive(true)
                .build()
                .map_err(|e| PatternError::Regex {
                    pattern: source.to_string(),
                    reason: e.to_string(),
                })?;
            Kind::Regex(re)
        } else {
            Kind::Exact(source.to_string())
        };

        Ok(Self {
            source: source.to_string(),
            kind,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.kind {
            Kind::Exact(p) => p.eq_ignore_ascii_case(path),
            Kind::Extension(ext) => {
                let last = path.rsplit('/').next().unwrap_or(path);
                last.len() > ext.len() && last.to_ascii_lowercase().ends_with(ext.as_str())
            }
            Kind::Regex(re) => re.is_match(path),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// Literal runs are escaped, groups are copied verbatim, `*`/`**` become globs.
fn translate(source: &str) -> Result<String, PatternError> {
    let mut out = String::from("^");
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();

                let mut depth = 1usize;
                out.push('(');
                while depth > 0 {
                    let Some(g) = chars.next() else {
                        return Err(PatternError::Unbalanced(source.to_string()));
                    };
                    match g {
                        '\\' => {
                            out.push(g);
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                            continue;
                        }
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    out.push(g);
                }
            }
            ')' => return Err(PatternError::Unbalanced(source.to_string())),
            '*' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            _ => literal.push(c),
        }
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');
    Ok(out)
}

/// An ordered list of patterns; a path matches when any pattern does.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    patterns: Vec<PathPattern>,
}

impl RouteMatcher {
    /// Parse a comma-separated list. Blank entries are ignored.
    pub fn parse_list(raw: &str) -> Result<Self, PatternError> {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    pub fn first_match(&self, path: &str) -> Option<&PathPattern> {
        self.patterns.iter().find(|p| p.matches(path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}
