//! Catalog key matchers
//!
//! A catalog key written as `/expr/` is a regular expression matched anywhere
//! in the requested name; any other key matches only itself.

use std::fmt;

use depot_core::error::DepotError;
use regex::Regex;

use crate::ResolverResult;

/// Highest capture group substituted into a URI template
pub const MAX_CAPTURES: usize = 3;

/// How a configured catalog key is compared against a requested name
#[derive(Debug, Clone)]
pub enum CatalogMatcher {
    /// Exact name
    Literal(String),
    /// Regular expression, unanchored unless the expression anchors itself
    Pattern(Regex),
}

impl CatalogMatcher {
    /// Build a matcher from a configuration key
    pub fn parse(key: &str) -> ResolverResult<Self> {
        match key.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
            Some(expr) => Regex::new(expr)
                .map(CatalogMatcher::Pattern)
                .map_err(|e| DepotError::InvalidPattern {
                    pattern: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(CatalogMatcher::Literal(key.to_string())),
        }
    }

    /// Match `name`, returning capture groups 1..=3 on success.
    ///
    /// Literal matches have no captures.
    pub fn captures(&self, name: &str) -> Option<[Option<String>; MAX_CAPTURES]> {
        match self {
            CatalogMatcher::Literal(literal) => (literal == name).then(Default::default),
            CatalogMatcher::Pattern(regex) => {
                let caps = regex.captures(name)?;
                let mut groups: [Option<String>; MAX_CAPTURES] = Default::default();
                for (i, slot) in groups.iter_mut().enumerate() {
                    *slot = caps.get(i + 1).map(|m| m.as_str().to_string());
                }
                Some(groups)
            },
        }
    }

    /// Whether this matcher is a regular expression
    pub fn is_pattern(&self) -> bool {
        matches!(self, CatalogMatcher::Pattern(_))
    }
}

impl fmt::Display for CatalogMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogMatcher::Literal(literal) => write!(f, "{}", literal),
            CatalogMatcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Replace `$1`..`$3` with the matching capture; unmatched groups stay as-is.
///
/// The template is scanned once, so captured text is never itself
/// substituted.
pub fn substitute(template: &str, groups: &[Option<String>; MAX_CAPTURES]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let group = after
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|n| (n as usize).checked_sub(1))
            .and_then(|i| groups.get(i))
            .and_then(Option::as_deref);

        match group {
            Some(value) => {
                out.push_str(value);
                // The group digit is ASCII
                rest = &after[1..];
            },
            None => {
                out.push('$');
                rest = after;
            },
        }
    }

    out.push_str(rest);
    out
}
