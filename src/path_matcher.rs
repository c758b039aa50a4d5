//! Path exclusion rules

use std::fmt::Display;

/// A path pattern that, if matched, bypasses authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExclusionRule {
    /// `/prefix*` - matches any path starting with `/prefix`
    Wildcard(String),
    /// `/dir/` - matches `/dir`, `/dir/` and anything below it. Stored without the trailing slash.
    Directory(String),
    /// `/path` - matches `/path` and anything below `/path/`
    Exact(String),
}

impl ExclusionRule {
    /// Parse a rule from a configured pattern. Surrounding whitespace is ignored, and
    /// a blank pattern yields `None`.
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        let rule = if let Some(prefix) = pattern.strip_suffix('*') {
            ExclusionRule::Wildcard(prefix.to_owned())
        } else if let Some(dir) = pattern.strip_suffix('/') {
            ExclusionRule::Directory(dir.to_owned())
        } else {
            ExclusionRule::Exact(pattern.to_owned())
        };
        Some(rule)
    }

    /// Whether the path matches this rule
    pub fn matches(&self, path: &str) -> bool {
        match self {
            ExclusionRule::Wildcard(prefix) => path.starts_with(prefix.as_str()),
            ExclusionRule::Directory(base) | ExclusionRule::Exact(base) => path
                .strip_prefix(base.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

impl Display for ExclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionRule::Wildcard(prefix) => write!(f, "{prefix}*"),
            ExclusionRule::Directory(dir) => write!(f, "{dir}/"),
            ExclusionRule::Exact(path) => write!(f, "{path}"),
        }
    }
}

/// Decides whether request paths require authentication, given a fixed, ordered set
/// of [exclusion rules](ExclusionRule).
///
/// ```
/// use rocket_session_auth::PathMatcher;
///
/// let matcher = PathMatcher::new(["/api/v1/status/*", "/api/v1/auth_session/login/"]);
/// assert!(!matcher.requires_auth(Some("/api/v1/status/")));
/// assert!(!matcher.requires_auth(Some("/api/v1/auth_session/login")));
/// assert!(matcher.requires_auth(Some("/api/v1/users")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PathMatcher {
    rules: Vec<ExclusionRule>,
}

impl PathMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: patterns
                .into_iter()
                .filter_map(|p| ExclusionRule::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Returns `false` if the path matches one of the rules, `true` otherwise. A missing
    /// path always requires authentication.
    pub fn requires_auth(&self, path: Option<&str>) -> bool {
        let Some(path) = path else {
            return true;
        };
        match self.rules.iter().find(|rule| rule.matches(path)) {
            Some(rule) => {
                rocket::debug!("Path '{path}' excluded from auth by rule '{rule}'");
                false
            }
            None => true,
        }
    }
}

/// One-shot version of [`PathMatcher::requires_auth`]. Missing rules mean every path
/// requires authentication.
pub fn requires_auth<S: AsRef<str>>(path: Option<&str>, exclusion_rules: Option<&[S]>) -> bool {
    match exclusion_rules {
        Some(rules) => PathMatcher::new(rules).requires_auth(path),
        None => true,
    }
}
