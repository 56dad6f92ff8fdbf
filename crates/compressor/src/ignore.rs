//! Ignore-file rules.
//!
//! An ignore file lists one shell-style glob per line. Matching works on
//! plain strings so it can be tested without touching the filesystem.
//! Negation is not supported: a leading `!` is an ordinary character.

use glob::{MatchOptions, Pattern, PatternError};
use std::fs;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, trace, warn};

/// `*` and `?` never cross a `/`, and matching is case-sensitive.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A single compiled ignore pattern.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    raw: String,
    pattern: Pattern,
    /// Number of trailing path components the pattern is matched against.
    depth: usize,
}

impl IgnoreRule {
    pub fn new(raw: &str) -> Result<Self, PatternError> {
        let pattern = Pattern::new(&collapse_stars(raw))?;
        let depth = raw.split('/').count();
        Ok(Self {
            raw: raw.to_string(),
            pattern,
            depth,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches a `/`-separated path (or bare file name).
    ///
    /// Patterns without `/` see only the file name; a pattern with N
    /// components sees the last N components of the candidate.
    pub fn matches(&self, candidate: &str) -> bool {
        match trailing_components(candidate, self.depth) {
            Some(tail) => self.pattern.matches_with(tail, MATCH_OPTIONS),
            None => false,
        }
    }
}

/// Folds every run of `*` into a single `*`.
///
/// `**` carries no recursive meaning in an ignore file; `clip**.mp4` means
/// `clip*.mp4` and `trips/**/a.mp4` means `trips/*/a.mp4`.
fn collapse_stars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Returns the last `n` `/`-separated components of `path`, or `None` if it
/// has fewer.
fn trailing_components(path: &str, n: usize) -> Option<&str> {
    if n == 0 {
        return None;
    }
    match path.rmatch_indices('/').nth(n - 1) {
        Some((idx, _)) => Some(&path[idx + 1..]),
        None if path.split('/').count() == n => Some(path),
        None => None,
    }
}

/// Checks one pattern against one candidate string.
///
/// Invalid patterns never match.
pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    IgnoreRule::new(pattern)
        .map(|rule| rule.matches(candidate))
        .unwrap_or(false)
}

/// The ordered, de-duplicated set of ignore rules for one run.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses ignore-file content.
    ///
    /// Lines are trimmed, blank lines skipped, repeated patterns collapse
    /// to their first occurrence. Patterns that fail to compile are logged
    /// and dropped.
    pub fn parse(content: &str) -> Self {
        let mut rules: Vec<IgnoreRule> = Vec::new();

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if rules.iter().any(|r| r.raw == line) {
                continue;
            }
            match IgnoreRule::new(line) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("Invalid ignore pattern '{}': {}", line, e),
            }
        }

        Self { rules }
    }

    /// Loads rules from an ignore file. A missing file yields no rules.
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No ignore file at {}", path.display());
                return Ok(Self::empty());
            }
            Err(e) => return Err(e),
        };

        let rules = Self::parse(&content);
        trace!(
            "Ignoring files matching:\n{}",
            rules.patterns().collect::<Vec<_>>().join("\n")
        );
        Ok(rules)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(IgnoreRule::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if any rule matches the candidate string.
    pub fn matches_str(&self, candidate: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(candidate))
    }

    /// True if any rule matches the given path.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let joined = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        self.matches_str(&joined)
    }
}
