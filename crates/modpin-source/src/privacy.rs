#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    /// `prefix/*`: the prefix itself or anything below it.
    Subtree(String),
    /// `prefix*`: any path starting with the prefix.
    Wildcard(String),
    Literal(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        if let Some(prefix) = raw.strip_suffix("/*") {
            Self::Subtree(prefix.to_string())
        } else if let Some(prefix) = raw.strip_suffix('*') {
            Self::Wildcard(prefix.to_string())
        } else {
            Self::Literal(raw.to_string())
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Subtree(prefix) => {
                path == prefix || path.strip_prefix(prefix.as_str()).is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Wildcard(prefix) | Self::Literal(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Decides which module paths bypass the shared proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivacyMatcher {
    patterns: Vec<Pattern>,
}

impl PrivacyMatcher {
    /// Build from a comma-separated list such as `GOPRIVATE`.
    pub fn parse(list: &str) -> Self { Self::from_patterns(list.split(',')) }

    pub fn from_patterns<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Pattern::parse)
            .collect();
        Self { patterns }
    }

    pub fn is_private(&self, path: &str) -> bool { self.patterns.iter().any(|p| p.matches(path)) }

    pub fn is_empty(&self) -> bool { self.patterns.is_empty() }
}
