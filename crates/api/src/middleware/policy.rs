//! Route access policy.
//!
//! An ordered list of path rules. The first rule whose pattern matches the
//! request path decides whether a token is needed; paths no rule matches fall
//! back to the policy default.
//!
//! Patterns are either exact (`/cart`) or a `/**` suffix (`/shop/**`), which
//! matches the prefix itself and everything below it.

/// What a request needs to reach a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(prefix) => Self::Subtree(prefix.to_owned()),
            None => Self::Exact(pattern.to_owned()),
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Subtree(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// Paths reachable without a token.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/login",
    "/signup",
    "/shop",
    "/shop/**",
    "/cart",
    "/my-orders",
    "/checkout",
    "/members/join",
    "/members/sign-in",
    "/products",
    "/products/**",
    "/categories",
    "/swagger-ui.html",
    "/v3/api-docs/**",
    "/swagger-ui/**",
    "/health",
    "/health/**",
];

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<(PathPattern, Access)>,
    default: Access,
}

impl AccessPolicy {
    /// Empty policy; unmatched paths get `default`.
    #[must_use]
    pub const fn new(default: Access) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Append rules granting `access` to each pattern.
    #[must_use]
    pub fn with(mut self, patterns: &[&str], access: Access) -> Self {
        self.rules.extend(
            patterns
                .iter()
                .map(|pattern| (PathPattern::parse(pattern), access)),
        );
        self
    }

    /// Access required for `path`.
    #[must_use]
    pub fn access(&self, path: &str) -> Access {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map_or(self.default, |(_, access)| *access)
    }
}

impl Default for AccessPolicy {
    /// Shop policy: [`PUBLIC_PATHS`] are open, everything else needs a token.
    fn default() -> Self {
        Self::new(Access::Authenticated).with(PUBLIC_PATHS, Access::Public)
    }
}
