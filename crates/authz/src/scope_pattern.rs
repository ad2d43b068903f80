//! Grammar for scope strings and the wildcard patterns roles store.
//!
//! REDESIGN FLAGS calls the stored scope wildcards "stringly-typed" and asks
//! for them to be "validated against a grammar" rather than matched ad hoc.
//! This module is that grammar: a small hand-rolled parser recognising the
//! five wildcard shapes plus the three exact-scope shapes, checked once at
//! role-configuration load time rather than on every authorization check.

use shared::error::{Error, Result};

/// A scope string or wildcard pattern, parsed into its structural parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopePattern {
    /// `*` — matches any scope.
    GlobalWildcard,
    /// `resource:*`
    ResourceWildcard { resource: String },
    /// `resource:action`
    ResourceAction { resource: String, action: String },
    /// `ext:*`
    ExtWildcard,
    /// `ext:*:action`
    ExtWildcardAction { action: String },
    /// `ext:name:*`
    ExtNameWildcard { name: String },
    /// `ext:name:action`
    ExtNameAction { name: String, action: String },
    /// `ext:name:feature:action`
    ExtNameFeatureAction {
        name: String,
        feature: String,
        action: String,
    },
}

impl ScopePattern {
    /// Parse a scope/pattern string, rejecting anything outside the five
    /// wildcard shapes and three exact shapes named by spec.md §4.4.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw == "*" {
            return Ok(Self::GlobalWildcard);
        }

        let parts: Vec<&str> = raw.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::validation(format!("invalid scope pattern: {raw}")));
        }

        match parts.as_slice() {
            [resource, "*"] if *resource != "ext" => Ok(Self::ResourceWildcard {
                resource: (*resource).to_string(),
            }),
            [resource, action] if *resource != "ext" => Ok(Self::ResourceAction {
                resource: (*resource).to_string(),
                action: (*action).to_string(),
            }),
            ["ext", "*"] => Ok(Self::ExtWildcard),
            ["ext", "*", action] => Ok(Self::ExtWildcardAction {
                action: (*action).to_string(),
            }),
            ["ext", name, "*"] => Ok(Self::ExtNameWildcard {
                name: (*name).to_string(),
            }),
            ["ext", name, action] => Ok(Self::ExtNameAction {
                name: (*name).to_string(),
                action: (*action).to_string(),
            }),
            ["ext", name, feature, action] => Ok(Self::ExtNameFeatureAction {
                name: (*name).to_string(),
                feature: (*feature).to_string(),
                action: (*action).to_string(),
            }),
            _ => Err(Error::validation(format!("invalid scope pattern: {raw}"))),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(
            self,
            Self::ResourceAction { .. } | Self::ExtNameAction { .. } | Self::ExtNameFeatureAction { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_five_wildcard_shapes() {
        assert_eq!(ScopePattern::parse("*").unwrap(), ScopePattern::GlobalWildcard);
        assert_eq!(
            ScopePattern::parse("tenants:*").unwrap(),
            ScopePattern::ResourceWildcard {
                resource: "tenants".into()
            }
        );
        assert_eq!(ScopePattern::parse("ext:*").unwrap(), ScopePattern::ExtWildcard);
        assert_eq!(
            ScopePattern::parse("ext:*:read").unwrap(),
            ScopePattern::ExtWildcardAction {
                action: "read".into()
            }
        );
        assert_eq!(
            ScopePattern::parse("ext:github:*").unwrap(),
            ScopePattern::ExtNameWildcard {
                name: "github".into()
            }
        );
    }

    #[test]
    fn parses_exact_shapes() {
        assert_eq!(
            ScopePattern::parse("tenants:write").unwrap(),
            ScopePattern::ResourceAction {
                resource: "tenants".into(),
                action: "write".into()
            }
        );
        assert_eq!(
            ScopePattern::parse("ext:github:read").unwrap(),
            ScopePattern::ExtNameAction {
                name: "github".into(),
                action: "read".into()
            }
        );
        assert_eq!(
            ScopePattern::parse("ext:github:issues:write").unwrap(),
            ScopePattern::ExtNameFeatureAction {
                name: "github".into(),
                feature: "issues".into(),
                action: "write".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_scopes() {
        assert!(ScopePattern::parse("").is_err());
        assert!(ScopePattern::parse("ext:a:b:c:d").is_err());
        assert!(ScopePattern::parse(":").is_err());
    }
}
