//! Resource-group scope filter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which resource groups to enumerate.
///
/// An empty scope means subscription-wide. Group names keep their input
/// order and duplicates; overlapping groups therefore produce duplicate
/// records, which is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Scope {
    groups: Vec<String>,
}

/// One unit of listing work derived from a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeTarget<'a> {
    Subscription,
    ResourceGroup(&'a str),
}

impl Scope {
    /// Subscription-wide scope.
    pub fn subscription() -> Self {
        Self::default()
    }

    /// Parse a comma-delimited resource-group filter.
    ///
    /// Names are trimmed; empty entries are dropped.
    pub fn parse(filter: &str) -> Self {
        Self::groups(filter.split(','))
    }

    pub fn groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            groups: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn is_subscription_wide(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn resource_groups(&self) -> &[String] {
        &self.groups
    }

    /// Listing targets in execution order.
    pub fn targets(&self) -> Vec<ScopeTarget<'_>> {
        if self.groups.is_empty() {
            vec![ScopeTarget::Subscription]
        } else {
            self.groups
                .iter()
                .map(|g| ScopeTarget::ResourceGroup(g.as_str()))
                .collect()
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            write!(f, "subscription")
        } else {
            write!(f, "{}", self.groups.join(","))
        }
    }
}

impl fmt::Display for ScopeTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeTarget::Subscription => write!(f, "subscription"),
            ScopeTarget::ResourceGroup(group) => write!(f, "{}", group),
        }
    }
}

impl From<String> for Scope {
    fn from(filter: String) -> Self {
        Self::parse(&filter)
    }
}

impl From<&str> for Scope {
    fn from(filter: &str) -> Self {
        Self::parse(filter)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.groups.join(",")
    }
}
