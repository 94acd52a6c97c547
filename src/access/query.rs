use std::str::FromStr;

use crate::access::errors::AccessError;
use crate::access::types::{EffectiveGrant, Reason, Role};

/// Role filter: a specific role or `all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl FromStr for RoleFilter {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(RoleFilter::All),
            other => other.parse().map(RoleFilter::Only),
        }
    }
}

/// Reason filter: a specific reason or `all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReasonFilter {
    #[default]
    All,
    Only(Reason),
}

impl FromStr for ReasonFilter {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ReasonFilter::All),
            other => other.parse().map(ReasonFilter::Only),
        }
    }
}

/// Conjunction of the free-text, role and reason predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantFilter {
    /// Lowercased search text. Empty matches every row.
    needle: String,
    pub role: RoleFilter,
    pub reason: ReasonFilter,
}

impl GrantFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring to look for. Only the empty string matches
    /// every row; whitespace is part of the needle.
    pub fn query(mut self, text: &str) -> Self {
        self.needle = text.to_lowercase();
        self
    }

    pub fn role(mut self, role: RoleFilter) -> Self {
        self.role = role;
        self
    }

    pub fn reason(mut self, reason: ReasonFilter) -> Self {
        self.reason = reason;
        self
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, grant: &EffectiveGrant) -> bool {
        self.matches_role(grant) && self.matches_reason(grant) && self.matches_text(grant)
    }

    fn matches_role(&self, grant: &EffectiveGrant) -> bool {
        match self.role {
            RoleFilter::All => true,
            RoleFilter::Only(role) => grant.user_role == role,
        }
    }

    fn matches_reason(&self, grant: &EffectiveGrant) -> bool {
        match self.reason {
            ReasonFilter::All => true,
            ReasonFilter::Only(reason) => grant.reason == reason,
        }
    }

    fn matches_text(&self, grant: &EffectiveGrant) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let hit = |s: &str| s.to_lowercase().contains(&self.needle);
        hit(&grant.user_name)
            || hit(&grant.user_email)
            || hit(&grant.course_title)
            || grant.via_group_name.as_deref().is_some_and(hit)
    }
}

/// Keep the rows matching `filter`, preserving input order.
pub fn filter_grants<'a, I>(grants: I, filter: &GrantFilter) -> Vec<&'a EffectiveGrant>
where
    I: IntoIterator<Item = &'a EffectiveGrant>,
{
    grants.into_iter().filter(|g| filter.matches(g)).collect()
}
