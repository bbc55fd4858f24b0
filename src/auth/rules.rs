// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative authorization rules.
//!
//! Rules form a closed set evaluated by [`evaluate`]. New policies are
//! added as new variants, never registered at runtime. Evaluation cannot
//! fail: anything it cannot decide is a deny.

use super::claims::Claims;
use super::roles::Role;

/// Resource attributes a rule may need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceContext {
    /// Subject that owns the resource being accessed
    pub owner_id: Option<String>,
}

impl ResourceContext {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }
}

/// Authorization rule bound to a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Any verified claims
    Authenticated,
    /// Roles contain `admin`
    AdminOnly,
    /// Roles contain `user`
    UserOnly,
    /// Roles contain `admin`, or the subject owns the resource
    AdminOrSubject,
    /// Every inner rule allows (empty denies)
    AllOf(Vec<Rule>),
    /// At least one inner rule allows
    AnyOf(Vec<Rule>),
}

impl Rule {
    /// Whether this rule reads the resource owner.
    pub fn needs_owner(&self) -> bool {
        match self {
            Rule::AdminOrSubject => true,
            Rule::AllOf(rules) | Rule::AnyOf(rules) => rules.iter().any(Rule::needs_owner),
            Rule::Authenticated | Rule::AdminOnly | Rule::UserOnly => false,
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |rules: &[Rule], sep: &str| {
            rules
                .iter()
                .map(Rule::to_string)
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self {
            Rule::Authenticated => f.write_str("authenticated"),
            Rule::AdminOnly => f.write_str("admin_only"),
            Rule::UserOnly => f.write_str("user_only"),
            Rule::AdminOrSubject => f.write_str("admin_or_subject"),
            Rule::AllOf(rules) => write!(f, "({})", join(rules.as_slice(), " and ")),
            Rule::AnyOf(rules) => write!(f, "({})", join(rules.as_slice(), " or ")),
        }
    }
}

/// Decide whether `claims` satisfy `rule` for the given resource.
pub fn evaluate(claims: &Claims, rule: &Rule, ctx: Option<&ResourceContext>) -> bool {
    match rule {
        Rule::Authenticated => true,
        Rule::AdminOnly => claims.has_role(Role::Admin),
        Rule::UserOnly => claims.has_role(Role::User),
        Rule::AdminOrSubject => {
            let Some(owner) = ctx
                .and_then(|ctx| ctx.owner_id.as_deref())
                .filter(|owner| !owner.is_empty())
            else {
                return false;
            };
            claims.has_role(Role::Admin) || owner == claims.subject
        }
        Rule::AllOf(rules) => !rules.is_empty() && rules.iter().all(|r| evaluate(claims, r, ctx)),
        Rule::AnyOf(rules) => rules.iter().any(|r| evaluate(claims, r, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::claims_at;

    fn claims(subject: &str, roles: &[&str]) -> Claims {
        claims_at(subject, roles, 0, 60)
    }

    #[test]
    fn admin_only_requires_admin_role() {
        assert!(evaluate(&claims("u1", &["admin"]), &Rule::AdminOnly, None));
        assert!(evaluate(&claims("u1", &["user", "admin"]), &Rule::AdminOnly, None));
        assert!(!evaluate(&claims("u1", &["user"]), &Rule::AdminOnly, None));
        assert!(!evaluate(&claims("u1", &[]), &Rule::AdminOnly, None));
    }

    #[test]
    fn admin_or_subject_requires_context_even_for_admin() {
        let admin = claims("u1", &["admin"]);
        assert!(!evaluate(&admin, &Rule::AdminOrSubject, None));
        assert!(!evaluate(
            &admin,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::default())
        ));
        assert!(!evaluate(
            &admin,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::owned_by(""))
        ));
        assert!(evaluate(
            &admin,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::owned_by("u2"))
        ));
    }

    #[test]
    fn admin_or_subject_allows_owner_only() {
        let user = claims("u1", &["user"]);
        assert!(evaluate(
            &user,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::owned_by("u1"))
        ));
        assert!(!evaluate(
            &user,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::owned_by("u2"))
        ));
    }

    #[test]
    fn admin_or_subject_denies_without_owner() {
        let user = claims("u1", &[]);
        assert!(!evaluate(&user, &Rule::AdminOrSubject, None));
        assert!(!evaluate(
            &user,
            &Rule::AdminOrSubject,
            Some(&ResourceContext::default())
        ));
    }

    #[test]
    fn composites_combine_rules() {
        let user = claims("u1", &["user"]);
        let owned = ResourceContext::owned_by("u1");

        let both = Rule::AllOf(vec![Rule::UserOnly, Rule::AdminOrSubject]);
        assert!(evaluate(&user, &both, Some(&owned)));
        assert!(!evaluate(&user, &both, None));

        let either = Rule::AnyOf(vec![Rule::AdminOnly, Rule::UserOnly]);
        assert!(evaluate(&user, &either, None));
        assert!(!evaluate(&claims("u1", &[]), &either, None));
    }

    #[test]
    fn empty_composites_deny() {
        let admin = claims("u1", &["admin"]);
        assert!(!evaluate(&admin, &Rule::AllOf(vec![]), None));
        assert!(!evaluate(&admin, &Rule::AnyOf(vec![]), None));
    }

    #[test]
    fn needs_owner_looks_through_composites() {
        assert!(Rule::AdminOrSubject.needs_owner());
        assert!(Rule::AnyOf(vec![Rule::AdminOnly, Rule::AdminOrSubject]).needs_owner());
        assert!(!Rule::AllOf(vec![Rule::AdminOnly, Rule::UserOnly]).needs_owner());
    }

    #[test]
    fn display_names_rules() {
        let rule = Rule::AnyOf(vec![Rule::AdminOnly, Rule::AdminOrSubject]);
        assert_eq!(rule.to_string(), "(admin_only or admin_or_subject)");
    }
}
