use std::collections::BTreeSet;

use crate::jwt::IdentityClaims;

/// Access rule attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    required_roles: Option<BTreeSet<String>>,
    self_access_param: Option<String>,
}

impl RoutePolicy {
    /// Any authenticated caller may use the route.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Caller must hold at least one of `roles`.
    pub fn require_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_roles: Some(roles.into_iter().map(Into::into).collect()),
            self_access_param: None,
        }
    }

    /// Compare the named path parameter with the caller's subject.
    pub fn with_self_access(mut self, param: impl Into<String>) -> Self {
        self.self_access_param = Some(param.into());
        self
    }

    pub fn required_roles(&self) -> Option<&BTreeSet<String>> {
        self.required_roles.as_ref()
    }

    pub fn self_access_param(&self) -> Option<&str> {
        self.self_access_param.as_deref()
    }
}

/// Decide whether a caller may use a route.
///
/// Without required roles every verified caller is allowed. Otherwise the
/// caller must be an admin or the owner of the path subject, and must also
/// hold one of the required roles: ownership narrows the role check, it never
/// replaces it.
///
/// # Arguments
/// * `claims` - Verified claims of the caller
/// * `policy` - Policy declared for the route
/// * `path_subject` - Resource owner id taken from the request path, if any
pub fn authorize(claims: &IdentityClaims, policy: &RoutePolicy, path_subject: Option<&str>) -> bool {
    let Some(required_roles) = policy.required_roles() else {
        return true;
    };

    let has_required_role = claims.roles.iter().any(|role| required_roles.contains(role));
    let is_admin = claims.is_admin();
    let is_self = path_subject.is_some_and(|subject| subject == claims.sub);

    (is_admin || is_self) && has_required_role
}
