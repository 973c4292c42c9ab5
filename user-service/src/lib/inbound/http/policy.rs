use std::collections::HashMap;

use auth::RoutePolicy;
use auth::ADMIN_ROLE;
use auth::DEFAULT_ROLE;
use axum::http::Method;

pub const USERS_PATH: &str = "/api/users";
pub const USER_PATH: &str = "/api/users/:id";
pub const USER_ID_PARAM: &str = "id";

/// Access rules for protected routes, keyed by method and route template.
///
/// Built once at startup. A protected route without an entry is denied.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<&'static str, HashMap<Method, RoutePolicy>>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, method: Method, route: &'static str, policy: RoutePolicy) -> Self {
        self.policies
            .entry(route)
            .or_default()
            .insert(method, policy);
        self
    }

    pub fn get(&self, method: &Method, route: &str) -> Option<&RoutePolicy> {
        self.policies.get(route)?.get(method)
    }

    /// Policies for the user management routes.
    pub fn for_user_routes() -> Self {
        let owner_or_admin =
            RoutePolicy::require_roles([ADMIN_ROLE, DEFAULT_ROLE]).with_self_access(USER_ID_PARAM);

        Self::new()
            .insert(
                Method::GET,
                USERS_PATH,
                RoutePolicy::require_roles([ADMIN_ROLE]),
            )
            .insert(Method::GET, USER_PATH, owner_or_admin.clone())
            .insert(Method::PUT, USER_PATH, owner_or_admin.clone())
            .insert(Method::DELETE, USER_PATH, owner_or_admin)
    }
}
