use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::rbac::{self, Action, Ownership};
use crate::auth::AuthState;
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Login,
    Dashboard,
    Tasks,
    Users,
    Profile,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Login,
        Route::Dashboard,
        Route::Tasks,
        Route::Users,
        Route::Profile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Tasks => "/tasks",
            Route::Users => "/users",
            Route::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|route| route.path() == normalized)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Tasks => "Tasks",
            Route::Users => "Users",
            Route::Profile => "Profile",
        }
    }

    /// Capability needed to open the route once signed in.
    fn required_action(&self) -> Option<Action> {
        match self {
            Route::Dashboard => Some(Action::ViewDashboard),
            Route::Users => Some(Action::ViewUsers),
            // every role sees the tasks page; Members get their own tasks only
            Route::Tasks => Some(Action::ViewTask),
            Route::Login | Route::Profile => None,
        }
    }

    fn allows(&self, user: &User) -> bool {
        match self.required_action() {
            Some(action) => rbac::can(user.role, action, Ownership::Own),
            None => true,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Where a navigation request actually lands for the given auth state.
pub fn guard(route: Route, state: &AuthState) -> Route {
    match (route, state.user()) {
        (Route::Login, None) => Route::Login,
        (_, None) => Route::Login,
        (Route::Login, Some(_)) => Route::Dashboard,
        (route, Some(user)) if route.allows(user) => route,
        (route, Some(user)) => {
            tracing::debug!(route = %route, role = %user.role, "route not available for role");
            Route::Dashboard
        }
    }
}

/// Routes shown in the navigation bar for `user`.
pub fn nav_items(user: &User) -> Vec<Route> {
    [Route::Dashboard, Route::Tasks, Route::Users]
        .into_iter()
        .filter(|route| route.allows(user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rbac::Role;

    fn user(role: Role) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role,
            is_active: true,
        }
    }

    #[test]
    fn test_anonymous_always_lands_on_login() {
        for route in Route::ALL {
            assert_eq!(guard(route, &AuthState::Anonymous), Route::Login);
        }
    }

    #[test]
    fn test_signed_in_user_skips_login() {
        let state = AuthState::from_user(Some(user(Role::Member)));
        assert_eq!(guard(Route::Login, &state), Route::Dashboard);
        assert_eq!(guard(Route::Profile, &state), Route::Profile);
        assert_eq!(guard(Route::Tasks, &state), Route::Tasks);
    }

    #[test]
    fn test_member_redirected_from_users() {
        let member = AuthState::from_user(Some(user(Role::Member)));
        assert_eq!(guard(Route::Users, &member), Route::Dashboard);

        let manager = AuthState::from_user(Some(user(Role::Manager)));
        assert_eq!(guard(Route::Users, &manager), Route::Users);
    }

    #[test]
    fn test_nav_items_per_role() {
        assert_eq!(
            nav_items(&user(Role::Admin)),
            vec![Route::Dashboard, Route::Tasks, Route::Users]
        );
        assert_eq!(
            nav_items(&user(Role::Manager)),
            vec![Route::Dashboard, Route::Tasks, Route::Users]
        );
        assert_eq!(nav_items(&user(Role::Member)), vec![Route::Dashboard, Route::Tasks]);
    }

    #[test]
    fn test_paths() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/tasks/"), Some(Route::Tasks));
        assert_eq!(Route::from_path("/nope"), None);
        assert_eq!(Route::Users.to_string(), "/users");
    }
}
