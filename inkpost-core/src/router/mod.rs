//! Route table and navigation guard
//!
//! Routes carry static authorization metadata fixed when the table is built.
//! The [`NavigationGuard`] consults that metadata together with the current
//! session before every transition.
//!
//! # Example
//!
//! ```no_run
//! use inkpost_core::router::{RouteRequirement, RouteTable};
//!
//! let routes = RouteTable::new()
//!     .route("home", "/", RouteRequirement::None)
//!     .auth_route("login", "/auth/login")
//!     .route("admin", "/admin/:section", RouteRequirement::role("admin"));
//! ```

mod guard;
mod notice;

pub use guard::{NavigationDenied, NavigationGuard, NavigationOutcome};
pub use notice::{ForbiddenNotice, LogNotifier, Notifier, RecordingNotifier};

use crate::roles::Role;
use std::collections::HashMap;

/// Path parameters extracted from `:name` segments
pub type PathParams = HashMap<String, String>;

/// Authorization metadata of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Public
    None,
    /// Any signed-in identity
    Authenticated,
    /// Signed-in identity holding the role
    Role(String),
}

impl RouteRequirement {
    pub fn role(role: impl Into<String>) -> Self {
        RouteRequirement::Role(role.into())
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, RouteRequirement::None)
    }
}

impl std::fmt::Display for RouteRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteRequirement::None => write!(f, "public"),
            RouteRequirement::Authenticated => write!(f, "authenticated"),
            RouteRequirement::Role(role) => write!(f, "authenticated + {}", role),
        }
    }
}

/// Route definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub name: String,
    pub pattern: String,
    pub requirement: RouteRequirement,
    /// Login/register pages; signed-in users are sent away from them
    pub auth_only: bool,
    /// Notice shown when a role check fails
    pub forbidden_message: Option<String>,
}

impl RouteDef {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        requirement: RouteRequirement,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: normalize_path(&pattern.into()),
            requirement,
            auth_only: false,
            forbidden_message: None,
        }
    }

    /// Match a normalized path, extracting parameters
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let pattern_parts: Vec<&str> = self.pattern.split('/').collect();
        let path_parts: Vec<&str> = path.split('/').collect();

        if pattern_parts.len() != path_parts.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
            if let Some(param_name) = pattern_part.strip_prefix(':') {
                if path_part.is_empty() {
                    return None;
                }
                params.insert(param_name.to_string(), path_part.to_string());
            } else if pattern_part != path_part {
                return None;
            }
        }

        Some(params)
    }
}

/// A route matched against a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    pub route: &'a RouteDef,
    pub params: PathParams,
}

/// Static route table. First matching route wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route
    pub fn route(
        mut self,
        name: impl Into<String>,
        pattern: impl Into<String>,
        requirement: RouteRequirement,
    ) -> Self {
        self.routes.push(RouteDef::new(name, pattern, requirement));
        self
    }

    /// Add a login/register style route
    pub fn auth_route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        let mut def = RouteDef::new(name, pattern, RouteRequirement::None);
        def.auth_only = true;
        self.routes.push(def);
        self
    }

    /// Add routes sharing a prefix and requirement (a dashboard section)
    pub fn section(
        mut self,
        prefix: &str,
        requirement: RouteRequirement,
        forbidden_message: Option<&str>,
        children: &[(&str, &str)],
    ) -> Self {
        for (name, suffix) in children {
            let pattern = format!("{}/{}", prefix.trim_end_matches('/'), suffix.trim_start_matches('/'));
            let mut def = RouteDef::new(*name, pattern, requirement.clone());
            def.forbidden_message = forbidden_message.map(str::to_string);
            self.routes.push(def);
        }
        self
    }

    /// The blog application's routes
    pub fn blog() -> Self {
        Self::new()
            .route("blog", "/", RouteRequirement::None)
            .route("post", "/blog/:id", RouteRequirement::None)
            .auth_route("auth-login", "/auth/login")
            .auth_route("auth-register", "/auth/register")
            .section(
                "/dashboard",
                RouteRequirement::role(Role::ADMIN),
                Some("Only administrators can access the dashboard"),
                &[
                    ("dashboard-posts", ""),
                    ("dashboard-posts-new", "posts/new"),
                    ("dashboard-posts-edit", "posts/:id/edit"),
                    ("dashboard-categories", "categories"),
                    ("dashboard-categories-create", "categories/new"),
                    ("dashboard-categories-edit", "categories/:id/edit"),
                    ("dashboard-users", "users"),
                ],
            )
            .route("create-post", "/create-post", RouteRequirement::Authenticated)
            .route("about", "/about", RouteRequirement::None)
    }

    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    pub fn find(&self, name: &str) -> Option<&RouteDef> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Resolve a path (query string and fragment ignored)
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute<'_>> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find_map(|route| route.matches(&path).map(|params| ResolvedRoute { route, params }))
    }
}

/// Strip query/fragment and trailing slashes; always starts with `/`
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/dashboard/"), "/dashboard");
        assert_eq!(normalize_path("/blog/42?ref=home#top"), "/blog/42");
        assert_eq!(normalize_path("about"), "/about");
    }

    #[test]
    fn test_pattern_matching() {
        let route = RouteDef::new("edit", "/dashboard/posts/:id/edit", RouteRequirement::None);
        let params = route.matches("/dashboard/posts/p1/edit").unwrap();
        assert_eq!(params.get("id"), Some(&"p1".to_string()));

        assert!(route.matches("/dashboard/posts/p1").is_none());
        assert!(route.matches("/dashboard/posts//edit").is_none());
    }

    #[test]
    fn test_blog_table_requirements() {
        let routes = RouteTable::blog();

        let dashboard = routes.resolve("/dashboard").unwrap();
        assert_eq!(dashboard.route.name, "dashboard-posts");
        assert_eq!(dashboard.route.requirement, RouteRequirement::role("admin"));

        let edit = routes.resolve("/dashboard/categories/c7/edit").unwrap();
        assert_eq!(edit.route.name, "dashboard-categories-edit");
        assert_eq!(edit.params.get("id"), Some(&"c7".to_string()));
        assert!(edit.route.forbidden_message.is_some());

        let new_post = routes.resolve("/create-post").unwrap();
        assert_eq!(new_post.route.requirement, RouteRequirement::Authenticated);

        let login = routes.resolve("/auth/login?next=x").unwrap();
        assert!(login.route.auth_only);
        assert!(!login.route.requirement.requires_auth());

        let post = routes.resolve("/blog/hello-world").unwrap();
        assert_eq!(post.route.name, "post");

        assert!(routes.resolve("/nowhere").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let routes = RouteTable::new()
            .route("new", "/posts/new", RouteRequirement::Authenticated)
            .route("show", "/posts/:id", RouteRequirement::None);

        assert_eq!(routes.resolve("/posts/new").unwrap().route.name, "new");
        assert_eq!(routes.resolve("/posts/7").unwrap().route.name, "show");
        assert!(routes.find("show").is_some());
    }
}
