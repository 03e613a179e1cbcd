//! Navigation guard
//!
//! Every transition goes through [`NavigationGuard::navigate`], which waits
//! (bounded) for the session to settle and then applies the route's
//! requirement:
//!
//! 1. Public route: allow, unless it is an auth-only page and someone is
//!    signed in, in which case redirect to the default route.
//! 2. Authenticated route without an identity: redirect to login.
//! 3. Role route without the role: notify and redirect to the default route.
//! 4. Otherwise allow.
//!
//! If the session does not settle in time the navigation is decided as if
//! nobody were signed in.

use super::notice::{ForbiddenNotice, LogNotifier, Notifier};
use super::{normalize_path, PathParams, RouteRequirement, RouteTable};
use crate::config::GuardConfig;
use crate::session::{has_role, NotReady, SessionContext, SessionState};
use std::sync::Arc;

/// Why a navigation was redirected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationDenied {
    #[error("authentication required")]
    Unauthenticated,

    #[error("missing required role '{role}'")]
    Forbidden { role: String },

    #[error("already signed in")]
    AlreadySignedIn,

    #[error("session not ready, treated as signed out")]
    ReadinessTimeout,
}

/// Result of a navigation attempt. There is no pending state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Allow {
        path: String,
        /// Matched route name; `None` for paths outside the table
        route: Option<String>,
        params: PathParams,
    },
    Redirect {
        from: String,
        to: String,
        reason: NavigationDenied,
    },
}

impl NavigationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationOutcome::Allow { .. })
    }

    /// Where the user ends up
    pub fn destination(&self) -> &str {
        match self {
            NavigationOutcome::Allow { path, .. } => path,
            NavigationOutcome::Redirect { to, .. } => to,
        }
    }

    pub fn reason(&self) -> Option<&NavigationDenied> {
        match self {
            NavigationOutcome::Allow { .. } => None,
            NavigationOutcome::Redirect { reason, .. } => Some(reason),
        }
    }
}

impl std::fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationOutcome::Allow { path, route: Some(route), .. } => {
                write!(f, "allow {} ({})", path, route)
            }
            NavigationOutcome::Allow { path, route: None, .. } => write!(f, "allow {}", path),
            NavigationOutcome::Redirect { from, to, reason } => {
                write!(f, "redirect {} -> {} ({})", from, to, reason)
            }
        }
    }
}

/// Guard consulted before every route transition
#[derive(Clone)]
pub struct NavigationGuard {
    routes: Arc<RouteTable>,
    session: SessionContext,
    config: GuardConfig,
    notifier: Arc<dyn Notifier>,
}

impl NavigationGuard {
    pub fn new(routes: RouteTable, session: SessionContext, config: GuardConfig) -> Self {
        Self { routes: Arc::new(routes), session, config, notifier: Arc::new(LogNotifier) }
    }

    /// Replace the notifier receiving forbidden notices
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Decide a navigation, waiting at most `guard.ready_timeout_ms` for the
    /// session to apply every identity change already emitted and load its roles
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        let timeout = self.config.ready_timeout();
        let session = match self.session.wait_ready(timeout).await {
            Ok(state) => Some(state),
            Err(NotReady::Timeout(waited)) => {
                log::warn!("Session not ready after {:?}, deciding {} as signed out", waited, path);
                None
            }
            Err(NotReady::Closed) => {
                let state = self.session.snapshot();
                if !state.roles_ready() {
                    log::warn!("Session pipeline stopped, deciding {} as signed out", path);
                }
                Some(state)
            }
        };

        let outcome = self.decide(path, session.as_ref());
        match &outcome {
            NavigationOutcome::Allow { path, .. } => log::debug!("Navigation allowed: {}", path),
            NavigationOutcome::Redirect { from, to, reason } => {
                if let NavigationDenied::Forbidden { role } = reason {
                    self.notifier.forbidden(&self.forbidden_notice(from, role));
                }
                log::info!("Navigation redirected: {} -> {} ({})", from, to, reason);
            }
        }
        outcome
    }

    /// Pure decision for a session snapshot
    ///
    /// `None`, or a snapshot that has not settled, means roles are unknown:
    /// only public routes are allowed.
    pub fn decide(&self, path: &str, session: Option<&SessionState>) -> NavigationOutcome {
        let normalized = normalize_path(path);
        let settled = session.filter(|s| s.roles_ready());

        let Some(resolved) = self.routes.resolve(&normalized) else {
            return NavigationOutcome::Allow { path: normalized, route: None, params: PathParams::new() };
        };
        let route = resolved.route;
        let allow = || NavigationOutcome::Allow {
            path: normalized.clone(),
            route: Some(route.name.clone()),
            params: resolved.params.clone(),
        };

        let Some(state) = settled else {
            if route.requirement.requires_auth() {
                return self.redirect(&normalized, self.login_target(path), NavigationDenied::ReadinessTimeout);
            }
            return allow();
        };

        match &route.requirement {
            RouteRequirement::None => {
                if route.auth_only && state.is_authenticated() {
                    self.redirect(&normalized, self.config.default_route.clone(), NavigationDenied::AlreadySignedIn)
                } else {
                    allow()
                }
            }
            _ if !state.is_authenticated() => {
                self.redirect(&normalized, self.login_target(path), NavigationDenied::Unauthenticated)
            }
            RouteRequirement::Role(role) if !has_role(state, role) => self.redirect(
                &normalized,
                self.config.default_route.clone(),
                NavigationDenied::Forbidden { role: role.clone() },
            ),
            _ => allow(),
        }
    }

    fn redirect(&self, from: &str, to: String, reason: NavigationDenied) -> NavigationOutcome {
        NavigationOutcome::Redirect { from: from.to_string(), to, reason }
    }

    fn login_target(&self, requested: &str) -> String {
        if self.config.preserve_destination {
            format!("{}?redirect={}", self.config.login_route, urlencoding::encode(requested))
        } else {
            self.config.login_route.clone()
        }
    }

    fn forbidden_notice(&self, path: &str, role: &str) -> ForbiddenNotice {
        let message = self
            .routes
            .resolve(path)
            .and_then(|resolved| resolved.route.forbidden_message.clone())
            .unwrap_or_else(|| format!("You need the '{}' role to open this page", role));
        ForbiddenNotice { path: path.to_string(), role: role.to_string(), message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::roles::RoleSet;
    use crate::router::RecordingNotifier;
    use crate::session::SessionWriter;
    use std::time::Duration;

    fn guard() -> (NavigationGuard, SessionWriter, RecordingNotifier) {
        let (writer, context) = SessionContext::channel();
        let notifier = RecordingNotifier::new();
        let guard = NavigationGuard::new(RouteTable::blog(), context, GuardConfig::default())
            .with_notifier(Arc::new(notifier.clone()));
        (guard, writer, notifier)
    }

    fn sign_in(writer: &SessionWriter, roles: &[&str]) {
        let generation = writer.begin_loading(Identity::new("u1", "ada@example.com"));
        assert!(writer.complete(generation, RoleSet::from_iter(roles.iter().copied())));
    }

    #[tokio::test]
    async fn test_anonymous_dashboard_goes_to_login() {
        let (guard, writer, notifier) = guard();
        writer.sign_out();

        let outcome = guard.navigate("/dashboard").await;
        assert_eq!(
            outcome,
            NavigationOutcome::Redirect {
                from: "/dashboard".into(),
                to: "/auth/login".into(),
                reason: NavigationDenied::Unauthenticated,
            }
        );
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_user_without_admin_is_forbidden() {
        let (guard, writer, notifier) = guard();
        sign_in(&writer, &["user"]);

        let outcome = guard.navigate("/dashboard/users").await;
        assert_eq!(outcome.destination(), "/");
        assert_eq!(outcome.reason(), Some(&NavigationDenied::Forbidden { role: "admin".into() }));

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].path, "/dashboard/users");
        assert_eq!(notices[0].message, "Only administrators can access the dashboard");
    }

    #[tokio::test]
    async fn test_admin_allowed_with_params() {
        let (guard, writer, _) = guard();
        sign_in(&writer, &["user", "admin"]);

        match guard.navigate("/dashboard/posts/p9/edit/").await {
            NavigationOutcome::Allow { path, route, params } => {
                assert_eq!(path, "/dashboard/posts/p9/edit");
                assert_eq!(route.as_deref(), Some("dashboard-posts-edit"));
                assert_eq!(params.get("id").map(String::as_str), Some("p9"));
            }
            other => panic!("expected allow, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_signed_in_user_leaves_auth_pages() {
        let (guard, writer, _) = guard();
        sign_in(&writer, &["user"]);

        for path in ["/auth/login", "/auth/register"] {
            let outcome = guard.navigate(path).await;
            assert_eq!(outcome.destination(), "/");
            assert_eq!(outcome.reason(), Some(&NavigationDenied::AlreadySignedIn));
        }
        assert!(guard.navigate("/create-post").await.is_allowed());
    }

    #[tokio::test]
    async fn test_public_and_unknown_routes_allowed() {
        let (guard, writer, _) = guard();
        writer.sign_out();

        assert!(guard.navigate("/").await.is_allowed());
        assert!(guard.navigate("/auth/login").await.is_allowed());
        assert_eq!(
            guard.navigate("/somewhere/else?x=1").await,
            NavigationOutcome::Allow {
                path: "/somewhere/else".into(),
                route: None,
                params: PathParams::new(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_decides_as_signed_out() {
        let (guard, writer, _) = guard();
        writer.begin_loading(Identity::new("u1", "ada@example.com"));

        let outcome = guard.navigate("/create-post").await;
        assert_eq!(outcome.destination(), "/auth/login");
        assert_eq!(outcome.reason(), Some(&NavigationDenied::ReadinessTimeout));

        // Public pages stay reachable while roles are unknown
        assert!(guard.navigate("/about").await.is_allowed());
        assert!(guard.navigate("/auth/login").await.is_allowed());
    }

    #[tokio::test]
    async fn test_navigation_waits_for_roles() {
        let (guard, writer, _) = guard();
        let generation = writer.begin_loading(Identity::new("u1", "ada@example.com"));

        let pending = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.navigate("/dashboard").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        writer.complete(generation, RoleSet::from_iter(["user", "admin"]));
        assert!(pending.await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn test_decision_is_idempotent() {
        let (guard, writer, _) = guard();
        sign_in(&writer, &["user"]);

        for path in ["/dashboard", "/auth/login", "/blog/1", "/create-post"] {
            let first = guard.navigate(path).await;
            let second = guard.navigate(path).await;
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_decide_ignores_unsettled_snapshot() {
        let (writer, context) = SessionContext::channel();
        let guard = NavigationGuard::new(RouteTable::blog(), context.clone(), GuardConfig::default());
        writer.begin_loading(Identity::new("u1", "ada@example.com"));

        let snapshot = context.snapshot();
        let outcome = guard.decide("/dashboard", Some(&snapshot));
        assert_eq!(outcome.reason(), Some(&NavigationDenied::ReadinessTimeout));
    }

    #[tokio::test]
    async fn test_preserve_destination() {
        let (writer, context) = SessionContext::channel();
        let config = GuardConfig::default().with_preserve_destination(true);
        let guard = NavigationGuard::new(RouteTable::blog(), context, config);
        writer.sign_out();

        let outcome = guard.navigate("/dashboard/posts/p1/edit").await;
        assert_eq!(outcome.destination(), "/auth/login?redirect=%2Fdashboard%2Fposts%2Fp1%2Fedit");
    }
}
