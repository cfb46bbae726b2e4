//! Route access policy applied by the session gate.
//!
//! Classification is static and recomputed for every request.

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Query parameter carrying the originally requested path to the login page.
pub const REDIRECT_TO_PARAM: &str = "redirectTo";

/// Paths reachable without a session.
///
/// `/` matches only itself; every other entry also covers its sub-paths.
pub const PUBLIC_ROUTES: [&str; 4] = [HOME_PATH, LOGIN_PATH, SIGNUP_PATH, RESET_PASSWORD_PATH];

const STATIC_PREFIXES: [&str; 1] = ["/static/"];
const STATIC_FILES: [&str; 1] = ["/favicon.ico"];
const IMAGE_EXTENSIONS: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Outcome of the gate for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through to its handler.
    Continue,
    /// Anonymous request to a protected path.
    RedirectToLogin { redirect_to: String },
    /// Signed-in user landing on an entry page.
    RedirectToDashboard,
}

impl GateDecision {
    /// The `Location` for redirect decisions.
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Continue => None,
            Self::RedirectToLogin { redirect_to } => Some(login_redirect_location(redirect_to)),
            Self::RedirectToDashboard => Some(DASHBOARD_PATH.to_string()),
        }
    }
}

fn matches_route(path: &str, route: &str) -> bool {
    if route == HOME_PATH {
        return path == HOME_PATH;
    }

    match path.strip_prefix(route) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_ROUTES.iter().any(|route| matches_route(path, route)) {
        RouteClass::Public
    } else {
        RouteClass::Protected
    }
}

pub fn is_public_path(path: &str) -> bool {
    classify(path) == RouteClass::Public
}

/// Login and signup pages, which signed-in users are steered away from.
pub fn is_entry_page(path: &str) -> bool {
    path == LOGIN_PATH || path == SIGNUP_PATH
}

/// Paths the gate never sees: bundled assets, favicon and images.
pub fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }
    if STATIC_FILES.contains(&path) {
        return true;
    }

    let lower = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// `/login?redirectTo=<path>` with the path percent-encoded.
pub fn login_redirect_location(original_path: &str) -> String {
    format!(
        "{LOGIN_PATH}?{REDIRECT_TO_PARAM}={}",
        urlencoding::encode(original_path)
    )
}

/// Applies the access table to a request path.
pub fn decide(path: &str, authenticated: bool) -> GateDecision {
    if !authenticated && !is_public_path(path) {
        return GateDecision::RedirectToLogin {
            redirect_to: path.to_string(),
        };
    }

    if authenticated && is_entry_page(path) {
        return GateDecision::RedirectToDashboard;
    }

    GateDecision::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTECTED: [&str; 6] = [
        "/dashboard",
        "/dashboard/settings",
        "/profile",
        "/settings",
        "/loginx",
        "/signup-later",
    ];

    #[test]
    fn anonymous_public_paths_are_never_redirected() {
        for path in [
            "/",
            "/login",
            "/signup",
            "/reset-password",
            "/reset-password/confirm",
            "/login/",
        ] {
            assert_eq!(decide(path, false), GateDecision::Continue, "{path}");
        }
    }

    #[test]
    fn anonymous_protected_paths_redirect_with_original_path() {
        for path in PROTECTED {
            assert_eq!(
                decide(path, false),
                GateDecision::RedirectToLogin {
                    redirect_to: path.to_string()
                },
                "{path}"
            );
        }
    }

    #[test]
    fn root_is_not_a_prefix_for_everything() {
        assert!(is_public_path("/"));
        assert!(!is_public_path("/dashboard"));
    }

    #[test]
    fn authenticated_entry_pages_redirect_to_dashboard() {
        assert_eq!(decide("/login", true), GateDecision::RedirectToDashboard);
        assert_eq!(decide("/signup", true), GateDecision::RedirectToDashboard);
    }

    #[test]
    fn authenticated_other_paths_pass_through() {
        for path in ["/", "/dashboard", "/reset-password", "/profile", "/login/help"] {
            assert_eq!(decide(path, true), GateDecision::Continue, "{path}");
        }
    }

    #[test]
    fn dashboard_redirect_location_is_encoded() {
        let decision = decide("/dashboard", false);
        assert_eq!(
            decision.location().as_deref(),
            Some("/login?redirectTo=%2Fdashboard")
        );
    }

    #[test]
    fn nested_redirect_location_is_encoded() {
        assert_eq!(
            login_redirect_location("/dashboard/a b"),
            "/login?redirectTo=%2Fdashboard%2Fa%20b"
        );
    }

    #[test]
    fn decision_is_stable_across_calls() {
        let first = decide("/dashboard", false);
        let second = decide("/dashboard", false);
        assert_eq!(first, second);
    }

    #[test]
    fn continue_has_no_location() {
        assert_eq!(GateDecision::Continue.location(), None);
        assert_eq!(
            GateDecision::RedirectToDashboard.location().as_deref(),
            Some("/dashboard")
        );
    }

    #[test]
    fn static_assets_are_recognised() {
        assert!(is_static_asset("/static/app.css"));
        assert!(is_static_asset("/favicon.ico"));
        assert!(is_static_asset("/images/logo.SVG"));
        assert!(is_static_asset("/hero.webp"));
        assert!(!is_static_asset("/dashboard"));
        assert!(!is_static_asset("/staticky"));
    }
}
