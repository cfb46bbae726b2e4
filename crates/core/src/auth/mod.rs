mod error;
mod functions;
mod listeners;
mod routes;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
pub use functions::{display_name, email_to_name, initials, is_session_expired};
pub use listeners::{ListenerRegistry, Subscription};
pub use routes::{
    classify, decide, is_entry_page, is_public_path, is_static_asset, login_redirect_location,
    GateDecision, RouteClass, DASHBOARD_PATH, HOME_PATH, LOGIN_PATH, PUBLIC_ROUTES,
    REDIRECT_TO_PARAM, RESET_PASSWORD_PATH, SIGNUP_PATH,
};
pub use traits::{
    AuthService, IdentityProvider, Navigator, Result, SessionListener, SessionRefresher,
};
pub use types::{
    AuthChangeEvent, CookieMutation, CookieOptions, RefreshedSession, RequestCookies, SameSite,
    Session, SessionChange, SignUpOutcome, User, UserMetadata,
};
pub use validation::{
    is_valid_email, validate_login, validate_reset, validate_return_to, validate_signup,
    FieldErrors,
};
