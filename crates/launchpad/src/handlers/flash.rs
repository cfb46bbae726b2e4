//! Flash message utilities for server-to-client communication.
//!
//! Flash messages are short-lived notifications stored in a cookie across a
//! redirect. The next rendered page shows the message and clears the cookie.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use launchpad_core::notify::Notification;

pub const FLASH_COOKIE: &str = "flash_message";

/// Build a Set-Cookie header value carrying `notification`.
///
/// Cookie properties:
/// - Path: / (accessible from any page)
/// - SameSite: Lax (sent on navigation, not cross-site requests)
/// - Max-Age: 60 (expires after 60 seconds as a safety net)
pub fn flash_set_cookie(notification: &Notification) -> String {
    let json = serde_json::to_string(notification).unwrap_or_default();
    format!(
        "{FLASH_COOKIE}={}; Path=/; SameSite=Lax; Max-Age=60",
        urlencoding::encode(&json)
    )
}

/// Set-Cookie header value that removes the flash cookie.
pub fn flash_clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; SameSite=Lax; Max-Age=0")
}

/// Read the pending flash message, if any. Malformed values are ignored.
pub fn read_flash(jar: &CookieJar) -> Option<Notification> {
    let raw = jar.get(FLASH_COOKIE)?.value().to_string();

    // The jar may already have percent-decoded the value.
    if let Ok(notification) = serde_json::from_str(&raw) {
        return Some(notification);
    }

    let json = urlencoding::decode(&raw).ok()?;
    serde_json::from_str(&json).ok()
}

/// Create a redirect response with a flash message cookie.
pub fn redirect_with_flash(url: &str, notification: &Notification) -> Response {
    ([(SET_COOKIE, flash_set_cookie(notification))], Redirect::to(url)).into_response()
}

/// Appends the removal header when a flash message was displayed.
pub fn clear_flash(headers: &mut HeaderMap) {
    if let Ok(value) = HeaderValue::from_str(&flash_clear_cookie()) {
        headers.append(SET_COOKIE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, StatusCode};

    #[test]
    fn set_cookie_header_has_expected_attributes() {
        let header = flash_set_cookie(&Notification::error("Test"));
        assert!(header.starts_with("flash_message="));
        assert!(header.contains("Path=/"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=60"));
    }

    #[test]
    fn flash_survives_cookie_round_trip() {
        let notification = Notification::success("Signed in successfully!");
        let header = flash_set_cookie(&notification);
        let pair = header.split(';').next().unwrap().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());
        let jar = CookieJar::from_headers(&headers);

        assert_eq!(read_flash(&jar), Some(notification));
    }

    #[test]
    fn malformed_flash_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("flash_message=not-json"));
        let jar = CookieJar::from_headers(&headers);

        assert_eq!(read_flash(&jar), None);
    }

    #[test]
    fn redirect_carries_flash_cookie() {
        let response = redirect_with_flash("/dashboard", &Notification::info("Hello"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("flash_message="));
    }

    #[test]
    fn clear_flash_expires_cookie() {
        let mut headers = HeaderMap::new();
        clear_flash(&mut headers);
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }
}
