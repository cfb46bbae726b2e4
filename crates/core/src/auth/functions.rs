use chrono::{DateTime, Duration, Utc};

use super::{Session, User};

/// Check whether a session's access token is expired, or will be within `margin`.
pub fn is_session_expired(session: &Session, now: DateTime<Utc>, margin: Duration) -> bool {
    session.expires_at <= now + margin
}

/// Extract username from email if no name provided.
pub fn email_to_name(email: &str) -> String {
    match email.split('@').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "User".to_string(),
    }
}

/// Name shown in the shell: metadata full name, then username, then the
/// local part of the email.
pub fn display_name(user: &User) -> String {
    let from_metadata = ["full_name", "username"]
        .iter()
        .filter_map(|key| user.metadata_str(key))
        .map(str::trim)
        .find(|name| !name.is_empty());

    match from_metadata {
        Some(name) => name.to_string(),
        None => user
            .email
            .as_deref()
            .map(email_to_name)
            .unwrap_or_else(|| "User".to_string()),
    }
}

/// Two-letter avatar fallback derived from the email address.
///
/// `jane.doe@…` gives `JD`; otherwise the first two characters, uppercased.
pub fn initials(email: &str) -> String {
    if email.is_empty() {
        return "??".to_string();
    }

    let local = email.split('@').next().unwrap_or_default();
    let mut parts = local.split('.');
    if let (Some(first), Some(second)) = (parts.next(), parts.next()) {
        if let (Some(a), Some(b)) = (first.chars().next(), second.chars().next()) {
            return format!("{a}{b}").to_uppercase();
        }
    }

    email.chars().take(2).collect::<String>().to_uppercase()
}
