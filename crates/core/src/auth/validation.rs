use std::collections::BTreeMap;

pub const LOGIN_PASSWORD_MIN_LEN: usize = 6;
pub const SIGNUP_PASSWORD_MIN_LEN: usize = 8;
pub const FULL_NAME_MIN_LEN: usize = 2;

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Invalid email address");
    }
}

/// Login form: email plus a password of at least six characters.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email.trim());

    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < LOGIN_PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Password must be at least {LOGIN_PASSWORD_MIN_LEN} characters"),
        );
    }

    errors.into_result()
}

/// Signup form.
///
/// The password needs eight characters including a lowercase letter, an
/// uppercase letter and a digit, and must match its confirmation. A full name
/// is optional but, when given, at least two characters.
pub fn validate_signup(
    email: &str,
    password: &str,
    confirm_password: &str,
    full_name: Option<&str>,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email.trim());

    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < SIGNUP_PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Password must be at least {SIGNUP_PASSWORD_MIN_LEN} characters"),
        );
    } else if !(password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit()))
    {
        errors.add(
            "password",
            "Password must contain an uppercase letter, a lowercase letter and a digit",
        );
    }

    if confirm_password.is_empty() {
        errors.add("confirm_password", "Please confirm your password");
    } else if confirm_password != password {
        errors.add("confirm_password", "Passwords do not match");
    }

    if let Some(name) = full_name.map(str::trim).filter(|name| !name.is_empty()) {
        if name.chars().count() < FULL_NAME_MIN_LEN {
            errors.add(
                "full_name",
                format!("Name must be at least {FULL_NAME_MIN_LEN} characters"),
            );
        }
    }

    errors.into_result()
}

/// Password reset form: a valid email.
pub fn validate_reset(email: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email.trim());
    errors.into_result()
}

/// Validates return_to URL to prevent open redirects.
///
/// Returns `Some(url)` if the URL is a valid relative path, `None` otherwise.
///
/// # Examples
///
/// ```
/// use launchpad_core::auth::validate_return_to;
///
/// assert_eq!(validate_return_to("/dashboard"), Some("/dashboard"));
/// assert_eq!(validate_return_to("//evil.com"), None);
/// assert_eq!(validate_return_to("https://evil.com"), None);
/// ```
pub fn validate_return_to(url: &str) -> Option<&str> {
    if !url.starts_with('/') || url.starts_with("//") {
        return None;
    }

    // Backslashes are normalised to slashes by some browsers
    if url.contains('\\') {
        return None;
    }

    if url.chars().any(|c| c.is_control()) {
        return None;
    }

    if url.contains("://") {
        return None;
    }

    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== email ====================

    #[test]
    fn accepts_plain_email() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_email() {
        for email in [
            "",
            "ada",
            "ada@",
            "@example.com",
            "ada@example",
            "a b@c.d",
            "a@b@c.d",
            "a@b..c",
        ] {
            assert!(!is_valid_email(email), "{email}");
        }
    }

    // ==================== login ====================

    #[test]
    fn login_accepts_valid_input() {
        assert_eq!(validate_login("ada@example.com", "secret"), Ok(()));
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = validate_login("", "").unwrap_err();
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn login_rejects_short_password() {
        let errors = validate_login("ada@example.com", "12345").unwrap_err();
        assert!(errors.get("email").is_none());
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
    }

    // ==================== signup ====================

    #[test]
    fn signup_accepts_strong_password() {
        assert_eq!(
            validate_signup("ada@example.com", "Abcdefg1", "Abcdefg1", Some("Ada")),
            Ok(())
        );
    }

    #[test]
    fn signup_requires_character_classes() {
        let errors = validate_signup("ada@example.com", "abcdefgh", "abcdefgh", None).unwrap_err();
        assert!(errors.get("password").unwrap().contains("uppercase"));
    }

    #[test]
    fn signup_rejects_mismatched_confirmation() {
        let errors = validate_signup("ada@example.com", "Abcdefg1", "Abcdefg2", None).unwrap_err();
        assert_eq!(errors.get("confirm_password"), Some("Passwords do not match"));
        assert!(errors.get("password").is_none());
    }

    #[test]
    fn signup_full_name_is_optional_but_checked() {
        assert_eq!(
            validate_signup("ada@example.com", "Abcdefg1", "Abcdefg1", Some("")),
            Ok(())
        );
        let errors =
            validate_signup("ada@example.com", "Abcdefg1", "Abcdefg1", Some("A")).unwrap_err();
        assert!(errors.get("full_name").is_some());
    }

    // ==================== reset ====================

    #[test]
    fn reset_validates_email() {
        assert_eq!(validate_reset("ada@example.com"), Ok(()));
        assert!(validate_reset("nope").is_err());
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        assert_eq!(errors.get("email"), Some("first"));
        assert_eq!(errors.iter().count(), 1);
    }

    // ==================== validate_return_to ====================

    #[test]
    fn return_to_accepts_relative_paths() {
        assert_eq!(validate_return_to("/"), Some("/"));
        assert_eq!(
            validate_return_to("/dashboard?tab=profile#top"),
            Some("/dashboard?tab=profile#top")
        );
    }

    #[test]
    fn return_to_rejects_absolute_and_protocol_relative() {
        assert_eq!(validate_return_to("https://evil.com"), None);
        assert_eq!(validate_return_to("//evil.com"), None);
        assert_eq!(validate_return_to("/\\evil.com"), None);
        assert_eq!(validate_return_to("javascript:alert(1)"), None);
        assert_eq!(validate_return_to(""), None);
    }

    #[test]
    fn return_to_rejects_control_characters() {
        assert_eq!(validate_return_to("/path\n/evil"), None);
        assert_eq!(validate_return_to("/path\0"), None);
    }
}
