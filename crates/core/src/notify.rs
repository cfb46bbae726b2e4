//! User-visible notifications ("toasts").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A short message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// Whether the message should auto-dismiss after a few seconds
    pub auto_dismiss: bool,
}

impl Notification {
    /// Error messages stay until dismissed.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
            auto_dismiss: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
            auto_dismiss: true,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
            auto_dismiss: true,
        }
    }

    pub fn with_auto_dismiss(mut self, auto_dismiss: bool) -> Self {
        self.auto_dismiss = auto_dismiss;
        self
    }
}

/// Sink for notifications, implemented by whatever presents them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_requires_manual_dismissal() {
        let n = Notification::error("Access denied");
        assert_eq!(n.kind, NotificationKind::Error);
        assert!(!n.auto_dismiss);
    }

    #[test]
    fn info_and_success_auto_dismiss() {
        assert!(Notification::info("Check your inbox").auto_dismiss);
        assert!(Notification::success("Saved").auto_dismiss);
        assert!(!Notification::success("Saved").with_auto_dismiss(false).auto_dismiss);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&Notification::error("Test")).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"autoDismiss\":false"));
    }
}
