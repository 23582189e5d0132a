use crate::app::{ErrorKind, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where the presenter sends notices and login prompts.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Ask the user to sign in.
    fn prompt_login(&self);
}

pub fn notice_for(err: &SyncError) -> Notice {
    match (err.kind(), err) {
        (ErrorKind::Validation, SyncError::Validation(message)) => Notice::warning(message.clone()),
        (ErrorKind::Authentication, _) => {
            Notice::error("Please sign in with a GitHub token to continue.")
        }
        (ErrorKind::Network, _) if err.is_timeout() => {
            Notice::error("The request timed out. Check your connection and try again.")
        }
        (ErrorKind::Network, _) => Notice::error("Network problem. Check your connection and try again."),
        (ErrorKind::NotFound, _) => Notice::error("That discussion could not be found."),
        (ErrorKind::RateLimit, SyncError::RateLimit { reset_at }) => Notice::warning(format!(
            "GitHub rate limit reached. Try again after {}.",
            reset_at.format("%H:%M UTC")
        )),
        _ => Notice::error(format!("Something went wrong: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn validation_message_is_passed_through() {
        let notice = notice_for(&SyncError::Validation("Title is too short".into()));
        assert_eq!(notice, Notice::warning("Title is too short"));
    }

    #[test]
    fn rate_limit_mentions_reset_time() {
        let reset_at = Utc.with_ymd_and_hms(2026, 5, 1, 14, 30, 0).unwrap();
        let notice = notice_for(&SyncError::RateLimit { reset_at });
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("14:30"));
    }

    #[test]
    fn timeouts_are_called_out() {
        let notice = notice_for(&SyncError::timeout());
        assert!(notice.message.contains("timed out"));
    }

    #[test]
    fn forbidden_falls_into_generic_error() {
        let notice = notice_for(&SyncError::Forbidden("no access".into()));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Something went wrong"));
    }
}
