//! Input predicates applied before any mutating request is issued.

use crate::app::{Result, SyncError};

pub const MIN_TITLE_CHARS: usize = 3;
pub const MIN_BODY_CHARS: usize = 10;
pub const MIN_COMMENT_CHARS: usize = 2;

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

pub fn is_valid_title(title: &str) -> bool {
    char_len(title) >= MIN_TITLE_CHARS
}

pub fn is_valid_body(body: &str) -> bool {
    char_len(body) >= MIN_BODY_CHARS
}

pub fn is_valid_comment(body: &str) -> bool {
    char_len(body) >= MIN_COMMENT_CHARS
}

/// Tokens are opaque, but they never contain whitespace.
pub fn is_plausible_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(char::is_whitespace)
}

pub fn check_discussion(title: &str, body: &str) -> Result<()> {
    if !is_valid_title(title) {
        return Err(SyncError::Validation(format!(
            "title must be at least {} characters",
            MIN_TITLE_CHARS
        )));
    }
    if !is_valid_body(body) {
        return Err(SyncError::Validation(format!(
            "body must be at least {} characters",
            MIN_BODY_CHARS
        )));
    }
    Ok(())
}

pub fn check_comment(body: &str) -> Result<()> {
    if !is_valid_comment(body) {
        return Err(SyncError::Validation(format!(
            "comment must be at least {} characters",
            MIN_COMMENT_CHARS
        )));
    }
    Ok(())
}
