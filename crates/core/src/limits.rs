// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input limits and validation shared by command handlers

use crate::error::DomainError;

/// Maximum length of an abort status message
pub const MAX_STATUS_MESSAGE_LEN: usize = 1024;

/// Maximum length of a stored repo error message
pub const MAX_ERROR_MESSAGE_LEN: usize = 4096;

/// Maximum length of registry, domain and host names
pub const MAX_NAME_LEN: usize = 128;

/// Maximum length of paths and URLs
pub const MAX_PATH_LEN: usize = 4096;

/// Names are non-empty ASCII words: letters, digits, `.`, `_`, `-`
pub fn check_name(what: &str, name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", what)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!("{} is too long", what)));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(DomainError::validation(format!(
            "{} `{}` contains invalid characters",
            what, name
        )));
    }
    Ok(())
}

/// Absolute, normalized slash paths: `/a/b`, no `//`, no `.`/`..`, no trailing `/`
pub fn check_abs_path(what: &str, path: &str) -> Result<(), DomainError> {
    if !path.starts_with('/') {
        return Err(DomainError::validation(format!(
            "{} `{}` must be absolute",
            what, path
        )));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(DomainError::validation(format!("{} is too long", what)));
    }
    if path == "/" {
        return Ok(());
    }
    let normalized = path[1..]
        .split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if !normalized {
        return Err(DomainError::validation(format!(
            "{} `{}` is not normalized",
            what, path
        )));
    }
    Ok(())
}

/// Non-empty, bounded free text
pub fn check_text(what: &str, text: &str, max_len: usize) -> Result<(), DomainError> {
    if text.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", what)));
    }
    if text.len() > max_len {
        return Err(DomainError::validation(format!(
            "{} exceeds {} bytes",
            what, max_len
        )));
    }
    Ok(())
}
