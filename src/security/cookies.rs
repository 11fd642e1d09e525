// ABOUTME: Session cookie parsing and Set-Cookie header builders
// ABOUTME: The auth cookie is HttpOnly and SameSite=Lax; Secure is added in production
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::{header, HeaderMap, HeaderValue};

use crate::errors::{AppError, AppResult};

/// Read a cookie value from the request `Cookie` headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// Build a `Set-Cookie` value that stores the session token
///
/// # Errors
///
/// Returns an error if the token contains bytes not allowed in a header
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> AppResult<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}{secure}"
    ))
    .map_err(|e| AppError::internal(format!("Invalid cookie value: {e}")))
}

/// Build a `Set-Cookie` value that removes the session cookie
///
/// # Errors
///
/// Returns an error if the name contains bytes not allowed in a header
pub fn clear_cookie(name: &str) -> AppResult<HeaderValue> {
    session_cookie(name, "", 0, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_lookup_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(get_cookie_value(&headers, "auth_token").as_deref(), Some("abc.def.ghi"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token="));
        assert_eq!(get_cookie_value(&headers, "auth_token"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie("auth_token", "tok", 3600, false).unwrap();
        let text = value.to_str().unwrap();
        assert!(text.starts_with("auth_token=tok;"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Max-Age=3600"));
        assert!(!text.contains("Secure"));

        let secure = session_cookie("auth_token", "tok", 60, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let value = clear_cookie("auth_token").unwrap();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
