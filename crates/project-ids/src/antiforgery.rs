//! Request verification tokens for HTML forms
//!
//! A random token is kept in a signed cookie and echoed in a hidden form
//! field. A POST is accepted only when both are present and equal.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

use crate::session::generate_random_string;

pub const ANTIFORGERY_COOKIE_NAME: &str = "idsrv.antiforgery";
pub const ANTIFORGERY_FORM_FIELD: &str = "__RequestVerificationToken";

/// Reuse the token already held by the browser, or mint a new one
pub fn issue_token(jar: SignedCookieJar, secure: bool) -> (SignedCookieJar, String) {
    if let Some(existing) = jar.get(ANTIFORGERY_COOKIE_NAME) {
        let token = existing.value().to_string();
        return (jar, token);
    }

    let token = generate_random_string(32);
    let cookie = Cookie::build((ANTIFORGERY_COOKIE_NAME, token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();
    (jar.add(cookie), token)
}

/// Check the submitted form token against the cookie
pub fn verify_token(jar: &SignedCookieJar, form_token: Option<&str>) -> bool {
    let (Some(cookie), Some(submitted)) = (jar.get(ANTIFORGERY_COOKIE_NAME), form_token) else {
        return false;
    };
    !submitted.is_empty() && constant_time_eq(cookie.value().as_bytes(), submitted.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
