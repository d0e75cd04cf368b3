//! Authentication sessions
//!
//! Sessions live server-side, keyed by the hash of a random token. The browser
//! only holds the token, inside a signed cookie.

use std::collections::HashMap;
use std::sync::RwLock;

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SESSION_COOKIE_NAME: &str = "idsrv";

/// Session cookie and lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a session that was not "remembered" (default: 10 hours)
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,

    /// Lifetime of a "remember my login" session (default: 30 days)
    #[serde(default = "default_remember_login_days")]
    pub remember_login_days: u32,

    /// Cookie signing secret (64+ bytes, hex-encoded)
    /// If not set, a random key is generated at startup (sessions won't survive restarts)
    #[serde(default)]
    pub cookie_secret: Option<String>,

    /// Mark cookies `Secure`; only disable for plain-http development setups
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_lifetime_secs: default_session_lifetime(),
            remember_login_days: default_remember_login_days(),
            cookie_secret: None,
            secure_cookies: true,
        }
    }
}

impl SessionConfig {
    /// Session lifetime for a login, falling back to the defaults when the
    /// configured value does not fit a `chrono::Duration`
    pub fn lifetime(&self, remember_login: bool) -> Duration {
        let configured = if remember_login {
            Duration::try_days(i64::from(self.remember_login_days))
        } else {
            i64::try_from(self.session_lifetime_secs)
                .ok()
                .and_then(Duration::try_seconds)
        };
        configured.unwrap_or_else(|| {
            tracing::warn!("Configured session lifetime is out of range, using the default");
            if remember_login {
                Duration::days(i64::from(default_remember_login_days()))
            } else {
                Duration::seconds(default_session_lifetime() as i64)
            }
        })
    }
}

fn default_session_lifetime() -> u64 {
    10 * 3600 // 10 hours
}

fn default_remember_login_days() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// A signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: String,
    pub display_name: String,
    /// Survives browser restarts
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// In-memory session store
#[derive(Default)]
pub struct SessionStore {
    /// Maps token hash -> session
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session, returning the raw token for the cookie alongside it
    pub fn create_session(
        &self,
        subject_id: &str,
        display_name: &str,
        lifetime: Duration,
        persistent: bool,
    ) -> (String, Session) {
        let token = generate_random_string(32);
        let now = Utc::now();
        let session = Session {
            subject_id: subject_id.to_string(),
            display_name: display_name.to_string(),
            persistent,
            created_at: now,
            expires_at: now.checked_add_signed(lifetime).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut store = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        store.insert(hash_token(&token), session.clone());
        (token, session)
    }

    /// Look up a live session by its raw token
    pub fn validate_session(&self, token: &str) -> Option<Session> {
        let store = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        store
            .get(&hash_token(token))
            .filter(|s| s.expires_at > Utc::now())
            .cloned()
    }

    /// Drop expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut store = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = store.len();
        store.retain(|_, s| s.expires_at > now);
        let removed = before - store.len();
        if removed > 0 {
            tracing::info!("Cleaned up {} expired sessions", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the session cookie; persistent sessions get a max-age, others die with the browser
pub fn session_cookie(token: String, session: &Session, secure: bool) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax); // Allow on top-level OAuth redirects

    if session.persistent {
        let remaining = (session.expires_at - Utc::now()).num_seconds().max(0);
        builder = builder.max_age(time::Duration::seconds(remaining));
    }

    builder.build()
}

/// Resolve the current session from the signed cookie jar
pub fn current_session(jar: &SignedCookieJar, store: &SessionStore) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE_NAME)?;
    store.validate_session(cookie.value())
}

/// Random alphanumeric token of `len` characters
pub fn generate_random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// URL-safe SHA-256 digest of a token; only digests are kept in memory
pub fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
