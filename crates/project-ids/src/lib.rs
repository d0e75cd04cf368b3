//! Login and consent front end for the project identity provider
//!
//! Provides:
//! - Static identity resources, API resources, clients and test users
//! - Username/password login with antiforgery protection and cookie sessions
//! - Automatic consent for pending authorization requests
//! - Audit events for logins and consents
//!
//! The authorize/token protocol engine is not part of this crate. It is reached
//! through the [`interaction::InteractionService`] and
//! [`resources::ResourceStore`] traits.

pub mod account;
pub mod antiforgery;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod consent;
pub mod events;
pub mod html;
pub mod interaction;
pub mod resources;
pub mod security_headers;
pub mod session;
pub mod users;

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::FromRef, middleware, routing::get, Router};
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::events::EventSink;
use crate::interaction::InteractionService;
use crate::resources::ResourceStore;
use crate::session::SessionStore;
use crate::users::TestUserStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<TestUserStore>,
    pub interaction: Arc<dyn InteractionService>,
    pub resources: Arc<dyn ResourceStore>,
    pub events: Arc<dyn EventSink>,
    pub sessions: Arc<SessionStore>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: Config,
        users: TestUserStore,
        interaction: Arc<dyn InteractionService>,
        resources: Arc<dyn ResourceStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let cookie_key = config.cookie_key()?;
        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(users),
            interaction,
            resources,
            events,
            sessions: Arc::new(SessionStore::new()),
            cookie_key,
        })
    }

    /// Login page URL that resumes at `return_url` afterwards
    pub fn login_url(&self, return_url: &str) -> String {
        let login_path = &self.config.interaction.login_path;
        if return_url.is_empty() {
            return login_path.clone();
        }
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("returnUrl", return_url)
            .finish();
        format!("{}?{}", login_path, query)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let login_path = state.config.interaction.login_path.clone();
    let consent_path = state.config.interaction.consent_path.clone();

    Router::new()
        .route("/", get(account::home))
        .route(
            &login_path,
            get(account::get_login).post(account::post_login),
        )
        .route(&consent_path, get(consent::handler))
        .layer(middleware::from_fn(security_headers::layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
