//! Pending authorization requests and consent hand-off
//!
//! The protocol engine redirects the browser to login/consent with a return URL
//! pointing back at its authorize callback. [`InteractionService`] turns that
//! URL back into the pending [`AuthorizationRequest`] and receives the user's
//! consent decision for it.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::clients::{Client, GrantType};
use crate::session::hash_token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("Return URL is not a local URL")]
    NotLocal,

    #[error("Return URL does not target the authorize callback: {0}")]
    NotAuthorizeCallback(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Client is disabled: {0}")]
    ClientDisabled(String),

    #[error("Redirect URI not registered for client: {0}")]
    RedirectUriNotAllowed(String),

    #[error("Unsupported response_type: {0}")]
    UnsupportedResponseType(String),

    #[error("Grant type {0:?} not allowed for client")]
    GrantTypeNotAllowed(GrantType),

    #[error("Scope not allowed for client: {0}")]
    ScopeNotAllowed(String),

    #[error("openid scope is required for response_type {0}")]
    OpenIdRequired(String),

    #[error("Consent requires a signed-in subject")]
    MissingSubject,

    #[error("Consent store error: {0}")]
    Store(String),
}

/// A pending authorize request, recovered from its return URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub scopes_requested: Vec<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub prompt: Option<String>,
    pub ui_locales: Option<String>,
    pub acr_values: Option<String>,
    /// Every query parameter of the original request
    pub parameters: BTreeMap<String, String>,
}

impl AuthorizationRequest {
    /// Stable key identifying this request's parameters
    pub fn key(&self) -> String {
        let canonical: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.parameters.iter())
            .finish();
        hash_token(&canonical)
    }
}

/// The user's decision on a consent request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentResponse {
    pub remember_consent: bool,
    pub scopes_consented: Vec<String>,
}

/// A consent that outlives the request it was given for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentGrant {
    pub subject_id: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait InteractionService: Send + Sync {
    /// Resolve the pending authorization request behind a return URL
    async fn get_authorization_context(&self, return_url: &str) -> Option<AuthorizationRequest>;

    /// Record the consent decision for a pending request
    async fn grant_consent(
        &self,
        subject_id: &str,
        request: &AuthorizationRequest,
        response: ConsentResponse,
    ) -> Result<(), InteractionError>;
}

/// Interaction service validating return URLs against the configured clients
pub struct DefaultInteractionService {
    clients: Vec<Client>,
    authorize_callback_path: String,
    /// Consent responses waiting for the authorize callback, by request key
    responses: RwLock<HashMap<String, ConsentResponse>>,
    /// Remembered consents by (subject, client)
    grants: RwLock<HashMap<(String, String), ConsentGrant>>,
}

impl DefaultInteractionService {
    pub fn new(clients: Vec<Client>, authorize_callback_path: impl Into<String>) -> Self {
        Self {
            clients,
            authorize_callback_path: authorize_callback_path.into(),
            responses: RwLock::new(HashMap::new()),
            grants: RwLock::new(HashMap::new()),
        }
    }

    /// Parse and validate a return URL into its authorization request
    pub fn parse_return_url(&self, return_url: &str) -> Result<AuthorizationRequest, InteractionError> {
        if !is_local_url(return_url) {
            return Err(InteractionError::NotLocal);
        }

        let base = Url::parse("http://localhost/").map_err(|e| InteractionError::Store(e.to_string()))?;
        let url = base.join(return_url).map_err(|_| InteractionError::NotLocal)?;
        if url.host_str() != base.host_str() {
            return Err(InteractionError::NotLocal);
        }

        if url.path() != self.authorize_callback_path {
            return Err(InteractionError::NotAuthorizeCallback(url.path().to_string()));
        }

        let mut parameters = BTreeMap::new();
        for (k, v) in url.query_pairs() {
            parameters.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }

        let required = |name: &'static str| -> Result<String, InteractionError> {
            parameters
                .get(name)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or(InteractionError::MissingParameter(name))
        };

        let client_id = required("client_id")?;
        let redirect_uri = required("redirect_uri")?;
        let response_type = required("response_type")?;
        let scopes_requested: Vec<String> = required("scope")?
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let client = self
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .ok_or_else(|| InteractionError::UnknownClient(client_id.clone()))?;

        if !client.enabled {
            return Err(InteractionError::ClientDisabled(client_id));
        }

        if !client.allows_redirect_uri(&redirect_uri) {
            return Err(InteractionError::RedirectUriNotAllowed(redirect_uri));
        }

        let grant_type = GrantType::for_response_type(&response_type)
            .ok_or_else(|| InteractionError::UnsupportedResponseType(response_type.clone()))?;
        if !client.allows_grant_type(grant_type) {
            return Err(InteractionError::GrantTypeNotAllowed(grant_type));
        }

        if let Some(scope) = scopes_requested.iter().find(|s| !client.allows_scope(s)) {
            return Err(InteractionError::ScopeNotAllowed(scope.clone()));
        }

        let wants_id_token = response_type.split_whitespace().any(|t| t == "id_token");
        if wants_id_token && !scopes_requested.iter().any(|s| s == "openid") {
            return Err(InteractionError::OpenIdRequired(response_type));
        }

        let optional = |name: &str| parameters.get(name).cloned();

        Ok(AuthorizationRequest {
            state: optional("state"),
            nonce: optional("nonce"),
            prompt: optional("prompt"),
            ui_locales: optional("ui_locales"),
            acr_values: optional("acr_values"),
            client_id,
            redirect_uri,
            response_type,
            scopes_requested,
            parameters,
        })
    }

    /// Hand the consent response for a pending request to the authorize callback
    ///
    /// A response is consumed by the first call; the callback runs once per request.
    pub fn take_consent_response(&self, request: &AuthorizationRequest) -> Option<ConsentResponse> {
        let mut responses = self.responses.write().unwrap_or_else(|e| e.into_inner());
        responses.remove(&request.key())
    }

    /// Number of consent responses still waiting for their callback
    pub fn pending_responses(&self) -> usize {
        self.responses.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Scopes a subject has permanently granted to a client
    pub fn remembered_scopes(&self, subject_id: &str, client_id: &str) -> Option<Vec<String>> {
        let grants = self.grants.read().ok()?;
        grants
            .get(&(subject_id.to_string(), client_id.to_string()))
            .map(|g| g.scopes.clone())
    }
}

#[async_trait]
impl InteractionService for DefaultInteractionService {
    async fn get_authorization_context(&self, return_url: &str) -> Option<AuthorizationRequest> {
        match self.parse_return_url(return_url) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!("No authorization context for return URL {:?}: {}", return_url, e);
                None
            }
        }
    }

    async fn grant_consent(
        &self,
        subject_id: &str,
        request: &AuthorizationRequest,
        response: ConsentResponse,
    ) -> Result<(), InteractionError> {
        if subject_id.is_empty() {
            return Err(InteractionError::MissingSubject);
        }

        if response.remember_consent {
            let grant = ConsentGrant {
                subject_id: subject_id.to_string(),
                client_id: request.client_id.clone(),
                scopes: response.scopes_consented.clone(),
                created_at: Utc::now(),
            };
            self.grants
                .write()
                .map_err(|e| InteractionError::Store(e.to_string()))?
                .insert((grant.subject_id.clone(), grant.client_id.clone()), grant);
        }

        self.responses
            .write()
            .map_err(|e| InteractionError::Store(e.to_string()))?
            .insert(request.key(), response);

        tracing::debug!(
            "Stored consent for subject {} and client {}",
            subject_id,
            request.client_id
        );
        Ok(())
    }
}

/// Local URLs are rooted paths; `//host` and `/\host` are protocol-relative
/// and browsers strip control characters, turning `/\t/host` into `//host`.
pub fn is_local_url(url: &str) -> bool {
    if url.bytes().any(|b| b.is_ascii_control()) {
        return false;
    }
    match url.as_bytes() {
        [b'/'] => true,
        [b'/', second, ..] => *second != b'/' && *second != b'\\',
        _ => false,
    }
}
