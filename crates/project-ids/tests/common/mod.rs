//! Shared harness for driving the router with recording collaborators.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use tower::ServiceExt;

use project_ids::catalog::Catalog;
use project_ids::config::Config;
use project_ids::events::{Event, EventSink};
use project_ids::interaction::{
    AuthorizationRequest, ConsentResponse, DefaultInteractionService, InteractionError,
    InteractionService,
};
use project_ids::resources::{InMemoryResourceStore, ResourceError, ResourceStore, Resources};
use project_ids::users::TestUserStore;
use project_ids::{router, AppState};

pub const CALLBACK: &str = "/connect/authorize/callback";

/// Event sink that keeps every raised event.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<Event>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingEvents {
    async fn raise(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Interaction service that records grants before delegating to the default one.
pub struct RecordingInteraction {
    inner: DefaultInteractionService,
    grants: Mutex<Vec<(String, AuthorizationRequest, ConsentResponse)>>,
    /// Reject every grant as if the consent store were down
    failing: bool,
}

impl RecordingInteraction {
    pub fn new() -> Self {
        Self {
            inner: DefaultInteractionService::new(Catalog::default().clients, CALLBACK),
            grants: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn grants(&self) -> Vec<(String, AuthorizationRequest, ConsentResponse)> {
        self.grants.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &DefaultInteractionService {
        &self.inner
    }
}

#[async_trait]
impl InteractionService for RecordingInteraction {
    async fn get_authorization_context(&self, return_url: &str) -> Option<AuthorizationRequest> {
        self.inner.get_authorization_context(return_url).await
    }

    async fn grant_consent(
        &self,
        subject_id: &str,
        request: &AuthorizationRequest,
        response: ConsentResponse,
    ) -> Result<(), InteractionError> {
        if self.failing {
            return Err(InteractionError::Store("consent store offline".to_string()));
        }
        self.grants.lock().unwrap().push((
            subject_id.to_string(),
            request.clone(),
            response.clone(),
        ));
        self.inner.grant_consent(subject_id, request, response).await
    }
}

/// Resource store returning a fixed answer; `None` means the store is down.
pub struct FixedResources(pub Option<Resources>);

#[async_trait]
impl ResourceStore for FixedResources {
    async fn find_enabled_resources_by_scope(
        &self,
        _scopes: &[String],
    ) -> Result<Resources, ResourceError> {
        self.0
            .clone()
            .ok_or_else(|| ResourceError::Unavailable("offline".to_string()))
    }
}

pub struct Harness {
    pub state: AppState,
    pub app: Router,
    pub events: Arc<RecordingEvents>,
    pub interaction: Arc<RecordingInteraction>,
}

impl Harness {
    pub fn new() -> Self {
        let catalog = Catalog::default();
        Self::with_resources(Arc::new(InMemoryResourceStore::new(
            catalog.identity_resources,
            catalog.api_resources,
        )))
    }

    /// Default catalog resources with a custom interaction service.
    pub fn with_interaction(interaction: RecordingInteraction) -> Self {
        let catalog = Catalog::default();
        Self::with_parts(
            Arc::new(InMemoryResourceStore::new(
                catalog.identity_resources,
                catalog.api_resources,
            )),
            interaction,
        )
    }

    pub fn with_resources(resources: Arc<dyn ResourceStore>) -> Self {
        Self::with_parts(resources, RecordingInteraction::new())
    }

    pub fn with_parts(resources: Arc<dyn ResourceStore>, interaction: RecordingInteraction) -> Self {
        let config = Config::default();
        let users = TestUserStore::new(config.catalog.users.clone());
        let events = Arc::new(RecordingEvents::default());
        let interaction = Arc::new(interaction);

        let state = AppState::new(
            config,
            users,
            interaction.clone(),
            resources,
            events.clone(),
        )
        .expect("Failed to build state");
        let app = router(state.clone());

        Self {
            state,
            app,
            events,
            interaction,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.expect("Router failed")
    }

    pub async fn get(&self, uri: &str, cookies: &[String]) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies.join("; "));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookies: &[String], fields: &[(&str, &str)]) -> Response {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies.join("; "));
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Fetch the login page, returning its cookies and antiforgery token.
    pub async fn open_login(&self, return_url: &str) -> (Vec<String>, String) {
        let response = self.get(&login_uri(return_url), &[]).await;
        let cookies = set_cookies(&response);
        let body = body_string(response).await;
        let token = hidden_value(&body, "__RequestVerificationToken")
            .expect("Login page should carry an antiforgery token");
        (cookies, token)
    }

    /// Submit the login form after opening the page.
    pub async fn submit_login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
        return_url: &str,
    ) -> (Vec<String>, Response) {
        let (cookies, token) = self.open_login(return_url).await;
        let mut fields = vec![
            ("Username", username),
            ("Password", password),
            ("ReturnUrl", return_url),
            ("__RequestVerificationToken", token.as_str()),
        ];
        if remember {
            fields.push(("RememberLogin", "true"));
        }
        let response = self.post_form("/Account/Login", &cookies, &fields).await;
        (cookies, response)
    }

    /// Sign in and return every cookie the browser would now hold.
    pub async fn sign_in(&self, username: &str, password: &str) -> Vec<String> {
        let (mut cookies, response) = self
            .submit_login(username, password, false, &return_url("openid"))
            .await;
        assert!(response.status().is_redirection(), "Login should redirect");
        cookies.extend(set_cookies(&response));
        cookies
    }
}

/// Return URL for a pending hybrid request from the `projectmanage` client.
pub fn return_url(scope: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", "projectmanage")
        .append_pair("redirect_uri", "http://localhost:5003/signin-oidc")
        .append_pair("response_type", "code id_token")
        .append_pair("scope", scope)
        .append_pair("state", "abc")
        .append_pair("nonce", "xyz")
        .finish();
    format!("{}?{}", CALLBACK, query)
}

pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn login_uri(return_url: &str) -> String {
    format!("/Account/Login?returnUrl={}", encode(return_url))
}

pub fn consent_uri(return_url: &str) -> String {
    format!("/Consent?returnUrl={}", encode(return_url))
}

/// `name=value` pairs from every Set-Cookie header.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(|v| v.trim().to_string())
        .collect()
}

/// Full Set-Cookie header for the named cookie.
pub fn set_cookie_header(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// Value of a form input by name, as rendered.
pub fn hidden_value(body: &str, name: &str) -> Option<String> {
    let marker = format!(r#"name="{}" value=""#, name);
    let start = body.find(&marker)? + marker.len();
    let end = body[start..].find('"')? + start;
    Some(body[start..end].to_string())
}
