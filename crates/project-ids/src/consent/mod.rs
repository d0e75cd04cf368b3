//! Consent endpoint
//!
//! Consent is granted automatically: every requested identity and API scope is
//! marked as checked and handed back to the interaction service. The user is
//! never shown a choice.

pub mod model;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::events::Event;
use crate::interaction::ConsentResponse;
use crate::session::{current_session, Session};
use crate::AppState;

pub use model::{ProcessConsentResult, ScopeViewModel};

#[derive(Debug, Deserialize)]
pub struct ConsentQuery {
    #[serde(rename = "returnUrl", alias = "ReturnUrl", default)]
    pub return_url: Option<String>,
}

/// Handler for `GET /Consent`
pub async fn handler(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<ConsentQuery>,
) -> Response {
    let return_url = query.return_url.unwrap_or_default();

    let Some(session) = current_session(&jar, &state.sessions) else {
        tracing::debug!("Consent requested without a session, redirecting to login");
        return Redirect::to(&state.login_url(&return_url)).into_response();
    };

    let result = process_consent(&state, &session, &return_url).await;
    if let Some(error) = &result.validation_error {
        tracing::warn!(
            "Consent for subject {} failed validation: {}",
            session.subject_id,
            error
        );
        return Redirect::to(&state.login_url(&return_url)).into_response();
    }

    match result.redirect_uri {
        Some(uri) => Redirect::to(&uri).into_response(),
        None => Redirect::to(&state.login_url(&return_url)).into_response(),
    }
}

/// Validate the pending request behind `return_url` and grant every requested scope
pub async fn process_consent(
    state: &AppState,
    session: &Session,
    return_url: &str,
) -> ProcessConsentResult {
    let result = ProcessConsentResult::default();

    if return_url.trim().is_empty() {
        return result.fail("ReturnUrl Is Empty!");
    }

    let Some(request) = state.interaction.get_authorization_context(return_url).await else {
        return result.fail("Return Url Is Invalid!");
    };

    let mut result = ProcessConsentResult {
        client_id: Some(request.client_id.clone()),
        redirect_uri: Some(return_url.to_string()),
        remember_consent: false,
        ..result
    };

    let resources = match state
        .resources
        .find_enabled_resources_by_scope(&request.scopes_requested)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to resolve resources for {}: {}", request.client_id, e);
            return result.fail("Resources Is Null!");
        }
    };

    if resources.is_empty() {
        return result.fail("IdentityResources && ApiResources Is Null!");
    }

    result.identity_scopes = resources
        .identity_resources
        .iter()
        .map(|r| ScopeViewModel::from_identity_resource(r, true))
        .collect();

    result.resource_scopes = resources
        .api_resources
        .iter()
        .flat_map(|r| r.scopes.iter())
        .map(|s| ScopeViewModel::from_scope(s, true))
        .collect();

    result.scopes_consented = result
        .identity_scopes
        .iter()
        .chain(result.resource_scopes.iter())
        .map(|s| s.name.clone())
        .collect();

    if result.scopes_consented.is_empty() {
        return result.fail("ScopesConsented Is Null");
    }

    let response = ConsentResponse {
        remember_consent: result.remember_consent,
        scopes_consented: result.scopes_consented.clone(),
    };
    if let Err(e) = state
        .interaction
        .grant_consent(&session.subject_id, &request, response)
        .await
    {
        tracing::error!("Failed to grant consent for {}: {}", request.client_id, e);
        return result.fail("Consent Could Not Be Persisted!");
    }

    state
        .events
        .raise(Event::ConsentGranted {
            subject_id: session.subject_id.clone(),
            client_id: request.client_id.clone(),
            requested_scopes: request.scopes_requested.clone(),
            granted_scopes: result.scopes_consented.clone(),
            consent_remembered: result.remember_consent,
        })
        .await;

    tracing::info!(
        "Granted {:?} to client {} for subject {}",
        result.scopes_consented,
        request.client_id,
        session.subject_id
    );
    result
}
