//! Username/password login against the test user store

pub mod model;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::antiforgery;
use crate::events::Event;
use crate::html;
use crate::interaction::{is_local_url, AuthorizationRequest};
use crate::session::{current_session, session_cookie};
use crate::AppState;

use model::{LoginInputModel, LoginViewModel};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Where to continue after login, usually the authorize callback
    #[serde(rename = "returnUrl", alias = "ReturnUrl", default)]
    pub return_url: Option<String>,
}

/// Handler for `GET /Account/Login`
pub async fn get_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let return_url = query.return_url.unwrap_or_default();

    if current_session(&jar, &state.sessions).is_some() {
        let context = authorization_context(&state, &return_url).await;
        return Redirect::to(&redirect_target(&return_url, context.is_some())).into_response();
    }

    render_login(
        &state,
        jar,
        LoginViewModel {
            return_url,
            ..LoginViewModel::default()
        },
    )
}

/// Handler for `POST /Account/Login`
pub async fn post_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(mut model): Form<LoginInputModel>,
) -> Response {
    if !antiforgery::verify_token(&jar, model.request_verification_token.as_deref()) {
        tracing::warn!("Rejected login post with a missing or invalid antiforgery token");
        return (StatusCode::BAD_REQUEST, "Invalid antiforgery token").into_response();
    }

    let errors = model.validate();
    if !errors.is_empty() {
        return render_login(
            &state,
            jar,
            LoginViewModel {
                errors,
                ..LoginViewModel::from(&model)
            },
        );
    }

    let context = authorization_context(&state, &model.return_url).await;
    let client_id = context.as_ref().map(|c| c.client_id.clone());

    if !state.users.validate_credentials(&model.username, &model.password) {
        state
            .events
            .raise(Event::UserLoginFailure {
                username: model.username.clone(),
                message: "invalid credentials".to_string(),
                client_id,
            })
            .await;
        tracing::info!("Invalid credentials for user {:?}", model.username);

        model.username.clear();
        model.password.clear();
        return render_login(
            &state,
            jar,
            LoginViewModel {
                errors: vec!["Invalid username or password".to_string()],
                ..LoginViewModel::from(&model)
            },
        );
    }

    model.password.clear();

    let Some(user) = state.users.find_by_username(&model.username) else {
        tracing::error!("User {} validated but not found", model.username);
        return (StatusCode::INTERNAL_SERVER_ERROR, "User not found").into_response();
    };

    state
        .events
        .raise(Event::UserLoginSuccess {
            username: user.username.clone(),
            subject_id: user.subject_id.clone(),
            display_name: user.username.clone(),
            client_id,
        })
        .await;

    let session_config = &state.config.session;
    let (token, session) = state.sessions.create_session(
        &user.subject_id,
        &user.username,
        session_config.lifetime(model.remember_login),
        model.remember_login,
    );
    let jar = jar.add(session_cookie(token, &session, session_config.secure_cookies));

    tracing::info!(
        "User {} signed in (persistent: {})",
        user.username,
        session.persistent
    );

    let target = redirect_target(&model.return_url, context.is_some());
    (jar, Redirect::to(&target)).into_response()
}

async fn authorization_context(state: &AppState, return_url: &str) -> Option<AuthorizationRequest> {
    if return_url.is_empty() {
        return None;
    }
    state.interaction.get_authorization_context(return_url).await
}

/// Only follow return URLs that belong to a pending request or stay on this site
fn redirect_target(return_url: &str, has_context: bool) -> String {
    if has_context || is_local_url(return_url) {
        return return_url.to_string();
    }
    if !return_url.is_empty() {
        tracing::warn!("Ignoring non-local return URL {:?}", return_url);
    }
    "/".to_string()
}

fn render_login(state: &AppState, jar: SignedCookieJar, mut vm: LoginViewModel) -> Response {
    let (jar, token) = antiforgery::issue_token(jar, state.config.session.secure_cookies);
    vm.antiforgery_token = token;
    let page = html::login_page(&vm, &state.config.interaction.login_path);
    (jar, Html(page)).into_response()
}

/// Handler for `GET /`
pub async fn home(State(state): State<AppState>, jar: SignedCookieJar) -> Html<String> {
    let session = current_session(&jar, &state.sessions);
    Html(html::home_page(
        session.as_ref().map(|s| s.display_name.as_str()),
        &state.config.interaction.login_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target() {
        let callback = "/connect/authorize/callback?client_id=projectmanage";
        assert_eq!(redirect_target(callback, true), callback);
        assert_eq!(redirect_target("/diagnostics", false), "/diagnostics");
        assert_eq!(redirect_target("", false), "/");
        assert_eq!(redirect_target("https://evil.example.com", false), "/");
        assert_eq!(redirect_target("//evil.example.com", false), "/");
    }
}
