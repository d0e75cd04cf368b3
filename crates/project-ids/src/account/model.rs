//! Login form input and view models

use serde::Deserialize;

/// Fields posted by the login form
#[derive(Debug, Default, Deserialize)]
pub struct LoginInputModel {
    #[serde(rename = "Username", default)]
    pub username: String,

    #[serde(rename = "Password", default)]
    pub password: String,

    #[serde(rename = "RememberLogin", default)]
    pub remember_login: bool,

    #[serde(rename = "ReturnUrl", default)]
    pub return_url: String,

    #[serde(rename = "__RequestVerificationToken", default)]
    pub request_verification_token: Option<String>,
}

impl LoginInputModel {
    /// Required-field checks, one message per missing field
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push("The Username field is required.".to_string());
        }
        if self.password.is_empty() {
            errors.push("The Password field is required.".to_string());
        }
        errors
    }
}

/// What the login page renders; the password is never echoed back
#[derive(Debug, Clone, Default)]
pub struct LoginViewModel {
    pub username: String,
    pub remember_login: bool,
    pub return_url: String,
    pub antiforgery_token: String,
    pub errors: Vec<String>,
}

impl From<&LoginInputModel> for LoginViewModel {
    fn from(input: &LoginInputModel) -> Self {
        Self {
            username: input.username.clone(),
            remember_login: input.remember_login,
            return_url: input.return_url.clone(),
            ..Self::default()
        }
    }
}
