//! View models for the consent flow

use serde::Serialize;

use crate::resources::{IdentityResource, Scope};

/// One scope as presented for consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeViewModel {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub emphasize: bool,
    pub required: bool,
    pub checked: bool,
}

impl ScopeViewModel {
    pub fn from_identity_resource(resource: &IdentityResource, checked: bool) -> Self {
        Self {
            name: resource.name.clone(),
            display_name: resource.display_name.clone(),
            description: resource.description.clone(),
            emphasize: resource.emphasize,
            required: resource.required,
            checked,
        }
    }

    pub fn from_scope(scope: &Scope, checked: bool) -> Self {
        Self {
            name: scope.name.clone(),
            display_name: scope.display_name.clone(),
            description: scope.description.clone(),
            emphasize: scope.emphasize,
            required: scope.required,
            checked,
        }
    }
}

/// Outcome of processing a consent request
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessConsentResult {
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub remember_consent: bool,
    pub scopes_consented: Vec<String>,
    pub identity_scopes: Vec<ScopeViewModel>,
    pub resource_scopes: Vec<ScopeViewModel>,
    pub validation_error: Option<String>,
}

impl ProcessConsentResult {
    pub fn is_redirect(&self) -> bool {
        self.redirect_uri.is_some()
    }

    pub fn has_validation_error(&self) -> bool {
        self.validation_error.is_some()
    }

    pub(crate) fn fail(mut self, error: &str) -> Self {
        self.validation_error = Some(error.to_string());
        self
    }
}
