//! Identity and API resources, and resolution of requested scopes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::Secret;

/// Scope that asks for a refresh token rather than a resource
pub const OFFLINE_ACCESS: &str = "offline_access";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Resource store unavailable: {0}")]
    Unavailable(String),
}

/// A named bundle of user claims exposed through OIDC
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_claims: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub emphasize: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl IdentityResource {
    pub fn new(name: &str, display_name: &str, user_claims: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            display_name: Some(display_name.to_string()),
            description: None,
            user_claims: user_claims.iter().map(|c| c.to_string()).collect(),
            required: false,
            emphasize: false,
            enabled: true,
        }
    }

    /// The mandatory `openid` resource carrying the subject id
    pub fn openid() -> Self {
        Self {
            required: true,
            ..Self::new("openid", "Your user identifier", &["sub"])
        }
    }

    /// Standard OIDC profile claims
    pub fn profile() -> Self {
        Self {
            description: Some(
                "Your user profile information (first name, last name, etc.)".to_string(),
            ),
            emphasize: true,
            ..Self::new(
                "profile",
                "User profile",
                &[
                    "name",
                    "family_name",
                    "given_name",
                    "middle_name",
                    "nickname",
                    "preferred_username",
                    "profile",
                    "picture",
                    "website",
                    "gender",
                    "birthdate",
                    "zoneinfo",
                    "locale",
                    "updated_at",
                ],
            )
        }
    }
}

/// A scope exposed by an API resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub emphasize: bool,
    #[serde(default)]
    pub user_claims: Vec<String>,
}

impl Scope {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: Some(display_name.to_string()),
            description: None,
            required: false,
            emphasize: false,
            user_claims: Vec::new(),
        }
    }
}

/// A protected API, secured with access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Secrets the API uses against the introspection endpoint
    #[serde(default)]
    pub api_secrets: Vec<Secret>,
    /// User claims added to access tokens besides the subject id
    #[serde(default)]
    pub user_claims: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Resources resolved for a set of requested scopes
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub identity_resources: Vec<IdentityResource>,
    pub api_resources: Vec<ApiResource>,
    pub offline_access: bool,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.identity_resources.is_empty() && self.api_resources.is_empty()
    }
}

/// Looks up the resources behind requested scopes
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_enabled_resources_by_scope(
        &self,
        scopes: &[String],
    ) -> Result<Resources, ResourceError>;
}

/// Resource store backed by the configured catalog
pub struct InMemoryResourceStore {
    identity_resources: Vec<IdentityResource>,
    api_resources: Vec<ApiResource>,
}

impl InMemoryResourceStore {
    pub fn new(identity_resources: Vec<IdentityResource>, api_resources: Vec<ApiResource>) -> Self {
        Self {
            identity_resources,
            api_resources,
        }
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find_enabled_resources_by_scope(
        &self,
        scopes: &[String],
    ) -> Result<Resources, ResourceError> {
        let requested = |name: &str| scopes.iter().any(|s| s == name);

        let identity_resources = self
            .identity_resources
            .iter()
            .filter(|r| r.enabled && requested(&r.name))
            .cloned()
            .collect();

        // API resources are narrowed to the scopes actually requested
        let api_resources = self
            .api_resources
            .iter()
            .filter(|r| r.enabled)
            .filter_map(|r| {
                let matched: Vec<Scope> = r
                    .scopes
                    .iter()
                    .filter(|s| requested(&s.name))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    None
                } else {
                    Some(ApiResource {
                        scopes: matched,
                        ..r.clone()
                    })
                }
            })
            .collect();

        Ok(Resources {
            identity_resources,
            api_resources,
            offline_access: requested(OFFLINE_ACCESS),
        })
    }
}
