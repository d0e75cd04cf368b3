//! Identity resources, APIs, clients and users served by this provider
//!
//! The catalog is plain data. It is loaded once as part of [`crate::config::Config`]
//! and handed to the stores at startup; nothing mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::clients::{AccessTokenType, Client, GrantType, Secret};
use crate::resources::{ApiResource, IdentityResource, Scope, OFFLINE_ACCESS};
use crate::users::{Claim, ClaimValueType, TestUser};

const ADDRESS: &str = r#"{ 'street_address': 'One Hacker Way', 'locality': 'Heidelberg', 'postal_code': 69118, 'country': 'Germany' }"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "identity_resources")]
    pub identity_resources: Vec<IdentityResource>,

    #[serde(default = "api_resources")]
    pub api_resources: Vec<ApiResource>,

    #[serde(default = "clients")]
    pub clients: Vec<Client>,

    #[serde(default = "users")]
    pub users: Vec<TestUser>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            identity_resources: identity_resources(),
            api_resources: api_resources(),
            clients: clients(),
            users: users(),
        }
    }
}

impl Catalog {
    /// Every scope name a client could request
    pub fn scope_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .identity_resources
            .iter()
            .map(|r| r.name.clone())
            .chain(
                self.api_resources
                    .iter()
                    .flat_map(|r| r.scopes.iter().map(|s| s.name.clone())),
            )
            .collect();
        names.push(OFFLINE_ACCESS.to_string());
        names
    }
}

fn identity_resources() -> Vec<IdentityResource> {
    vec![
        IdentityResource::openid(),
        IdentityResource::profile(),
        IdentityResource::new("roles", "角色", &["role"]),
        IdentityResource::new("locations", "地点", &["location"]),
    ]
}

fn api_resources() -> Vec<ApiResource> {
    vec![ApiResource {
        name: "projectapi".to_string(),
        display_name: Some("项目API资源".to_string()),
        description: None,
        api_secrets: vec![Secret::sha256("projectapisecret")],
        user_claims: vec!["roles".to_string(), "locations".to_string()],
        scopes: vec![Scope::new("projectapi", "projectapi")],
        enabled: true,
    }]
}

fn clients() -> Vec<Client> {
    vec![Client {
        client_id: "projectmanage".to_string(),
        client_name: Some("系统管理端".to_string()),
        client_secrets: vec![Secret::sha256("managesecret")],
        allowed_grant_types: GrantType::hybrid_and_client_credentials(),
        redirect_uris: vec!["http://localhost:5003/signin-oidc".to_string()],
        post_logout_redirect_uris: vec!["http://localhost:5003/signout-callback-oidc".to_string()],
        allowed_scopes: ["openid", "profile", OFFLINE_ACCESS, "projectapi", "roles", "locations"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        access_token_type: AccessTokenType::Reference,
        always_include_user_claims_in_id_token: true,
        allow_offline_access: true,
        enabled: true,
    }]
}

fn users() -> Vec<TestUser> {
    vec![
        TestUser {
            subject_id: "1".to_string(),
            username: "alice".to_string(),
            password: "alice".to_string(),
            claims: vec![
                Claim::new("name", "Alice Smith"),
                Claim::new("given_name", "Alice"),
                Claim::new("family_name", "Smith"),
                Claim::new("email", "AliceSmith@email.com"),
                Claim::typed("email_verified", "true", ClaimValueType::Boolean),
                Claim::new("website", "http://alice.com"),
                Claim::typed("address", ADDRESS, ClaimValueType::Json),
                Claim::new("role", "admin"),
            ],
            is_active: true,
        },
        TestUser {
            subject_id: "11".to_string(),
            username: "bob".to_string(),
            password: "bob".to_string(),
            claims: vec![
                Claim::new("name", "Bob Smith"),
                Claim::new("given_name", "Bob"),
                Claim::new("family_name", "Smith"),
                Claim::new("email", "BobSmith@email.com"),
                Claim::typed("email_verified", "true", ClaimValueType::Boolean),
                Claim::new("website", "http://bob.com"),
                Claim::typed("address", ADDRESS, ClaimValueType::Json),
                Claim::new("location", "somewhere"),
                Claim::new("role", "user"),
            ],
            is_active: true,
        },
    ]
}
