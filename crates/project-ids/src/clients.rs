//! OAuth client registrations and client secrets

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// OAuth grant types a client may be allowed to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    Hybrid,
    Implicit,
    ClientCredentials,
    Password,
}

impl GrantType {
    /// Hybrid flow plus client credentials for server-to-server calls
    pub fn hybrid_and_client_credentials() -> Vec<GrantType> {
        vec![GrantType::Hybrid, GrantType::ClientCredentials]
    }

    /// Grant type implied by an authorize request's `response_type`
    pub fn for_response_type(response_type: &str) -> Option<GrantType> {
        let mut parts: Vec<&str> = response_type.split_whitespace().collect();
        parts.sort_unstable();
        match parts.as_slice() {
            ["code"] => Some(GrantType::AuthorizationCode),
            ["code", "id_token"] | ["code", "token"] | ["code", "id_token", "token"] => {
                Some(GrantType::Hybrid)
            }
            ["id_token"] | ["id_token", "token"] => Some(GrantType::Implicit),
            _ => None,
        }
    }
}

/// How access tokens for a client are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenType {
    /// Self-contained signed token
    #[default]
    Jwt,
    /// Opaque handle validated through introspection
    Reference,
}

/// A hashed client or API secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// base64(SHA-256(plaintext))
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Secret {
    /// Hash a plaintext secret for storage
    pub fn sha256(plain: &str) -> Self {
        Self {
            value: sha256_base64(plain),
            description: None,
        }
    }

    /// Check a presented plaintext secret against the stored hash
    pub fn matches(&self, plain: &str) -> bool {
        sha256_base64(plain) == self.value
    }
}

fn sha256_base64(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hasher.finalize())
}

/// A registered client application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_secrets: Vec<Secret>,
    pub allowed_grant_types: Vec<GrantType>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    #[serde(default)]
    pub access_token_type: AccessTokenType,
    #[serde(default)]
    pub always_include_user_claims_in_id_token: bool,
    #[serde(default)]
    pub allow_offline_access: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Client {
    pub fn allows_grant_type(&self, grant_type: GrantType) -> bool {
        self.allowed_grant_types.contains(&grant_type)
    }

    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    /// `offline_access` is only allowed when the client opted in to refresh tokens
    pub fn allows_scope(&self, scope: &str) -> bool {
        if scope == crate::resources::OFFLINE_ACCESS {
            return self.allow_offline_access;
        }
        self.allowed_scopes.iter().any(|s| s == scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches_only_original_plaintext() {
        let secret = Secret::sha256("managesecret");
        assert!(secret.matches("managesecret"));
        assert!(!secret.matches("ManageSecret"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_secret_hash_is_base64_sha256() {
        // SHA-256("") in standard base64
        assert_eq!(
            Secret::sha256("").value,
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_response_type_mapping() {
        assert_eq!(
            GrantType::for_response_type("code"),
            Some(GrantType::AuthorizationCode)
        );
        assert_eq!(
            GrantType::for_response_type("code id_token"),
            Some(GrantType::Hybrid)
        );
        assert_eq!(
            GrantType::for_response_type("id_token code"),
            Some(GrantType::Hybrid)
        );
        assert_eq!(
            GrantType::for_response_type("token id_token"),
            Some(GrantType::Implicit)
        );
        assert_eq!(GrantType::for_response_type("token"), None);
        assert_eq!(GrantType::for_response_type(""), None);
    }
}
