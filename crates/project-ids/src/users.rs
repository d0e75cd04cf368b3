//! In-memory test users and credential validation

use serde::{Deserialize, Serialize};

/// How a claim value should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimValueType {
    #[default]
    String,
    Boolean,
    Json,
}

/// A single user claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    #[serde(default)]
    pub value_type: ClaimValueType,
}

impl Claim {
    pub fn new(claim_type: &str, value: &str) -> Self {
        Self::typed(claim_type, value, ClaimValueType::String)
    }

    pub fn typed(claim_type: &str, value: &str, value_type: ClaimValueType) -> Self {
        Self {
            claim_type: claim_type.to_string(),
            value: value.to_string(),
            value_type,
        }
    }
}

/// A statically configured user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestUser {
    pub subject_id: String,
    pub username: String,
    /// Plaintext; these accounts exist for development only
    pub password: String,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl TestUser {
    /// First value of the given claim type
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}

/// Lookup and credential checks over a fixed set of users
#[derive(Debug, Clone, Default)]
pub struct TestUserStore {
    users: Vec<TestUser>,
}

impl TestUserStore {
    pub fn new(users: Vec<TestUser>) -> Self {
        Self { users }
    }

    /// True when an active user has exactly this username and password
    pub fn validate_credentials(&self, username: &str, password: &str) -> bool {
        self.find_by_username(username)
            .map(|u| u.is_active && u.password == password)
            .unwrap_or(false)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&TestUser> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn find_by_subject_id(&self, subject_id: &str) -> Option<&TestUser> {
        self.users.iter().find(|u| u.subject_id == subject_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
