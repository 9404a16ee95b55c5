use serde::{Deserialize, Serialize};

use super::enums::Role;
use crate::crypto::PasswordHash;

/// A principal that can sign in. The user set is seeded once and never
/// edited by the application itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    pub email: String,
    /// Salted hash of the password; the plaintext is never stored.
    pub credential: PasswordHash,
    /// Linked patient record. Present iff `role` is `Patient`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name shown in the UI, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
