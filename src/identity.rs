//! Identity store: credential check against the seeded user set and the
//! persisted active session.
//!
//! The user list is written once on first load and never edited by the
//! application. A failed login reports "no match" without saying whether
//! the email or the password was wrong.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SESSION_KEY, USERS_KEY};
use crate::crypto::{CryptoError, PasswordHash, PBKDF2_ITERATIONS};
use crate::db::{load_json, save_json, DatabaseError, KeyValueStore};
use crate::models::{Role, User};
use crate::seed;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Duplicate email in user set: {0}")]
    DuplicateEmail(String),

    #[error("User {user_id} has an invalid patient link for role {role}")]
    InvalidPatientLink { user_id: String, role: Role },
}

/// Identity store settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// PBKDF2 iterations used when hashing seed credentials.
    pub hash_iterations: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            hash_iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Page a user lands on after signing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingView {
    AdminDashboard,
    PatientDashboard,
}

pub fn landing_view(user: &User) -> LandingView {
    match user.role {
        Role::Admin => LandingView::AdminDashboard,
        Role::Patient => LandingView::PatientDashboard,
    }
}

/// Password checked against on an unknown email, so a miss costs the same
/// derivation as a wrong password.
const DECOY_PASSWORD: &str = "dentaldesk-decoy";

/// What is persisted for the active session. The credential stays in the
/// user set only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    id: String,
    role: Role,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<&User> for SessionRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role,
            email: user.email.clone(),
            patient_id: user.patient_id.clone(),
            name: user.name.clone(),
        }
    }
}

pub struct IdentityStore {
    storage: Arc<dyn KeyValueStore>,
    users: Vec<User>,
    session: Option<User>,
    decoy: PasswordHash,
}

impl IdentityStore {
    /// Load the user set (seeding it on first run) and any persisted session.
    pub fn open(
        storage: Arc<dyn KeyValueStore>,
        config: &IdentityConfig,
    ) -> Result<Self, IdentityError> {
        let users = match load_json::<Vec<User>>(storage.as_ref(), USERS_KEY)? {
            Some(users) => users,
            None => {
                let users = seed::seed_users(config.hash_iterations)?;
                save_json(storage.as_ref(), USERS_KEY, &users)?;
                tracing::info!(count = users.len(), "Seeded user set");
                users
            }
        };
        validate_users(&users)?;

        let record: Option<SessionRecord> = load_json(storage.as_ref(), SESSION_KEY)?;
        let session = record.and_then(|record| {
            let user = users
                .iter()
                .find(|u| u.id == record.id && u.email == record.email)
                .cloned();
            match &user {
                Some(user) => {
                    tracing::info!(user_id = %user.id, role = %user.role, "Restored persisted session")
                }
                None => tracing::warn!(user_id = %record.id, "Persisted session names no known user"),
            }
            user
        });

        let decoy = PasswordHash::new(DECOY_PASSWORD, config.hash_iterations)?;

        Ok(Self {
            storage,
            users,
            session,
            decoy,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Exact, case-sensitive match of `(email, password)` against the user
    /// set. On success the user becomes the persisted active session. On
    /// failure `None` is returned and any existing session is untouched.
    pub fn authenticate(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, IdentityError> {
        let matched = match self.users.iter().find(|u| !email.is_empty() && u.email == email) {
            Some(user) => user.credential.verify(password).then(|| user.clone()),
            None => {
                let _ = self.decoy.verify(password);
                None
            }
        };

        let Some(user) = matched else {
            tracing::warn!("Authentication failed: invalid credentials");
            return Ok(None);
        };

        save_json(self.storage.as_ref(), SESSION_KEY, &SessionRecord::from(&user))?;
        tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
        self.session = Some(user.clone());
        Ok(Some(user))
    }

    /// Clear the active session and its persisted record.
    pub fn end_session(&mut self) -> Result<(), IdentityError> {
        self.storage.remove(SESSION_KEY)?;
        if let Some(user) = self.session.take() {
            tracing::info!(user_id = %user.id, "User signed out");
        }
        Ok(())
    }

    pub fn current_session(&self) -> Option<&User> {
        self.session.as_ref()
    }
}

/// Emails are unique; Patient users carry a patient link and Admins do not.
fn validate_users(users: &[User]) -> Result<(), IdentityError> {
    let mut seen = HashSet::new();
    for user in users {
        if !seen.insert(user.email.as_str()) {
            return Err(IdentityError::DuplicateEmail(user.email.clone()));
        }
        let linked = user.patient_id.is_some();
        if linked != (user.role == Role::Patient) {
            return Err(IdentityError::InvalidPatientLink {
                user_id: user.id.clone(),
                role: user.role,
            });
        }
    }
    Ok(())
}
