//! First-run dataset: demo users, patients and incidents.
//!
//! Written to storage only when the corresponding key is absent.
//! Demo passwords are hashed when the user list is built.

use crate::crypto::{CryptoError, PasswordHash};
use crate::db::DatabaseError;
use crate::models::{Incident, Patient, Role, User};

const SEED_PATIENTS: &str = include_str!("../resources/seed/patients.json");
const SEED_INCIDENTS: &str = include_str!("../resources/seed/incidents.json");

/// Demo credential before hashing.
struct SeedUser {
    id: &'static str,
    role: Role,
    email: &'static str,
    password: &'static str,
    patient_id: Option<&'static str>,
    name: &'static str,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser { id: "1", role: Role::Admin, email: "admin@entnt.in", password: "admin123", patient_id: None, name: "Dr. Sarah Johnson" },
    SeedUser { id: "8", role: Role::Admin, email: "dr.rahul@entnt.in", password: "dental123", patient_id: None, name: "Dr. Rahul Gupta" },
    SeedUser { id: "9", role: Role::Admin, email: "dr.asif@entnt.in", password: "dental123", patient_id: None, name: "Dr. Asif Naqvi" },
    SeedUser { id: "2", role: Role::Patient, email: "vikas@entnt.in", password: "patient123", patient_id: Some("p1"), name: "Vikas Gupta" },
    SeedUser { id: "3", role: Role::Patient, email: "jane@entnt.in", password: "patient123", patient_id: Some("p2"), name: "Jane Smith" },
    SeedUser { id: "4", role: Role::Patient, email: "mike@entnt.in", password: "patient123", patient_id: Some("p3"), name: "Mike Johnson" },
    SeedUser { id: "5", role: Role::Patient, email: "sarah@entnt.in", password: "patient123", patient_id: Some("p4"), name: "Sarah Wilson" },
    SeedUser { id: "6", role: Role::Patient, email: "david@entnt.in", password: "patient123", patient_id: Some("p5"), name: "David Brown" },
    SeedUser { id: "7", role: Role::Patient, email: "lisa@entnt.in", password: "patient123", patient_id: Some("p6"), name: "Lisa Davis" },
    SeedUser { id: "10", role: Role::Patient, email: "robert@entnt.in", password: "patient123", patient_id: Some("p7"), name: "Robert Miller" },
];

/// Build the seed user list, hashing each demo password.
pub fn seed_users(iterations: u32) -> Result<Vec<User>, CryptoError> {
    SEED_USERS
        .iter()
        .map(|u| {
            Ok(User {
                id: u.id.to_string(),
                role: u.role,
                email: u.email.to_string(),
                credential: PasswordHash::new(u.password, iterations)?,
                patient_id: u.patient_id.map(str::to_string),
                name: Some(u.name.to_string()),
            })
        })
        .collect()
}

pub fn seed_patients() -> Result<Vec<Patient>, DatabaseError> {
    serde_json::from_str(SEED_PATIENTS).map_err(|source| DatabaseError::Serialization {
        key: "seed patients".into(),
        source,
    })
}

pub fn seed_incidents() -> Result<Vec<Incident>, DatabaseError> {
    serde_json::from_str(SEED_INCIDENTS).map_err(|source| DatabaseError::Serialization {
        key: "seed incidents".into(),
        source,
    })
}
