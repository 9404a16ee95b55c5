use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub dob: NaiveDate,
    pub contact: String,
    pub health_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when registering a patient; the store assigns
/// `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub dob: NaiveDate,
    pub contact: String,
    pub health_info: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
}

impl NewPatient {
    pub(crate) fn into_patient(self, id: String, now: DateTime<Utc>) -> Patient {
        Patient {
            id,
            name: self.name,
            dob: self.dob,
            contact: self.contact,
            health_info: self.health_info,
            email: self.email,
            address: self.address,
            emergency_contact: self.emergency_contact,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub contact: Option<String>,
    pub health_info: Option<String>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub emergency_contact: Option<Option<String>>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(self, patient: &mut Patient) {
        if let Some(name) = self.name {
            patient.name = name;
        }
        if let Some(dob) = self.dob {
            patient.dob = dob;
        }
        if let Some(contact) = self.contact {
            patient.contact = contact;
        }
        if let Some(health_info) = self.health_info {
            patient.health_info = health_info;
        }
        if let Some(email) = self.email {
            patient.email = email;
        }
        if let Some(address) = self.address {
            patient.address = address;
        }
        if let Some(emergency_contact) = self.emergency_contact {
            patient.emergency_contact = emergency_contact;
        }
    }
}
