use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::IncidentStatus;

/// An appointment or treatment record tied to one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    pub patient_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub comments: String,
    /// Local wall-clock time of the appointment.
    pub appointment_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    pub status: IncidentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_appointment_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Cost with an absent value counted as zero.
    pub fn cost_or_zero(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }

    pub fn is_completed(&self) -> bool {
        self.status == IncidentStatus::Completed
    }
}

/// A file uploaded with an incident, stored inline as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    /// `data:<mime>;base64,<payload>`
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    pub patient_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub comments: String,
    pub appointment_date: NaiveDateTime,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub status: IncidentStatus,
    #[serde(default)]
    pub next_appointment_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

impl NewIncident {
    pub(crate) fn into_incident(self, id: String, now: DateTime<Utc>) -> Incident {
        Incident {
            id,
            patient_id: self.patient_id,
            title: self.title,
            description: self.description,
            comments: self.comments,
            appointment_date: self.appointment_date,
            cost: self.cost,
            treatment: self.treatment,
            status: self.status,
            next_appointment_date: self.next_appointment_date,
            files: self.files,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value. `files` replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncidentUpdate {
    pub patient_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub comments: Option<String>,
    pub appointment_date: Option<NaiveDateTime>,
    pub cost: Option<Option<f64>>,
    pub treatment: Option<Option<String>>,
    pub status: Option<IncidentStatus>,
    pub next_appointment_date: Option<Option<NaiveDateTime>>,
    pub files: Option<Vec<FileAttachment>>,
}

impl IncidentUpdate {
    /// Update that only changes the status.
    pub fn status(status: IncidentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply_to(self, incident: &mut Incident) {
        if let Some(patient_id) = self.patient_id {
            incident.patient_id = patient_id;
        }
        if let Some(title) = self.title {
            incident.title = title;
        }
        if let Some(description) = self.description {
            incident.description = description;
        }
        if let Some(comments) = self.comments {
            incident.comments = comments;
        }
        if let Some(date) = self.appointment_date {
            incident.appointment_date = date;
        }
        if let Some(cost) = self.cost {
            incident.cost = cost;
        }
        if let Some(treatment) = self.treatment {
            incident.treatment = treatment;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
        if let Some(next) = self.next_appointment_date {
            incident.next_appointment_date = next;
        }
        if let Some(files) = self.files {
            incident.files = files;
        }
    }
}
