use super::enums::IncidentStatus;

/// Free-text patient search (name, email, contact).
#[derive(Debug, Default, Clone)]
pub struct PatientFilter {
    pub term: String,
}

/// Incident list filter: free text over title, description and patient
/// name, plus an optional exact status.
#[derive(Debug, Default, Clone)]
pub struct IncidentFilter {
    pub term: String,
    pub status: Option<IncidentStatus>,
}
