use serde::{Deserialize, Serialize};

/// Aggregates for the admin dashboard. Computed on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    pub total_appointments: usize,
    pub completed_treatments: usize,
    pub pending_treatments: usize,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
}

/// Per-patient overview shown on the patient dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub upcoming_appointments: usize,
    pub completed_treatments: usize,
    pub total_spent: f64,
}
