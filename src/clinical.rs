//! Clinical data store: patients and their incidents (appointments and
//! treatments), mirrored to local storage.
//!
//! Every mutation builds the next collection, persists it, and only then
//! replaces the in-memory copy, so a storage failure leaves the store
//! exactly as it was. Deleting a patient removes that patient's incidents
//! in the same atomic write.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{INCIDENTS_KEY, PATIENTS_KEY};
use crate::db::{load_json, save_json, to_json, DatabaseError, KeyValueStore};
use crate::models::{
    DashboardStats, Incident, IncidentStatus, IncidentUpdate, NewIncident, NewPatient, Patient,
    PatientUpdate,
};
use crate::seed;

/// Result of a patient delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub patient_removed: bool,
    pub incidents_removed: usize,
}

pub struct ClinicalStore {
    storage: Arc<dyn KeyValueStore>,
    patients: Vec<Patient>,
    incidents: Vec<Incident>,
}

impl ClinicalStore {
    /// Load both collections, writing the seed dataset for any that is absent.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Result<Self, DatabaseError> {
        let patients = match load_json::<Vec<Patient>>(storage.as_ref(), PATIENTS_KEY)? {
            Some(patients) => patients,
            None => {
                let patients = seed::seed_patients()?;
                save_json(storage.as_ref(), PATIENTS_KEY, &patients)?;
                tracing::info!(count = patients.len(), "Seeded patient collection");
                patients
            }
        };

        let incidents = match load_json::<Vec<Incident>>(storage.as_ref(), INCIDENTS_KEY)? {
            Some(incidents) => incidents,
            None => {
                let incidents = seed::seed_incidents()?;
                save_json(storage.as_ref(), INCIDENTS_KEY, &incidents)?;
                tracing::info!(count = incidents.len(), "Seeded incident collection");
                incidents
            }
        };

        Ok(Self {
            storage,
            patients,
            incidents,
        })
    }

    // ── Reads ───────────────────────────────────────────────

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn incident(&self, id: &str) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    /// All incidents for `patient_id`, in store order.
    pub fn incidents_for_patient(&self, patient_id: &str) -> Vec<&Incident> {
        self.incidents
            .iter()
            .filter(|i| i.patient_id == patient_id)
            .collect()
    }

    /// Most recently registered patients first.
    pub fn recent_patients(&self, limit: usize) -> Vec<&Patient> {
        let mut recent: Vec<&Patient> = self.patients.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        recent
    }

    /// Sum of cost over the patient's completed incidents.
    pub fn patient_spend(&self, patient_id: &str) -> f64 {
        self.incidents
            .iter()
            .filter(|i| i.patient_id == patient_id && i.is_completed())
            .map(Incident::cost_or_zero)
            .sum()
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        self.dashboard_stats_at(Local::now().naive_local())
    }

    pub fn dashboard_stats_at(&self, now: NaiveDateTime) -> DashboardStats {
        compute_dashboard_stats(&self.patients, &self.incidents, now)
    }

    // ── Patient mutations ───────────────────────────────────

    /// Register a patient. Returns the assigned id.
    pub fn create_patient(&mut self, fields: NewPatient) -> Result<String, DatabaseError> {
        let id = new_id(|candidate| self.patients.iter().any(|p| p.id == candidate));
        let patient = fields.into_patient(id.clone(), Utc::now());

        let mut next = self.patients.clone();
        next.push(patient);
        self.commit_patients(next)?;

        tracing::info!(patient_id = %id, "Patient created");
        Ok(id)
    }

    /// Merge `update` into the patient and refresh `updated_at`.
    /// Returns `false` (and writes nothing) when the id is unknown.
    pub fn update_patient(&mut self, id: &str, update: PatientUpdate) -> Result<bool, DatabaseError> {
        let Some(pos) = self.patients.iter().position(|p| p.id == id) else {
            tracing::debug!(patient_id = %id, "Update skipped: patient not found");
            return Ok(false);
        };

        let mut next = self.patients.clone();
        let patient = &mut next[pos];
        update.apply_to(patient);
        patient.updated_at = touch(patient.updated_at);
        self.commit_patients(next)?;

        tracing::debug!(patient_id = %id, "Patient updated");
        Ok(true)
    }

    /// Remove the patient and every incident that references it.
    pub fn delete_patient(&mut self, id: &str) -> Result<DeleteSummary, DatabaseError> {
        let patients: Vec<Patient> = self.patients.iter().filter(|p| p.id != id).cloned().collect();
        let incidents: Vec<Incident> = self
            .incidents
            .iter()
            .filter(|i| i.patient_id != id)
            .cloned()
            .collect();

        let summary = DeleteSummary {
            patient_removed: patients.len() != self.patients.len(),
            incidents_removed: self.incidents.len() - incidents.len(),
        };
        if summary == DeleteSummary::default() {
            tracing::debug!(patient_id = %id, "Delete skipped: patient not found");
            return Ok(summary);
        }

        self.storage.set_many(&[
            (PATIENTS_KEY, to_json(PATIENTS_KEY, &patients)?),
            (INCIDENTS_KEY, to_json(INCIDENTS_KEY, &incidents)?),
        ])?;
        self.patients = patients;
        self.incidents = incidents;

        tracing::info!(
            patient_id = %id,
            incidents_removed = summary.incidents_removed,
            "Patient deleted"
        );
        Ok(summary)
    }

    // ── Incident mutations ──────────────────────────────────

    /// Record an incident. The patient reference is not checked here.
    pub fn create_incident(&mut self, fields: NewIncident) -> Result<String, DatabaseError> {
        check_cost(fields.cost)?;
        let id = new_id(|candidate| self.incidents.iter().any(|i| i.id == candidate));
        let incident = fields.into_incident(id.clone(), Utc::now());
        let patient_id = incident.patient_id.clone();

        let mut next = self.incidents.clone();
        next.push(incident);
        self.commit_incidents(next)?;

        tracing::info!(incident_id = %id, patient_id = %patient_id, "Incident created");
        Ok(id)
    }

    pub fn update_incident(
        &mut self,
        id: &str,
        update: IncidentUpdate,
    ) -> Result<bool, DatabaseError> {
        if let Some(cost) = update.cost {
            check_cost(cost)?;
        }
        let Some(pos) = self.incidents.iter().position(|i| i.id == id) else {
            tracing::debug!(incident_id = %id, "Update skipped: incident not found");
            return Ok(false);
        };

        let mut next = self.incidents.clone();
        let incident = &mut next[pos];
        update.apply_to(incident);
        incident.updated_at = touch(incident.updated_at);
        self.commit_incidents(next)?;

        tracing::debug!(incident_id = %id, "Incident updated");
        Ok(true)
    }

    pub fn delete_incident(&mut self, id: &str) -> Result<bool, DatabaseError> {
        if !self.incidents.iter().any(|i| i.id == id) {
            tracing::debug!(incident_id = %id, "Delete skipped: incident not found");
            return Ok(false);
        }

        let next: Vec<Incident> = self.incidents.iter().filter(|i| i.id != id).cloned().collect();
        self.commit_incidents(next)?;

        tracing::info!(incident_id = %id, "Incident deleted");
        Ok(true)
    }

    // ── Persistence ─────────────────────────────────────────

    fn commit_patients(&mut self, next: Vec<Patient>) -> Result<(), DatabaseError> {
        save_json(self.storage.as_ref(), PATIENTS_KEY, &next)?;
        self.patients = next;
        Ok(())
    }

    fn commit_incidents(&mut self, next: Vec<Incident>) -> Result<(), DatabaseError> {
        save_json(self.storage.as_ref(), INCIDENTS_KEY, &next)?;
        self.incidents = next;
        Ok(())
    }
}

/// Dashboard aggregates over the given collections. `monthly_revenue`
/// counts completed incidents whose appointment falls in the calendar
/// month and year of `now`.
pub fn compute_dashboard_stats(
    patients: &[Patient],
    incidents: &[Incident],
    now: NaiveDateTime,
) -> DashboardStats {
    let completed = incidents.iter().filter(|i| i.is_completed()).count();
    let total_revenue = incidents.iter().map(Incident::cost_or_zero).sum();
    let monthly_revenue = incidents
        .iter()
        .filter(|i| {
            i.status == IncidentStatus::Completed
                && i.appointment_date.month() == now.month()
                && i.appointment_date.year() == now.year()
        })
        .map(Incident::cost_or_zero)
        .sum();

    DashboardStats {
        total_patients: patients.len(),
        total_appointments: incidents.len(),
        completed_treatments: completed,
        pending_treatments: incidents.len() - completed,
        total_revenue,
        monthly_revenue,
    }
}

/// Cost must be a finite, non-negative amount. NaN would not survive a
/// JSON round trip.
fn check_cost(cost: Option<f64>) -> Result<(), DatabaseError> {
    match cost {
        Some(value) if !value.is_finite() || value < 0.0 => Err(DatabaseError::InvalidField {
            field: "cost".to_string(),
            reason: format!("{value} is not a non-negative amount"),
        }),
        _ => Ok(()),
    }
}

/// Random UUID, regenerated if it collides with an existing id.
fn new_id(exists: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !exists(&id) {
            return id;
        }
    }
}

/// Next `updated_at` stamp, strictly after `previous`.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::{Months, NaiveDate};

    use crate::db::{MemoryStorage, SqliteStorage};

    fn empty_store() -> (Arc<MemoryStorage>, ClinicalStore) {
        let storage = Arc::new(MemoryStorage::new());
        save_json(storage.as_ref(), PATIENTS_KEY, &Vec::<Patient>::new()).unwrap();
        save_json(storage.as_ref(), INCIDENTS_KEY, &Vec::<Incident>::new()).unwrap();
        let store = ClinicalStore::open(storage.clone()).unwrap();
        (storage, store)
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            dob: NaiveDate::from_ymd_opt(1990, 5, 10).unwrap(),
            contact: "1234567890".into(),
            health_info: "No allergies".into(),
            email: None,
            address: None,
            emergency_contact: None,
        }
    }

    fn new_incident(patient_id: &str, date: NaiveDateTime, cost: Option<f64>) -> NewIncident {
        NewIncident {
            patient_id: patient_id.into(),
            title: "Checkup".into(),
            description: "Routine examination".into(),
            comments: String::new(),
            appointment_date: date,
            cost,
            treatment: None,
            status: IncidentStatus::Scheduled,
            next_appointment_date: None,
            files: vec![],
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn persisted_patients(storage: &MemoryStorage) -> Vec<Patient> {
        load_json(storage, PATIENTS_KEY).unwrap().unwrap()
    }

    fn persisted_incidents(storage: &MemoryStorage) -> Vec<Incident> {
        load_json(storage, INCIDENTS_KEY).unwrap().unwrap()
    }

    // ───────────────────────────────────────
    // Loading
    // ───────────────────────────────────────

    #[test]
    fn first_open_writes_seed_dataset() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClinicalStore::open(storage.clone()).unwrap();
        assert_eq!(store.patients().len(), 7);
        assert_eq!(store.incidents().len(), 14);
        assert_eq!(persisted_patients(&storage).len(), 7);
        assert_eq!(persisted_incidents(&storage).len(), 14);
    }

    #[test]
    fn existing_empty_collections_not_reseeded() {
        let (_, store) = empty_store();
        assert!(store.patients().is_empty());
        assert!(store.incidents().is_empty());
    }

    #[test]
    fn malformed_collection_is_an_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(PATIENTS_KEY, "{broken").unwrap();
        assert!(ClinicalStore::open(storage).is_err());
    }

    #[test]
    fn state_survives_reopen_on_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");
        let id = {
            let storage = Arc::new(SqliteStorage::open(&path).unwrap());
            let mut store = ClinicalStore::open(storage).unwrap();
            store.create_patient(new_patient("Ana Lopez")).unwrap()
        };
        let storage = Arc::new(SqliteStorage::open(&path).unwrap());
        let store = ClinicalStore::open(storage).unwrap();
        assert_eq!(store.patients().len(), 8);
        assert_eq!(store.patient(&id).unwrap().name, "Ana Lopez");
    }

    // ───────────────────────────────────────
    // Patients
    // ───────────────────────────────────────

    #[test]
    fn create_patient_stamps_and_persists() {
        let (storage, mut store) = empty_store();
        let id = store.create_patient(new_patient("Ana Lopez")).unwrap();

        assert_eq!(store.patients().len(), 1);
        let patient = store.patient(&id).unwrap();
        assert_eq!(patient.created_at, patient.updated_at);
        assert_eq!(persisted_patients(&storage), store.patients());
    }

    #[test]
    fn created_ids_are_unique() {
        let (_, mut store) = empty_store();
        let ids: HashSet<String> = (0..50)
            .map(|n| store.create_patient(new_patient(&format!("P{n}"))).unwrap())
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn update_patient_merges_fields() {
        let (storage, mut store) = empty_store();
        let id = store.create_patient(new_patient("Ana Lopez")).unwrap();
        let updated = store
            .update_patient(
                &id,
                PatientUpdate {
                    contact: Some("5550001111".into()),
                    email: Some(Some("ana@example.com".into())),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated);

        let patient = store.patient(&id).unwrap();
        assert_eq!(patient.name, "Ana Lopez");
        assert_eq!(patient.contact, "5550001111");
        assert_eq!(patient.email.as_deref(), Some("ana@example.com"));
        assert!(patient.updated_at > patient.created_at);
        assert_eq!(persisted_patients(&storage), store.patients());
    }

    #[test]
    fn empty_update_only_touches_updated_at() {
        let (_, mut store) = empty_store();
        let id = store.create_patient(new_patient("Ana Lopez")).unwrap();
        let before = store.patient(&id).unwrap().clone();

        store.update_patient(&id, PatientUpdate::default()).unwrap();

        let after = store.patient(&id).unwrap().clone();
        assert!(after.updated_at > before.updated_at);
        assert_eq!(
            Patient {
                updated_at: before.updated_at,
                ..after
            },
            before
        );
    }

    #[test]
    fn update_unknown_patient_is_silent_noop() {
        let (storage, mut store) = empty_store();
        store.create_patient(new_patient("Ana Lopez")).unwrap();
        let snapshot = storage.get(PATIENTS_KEY).unwrap();

        let updated = store
            .update_patient("missing", PatientUpdate::default())
            .unwrap();
        assert!(!updated);
        assert_eq!(storage.get(PATIENTS_KEY).unwrap(), snapshot);
    }

    #[test]
    fn delete_patient_cascades_incidents() {
        let (storage, mut store) = empty_store();
        let keep = store.create_patient(new_patient("Keep")).unwrap();
        let gone = store.create_patient(new_patient("Gone")).unwrap();
        store.create_incident(new_incident(&gone, at(2025, 1, 1, 9), None)).unwrap();
        store.create_incident(new_incident(&gone, at(2025, 2, 1, 9), None)).unwrap();
        store.create_incident(new_incident(&keep, at(2025, 3, 1, 9), None)).unwrap();

        let summary = store.delete_patient(&gone).unwrap();
        assert!(summary.patient_removed);
        assert_eq!(summary.incidents_removed, 2);

        assert!(store.patient(&gone).is_none());
        assert!(store.incidents().iter().all(|i| i.patient_id != gone));
        assert_eq!(store.incidents().len(), 1);
        assert!(persisted_patients(&storage).iter().all(|p| p.id != gone));
        assert!(persisted_incidents(&storage).iter().all(|i| i.patient_id != gone));
    }

    #[test]
    fn delete_unknown_patient_is_noop() {
        let (_, mut store) = empty_store();
        store.create_patient(new_patient("Ana")).unwrap();
        let summary = store.delete_patient("missing").unwrap();
        assert_eq!(summary, DeleteSummary::default());
        assert_eq!(store.patients().len(), 1);
    }

    #[test]
    fn recent_patients_newest_first() {
        let (_, mut store) = empty_store();
        let first = store.create_patient(new_patient("First")).unwrap();
        let second = store.create_patient(new_patient("Second")).unwrap();
        // Force a distinct, older creation time for the first patient
        store.patients[0].created_at = store.patients[1].created_at - Duration::days(1);

        let recent = store.recent_patients(5);
        assert_eq!(recent[0].id, second);
        assert_eq!(recent[1].id, first);
        assert_eq!(store.recent_patients(1).len(), 1);
    }

    // ───────────────────────────────────────
    // Incidents
    // ───────────────────────────────────────

    #[test]
    fn incident_lifecycle() {
        let (storage, mut store) = empty_store();
        let pid = store.create_patient(new_patient("Ana")).unwrap();
        let iid = store.create_incident(new_incident(&pid, at(2025, 1, 1, 9), Some(80.0))).unwrap();

        let incident = store.incident(&iid).unwrap();
        assert_eq!(incident.created_at, incident.updated_at);
        assert_eq!(incident.status, IncidentStatus::Scheduled);

        assert!(store
            .update_incident(&iid, IncidentUpdate::status(IncidentStatus::Completed))
            .unwrap());
        assert_eq!(store.incident(&iid).unwrap().status, IncidentStatus::Completed);
        assert_eq!(persisted_incidents(&storage), store.incidents());

        assert!(store.delete_incident(&iid).unwrap());
        assert!(store.incident(&iid).is_none());
        assert!(!store.delete_incident(&iid).unwrap());
        assert!(persisted_incidents(&storage).is_empty());
        // Patient is unaffected by incident delete
        assert!(store.patient(&pid).is_some());
    }

    #[test]
    fn update_unknown_incident_is_silent_noop() {
        let (_, mut store) = empty_store();
        assert!(!store
            .update_incident("missing", IncidentUpdate::default())
            .unwrap());
    }

    #[test]
    fn incidents_for_patient_in_store_order() {
        let (_, mut store) = empty_store();
        let a = store.create_patient(new_patient("A")).unwrap();
        let b = store.create_patient(new_patient("B")).unwrap();
        let late = store.create_incident(new_incident(&a, at(2025, 6, 1, 9), None)).unwrap();
        store.create_incident(new_incident(&b, at(2025, 3, 1, 9), None)).unwrap();
        let early = store.create_incident(new_incident(&a, at(2025, 1, 1, 9), None)).unwrap();

        let ids: Vec<&str> = store
            .incidents_for_patient(&a)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec![late.as_str(), early.as_str()]);
        assert!(store.incidents_for_patient("nobody").is_empty());
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        struct ReadOnly(MemoryStorage);
        impl KeyValueStore for ReadOnly {
            fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
                self.0.get(key)
            }
            fn set(&self, _: &str, _: &str) -> Result<(), DatabaseError> {
                Err(DatabaseError::Io(std::io::Error::other("quota exceeded")))
            }
            fn remove(&self, _: &str) -> Result<(), DatabaseError> {
                Err(DatabaseError::Io(std::io::Error::other("quota exceeded")))
            }
            fn set_many(&self, _: &[(&str, String)]) -> Result<(), DatabaseError> {
                Err(DatabaseError::Io(std::io::Error::other("quota exceeded")))
            }
        }

        let inner = MemoryStorage::new();
        save_json(&inner, PATIENTS_KEY, &seed::seed_patients().unwrap()).unwrap();
        save_json(&inner, INCIDENTS_KEY, &seed::seed_incidents().unwrap()).unwrap();
        let mut store = ClinicalStore::open(Arc::new(ReadOnly(inner))).unwrap();

        assert!(store.create_patient(new_patient("Ana")).is_err());
        assert_eq!(store.patients().len(), 7);

        assert!(store.delete_patient("p1").is_err());
        assert!(store.patient("p1").is_some());
        assert_eq!(store.incidents().len(), 14);

        assert!(store
            .update_incident("i2", IncidentUpdate::status(IncidentStatus::Completed))
            .is_err());
        assert_eq!(store.incident("i2").unwrap().status, IncidentStatus::Scheduled);
    }

    // ───────────────────────────────────────
    // Dashboard stats
    // ───────────────────────────────────────

    #[test]
    fn stats_on_empty_collections() {
        let stats = compute_dashboard_stats(&[], &[], at(2025, 1, 15, 12));
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn monthly_revenue_counts_only_completed_this_month() {
        let (_, mut store) = empty_store();
        let pid = store.create_patient(new_patient("Ana")).unwrap();
        let now = at(2025, 3, 15, 12);
        let last_month = now.checked_sub_months(Months::new(1)).unwrap();

        let this_month_done = store.create_incident(new_incident(&pid, at(2025, 3, 2, 9), Some(100.0))).unwrap();
        let last_month_done = store.create_incident(new_incident(&pid, last_month, Some(50.0))).unwrap();
        for id in [&this_month_done, &last_month_done] {
            store
                .update_incident(id, IncidentUpdate::status(IncidentStatus::Completed))
                .unwrap();
        }

        let stats = store.dashboard_stats_at(now);
        assert_eq!(stats.monthly_revenue, 100.0);
        assert_eq!(stats.total_revenue, 150.0);
        assert_eq!(stats.completed_treatments, 2);
        assert_eq!(stats.pending_treatments, 0);
    }

    #[test]
    fn same_month_previous_year_excluded() {
        let (_, mut store) = empty_store();
        let pid = store.create_patient(new_patient("Ana")).unwrap();
        let id = store.create_incident(new_incident(&pid, at(2024, 3, 2, 9), Some(70.0))).unwrap();
        store
            .update_incident(&id, IncidentUpdate::status(IncidentStatus::Completed))
            .unwrap();
        assert_eq!(store.dashboard_stats_at(at(2025, 3, 15, 12)).monthly_revenue, 0.0);
    }

    #[test]
    fn total_revenue_treats_missing_cost_as_zero() {
        let (_, mut store) = empty_store();
        let pid = store.create_patient(new_patient("Ana")).unwrap();
        store.create_incident(new_incident(&pid, at(2025, 1, 1, 9), Some(80.0))).unwrap();
        store.create_incident(new_incident(&pid, at(2025, 1, 2, 9), None)).unwrap();
        store.create_incident(new_incident(&pid, at(2025, 1, 3, 9), Some(45.5))).unwrap();

        let stats = store.dashboard_stats_at(at(2025, 1, 15, 12));
        assert_eq!(stats.total_patients, 1);
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.total_revenue, 125.5);
        // Scheduled incidents are pending and excluded from monthly revenue
        assert_eq!(stats.pending_treatments, 3);
        assert_eq!(stats.monthly_revenue, 0.0);
    }

    #[test]
    fn invalid_cost_rejected_on_create_and_update() {
        let (storage, mut store) = empty_store();
        let pid = store.create_patient(new_patient("Ana")).unwrap();
        for cost in [f64::NAN, f64::INFINITY, -50.0] {
            let result = store.create_incident(new_incident(&pid, at(2025, 1, 1, 9), Some(cost)));
            assert!(matches!(result, Err(DatabaseError::InvalidField { .. })));
        }
        assert!(store.incidents().is_empty());

        let id = store
            .create_incident(new_incident(&pid, at(2025, 1, 1, 9), Some(0.0)))
            .unwrap();
        let persisted = storage.get(INCIDENTS_KEY).unwrap();
        for cost in [f64::NAN, -50.0] {
            let update = IncidentUpdate {
                cost: Some(Some(cost)),
                status: Some(IncidentStatus::Completed),
                ..Default::default()
            };
            assert!(matches!(
                store.update_incident(&id, update),
                Err(DatabaseError::InvalidField { .. })
            ));
        }

        assert_eq!(store.incident(&id).unwrap().cost, Some(0.0));
        assert_eq!(storage.get(INCIDENTS_KEY).unwrap(), persisted);
        assert_eq!(store.dashboard_stats_at(at(2025, 1, 15, 12)).total_revenue, 0.0);
    }

    #[test]
    fn seed_dataset_stats() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClinicalStore::open(storage).unwrap();
        let stats = store.dashboard_stats_at(at(2025, 1, 31, 12));
        assert_eq!(stats.total_patients, 7);
        assert_eq!(stats.total_appointments, 14);
        assert_eq!(stats.completed_treatments, 8);
        assert_eq!(stats.pending_treatments, 6);
        assert_eq!(stats.total_revenue, 1195.0);
        // i1 (80) + i3 (120) + i4 (450) are completed in January 2025
        assert_eq!(stats.monthly_revenue, 650.0);
    }

    #[test]
    fn patient_spend_sums_completed_only() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClinicalStore::open(storage).unwrap();
        assert_eq!(store.patient_spend("p2"), 570.0);
        assert_eq!(store.patient_spend("p1"), 80.0);
        assert_eq!(store.patient_spend("nobody"), 0.0);
    }
}
