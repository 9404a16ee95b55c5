//! Application state shared by every screen.
//!
//! `CoreState` owns the identity and clinical stores over one storage
//! backend and gates each operation on the active session's role.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::authorization::{authorize, Action};
use crate::clinical::{ClinicalStore, DeleteSummary};
use crate::config;
use crate::db::{DatabaseError, KeyValueStore, MemoryStorage, SqliteStorage};
use crate::filters;
use crate::identity::{landing_view, IdentityConfig, IdentityError, IdentityStore, LandingView};
use crate::models::{
    DashboardStats, Incident, IncidentFilter, Patient, PatientFilter, PatientSummary, Role, User,
};
use crate::schedule::{self, MonthCursor, MonthGrid, DASHBOARD_UPCOMING_LIMIT};
use crate::validation::{
    incident_update_from, patient_update_from, validate_incident_form, validate_patient_form,
    validate_profile_form, IncidentForm, PatientForm, ProfileForm, ValidationErrors,
};

/// Recently registered patients on the admin dashboard.
const DASHBOARD_RECENT_PATIENTS: usize = 5;

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active session")]
    NoActiveSession,
    #[error("Not permitted: {0:?}")]
    Forbidden(Action),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

// ═══════════════════════════════════════════════════════════
// Views
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard<'a> {
    pub stats: DashboardStats,
    pub upcoming: Vec<&'a Incident>,
    pub recent_patients: Vec<&'a Patient>,
}

/// A patient's own overview. `patient` is `None` when the linked record
/// has been deleted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDashboard<'a> {
    pub patient: Option<&'a Patient>,
    pub summary: PatientSummary,
    pub upcoming: Vec<&'a Incident>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAppointments<'a> {
    pub upcoming: Vec<&'a Incident>,
    pub history: Vec<&'a Incident>,
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    identity: IdentityStore,
    clinical: ClinicalStore,
}

impl CoreState {
    /// Open (or create) the SQLite store at `path`.
    pub fn open(path: &Path, config: &IdentityConfig) -> Result<Self, CoreError> {
        let storage = SqliteStorage::open(path)?;
        Self::with_storage(Arc::new(storage), config)
    }

    /// Open the store at the default per-user location.
    pub fn open_default() -> Result<Self, CoreError> {
        Self::open(&config::database_path(), &IdentityConfig::default())
    }

    /// Non-persistent state, seeded fresh.
    pub fn in_memory(config: &IdentityConfig) -> Result<Self, CoreError> {
        Self::with_storage(Arc::new(MemoryStorage::new()), config)
    }

    pub fn with_storage(
        storage: Arc<dyn KeyValueStore>,
        config: &IdentityConfig,
    ) -> Result<Self, CoreError> {
        let identity = IdentityStore::open(Arc::clone(&storage), config)?;
        let clinical = ClinicalStore::open(storage)?;

        for user in identity.users().iter().filter(|u| u.role == Role::Patient) {
            if let Some(patient_id) = user.patient_id.as_deref() {
                if clinical.patient(patient_id).is_none() {
                    tracing::warn!(user_id = %user.id, patient_id, "User linked to missing patient");
                }
            }
        }

        tracing::info!(
            version = config::APP_VERSION,
            users = identity.users().len(),
            patients = clinical.patients().len(),
            incidents = clinical.incidents().len(),
            "State loaded"
        );
        Ok(Self { identity, clinical })
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn clinical(&self) -> &ClinicalStore {
        &self.clinical
    }

    // ── Session ─────────────────────────────────────────────

    /// Sign in. Returns the landing page on success, `None` on bad credentials.
    pub fn login(&mut self, email: &str, password: &str) -> Result<Option<LandingView>, CoreError> {
        let user = self.identity.authenticate(email, password)?;
        Ok(user.as_ref().map(landing_view))
    }

    pub fn logout(&mut self) -> Result<(), CoreError> {
        self.identity.end_session()?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.identity.current_session()
    }

    fn require(&self, action: Action, target_patient: Option<&str>) -> Result<&User, CoreError> {
        let user = self.identity.current_session().ok_or(CoreError::NoActiveSession)?;
        let decision = authorize(user, action, target_patient);
        if !decision.allowed {
            tracing::warn!(user_id = %user.id, ?action, "Access denied");
            return Err(CoreError::Forbidden(action));
        }
        Ok(user)
    }

    /// The signed-in user's own patient id.
    fn own_patient_id(&self, action: Action) -> Result<String, CoreError> {
        let user = self.identity.current_session().ok_or(CoreError::NoActiveSession)?;
        let patient_id = user
            .patient_id
            .clone()
            .ok_or(CoreError::Forbidden(action))?;
        self.require(action, Some(&patient_id))?;
        Ok(patient_id)
    }

    // ── Patients ────────────────────────────────────────────

    pub fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<&Patient>, CoreError> {
        self.require(Action::ViewAllPatients, None)?;
        Ok(filters::search_patients(self.clinical.patients(), filter))
    }

    pub fn register_patient(&mut self, form: &PatientForm) -> Result<String, CoreError> {
        self.require(Action::ManagePatients, None)?;
        let fields = validate_patient_form(form)?;
        Ok(self.clinical.create_patient(fields)?)
    }

    pub fn edit_patient(&mut self, id: &str, form: &PatientForm) -> Result<bool, CoreError> {
        self.require(Action::ManagePatients, Some(id))?;
        let update = patient_update_from(validate_patient_form(form)?);
        Ok(self.clinical.update_patient(id, update)?)
    }

    pub fn remove_patient(&mut self, id: &str) -> Result<DeleteSummary, CoreError> {
        self.require(Action::ManagePatients, Some(id))?;
        Ok(self.clinical.delete_patient(id)?)
    }

    /// Patient self-service edit of their own record.
    pub fn update_own_profile(&mut self, form: &ProfileForm) -> Result<bool, CoreError> {
        let patient_id = self.own_patient_id(Action::EditOwnProfile)?;
        let update = validate_profile_form(form)?;
        Ok(self.clinical.update_patient(&patient_id, update)?)
    }

    // ── Incidents ───────────────────────────────────────────

    pub fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<&Incident>, CoreError> {
        self.require(Action::ManageIncidents, None)?;
        Ok(filters::filter_incidents(
            self.clinical.incidents(),
            self.clinical.patients(),
            filter,
        ))
    }

    /// Rejects a `patientId` that names no registered patient.
    pub fn schedule_incident(&mut self, form: &IncidentForm) -> Result<String, CoreError> {
        self.require(Action::ManageIncidents, None)?;
        let fields = validate_incident_form(form)?;
        self.check_patient_exists(&fields.patient_id)?;
        Ok(self.clinical.create_incident(fields)?)
    }

    pub fn edit_incident(&mut self, id: &str, form: &IncidentForm) -> Result<bool, CoreError> {
        self.require(Action::ManageIncidents, None)?;
        let fields = validate_incident_form(form)?;
        self.check_patient_exists(&fields.patient_id)?;
        Ok(self.clinical.update_incident(id, incident_update_from(fields))?)
    }

    pub fn remove_incident(&mut self, id: &str) -> Result<bool, CoreError> {
        self.require(Action::ManageIncidents, None)?;
        Ok(self.clinical.delete_incident(id)?)
    }

    fn check_patient_exists(&self, patient_id: &str) -> Result<(), CoreError> {
        if self.clinical.patient(patient_id).is_some() {
            return Ok(());
        }
        let mut errors = ValidationErrors::new();
        errors.add("patientId", "Selected patient does not exist");
        Err(CoreError::Validation(errors))
    }

    // ── Views ───────────────────────────────────────────────

    pub fn admin_dashboard(&self, now: NaiveDateTime) -> Result<AdminDashboard<'_>, CoreError> {
        self.require(Action::ViewDashboard, None)?;
        Ok(AdminDashboard {
            stats: self.clinical.dashboard_stats_at(now),
            upcoming: schedule::upcoming_limited(
                self.clinical.incidents(),
                now,
                DASHBOARD_UPCOMING_LIMIT,
            ),
            recent_patients: self.clinical.recent_patients(DASHBOARD_RECENT_PATIENTS),
        })
    }

    pub fn patient_dashboard(&self, now: NaiveDateTime) -> Result<PatientDashboard<'_>, CoreError> {
        let patient_id = self.own_patient_id(Action::ViewOwnRecords)?;
        let own = self.clinical.incidents_for_patient(&patient_id);
        Ok(PatientDashboard {
            patient: self.clinical.patient(&patient_id),
            summary: schedule::patient_summary(own.iter().copied(), now),
            upcoming: schedule::upcoming(own, now),
        })
    }

    pub fn my_appointments(&self, now: NaiveDateTime) -> Result<MyAppointments<'_>, CoreError> {
        let patient_id = self.own_patient_id(Action::ViewOwnRecords)?;
        let own = self.clinical.incidents_for_patient(&patient_id);
        Ok(MyAppointments {
            upcoming: schedule::upcoming(own.iter().copied(), now),
            history: schedule::history(own, now),
        })
    }

    pub fn calendar(
        &self,
        cursor: MonthCursor,
        today: NaiveDate,
        selected: Option<NaiveDate>,
    ) -> Result<MonthGrid<'_>, CoreError> {
        self.require(Action::ViewCalendar, None)?;
        Ok(MonthGrid::build(self.clinical.incidents(), cursor, today, selected))
    }

    /// Every incident on `date`, for the calendar's day panel.
    pub fn day_schedule(&self, date: NaiveDate) -> Result<Vec<&Incident>, CoreError> {
        self.require(Action::ViewCalendar, None)?;
        Ok(schedule::incidents_on(self.clinical.incidents(), date))
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
