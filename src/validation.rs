//! Form validation for patient registration, profile edits and incidents.
//!
//! Validation never fails hard: every problem is collected per field so
//! the form can show all messages inline at once.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FileAttachment, IncidentStatus, IncidentUpdate, NewIncident, NewPatient, PatientUpdate};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

const CONTACT_DIGITS: usize = 10;

/// Per-field messages, keyed by the camelCase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

// ═══════════════════════════════════════════
// Raw form input, strings as typed by the user
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientForm {
    pub name: String,
    pub dob: String,
    pub contact: String,
    pub health_info: String,
    pub email: String,
    pub address: String,
    pub emergency_contact: String,
}

/// Patient self-service profile edit (no date of birth).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub name: String,
    pub contact: String,
    pub health_info: String,
    pub email: String,
    pub address: String,
    pub emergency_contact: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncidentForm {
    pub patient_id: String,
    pub title: String,
    pub description: String,
    pub comments: String,
    pub appointment_date: String,
    pub cost: String,
    pub treatment: String,
    pub status: String,
    pub next_appointment_date: String,
    pub files: Vec<FileAttachment>,
}

impl IncidentForm {
    pub fn add_file(&mut self, file: FileAttachment) {
        self.files.push(file);
    }

    /// Drop the file at `index` before saving. Out-of-range is ignored.
    pub fn remove_file(&mut self, index: usize) -> Option<FileAttachment> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }
}

// ═══════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════

pub fn validate_patient_form(form: &PatientForm) -> Result<NewPatient, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_name(&form.name, &mut errors);
    let dob = if form.dob.trim().is_empty() {
        errors.add("dob", "Date of birth is required");
        None
    } else {
        let parsed = NaiveDate::parse_from_str(form.dob.trim(), "%Y-%m-%d").ok();
        if parsed.is_none() {
            errors.add("dob", "Please enter a valid date");
        }
        parsed
    };
    check_contact(&form.contact, &mut errors);
    check_email(&form.email, &mut errors);
    check_health_info(&form.health_info, &mut errors);

    match dob {
        Some(dob) => errors.into_result(|| NewPatient {
            name: form.name.trim().to_string(),
            dob,
            contact: form.contact.trim().to_string(),
            health_info: form.health_info.trim().to_string(),
            email: optional(&form.email),
            address: optional(&form.address),
            emergency_contact: optional(&form.emergency_contact),
        }),
        None => Err(errors),
    }
}

pub fn validate_profile_form(form: &ProfileForm) -> Result<PatientUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_name(&form.name, &mut errors);
    check_contact(&form.contact, &mut errors);
    check_email(&form.email, &mut errors);
    check_health_info(&form.health_info, &mut errors);

    errors.into_result(|| PatientUpdate {
        name: Some(form.name.trim().to_string()),
        contact: Some(form.contact.trim().to_string()),
        health_info: Some(form.health_info.trim().to_string()),
        email: Some(optional(&form.email)),
        address: Some(optional(&form.address)),
        emergency_contact: Some(optional(&form.emergency_contact)),
        ..Default::default()
    })
}

pub fn validate_incident_form(form: &IncidentForm) -> Result<NewIncident, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if form.patient_id.trim().is_empty() {
        errors.add("patientId", "Please select a patient");
    }
    if form.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if form.description.trim().is_empty() {
        errors.add("description", "Description is required");
    }

    let appointment_date = if form.appointment_date.trim().is_empty() {
        errors.add("appointmentDate", "Appointment date is required");
        None
    } else {
        let parsed = parse_datetime_input(&form.appointment_date);
        if parsed.is_none() {
            errors.add("appointmentDate", "Please enter a valid date and time");
        }
        parsed
    };

    let cost = match form.cost.trim() {
        "" => None,
        raw => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
            Ok(value) if value.is_finite() => {
                errors.add("cost", "Cost cannot be negative");
                None
            }
            _ => {
                errors.add("cost", "Cost must be a valid number");
                None
            }
        },
    };

    let next_appointment_date = match form.next_appointment_date.trim() {
        "" => None,
        raw => {
            let parsed = parse_datetime_input(raw);
            if parsed.is_none() {
                errors.add("nextAppointmentDate", "Please enter a valid date and time");
            }
            parsed
        }
    };

    let status = match form.status.trim() {
        "" => IncidentStatus::default(),
        raw => raw.parse().unwrap_or_else(|_| {
            errors.add("status", "Unknown status");
            IncidentStatus::default()
        }),
    };

    match appointment_date {
        Some(appointment_date) => errors.into_result(|| NewIncident {
            patient_id: form.patient_id.trim().to_string(),
            title: form.title.trim().to_string(),
            description: form.description.trim().to_string(),
            comments: form.comments.trim().to_string(),
            appointment_date,
            cost,
            treatment: optional(&form.treatment),
            status,
            next_appointment_date,
            files: form.files.clone(),
        }),
        None => Err(errors),
    }
}

/// Full replacement of a patient's editable fields from a validated form.
pub fn patient_update_from(fields: NewPatient) -> PatientUpdate {
    PatientUpdate {
        name: Some(fields.name),
        dob: Some(fields.dob),
        contact: Some(fields.contact),
        health_info: Some(fields.health_info),
        email: Some(fields.email),
        address: Some(fields.address),
        emergency_contact: Some(fields.emergency_contact),
    }
}

/// Full replacement of an incident's editable fields from a validated form.
pub fn incident_update_from(fields: NewIncident) -> IncidentUpdate {
    IncidentUpdate {
        patient_id: Some(fields.patient_id),
        title: Some(fields.title),
        description: Some(fields.description),
        comments: Some(fields.comments),
        appointment_date: Some(fields.appointment_date),
        cost: Some(fields.cost),
        treatment: Some(fields.treatment),
        status: Some(fields.status),
        next_appointment_date: Some(fields.next_appointment_date),
        files: Some(fields.files),
    }
}

/// Accepts `YYYY-MM-DDTHH:MM` (datetime-local input) with optional seconds.
pub fn parse_datetime_input(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn check_name(name: &str, errors: &mut ValidationErrors) {
    if name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
}

fn check_contact(contact: &str, errors: &mut ValidationErrors) {
    if contact.trim().is_empty() {
        errors.add("contact", "Contact number is required");
    } else if NON_DIGIT.replace_all(contact, "").len() != CONTACT_DIGITS {
        errors.add("contact", "Please enter a valid 10-digit phone number");
    }
}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    let email = email.trim();
    if !email.is_empty() && !EMAIL_PATTERN.is_match(email) {
        errors.add("email", "Please enter a valid email address");
    }
}

fn check_health_info(info: &str, errors: &mut ValidationErrors) {
    if info.trim().is_empty() {
        errors.add("healthInfo", "Health information is required");
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_patient() -> PatientForm {
        PatientForm {
            name: "Ana Lopez".into(),
            dob: "1990-05-10".into(),
            contact: "(123) 456-7890".into(),
            health_info: "No allergies".into(),
            email: "ana@example.com".into(),
            address: "  ".into(),
            emergency_contact: String::new(),
        }
    }

    fn valid_incident() -> IncidentForm {
        IncidentForm {
            patient_id: "p1".into(),
            title: "Toothache".into(),
            description: "Upper molar pain".into(),
            appointment_date: "2025-01-15T10:00".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_patient_form_builds_new_patient() {
        let patient = validate_patient_form(&valid_patient()).unwrap();
        assert_eq!(patient.dob, NaiveDate::from_ymd_opt(1990, 5, 10).unwrap());
        assert_eq!(patient.email.as_deref(), Some("ana@example.com"));
        assert!(patient.address.is_none());
        assert!(patient.emergency_contact.is_none());
    }

    #[test]
    fn empty_patient_form_reports_every_required_field() {
        let errors = validate_patient_form(&PatientForm::default()).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["contact", "dob", "healthInfo", "name"]);
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn contact_needs_ten_digits() {
        let mut form = valid_patient();
        form.contact = "12345".into();
        let errors = validate_patient_form(&form).unwrap_err();
        assert_eq!(
            errors.get("contact"),
            Some("Please enter a valid 10-digit phone number")
        );

        form.contact = "123-456-78901".into();
        assert!(validate_patient_form(&form).is_err());
    }

    #[test]
    fn malformed_email_rejected() {
        for bad in ["ana", "ana@", "ana@example", "a na@example.com"] {
            let mut form = valid_patient();
            form.email = bad.into();
            let errors = validate_patient_form(&form).unwrap_err();
            assert!(errors.get("email").is_some(), "accepted {bad}");
        }
    }

    #[test]
    fn bad_dob_rejected() {
        let mut form = valid_patient();
        form.dob = "10/05/1990".into();
        let errors = validate_patient_form(&form).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("dob").is_some());
    }

    #[test]
    fn profile_form_clears_blank_optionals() {
        let form = ProfileForm {
            name: "Jane Smith".into(),
            contact: "2345678901".into(),
            health_info: "Allergic to penicillin".into(),
            ..Default::default()
        };
        let update = validate_profile_form(&form).unwrap();
        assert_eq!(update.email, Some(None));
        assert!(update.dob.is_none());
    }

    #[test]
    fn valid_incident_form_defaults() {
        let incident = validate_incident_form(&valid_incident()).unwrap();
        assert_eq!(incident.status, IncidentStatus::Scheduled);
        assert!(incident.cost.is_none());
        assert!(incident.treatment.is_none());
        assert_eq!(
            incident.appointment_date,
            parse_datetime_input("2025-01-15T10:00:00").unwrap()
        );
    }

    #[test]
    fn empty_incident_form_reports_required_fields() {
        let errors = validate_incident_form(&IncidentForm::default()).unwrap_err();
        for field in ["patientId", "title", "description", "appointmentDate"] {
            assert!(errors.get(field).is_some(), "missing error for {field}");
        }
    }

    #[test]
    fn incident_cost_must_be_non_negative_number() {
        let mut form = valid_incident();
        form.cost = "abc".into();
        assert_eq!(
            validate_incident_form(&form).unwrap_err().get("cost"),
            Some("Cost must be a valid number")
        );

        form.cost = "-5".into();
        assert_eq!(
            validate_incident_form(&form).unwrap_err().get("cost"),
            Some("Cost cannot be negative")
        );

        form.cost = "NaN".into();
        assert!(validate_incident_form(&form).is_err());

        form.cost = "120.50".into();
        assert_eq!(validate_incident_form(&form).unwrap().cost, Some(120.5));
    }

    #[test]
    fn incident_status_parsed_from_label() {
        let mut form = valid_incident();
        form.status = "In Progress".into();
        assert_eq!(
            validate_incident_form(&form).unwrap().status,
            IncidentStatus::InProgress
        );

        form.status = "Done".into();
        assert!(validate_incident_form(&form).unwrap_err().get("status").is_some());
    }

    #[test]
    fn datetime_input_formats() {
        assert!(parse_datetime_input("2025-01-15T10:00").is_some());
        assert!(parse_datetime_input("2025-01-15T10:00:30").is_some());
        assert!(parse_datetime_input("2025-01-15 10:00").is_some());
        assert!(parse_datetime_input("2025-01-15").is_none());
        assert!(parse_datetime_input("tomorrow").is_none());
    }

    #[test]
    fn form_file_list_editing() {
        let mut form = valid_incident();
        let file = crate::attachment::encode_attachment("note.txt", b"hello", None);
        form.add_file(file.clone());
        form.add_file(file);
        assert!(form.remove_file(5).is_none());
        assert!(form.remove_file(0).is_some());
        assert_eq!(validate_incident_form(&form).unwrap().files.len(), 1);
    }

    #[test]
    fn update_from_form_replaces_all_fields() {
        let fields = validate_incident_form(&valid_incident()).unwrap();
        let update = incident_update_from(fields);
        assert_eq!(update.cost, Some(None));
        assert_eq!(update.next_appointment_date, Some(None));
        assert_eq!(update.status, Some(IncidentStatus::Scheduled));
    }
}
