//! List filtering for the patient and appointment screens.

use crate::models::{Incident, IncidentFilter, Patient, PatientFilter};

/// Case-insensitive match on name or email; contact matches as typed.
/// An empty term matches every patient.
pub fn search_patients<'a>(patients: &'a [Patient], filter: &PatientFilter) -> Vec<&'a Patient> {
    let needle = filter.term.to_lowercase();
    patients
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.contact.contains(&filter.term)
                || p
                    .email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Free-text match on title, description or the owning patient's name,
/// combined with an exact status match when one is set.
pub fn filter_incidents<'a>(
    incidents: &'a [Incident],
    patients: &[Patient],
    filter: &IncidentFilter,
) -> Vec<&'a Incident> {
    let needle = filter.term.to_lowercase();
    incidents
        .iter()
        .filter(|i| filter.status.map_or(true, |s| i.status == s))
        .filter(|i| {
            i.title.to_lowercase().contains(&needle)
                || i.description.to_lowercase().contains(&needle)
                || patients
                    .iter()
                    .find(|p| p.id == i.patient_id)
                    .is_some_and(|p| p.name.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncidentStatus;
    use crate::seed;

    fn names(list: &[&Patient]) -> Vec<String> {
        list.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn empty_term_matches_all() {
        let patients = seed::seed_patients().unwrap();
        let found = search_patients(&patients, &PatientFilter::default());
        assert_eq!(found.len(), patients.len());
    }

    #[test]
    fn patient_search_by_name_case_insensitive() {
        let patients = seed::seed_patients().unwrap();
        let found = search_patients(&patients, &PatientFilter { term: "jANE".into() });
        assert_eq!(names(&found), vec!["Jane Smith"]);
    }

    #[test]
    fn patient_search_by_contact_and_email() {
        let patients = seed::seed_patients().unwrap();
        let by_contact = search_patients(&patients, &PatientFilter { term: "3456789012".into() });
        assert_eq!(names(&by_contact), vec!["Mike Johnson"]);

        let by_email = search_patients(&patients, &PatientFilter { term: "ROBERT@".into() });
        assert_eq!(names(&by_email), vec!["Robert Miller"]);
    }

    #[test]
    fn incident_filter_by_patient_name_and_status() {
        let patients = seed::seed_patients().unwrap();
        let incidents = seed::seed_incidents().unwrap();

        let all_jane = filter_incidents(
            &incidents,
            &patients,
            &IncidentFilter { term: "jane".into(), status: None },
        );
        assert_eq!(all_jane.len(), 2);

        let scheduled = filter_incidents(
            &incidents,
            &patients,
            &IncidentFilter { term: String::new(), status: Some(IncidentStatus::Scheduled) },
        );
        assert_eq!(scheduled.len(), 6);
        assert!(scheduled.iter().all(|i| i.status == IncidentStatus::Scheduled));
    }

    #[test]
    fn incident_filter_by_title_or_description() {
        let patients = seed::seed_patients().unwrap();
        let incidents = seed::seed_incidents().unwrap();

        let cleaning = filter_incidents(
            &incidents,
            &patients,
            &IncidentFilter { term: "CLEANING".into(), status: Some(IncidentStatus::Completed) },
        );
        // i2 is also a cleaning but still scheduled
        assert_eq!(cleaning.len(), 1);
        assert_eq!(cleaning[0].id, "i10");
    }
}
