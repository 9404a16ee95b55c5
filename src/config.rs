use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "DentalDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key holding the user list (array of `User`).
pub const USERS_KEY: &str = "dentalUsers";
/// Storage key holding the active session (single `User`, absent when logged out).
pub const SESSION_KEY: &str = "dentalCurrentUser";
/// Storage key holding the patient collection.
pub const PATIENTS_KEY: &str = "dentalPatients";
/// Storage key holding the incident collection.
pub const INCIDENTS_KEY: &str = "dentalIncidents";

/// Get the application data directory
/// ~/DentalDesk/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the local key/value database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("dentaldesk.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "dentaldesk_lib=info,warn"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        let dir = app_data_dir();
        assert!(dir.ends_with("DentalDesk"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("dentaldesk.db"));
    }

    #[test]
    fn storage_keys_are_distinct() {
        let keys = [USERS_KEY, SESSION_KEY, PATIENTS_KEY, INCIDENTS_KEY];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
