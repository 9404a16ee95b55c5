pub mod config;
pub mod models;
pub mod db;
pub mod crypto;
pub mod seed;
pub mod identity; // Users, credentials, active session
pub mod clinical; // Patients, incidents, dashboard aggregates
pub mod schedule; // Upcoming/history partitions, month grid
pub mod filters;
pub mod validation;
pub mod attachment;
pub mod authorization;
pub mod core_state;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
