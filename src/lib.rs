//! Officine — local pharmacy/clinic record core.
//!
//! Patient files, sequential consultation/prescription documents, and
//! recurring biological monitoring (hepatic/renal follow-up). The
//! modules here are the decision core: code allocation, due-date
//! scheduling, lifecycle transitions, and summary staleness detection.
//! HTTP, auth, and rendering live in the surrounding services and talk
//! to this crate through the repository layer.

pub mod clock;
pub mod config;
pub mod db;
pub mod documents; // creation flow + code allocation retry
pub mod lifecycle; // consultation/prescription state machine
pub mod models;
pub mod monitoring; // biological follow-up scheduler
pub mod sequence; // year-scoped sequential identifiers
pub mod snapshot; // patient summary change detection

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the host process. Library code itself only
/// emits at the persistence boundary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
