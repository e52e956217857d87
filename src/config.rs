use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Officine";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sequence code prefix for consultations.
pub const CONSULTATION_PREFIX: &str = "CONS";
/// Sequence code prefix for prescriptions (ordonnances).
pub const PRESCRIPTION_PREFIX: &str = "ORD";

/// Attempts budget for the sequence allocation retry loop before the
/// timestamp fallback kicks in.
pub const SEQUENCE_RETRY_ATTEMPTS: usize = 10;

/// Monitoring cadence applied when a prescriber did not specify one.
/// Single source of truth — consumed only by `FrequencyMonths::default`.
pub const DEFAULT_FREQUENCY_MONTHS: u8 = 3;

/// Days ahead within which a monitoring record counts as due.
pub const DUE_HORIZON_DAYS: i64 = 7;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Get the application data directory
/// ~/Officine/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Officine")
}

/// Get the dossiers directory (one SQLite database per pharmacy)
pub fn dossiers_dir() -> PathBuf {
    app_data_dir().join("dossiers")
}
