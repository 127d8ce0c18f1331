pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod transfer;
pub mod utils;

use chrono::NaiveDate;

// Re-export commonly used types
pub use api::{ApiConfig, Credentials, GraphqlClient};
pub use error::RelayError;
pub use models::DateRange;
pub use services::{
    outcome_message, run_relay, run_with_notification, Notifier, NotifierConfig, NotifyOutcome,
};
pub use transfer::{
    relay_archive, DryRunStore, RelayReport, RemoteStore, SessionConnector, SftpConfig,
    SftpSession, Ssh2Connector, UploadedFile,
};

// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub credentials: Credentials,
    pub sftp: SftpConfig,
    pub notifier: NotifierConfig,
    pub reference_date: Option<NaiveDate>,
    pub skip_upload: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            credentials: Credentials::default(),
            sftp: SftpConfig::default(),
            notifier: NotifierConfig::default(),
            reference_date: None,
            skip_upload: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read secrets from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// Missing values become empty strings here and are rejected by the
    /// pipeline's pre-flight checks, so the failure is still reported.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).unwrap_or_default();

        Self {
            credentials: Credentials::new(value("EMAIL"), value("PASSWORD")),
            sftp: SftpConfig {
                username: value("SFTP_USERNAME"),
                password: value("SFTP_PASSWORD"),
                ..SftpConfig::default()
            },
            notifier: NotifierConfig::new(lookup("SLACK_WEBHOOK_URL")),
            ..Self::default()
        }
    }

    /// Previous-day window ending on the reference date, or today
    pub fn date_range(&self) -> DateRange {
        match self.reference_date {
            Some(date) => DateRange::previous_day_window(date),
            None => DateRange::for_today(),
        }
    }
}
