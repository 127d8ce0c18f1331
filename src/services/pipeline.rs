use crate::api::{download_archive, GraphqlClient};
use crate::error::{RelayError, Result};
use crate::models::DateRange;
use crate::services::notifier::Notifier;
use crate::transfer::{relay_archive, DryRunStore, RelayReport, SessionConnector};
use crate::AppConfig;
use reqwest::Client;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Main relay operation - strictly sequential, first failure aborts
///
/// Credentials are checked before any network call. Uploaded files are named
/// with the range's end date.
pub async fn run_relay<C: SessionConnector>(
    config: &AppConfig,
    range: &DateRange,
    http: &Client,
    connector: C,
) -> Result<RelayReport> {
    config.credentials.validate()?;
    if !config.skip_upload {
        config.sftp.validate()?;
    }

    info!("Using date range {}", range);

    let api = GraphqlClient::new(http.clone(), config.api.clone());
    let token = api.authenticate(&config.credentials).await?;

    info!("Requesting download link...");
    let url = api.request_download_url(&token, range).await?;

    info!("Downloading zip archive...");
    let archive = download_archive(http, &url).await?;

    let date = range.end_iso();

    if config.skip_upload {
        info!("Upload skipped; listing files that would be sent");
        let mut store = DryRunStore::default();
        return relay_archive(&archive, &mut store, &config.sftp.base_path, &date);
    }

    info!("Connecting to SFTP...");
    let sftp = config.sftp.clone();
    tokio::task::spawn_blocking(move || {
        // Session is released when it goes out of scope, on every path
        let mut session = connector.connect(&sftp)?;
        relay_archive(&archive, &mut session, &sftp.base_path, &date)
    })
    .await
    .map_err(|e| RelayError::Task(e.to_string()))?
}

/// Run the relay and report its outcome exactly once
pub async fn run_with_notification<C: SessionConnector>(
    config: &AppConfig,
    range: &DateRange,
    connector: C,
) -> Result<RelayReport> {
    let http = Client::new();
    let span = info_span!("relay", run_id = %Uuid::new_v4());

    async move {
        let outcome = run_relay(config, range, &http, connector).await;

        if let Err(e) = &outcome {
            error!("Relay failed: {}", e);
            if let Some(body) = e.response_body() {
                error!("Raw response: {}", body);
            }
        }

        let message = outcome_message(range, &outcome);
        Notifier::new(http, config.notifier.clone())
            .notify(&message)
            .await;

        outcome
    }
    .instrument(span)
    .await
}

/// Human-readable summary posted to the operations channel
pub fn outcome_message(range: &DateRange, outcome: &Result<RelayReport>) -> String {
    match outcome {
        Ok(report) => format!(
            "NOTFIS relay completed for {} to {}: {} file(s) uploaded",
            range.start_iso(),
            range.end_iso(),
            report.uploaded.len()
        ),
        Err(e) => format!(
            "NOTFIS relay failed for {} to {}: {}",
            range.start_iso(),
            range.end_iso(),
            e
        ),
    }
}
