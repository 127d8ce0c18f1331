use crate::error::{RelayError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info};

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Download the batch export into memory
///
/// The body is only returned when the server declares it as a zip archive,
/// so an HTML error page served with a 200 never reaches extraction.
pub async fn download_archive(http: &Client, url: &str) -> Result<Vec<u8>> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(RelayError::network("archive download"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RelayError::HttpStatus {
            stage: "archive download",
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if !is_zip_media_type(content_type.as_deref()) {
        error!("Downloaded file is not a zip archive: {:?}", content_type);
        return Err(RelayError::UnexpectedContentType {
            expected: ZIP_CONTENT_TYPE,
            found: content_type,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(RelayError::network("archive download"))?;

    info!("Downloaded archive ({} bytes)", bytes.len());
    Ok(bytes.to_vec())
}

/// Compare the media type, ignoring parameters such as `charset`
fn is_zip_media_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case(ZIP_CONTENT_TYPE))
        .unwrap_or(false)
}
