use serde::{Deserialize, Serialize};

/// GraphQL request envelope
#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a, V> {
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<&'a str>,
    pub query: &'a str,
    pub variables: V,
}

/// GraphQL response envelope; `data` is absent when the server reports errors
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

impl<T> GraphqlResponse<T> {
    /// Join server-side error messages for diagnostics
    pub fn error_messages(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(
                self.errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginVariables<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub login: Option<LoginPayload>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub user: Option<LoginUser>,
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub access_token: Option<String>,
}

impl LoginData {
    pub fn access_token(self) -> Option<String> {
        self.login
            .and_then(|login| login.user)
            .and_then(|user| user.access_token)
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct BatchDownloadVariables<'a> {
    pub logistic_provider_id: &'a str,
    pub file_type: &'a str,
    pub date_range_start: String,
    pub date_range_end: String,
    pub order_status: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDownloadData {
    #[serde(rename = "generatePslBatchDownloadUrl")]
    pub batch_download: Option<BatchDownloadUrl>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDownloadUrl {
    pub download_url: Option<String>,
}

impl BatchDownloadData {
    pub fn download_url(self) -> Option<String> {
        self.batch_download
            .and_then(|batch| batch.download_url)
            .filter(|url| !url.is_empty())
    }
}
