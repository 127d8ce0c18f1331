use crate::error::{RelayError, Result};
use crate::models::graphql::{
    BatchDownloadData, BatchDownloadVariables, GraphqlRequest, GraphqlResponse, LoginData,
    LoginVariables,
};
use crate::models::DateRange;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

pub const DEFAULT_GRAPHQL_URL: &str = "https://graphql.intelipost.com.br/";
pub const DEFAULT_PROVIDER_ID: &str = "31";
pub const DEFAULT_FILE_TYPE: &str = "txt";

const ACCEPT_LANGUAGE_VALUE: &str = "pt-BR,pt;q=0.9";

const LOGIN_QUERY: &str = r#"
query ($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    authf2
    user {
      token
      access_token
    }
  }
}
"#;

const BATCH_DOWNLOAD_QUERY: &str = r#"
query($logistic_provider_id: String, $file_type: String, $date_range_start: String, $date_range_end: String, $order_status: [String]) {
  generatePslBatchDownloadUrl(logistic_provider_id: $logistic_provider_id, file_type: $file_type, date_range_start: $date_range_start, date_range_end: $date_range_end, order_status: $order_status) {
    download_url
  }
}
"#;

/// Configuration for the provider's GraphQL API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub graphql_url: String,
    pub provider_id: String,
    pub file_type: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            file_type: DEFAULT_FILE_TYPE.to_string(),
        }
    }
}

/// Login credentials for the GraphQL API
#[derive(Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Fail before any request when either value is blank
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(RelayError::MissingConfig { name: "EMAIL" });
        }
        if self.password.is_empty() {
            return Err(RelayError::MissingConfig { name: "PASSWORD" });
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Thin client over the two GraphQL operations the relay needs
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
    config: ApiConfig,
}

impl GraphqlClient {
    pub fn new(http: Client, config: ApiConfig) -> Self {
        Self { http, config }
    }

    /// Exchange credentials for a bearer token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        credentials.validate()?;

        let request = GraphqlRequest {
            operation_name: None,
            query: LOGIN_QUERY,
            variables: LoginVariables {
                email: &credentials.email,
                password: &credentials.password,
            },
        };

        let (response, body) = self.post::<_, LoginData>("login", &request, None).await?;
        let diagnostics = response.error_messages();

        match response.data.and_then(LoginData::access_token) {
            Some(token) => {
                info!("Authenticated against GraphQL API");
                Ok(token)
            }
            None => Err(RelayError::UnexpectedResponse {
                stage: "login",
                detail: diagnostics.unwrap_or_else(|| "access token not found".to_string()),
                body,
            }),
        }
    }

    /// Ask the provider for a signed URL to the batch export
    pub async fn request_download_url(&self, token: &str, range: &DateRange) -> Result<String> {
        let request = GraphqlRequest {
            operation_name: None,
            query: BATCH_DOWNLOAD_QUERY,
            variables: BatchDownloadVariables {
                logistic_provider_id: &self.config.provider_id,
                file_type: &self.config.file_type,
                date_range_start: range.start_iso(),
                date_range_end: range.end_iso(),
                order_status: Vec::new(),
            },
        };

        let (response, body) = self
            .post::<_, BatchDownloadData>("batch download query", &request, Some(token))
            .await?;
        let diagnostics = response.error_messages();

        match response.data.and_then(BatchDownloadData::download_url) {
            Some(url) => {
                info!("Download URL obtained: {}", url);
                Ok(url)
            }
            None => Err(RelayError::UnexpectedResponse {
                stage: "batch download query",
                detail: diagnostics.unwrap_or_else(|| "download_url not found".to_string()),
                body,
            }),
        }
    }

    /// POST a GraphQL request and decode the envelope, keeping the raw body
    async fn post<V, T>(
        &self,
        stage: &'static str,
        request: &GraphqlRequest<'_, V>,
        token: Option<&str>,
    ) -> Result<(GraphqlResponse<T>, String)>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        debug!("Sending {} to {}", stage, self.config.graphql_url);

        let mut builder = self
            .http
            .post(&self.config.graphql_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(RelayError::network(stage))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::HttpStatus {
                stage,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(RelayError::network(stage))?;

        match serde_json::from_str::<GraphqlResponse<T>>(&body) {
            Ok(parsed) => Ok((parsed, body)),
            Err(e) => Err(RelayError::UnexpectedResponse {
                stage,
                detail: e.to_string(),
                body,
            }),
        }
    }
}
