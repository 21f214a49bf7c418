use std::time::Duration;

use arlo_core::model::{
    AuditBoard, AuditStatusSnapshot, AuthMeta, Ballot, BallotInterpretation, BallotKey,
    JurisdictionFileStatus,
};
use arlo_core::{AuditAction, AuditBasics, Upload};
use arlo_logging::{arlo_debug, arlo_warn};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{ApiError, RequestError};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Server origin, optionally with a path prefix that endpoints are appended to.
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// Single-file multipart form.
    Multipart { field: String, file: Upload },
}

/// Per-call options. `election_id` scopes the endpoint under
/// `election/{id}` and is consumed before the request is built.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub election_id: Option<String>,
    pub method: Method,
    pub body: RequestBody,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: RequestBody) -> Self {
        Self {
            method: Method::POST,
            body,
            ..Self::default()
        }
    }

    pub fn put(body: RequestBody) -> Self {
        Self {
            method: Method::PUT,
            body,
            ..Self::default()
        }
    }

    pub fn in_election(mut self, election_id: impl Into<String>) -> Self {
        self.election_id = Some(election_id.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ArloClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ArloClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidEndpoint(format!("{}: {err}", settings.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(settings.base_url));
        }
        // No overall request timeout: long server jobs are observed by polling.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;
        Ok(Self { base_url, http })
    }

    /// Appends the endpoint segments to the base URL, percent-encoding each one.
    fn endpoint_url(&self, election_id: Option<&str>, endpoint: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(election_id.map(|id| ["election", id]).into_iter().flatten())
            .extend(endpoint);
        Ok(url)
    }

    /// Issues one request to the endpoint named by `endpoint`'s path segments
    /// and decodes the JSON body as `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &[&str],
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let RequestOptions {
            election_id,
            method,
            body,
        } = options;
        let url = self.endpoint_url(election_id.as_deref(), endpoint)?;
        let path = url.path().to_string();
        arlo_debug!("{method} {url}");

        let request = self.http.request(method.clone(), url);
        let request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart { field, file } => {
                let part = Part::bytes(file.contents).file_name(file.file_name);
                request.multipart(Form::new().part(field, part))
            }
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            arlo_warn!("{method} {path} failed with {status}");
            return Err(RequestError {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .map_or_else(|| status.as_str().to_string(), str::to_string),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))?;
        if let Some(messages) = server_errors(&value) {
            arlo_warn!("{method} {path} rejected: {}", messages.join("; "));
            return Err(ApiError::Rejected(messages));
        }
        serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn auth_me(&self) -> Result<AuthMeta, ApiError> {
        self.call(&["auth", "me"], RequestOptions::get()).await
    }

    pub async fn audit_status(&self, election_id: &str) -> Result<AuditStatusSnapshot, ApiError> {
        self.call(&["audit", "status"], RequestOptions::get().in_election(election_id))
            .await
    }

    pub async fn submit_audit_basics(
        &self,
        election_id: &str,
        basics: &AuditBasics,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(basics).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.post_json(election_id, &["audit", "basic"], body).await
    }

    pub async fn submit_sample_size(&self, election_id: &str, size: u64) -> Result<(), ApiError> {
        self.post_json(election_id, &["audit", "sample-size"], json!({ "size": size }))
            .await
    }

    pub async fn reset_audit(&self, election_id: &str) -> Result<(), ApiError> {
        self.call::<Value>(
            &["audit", "reset"],
            RequestOptions::post(RequestBody::Empty).in_election(election_id),
        )
        .await
        .map(drop)
    }

    pub async fn jurisdiction_file(
        &self,
        election_id: &str,
    ) -> Result<JurisdictionFileStatus, ApiError> {
        self.call(&["jurisdiction", "file"], RequestOptions::get().in_election(election_id))
            .await
    }

    pub async fn upload_jurisdictions_file(
        &self,
        election_id: &str,
        file: Upload,
    ) -> Result<(), ApiError> {
        let body = RequestBody::Multipart {
            field: "jurisdictions".to_string(),
            file,
        };
        self.call::<Value>(
            &["jurisdiction", "file"],
            RequestOptions::put(body).in_election(election_id),
        )
        .await
        .map(drop)
    }

    pub async fn upload_manifest(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        file: Upload,
    ) -> Result<(), ApiError> {
        let body = RequestBody::Multipart {
            field: "manifest".to_string(),
            file,
        };
        self.call::<Value>(
            &["jurisdiction", jurisdiction_id, "manifest"],
            RequestOptions::post(body).in_election(election_id),
        )
        .await
        .map(drop)
    }

    /// Every ballot sampled in the jurisdiction for a round, for printing.
    pub async fn round_ballots(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        round_id: &str,
    ) -> Result<Vec<Ballot>, ApiError> {
        let list: BallotList = self
            .call(
                &["jurisdiction", jurisdiction_id, "round", round_id, "ballot-list"],
                RequestOptions::get().in_election(election_id),
            )
            .await?;
        Ok(list.ballots)
    }

    pub async fn audit_boards(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        round_id: &str,
    ) -> Result<Vec<AuditBoard>, ApiError> {
        let list: AuditBoardList = self
            .call(
                &["jurisdiction", jurisdiction_id, "round", round_id, "audit-board"],
                RequestOptions::get().in_election(election_id),
            )
            .await?;
        Ok(list.audit_boards)
    }

    pub async fn board_ballots(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        audit_board_id: &str,
        round_id: &str,
    ) -> Result<Vec<Ballot>, ApiError> {
        let list: BallotList = self
            .call(
                &[
                    "jurisdiction",
                    jurisdiction_id,
                    "audit-board",
                    audit_board_id,
                    "round",
                    round_id,
                    "ballot-list",
                ],
                RequestOptions::get().in_election(election_id),
            )
            .await?;
        Ok(list.ballots)
    }

    pub async fn submit_interpretations(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        key: &BallotKey,
        interpretations: &[BallotInterpretation],
    ) -> Result<(), ApiError> {
        let position = key.position.to_string();
        self.post_json(
            election_id,
            &[
                "jurisdiction",
                jurisdiction_id,
                "batch",
                key.batch_id.as_str(),
                "ballot",
                position.as_str(),
            ],
            json!({ "interpretations": interpretations }),
        )
        .await
    }

    async fn post_json(&self, election_id: &str, endpoint: &[&str], body: Value) -> Result<(), ApiError> {
        self.call::<Value>(
            endpoint,
            RequestOptions::post(RequestBody::Json(body)).in_election(election_id),
        )
        .await
        .map(drop)
    }
}

/// What the engine needs from the server. Tests substitute an in-memory fake.
#[async_trait::async_trait]
pub trait AuditApi: Send + Sync {
    async fn audit_status(&self, election_id: &str) -> Result<AuditStatusSnapshot, ApiError>;

    async fn jurisdiction_file(&self, election_id: &str)
        -> Result<JurisdictionFileStatus, ApiError>;

    async fn board_ballots(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        audit_board_id: &str,
        round_id: &str,
    ) -> Result<Vec<Ballot>, ApiError>;

    async fn run_action(&self, election_id: &str, action: AuditAction) -> Result<(), ApiError>;
}

#[async_trait::async_trait]
impl AuditApi for ArloClient {
    async fn audit_status(&self, election_id: &str) -> Result<AuditStatusSnapshot, ApiError> {
        ArloClient::audit_status(self, election_id).await
    }

    async fn jurisdiction_file(
        &self,
        election_id: &str,
    ) -> Result<JurisdictionFileStatus, ApiError> {
        ArloClient::jurisdiction_file(self, election_id).await
    }

    async fn board_ballots(
        &self,
        election_id: &str,
        jurisdiction_id: &str,
        audit_board_id: &str,
        round_id: &str,
    ) -> Result<Vec<Ballot>, ApiError> {
        ArloClient::board_ballots(self, election_id, jurisdiction_id, audit_board_id, round_id)
            .await
    }

    async fn run_action(&self, election_id: &str, action: AuditAction) -> Result<(), ApiError> {
        match action {
            AuditAction::ResetAudit => self.reset_audit(election_id).await,
            AuditAction::SubmitAuditBasics(basics) => {
                self.submit_audit_basics(election_id, &basics).await
            }
            AuditAction::SubmitSampleSize { size } => {
                self.submit_sample_size(election_id, size).await
            }
            AuditAction::UploadJurisdictionsFile(file) => {
                self.upload_jurisdictions_file(election_id, file).await
            }
            AuditAction::UploadManifest {
                jurisdiction_id,
                file,
            } => self.upload_manifest(election_id, &jurisdiction_id, file).await,
            AuditAction::SubmitInterpretation {
                jurisdiction_id,
                key,
                interpretations,
            } => {
                self.submit_interpretations(election_id, &jurisdiction_id, &key, &interpretations)
                    .await
            }
        }
    }
}

#[derive(Deserialize)]
struct BallotList {
    #[serde(default)]
    ballots: Vec<Ballot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditBoardList {
    #[serde(default)]
    audit_boards: Vec<AuditBoard>,
}

/// Messages of a `{"errors": [{"message", "errorType"}]}` envelope, if present.
fn server_errors(value: &Value) -> Option<Vec<String>> {
    let errors = value.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|error| {
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error")
                    .to_string()
            })
            .collect(),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Network(err.to_string())
}
