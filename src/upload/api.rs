use async_trait::async_trait;
use futures_util::stream;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("{reason} ({status})")]
    Status { status: u16, reason: String },
    #[error("remote file not found")]
    NotFound,
    #[error("invalid response from server: {0}")]
    InvalidBody(String),
}

impl ApiError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidBody(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    fn from_status(status: StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        }
    }
}

/// Body of the upload `POST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Base64 of the raw file bytes.
    pub file_content: String,
    pub file_name: String,
    pub content_type: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReply {
    pub location: Option<String>,
}

/// One entry of the remote listing, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub size: Option<u64>,
}

/// Called with `(bytes_sent, bytes_total)` while the request body streams out.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

#[async_trait]
pub trait FileApi: Send + Sync {
    async fn upload(&self, request: UploadRequest, progress: ProgressFn)
        -> Result<UploadReply, ApiError>;
    async fn list(&self, user_id: &str) -> Result<Vec<RemoteFile>, ApiError>;
    async fn delete(&self, file_id: &str, user_id: &str) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponseBody {
    url: Option<String>,
    upload_url: Option<String>,
    download_url: Option<String>,
}

#[derive(Deserialize)]
struct ListingBody {
    /// Absent and `null` both mean an empty listing.
    #[serde(default)]
    files: Option<Vec<ListingEntry>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingEntry {
    id: Option<Value>,
    file_name: Option<String>,
    name: Option<String>,
    url: Option<String>,
    download_url: Option<String>,
    upload_url: Option<String>,
    /// Kept only when it is a non-negative integer.
    size: Option<Value>,
}

pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) as f64 / total as f64) * 100.0).round() as u8
}

pub fn parse_upload_reply(body: &[u8]) -> Result<UploadReply, ApiError> {
    let parsed: UploadResponseBody =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    Ok(UploadReply {
        location: parsed.url.or(parsed.upload_url).or(parsed.download_url),
    })
}

#[derive(Clone)]
pub struct HttpFileApi {
    client: Client,
    endpoint: Url,
}

impl HttpFileApi {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ApiError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "endpoint cannot carry a path".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn list_url(&self, user_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("userId", user_id);
        url
    }

    pub fn delete_url(&self, file_id: &str, user_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(file_id);
        }
        url.query_pairs_mut().append_pair("userId", user_id);
        url
    }

    /// Resolves a listing URL that may be relative to the endpoint.
    fn resolve(&self, raw: &str) -> String {
        self.endpoint
            .join(raw)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| raw.to_string())
    }

    fn normalize(&self, body: ListingBody) -> Vec<RemoteFile> {
        body.files
            .unwrap_or_default()
            .into_iter()
            .map(|entry| RemoteFile {
                id: entry.id.and_then(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
                name: entry
                    .file_name
                    .or(entry.name)
                    .unwrap_or_else(|| "untitled".to_string()),
                location: entry
                    .url
                    .or(entry.download_url)
                    .or(entry.upload_url)
                    .map(|raw| self.resolve(&raw)),
                size: entry.size.as_ref().and_then(Value::as_u64),
            })
            .collect()
    }
}

#[async_trait]
impl FileApi for HttpFileApi {
    async fn upload(
        &self,
        request: UploadRequest,
        progress: ProgressFn,
    ) -> Result<UploadReply, ApiError> {
        let body = serde_json::to_vec(&request).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
        let total = body.len() as u64;
        let chunks: Vec<Vec<u8>> = body.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

        let mut sent = 0u64;
        let stream = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        }));

        debug!(file = %request.file_name, bytes = total, "Posting upload");
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(CONTENT_LENGTH, HeaderValue::from(total))
            .body(Body::wrap_stream(stream))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
        parse_upload_reply(&bytes)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<RemoteFile>, ApiError> {
        let response = self
            .client
            .get(self.list_url(user_id))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }

        let body: ListingBody = response.json().await.map_err(ApiError::from_transport)?;
        let files = self.normalize(body);
        info!(count = files.len(), "Fetched remote listing");
        Ok(files)
    }

    async fn delete(&self, file_id: &str, user_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.delete_url(file_id, user_id))
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            status => Err(ApiError::from_status(status)),
        }
    }
}
