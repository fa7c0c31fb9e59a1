use crate::config::endpoint;
use crate::table::Row;
use futures::{StreamExt, TryStreamExt};
use reqwest::{
    Body, Client, ClientBuilder, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
    multipart,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (or the response broke off).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The server answered outside 2xx.
    #[error("HTTP {0}")]
    Http(u16),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Invalid header {0}")]
    Header(String),
}

/// Status and body text of an administrative call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpResponse {
    pub status: u16,
    pub message: String,
}

impl OpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Talks to the bridge API below one base URL. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    http: Client,
}

impl BridgeClient {
    pub fn new(base_url: &str, headers: &BTreeMap<String, String>) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::Header(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::Header(name.to_string()))?;
            default_headers.insert(name, value);
        }

        let http = ClientBuilder::new()
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            // Remove trailing '/' so endpoint paths can be appended as is
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `path` as the multipart field `file`. The file is streamed from disk
    /// and `on_progress(sent, total)` fires for every chunk handed to the socket.
    /// Any HTTP answer is `Ok`, the caller decides what a status means.
    pub async fn upload<F>(
        &self,
        db: &str,
        path: &Path,
        mut on_progress: F,
    ) -> Result<StatusCode, ApiError>
    where
        F: FnMut(u64, Option<u64>) + Send + Sync + 'static,
    {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        // reqwest reports a failing body stream like a broken connection, keep
        // the local read error so the caller can tell the two apart
        let read_error: Arc<Mutex<Option<std::io::Error>>> = Arc::default();
        let read_slot = read_error.clone();
        let mut sent = 0u64;
        let stream = ReaderStream::new(file)
            .inspect_ok(move |chunk| {
                sent += chunk.len() as u64;
                on_progress(sent, Some(total));
            })
            .inspect_err(move |e| {
                if let Ok(mut slot) = read_slot.lock() {
                    *slot = Some(std::io::Error::new(e.kind(), e.to_string()));
                }
            });

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let url = self.url(&endpoint::upload(db));
        debug!(%url, bytes = total, "upload");
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                match read_error.lock().ok().and_then(|mut slot| slot.take()) {
                    Some(io) => ApiError::Io(io),
                    None => ApiError::Network(e),
                }
            })?;

        Ok(resp.status())
    }

    /// Streams the export of `db` into `dest`. The file only appears once the
    /// whole body arrived with a 2xx status; a missing or zero length means the
    /// total is unknown.
    pub async fn download<F>(
        &self,
        db: &str,
        dest: &Path,
        mut on_progress: F,
    ) -> Result<StatusCode, ApiError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let url = self.url(&endpoint::download(db));
        debug!(%url, "download");
        let resp = self.http.get(&url).send().await.map_err(ApiError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            return Ok(status);
        }

        let total = resp.content_length().filter(|len| *len > 0);
        let partial = dest.with_extension("part");
        let written = match Self::stream_to(resp, &partial, total, &mut on_progress).await {
            Ok(()) => tokio::fs::rename(&partial, dest).await.map_err(ApiError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // Whatever failed after the file was created, no partial export stays behind
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                debug!(path = %partial.display(), error = %rm, "partial download not removed");
            }
            return Err(e);
        }

        Ok(status)
    }

    async fn stream_to<F>(
        resp: reqwest::Response,
        partial: &Path,
        total: Option<u64>,
        on_progress: &mut F,
    ) -> Result<(), ApiError>
    where
        F: FnMut(u64, Option<u64>),
    {
        let mut file = tokio::fs::File::create(partial).await?;
        let mut stream = resp.bytes_stream();
        let mut received = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(ApiError::Network)?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            on_progress(received, total);
        }

        file.flush().await?;
        Ok(())
    }

    pub async fn relocate(&self, from: &str, to: &str) -> Result<OpResponse, ApiError> {
        self.post_for_status(&endpoint::relocate(from, to)).await
    }

    pub async fn sync(&self, db: &str) -> Result<OpResponse, ApiError> {
        self.post_for_status(&endpoint::sync(db)).await
    }

    async fn post_for_status(&self, path: &str) -> Result<OpResponse, ApiError> {
        let url = self.url(path);
        debug!(%url, "post");
        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(ApiError::Network)?;
        let status = resp.status().as_u16();
        let message = resp.text().await.map_err(ApiError::Network)?;

        Ok(OpResponse { status, message })
    }

    /// Rows of `db`, optionally narrowed by the raw filter text.
    pub async fn load_data(&self, db: &str, filter: Option<&str>) -> Result<Vec<Row>, ApiError> {
        let body = self.get_json(&endpoint::data(db, filter)).await?;
        Ok(rows_from_json(body))
    }

    /// Table names of `db`.
    pub async fn schema(&self, db: &str) -> Result<Vec<String>, ApiError> {
        let body = self.get_json(&endpoint::schema(db)).await?;
        Ok(table_names(body))
    }

    /// The `status` reported by the health endpoint, e.g. `UP`.
    pub async fn health(&self) -> Result<String, ApiError> {
        let body = self.get_json(&endpoint::health()).await?;
        body.get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("missing `status` field".into()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!(%url, "get");
        let resp = self.http.get(&url).send().await.map_err(ApiError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Http(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(ApiError::Network)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// Anything but an array counts as "no rows". Entries that are not objects have
// no columns to show and are skipped.
fn rows_from_json(body: Value) -> Vec<Row> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                other => {
                    debug!(entry = %other, "skipping non-object row");
                    None
                }
            })
            .collect(),
        other => {
            warn!(kind = json_kind(&other), "data endpoint did not return an array, showing no rows");
            Vec::new()
        }
    }
}

// MariaDB answers with `name`, other drivers may upper-case the alias
fn table_names(body: Value) -> Vec<String> {
    let Value::Array(items) = body else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            obj.get("name")
                .or_else(|| obj.get("NAME"))
                .or_else(|| obj.values().next())
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
