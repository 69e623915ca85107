//! REST transport for Elasticsearch-style document stores.
//!
//! The actual HTTP client is abstracted behind [`HttpClient`] so any
//! library (reqwest, ureq, hyper) or an in-process loopback can back it.
//! [`RestStore`] translates the [`DocumentStore`] interface onto the
//! store's REST surface and maps HTTP status codes onto the fault
//! taxonomy: `400`/`406`/`409` are terminal rejections, `408`/`429` and
//! the gateway statuses are retryable, everything else unrecognized is
//! surfaced as unexpected.

use crate::store::{
    DeleteAck, DocumentStore, Hit, MultiGetEntry, SortOrder, SourceFilter, WriteAck,
};
use serde_json::{json, Map, Value};
use syndex_core::{DocId, Document, StoreError, StoreResult};
use thiserror::Error;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// The method's wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Transport-level failure raised below the HTTP status layer.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The connection broke mid-request.
    #[error("i/o failure: {0}")]
    Io(String),
}

/// A raw HTTP response: status code plus body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implementations send one blocking request and hand back the raw
/// response. They must report timeouts and connection failures through
/// [`HttpError`] rather than inventing status codes.
pub trait HttpClient: Send + Sync {
    /// Sends a request with an optional JSON body.
    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpError>;
}

/// A document store speaking an Elasticsearch-style REST surface.
pub struct RestStore<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> RestStore<C> {
    /// Creates a store rooted at `base_url` (trailing slashes are
    /// tolerated).
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, client }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> StoreResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let encoded = body.map(|value| value.to_string().into_bytes());
        self.client
            .request(method, &url, encoded.as_deref())
            .map_err(|err| match err {
                HttpError::Timeout => StoreError::Timeout,
                HttpError::Connect(message) => StoreError::transport(message),
                HttpError::Io(message) => StoreError::transport(message),
            })
    }

    fn parse_body(response: &HttpResponse) -> StoreResult<Value> {
        serde_json::from_slice(&response.body)
            .map_err(|err| StoreError::unexpected(format!("malformed response body: {err}")))
    }

    fn write(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck> {
        let body = Value::Object(document.fields().clone());
        let response = self.send(Method::Put, &format!("/{index}/_doc/{id}"), Some(&body))?;
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        match body.get("result").and_then(Value::as_str) {
            Some(result) => Ok(WriteAck::from_result(result)),
            None => Err(StoreError::unexpected("write response carries no result")),
        }
    }
}

impl<C: HttpClient> DocumentStore for RestStore<C> {
    fn get(&self, index: &str, id: &DocId) -> StoreResult<Option<Document>> {
        let response = self.send(Method::Get, &format!("/{index}/_doc/{id}"), None)?;
        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        if !body.get("found").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(None);
        }
        match body.get("_source") {
            Some(Value::Object(fields)) => Ok(Some(Document::new(fields.clone()))),
            _ => Err(StoreError::unexpected(
                "document response carries no _source object",
            )),
        }
    }

    // The store exposes a single full-body put; create and replace differ
    // only in the acknowledgment the caller expects.
    fn create(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck> {
        self.write(index, id, document)
    }

    fn replace(&self, index: &str, id: &DocId, document: &Document) -> StoreResult<WriteAck> {
        self.write(index, id, document)
    }

    fn multi_get(&self, index: &str, ids: &[DocId]) -> StoreResult<Vec<MultiGetEntry>> {
        let body = json!({ "ids": ids.iter().map(DocId::as_str).collect::<Vec<_>>() });
        let response = self.send(Method::Post, &format!("/{index}/_mget"), Some(&body))?;
        if response.status == 404 {
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        let docs = match body.get("docs").and_then(Value::as_array) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };
        // Entries without an id or found flag are unaccountable; skip them
        // rather than guess.
        Ok(docs
            .iter()
            .filter_map(|entry| {
                let id = entry
                    .get("_id")
                    .and_then(Value::as_str)
                    .and_then(|s| DocId::new(s))?;
                let found = entry.get("found").and_then(Value::as_bool)?;
                Some(MultiGetEntry { id, found })
            })
            .collect())
    }

    fn search(
        &self,
        index: &str,
        sort_field: &str,
        order: SortOrder,
        size: usize,
        source: &SourceFilter,
    ) -> StoreResult<Vec<Hit>> {
        let mut sort_spec = Map::new();
        sort_spec.insert(sort_field.to_string(), json!({ "order": order.as_str() }));
        let source_spec = match source {
            SourceFilter::All => Value::Bool(true),
            SourceFilter::Omit => Value::Bool(false),
            SourceFilter::Fields(fields) => json!(fields),
        };
        let query = json!({
            "size": size,
            "sort": [Value::Object(sort_spec)],
            "_source": source_spec,
        });

        let response = self.send(Method::Post, &format!("/{index}/_search"), Some(&query))?;
        if response.status == 404 {
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        let hits = match body.pointer("/hits/hits").and_then(Value::as_array) {
            Some(hits) => hits,
            None => return Ok(Vec::new()),
        };
        Ok(hits
            .iter()
            .filter_map(|hit| {
                let id = hit
                    .get("_id")
                    .and_then(Value::as_str)
                    .and_then(|s| DocId::new(s))?;
                let source = match hit.get("_source") {
                    Some(Value::Object(fields)) => Some(Document::new(fields.clone())),
                    _ => None,
                };
                Some(Hit { id, source })
            })
            .collect())
    }

    fn count_by_term(&self, index: &str, field: &str, value: &Value) -> StoreResult<u64> {
        let mut term = Map::new();
        term.insert(field.to_string(), value.clone());
        let query = json!({ "query": { "term": Value::Object(term) } });

        let response = self.send(Method::Post, &format!("/{index}/_count"), Some(&query))?;
        if response.status == 404 {
            return Ok(0);
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::unexpected("count response carries no count"))
    }

    fn delete(&self, index: &str, id: &DocId) -> StoreResult<DeleteAck> {
        let response = self.send(Method::Delete, &format!("/{index}/_doc/{id}"), None)?;
        if response.status == 404 {
            return Ok(DeleteAck::Absent);
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        let body = Self::parse_body(&response)?;
        Ok(
            match body.get("result").and_then(Value::as_str).unwrap_or("") {
                "deleted" => DeleteAck::Deleted,
                "not_found" => DeleteAck::Absent,
                other => DeleteAck::Other(other.to_string()),
            },
        )
    }

    fn ping(&self) -> StoreResult<bool> {
        let response = self.send(Method::Head, "/", None)?;
        Ok(response.is_success())
    }

    fn index_exists(&self, index: &str) -> StoreResult<bool> {
        let response = self.send(Method::Head, &format!("/{index}"), None)?;
        if response.status == 404 {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(classify(&response));
        }
        Ok(true)
    }

    fn create_index(&self, index: &str, settings: &Value) -> StoreResult<()> {
        let response = self.send(Method::Put, &format!("/{index}"), Some(settings))?;
        if !response.is_success() {
            return Err(classify(&response));
        }
        Ok(())
    }
}

/// Maps a non-2xx response onto the fault taxonomy.
fn classify(response: &HttpResponse) -> StoreError {
    let reason = error_reason(&response.body);
    match response.status {
        400 | 406 | 409 => StoreError::rejected(reason),
        408 | 429 | 502 | 503 | 504 => {
            StoreError::transport(format!("status {}: {reason}", response.status))
        }
        status => StoreError::unexpected(format!("status {status}: {reason}")),
    }
}

/// Extracts the store's error reason from a response body, which may be
/// `{"error": "..."}`, `{"error": {"type": ..., "reason": ...}}`, or not
/// JSON at all.
fn error_reason(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        match value.get("error") {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Object(error)) => {
                let kind = error.get("type").and_then(Value::as_str);
                let reason = error.get("reason").and_then(Value::as_str);
                return match (kind, reason) {
                    (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
                    (Some(kind), None) => kind.to_string(),
                    (None, Some(reason)) => reason.to_string(),
                    (None, None) => Value::Object(error.clone()).to_string(),
                };
            }
            _ => {}
        }
    }
    String::from_utf8_lossy(body).chars().take(200).collect()
}

/// Routes requests to an in-process handler, for tests without network
/// overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a loopback client over the given handler.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// In-process handler standing in for a remote store.
pub trait LoopbackServer {
    /// Handles one request; `path` starts at the first slash after the
    /// host.
    fn handle(&self, method: Method, path: &str, body: &[u8]) -> Result<HttpResponse, HttpError>;
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, HttpError> {
        let path = match url.find("://") {
            Some(scheme) => {
                let rest = &url[scheme + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => url,
        };
        self.server.handle(method, path, body.unwrap_or(&[]))
    }
}
