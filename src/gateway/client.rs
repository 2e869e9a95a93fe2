//! Gateway HTTP client
//!
//! One canonical URL per endpoint; every request carries the configured
//! Authorization header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use crate::gateway::GatewayError;
use crate::storage::settings::AppSettings;
use crate::stream::driver::ChunkSource;
use crate::types::session::{FileItem, HistoryEntry, Session};

const GATEWAY_PREFIX: [&str; 3] = ["api", "v1", "gateway"];
const HISTORY_PREFIX: [&str; 3] = ["api", "v1", "chat_history"];

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    gateway_url: Url,
    history_url: Url,
    authorization: Option<String>,
    timeout: Duration,
}

impl GatewayClient {
    /// Build a client from settings
    pub fn new(settings: &AppSettings) -> Result<Self, GatewayError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))
        };

        // No client-wide timeout: it would also cut long-running streams
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("mlagent/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            gateway_url: parse(&settings.gateway_url)?,
            history_url: parse(&settings.history_url)?,
            authorization: settings.authorization(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        })
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization.is_some()
    }

    fn join(base: &Url, prefix: &[&str], tail: &[&str]) -> Result<Url, GatewayError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .extend(tail);
        Ok(url)
    }

    /// Gateway URL; a trailing `""` segment yields a trailing slash
    pub fn gateway_endpoint(&self, tail: &[&str]) -> Result<Url, GatewayError> {
        Self::join(&self.gateway_url, &GATEWAY_PREFIX, tail)
    }

    pub fn history_endpoint(&self, tail: &[&str]) -> Result<Url, GatewayError> {
        Self::join(&self.history_url, &HISTORY_PREFIX, tail)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.authorization {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = self.authorized(request).timeout(self.timeout).send().await?;
        check_status(response).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, GatewayError> {
        let url = self.gateway_endpoint(&["sessions", ""])?;
        tracing::debug!("Listing sessions from {}", url);
        Ok(self.send(self.http.get(url)).await?.json().await?)
    }

    pub async fn create_session(&self, title: &str) -> Result<Session, GatewayError> {
        let url = self.gateway_endpoint(&["sessions", ""])?;
        let body = serde_json::json!({ "title": title.trim() });
        let session: Session = self.send(self.http.post(url).json(&body)).await?.json().await?;
        tracing::info!("Created session '{}'", session.title);
        Ok(session)
    }

    pub async fn set_active_session(&self, title: &str) -> Result<(), GatewayError> {
        let url = self.gateway_endpoint(&["sessions", "active", title])?;
        let body = serde_json::json!({ "title": title });
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    pub async fn list_files(&self) -> Result<Vec<FileItem>, GatewayError> {
        let url = self.gateway_endpoint(&["files", ""])?;
        Ok(self.send(self.http.get(url)).await?.json().await?)
    }

    /// Active dataset of the current session, if the gateway reports one
    pub async fn get_active_file(&self) -> Result<Option<FileItem>, GatewayError> {
        let url = self.gateway_endpoint(&["files", "active", ""])?;
        let value: Value = self.send(self.http.get(url)).await?.json().await?;
        Ok(serde_json::from_value(value).ok())
    }

    pub async fn set_active_file(&self, file_name: &str) -> Result<(), GatewayError> {
        let url = self.gateway_endpoint(&["files", "active", ""])?;
        let body = serde_json::json!({ "file_name": file_name });
        self.send(self.http.post(url).json(&body)).await?;
        tracing::info!("Active file set to '{}'", file_name);
        Ok(())
    }

    pub async fn delete_file(&self, file_name: &str) -> Result<(), GatewayError> {
        let url = self.gateway_endpoint(&["files", file_name])?;
        self.send(self.http.delete(url)).await?;
        tracing::info!("Deleted file '{}'", file_name);
        Ok(())
    }

    pub async fn chat_history(&self, session_id: &str) -> Result<Vec<HistoryEntry>, GatewayError> {
        let url = self.history_endpoint(&[""])?;
        let request = self.http.get(url).query(&[("session_id", session_id)]);
        Ok(self.send(request).await?.json().await?)
    }

    /// Open the streaming chat endpoint. Only the status line is awaited;
    /// the body is read chunk by chunk through the returned source.
    pub async fn open_chat_stream(&self, question: &str) -> Result<HttpChunkSource, GatewayError> {
        let url = self.gateway_endpoint(&["chat", "stream"])?;
        let request = self.http.get(url).query(&[("question", question)]);
        let response = self.authorized(request).send().await?;
        let response = check_status(response).await?;
        tracing::debug!("Chat stream opened ({})", response.status());
        Ok(HttpChunkSource { response })
    }

    /// Non-streaming sibling of the chat endpoint
    pub async fn chat_once(&self, question: &str) -> Result<String, GatewayError> {
        let url = self.gateway_endpoint(&["chat", ""])?;
        let request = self.http.get(url).query(&[("question", question)]);
        let response = self.send(request).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(extract_answer(content_type.as_deref(), &body))
    }
}

/// Response body of the streaming endpoint
pub struct HttpChunkSource {
    response: Response,
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, GatewayError> {
        Ok(self.response.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

/// Map a non-success status onto the error the caller acts on
pub fn status_error(status: StatusCode, body: String) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::warn!("Gateway rejected credentials ({})", status);
            GatewayError::Unauthorized(status.as_u16())
        }
        StatusCode::CONFLICT => GatewayError::Conflict(body),
        _ => GatewayError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

/// Pull the answer text out of a non-streaming reply, JSON or plain text.
pub fn extract_answer(content_type: Option<&str>, body: &str) -> String {
    let is_json = content_type
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    if !is_json {
        return body.to_string();
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(text)) => text,
        Ok(value) => ["response", "message", "answer"]
            .iter()
            .find_map(|key| {
                value
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl crate::gateway::chat::ChatTransport for GatewayClient {
    async fn open_stream(&self, question: &str) -> Result<Box<dyn ChunkSource>, GatewayError> {
        Ok(Box::new(self.open_chat_stream(question).await?))
    }

    async fn ask_once(&self, question: &str) -> Result<String, GatewayError> {
        self.chat_once(question).await
    }
}
