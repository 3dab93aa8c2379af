//! Backend calls the IDE shell makes outside the collaboration socket.
//!
//! `IdeService` is the seam: the workspace and debug panel only see the
//! trait, tests plug in mocks, and `HttpIdeService` talks to a project API
//! over HTTP with a bearer token.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum IdeServiceError {
    #[error("failed to build http client: {0}")]
    HttpClientBuild(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub file_id: String,
    pub line: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub name: String,
    pub file_id: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugSession {
    pub session_id: String,
    /// Breakpoint the program stopped on; `None` if it is still running.
    #[serde(default)]
    pub paused_at: Option<Breakpoint>,
    #[serde(default)]
    pub frames: Vec<StackFrame>,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait IdeService: Send + Sync {
    /// Persist a file's content.
    ///
    /// # Errors
    ///
    /// Returns an [`IdeServiceError`] if the backend rejects or cannot be reached.
    async fn save_file(&self, project_id: &str, file_id: &str, content: &str) -> Result<(), IdeServiceError>;

    /// Build and run the project once.
    ///
    /// # Errors
    ///
    /// Returns an [`IdeServiceError`] if the backend rejects or cannot be reached.
    async fn run_project(&self, project_id: &str) -> Result<RunOutput, IdeServiceError>;

    /// Launch the project under a debugger with the given breakpoints.
    ///
    /// # Errors
    ///
    /// Returns an [`IdeServiceError`] if the backend rejects or cannot be reached.
    async fn start_debug_session(
        &self,
        project_id: &str,
        breakpoints: &[Breakpoint],
    ) -> Result<DebugSession, IdeServiceError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// `IdeService` over a project REST API.
///
/// - `PUT  {base}/api/projects/{id}/files/{file_id}` with `{"content": ...}`
/// - `POST {base}/api/projects/{id}/run`
/// - `POST {base}/api/projects/{id}/debug` with `{"breakpoints": [...]}`
pub struct HttpIdeService {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct SaveFileRequest<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct DebugRequest<'a> {
    breakpoints: &'a [Breakpoint],
}

impl HttpIdeService {
    /// # Errors
    ///
    /// Returns [`IdeServiceError::HttpClientBuild`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, IdeServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdeServiceError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), token: token.into() })
    }

    fn project_url(&self, project_id: &str, suffix: &str) -> String {
        format!("{}/api/projects/{}/{suffix}", self.base_url, urlencoding::encode(project_id))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, IdeServiceError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(IdeServiceError::Status { status: status.as_u16(), body });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, IdeServiceError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl IdeService for HttpIdeService {
    async fn save_file(&self, project_id: &str, file_id: &str, content: &str) -> Result<(), IdeServiceError> {
        let url = self.project_url(project_id, &format!("files/{}", urlencoding::encode(file_id)));
        self.send(self.http.put(url).json(&SaveFileRequest { content })).await?;
        Ok(())
    }

    async fn run_project(&self, project_id: &str) -> Result<RunOutput, IdeServiceError> {
        let url = self.project_url(project_id, "run");
        self.send_json(self.http.post(url)).await
    }

    async fn start_debug_session(
        &self,
        project_id: &str,
        breakpoints: &[Breakpoint],
    ) -> Result<DebugSession, IdeServiceError> {
        let url = self.project_url(project_id, "debug");
        self.send_json(self.http.post(url).json(&DebugRequest { breakpoints })).await
    }
}

#[cfg(test)]
#[path = "ide_service_test.rs"]
mod tests;
