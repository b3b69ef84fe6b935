//! Remote project API: the trait the editor talks to, a blocking HTTP client
//! and an in-process fake.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use thiserror::Error;
use timeline::{AtvTaskDto, ProjectDto};
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {code}: {body}")]
    Status { code: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("project has no id")]
    MissingId,
    #[error("project {0} not found")]
    NotFound(String),
}

pub trait ProjectApi: Send + Sync {
    fn get_project_data(&self, id: &str) -> Result<ProjectDto, ApiError>;
    fn get_project_status(&self, id: &str) -> Result<AtvTaskDto, ApiError>;
    /// Send the committed project back; returns the stored record.
    fn save_project(&self, project: &ProjectDto) -> Result<ProjectDto, ApiError>;
}

pub struct HttpProjectApi {
    base: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpProjectApi {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self { base: base.into(), token: token.filter(|t| !t.trim().is_empty()), agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn project_url(&self, id: &str, tail: &str) -> String {
        self.url(&format!("projects/{}{tail}", urlencoding::encode(id)))
    }

    fn authorize(&self, req: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    fn read<T: DeserializeOwned>(result: Result<ureq::Response, ureq::Error>) -> Result<T, ApiError> {
        let body = match result {
            Ok(resp) => resp.into_string().map_err(|e| ApiError::Transport(e.to_string()))?,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(ApiError::Status { code, body });
            }
            Err(err) => return Err(ApiError::Transport(err.to_string())),
        };
        Ok(serde_json::from_str(&body)?)
    }
}

impl ProjectApi for HttpProjectApi {
    fn get_project_data(&self, id: &str) -> Result<ProjectDto, ApiError> {
        let url = self.project_url(id, "");
        debug!(%url, "GET project");
        Self::read(self.authorize(self.agent.get(&url)).set("Accept", "application/json").call())
    }

    fn get_project_status(&self, id: &str) -> Result<AtvTaskDto, ApiError> {
        let url = self.project_url(id, "/status");
        debug!(%url, "GET status");
        Self::read(self.authorize(self.agent.get(&url)).set("Accept", "application/json").call())
    }

    fn save_project(&self, project: &ProjectDto) -> Result<ProjectDto, ApiError> {
        let id = project.id.as_deref().ok_or(ApiError::MissingId)?;
        let url = self.project_url(id, "");
        let body = serde_json::to_string(project)?;
        debug!(%url, bytes = body.len(), "PUT project");
        let req = self
            .authorize(self.agent.put(&url))
            .set("Content-Type", "application/json")
            .set("Accept", "application/json");
        Self::read(req.send_string(&body))
    }
}

/// In-process stand-in for the backend. Status replies are scripted per
/// project; the last scripted reply repeats once the queue runs dry.
#[derive(Default)]
pub struct MemoryProjectApi {
    projects: Mutex<HashMap<String, ProjectDto>>,
    statuses: Mutex<HashMap<String, VecDeque<AtvTaskDto>>>,
    status_calls: Mutex<usize>,
}

impl MemoryProjectApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: ProjectDto) {
        if let Some(id) = project.id.clone() {
            self.projects.lock().insert(id, project);
        }
    }

    pub fn script_statuses(&self, id: &str, replies: impl IntoIterator<Item = AtvTaskDto>) {
        self.statuses.lock().insert(id.to_string(), replies.into_iter().collect());
    }

    pub fn status_calls(&self) -> usize {
        *self.status_calls.lock()
    }
}

impl ProjectApi for MemoryProjectApi {
    fn get_project_data(&self, id: &str) -> Result<ProjectDto, ApiError> {
        self.projects.lock().get(id).cloned().ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    fn get_project_status(&self, id: &str) -> Result<AtvTaskDto, ApiError> {
        *self.status_calls.lock() += 1;
        let mut statuses = self.statuses.lock();
        let queue = statuses.get_mut(id).ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        let reply = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        reply.ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    fn save_project(&self, project: &ProjectDto) -> Result<ProjectDto, ApiError> {
        let id = project.id.clone().ok_or(ApiError::MissingId)?;
        self.projects.lock().insert(id, project.clone());
        Ok(project.clone())
    }
}
