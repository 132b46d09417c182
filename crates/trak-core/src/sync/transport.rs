//! Remote transport: push/pull against the sync server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Priority, Status, Task};
use crate::time::{
    format_instant, parse_instant, parse_optional_instant, parse_required_instant,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Wire representation of a task.
///
/// Field names match the server contract exactly; timestamps travel as
/// ISO-8601 strings and `final_priority` as the canonical label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub task_type_id: i64,
    pub personal_priority: i64,
    pub influence: i64,
    pub status: String,
    #[serde(default)]
    pub deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub final_priority: String,
}

impl TaskDto {
    /// Build an outbound DTO, normalizing the priority to its canonical
    /// label and formatting every instant.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.as_str(),
            title: task.title.clone(),
            description: task.description.clone(),
            task_type_id: task.task_type_id,
            personal_priority: task.personal_priority,
            influence: task.influence,
            status: task.status.as_str().to_string(),
            deadline: task.deadline.map(format_instant),
            created_at: format_instant(task.created_at),
            updated_at: format_instant(task.updated_at),
            final_priority: task.final_priority.as_str().to_string(),
        }
    }

    /// The `updated_at` instant of this record, with the required-field
    /// fallback applied.
    #[must_use]
    pub fn updated_at_instant(&self) -> DateTime<Utc> {
        parse_required_instant(Some(&self.updated_at), "updated_at")
    }

    /// Convert an inbound DTO into a local task.
    ///
    /// The timestamp reconciler supplies the current instant for the two
    /// required fields when they are unparseable; `deadline` is dropped
    /// instead. Priority and status are defensively re-normalized even
    /// though the server is trusted to send canonical values.
    pub fn into_task(self) -> Result<Task, uuid::Error> {
        let id = self.id.parse()?;
        let created_at = parse_required_instant(Some(&self.created_at), "created_at");
        let mut updated_at = parse_required_instant(Some(&self.updated_at), "updated_at");
        if updated_at < created_at {
            tracing::warn!(id = %self.id, "updated_at precedes created_at, clamping");
            updated_at = created_at;
        }

        Ok(Task {
            id,
            title: self.title,
            description: normalize_text_option(self.description),
            task_type_id: self.task_type_id,
            personal_priority: self.personal_priority,
            influence: self.influence,
            final_priority: Priority::from_legacy(&self.final_priority),
            status: Status::from_label(&self.status),
            deadline: parse_optional_instant(self.deadline.as_deref()),
            created_at,
            updated_at,
        })
    }
}

/// A successful pull: the changed records plus the server's "as of" instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullBatch {
    pub tasks: Vec<TaskDto>,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid transport configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Server rejected the request: {message} ({status})")]
    Rejected { status: u16, message: String },
    #[error("Malformed response body: {message} ({status})")]
    Malformed { status: u16, message: String },
}

fn request_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error)
    }
}

/// Abstracted push/pull network operations against the remote store.
///
/// Both calls are single-attempt; retry policy belongs to whatever
/// schedules the cycle, never to the transport.
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    /// Upload locally changed records. All-or-nothing at call granularity.
    async fn push(&self, token: &str, tasks: &[TaskDto]) -> Result<(), TransportError>;

    /// Fetch records changed on the server strictly after `since`.
    async fn pull(&self, token: &str, since: DateTime<Utc>) -> Result<PullBatch, TransportError>;
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    tasks: &'a [TaskDto],
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    tasks: Vec<TaskDto>,
    server_time: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<serde_json::Value>,
}

/// HTTP implementation of [`RemoteTransport`] over reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the given server base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }
}

impl RemoteTransport for HttpTransport {
    async fn push(&self, token: &str, tasks: &[TaskDto]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(format!("{}/sync/push", self.base_url))
            .bearer_auth(token)
            .json(&PushRequest { tasks })
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn pull(&self, token: &str, since: DateTime<Utc>) -> Result<PullBatch, TransportError> {
        let response = self
            .client
            .get(format!("{}/sync/pull", self.base_url))
            .query(&[("last_sync", format_instant(since))])
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await.map_err(request_error)?;
        let payload: PullResponse =
            serde_json::from_str(&body).map_err(|error| TransportError::Malformed {
                status: status.as_u16(),
                message: error.to_string(),
            })?;

        let server_time =
            parse_instant(&payload.server_time).map_err(|error| TransportError::Malformed {
                status: status.as_u16(),
                message: format!("bad server_time: {error}"),
            })?;

        Ok(PullBatch {
            tasks: payload.tasks,
            server_time,
        })
    }
}

async fn rejection(response: reqwest::Response) -> TransportError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    TransportError::Rejected {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let detail = payload.detail.map(|value| match value {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });
        if let Some(message) = payload.message.or(payload.error).or(detail) {
            return compact_text(&message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

fn normalize_base_url(raw: String) -> Result<String, TransportError> {
    let url = normalize_text_option(Some(raw)).ok_or_else(|| {
        TransportError::InvalidConfiguration("server URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidConfiguration(
            "server URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Task};
    use pretty_assertions::assert_eq;

    fn sample_task() -> Task {
        Task::create(NewTask {
            title: "Prepare demo".to_string(),
            description: Some("Slides and script".to_string()),
            task_type_id: 2,
            personal_priority: 6,
            influence: 2,
            final_priority: Priority::Extreme,
            deadline: None,
        })
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.example.com".to_string()).is_err());
        assert_eq!(
            normalize_base_url("http://localhost:8000/".to_string()).unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn dto_round_trips_through_the_wire_shape() {
        let task = sample_task();
        let dto = TaskDto::from_task(&task);
        assert_eq!(dto.final_priority, "Extreme");
        assert_eq!(dto.status, "underway");

        let back = dto.into_task().unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn inbound_legacy_priority_is_normalized() {
        let mut dto = TaskDto::from_task(&sample_task());
        dto.final_priority = "4".to_string();
        dto.status = "Overdue".to_string();

        let task = dto.into_task().unwrap();
        assert_eq!(task.final_priority, Priority::High);
        assert_eq!(task.status, Status::Overdue);
    }

    #[test]
    fn inbound_bad_deadline_propagates_as_absent() {
        let mut dto = TaskDto::from_task(&sample_task());
        dto.deadline = Some("not-a-date".to_string());

        let task = dto.into_task().unwrap();
        assert_eq!(task.deadline, None);
    }

    #[test]
    fn inbound_bad_required_timestamps_default_to_now() {
        let mut dto = TaskDto::from_task(&sample_task());
        dto.created_at = "not-a-date".to_string();
        dto.updated_at = "not-a-date".to_string();

        let before = crate::time::now();
        let task = dto.into_task().unwrap();
        assert!(task.created_at >= before);
        assert!(task.updated_at >= task.created_at);
    }

    #[test]
    fn inbound_bad_id_is_an_error() {
        let mut dto = TaskDto::from_task(&sample_task());
        dto.id = "not-a-uuid".to_string();
        assert!(dto.into_task().is_err());
    }

    #[test]
    fn api_error_prefers_structured_detail() {
        let message = parse_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "validation failed"}"#,
        );
        assert_eq!(message, "validation failed");

        let fallback = parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(fallback, "HTTP 500");
    }
}
