//! HTTP client for a hosted study planner API.
//!
//! Talks to the `/api/subjects` and `/api/schedules` endpoints with a bearer
//! token and classifies failures so the planner knows which ones to retry:
//! - rejected credentials end the run
//! - rejected data is reported as a validation failure
//! - server errors, timeouts and connection failures are transient

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use sp_core::{
    GatewayError, LoadedSchedules, SaveRequest, ScheduleGateway, StoredSchedule, Subject,
    SubjectName, UnavailableInterval,
};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Error string the API uses for an expired or forged token.
const INVALID_TOKEN: &str = "Invalid token";

/// Remote API errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The configured token is unusable.
    #[error("invalid API token: {reason}")]
    InvalidToken { reason: &'static str },
    /// The configured base URL is unusable.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API rejected the credentials.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    /// The API rejected the request data.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The API failed to handle the request.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<RemoteError> for GatewayError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized { .. } | RemoteError::InvalidToken { .. } => {
                Self::Auth(err.to_string())
            }
            RemoteError::Rejected { .. } | RemoteError::InvalidUrl(_) => {
                Self::Validation(err.to_string())
            }
            _ => Self::Transient(err.to_string()),
        }
    }
}

/// Study planner API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, if the URL
    /// is not http(s), or if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, RemoteError> {
        let base_url = base_url.into();
        let token = token.into();

        if token.trim().is_empty() {
            return Err(RemoteError::InvalidToken {
                reason: "token cannot be empty",
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(RemoteError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Fetches the user's subjects.
    ///
    /// Entries without a usable name are skipped.
    pub async fn list_subjects(&self) -> Result<Vec<Subject>, RemoteError> {
        let response = self
            .http
            .get(self.endpoint("subjects"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = read_success(response).await?;
        let subjects: Vec<RemoteSubject> = serde_json::from_str(&body)
            .map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
        Ok(subjects
            .into_iter()
            .filter_map(RemoteSubject::into_subject)
            .collect())
    }

    /// Saves one subject's schedule.
    pub async fn post_schedule(&self, request: &SaveRequest) -> Result<StoredSchedule, RemoteError> {
        let response = self
            .http
            .post(self.endpoint("schedules"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        let body = read_success(response).await?;
        Ok(parse_saved(&body).unwrap_or_else(|| {
            tracing::debug!(subject = %request.subject, "save response had no schedule, echoing request");
            StoredSchedule::from(request)
        }))
    }

    /// Fetches every stored schedule and the stored unavailable times.
    pub async fn fetch_schedules(&self) -> Result<LoadedSchedules, RemoteError> {
        let response = self
            .http
            .get(self.endpoint("schedules"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = read_success(response).await?;
        parse_loaded(&body)
    }
}

impl ScheduleGateway for Client {
    async fn save_schedule(&mut self, request: &SaveRequest) -> Result<StoredSchedule, GatewayError> {
        Ok(self.post_schedule(request).await?)
    }

    async fn load_schedules(&mut self) -> Result<LoadedSchedules, GatewayError> {
        Ok(self.fetch_schedules().await?)
    }
}

/// Returns the body of a successful response, or the classified error.
async fn read_success(response: reqwest::Response) -> Result<String, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(classify_failure(status, &body))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

fn classify_failure(status: StatusCode, body: &str) -> RemoteError {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    let error = payload.error.unwrap_or_else(|| format!("status {status}"));
    let message = match payload.details {
        Some(details) => format!("{error} - {details}"),
        None => error.clone(),
    };

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || (status == StatusCode::BAD_REQUEST && error == INVALID_TOKEN)
    {
        return RemoteError::Unauthorized { message };
    }
    if status.is_client_error() {
        return RemoteError::Rejected {
            status: status.as_u16(),
            message,
        };
    }
    RemoteError::Server {
        status: status.as_u16(),
        message,
    }
}

/// A subject as the API returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteSubject {
    name: String,
    #[serde(default)]
    hours: f64,
    #[serde(default)]
    hours_studied: f64,
    /// Either a date or a full ISO timestamp.
    #[serde(default)]
    deadline: Option<String>,
}

impl RemoteSubject {
    fn into_subject(self) -> Option<Subject> {
        let name = SubjectName::new(self.name).ok()?;
        let deadline = self
            .deadline
            .as_deref()
            .and_then(|value| value.get(..10))
            .and_then(|date| date.parse().ok());
        Some(Subject {
            name,
            total_hours: self.hours,
            hours_studied: self.hours_studied,
            deadline,
        })
    }
}

/// An unavailable time as stored by the API; fields may be blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawInterval {
    date: String,
    start_time: String,
    end_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadedPayload {
    #[serde(default)]
    subject_schedules: Vec<StoredSchedule>,
    #[serde(default)]
    unavailable_times: Vec<RawInterval>,
}

fn parse_loaded(body: &str) -> Result<LoadedSchedules, RemoteError> {
    let payload: LoadedPayload =
        serde_json::from_str(body).map_err(|err| RemoteError::InvalidResponse(err.to_string()))?;
    let unavailable_times = payload
        .unavailable_times
        .iter()
        .filter_map(|raw| UnavailableInterval::parse(&raw.date, &raw.start_time, &raw.end_time))
        .collect();
    Ok(LoadedSchedules {
        subject_schedules: payload.subject_schedules,
        unavailable_times,
    })
}

fn parse_saved(body: &str) -> Option<StoredSchedule> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct SavedPayload {
        subject_schedule: StoredSchedule,
    }

    serde_json::from_str::<SavedPayload>(body)
        .ok()
        .map(|payload| payload.subject_schedule)
}
