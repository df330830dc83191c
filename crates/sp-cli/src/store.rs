//! Backend selection for commands.

use anyhow::{Context, Result, bail};
use sp_core::{
    GatewayError, GenerateError, LoadedSchedules, SaveRequest, ScheduleGateway, StoredSchedule,
    Subject,
};
use sp_db::Database;

use crate::config::{Backend, Config};

/// Where a command reads and writes subjects and schedules.
#[derive(Debug)]
pub enum Store {
    Local(Database),
    Remote(sp_remote::Client),
}

impl Store {
    /// Opens the configured backend.
    ///
    /// For the local backend the database directory is created if missing.
    pub fn open(config: &Config) -> Result<Self> {
        match config.backend {
            Backend::Local => {
                if let Some(parent) = config.database_path.parent() {
                    std::fs::create_dir_all(parent)
                        .context("failed to create database directory")?;
                }
                let db = Database::open(&config.database_path).with_context(|| {
                    format!("failed to open {}", config.database_path.display())
                })?;
                Ok(Self::Local(db))
            }
            Backend::Remote => {
                let url = config
                    .api_url
                    .as_deref()
                    .context("missing API URL (set SP_API_URL or config.toml)")?;
                let token = config
                    .api_token
                    .as_deref()
                    .context("missing API token (set SP_API_TOKEN or config.toml)")?;
                let client =
                    sp_remote::Client::new(url, token).context("failed to create API client")?;
                Ok(Self::Remote(client))
            }
        }
    }

    /// The local database, for commands that change subjects.
    pub fn local(&self) -> Result<&Database> {
        match self {
            Self::Local(db) => Ok(db),
            Self::Remote(_) => bail!("subjects can only be changed with the local backend"),
        }
    }

    /// Every known subject.
    pub async fn subjects(&self) -> Result<Vec<Subject>> {
        match self {
            Self::Local(db) => Ok(db.list_subjects()?),
            Self::Remote(client) => client
                .list_subjects()
                .await
                .map_err(|err| gateway_error(err.into(), "failed to fetch subjects")),
        }
    }
}

/// Converts a gateway failure into a command error.
///
/// Rejected credentials read as an expired session wherever they happen,
/// matching the message a run gives when a save is refused.
pub fn gateway_error(err: GatewayError, context: &'static str) -> anyhow::Error {
    if err.is_auth() {
        anyhow::Error::new(GenerateError::SessionExpired {
            message: err.to_string(),
            saved: Vec::new(),
        })
    } else {
        anyhow::Error::new(err).context(context)
    }
}

impl ScheduleGateway for Store {
    async fn save_schedule(&mut self, request: &SaveRequest) -> Result<StoredSchedule, GatewayError> {
        match self {
            Self::Local(db) => db.save_schedule(request).await,
            Self::Remote(client) => client.save_schedule(request).await,
        }
    }

    async fn load_schedules(&mut self) -> Result<LoadedSchedules, GatewayError> {
        match self {
            Self::Local(db) => db.load_schedules().await,
            Self::Remote(client) => client.load_schedules().await,
        }
    }
}
