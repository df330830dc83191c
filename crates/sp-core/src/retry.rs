//! Retry policy around gateway saves.

use std::time::Duration;

use crate::gateway::{GatewayError, SaveRequest, ScheduleGateway, StoredSchedule};

/// How many times to attempt a save and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Default: 3.
    pub max_attempts: u32,

    /// Fixed delay after each failed attempt. Default: 1 second.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Result of a save under a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        record: StoredSchedule,
        attempts: u32,
    },
    /// The gateway rejected the credentials; no further attempts were made.
    AuthFailed { message: String, attempts: u32 },
    /// Every attempt failed.
    Exhausted {
        last_error: GatewayError,
        attempts: u32,
    },
}

impl SaveOutcome {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Saved { attempts, .. }
            | Self::AuthFailed { attempts, .. }
            | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Saves `request`, retrying non-auth failures according to `policy`.
///
/// A policy with zero attempts still makes one.
pub async fn save_with_retry<G: ScheduleGateway>(
    gateway: &mut G,
    request: &SaveRequest,
    policy: &RetryPolicy,
) -> SaveOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match gateway.save_schedule(request).await {
            Ok(record) => {
                return SaveOutcome::Saved {
                    record,
                    attempts: attempt,
                };
            }
            Err(GatewayError::Auth(message)) => {
                tracing::warn!(subject = %request.subject, attempt, "save rejected credentials");
                return SaveOutcome::AuthFailed {
                    message,
                    attempts: attempt,
                };
            }
            Err(err) => {
                tracing::warn!(subject = %request.subject, attempt, error = %err, "save attempt failed");
                if attempt >= max_attempts {
                    return SaveOutcome::Exhausted {
                        last_error: err,
                        attempts: attempt,
                    };
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
