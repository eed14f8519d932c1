use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Per-request operation context.
///
/// Carries the cancellation signal and an optional deadline. Every blob and
/// database call receives one; long iterations re-check it between entries.
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<DateTime<Utc>>,
}

impl OpContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: DateTime<Utc>) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fails fast when the request has been cancelled or its deadline passed.
    pub fn ensure_active(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Utc::now() > deadline
        {
            return Err(RegistryError::Cancelled);
        }
        Ok(())
    }
}
