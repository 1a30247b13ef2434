use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::RpError;

/// Cancellation and deadline shared by every suspension point of one call.
///
/// Waits never outlive the deadline: a sleep that would cross it ends at the
/// deadline with `DeadlineExceeded`. A timeout too large to represent as an
/// instant means no deadline.
#[derive(Debug, Clone, Default)]
pub struct WaitScope {
    cancellation: Option<CancellationToken>,
    deadline: Option<(Instant, Duration)>,
}

impl WaitScope {
    pub fn new(cancellation: Option<CancellationToken>, timeout: Option<Duration>) -> Self {
        Self {
            cancellation,
            deadline: timeout.and_then(|timeout| Some((Instant::now().checked_add(timeout)?, timeout))),
        }
    }

    pub fn check(&self) -> Result<(), RpError> {
        if self.cancellation.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(RpError::Cancelled);
        }
        match self.deadline {
            Some((at, timeout)) if Instant::now() >= at => Err(RpError::DeadlineExceeded(timeout)),
            _ => Ok(()),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<(), RpError> {
        self.check()?;

        // an unrepresentable wake time lies past any deadline
        let wake_at = Instant::now().checked_add(duration);
        let deadline_hit = self
            .deadline
            .filter(|(at, _)| wake_at.map_or(true, |wake_at| *at < wake_at));

        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        // `sleep` saturates durations that overflow the clock
        let timer = match deadline_hit {
            Some((at, _)) => sleep_until(at),
            None => sleep(duration),
        };

        tokio::select! {
            _ = timer => match deadline_hit {
                Some((_, timeout)) => Err(RpError::DeadlineExceeded(timeout)),
                None => Ok(()),
            },
            _ = cancelled => Err(RpError::Cancelled),
        }
    }
}
