//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend and audit calls with a deadline
//! - Cancel operations cleanly on timeout (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out backend exchanges return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Outcome of a deadline-bounded fallible operation.
#[derive(Debug, Error)]
pub enum TimeoutError<E> {
    #[error("deadline of {0:?} elapsed")]
    Elapsed(Duration),

    #[error(transparent)]
    Inner(E),
}

impl<E> TimeoutError<E> {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed(_))
    }
}

/// Run `fut` under `deadline`, flattening its own error into [`TimeoutError::Inner`].
pub async fn with_timeout<T, E, F>(deadline: Duration, fut: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed(deadline)),
    }
}
