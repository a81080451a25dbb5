//! Abort/timeout race.
//!
//! A fetch settles exactly once, by whichever of these fires first:
//!
//! 1. the cancellation signal → [`FetchError::Aborted`]
//! 2. the timeout → [`FetchError::Timeout`] carrying the configured duration
//! 3. the dispatch itself → its own result
//!
//! The losing futures are dropped when the race settles, which clears the
//! timer and detaches the cancellation listener. Dropping the dispatch
//! future only stops the caller from waiting on it; when the dispatch runs on
//! its own task it keeps going in the background.

use std::future::Future;
use std::time::Duration;

use futures::future;
use tokio_util::sync::CancellationToken;

use crate::errors::FetchError;

/// Races `dispatch` against `signal` and `timeout`.
///
/// When neither is given the dispatch is awaited as-is.
pub async fn race<T, Fut>(
    dispatch: Fut,
    signal: Option<CancellationToken>,
    timeout: Option<Duration>,
) -> Result<T, FetchError>
where
    Fut: Future<Output = Result<T, FetchError>>,
{
    if signal.is_none() && timeout.is_none() {
        return dispatch.await;
    }

    let cancelled = async {
        match &signal {
            Some(token) => token.cancelled().await,
            None => future::pending::<()>().await,
        }
    };
    let elapsed = async {
        match timeout {
            Some(duration) => {
                tokio::time::sleep(duration).await;
                duration
            }
            None => future::pending::<Duration>().await,
        }
    };

    tokio::select! {
        // Abort and timeout win ties against a dispatch that is ready at the same time
        biased;
        _ = cancelled => Err(FetchError::Aborted),
        duration = elapsed => Err(FetchError::Timeout(duration)),
        res = dispatch => res,
    }
}
