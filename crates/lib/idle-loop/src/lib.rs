//! IDLE session loop.

use std::time::Duration;

use session_core::{CancellationToken, Session, WakeReason};
use watch_core::{AccountState, ConnectionState, StatusEvent};

/// Errors that end the loop. Both mean the connection is gone.
#[derive(Debug, thiserror::Error)]
pub enum LoopError<E> {
    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,

    /// Waiting for server pushes failed.
    #[error("wait error: {0}")]
    Wait(#[source] E),
}

/// The loop was stopped through its cancellation token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cancelled;

/// Inputs to [`run`].
pub struct Params<'a, S, Notify> {
    /// Session with the watched folder already selected.
    pub session: &'a mut S,

    /// Account name, for events and logs.
    pub account: &'a str,

    /// Wait deadline; a refresh happens at least this often.
    pub poll_interval: Duration,

    /// Account state owned by the caller.
    pub state: &'a mut AccountState,

    /// Status event sink.
    pub notify: &'a mut Notify,

    /// Stops the loop.
    pub cancel: &'a CancellationToken,
}

/// Refresh once, then alternate between waiting for pushes and refreshing.
///
/// Returns only when cancelled or when the connection goes away. Refresh
/// failures are logged and otherwise ignored; the next wake retries.
pub async fn run<S, Notify, NotifyFut>(
    params: Params<'_, S, Notify>,
) -> Result<Cancelled, LoopError<S::Error>>
where
    S: Session,
    Notify: FnMut(StatusEvent) -> NotifyFut + Send,
    NotifyFut: Future<Output = ()> + Send,
{
    let Params {
        session,
        account,
        poll_interval,
        state,
        notify,
        cancel,
    } = params;

    loop {
        state.enter(ConnectionState::Refreshing);
        if let Err(error) = unseen_diff::refresh(session, account, state, notify).await {
            tracing::warn!(account, %error, "refresh failed, keeping previous snapshot");
        }

        if cancel.is_cancelled() {
            return Ok(Cancelled);
        }

        state.enter(ConnectionState::Idling);
        let reason = session
            .wait(poll_interval, cancel)
            .await
            .map_err(LoopError::Wait)?;

        match reason {
            WakeReason::Pushed => tracing::debug!(account, "server pushed an update"),
            WakeReason::TimedOut => {
                tracing::debug!(account, ?poll_interval, "poll interval elapsed");
            }
            WakeReason::Interrupted => return Ok(Cancelled),
            WakeReason::Closed => return Err(LoopError::Closed),
        }
    }
}
