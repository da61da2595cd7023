//! Account supervisor.
//!
//! Drives one account through connect, authenticate, capability check,
//! folder selection and the IDLE loop, and keeps doing so across failures
//! until cancelled or until a failure retrying cannot fix.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt as _;
use session_core::{AuthError, CancellationToken, Connector, Session};
use watch_core::{AccountDescriptor, AccountState, ConnectionState, ErrorCode, StatusEvent};

mod policy;

pub use policy::*;

/// Why [`run`] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Exit {
    /// Stopped through the cancellation token.
    Cancelled,

    /// Stopped on a permanent failure.
    Failed(ErrorCode),
}

/// Parameters for [`run`].
pub struct Params<'a, C, Notify, Sleep> {
    /// Opens sessions.
    pub connector: &'a C,

    /// The account to watch.
    pub account: &'a AccountDescriptor,

    /// Status event sink.
    pub notify: Notify,

    /// Sleep timer used for backoff.
    pub sleep: Sleep,

    /// Retry timings.
    pub policy: RetryPolicy,

    /// Stops the supervisor.
    pub cancel: CancellationToken,
}

/// How a single connection attempt ended.
enum AttemptEnd {
    /// Cancelled.
    Cancelled,

    /// Interrupted by a failure.
    Failed(ErrorCode),
}

/// Supervise an account until cancelled or permanently failed.
///
/// The account state lives for the whole run, so the unseen snapshot
/// survives reconnects and no message is announced twice.
pub async fn run<C, Notify, NotifyFut, Sleep, SleepFut>(
    params: Params<'_, C, Notify, Sleep>,
) -> Exit
where
    C: Connector,
    Notify: FnMut(StatusEvent) -> NotifyFut + Send,
    NotifyFut: Future<Output = ()> + Send,
    Sleep: FnMut(Duration) -> SleepFut + Send,
    SleepFut: Future<Output = ()> + Send,
{
    let Params {
        connector,
        account,
        mut notify,
        mut sleep,
        policy,
        cancel,
    } = params;

    let mut state = AccountState::default();

    loop {
        let attempt = AssertUnwindSafe(attempt(
            connector,
            account,
            &policy,
            &mut state,
            &mut notify,
            &cancel,
        ));

        let end = match attempt.catch_unwind().await {
            Ok(end) => end,
            Err(panic_payload) => {
                tracing::error!(
                    account = %account.name,
                    panic = panic_message(panic_payload.as_ref()),
                    "connection attempt panicked"
                );
                AttemptEnd::Failed(ErrorCode::ConnectionDropped)
            }
        };

        let error = match end {
            AttemptEnd::Cancelled => {
                state.enter(ConnectionState::Disconnected);
                tracing::info!(account = %account.name, "supervisor cancelled");
                return Exit::Cancelled;
            }
            AttemptEnd::Failed(error) => error,
        };

        state.record_failure(error);
        notify(state.event(&account.name, Vec::new())).await;

        if error.is_permanent() {
            tracing::error!(
                account = %account.name,
                %error,
                "giving up on account"
            );
            return Exit::Failed(error);
        }

        let delay = policy.retry_delay(error);
        tracing::warn!(
            account = %account.name,
            %error,
            next_retry_in = ?delay,
            "connection attempt failed"
        );

        if delay.is_zero() {
            if cancel.is_cancelled() {
                return Exit::Cancelled;
            }
        } else if cancel.run_until_cancelled(sleep(delay)).await.is_none() {
            tracing::info!(account = %account.name, "supervisor cancelled during backoff");
            return Exit::Cancelled;
        }
    }
}

/// One pass from connecting to the end of the IDLE loop.
async fn attempt<C, Notify, NotifyFut>(
    connector: &C,
    account: &AccountDescriptor,
    policy: &RetryPolicy,
    state: &mut AccountState,
    notify: &mut Notify,
    cancel: &CancellationToken,
) -> AttemptEnd
where
    C: Connector,
    Notify: FnMut(StatusEvent) -> NotifyFut + Send,
    NotifyFut: Future<Output = ()> + Send,
{
    state.enter(ConnectionState::Connecting);
    tracing::info!(
        account = %account.name,
        server = %account.server,
        "connecting"
    );

    let mut session = match cancel
        .run_until_cancelled(connector.connect(&account.server))
        .await
    {
        None => return AttemptEnd::Cancelled,
        Some(Ok(session)) => session,
        Some(Err(error)) => {
            tracing::warn!(account = %account.name, %error, "connect failed");
            return AttemptEnd::Failed(ErrorCode::ConnectionFailed);
        }
    };

    let end = match cancel
        .run_until_cancelled(prepare(&mut session, account, state))
        .await
    {
        None => AttemptEnd::Cancelled,
        Some(Err(error)) => AttemptEnd::Failed(error),
        Some(Ok(())) => {
            if state.clear_error() {
                notify(state.event(&account.name, Vec::new())).await;
            }

            tracing::info!(
                account = %account.name,
                folder = %account.folder,
                "watching folder"
            );

            let result = idle_loop::run(idle_loop::Params {
                session: &mut session,
                account: &account.name,
                poll_interval: account.poll_interval,
                state,
                notify,
                cancel,
            })
            .await;

            match result {
                Ok(idle_loop::Cancelled) => AttemptEnd::Cancelled,
                Err(error) => {
                    tracing::warn!(account = %account.name, %error, "connection lost");
                    AttemptEnd::Failed(ErrorCode::ConnectionDropped)
                }
            }
        }
    };

    session.close(policy.close_grace).await;
    end
}

/// Authenticate, check for IDLE and select the folder.
async fn prepare<S>(
    session: &mut S,
    account: &AccountDescriptor,
    state: &mut AccountState,
) -> Result<(), ErrorCode>
where
    S: Session,
{
    if !account.has_credentials() {
        tracing::error!(account = %account.name, "no login credentials configured");
        return Err(ErrorCode::NoCredentials);
    }

    state.enter(ConnectionState::Authenticating);
    match session
        .authenticate(&account.username, &account.password)
        .await
    {
        Ok(()) => {}
        Err(AuthError::Rejected(text)) => {
            tracing::error!(account = %account.name, reason = %text, "login rejected");
            return Err(ErrorCode::LoginFailed);
        }
        Err(AuthError::Transport(error)) => {
            tracing::warn!(account = %account.name, %error, "login failed in transport");
            return Err(ErrorCode::ConnectionFailed);
        }
    }

    let capabilities = session.capabilities().await.map_err(|error| {
        tracing::warn!(account = %account.name, %error, "capability query failed");
        ErrorCode::ConnectionFailed
    })?;
    if !capabilities.supports_idle() {
        tracing::error!(
            account = %account.name,
            capabilities = ?capabilities,
            "server does not support IDLE"
        );
        return Err(ErrorCode::IdleUnsupported);
    }

    state.enter(ConnectionState::FolderSelecting);
    session
        .select_folder(&account.folder)
        .await
        .map_err(|error| {
            tracing::warn!(
                account = %account.name,
                folder = %account.folder,
                %error,
                "folder selection failed"
            );
            ErrorCode::ConnectionFailed
        })
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
