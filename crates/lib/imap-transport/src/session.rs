//! IMAP session wrapper.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_imap::extensions::idle::IdleResponse;
use futures_util::TryStreamExt as _;
use session_core::{AuthError, CancellationToken, Capabilities, WakeReason};
use watch_core::{MessageId, Password};

/// Fetch query that returns the header block without setting `\Seen`.
const HEADER_QUERY: &str = "RFC822.HEADER";

/// Default upper bound for the server to acknowledge `DONE`.
pub const DEFAULT_DONE_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams an IMAP session can run over.
pub trait ImapStream:
    tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug
{
}

impl<S> ImapStream for S where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug
{
}

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// IMAP protocol error.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// The operation needs an authenticated session.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// A failed IDLE exchange consumed the underlying session.
    #[error("session was lost during IDLE")]
    Lost,
}

/// Where the underlying connection is.
enum State<S>
where
    S: ImapStream,
{
    /// Greeted, not yet logged in.
    Connected(async_imap::Client<S>),

    /// Logged in.
    Authenticated(async_imap::Session<S>),
}

/// An IMAP connection driven through the [`session_core::Session`] interface.
pub struct ImapSession<S>
where
    S: ImapStream,
{
    /// Current connection state, `None` once a failure consumed it.
    state: Option<State<S>>,

    /// How long to wait for the server to end IDLE.
    done_timeout: Duration,
}

/// What ended an IDLE wait from our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// The poll deadline passed.
    Deadline,

    /// The cancellation token fired.
    Cancel,
}

impl<S> ImapSession<S>
where
    S: ImapStream,
{
    /// Wrap a greeted, not yet authenticated client.
    pub fn from_client(client: async_imap::Client<S>) -> Self {
        Self {
            state: Some(State::Connected(client)),
            done_timeout: DEFAULT_DONE_TIMEOUT,
        }
    }

    /// Wrap an already authenticated session.
    pub fn from_session(session: async_imap::Session<S>) -> Self {
        Self {
            state: Some(State::Authenticated(session)),
            done_timeout: DEFAULT_DONE_TIMEOUT,
        }
    }

    /// Override how long to wait for the server to acknowledge `DONE`.
    #[must_use]
    pub fn done_timeout(mut self, done_timeout: Duration) -> Self {
        self.done_timeout = done_timeout;
        self
    }

    /// Borrow the authenticated session.
    fn session_mut(&mut self) -> Result<&mut async_imap::Session<S>, SessionError> {
        match self.state {
            Some(State::Authenticated(ref mut session)) => Ok(session),
            Some(State::Connected(_)) => Err(SessionError::NotAuthenticated),
            None => Err(SessionError::Lost),
        }
    }

    /// Take the authenticated session out, e.g. to enter IDLE.
    fn take_session(&mut self) -> Result<async_imap::Session<S>, SessionError> {
        match self.state.take() {
            Some(State::Authenticated(session)) => Ok(session),
            Some(connected @ State::Connected(_)) => {
                self.state = Some(connected);
                Err(SessionError::NotAuthenticated)
            }
            None => Err(SessionError::Lost),
        }
    }
}

impl<S> session_core::Session for ImapSession<S>
where
    S: ImapStream,
{
    type Error = SessionError;

    async fn authenticate(
        &mut self,
        username: &str,
        password: &Password,
    ) -> Result<(), AuthError<Self::Error>> {
        let client = match self.state.take() {
            Some(State::Connected(client)) => client,
            Some(authenticated @ State::Authenticated(_)) => {
                self.state = Some(authenticated);
                return Ok(());
            }
            None => return Err(AuthError::Transport(SessionError::Lost)),
        };

        match client.login(username, password.expose()).await {
            Ok(session) => {
                self.state = Some(State::Authenticated(session));
                Ok(())
            }
            Err((error, client)) => {
                self.state = Some(State::Connected(client));
                Err(match error {
                    async_imap::error::Error::No(text) | async_imap::error::Error::Bad(text) => {
                        AuthError::Rejected(text)
                    }
                    other => AuthError::Transport(SessionError::Imap(other)),
                })
            }
        }
    }

    async fn capabilities(&mut self) -> Result<Capabilities, Self::Error> {
        let capabilities = self.session_mut()?.capabilities().await?;
        Ok(capabilities.iter().map(capability_token).collect())
    }

    async fn select_folder(&mut self, folder: &str) -> Result<(), Self::Error> {
        let mailbox = self.session_mut()?.select(folder).await?;
        tracing::debug!(
            folder,
            exists = mailbox.exists,
            uid_validity = ?mailbox.uid_validity,
            "folder selected"
        );
        Ok(())
    }

    async fn search_unseen(&mut self) -> Result<BTreeSet<MessageId>, Self::Error> {
        let uids = self.session_mut()?.uid_search("UNSEEN").await?;
        Ok(uids.into_iter().map(MessageId).collect())
    }

    async fn fetch_subjects(
        &mut self,
        ids: &[MessageId],
    ) -> Result<Vec<(MessageId, String)>, Self::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session_mut()?;
        let fetches: Vec<async_imap::types::Fetch> = session
            .uid_fetch(uid_set(ids), HEADER_QUERY)
            .await?
            .try_collect()
            .await?;

        let mut subjects: HashMap<MessageId, String> = fetches
            .iter()
            .filter_map(|fetch| {
                let uid = fetch.uid?;
                let subject = crate::subject::from_header(fetch.header().unwrap_or_default());
                Some((MessageId(uid), subject))
            })
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| subjects.remove(id).map(|subject| (*id, subject)))
            .collect())
    }

    async fn wait(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<WakeReason, Self::Error> {
        let session = self.take_session()?;

        let mut handle = session.idle();
        tokio::select! {
            result = handle.init() => {
                if let Err(error) = result {
                    return closed_or_lost(error);
                }
            }
            () = cancel.cancelled() => {
                tracing::debug!("cancelled before IDLE was accepted, dropping the session");
                return Ok(WakeReason::Interrupted);
            }
        }

        // The timeout inside `wait_with_timeout` restarts on every untagged
        // response, so keepalives would postpone it forever. The deadline
        // below is absolute.
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut stopped = None;
        let response = {
            let (idle_wait, stop) = handle.wait_with_timeout(timeout);
            tokio::pin!(idle_wait);
            let mut stop = Some(stop);
            loop {
                tokio::select! {
                    response = &mut idle_wait => break response,
                    // Dropping the stop source makes the wait resolve with a
                    // manual interrupt, so DONE still goes out below.
                    () = cancel.cancelled(), if stop.is_some() => {
                        stopped = Some(Stop::Cancel);
                        drop(stop.take());
                    }
                    () = &mut deadline, if stop.is_some() => {
                        stopped = Some(Stop::Deadline);
                        drop(stop.take());
                    }
                }
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(error) => return closed_or_lost(error),
        };

        match tokio::time::timeout(self.done_timeout, handle.done()).await {
            Ok(Ok(session)) => self.state = Some(State::Authenticated(session)),
            Ok(Err(error)) => return closed_or_lost(error),
            Err(_) => {
                tracing::debug!(done_timeout = ?self.done_timeout, "server did not end IDLE in time");
                return Ok(if stopped == Some(Stop::Cancel) || cancel.is_cancelled() {
                    WakeReason::Interrupted
                } else {
                    WakeReason::Closed
                });
            }
        }

        Ok(match (response, stopped) {
            (IdleResponse::NewData(_), _) => WakeReason::Pushed,
            (IdleResponse::Timeout, _) | (IdleResponse::ManualInterrupt, Some(Stop::Deadline)) => {
                WakeReason::TimedOut
            }
            (IdleResponse::ManualInterrupt, Some(Stop::Cancel) | None) => WakeReason::Interrupted,
        })
    }

    async fn close(self, grace: Duration) {
        let Some(State::Authenticated(mut session)) = self.state else {
            return;
        };

        match tokio::time::timeout(grace, session.logout()).await {
            Ok(Ok(())) => tracing::debug!("logged out"),
            Ok(Err(error)) => tracing::debug!(%error, "logout failed"),
            Err(_) => tracing::debug!(?grace, "logout timed out"),
        }
    }
}

/// Render a capability the way the server spelled it on the wire.
fn capability_token(capability: &async_imap::types::Capability) -> String {
    match capability {
        async_imap::types::Capability::Imap4rev1 => "IMAP4rev1".to_owned(),
        async_imap::types::Capability::Auth(mechanism) => format!("AUTH={mechanism}"),
        async_imap::types::Capability::Atom(atom) => atom.clone(),
    }
}

/// Render identifiers as an IMAP sequence set.
fn uid_set(ids: &[MessageId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A dropped connection is a wake reason; anything else is an error.
///
/// Either way the session is gone.
fn closed_or_lost(error: async_imap::error::Error) -> Result<WakeReason, SessionError> {
    match error {
        async_imap::error::Error::ConnectionLost => Ok(WakeReason::Closed),
        async_imap::error::Error::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            Ok(WakeReason::Closed)
        }
        other => Err(SessionError::Imap(other)),
    }
}
