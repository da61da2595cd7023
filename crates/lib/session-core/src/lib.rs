//! Session core.
//!
//! The watcher never talks to a concrete mail protocol. It programs against
//! [`Connector`] and [`Session`], which cover exactly the operations the
//! account lifecycle needs.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

pub use tokio_util::sync::CancellationToken;
use watch_core::{MessageId, Password, ServerAddress};

mod capabilities;

pub use capabilities::*;

/// Why a wait returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WakeReason {
    /// The server pushed unsolicited state data.
    Pushed,

    /// The wait deadline elapsed without a push.
    TimedOut,

    /// The wait was interrupted through its cancellation token.
    Interrupted,

    /// The server closed the connection.
    Closed,
}

/// Errors returned while authenticating.
#[derive(Debug, thiserror::Error)]
pub enum AuthError<E> {
    /// The server refused the credentials.
    #[error("credentials rejected: {0}")]
    Rejected(String),

    /// The transport failed while authenticating.
    #[error("transport error during authentication: {0}")]
    Transport(#[source] E),
}

/// Opens sessions to mail servers.
pub trait Connector: Send + Sync {
    /// The session type produced.
    type Session: Session;

    /// An error that connecting may fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a secured, not yet authenticated session.
    fn connect(
        &self,
        server: &ServerAddress,
    ) -> impl Future<Output = Result<Self::Session, Self::Error>> + Send;
}

/// An open session with a mail server.
pub trait Session: Send {
    /// An error that session operations may fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Present credentials.
    fn authenticate(
        &mut self,
        username: &str,
        password: &Password,
    ) -> impl Future<Output = Result<(), AuthError<Self::Error>>> + Send;

    /// Query the capabilities the server advertises.
    fn capabilities(&mut self) -> impl Future<Output = Result<Capabilities, Self::Error>> + Send;

    /// Select the folder to watch.
    fn select_folder(&mut self, folder: &str)
    -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Search the selected folder for unseen messages.
    fn search_unseen(
        &mut self,
    ) -> impl Future<Output = Result<BTreeSet<MessageId>, Self::Error>> + Send;

    /// Fetch the subject of each of the given messages.
    ///
    /// Results come back in the order of `ids`. Messages the server no longer
    /// has are left out.
    fn fetch_subjects(
        &mut self,
        ids: &[MessageId],
    ) -> impl Future<Output = Result<Vec<(MessageId, String)>, Self::Error>> + Send;

    /// Enter the long-poll wait and block until something happens.
    ///
    /// Returns after a server push, after `timeout` elapsed, when the server
    /// closes the connection, or when `cancel` fires. On return the session
    /// is out of the wait and ready for other commands.
    fn wait(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<WakeReason, Self::Error>> + Send;

    /// Log out, giving the server at most `grace` to acknowledge.
    fn close(self, grace: Duration) -> impl Future<Output = ()> + Send;
}
