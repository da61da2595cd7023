//! Scripted in-memory mail server for watcher tests.
//!
//! A [`FakeServer`] holds a mailbox, the credentials it accepts and a queue
//! of [`Step`]s that drive what the next waits return. Every session opened
//! through its [`FakeConnector`] shares that state, so a test can follow an
//! account across reconnects.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use session_core::{AuthError, CancellationToken, Capabilities, WakeReason};
use watch_core::{AccountDescriptor, MessageId, Password, ServerAddress, StatusEvent};

/// Username the fake server accepts by default.
pub const USERNAME: &str = "user@example.com";

/// Password the fake server accepts by default.
pub const PASSWORD: &str = "secret";

/// An error produced by the fake server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeError {
    /// A scripted connection refusal.
    #[error("connection refused")]
    Refused,

    /// The operation needs a logged-in session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The folder does not exist.
    #[error("no such folder: {0}")]
    NoSuchFolder(String),

    /// A scripted search failure.
    #[error("search failed")]
    SearchFailed,

    /// A scripted fetch failure.
    #[error("fetch failed")]
    FetchFailed,

    /// A scripted wait failure.
    #[error("wait failed")]
    WaitFailed,
}

/// One scripted event consumed by a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver a new unseen message with this subject.
    Deliver(String),

    /// Mark a message as seen, as if read in another client.
    MarkSeen(MessageId),

    /// Wake the current wait with a server push.
    Push,

    /// Wake the current wait as if its deadline elapsed.
    Timeout,

    /// Close the connection from the server side.
    Close,

    /// Fail the current wait with an error.
    Fail,

    /// Cancel the token passed to the current wait, as if shutdown was
    /// requested mid-wait.
    Cancel,

    /// Panic inside the current wait.
    Panic,
}

impl Step {
    /// Shorthand for [`Step::Deliver`].
    pub fn deliver(subject: impl Into<String>) -> Self {
        Self::Deliver(subject.into())
    }
}

/// A call observed by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// A connection attempt, successful or not.
    Connect,

    /// An authentication attempt.
    Authenticate,

    /// A capability query.
    Capabilities,

    /// A folder selection.
    Select(String),

    /// An unseen search.
    Search,

    /// A subject fetch for these identifiers.
    Fetch(Vec<MessageId>),

    /// A wait with this timeout.
    Wait(Duration),

    /// A logout.
    Close,
}

/// A message in the fake mailbox.
#[derive(Debug, Clone)]
struct Message {
    /// Subject line.
    subject: String,

    /// Whether the `\Seen` flag is set.
    seen: bool,
}

/// Shared server state.
#[derive(Debug)]
struct Inner {
    /// Accepted username.
    username: String,

    /// Accepted password.
    password: String,

    /// Advertised capabilities.
    capabilities: Vec<String>,

    /// Existing folders.
    folders: BTreeSet<String>,

    /// The watched mailbox, by UID.
    messages: BTreeMap<MessageId, Message>,

    /// Next UID to assign.
    next_uid: u32,

    /// Connection attempts left to refuse.
    refuse_connects: usize,

    /// Searches left to fail.
    fail_searches: usize,

    /// Fetches left to fail.
    fail_fetches: usize,

    /// Scripted wait outcomes.
    steps: VecDeque<Step>,

    /// Observed calls.
    calls: Vec<Call>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            username: USERNAME.to_owned(),
            password: PASSWORD.to_owned(),
            capabilities: vec!["IMAP4rev1".to_owned(), "IDLE".to_owned()],
            folders: BTreeSet::from([watch_core::DEFAULT_FOLDER.to_owned()]),
            messages: BTreeMap::new(),
            next_uid: 1,
            refuse_connects: 0,
            fail_searches: 0,
            fail_fetches: 0,
            steps: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

impl Inner {
    /// Add an unseen message.
    fn deliver(&mut self, subject: String) -> MessageId {
        let id = MessageId(self.next_uid);
        self.next_uid += 1;
        self.messages.insert(
            id,
            Message {
                subject,
                seen: false,
            },
        );
        id
    }
}

/// A scripted in-memory mail server.
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    /// Shared state.
    inner: Arc<Mutex<Inner>>,
}

impl FakeServer {
    /// A server accepting [`USERNAME`]/[`PASSWORD`], advertising IDLE, with an
    /// empty `INBOX`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the shared state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the advertised capabilities.
    pub fn set_capabilities(&self, capabilities: &[&str]) {
        self.lock().capabilities = capabilities.iter().map(|c| (*c).to_owned()).collect();
    }

    /// Remove a folder.
    pub fn remove_folder(&self, folder: &str) {
        self.lock().folders.remove(folder);
    }

    /// Refuse the next `count` connection attempts.
    pub fn refuse_connects(&self, count: usize) {
        self.lock().refuse_connects = count;
    }

    /// Fail the next `count` unseen searches.
    pub fn fail_searches(&self, count: usize) {
        self.lock().fail_searches = count;
    }

    /// Fail the next `count` subject fetches.
    pub fn fail_fetches(&self, count: usize) {
        self.lock().fail_fetches = count;
    }

    /// Deliver an unseen message right away.
    pub fn deliver(&self, subject: impl Into<String>) -> MessageId {
        self.lock().deliver(subject.into())
    }

    /// Mark a message as seen right away.
    pub fn mark_seen(&self, id: MessageId) {
        if let Some(message) = self.lock().messages.get_mut(&id) {
            message.seen = true;
        }
    }

    /// Queue steps for upcoming waits.
    pub fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.lock().steps.extend(steps);
    }

    /// Identifiers currently unseen.
    pub fn unseen(&self) -> BTreeSet<MessageId> {
        self.lock()
            .messages
            .iter()
            .filter(|(_, message)| !message.seen)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Every call observed so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// How many times `call` was observed.
    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// A connector opening sessions to this server.
    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            server: self.clone(),
        }
    }

    /// A session that is already authenticated.
    pub fn authenticated_session(&self) -> FakeSession {
        FakeSession {
            server: self.clone(),
            authenticated: true,
        }
    }

    /// Record a call.
    fn record(&self, call: Call) -> MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner
    }
}

/// An account descriptor matching the default fake server credentials.
pub fn account(name: &str) -> AccountDescriptor {
    AccountDescriptor::new(
        name,
        ServerAddress::implicit_tls("imap.example.com"),
        USERNAME,
        Password::new(PASSWORD),
    )
}

/// Opens [`FakeSession`]s.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    /// The server connected to.
    server: FakeServer,
}

impl session_core::Connector for FakeConnector {
    type Session = FakeSession;
    type Error = FakeError;

    async fn connect(&self, _server: &ServerAddress) -> Result<Self::Session, Self::Error> {
        let mut inner = self.server.record(Call::Connect);
        if inner.refuse_connects > 0 {
            inner.refuse_connects -= 1;
            return Err(FakeError::Refused);
        }

        Ok(FakeSession {
            server: self.server.clone(),
            authenticated: false,
        })
    }
}

/// A session with a [`FakeServer`].
#[derive(Debug)]
pub struct FakeSession {
    /// The server.
    server: FakeServer,

    /// Whether login succeeded.
    authenticated: bool,
}

impl session_core::Session for FakeSession {
    type Error = FakeError;

    async fn authenticate(
        &mut self,
        username: &str,
        password: &Password,
    ) -> Result<(), AuthError<Self::Error>> {
        let inner = self.server.record(Call::Authenticate);
        if inner.username == username && inner.password == password.expose() {
            self.authenticated = true;
            Ok(())
        } else {
            Err(AuthError::Rejected(
                "[AUTHENTICATIONFAILED] Invalid credentials".to_owned(),
            ))
        }
    }

    async fn capabilities(&mut self) -> Result<Capabilities, Self::Error> {
        let inner = self.server.record(Call::Capabilities);
        Ok(inner.capabilities.iter().collect())
    }

    async fn select_folder(&mut self, folder: &str) -> Result<(), Self::Error> {
        let inner = self.server.record(Call::Select(folder.to_owned()));
        if !self.authenticated {
            return Err(FakeError::NotAuthenticated);
        }
        if inner.folders.contains(folder) {
            Ok(())
        } else {
            Err(FakeError::NoSuchFolder(folder.to_owned()))
        }
    }

    async fn search_unseen(&mut self) -> Result<BTreeSet<MessageId>, Self::Error> {
        let mut inner = self.server.record(Call::Search);
        if inner.fail_searches > 0 {
            inner.fail_searches -= 1;
            return Err(FakeError::SearchFailed);
        }

        Ok(inner
            .messages
            .iter()
            .filter(|(_, message)| !message.seen)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn fetch_subjects(
        &mut self,
        ids: &[MessageId],
    ) -> Result<Vec<(MessageId, String)>, Self::Error> {
        let mut inner = self.server.record(Call::Fetch(ids.to_vec()));
        if inner.fail_fetches > 0 {
            inner.fail_fetches -= 1;
            return Err(FakeError::FetchFailed);
        }

        Ok(ids
            .iter()
            .filter_map(|id| {
                inner
                    .messages
                    .get(id)
                    .map(|message| (*id, message.subject.clone()))
            })
            .collect())
    }

    async fn wait(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<WakeReason, Self::Error> {
        let outcome = {
            let mut inner = self.server.record(Call::Wait(timeout));
            loop {
                match inner.steps.pop_front() {
                    Some(Step::Deliver(subject)) => {
                        inner.deliver(subject);
                    }
                    Some(Step::MarkSeen(id)) => {
                        if let Some(message) = inner.messages.get_mut(&id) {
                            message.seen = true;
                        }
                    }
                    Some(Step::Push) => break Some(Ok(WakeReason::Pushed)),
                    Some(Step::Timeout) => break Some(Ok(WakeReason::TimedOut)),
                    Some(Step::Close) => break Some(Ok(WakeReason::Closed)),
                    Some(Step::Fail) => break Some(Err(FakeError::WaitFailed)),
                    Some(Step::Panic) => {
                        drop(inner);
                        panic!("scripted panic");
                    }
                    Some(Step::Cancel) => {
                        cancel.cancel();
                        break None;
                    }
                    None => break None,
                }
            }
        };

        match outcome {
            Some(outcome) => outcome,
            None => {
                // Script exhausted: idle until the test cancels.
                cancel.cancelled().await;
                Ok(WakeReason::Interrupted)
            }
        }
    }

    async fn close(self, _grace: Duration) {
        drop(self.server.record(Call::Close));
    }
}

/// Forward status events into a channel.
pub fn forward_to(
    sender: tokio::sync::mpsc::UnboundedSender<StatusEvent>,
) -> impl FnMut(StatusEvent) -> std::future::Ready<()> + Clone + Send + Sync + 'static {
    move |event| {
        let _ = sender.send(event);
        std::future::ready(())
    }
}
