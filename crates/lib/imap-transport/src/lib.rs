//! IMAP transport for the mailbox watcher.
//!
//! Implements [`session_core::Connector`] and [`session_core::Session`] on
//! top of `async-imap`, secured with `tokio-rustls`.

use std::time::Duration;

use watch_core::ServerAddress;

mod connect;
mod session;
mod subject;
mod tls;

pub use connect::ConnectError;
pub use session::{DEFAULT_DONE_TIMEOUT, ImapSession, ImapStream, SessionError};
pub use tls::TlsError;

/// The effective data stream type we use.
pub type Stream = tokio_rustls::client::TlsStream<tokio::net::TcpStream>;

/// Default upper bound for opening a connection, TLS handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens IMAP sessions over TLS.
#[derive(Clone)]
pub struct ImapConnector {
    /// TLS connector.
    tls: tokio_rustls::TlsConnector,

    /// Upper bound for opening a connection.
    connect_timeout: Duration,
}

impl ImapConnector {
    /// A connector trusting the system root certificates.
    pub fn with_native_roots() -> Result<Self, TlsError> {
        Ok(Self::with_tls_connector(tls::native_roots_connector()?))
    }

    /// A connector using the provided TLS configuration.
    pub fn with_tls_connector(tls: tokio_rustls::TlsConnector) -> Self {
        Self {
            tls,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl session_core::Connector for ImapConnector {
    type Session = ImapSession<Stream>;
    type Error = ConnectError;

    async fn connect(&self, server: &ServerAddress) -> Result<Self::Session, Self::Error> {
        tracing::debug!(
            imap_host = %server.host,
            imap_port = server.port,
            imap_tls_mode = ?server.tls_mode,
            tls_server_name = %server.tls_server_name,
            "connecting to an IMAP server"
        );

        let client = tokio::time::timeout(self.connect_timeout, connect::open(&self.tls, server))
            .await
            .map_err(|_| ConnectError::Timeout(self.connect_timeout))??;

        Ok(ImapSession::from_client(client))
    }
}
