//! Account descriptors.

use std::time::Duration;

/// Folder watched when the account does not name one.
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Interval after which a wait is cycled even without server pushes.
///
/// RFC 2177 asks clients to re-issue IDLE at least every 29 minutes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(29 * 60);

/// How to secure the connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    #[default]
    Implicit,

    /// Start with plaintext and upgrade using STARTTLS (usually port 143).
    StartTls,
}

impl TlsMode {
    /// The conventional port for this mode.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Implicit => 993,
            Self::StartTls => 143,
        }
    }
}

/// Where the mail server lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerAddress {
    /// Hostname or IP address of the server.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// TLS mode.
    pub tls_mode: TlsMode,

    /// TLS server name (SNI), usually the same as `host`.
    pub tls_server_name: String,
}

impl ServerAddress {
    /// An implicit TLS address on the conventional port.
    pub fn implicit_tls(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            tls_server_name: host.clone(),
            host,
            port: TlsMode::Implicit.default_port(),
            tls_mode: TlsMode::Implicit,
        }
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A fully resolved, immutable description of one watched account.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountDescriptor {
    /// Unique account name, used as the key everywhere.
    pub name: String,

    /// Server to connect to.
    pub server: ServerAddress,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: crate::Password,

    /// Folder to watch.
    pub folder: String,

    /// Wait refresh interval.
    pub poll_interval: Duration,
}

impl AccountDescriptor {
    /// Build a descriptor with the default folder and poll interval.
    pub fn new(
        name: impl Into<String>,
        server: ServerAddress,
        username: impl Into<String>,
        password: impl Into<crate::Password>,
    ) -> Self {
        Self {
            name: name.into(),
            server,
            username: username.into(),
            password: password.into(),
            folder: DEFAULT_FOLDER.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Whether there is any credential material to present to the server.
    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}
