//! Configuration file types for mail-watch.

/// Root configuration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Reconnect timings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub retry: RetryConfig,

    /// Accounts to watch.
    pub accounts: Vec<AccountConfig>,
}

/// Reconnect timings. Missing values fall back to the built-in defaults.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay after a failed connection attempt (seconds).
    pub connect_failure_delay_secs: Option<u64>,

    /// Delay after an established connection dropped (seconds).
    pub drop_retry_delay_secs: Option<u64>,

    /// Grace period for logging out when a session ends (seconds).
    pub close_grace_secs: Option<u64>,
}

/// A watched account.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct AccountConfig {
    /// Unique account name.
    pub name: String,

    /// Hostname or IP address of the IMAP server.
    pub host: String,

    /// Optional port override.
    pub port: Option<u16>,

    /// TLS settings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tls: TlsConfig,

    /// Username for IMAP authentication.
    #[cfg_attr(feature = "serde", serde(default))]
    pub username: String,

    /// Password for IMAP authentication.
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: PasswordSource,

    /// Folder to watch, `INBOX` when unset.
    pub folder: Option<String>,

    /// Refresh interval override (minutes).
    pub poll_interval_mins: Option<u64>,
}

/// TLS configuration for an account.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TlsConfig {
    /// TLS mode.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: TlsMode,

    /// Optional override for the TLS server name (SNI).
    pub server_name: Option<String>,
}

/// Supported TLS modes.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    #[default]
    Implicit,

    /// STARTTLS upgrade (usually port 143).
    #[cfg_attr(
        feature = "serde",
        serde(rename = "starttls", alias = "start_tls", alias = "start-tls")
    )]
    StartTls,
}

/// Source for a password value.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordSource {
    /// Plaintext password stored directly in config.
    Plain(String),

    /// A shell command printing the password on stdout.
    Command {
        /// The command line, run with `/bin/sh -c`.
        command: String,
    },
}

impl Default for PasswordSource {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}
