//! Account-level error codes.

/// The error an account is currently in, if any.
///
/// Exactly one value per account at any time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    /// No error.
    #[default]
    None,

    /// Transport or TLS connection could not be established.
    ConnectionFailed,

    /// The server lacks the long-poll wait (IDLE) capability.
    IdleUnsupported,

    /// No credential material to present.
    NoCredentials,

    /// The server rejected the credentials.
    LoginFailed,

    /// An established session went away.
    ConnectionDropped,
}

impl ErrorCode {
    /// Whether this code describes an error at all.
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether retrying is pointless without reconfiguration.
    pub const fn is_permanent(self) -> bool {
        matches!(
            self,
            Self::IdleUnsupported | Self::NoCredentials | Self::LoginFailed
        )
    }

    /// Whether the error is expected to go away on retry.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::ConnectionFailed | Self::ConnectionDropped)
    }

    /// Short human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            Self::None => "OK",
            Self::ConnectionFailed => "Connection failed!",
            Self::IdleUnsupported => "IDLE not supported!",
            Self::NoCredentials => "No login credentials given!",
            Self::LoginFailed => "Login failed!",
            Self::ConnectionDropped => "Connection dropped!",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
