//! Password wrapper type.

/// A password that never shows up in debug output or logs.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Wrap a password value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value for presenting it to the server.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the password is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Password {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("Password(<empty>)")
        } else {
            f.write_str("Password(***redacted***)")
        }
    }
}
