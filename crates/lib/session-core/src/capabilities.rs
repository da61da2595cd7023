//! Server capability tokens.

use std::collections::BTreeSet;

/// The capability token that advertises the long-poll wait mode.
pub const IDLE_CAPABILITY: &str = "IDLE";

/// Capability tokens advertised by a server, compared case-insensitively.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    /// Whether the server advertises `token`.
    pub fn has(&self, token: &str) -> bool {
        self.0.contains(&token.to_ascii_uppercase())
    }

    /// Whether the server supports the long-poll wait mode.
    pub fn supports_idle(&self) -> bool {
        self.has(IDLE_CAPABILITY)
    }

    /// Iterate the tokens, upper-cased.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<T> FromIterator<T> for Capabilities
where
    T: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|token| token.as_ref().to_ascii_uppercase())
                .collect(),
        )
    }
}
