//! Integration test harness crate.

mod imap;

pub use greenmail::*;
pub use imap::*;

/// Plain IMAP port GreenMail listens on inside the container.
pub const IMAP_PORT: u16 = 3143;

/// Whether the Docker-backed tests were asked for. Logs a hint when not.
pub fn integration_tests_enabled() -> bool {
    if std::env::var_os("RUN_IMAP_INTEGRATION_TESTS").is_some() {
        return true;
    }

    eprintln!("skipping IMAP integration tests; set RUN_IMAP_INTEGRATION_TESTS=true to run");
    false
}
