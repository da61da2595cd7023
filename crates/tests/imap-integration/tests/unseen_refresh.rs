//! Docker-backed IMAP integration tests.

use std::error::Error;
use std::time::Duration;

use session_core::{CancellationToken, Session as _, WakeReason};
use watch_core::AccountState;

const IMAP_USER: &str = "test";
const IMAP_PASSWORD: &str = "secret";

/// Append an unseen message with the given subject.
async fn append(
    session: &mut async_imap::Session<tokio::net::TcpStream>,
    subject: &str,
) -> Result<(), async_imap::error::Error> {
    let message = format!("Subject: {subject}\r\n\r\nHello from tests.\r\n");
    session.append("INBOX", None, None, message.as_bytes()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_reports_appended_messages() -> Result<(), Box<dyn Error + Send + Sync>> {
    if !imap_integration::integration_tests_enabled() {
        return Ok(());
    }

    let greenmail = imap_integration::start_greenmail(IMAP_USER, IMAP_PASSWORD).await?;

    let mut watcher = imap_integration::watcher_session(
        &greenmail.host,
        greenmail.port,
        IMAP_USER,
        IMAP_PASSWORD,
    )
    .await?;
    let mut writer = imap_integration::login_with_retry(
        &greenmail.host,
        greenmail.port,
        IMAP_USER,
        IMAP_PASSWORD,
    )
    .await?;

    assert!(watcher.capabilities().await?.supports_idle());
    watcher.select_folder("INBOX").await?;

    let mut state = AccountState::default();
    let mut events = Vec::new();
    let mut notify = |event: watch_core::StatusEvent| {
        events.push(event);
        std::future::ready(())
    };

    let first = unseen_diff::refresh(&mut watcher, "greenmail", &mut state, &mut notify).await?;
    assert_eq!(first.unseen, 0);

    append(&mut writer, "Older").await?;
    append(&mut writer, "Newer").await?;

    let second = unseen_diff::refresh(&mut watcher, "greenmail", &mut state, &mut notify).await?;
    assert_eq!(second.unseen, 2);
    assert_eq!(second.new_ids.len(), 2);

    let third = unseen_diff::refresh(&mut watcher, "greenmail", &mut state, &mut notify).await?;
    assert!(third.new_ids.is_empty());

    drop(notify);
    assert_eq!(events.len(), 3);
    assert_eq!(events[1].new_subjects, ["Newer", "Older"]);
    assert!(events[2].new_subjects.is_empty());

    // Fetching subjects must not mark anything as read.
    assert_eq!(writer.select("INBOX").await?.exists, 2);
    assert_eq!(writer.uid_search("UNSEEN").await?.len(), 2);

    writer.logout().await?;
    watcher.close(Duration::from_secs(5)).await;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn idle_wakes_on_delivery_and_cancel() -> Result<(), Box<dyn Error + Send + Sync>> {
    if !imap_integration::integration_tests_enabled() {
        return Ok(());
    }

    let greenmail = imap_integration::start_greenmail(IMAP_USER, IMAP_PASSWORD).await?;

    let mut watcher = imap_integration::watcher_session(
        &greenmail.host,
        greenmail.port,
        IMAP_USER,
        IMAP_PASSWORD,
    )
    .await?;
    let mut writer = imap_integration::login_with_retry(
        &greenmail.host,
        greenmail.port,
        IMAP_USER,
        IMAP_PASSWORD,
    )
    .await?;

    watcher.select_folder("INBOX").await?;

    let cancel = CancellationToken::new();
    let (reason, appended) = tokio::join!(
        watcher.wait(Duration::from_secs(30), &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            append(&mut writer, "Pushed").await
        }
    );
    appended?;
    assert_eq!(reason?, WakeReason::Pushed);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });
    let reason = watcher.wait(Duration::from_secs(30), &cancel).await?;
    assert_eq!(reason, WakeReason::Interrupted);

    // The session is still usable after DONE.
    assert_eq!(watcher.search_unseen().await?.len(), 1);

    writer.logout().await?;
    watcher.close(Duration::from_secs(5)).await;

    Ok(())
}
