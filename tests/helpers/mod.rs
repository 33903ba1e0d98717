pub mod fixtures;
pub mod logging;

use tokio::sync::mpsc;
use triage_console::models::Snapshot;
use triage_console::nav::MemoryNavigation;
use triage_console::session::{feed_channel, FeedEvent, InboxSession};

/// Session wired to in-memory ports with one snapshot already applied.
/// Returns the feed sender so tests can push follow-up snapshots.
pub fn session_with(
    snapshot: Snapshot,
) -> (
    InboxSession<MemoryNavigation>,
    mpsc::UnboundedSender<FeedEvent>,
) {
    let (feed_tx, feed_rx) = feed_channel();
    let mut session = InboxSession::in_memory(feed_rx);
    feed_tx
        .send(FeedEvent::Snapshot(snapshot))
        .expect("feed channel open");
    assert!(session.poll_feed(), "initial snapshot should apply");
    (session, feed_tx)
}
