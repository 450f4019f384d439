//! Session change feed that nudges live screens to re-fetch.
//!
//! Whatever owns the session (key rotation, permission changes applied
//! through the settings screen) announces here; every controller attached to
//! the feed refreshes its list so stale rows never outlive the session that
//! loaded them.

use tokio::sync::watch;

/// One announced session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Monotonic revision, bumped per announcement.
    pub revision: u64,
    /// Operator-facing description of what changed.
    pub description: String,
    /// Set when this announcement changed the rows-per-page preference.
    /// Screens that see it return to page one at the new size.
    pub page_size: Option<u32>,
}

/// Publisher side of the session feed.
pub struct SessionFeed {
    tx: watch::Sender<SessionInfo>,
}

impl SessionFeed {
    /// A feed at revision zero; subscribers only hear announcements made
    /// after they attach.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionInfo {
            revision: 0,
            description: String::new(),
            page_size: None,
        });
        Self { tx }
    }

    /// Announce a session change to every attached screen.
    pub fn announce(&self, description: impl Into<String>) {
        let description = description.into();
        self.tx.send_modify(|info| {
            info.revision += 1;
            info.description = description;
            info.page_size = None;
        });
    }

    /// Announce that the rows-per-page preference changed.
    pub fn announce_page_size(&self, page_size: u32, description: impl Into<String>) {
        let description = description.into();
        self.tx.send_modify(|info| {
            info.revision += 1;
            info.description = description;
            info.page_size = Some(page_size);
        });
    }

    /// Attach a subscriber.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionInfo> {
        self.tx.subscribe()
    }
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}
