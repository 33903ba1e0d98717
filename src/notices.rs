use std::collections::HashSet;
use std::time::Instant;

/// Notice severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// A transient notice in the queue.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub created_at: Instant,
}

/// Manages a queue of dismissible notices. Keyed pushes fire at most once
/// per queue lifetime.
pub struct NoticeQueue {
    pub notices: Vec<Notice>,
    pub duration_secs: u64,
    seen_keys: HashSet<String>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
            duration_secs: 5,
            seen_keys: HashSet::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: NoticeLevel) {
        self.notices.push(Notice {
            message: message.into(),
            level,
            created_at: Instant::now(),
        });
    }

    /// Push unless this key has already fired. Returns whether it fired.
    pub fn push_once(
        &mut self,
        key: impl Into<String>,
        message: impl Into<String>,
        level: NoticeLevel,
    ) -> bool {
        if !self.seen_keys.insert(key.into()) {
            return false;
        }
        self.push(message, level);
        true
    }

    /// Remove expired notices and return whether any remain.
    pub fn tick(&mut self) -> bool {
        let duration = std::time::Duration::from_secs(self.duration_secs);
        self.notices.retain(|n| n.created_at.elapsed() < duration);
        !self.notices.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn active(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn dismiss_active(&mut self) -> Option<Notice> {
        self.notices.pop()
    }
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new()
    }
}
