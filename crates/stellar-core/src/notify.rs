//! Player-facing notices with bounded retention.
//!
//! Engine actions post [`Notice`] values into a fixed-capacity queue. The
//! frontend drains or iterates them for display; anything not consumed
//! expires after a short time-to-live, and when the queue is full the
//! oldest notice is dropped to make room. Notices are ephemeral and never
//! serialized.

use crate::id::{AchievementId, EventTypeId};
use std::collections::VecDeque;

/// How long an unconsumed notice stays visible, in milliseconds.
pub const NOTICE_TTL_MS: u64 = 3_000;

/// Default queue capacity.
pub const NOTICE_CAPACITY: usize = 32;

/// Something the player should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    AchievementUnlocked { achievement: AchievementId },
    EventOffered { event: EventTypeId },
    PrestigeCompleted { dust: f64 },
    OfflineProgress { energy: f64, seconds: u64 },
}

/// A notice plus the time it was posted, for TTL expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedNotice {
    pub notice: Notice,
    pub posted_at_ms: u64,
}

/// Fixed-capacity notice queue. When full, the oldest notice is dropped.
#[derive(Debug)]
pub struct NotificationQueue {
    notices: VecDeque<PostedNotice>,
    capacity: usize,
    /// Total notices ever posted, including dropped ones.
    total_posted: u64,
    dropped: u64,
}

impl NotificationQueue {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        NotificationQueue {
            notices: VecDeque::with_capacity(capacity),
            capacity,
            total_posted: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, notice: Notice, now_ms: u64) {
        if self.notices.len() == self.capacity {
            self.notices.pop_front();
            self.dropped += 1;
        }
        self.notices.push_back(PostedNotice {
            notice,
            posted_at_ms: now_ms,
        });
        self.total_posted += 1;
    }

    /// Drop notices whose time-to-live has elapsed.
    pub fn expire(&mut self, now_ms: u64) {
        while let Some(front) = self.notices.front() {
            if front.posted_at_ms.saturating_add(NOTICE_TTL_MS) <= now_ms {
                self.notices.pop_front();
            } else {
                break;
            }
        }
    }

    /// Iterate notices oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &PostedNotice> {
        self.notices.iter()
    }

    /// Take every queued notice, oldest first.
    pub fn drain(&mut self) -> Vec<PostedNotice> {
        self.notices.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total notices posted since creation, including dropped ones.
    pub fn total_posted(&self) -> u64 {
        self.total_posted
    }

    /// Notices dropped because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(NOTICE_CAPACITY)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
