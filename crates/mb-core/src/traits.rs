//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.
//! Each method touches at most one thread document and, within it, at most
//! one reply whose id matches exactly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{BoardName, Reply, ReplyUpdate, Thread, UpdateResult};

/// Document persistence contract for threads and their embedded replies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThreadRepo: Send + Sync {
    // Thread Operations
    async fn insert_thread(&self, board: &BoardName, thread: Thread) -> anyhow::Result<()>;
    async fn find_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<Option<Thread>>;
    /// Threads ordered by `bumped_on` descending, at most `limit` of them.
    async fn recent_threads(&self, board: &BoardName, limit: usize) -> anyhow::Result<Vec<Thread>>;
    /// Returns the number of documents removed.
    async fn delete_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<u64>;
    /// Returns whether a thread matched.
    async fn report_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<bool>;

    // Reply Operations
    /// Appends `reply` and moves `bumped_on`. Returns whether a thread matched.
    async fn push_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply: Reply,
        bumped_on: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// The thread, only if it embeds a reply with `reply_id`.
    async fn find_thread_with_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
    ) -> anyhow::Result<Option<Thread>>;
    async fn update_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
        update: ReplyUpdate,
    ) -> anyhow::Result<UpdateResult>;
}
