//! # Thread Service
//!
//! Read and mutation operations over a [`ThreadRepo`]. Holds no state of its
//! own between calls; every find-then-write is two independent store calls,
//! so a concurrent delete in between simply shows up as "no match".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{BoardName, Outcome, Reply, ReplyUpdate, Thread, ThreadSummary, ThreadView};
use crate::projection::{self, THREAD_LIMIT};
use crate::traits::ThreadRepo;

/// Durability requested from the store for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConcern {
    /// Wait for the write to reach the journal before acknowledging.
    pub journal: bool,
    /// Bounded wait for the acknowledgment.
    pub timeout: Duration,
}

impl Default for WriteConcern {
    fn default() -> Self {
        Self {
            journal: true,
            timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Clone)]
pub struct ThreadService {
    repo: Arc<dyn ThreadRepo>,
    write_concern: WriteConcern,
}

impl ThreadService {
    pub fn new(repo: Arc<dyn ThreadRepo>, write_concern: WriteConcern) -> Self {
        Self { repo, write_concern }
    }

    /// Awaits a store write, failing if it is not acknowledged in time.
    /// The write is attempted once; there is no retry.
    async fn acknowledged<T, F>(&self, op: &str, write: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.write_concern.timeout, write).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                warn!(op, timeout_ms = self.write_concern.timeout.as_millis() as u64, "write not acknowledged");
                Err(AppError::Internal(format!(
                    "{op} not acknowledged within {}ms",
                    self.write_concern.timeout.as_millis()
                )))
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub async fn list_threads(&self, board: &BoardName) -> Result<Vec<ThreadSummary>> {
        let threads = self.repo.recent_threads(board, THREAD_LIMIT).await?;
        Ok(projection::list_recent(&threads))
    }

    pub async fn get_thread(&self, board: &BoardName, thread_id: Uuid) -> Result<ThreadView> {
        match self.repo.find_thread(board, thread_id).await? {
            Some(thread) => Ok(projection::full_thread(&thread)),
            None => Err(AppError::NotFound(format!(
                "Failed to fetch thread with id: {thread_id}"
            ))),
        }
    }

    // ── Thread mutations ─────────────────────────────────────────────────────

    /// Stores a new thread and returns its id. Text and password are taken as-is.
    pub async fn create_thread(
        &self,
        board: &BoardName,
        text: String,
        delete_password: String,
    ) -> Result<Uuid> {
        let thread = Thread::new(text, delete_password, Utc::now());
        let id = thread.id;
        self.acknowledged("insert thread", self.repo.insert_thread(board, thread))
            .await?;
        info!(%board, thread_id = %id, "thread created");
        Ok(id)
    }

    pub async fn delete_thread(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        delete_password: &str,
    ) -> Result<Outcome> {
        let thread = self
            .repo
            .find_thread(board, thread_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Thread not found.".to_string()))?;

        if thread.delete_password != delete_password {
            return Ok(Outcome::IncorrectPassword);
        }

        let deleted = self
            .acknowledged("delete thread", self.repo.delete_thread(board, thread_id))
            .await?;
        if deleted != 1 {
            return Err(AppError::Internal(format!(
                "Could not delete thread with id: {thread_id}"
            )));
        }
        info!(%board, %thread_id, "thread deleted");
        Ok(Outcome::Success)
    }

    pub async fn report_thread(&self, board: &BoardName, thread_id: Uuid) -> Result<Outcome> {
        let matched = self
            .acknowledged("report thread", self.repo.report_thread(board, thread_id))
            .await?;
        if matched {
            Ok(Outcome::Success)
        } else {
            Err(AppError::NotFound(format!(
                "Failed to report thread with id: {thread_id}"
            )))
        }
    }

    // ── Reply mutations ──────────────────────────────────────────────────────

    /// Appends a reply and bumps the thread. Returns the reply id.
    pub async fn append_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        text: String,
        delete_password: String,
    ) -> Result<Uuid> {
        let now = Utc::now();
        let reply = Reply::new(text, delete_password, now);
        let reply_id = reply.id;

        let matched = self
            .acknowledged("append reply", self.repo.push_reply(board, thread_id, reply, now))
            .await?;
        if !matched {
            return Err(AppError::NotFound(format!(
                "Failed to post new reply to thread with id: {thread_id}"
            )));
        }
        info!(%board, %thread_id, %reply_id, "reply appended");
        Ok(reply_id)
    }

    /// Soft-deletes a reply: its text becomes `[deleted]`, the record stays.
    pub async fn delete_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
        delete_password: &str,
    ) -> Result<Outcome> {
        let Some(thread) = self
            .repo
            .find_thread_with_reply(board, thread_id, reply_id)
            .await?
        else {
            return Ok(Outcome::IncorrectIds);
        };
        let Some(reply) = thread.reply(reply_id) else {
            return Ok(Outcome::IncorrectIds);
        };

        if reply.delete_password != delete_password {
            return Ok(Outcome::IncorrectPassword);
        }

        let result = self
            .acknowledged(
                "delete reply",
                self.repo
                    .update_reply(board, thread_id, reply_id, ReplyUpdate::SoftDelete),
            )
            .await?;
        if result.modified {
            Ok(Outcome::Success)
        } else {
            Ok(Outcome::AlreadyDeleted)
        }
    }

    pub async fn report_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
    ) -> Result<Outcome> {
        let result = self
            .acknowledged(
                "report reply",
                self.repo
                    .update_reply(board, thread_id, reply_id, ReplyUpdate::Report),
            )
            .await?;
        if result.matched {
            Ok(Outcome::Success)
        } else {
            Ok(Outcome::IncorrectIds)
        }
    }
}
