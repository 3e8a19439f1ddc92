//! # mb-db-memory
//!
//! In-process implementation of `ThreadRepo`.
//! Each board is one `DashMap` entry; holding that entry's guard for the
//! duration of an operation gives the same per-document atomicity a document
//! store provides. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mb_core::models::{BoardName, Reply, ReplyUpdate, Thread, UpdateResult, DELETED_TEXT};
use mb_core::traits::ThreadRepo;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryThreadRepo {
    boards: DashMap<BoardName, Vec<Thread>>,
}

impl MemoryThreadRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadRepo for MemoryThreadRepo {
    async fn insert_thread(&self, board: &BoardName, thread: Thread) -> anyhow::Result<()> {
        let mut threads = self.boards.entry(board.clone()).or_default();
        if threads.iter().any(|t| t.id == thread.id) {
            anyhow::bail!("duplicate thread id {}", thread.id);
        }
        threads.push(thread);
        Ok(())
    }

    async fn find_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<Option<Thread>> {
        Ok(self
            .boards
            .get(board)
            .and_then(|threads| threads.iter().find(|t| t.id == thread_id).cloned()))
    }

    async fn recent_threads(&self, board: &BoardName, limit: usize) -> anyhow::Result<Vec<Thread>> {
        let mut threads = match self.boards.get(board) {
            Some(threads) => threads.clone(),
            None => return Ok(Vec::new()),
        };
        threads.sort_by(|a, b| b.bumped_on.cmp(&a.bumped_on));
        threads.truncate(limit);
        Ok(threads)
    }

    async fn delete_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<u64> {
        let Some(mut threads) = self.boards.get_mut(board) else {
            return Ok(0);
        };
        let before = threads.len();
        threads.retain(|t| t.id != thread_id);
        Ok((before - threads.len()) as u64)
    }

    async fn report_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<bool> {
        let Some(mut threads) = self.boards.get_mut(board) else {
            return Ok(false);
        };
        match threads.iter_mut().find(|t| t.id == thread_id) {
            Some(thread) => {
                thread.reported = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply: Reply,
        bumped_on: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let Some(mut threads) = self.boards.get_mut(board) else {
            return Ok(false);
        };
        match threads.iter_mut().find(|t| t.id == thread_id) {
            Some(thread) => {
                thread.bumped_on = bumped_on;
                thread.replies.push(reply);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_thread_with_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
    ) -> anyhow::Result<Option<Thread>> {
        Ok(self.find_thread(board, thread_id).await?.filter(|t| t.reply(reply_id).is_some()))
    }

    async fn update_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
        update: ReplyUpdate,
    ) -> anyhow::Result<UpdateResult> {
        let Some(mut threads) = self.boards.get_mut(board) else {
            return Ok(UpdateResult::default());
        };
        let reply = threads
            .iter_mut()
            .filter(|t| t.id == thread_id)
            .flat_map(|t| t.replies.iter_mut())
            .find(|r| r.id == reply_id);

        let Some(reply) = reply else {
            return Ok(UpdateResult::default());
        };

        let modified = match update {
            ReplyUpdate::SoftDelete if reply.text == DELETED_TEXT => false,
            ReplyUpdate::SoftDelete => {
                reply.text = DELETED_TEXT.to_string();
                true
            }
            ReplyUpdate::Report => !std::mem::replace(&mut reply.reported, true),
        };
        Ok(UpdateResult { matched: true, modified })
    }
}
