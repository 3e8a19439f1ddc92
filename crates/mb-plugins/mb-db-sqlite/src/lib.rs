//! # mb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `mb-core` thread documents. A thread is one row in `threads`; its
//! embedded replies are rows in `replies` ordered by `seq`.

use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::models::{BoardName, Reply, ReplyUpdate, Thread, UpdateResult, DELETED_TEXT};
use mb_core::traits::ThreadRepo;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow, SqliteSynchronous,
};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

pub struct SqliteThreadRepo {
    pool: SqlitePool,
}

// Helpers for UUID and timestamp conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

/// Timestamps are stored as integer nanoseconds. sqlx would bind
/// `DateTime<Utc>` as RFC 3339 text, whose ordering breaks across offsets and
/// sub-second precision; `ORDER BY bumped_on` needs a numeric column.
fn to_nanos(at: DateTime<Utc>) -> anyhow::Result<i64> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| anyhow!("timestamp out of range: {at}"))
}

fn from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}

fn reply_from_row(row: &SqliteRow) -> anyhow::Result<Reply> {
    Ok(Reply {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        text: row.try_get("text")?,
        created_on: from_nanos(row.try_get("created_on")?),
        reported: row.try_get("reported")?,
        delete_password: row.try_get("delete_password")?,
    })
}

fn thread_from_row(row: &SqliteRow, replies: Vec<Reply>) -> anyhow::Result<Thread> {
    Ok(Thread {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        text: row.try_get("text")?,
        created_on: from_nanos(row.try_get("created_on")?),
        bumped_on: from_nanos(row.try_get("bumped_on")?),
        reported: row.try_get("reported")?,
        delete_password: row.try_get("delete_password")?,
        replies,
    })
}

async fn insert_reply(conn: &mut SqliteConnection, thread_id: Uuid, reply: &Reply) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO replies (id, thread_id, text, created_on, reported, delete_password) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(uuid_to_blob(reply.id))
        .bind(uuid_to_blob(thread_id))
        .bind(&reply.text)
        .bind(to_nanos(reply.created_on)?)
        .bind(reply.reported)
        .bind(&reply.delete_password)
        .execute(conn)
        .await?;
    Ok(())
}

impl SqliteThreadRepo {
    /// Opens (creating if needed) the database at `url` and runs migrations.
    ///
    /// `journal` selects `synchronous = FULL`, so a write is only acknowledged
    /// once it is in the WAL on disk.
    pub async fn connect(url: &str, max_connections: u32, journal: bool) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(if journal {
                SqliteSynchronous::Full
            } else {
                SqliteSynchronous::Normal
            });

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, bringing its schema up to date.
    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("sqlite schema up to date");
        Ok(Self { pool })
    }

    async fn load_replies(&self, thread_id: Uuid) -> anyhow::Result<Vec<Reply>> {
        sqlx::query("SELECT id, text, created_on, reported, delete_password FROM replies WHERE thread_id = ? ORDER BY seq ASC")
            .bind(uuid_to_blob(thread_id))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(reply_from_row)
            .collect()
    }

    async fn hydrate(&self, row: &SqliteRow) -> anyhow::Result<Thread> {
        let id = blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?;
        let replies = self.load_replies(id).await?;
        thread_from_row(row, replies)
    }
}

#[async_trait]
impl ThreadRepo for SqliteThreadRepo {
    /// Inserts the thread row and any replies it already carries atomically.
    async fn insert_thread(&self, board: &BoardName, thread: Thread) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO threads (id, board, text, created_on, bumped_on, reported, delete_password) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(thread.id))
            .bind(board.as_str())
            .bind(&thread.text)
            .bind(to_nanos(thread.created_on)?)
            .bind(to_nanos(thread.bumped_on)?)
            .bind(thread.reported)
            .bind(&thread.delete_password)
            .execute(&mut *tx)
            .await?;

        for reply in &thread.replies {
            insert_reply(&mut tx, thread.id, reply).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query("SELECT * FROM threads WHERE board = ? AND id = ?")
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    async fn recent_threads(&self, board: &BoardName, limit: usize) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query("SELECT * FROM threads WHERE board = ? ORDER BY bumped_on DESC LIMIT ?")
            .bind(board.as_str())
            .bind(i64::try_from(limit)?)
            .fetch_all(&self.pool)
            .await?;

        let mut threads = Vec::with_capacity(rows.len());
        for row in &rows {
            threads.push(self.hydrate(row).await?);
        }
        Ok(threads)
    }

    /// Replies go with the thread through `ON DELETE CASCADE`.
    async fn delete_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM threads WHERE board = ? AND id = ?")
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn report_thread(&self, board: &BoardName, thread_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE threads SET reported = 1 WHERE board = ? AND id = ?")
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn push_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply: Reply,
        bumped_on: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE threads SET bumped_on = ? WHERE board = ? AND id = ?")
            .bind(to_nanos(bumped_on)?)
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id))
            .execute(&mut *tx)
            .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_reply(&mut tx, thread_id, &reply).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn find_thread_with_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
    ) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query(
            "SELECT t.* FROM threads t WHERE t.board = ? AND t.id = ? \
             AND EXISTS (SELECT 1 FROM replies r WHERE r.thread_id = t.id AND r.id = ?)",
        )
        .bind(board.as_str())
        .bind(uuid_to_blob(thread_id))
        .bind(uuid_to_blob(reply_id))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    /// One conditional statement per update, so concurrent writers only ever
    /// wait on the write lock and never hold a stale read snapshot.
    async fn update_reply(
        &self,
        board: &BoardName,
        thread_id: Uuid,
        reply_id: Uuid,
        update: ReplyUpdate,
    ) -> anyhow::Result<UpdateResult> {
        let statement = match update {
            ReplyUpdate::SoftDelete => sqlx::query(
                "UPDATE replies SET text = ? WHERE id = ? \
                 AND thread_id = (SELECT id FROM threads WHERE board = ? AND id = ?) \
                 AND text <> ?",
            )
            .bind(DELETED_TEXT)
            .bind(uuid_to_blob(reply_id))
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id))
            .bind(DELETED_TEXT),
            ReplyUpdate::Report => sqlx::query(
                "UPDATE replies SET reported = 1 WHERE id = ? \
                 AND thread_id = (SELECT id FROM threads WHERE board = ? AND id = ?) \
                 AND reported = 0",
            )
            .bind(uuid_to_blob(reply_id))
            .bind(board.as_str())
            .bind(uuid_to_blob(thread_id)),
        };

        if statement.execute(&self.pool).await?.rows_affected() == 1 {
            return Ok(UpdateResult { matched: true, modified: true });
        }

        let matched: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM replies r JOIN threads t ON t.id = r.thread_id \
             WHERE t.board = ? AND t.id = ? AND r.id = ?)",
        )
        .bind(board.as_str())
        .bind(uuid_to_blob(thread_id))
        .bind(uuid_to_blob(reply_id))
        .fetch_one(&self.pool)
        .await?;
        Ok(UpdateResult { matched: matched != 0, modified: false })
    }
}
