//! # Domain Models
//!
//! These structs represent the stored documents of the message board and the
//! redacted projections handed out to clients.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Text a reply carries once its author has deleted it.
pub const DELETED_TEXT: &str = "[deleted]";

/// Longest board name accepted at the boundary.
pub const MAX_BOARD_LEN: usize = 64;

/// A validated board identifier (e.g., "b", "general").
///
/// Storage backends only ever see a `BoardName`, so a request path can never
/// address anything other than a board partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BoardName(String);

impl BoardName {
    /// Checks that `raw` is 1..=64 ASCII alphanumerics, `-` or `_`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let well_formed = !raw.is_empty()
            && raw.len() <= MAX_BOARD_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::ValidationError(format!("invalid board name: {raw:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BoardName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A top-level post on a board, stored with its replies embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    /// Moves forward whenever a reply is appended; drives listing order.
    pub bumped_on: DateTime<Utc>,
    pub reported: bool,
    pub delete_password: String,
    pub replies: Vec<Reply>,
}

impl Thread {
    /// A fresh thread: not reported, no replies, bumped at creation time.
    pub fn new(text: String, delete_password: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text,
            created_on: now,
            bumped_on: now,
            reported: false,
            delete_password,
            replies: Vec::new(),
        }
    }

    pub fn reply(&self, reply_id: Uuid) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }
}

/// A child post, owned by exactly one thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub reported: bool,
    pub delete_password: String,
}

impl Reply {
    pub fn new(text: String, delete_password: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text,
            created_on: now,
            reported: false,
            delete_password,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.text == DELETED_TEXT
    }
}

/// Public face of a reply. Has no room for `reported` or `delete_password`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
}

/// A thread as it appears in the board listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub bumped_on: DateTime<Utc>,
    /// Total replies, counted before the preview is truncated.
    pub replycount: usize,
    pub replies: Vec<ReplyView>,
}

/// A thread with its entire reply sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub bumped_on: DateTime<Utc>,
    pub replies: Vec<ReplyView>,
}

/// Element-targeted change applied to a single embedded reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyUpdate {
    /// Replace the text with [`DELETED_TEXT`].
    SoftDelete,
    /// Set the reported flag.
    Report,
}

/// Result of an element-targeted update, in document-store terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// A thread containing the reply was found.
    pub matched: bool,
    /// The reply's stored value actually changed.
    pub modified: bool,
}

/// Non-error outcomes of a mutation, returned to the client as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    IncorrectPassword,
    AlreadyDeleted,
    IncorrectIds,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::IncorrectPassword => "incorrect password",
            Outcome::AlreadyDeleted => "Reply is already deleted.",
            Outcome::IncorrectIds => "Incorrect thread_id or reply_id",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
