//! # Projection Engine
//!
//! Builds the read-side views of a board. Both operations are pure transforms
//! over stored documents:
//!
//! 1. expand every thread into one row per reply, tagged with the parent and
//!    the total reply count (a reply-less thread yields one empty row),
//! 2. sort rows newest-first where a preview cutoff applies,
//! 3. regroup rows per parent, taking thread fields from the first row seen,
//!    and dropping the empty row of reply-less threads,
//! 4. truncate each group to the cutoff,
//! 5. for the listing only, order threads by bump time and keep the top ones.

use chrono::{DateTime, Utc};

use crate::models::{Reply, ReplyView, Thread, ThreadSummary, ThreadView};

/// Threads shown on a board listing.
pub const THREAD_LIMIT: usize = 10;

/// Replies previewed under each listed thread.
pub const REPLY_PREVIEW: usize = 3;

struct Row<'a> {
    parent: &'a Thread,
    replycount: usize,
    reply: Option<&'a Reply>,
}

impl Row<'_> {
    fn reply_created_on(&self) -> Option<DateTime<Utc>> {
        self.reply.map(|r| r.created_on)
    }
}

struct Group<'a> {
    parent: &'a Thread,
    replycount: usize,
    replies: Vec<ReplyView>,
}

fn expand(threads: &[Thread]) -> Vec<Row<'_>> {
    let mut rows = Vec::new();
    for parent in threads {
        let replycount = parent.replies.len();
        if replycount == 0 {
            rows.push(Row { parent, replycount, reply: None });
        }
        rows.extend(parent.replies.iter().map(|reply| Row {
            parent,
            replycount,
            reply: Some(reply),
        }));
    }
    rows
}

fn regroup(rows: Vec<Row<'_>>) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for row in rows {
        let idx = match groups.iter().position(|g| g.parent.id == row.parent.id) {
            Some(idx) => idx,
            None => {
                groups.push(Group {
                    parent: row.parent,
                    replycount: row.replycount,
                    replies: Vec::new(),
                });
                groups.len() - 1
            }
        };

        if row.replycount > 0 {
            if let Some(reply) = row.reply {
                groups[idx].replies.push(redact(reply));
            }
        }
    }
    groups
}

fn redact(reply: &Reply) -> ReplyView {
    ReplyView {
        id: reply.id,
        text: reply.text.clone(),
        created_on: reply.created_on,
    }
}

/// The board listing: the most recently bumped threads, each with its newest
/// replies and the total reply count.
pub fn list_recent(threads: &[Thread]) -> Vec<ThreadSummary> {
    let mut rows = expand(threads);
    rows.sort_by(|a, b| b.reply_created_on().cmp(&a.reply_created_on()));

    let mut summaries: Vec<ThreadSummary> = regroup(rows)
        .into_iter()
        .map(|mut group| {
            group.replies.truncate(REPLY_PREVIEW);
            ThreadSummary {
                id: group.parent.id,
                text: group.parent.text.clone(),
                created_on: group.parent.created_on,
                bumped_on: group.parent.bumped_on,
                replycount: group.replycount,
                replies: group.replies,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.bumped_on.cmp(&a.bumped_on));
    summaries.truncate(THREAD_LIMIT);
    summaries
}

/// The single-thread view: every reply, in insertion order.
pub fn full_thread(thread: &Thread) -> ThreadView {
    let rows = expand(std::slice::from_ref(thread));
    let replies = regroup(rows)
        .into_iter()
        .next()
        .map(|group| group.replies)
        .unwrap_or_default();

    ThreadView {
        id: thread.id,
        text: thread.text.clone(),
        created_on: thread.created_on,
        bumped_on: thread.bumped_on,
        replies,
    }
}
