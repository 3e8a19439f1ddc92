//! # mb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the thread
//! service. Mutations answer with a redirect or a plain-text outcome; reads
//! answer with JSON projections.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use mb_core::models::{ThreadSummary, ThreadView};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{Board, FormOrJson},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct NewThread {
    pub text: String,
    pub delete_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ThreadTarget {
    pub thread_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ThreadDeletion {
    pub thread_id: Uuid,
    pub delete_password: String,
}

#[derive(Debug, Deserialize)]
pub struct NewReply {
    pub thread_id: Uuid,
    pub text: String,
    pub delete_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyTarget {
    pub thread_id: Uuid,
    pub reply_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReplyDeletion {
    pub thread_id: Uuid,
    pub reply_id: Uuid,
    pub delete_password: String,
}

// ── /api/threads/{board} ─────────────────────────────────────────────────────

/// The ten most recently bumped threads with their three newest replies.
pub async fn list_threads(
    State(state): State<AppState>,
    Board(board): Board,
) -> Result<Json<Vec<ThreadSummary>>, ApiError> {
    debug!(%board, "listing threads");
    Ok(Json(state.service.list_threads(&board).await?))
}

/// Creates a thread and sends the browser back to the board page.
pub async fn create_thread(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<NewThread>,
) -> Result<Redirect, ApiError> {
    state
        .service
        .create_thread(&board, form.text, form.delete_password)
        .await?;
    Ok(Redirect::to(&format!("/b/{board}/")))
}

pub async fn report_thread(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<ThreadTarget>,
) -> Result<&'static str, ApiError> {
    let outcome = state.service.report_thread(&board, form.thread_id).await?;
    Ok(outcome.as_str())
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<ThreadDeletion>,
) -> Result<&'static str, ApiError> {
    let outcome = state
        .service
        .delete_thread(&board, form.thread_id, &form.delete_password)
        .await?;
    debug!(%board, thread_id = %form.thread_id, %outcome, "delete thread");
    Ok(outcome.as_str())
}

// ── /api/replies/{board} ─────────────────────────────────────────────────────

/// An entire thread with all of its replies.
pub async fn get_thread(
    State(state): State<AppState>,
    Board(board): Board,
    Query(query): Query<ThreadTarget>,
) -> Result<Json<ThreadView>, ApiError> {
    debug!(%board, thread_id = %query.thread_id, "fetching thread");
    Ok(Json(state.service.get_thread(&board, query.thread_id).await?))
}

/// Appends a reply and sends the browser back to the thread page.
pub async fn create_reply(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<NewReply>,
) -> Result<Redirect, ApiError> {
    state
        .service
        .append_reply(&board, form.thread_id, form.text, form.delete_password)
        .await?;
    Ok(Redirect::to(&format!("/b/{board}/{}", form.thread_id)))
}

pub async fn report_reply(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<ReplyTarget>,
) -> Result<&'static str, ApiError> {
    let outcome = state
        .service
        .report_reply(&board, form.thread_id, form.reply_id)
        .await?;
    Ok(outcome.as_str())
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Board(board): Board,
    FormOrJson(form): FormOrJson<ReplyDeletion>,
) -> Result<&'static str, ApiError> {
    let outcome = state
        .service
        .delete_reply(&board, form.thread_id, form.reply_id, &form.delete_password)
        .await?;
    debug!(%board, thread_id = %form.thread_id, reply_id = %form.reply_id, %outcome, "delete reply");
    Ok(outcome.as_str())
}

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
