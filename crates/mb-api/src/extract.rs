//! Request extractors: the validated board from the path, and bodies that
//! may arrive either as HTML form posts or as JSON.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form, Json,
};
use mb_core::{AppError, BoardName};
use serde::de::DeserializeOwned;

use crate::{error::ApiError, AppState};

/// The `:board` path segment, checked against [`crate::BoardPolicy`].
pub struct Board(pub BoardName);

impl FromRequestParts<AppState> for Board {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::ValidationError(e.body_text()))?;

        let board = BoardName::parse(&raw)?;
        state.boards.check(&board)?;
        Ok(Board(board))
    }
}

/// Deserializes `application/json` bodies as JSON and everything else as
/// `application/x-www-form-urlencoded`.
pub struct FormOrJson<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
}

impl<S, T> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::ValidationError(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::ValidationError(e.body_text()))?;
            Ok(Self(value))
        }
    }
}
