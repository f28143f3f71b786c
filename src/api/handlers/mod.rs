pub mod auctions;
pub mod bids;
pub mod health;
pub mod root;
pub mod users;

// common functions for the handlers
use crate::{api::error::ApiError, store::Store};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use regex::Regex;
use std::sync::Arc;

/// Store handle injected into every handler through `Extension`.
pub type SharedStore = Arc<dyn Store>;

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Unwrap a JSON body, turning extractor rejections into `{message}` errors.
pub(crate) fn payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

pub(crate) fn path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value).map_err(ApiError::from)
}

pub(crate) fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(value)| value).map_err(ApiError::from)
}
