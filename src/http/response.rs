//! Response envelopes.
//!
//! Successful API responses share one shape: `success: true` plus either a
//! `data` payload or a `message`. Listings add paging counters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `201 Created` with the standard envelope.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, ApiResponse::data(data)).into_response()
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
    pub data: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        Self {
            success: true,
            count: data.len(),
            total,
            page,
            pages: total.div_ceil(limit.max(1)),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
