//! CRUD sub-routers for the document-backed resources.
//!
//! Each resource owns one collection in the document store and exposes the
//! same five operations:
//!
//! ```text
//! GET    /            list (page, limit, sort, field filters)
//! POST   /            create
//! GET    /{id}        fetch one
//! PUT    /{id}        merge-patch
//! DELETE /{id}        remove
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{Map, Value};

use crate::http::error::{self, ApiError};
use crate::http::request::ApiJson;
use crate::http::response::{created, ApiResponse, Paginated};
use crate::storage::document::is_valid_field;
use crate::storage::{DocumentStore, ListQuery, SortOrder};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A REST resource mounted under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Products,
    Orders,
    Inventory,
    Payments,
    Reviews,
    Sales,
    Messages,
    Tasks,
    Reports,
    Notifications,
    Deliveries,
    Announcements,
}

impl Resource {
    pub const ALL: [Resource; 13] = [
        Resource::Users,
        Resource::Products,
        Resource::Orders,
        Resource::Inventory,
        Resource::Payments,
        Resource::Reviews,
        Resource::Sales,
        Resource::Messages,
        Resource::Tasks,
        Resource::Reports,
        Resource::Notifications,
        Resource::Deliveries,
        Resource::Announcements,
    ];

    /// Path segment under `/api`; also the collection name.
    pub fn segment(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Products => "products",
            Resource::Orders => "orders",
            Resource::Inventory => "inventory",
            Resource::Payments => "payments",
            Resource::Reviews => "reviews",
            Resource::Sales => "sales",
            Resource::Messages => "messages",
            Resource::Tasks => "tasks",
            Resource::Reports => "reports",
            Resource::Notifications => "notifications",
            Resource::Deliveries => "deliveries",
            Resource::Announcements => "announcements",
        }
    }

    /// Singular name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Resource::Users => "User",
            Resource::Products => "Product",
            Resource::Orders => "Order",
            Resource::Inventory => "Inventory item",
            Resource::Payments => "Payment",
            Resource::Reviews => "Review",
            Resource::Sales => "Sale",
            Resource::Messages => "Message",
            Resource::Tasks => "Task",
            Resource::Reports => "Report",
            Resource::Notifications => "Notification",
            Resource::Deliveries => "Delivery",
            Resource::Announcements => "Announcement",
        }
    }

    fn not_found(self) -> ApiError {
        ApiError::NotFound(format!("{} not found", self.label()))
    }
}

#[derive(Clone)]
struct ResourceState {
    resource: Resource,
    store: Arc<dyn DocumentStore>,
}

pub fn router(resource: Resource, store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
        .method_not_allowed_fallback(error::not_found)
        .with_state(ResourceState { resource, store })
}

/// Parse paging, sorting and filters from the query string.
pub fn list_query(params: HashMap<String, String>) -> Result<(ListQuery, u64), ApiError> {
    let mut query = ListQuery {
        limit: DEFAULT_PAGE_SIZE,
        ..ListQuery::default()
    };
    let mut page = 1;

    for (key, value) in params {
        match key.as_str() {
            "page" => {
                page = value
                    .parse::<u64>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| ApiError::BadRequest("page must be a positive integer".into()))?;
            }
            "limit" => {
                query.limit = value
                    .parse::<u64>()
                    .ok()
                    .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
                    .ok_or_else(|| {
                        ApiError::BadRequest(format!("limit must be between 1 and {MAX_PAGE_SIZE}"))
                    })?;
            }
            "sort" => {
                query.sort = match value.as_str() {
                    "asc" => SortOrder::Ascending,
                    "desc" => SortOrder::Descending,
                    _ => return Err(ApiError::BadRequest("sort must be 'asc' or 'desc'".into())),
                };
            }
            _ => {
                if !is_valid_field(&key) {
                    return Err(ApiError::BadRequest(format!("invalid filter field '{key}'")));
                }
                query.filters.push((key, value));
            }
        }
    }

    query.filters.sort();
    query.offset = (page - 1)
        .checked_mul(query.limit)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| ApiError::BadRequest("page is out of range".into()))?;
    Ok((query, page))
}

fn into_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

async fn list(
    State(state): State<ResourceState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (query, page) = list_query(params)?;
    let result = state.store.list(state.resource.segment(), &query).await?;
    Ok(Paginated::new(result.items, result.total, page, query.limit).into_response())
}

async fn show(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let document = state
        .store
        .find(state.resource.segment(), &id)
        .await?
        .ok_or_else(|| state.resource.not_found())?;
    Ok(ApiResponse::data(document).into_response())
}

async fn create(
    State(state): State<ResourceState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Response, ApiError> {
    let data = into_object(body)?;
    let document = state.store.insert(state.resource.segment(), data).await?;

    tracing::info!(resource = state.resource.segment(), id = %document.id, "Created");
    Ok(created(document))
}

async fn update(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Response, ApiError> {
    let patch = into_object(body)?;
    let document = state
        .store
        .update(state.resource.segment(), &id, patch)
        .await?
        .ok_or_else(|| state.resource.not_found())?;
    Ok(ApiResponse::data(document).into_response())
}

async fn remove(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if !state.store.delete(state.resource.segment(), &id).await? {
        return Err(state.resource.not_found());
    }

    tracing::info!(resource = state.resource.segment(), id = %id, "Deleted");
    Ok(ApiResponse::message(format!("{} deleted", state.resource.label())).into_response())
}
