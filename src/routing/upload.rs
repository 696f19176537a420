//! File uploads.
//!
//! Files are written as-is under the uploads directory with a fresh UUID
//! name; the original extension is kept so static serving picks the right
//! content type. A request is all or nothing: every field is validated
//! before the first file is written.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::http::error::{self, ApiError};
use crate::http::response::{created, ApiResponse};

/// Multipart overhead allowed on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
struct UploadState {
    dir: Arc<PathBuf>,
    config: Arc<UploadConfig>,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    folder: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: usize,
    pub content_type: Option<String>,
}

/// A validated file held in memory until the whole request checks out.
struct PendingFile {
    filename: String,
    original_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

pub fn router(dir: PathBuf, config: UploadConfig) -> Router {
    let body_limit = config.max_file_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", post(upload))
        .route("/{*path}", delete(remove))
        .method_not_allowed_fallback(error::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(UploadState {
            dir: Arc::new(dir),
            config: Arc::new(config),
        })
}

/// Folder names: lower-case ASCII letters, digits, `-` and `_`.
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Lower-cased extension of a client file name.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}

/// Resolve a client-supplied relative path inside `root`, refusing traversal.
pub fn resolve_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut resolved = root.to_path_buf();
    let mut depth = 0;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    (depth > 0).then_some(resolved)
}

async fn upload(
    State(state): State<UploadState>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart?;

    let (target, url_prefix) = match params.folder.as_deref() {
        Some(folder) if is_valid_folder(folder) => {
            (state.dir.join(folder), format!("/uploads/{folder}"))
        }
        Some(folder) => {
            return Err(ApiError::BadRequest(format!("invalid folder '{folder}'")));
        }
        None => (state.dir.as_ref().clone(), "/uploads".to_string()),
    };

    // Every field is checked before anything touches the disk.
    let mut pending = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let extension = extension_of(&original_name)
            .filter(|ext| state.config.allows(ext))
            .ok_or_else(|| {
                ApiError::UnsupportedMediaType(format!(
                    "File type not allowed. Allowed: {}",
                    state.config.allowed_extensions.join(", ")
                ))
            })?;

        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.len() > state.config.max_file_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                state.config.max_file_bytes
            )));
        }

        pending.push(PendingFile {
            filename: format!("{}.{extension}", Uuid::new_v4()),
            original_name,
            content_type,
            bytes,
        });
    }

    if pending.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }

    tokio::fs::create_dir_all(&target).await?;
    let mut written = Vec::with_capacity(pending.len());
    for file in &pending {
        let path = target.join(&file.filename);
        if let Err(e) = tokio::fs::write(&path, &file.bytes).await {
            remove_all(&written).await;
            return Err(e.into());
        }
        written.push(path);
    }

    let saved: Vec<UploadedFile> = pending
        .into_iter()
        .map(|file| {
            tracing::info!(file = %file.filename, size = file.bytes.len(), "File uploaded");
            UploadedFile {
                url: format!("{url_prefix}/{}", file.filename),
                size: file.bytes.len(),
                filename: file.filename,
                original_name: file.original_name,
                content_type: file.content_type,
            }
        })
        .collect();

    Ok(created(saved))
}

async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}

async fn remove(
    State(state): State<UploadState>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> Result<Response, ApiError> {
    let file = resolve_within(&state.dir, &path)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid path '{path}'")))?;

    match tokio::fs::remove_file(&file).await {
        Ok(()) => {
            tracing::info!(path = %path, "Upload deleted");
            Ok(ApiResponse::message("File deleted").into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound("File not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
