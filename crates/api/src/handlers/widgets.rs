//! Handlers for widget CRUD, placement, refresh and form submission.

use std::path::PathBuf;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pulseboard_core::types::DbId;
use pulseboard_core::webhook::{contains_upload, ExtraData, UploadedFile};
use pulseboard_core::widget::{Position, WidgetRecord};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ActingUser;
use crate::operations;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/widgets
///
/// Create a widget on one of the acting user's dashboards.
pub async fn create_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Json(record): Json<WidgetRecord>,
) -> AppResult<impl IntoResponse> {
    let view = operations::create_widget(&state, user.user_id, record).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/widgets/{id}
///
/// The stored record plus a placeholder rendering.
pub async fn get_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = operations::get_widget(&state, user.user_id, widget_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/widgets/{id}
///
/// Replace title, configuration, webhook, position and status wholesale.
pub async fn update_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
    Json(record): Json<WidgetRecord>,
) -> AppResult<impl IntoResponse> {
    let view = operations::update_widget(&state, user.user_id, widget_id, record).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/widgets/{id}
pub async fn delete_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    operations::delete_widget(&state, user.user_id, widget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/widgets/{id}/position
pub async fn update_position(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
    Json(position): Json<Position>,
) -> AppResult<impl IntoResponse> {
    let record =
        operations::update_widget_position(&state, user.user_id, widget_id, position).await?;
    Ok(Json(DataResponse { data: record }))
}

/// POST /api/v1/widgets/{id}/refresh
///
/// Call the widget's webhook and return the rendered widget.
pub async fn refresh_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let rendered = operations::refresh_widget(&state, user.user_id, widget_id).await?;
    Ok(Json(DataResponse { data: rendered }))
}

// ---------------------------------------------------------------------------
// Form submission
// ---------------------------------------------------------------------------

/// POST /api/v1/widgets/{id}/submit
///
/// Accepts a JSON object, or `multipart/form-data` when files are attached.
/// Uploaded files are staged under `UPLOAD_DIR` for the duration of the
/// webhook call and removed afterwards.
pub async fn submit_widget(
    user: ActingUser,
    State(state): State<AppState>,
    Path(widget_id): Path<DbId>,
    request: Request,
) -> AppResult<impl IntoResponse> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut staged = Vec::new();
    let form = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let read = read_multipart(&state.config.upload_dir, multipart, &mut staged).await;
        match read {
            Ok(form) => form,
            Err(e) => {
                discard_staged(&staged).await;
                return Err(e);
            }
        }
    } else {
        let Json(form) = Json::<ExtraData>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        // Upload descriptors name server-side paths; only multipart may create them.
        if contains_upload(&form) {
            return Err(AppError::BadRequest(
                "File uploads must be sent as multipart/form-data".to_string(),
            ));
        }
        form
    };

    let result = operations::submit_widget(&state, user.user_id, widget_id, &form).await;
    discard_staged(&staged).await;

    Ok(Json(DataResponse { data: result? }))
}

/// Collect text fields as strings and stage file fields on disk.
async fn read_multipart(
    upload_dir: &std::path::Path,
    mut multipart: Multipart,
    staged: &mut Vec<PathBuf>,
) -> AppResult<ExtraData> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;

    let mut form = ExtraData::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.insert(name, Value::String(text));
            continue;
        };

        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        // An untouched file input arrives as an empty, unnamed part.
        if file_name.is_empty() && data.is_empty() {
            continue;
        }

        let tmp_path = upload_dir.join(uuid::Uuid::new_v4().to_string());
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to stage upload: {e}")))?;
        staged.push(tmp_path.clone());

        let upload = UploadedFile {
            name: file_name,
            tmp_path: tmp_path.to_string_lossy().into_owned(),
            size: data.len() as u64,
            content_type,
        };
        tracing::debug!(field = %name, file = %upload.name, size = upload.size, "Staged form upload");
        form.insert(name, upload.to_value());
    }
    Ok(form)
}

async fn discard_staged(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged upload");
        }
    }
}
