//! Media upload stub. Blob storage is an external collaborator; this
//! endpoint accepts one file, assigns it a retrievable URL and reports the
//! size it consumed.

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::FieldError;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::created;
use crate::AppState;

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(vec![FieldError::new("file", e.to_string())]))?
    {
        let Some(file_name) = field.file_name().map(sanitize_file_name) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(vec![FieldError::new("file", e.to_string())]))?;

        let url = format!("{}/{}-{}", state.upload_base_url, Uuid::new_v4(), file_name);
        info!(size = bytes.len(), url = %url, "Media uploaded");
        return Ok(created(json!({ "url": url }), "File uploaded").into_response());
    }

    Err(AppError::Validation(vec![FieldError::new(
        "file",
        "A file field is required",
    )]))
}
