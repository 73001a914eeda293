// src/handlers/uploads.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole},
    },
    services::image_service::check_upload,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

// Arquivo de imagem vindo de um formulário multipart
pub(crate) struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Lê o campo `file` do formulário e valida tipo e tamanho.
pub(crate) async fn read_image(mut multipart: Multipart) -> Result<ImageFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(e.body_text()))?;

        check_upload(content_type.as_deref(), bytes.len())?;

        return Ok(ImageFile {
            file_name,
            content_type: content_type.unwrap_or_default(),
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::InvalidUpload("missing_file".into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/uploads",
    tag = "Admin",
    request_body(content_type = "multipart/form-data", description = "Campo `file` com a imagem (até 5 MiB)"),
    responses(
        (status = 201, description = "Imagem enviada", body = UploadResponse),
        (status = 400, description = "Arquivo inválido"),
        (status = 502, description = "Falha no provedor de imagens")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_image(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = read_image(multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let url = app_state
        .image_service
        .upload(&file.file_name, &file.content_type, file.bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
