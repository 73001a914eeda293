// src/services/image_service.rs

use serde::Deserialize;

use crate::common::error::AppError;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

// Envio para o Cloudinary com "upload preset" não assinado
#[derive(Clone)]
pub struct ImageService {
    http: reqwest::Client,
    cloud_name: Option<String>,
    upload_preset: Option<String>,
}

/// Só imagens, até 5 MiB.
pub fn check_upload(content_type: Option<&str>, size: usize) -> Result<(), AppError> {
    let is_image = content_type.is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        return Err(AppError::InvalidUpload("image_only".into()));
    }
    if size == 0 {
        return Err(AppError::InvalidUpload("empty".into()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidUpload("too_large".into()));
    }
    Ok(())
}

impl ImageService {
    pub fn new(http: reqwest::Client, cloud_name: Option<String>, upload_preset: Option<String>) -> Self {
        Self { http, cloud_name, upload_preset }
    }

    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let (Some(cloud_name), Some(preset)) = (self.cloud_name.as_deref(), self.upload_preset.as_deref()) else {
            return Err(AppError::ImageUploadError("Cloudinary não configurado".into()));
        };

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::InvalidUpload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", preset.to_string())
            .part("file", part);

        let response = self
            .http
            .post(format!("https://api.cloudinary.com/v1_1/{cloud_name}/image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ImageUploadError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ImageUploadError(format!("Cloudinary respondeu {}", response.status())));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageUploadError(e.to_string()))?;

        tracing::info!("🖼️ Imagem enviada: {}", body.secure_url);
        Ok(body.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_within_limit_are_accepted() {
        assert!(check_upload(Some("image/png"), 1024).is_ok());
        assert!(check_upload(Some("image/jpeg"), MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(check_upload(Some("application/pdf"), 10), Err(AppError::InvalidUpload(_))));
        assert!(matches!(check_upload(None, 10), Err(AppError::InvalidUpload(_))));
        assert!(matches!(check_upload(Some("image/png"), MAX_IMAGE_BYTES + 1), Err(AppError::InvalidUpload(_))));
        assert!(matches!(check_upload(Some("image/png"), 0), Err(AppError::InvalidUpload(_))));
    }
}
