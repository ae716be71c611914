use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::services::image_service::HostedImage;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub success: bool,
    pub data: HostedImage,
}

#[utoipa::path(
    post,
    path = "/api/images",
    responses(
        (status = 200, description = "Image hosted", body = Json<ImageUploadResponse>),
        (status = 400, description = "Missing or invalid image"),
        (status = 500, description = "Image host failure")
    )
)]
#[axum::debug_handler]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut image: Option<(Option<String>, bytes::Bytes)> = None;
    let mut expiration: Option<u64> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "image" => {
                let content_type = field.content_type().map(|ct| ct.to_string());
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read image part: {}", e);
                    Error::BadRequest("تعذر قراءة الصورة المرفقة".to_string())
                })?;
                if !data.is_empty() {
                    image = Some((content_type, data));
                }
            }
            "expiration" => {
                let raw = field.text().await.unwrap_or_default();
                if let Ok(value) = raw.trim().parse::<u64>() {
                    expiration = Some(value);
                }
            }
            _ => {}
        }
    }

    let (content_type, data) = image
        .ok_or_else(|| Error::BadRequest("لم يتم تحديد صورة".to_string()))?;

    state
        .images
        .validate_image(content_type.as_deref(), data.len())
        .map_err(Error::BadRequest)?;

    let hosted = state.images.upload(&data, expiration).await.map_err(|e| {
        tracing::error!("Image upload failed: {}", e);
        Error::UploadFailed("image".to_string())
    })?;

    Ok(Json(ImageUploadResponse {
        success: true,
        data: hosted,
    }))
}
