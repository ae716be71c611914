use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

const MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;
const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Client for the image-hosting API. The host takes a base64 payload as
/// form data, with the API key and optional expiration as query
/// parameters, and answers with a public URL envelope.
#[derive(Clone)]
pub struct ImageHostService {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
struct HostEnvelope {
    success: bool,
    data: Option<HostData>,
}

#[derive(Debug, Clone, Deserialize)]
struct HostData {
    #[serde(default)]
    id: String,
    url: String,
    #[serde(default)]
    display_url: String,
    #[serde(default)]
    delete_url: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    height: i64,
    #[serde(default)]
    expiration: i64,
    image: Option<HostFile>,
    thumb: Option<HostFile>,
    medium: Option<HostFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct HostFile {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    url: String,
}

/// What the rest of the system sees of a hosted image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedImage {
    pub id: String,
    pub url: String,
    pub display_url: String,
    pub thumb_url: Option<String>,
    pub medium_url: Option<String>,
    pub delete_url: String,
    pub size: i64,
    pub width: i64,
    pub height: i64,
    pub filename: String,
    pub expiration: i64,
}

impl ImageHostService {
    pub fn new(api_key: String, endpoint: String, client: Client) -> Self {
        info!("Image host endpoint: {}", endpoint);
        Self {
            client,
            api_key,
            endpoint,
        }
    }

    /// Type/size gate applied before any byte leaves the process.
    pub fn validate_image(
        &self,
        content_type: Option<&str>,
        size: usize,
    ) -> std::result::Result<(), String> {
        let mime = content_type.unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
            return Err(
                "نوع الملف غير مدعوم. يرجى استخدام JPG, PNG, GIF, أو WebP".to_string(),
            );
        }
        if size > MAX_IMAGE_BYTES {
            return Err("حجم الملف كبير جداً. الحد الأقصى 32 ميجابايت".to_string());
        }
        Ok(())
    }

    pub async fn upload(&self, image: &[u8], expiration: Option<u64>) -> Result<HostedImage> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::Internal(format!("Invalid image host endpoint: {}", e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        if let Some(expiration) = expiration {
            url.query_pairs_mut()
                .append_pair("expiration", &expiration.to_string());
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let response = self
            .client
            .post(url)
            .form(&[("image", encoded)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "Image host returned {}",
                response.status()
            )));
        }

        let envelope: HostEnvelope = response.json().await?;
        let data = match (envelope.success, envelope.data) {
            (true, Some(data)) => data,
            _ => return Err(Error::Internal("Image host rejected the upload".to_string())),
        };

        Ok(HostedImage {
            id: data.id,
            url: data.url,
            display_url: data.display_url,
            thumb_url: data.thumb.map(|f| f.url),
            medium_url: data.medium.map(|f| f.url),
            delete_url: data.delete_url,
            size: data.size,
            width: data.width,
            height: data.height,
            filename: data.image.map(|f| f.filename).unwrap_or_default(),
            expiration: data.expiration,
        })
    }
}
