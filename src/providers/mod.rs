//! Upstream image-generation providers. Each wire variant is one
//! implementation of [`ImageProvider`]; a deployment picks exactly one.

mod stable_image;
mod text_to_image;

pub use stable_image::StableImage;
pub use text_to_image::TextToImage;

use async_trait::async_trait;

use crate::Result;

/// Normalized provider output: a hosted URL or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderImage {
    pub image_url: String,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Issues exactly one upstream call. No retry, no timeout override
    /// beyond the HTTP client default.
    async fn generate(&self, prompt: &str) -> Result<ProviderImage>;
}

pub(crate) fn upstream_request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .build()
        .expect("reqwest client build should not fail")
}
