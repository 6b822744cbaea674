use crate::{
    error::{RelayError, Result},
    models::{GenerationResult, ImageData, TaskSnapshot},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::try_join_all;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

/// Downloads an image and returns its bytes base64-encoded.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_base64(&self, url: &str) -> Result<String>;
}

#[derive(Clone, Default)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_base64(&self, url: &str) -> Result<String> {
        log::debug!("Downloading generated image {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RelayError::ResponseError(format!(
                "image download returned status {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        Ok(STANDARD.encode(&bytes))
    }
}

/// Turn a successful task snapshot into the OpenAI image response.
///
/// In inline mode every image is downloaded; the first failed download fails
/// the whole translation. Downloads are abandoned as soon as `cancel` fires.
pub async fn translate_response(
    snapshot: &TaskSnapshot,
    wants_inline: bool,
    fetcher: &dyn ImageFetcher,
    cancel: &CancellationToken,
) -> Result<GenerationResult> {
    if cancel.is_cancelled() {
        return Err(RelayError::Cancelled);
    }
    if snapshot.output_images.is_empty() {
        return Err(RelayError::NoOutputImages);
    }

    let urls: Vec<&str> = snapshot
        .output_images
        .iter()
        .map(String::as_str)
        .filter(|url| !url.trim().is_empty())
        .collect();

    let data = if wants_inline {
        let downloads = try_join_all(urls.into_iter().map(|url| inline_image(url, fetcher)));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Image downloads abandoned after cancellation");
                return Err(RelayError::Cancelled);
            }
            images = downloads => images?,
        }
    } else {
        urls.into_iter()
            .map(|url| ImageData::Url {
                url: url.to_string(),
            })
            .collect()
    };

    if data.is_empty() {
        return Err(RelayError::NoUsableImageData);
    }

    Ok(GenerationResult {
        created: chrono::Utc::now().timestamp(),
        data,
    })
}

async fn inline_image(url: &str, fetcher: &dyn ImageFetcher) -> Result<ImageData> {
    let b64_json = fetcher
        .fetch_base64(url)
        .await
        .map_err(|e| RelayError::ImageDownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(ImageData::B64Json { b64_json })
}
