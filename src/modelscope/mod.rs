pub mod poller;
pub mod request;
pub mod response;

use crate::{
    config::{ChannelConfig, ModelCatalog, PollConfig, CHANNEL_NAME},
    error::{RelayError, Result},
    logger,
    models::{
        image::wants_b64, Capabilities, GenerationRequest, GenerationResult, RelayMode,
        TaskSubmission, TaskSubmitResponse, Usage,
    },
};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use tokio_util::sync::CancellationToken;

pub use poller::{HttpTaskStatusSource, TaskPoller, TaskStatusSource};
pub use request::translate_request;
pub use response::{translate_response, HttpImageFetcher, ImageFetcher};

pub const SUBMIT_PATH: &str = "/v1/images/generations";
pub const ASYNC_MODE_HEADER: &str = "X-ModelScope-Async-Mode";

/// Per-request relay state handed over by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct RelayContext {
    pub channel: ChannelConfig,
    /// Model name routed by the relay; rewritten to the resolved upstream model.
    pub upstream_model: String,
    /// `response_format` of the incoming image request.
    pub response_format: Option<String>,
}

impl RelayContext {
    pub fn new(channel: ChannelConfig) -> Self {
        Self {
            channel,
            ..Default::default()
        }
    }

    pub fn with_upstream_model(mut self, model: impl Into<String>) -> Self {
        self.upstream_model = model.into();
        self
    }

    pub fn for_request(channel: ChannelConfig, request: &GenerationRequest) -> Self {
        Self {
            channel,
            upstream_model: String::new(),
            response_format: request.response_format.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.channel.api_key().ok_or(RelayError::MissingApiKey)
    }
}

/// ModelScope image generation adaptor.
#[derive(Clone)]
pub struct ModelScopeAdaptor {
    client: Client,
    catalog: ModelCatalog,
    poll_config: PollConfig,
    fetcher: HttpImageFetcher,
}

impl Default for ModelScopeAdaptor {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ModelScopeAdaptor {
    pub fn new(client: Client) -> Self {
        Self {
            fetcher: HttpImageFetcher::new(client.clone()),
            client,
            catalog: ModelCatalog::default(),
            poll_config: PollConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    pub fn channel_name(&self) -> &'static str {
        CHANNEL_NAME
    }

    pub fn model_list(&self) -> &[String] {
        &self.catalog.models
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new().with_image_generation()
    }

    pub fn ensure_supported(&self, mode: RelayMode) -> Result<()> {
        if self.capabilities().supports(mode) {
            return Ok(());
        }
        Err(RelayError::Unsupported(format!(
            "{} only supports image generation ({}), not {}",
            CHANNEL_NAME,
            SUBMIT_PATH,
            mode.as_str()
        )))
    }

    pub fn request_url(&self, ctx: &RelayContext) -> String {
        format!("{}{}", ctx.channel.resolved_base_url(), SUBMIT_PATH)
    }

    pub fn setup_request_headers(&self, ctx: &RelayContext, headers: &mut HeaderMap) -> Result<()> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", ctx.api_key()?))
            .map_err(|_| RelayError::ConfigError("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ASYNC_MODE_HEADER, HeaderValue::from_static("true"));
        Ok(())
    }

    pub fn convert_image_request(
        &self,
        ctx: &mut RelayContext,
        request: &GenerationRequest,
    ) -> Result<TaskSubmission> {
        translate_request(request, &mut ctx.upstream_model, &self.catalog)
    }

    /// Handle the body of a task submission: wait for the task and build the
    /// caller-facing image response.
    pub async fn handle_response(
        &self,
        ctx: &RelayContext,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(GenerationResult, Usage)> {
        let submitted: TaskSubmitResponse = serde_json::from_slice(body).map_err(|e| {
            RelayError::ResponseError(format!("failed to decode submit response: {}", e))
        })?;
        if submitted.task_id.is_empty() {
            return Err(RelayError::ResponseError(
                "empty task_id in submit response".into(),
            ));
        }
        log::info!(
            "🎨 ModelScope task {} submitted for {} (request {})",
            submitted.task_id,
            ctx.upstream_model,
            submitted.request_id
        );

        let source = HttpTaskStatusSource::new(
            self.client.clone(),
            ctx.channel.resolved_base_url(),
            ctx.api_key()?,
        );
        let poller = TaskPoller::with_config(source, self.poll_config);
        let snapshot = poller.poll(&submitted.task_id, cancel).await?;

        let result = translate_response(
            &snapshot,
            wants_b64(ctx.response_format.as_deref()),
            &self.fetcher,
            cancel,
        )
        .await?;
        log::info!(
            "✅ Task {} produced {} image(s)",
            submitted.task_id,
            result.data.len()
        );

        Ok((result, Usage::default()))
    }

    /// Submit `request` and wait for the generated images.
    pub async fn generate(
        &self,
        ctx: &mut RelayContext,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<(GenerationResult, Usage)> {
        let _timer = logger::timer("modelscope image generation");

        let submission = self.convert_image_request(ctx, request)?;
        if ctx.response_format.is_none() {
            ctx.response_format = request.response_format.clone();
        }
        let mut headers = HeaderMap::new();
        self.setup_request_headers(ctx, &mut headers)?;

        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }

        let response = self
            .client
            .post(self.request_url(ctx))
            .headers(headers)
            .json(&submission)
            .send()
            .await
            .map_err(|e| RelayError::TransportError(format!("task submission failed: {}", e)))?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            log::error!("❌ Task submission rejected with status {}", status);
            return Err(RelayError::ResponseError(format!(
                "submission failed with status {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        self.handle_response(ctx, &body, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RelayContext {
        RelayContext::new(ChannelConfig::new().with_api_key("ms-secret"))
    }

    #[test]
    fn test_request_url_defaults_host() {
        let adaptor = ModelScopeAdaptor::default();
        assert_eq!(
            adaptor.request_url(&ctx()),
            "https://api-inference.modelscope.cn/v1/images/generations"
        );

        let custom = RelayContext::new(ChannelConfig::new().with_base_url("http://relay.test/"));
        assert_eq!(
            adaptor.request_url(&custom),
            "http://relay.test/v1/images/generations"
        );
    }

    #[test]
    fn test_headers() {
        let mut headers = HeaderMap::new();
        ModelScopeAdaptor::default()
            .setup_request_headers(&ctx(), &mut headers)
            .unwrap();
        assert_eq!(headers["authorization"], "Bearer ms-secret");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-modelscope-async-mode"], "true");
    }

    #[test]
    fn test_headers_require_key() {
        let mut headers = HeaderMap::new();
        let err = ModelScopeAdaptor::default()
            .setup_request_headers(&RelayContext::default(), &mut headers)
            .unwrap_err();
        assert!(matches!(err, RelayError::MissingApiKey));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_only_image_generation_supported() {
        let adaptor = ModelScopeAdaptor::default();
        assert!(adaptor.ensure_supported(RelayMode::ImageGeneration).is_ok());
        for mode in [
            RelayMode::ChatCompletions,
            RelayMode::Responses,
            RelayMode::ClaudeMessages,
            RelayMode::GeminiChat,
            RelayMode::Embeddings,
            RelayMode::Audio,
            RelayMode::Rerank,
        ] {
            let err = adaptor.ensure_supported(mode).unwrap_err();
            assert!(matches!(err, RelayError::Unsupported(_)));
            assert!(err.to_string().contains(mode.as_str()));
        }
    }

    #[test]
    fn test_convert_writes_back_model() {
        let adaptor = ModelScopeAdaptor::default();
        let mut ctx = ctx().with_upstream_model(" ");
        let submission = adaptor
            .convert_image_request(&mut ctx, &GenerationRequest::new("a fox"))
            .unwrap();
        assert_eq!(submission.model, "Tongyi-MAI/Z-Image-Turbo");
        assert_eq!(ctx.upstream_model, "Tongyi-MAI/Z-Image-Turbo");
        assert_eq!(adaptor.model_list().len(), 4);
        assert_eq!(adaptor.channel_name(), "ModelScope");
    }

    #[tokio::test]
    async fn test_submit_ack_without_task_id() {
        let adaptor = ModelScopeAdaptor::default();
        let cancel = CancellationToken::new();

        let err = adaptor
            .handle_response(&ctx(), br#"{"task_id":"","request_id":"r"}"#, &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty task_id"));

        let err = adaptor
            .handle_response(&ctx(), b"not json", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ResponseError(_)));
    }
}
