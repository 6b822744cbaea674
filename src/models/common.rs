use serde::{Deserialize, Serialize};

/// Token usage reported back to the relay. ModelScope bills per image, so this
/// is always zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Request shapes the outer dispatcher may route to an adaptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    ImageGeneration,
    ChatCompletions,
    Responses,
    ClaudeMessages,
    GeminiChat,
    Embeddings,
    Audio,
    Rerank,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::ImageGeneration => "image generation",
            RelayMode::ChatCompletions => "chat completions",
            RelayMode::Responses => "responses",
            RelayMode::ClaudeMessages => "claude messages",
            RelayMode::GeminiChat => "gemini chat",
            RelayMode::Embeddings => "embeddings",
            RelayMode::Audio => "audio",
            RelayMode::Rerank => "rerank",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub image_generation: bool,
    pub chat: bool,
    pub embedding: bool,
    pub audio: bool,
    pub rerank: bool,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_generation(mut self) -> Self {
        self.image_generation = true;
        self
    }

    pub fn supports(&self, mode: RelayMode) -> bool {
        match mode {
            RelayMode::ImageGeneration => self.image_generation,
            RelayMode::ChatCompletions
            | RelayMode::Responses
            | RelayMode::ClaudeMessages
            | RelayMode::GeminiChat => self.chat,
            RelayMode::Embeddings => self.embedding,
            RelayMode::Audio => self.audio,
            RelayMode::Rerank => self.rerank,
        }
    }
}
