use serde::Serialize;
use thiserror::Error;

/// Rejections produced while validating a LoRA configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoraError {
    #[error("too many LoRAs: maximum {max} allowed, got {got}")]
    TooManyComponents { max: usize, got: usize },

    #[error("invalid LoRA weight type: expected a number")]
    InvalidWeightType,

    #[error("LoRA weights must sum to 1.0, got {sum:.3}")]
    WeightSumOutOfRange { sum: f64 },

    #[error("invalid LoRA configuration type")]
    InvalidConfigurationType,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing API key: the channel has no credential configured")]
    MissingApiKey,

    #[error("prompt is required")]
    MissingPrompt,

    #[error("invalid LoRA configuration: {0}")]
    InvalidLoraConfiguration(#[from] LoraError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("query task failed with status {status}: {body}")]
    QueryStatus { status: u16, body: String },

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("unknown task status: {0}")]
    UnknownTaskStatus(String),

    #[error("task polling timeout after {attempts} attempts")]
    PollingTimeout { attempts: u32 },

    #[error("task polling cancelled by caller")]
    Cancelled,

    #[error("no output images")]
    NoOutputImages,

    #[error("no usable image data")]
    NoUsableImageData,

    #[error("failed to download image from {url}: {reason}")]
    ImageDownloadFailed { url: String, reason: String },
}

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Protocol,
    Transport,
    TaskFailure,
    PollingTimeout,
    Cancellation,
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Protocol => "protocol_error",
            ErrorKind::Transport => "transport_error",
            ErrorKind::TaskFailure => "task_failure",
            ErrorKind::PollingTimeout => "polling_timeout",
            ErrorKind::Cancellation => "cancellation",
            ErrorKind::Unsupported => "unsupported_operation",
        }
    }
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::ConfigError(_) | RelayError::MissingApiKey => ErrorKind::Configuration,
            RelayError::MissingPrompt | RelayError::InvalidLoraConfiguration(_) => {
                ErrorKind::Validation
            }
            RelayError::Unsupported(_) => ErrorKind::Unsupported,
            RelayError::TransportError(_) | RelayError::ImageDownloadFailed { .. } => {
                ErrorKind::Transport
            }
            RelayError::SerializationError(_)
            | RelayError::ResponseError(_)
            | RelayError::QueryStatus { .. }
            | RelayError::UnknownTaskStatus(_)
            | RelayError::NoOutputImages
            | RelayError::NoUsableImageData => ErrorKind::Protocol,
            RelayError::TaskFailed(_) => ErrorKind::TaskFailure,
            RelayError::PollingTimeout { .. } => ErrorKind::PollingTimeout,
            RelayError::Cancelled => ErrorKind::Cancellation,
        }
    }

    /// HTTP status the outer framework should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::MissingApiKey => 401,
            _ => match self.kind() {
                ErrorKind::Validation | ErrorKind::Unsupported => 400,
                ErrorKind::Cancellation => 499,
                ErrorKind::PollingTimeout => 504,
                ErrorKind::Protocol | ErrorKind::Transport | ErrorKind::TaskFailure => 502,
                ErrorKind::Configuration => 500,
            },
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: format!("modelscope adaptor: {}", self),
                kind: self.kind(),
                code: self.kind().as_str(),
            },
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::TransportError(e.to_string())
    }
}

/// OpenAI-style error body: `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub code: &'static str,
}

pub type Result<T> = std::result::Result<T, RelayError>;
