pub mod config;
pub mod error;
pub mod logger;
pub mod modelscope;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod validation;

pub use config::{ChannelConfig, ModelCatalog, PollConfig};
pub use error::{ErrorEnvelope, ErrorKind, LoraError, RelayError, Result};
pub use modelscope::{
    HttpImageFetcher, HttpTaskStatusSource, ImageFetcher, ModelScopeAdaptor, RelayContext,
    TaskPoller, TaskStatusSource,
};
pub use models::*;
pub use validation::validate_loras;

pub use tokio_util::sync::CancellationToken;
