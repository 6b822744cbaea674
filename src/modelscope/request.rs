use crate::{
    config::ModelCatalog,
    error::{RelayError, Result},
    models::{GenerationRequest, LoraConfig, TaskSubmission},
    validation::validate_loras,
};
use serde_json::Value;

const LORAS_KEY: &str = "loras";

/// Build the ModelScope task submission for an image request.
///
/// `upstream_model` is the relay's model override slot; it is overwritten with
/// the resolved model name so URL and header logic see the same value.
pub fn translate_request(
    request: &GenerationRequest,
    upstream_model: &mut String,
    catalog: &ModelCatalog,
) -> Result<TaskSubmission> {
    if request.prompt.trim().is_empty() {
        return Err(RelayError::MissingPrompt);
    }

    let model = resolve_model(upstream_model, request.model.as_deref(), catalog);
    *upstream_model = model.clone();

    let loras = match request.extra.get(LORAS_KEY) {
        Some(raw) => decode_loras(raw)?,
        None => None,
    };

    Ok(TaskSubmission {
        model,
        prompt: request.prompt.clone(),
        size: request.size.clone().filter(|s| !s.is_empty()),
        n: request.n.filter(|n| *n > 0),
        loras,
    })
}

fn resolve_model(upstream: &str, requested: Option<&str>, catalog: &ModelCatalog) -> String {
    [Some(upstream), requested]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|m| !m.is_empty())
        .unwrap_or(catalog.default_model.as_str())
        .to_string()
}

/// A `null` value does not decode into either LoRA shape and is dropped as if
/// absent; anything else goes through validation.
fn decode_loras(raw: &Value) -> Result<Option<LoraConfig>> {
    if raw.is_null() {
        log::debug!("Ignoring undecodable loras value");
        return Ok(None);
    }
    let config = validate_loras(raw)?;
    Ok(Some(config))
}
