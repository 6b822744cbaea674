use serde::Serialize;
use std::collections::BTreeMap;

pub const MAX_LORA_COUNT: usize = 6;
pub const LORA_WEIGHT_TOLERANCE: f64 = 0.001;

/// LoRA selection as sent to ModelScope: either a single adapter id, or a
/// mapping of adapter id to blend weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LoraConfig {
    Single(String),
    Weighted(BTreeMap<String, f64>),
}
