//! LoRA configuration checks, run before anything is submitted upstream.

use crate::error::LoraError;
use crate::models::{LoraConfig, LORA_WEIGHT_TOLERANCE, MAX_LORA_COUNT};
use serde_json::Value;
use std::collections::BTreeMap;

/// Classify a raw `loras` value and validate it.
///
/// The entry count is checked before the weights are inspected, so an
/// oversized mapping is reported as such even if it also carries bad weights.
pub fn validate_loras(value: &Value) -> Result<LoraConfig, LoraError> {
    match value {
        Value::String(id) => Ok(LoraConfig::Single(id.clone())),
        Value::Object(entries) => {
            check_count(entries.len())?;
            let weights = entries
                .iter()
                .map(|(id, weight)| {
                    weight
                        .as_f64()
                        .map(|w| (id.clone(), w))
                        .ok_or(LoraError::InvalidWeightType)
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;

            let config = LoraConfig::Weighted(weights);
            config.validate()?;
            Ok(config)
        }
        _ => Err(LoraError::InvalidConfigurationType),
    }
}

impl LoraConfig {
    pub fn validate(&self) -> Result<(), LoraError> {
        match self {
            LoraConfig::Single(_) => Ok(()),
            LoraConfig::Weighted(weights) => {
                check_count(weights.len())?;
                let sum: f64 = weights.values().sum();
                if !weight_sum_in_range(sum) {
                    return Err(LoraError::WeightSumOutOfRange { sum });
                }
                Ok(())
            }
        }
    }
}

fn check_count(got: usize) -> Result<(), LoraError> {
    if got > MAX_LORA_COUNT {
        return Err(LoraError::TooManyComponents {
            max: MAX_LORA_COUNT,
            got,
        });
    }
    Ok(())
}

fn weight_sum_in_range(sum: f64) -> bool {
    (1.0 - LORA_WEIGHT_TOLERANCE..=1.0 + LORA_WEIGHT_TOLERANCE).contains(&sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_identifier_always_passes() {
        let config = validate_loras(&json!("some-org/some-lora")).unwrap();
        assert_eq!(config, LoraConfig::Single("some-org/some-lora".into()));
        assert!(validate_loras(&json!("")).is_ok());
    }

    #[test]
    fn test_weights_summing_to_one() {
        let config = validate_loras(&json!({"a": 0.5, "b": 0.3, "c": 0.2})).unwrap();
        match config {
            LoraConfig::Weighted(weights) => assert_eq!(weights.len(), 3),
            other => panic!("unexpected config: {:?}", other),
        }
        assert!(validate_loras(&json!({"a": 1})).is_ok());
        assert!(validate_loras(&json!({"a": 0.6, "b": 0.4005})).is_ok());
    }

    #[test]
    fn test_six_entries_allowed() {
        let value = json!({"a": 0.2, "b": 0.2, "c": 0.2, "d": 0.2, "e": 0.1, "f": 0.1});
        assert!(validate_loras(&value).is_ok());
    }

    #[test]
    fn test_sum_out_of_range_reports_sum() {
        let err = validate_loras(&json!({"a": 0.5, "b": 0.3})).unwrap_err();
        match &err {
            LoraError::WeightSumOutOfRange { sum } => assert!((sum - 0.8).abs() < 1e-9),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("0.800"));

        let over = validate_loras(&json!({"a": 0.7, "b": 0.302})).unwrap_err();
        assert!(matches!(over, LoraError::WeightSumOutOfRange { .. }));
    }

    #[test]
    fn test_seven_entries_rejected_regardless_of_weights() {
        let value = json!({
            "a": 0.1, "b": 0.1, "c": 0.1, "d": 0.1, "e": 0.1, "f": 0.1, "g": "heavy"
        });
        assert_eq!(
            validate_loras(&value).unwrap_err(),
            LoraError::TooManyComponents { max: 6, got: 7 }
        );
    }

    #[test]
    fn test_non_numeric_weight() {
        assert_eq!(
            validate_loras(&json!({"a": "0.5", "b": 0.5})).unwrap_err(),
            LoraError::InvalidWeightType
        );
        assert_eq!(
            validate_loras(&json!({"a": null})).unwrap_err(),
            LoraError::InvalidWeightType
        );
    }

    #[test]
    fn test_other_shapes_rejected() {
        for value in [json!(["a", "b"]), json!(0.5), json!(true)] {
            assert_eq!(
                validate_loras(&value).unwrap_err(),
                LoraError::InvalidConfigurationType
            );
        }
    }

    #[test]
    fn test_typed_config_validation() {
        let mut weights = BTreeMap::new();
        weights.insert("x".to_string(), 0.25);
        weights.insert("y".to_string(), 0.75);
        assert!(LoraConfig::Weighted(weights.clone()).validate().is_ok());

        weights.insert("z".to_string(), 0.5);
        assert!(LoraConfig::Weighted(weights).validate().is_err());
    }
}
