use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OpenAI-compatible `/v1/images/generations` request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    /// Non-standard fields such as `loras`.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = Some(format.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn wants_inline_encoding(&self) -> bool {
        wants_b64(self.response_format.as_deref())
    }
}

pub(crate) fn wants_b64(format: Option<&str>) -> bool {
    format.map_or(false, |f| f.trim().eq_ignore_ascii_case("b64_json"))
}

/// One generated image, either as a remote URL or as inline base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageData {
    Url { url: String },
    B64Json { b64_json: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub created: i64,
    pub data: Vec<ImageData>,
}

impl GenerationResult {
    pub fn to_json_bytes(&self) -> crate::error::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            crate::error::RelayError::SerializationError(format!("encode response failed: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_land_in_extra() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "prompt": "a cat",
            "model": "Tongyi-MAI/Z-Image-Turbo",
            "n": 2,
            "response_format": "b64_json",
            "loras": {"a": 1.0}
        }))
        .unwrap();

        assert_eq!(request.n, Some(2));
        assert!(request.wants_inline_encoding());
        assert_eq!(request.extra.get("loras"), Some(&json!({"a": 1.0})));
        assert!(!request.extra.contains_key("prompt"));
    }

    #[test]
    fn test_image_data_shapes() {
        let result = GenerationResult {
            created: 1,
            data: vec![
                ImageData::Url { url: "u".into() },
                ImageData::B64Json {
                    b64_json: "aGk=".into(),
                },
            ],
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"created": 1, "data": [{"url": "u"}, {"b64_json": "aGk="}]})
        );
        assert!(!GenerationRequest::new("x").with_response_format("url").wants_inline_encoding());
    }
}
