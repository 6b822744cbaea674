use crate::models::LoraConfig;
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/images/generations` in async mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSubmission {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loras: Option<LoraConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSubmitResponse {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Running,
    Processing,
    Succeeded,
    Failed,
    Unknown(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Succeeded => "SUCCEED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            TaskStatus::Pending | TaskStatus::Running | TaskStatus::Processing
        )
    }
}

/// A body without `task_status` decodes as an empty unknown status.
impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Unknown(String::new())
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        // ModelScope spells success "SUCCEED".
        match raw.as_str() {
            "PENDING" => TaskStatus::Pending,
            "RUNNING" => TaskStatus::Running,
            "PROCESSING" => TaskStatus::Processing,
            "SUCCEED" | "SUCCEEDED" => TaskStatus::Succeeded,
            "FAILED" => TaskStatus::Failed,
            _ => TaskStatus::Unknown(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Response of `GET /v1/tasks/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub task_status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_decoding() {
        let snapshot: TaskSnapshot = serde_json::from_value(json!({
            "task_id": "t-1",
            "task_status": "SUCCEED",
            "output_images": ["https://cdn/1.png"]
        }))
        .unwrap();
        assert_eq!(snapshot.task_status, TaskStatus::Succeeded);
        assert_eq!(snapshot.output_images, vec!["https://cdn/1.png"]);
        assert!(snapshot.message.is_none());

        let odd: TaskSnapshot =
            serde_json::from_value(json!({"task_id": "t-2", "task_status": "QUEUED"})).unwrap();
        assert_eq!(odd.task_status, TaskStatus::Unknown("QUEUED".into()));
        assert!(odd.task_status.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
    }

    #[test]
    fn test_missing_status_is_unknown() {
        let snapshot: TaskSnapshot = serde_json::from_value(json!({"task_id": "t-3"})).unwrap();
        assert_eq!(snapshot.task_status, TaskStatus::Unknown(String::new()));
        assert!(snapshot.task_status.is_terminal());
    }

    #[test]
    fn test_submission_omits_empty_fields() {
        let submission = TaskSubmission {
            model: "Tongyi-MAI/Z-Image-Turbo".into(),
            prompt: "a cat".into(),
            size: None,
            n: None,
            loras: Some(LoraConfig::Single("style-a".into())),
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            value,
            json!({"model": "Tongyi-MAI/Z-Image-Turbo", "prompt": "a cat", "loras": "style-a"})
        );
    }
}
