use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

pub type Options = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Text,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Image, Category::Video, Category::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            _ => Err(CoreError::UnsupportedCategory(s.trim().to_string())),
        }
    }
}

/// Explicit feedback a user attached to a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserFeedback {
    /// Star rating, expected in 1..=5. Not range-checked here.
    pub rating: Option<f64>,
    pub satisfied: bool,
    pub used_result: bool,
    pub disappointed: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationRequest {
    pub prompt: String,
    /// Kept as text so an unknown value surfaces as `UnsupportedCategory`.
    pub category: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub user_feedback: Option<UserFeedback>,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl OptimizationRequest {
    pub fn new(prompt: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            category: category.into(),
            model: None,
            options: Options::new(),
            user_feedback: None,
            task_id: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_feedback(mut self, feedback: UserFeedback) -> Self {
        self.user_feedback = Some(feedback);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Boundary checks applied before the request reaches the service.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::InvalidRequest("prompt must not be empty".to_string()));
        }
        self.category.parse::<Category>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimized_prompt: String,
    /// Application order; never reordered.
    pub improvements: Vec<String>,
    pub quality_score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub negative_suggestions: Vec<String>,
    #[serde(default)]
    pub learned_count: usize,
}

/// Durable handle for one optimization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub span_id: Option<String>,
}

/// Opaque identifier issued by a tracker for a recorded span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanHandle(pub String);

impl SpanHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub original_prompt: String,
    pub category: Category,
    pub result: OptimizationResult,
    pub task: Task,
    pub reward: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub task_id: String,
    #[serde(default)]
    pub span_id: Option<String>,
    pub reward: f64,
    #[serde(default)]
    pub feedback_text: Option<String>,
    /// Must be a JSON object when present.
    #[serde(default)]
    pub metadata: Option<Options>,
}

impl FeedbackRequest {
    /// Boundary checks; the reward shaper itself never validates.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.task_id.trim().is_empty() {
            return Err(CoreError::InvalidRequest("task_id must not be empty".to_string()));
        }
        if !self.reward.is_finite() || !(-1.0..=1.0).contains(&self.reward) {
            return Err(CoreError::InvalidRequest(format!(
                "reward must be within [-1, 1], got {}",
                self.reward
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub id: Ulid,
    pub task_id: String,
    pub span_id: Option<String>,
    pub reward: f64,
    pub feedback_text: Option<String>,
    pub metadata: Options,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReceipt {
    pub record: FeedbackRecord,
    pub attribution_id: String,
    /// False when the tracker failed or timed out.
    pub recorded: bool,
}

/// Hints derived from accumulated rewards, consulted read-only by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnedOptimization {
    #[serde(default)]
    pub learned_keywords: Vec<String>,
    #[serde(default)]
    pub learned_patterns: Vec<serde_json::Value>,
    #[serde(default)]
    pub confidence: f64,
}

impl LearnedOptimization {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.learned_keywords.is_empty() && self.learned_patterns.is_empty()
    }
}
