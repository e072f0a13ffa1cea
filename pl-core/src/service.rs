//! Entry point the HTTP layer and CLI call into.

use crate::correlator::Correlator;
use crate::engine;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::ranker::{self, TemplateRecommendation};
use crate::reward;
use crate::types::{
    Category, FeedbackReceipt, FeedbackRecord, FeedbackRequest, OptimizationOutcome,
    OptimizationRequest,
};
use chrono::Utc;
use ulid::Ulid;

#[derive(Clone)]
pub struct PromptService {
    gateway: Gateway,
    correlator: Correlator,
}

impl PromptService {
    pub fn new(gateway: Gateway, correlator: Correlator) -> Self {
        Self {
            gateway,
            correlator,
        }
    }

    pub fn tracking_backend(&self) -> &str {
        self.correlator.backend_name()
    }

    pub fn learned_backend(&self) -> &str {
        self.gateway.backend_name()
    }

    #[tracing::instrument(level = "info", skip_all, fields(category = %request.category))]
    pub async fn optimize(&self, request: OptimizationRequest) -> Result<OptimizationOutcome> {
        let category = request.category.parse::<Category>()?;
        let model = request.model.as_deref();
        let task_id = self
            .correlator
            .allocate(request.task_id.as_deref(), category, &request.prompt);

        let learned = self.gateway.lookup(category, model).await;
        let result = engine::optimize(category, &request.prompt, model, &request.options, &learned);
        tracing::info!(
            %task_id,
            improvements = result.improvements.len(),
            learned_count = result.learned_count,
            quality_score = result.quality_score,
            confidence = result.confidence,
            "prompt optimized"
        );

        let span_metadata = serde_json::json!({
            "original": request.prompt,
            "optimized": result.optimized_prompt,
            "score": result.quality_score,
            "category": category,
            "model": model,
            "improvements": result.improvements,
        });
        let task = self.correlator.record(task_id, category, span_metadata).await;

        let reward = match request.user_feedback.as_ref() {
            Some(feedback) => {
                let reward = reward::shape_feedback(result.quality_score, feedback);
                let attribution_id = self
                    .correlator
                    .correlate(&task.task_id, task.span_id.as_deref());
                let metadata = serde_json::json!({
                    "source": "inline_feedback",
                    "task_id": task.task_id,
                    "category": category,
                    "quality_score": result.quality_score,
                    "rating": feedback.rating,
                    "comment": feedback.comment,
                });
                self.correlator
                    .deliver_reward(attribution_id, reward, metadata)
                    .await;
                Some(reward)
            }
            None => None,
        };

        Ok(OptimizationOutcome {
            original_prompt: request.prompt,
            category,
            result,
            task,
            reward,
        })
    }

    pub fn recommend(
        &self,
        user_input: &str,
        category: &str,
        model: Option<&str>,
    ) -> TemplateRecommendation {
        let recommendation = ranker::recommend(user_input, category, model);
        tracing::debug!(
            category,
            recommended = recommendation.templates.len(),
            confidence = recommendation.confidence,
            "templates ranked"
        );
        recommendation
    }

    #[tracing::instrument(level = "info", skip_all, fields(task_id = %request.task_id))]
    pub async fn submit_feedback(&self, request: FeedbackRequest) -> FeedbackReceipt {
        let record = FeedbackRecord {
            id: Ulid::new(),
            task_id: request.task_id,
            span_id: request.span_id,
            reward: request.reward,
            feedback_text: request.feedback_text,
            metadata: request.metadata.unwrap_or_default(),
            submitted_at: Utc::now(),
        };
        let attribution_id = self
            .correlator
            .correlate(&record.task_id, record.span_id.as_deref())
            .to_string();

        let metadata = serde_json::json!({
            "feedback_id": record.id.to_string(),
            "task_id": record.task_id,
            "span_id": record.span_id,
            "feedback_text": record.feedback_text,
            "metadata": record.metadata,
            "submitted_at": record.submitted_at,
        });
        let recorded = self
            .correlator
            .deliver_reward(&attribution_id, record.reward, metadata)
            .await;

        FeedbackReceipt {
            record,
            attribution_id,
            recorded,
        }
    }
}
