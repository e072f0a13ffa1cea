//! PromptLight core.
//!
//! Rule-based prompt rewriting, template ranking, reward shaping, and the
//! task/span correlation that ties later feedback back to a rewrite.
//! Collaborators (tracking, learned store) are injected as traits; their null
//! implementations live here so the core never branches on availability.

mod correlator;
mod engine;
mod error;
mod gateway;
mod ranker;
mod reward;
mod service;
mod tracking;
mod types;

pub use correlator::{Correlator, TaskIdStrategy};
pub use engine::{
    TextLanguage, optimize, optimize_image, optimize_str, optimize_text, optimize_video,
};
pub use error::{CoreError, Result, StoreError, TrackingError};
pub use gateway::{EmptyStore, Gateway, LearnedStore};
pub use ranker::{CatalogTemplate, RankedTemplate, TemplateRecommendation, catalog, rank, recommend};
pub use reward::{FeedbackFlags, shape, shape_feedback};
pub use service::PromptService;
pub use tracking::{NoopTracker, Tracker};
pub use types::{
    Category, FeedbackReceipt, FeedbackRecord, FeedbackRequest, LearnedOptimization,
    OptimizationOutcome, OptimizationRequest, OptimizationResult, Options, SpanHandle, Task,
    UserFeedback,
};
