//! Reward shaping: quality score, star rating, and feedback flags → [-1, 1].

use crate::types::UserFeedback;
use serde::{Deserialize, Serialize};

const RATING_SCALE: f64 = 5.0;
const QUALITY_WEIGHT: f64 = 0.4;
const RATING_WEIGHT: f64 = 0.6;
const SATISFIED_BONUS: f64 = 0.2;
const USED_RESULT_BONUS: f64 = 0.1;
const DISAPPOINTED_PENALTY: f64 = 0.3;
const NEUTRAL_QUALITY: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackFlags {
    pub satisfied: bool,
    pub used_result: bool,
    pub disappointed: bool,
}

impl From<&UserFeedback> for FeedbackFlags {
    fn from(fb: &UserFeedback) -> Self {
        Self {
            satisfied: fb.satisfied,
            used_result: fb.used_result,
            disappointed: fb.disappointed,
        }
    }
}

/// Shapes a reward in [-1, 1]. Total: ratings are not range-checked and
/// non-finite inputs fall back to neutral values.
pub fn shape(quality_score: f64, user_rating: Option<f64>, flags: FeedbackFlags) -> f64 {
    let quality = if quality_score.is_nan() {
        NEUTRAL_QUALITY
    } else {
        quality_score
    };
    let mut reward = to_signed_unit(quality / 100.0);

    if let Some(rating) = user_rating.filter(|r| r.is_finite()) {
        let user_component = to_signed_unit(rating / RATING_SCALE);
        reward = reward * QUALITY_WEIGHT + user_component * RATING_WEIGHT;
    }

    if flags.satisfied {
        reward = (reward + SATISFIED_BONUS).min(1.0);
    }
    if flags.used_result {
        reward = (reward + USED_RESULT_BONUS).min(1.0);
    }
    if flags.disappointed {
        reward = (reward - DISAPPOINTED_PENALTY).max(-1.0);
    }

    reward.clamp(-1.0, 1.0)
}

/// Convenience wrapper for feedback carried on an optimization request.
pub fn shape_feedback(quality_score: f64, feedback: &UserFeedback) -> f64 {
    shape(quality_score, feedback.rating, FeedbackFlags::from(feedback))
}

fn to_signed_unit(fraction: f64) -> f64 {
    fraction * 2.0 - 1.0
}
