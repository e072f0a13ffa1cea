//! Rule engine: deterministic per-category prompt rewrites.
//!
//! Every check is a case-insensitive substring test against the prompt as it
//! stands when the check runs. Checks only append, except the short-text
//! wrapper which replaces the prompt wholesale.

use crate::error::Result;
use crate::types::{Category, LearnedOptimization, OptimizationResult, Options};

pub const IMAGE_BASE_SCORE: f64 = 85.0;
pub const VIDEO_BASE_SCORE: f64 = 80.0;
pub const TEXT_BASE_SCORE: f64 = 75.0;
const SCORE_PER_IMPROVEMENT: f64 = 5.0;
const MAX_SCORE: f64 = 100.0;

const IMAGE_CONFIDENCE: f64 = 0.6;
const IMAGE_CONFIDENCE_IMPROVED: f64 = 0.8;
const VIDEO_CONFIDENCE: f64 = 0.65;
const VIDEO_CONFIDENCE_IMPROVED: f64 = 0.75;
const TEXT_CONFIDENCE: f64 = 0.7;
const LEARNED_CONFIDENCE_THRESHOLD: f64 = 0.7;
const LEARNED_CONFIDENCE_BONUS: f64 = 0.1;

const TEXT_MIN_TOKENS: usize = 10;

pub const LABEL_RESOLUTION: &str = "added high-resolution keywords";
pub const LABEL_MIDJOURNEY_PARAMS: &str = "added Midjourney version and style parameters";
pub const LABEL_COMPOSITION: &str = "added professional composition and lighting directions";
pub const LABEL_MOTION: &str = "added natural motion directions";
pub const LABEL_CAMERA: &str = "added cinematic camera movement";
pub const LABEL_CONSISTENCY: &str = "reinforced style consistency";
pub const LABEL_FRAME_RATE: &str = "specified frame rate";
pub const LABEL_STRUCTURE: &str = "structured the prompt for clarity";
pub const LABEL_OUTPUT_FORMAT: &str = "specified output format";
pub const LEARNED_LABEL_PREFIX: &str = "learned keyword: ";

const NEGATIVE_CANDIDATES: [&str; 2] = ["blurry", "low quality"];

/// Output language for text-prompt scaffolding, chosen via `options.language`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextLanguage {
    #[default]
    Korean,
    English,
}

impl TextLanguage {
    pub fn from_options(options: &Options) -> Self {
        match options
            .get("language")
            .and_then(|v| v.as_str())
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("en") | Some("english") => Self::English,
            _ => Self::Korean,
        }
    }

    fn wrap(&self, prompt: &str) -> String {
        match self {
            Self::Korean => {
                format!("다음 주제에 대해 상세하고 전문적인 내용을 작성해주세요: {prompt}")
            }
            Self::English => {
                format!("Write detailed, professional content on the following topic: {prompt}")
            }
        }
    }

    fn format_marker(&self) -> &'static str {
        match self {
            Self::Korean => "형식",
            Self::English => "format",
        }
    }

    fn format_directive(&self) -> &'static str {
        match self {
            Self::Korean => "\n출력 형식: 구조화된 마크다운 형식",
            Self::English => "\nOutput format: structured markdown",
        }
    }
}

struct Rewrite {
    prompt: String,
    improvements: Vec<String>,
}

impl Rewrite {
    fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            improvements: Vec::new(),
        }
    }

    fn contains_any(&self, needles: &[&str]) -> bool {
        let lower = self.prompt.to_lowercase();
        needles
            .iter()
            .any(|needle| lower.contains(&needle.to_lowercase()))
    }

    fn append(&mut self, suffix: &str, label: impl Into<String>) {
        self.prompt.push_str(suffix);
        self.improvements.push(label.into());
    }

    fn replace(&mut self, prompt: String, label: impl Into<String>) {
        self.prompt = prompt;
        self.improvements.push(label.into());
    }

    fn score(&self, base: f64) -> f64 {
        (base + SCORE_PER_IMPROVEMENT * self.improvements.len() as f64).min(MAX_SCORE)
    }
}

/// Parses the category and dispatches; the only failure is an unknown category.
pub fn optimize_str(
    category: &str,
    prompt: &str,
    model: Option<&str>,
    options: &Options,
    learned: &LearnedOptimization,
) -> Result<OptimizationResult> {
    let category = category.parse::<Category>()?;
    Ok(optimize(category, prompt, model, options, learned))
}

pub fn optimize(
    category: Category,
    prompt: &str,
    model: Option<&str>,
    options: &Options,
    learned: &LearnedOptimization,
) -> OptimizationResult {
    match category {
        Category::Image => optimize_image(prompt, model, learned),
        Category::Video => optimize_video(prompt, model),
        Category::Text => optimize_text(prompt, TextLanguage::from_options(options)),
    }
}

fn model_is(model: Option<&str>, name: &str) -> bool {
    model.is_some_and(|m| m.trim().eq_ignore_ascii_case(name))
}

pub fn optimize_image(
    prompt: &str,
    model: Option<&str>,
    learned: &LearnedOptimization,
) -> OptimizationResult {
    let mut rw = Rewrite::new(prompt);

    if !rw.contains_any(&["4k", "8k"]) {
        rw.append(", 4k, ultra detailed", LABEL_RESOLUTION);
    }
    if model_is(model, "midjourney") && !rw.contains_any(&["--v", "--style"]) {
        rw.append(" --v 6 --style raw", LABEL_MIDJOURNEY_PARAMS);
    }
    if !rw.contains_any(&["composition", "lighting"]) {
        rw.append(
            ", professional composition, cinematic lighting",
            LABEL_COMPOSITION,
        );
    }

    let mut learned_count = 0;
    for keyword in &learned.learned_keywords {
        let keyword = keyword.trim();
        if keyword.is_empty() || rw.contains_any(&[keyword]) {
            continue;
        }
        rw.append(
            &format!(", {keyword}"),
            format!("{LEARNED_LABEL_PREFIX}{keyword}"),
        );
        learned_count += 1;
    }

    let original_lower = prompt.to_lowercase();
    let negative_suggestions = NEGATIVE_CANDIDATES
        .iter()
        .filter(|candidate| !original_lower.contains(*candidate))
        .map(|candidate| candidate.to_string())
        .collect();

    let mut confidence = if rw.improvements.is_empty() {
        IMAGE_CONFIDENCE
    } else {
        IMAGE_CONFIDENCE_IMPROVED
    };
    if learned.confidence > LEARNED_CONFIDENCE_THRESHOLD {
        confidence = (confidence + LEARNED_CONFIDENCE_BONUS).min(1.0);
    }

    OptimizationResult {
        quality_score: rw.score(IMAGE_BASE_SCORE),
        confidence,
        optimized_prompt: rw.prompt,
        improvements: rw.improvements,
        negative_suggestions,
        learned_count,
    }
}

pub fn optimize_video(prompt: &str, model: Option<&str>) -> OptimizationResult {
    let mut rw = Rewrite::new(prompt);

    if !rw.contains_any(&["motion", "movement"]) {
        rw.append(", smooth motion, natural movement", LABEL_MOTION);
    }
    if !rw.contains_any(&["camera"]) {
        rw.append(", cinematic camera movement", LABEL_CAMERA);
    }
    if model_is(model, "sora") && !rw.contains_any(&["consistent"]) {
        rw.append(", consistent style and lighting", LABEL_CONSISTENCY);
    }
    if !rw.contains_any(&["fps", "frame rate"]) {
        rw.append(", 24fps", LABEL_FRAME_RATE);
    }

    let confidence = if rw.improvements.is_empty() {
        VIDEO_CONFIDENCE
    } else {
        VIDEO_CONFIDENCE_IMPROVED
    };

    OptimizationResult {
        quality_score: rw.score(VIDEO_BASE_SCORE),
        confidence,
        optimized_prompt: rw.prompt,
        improvements: rw.improvements,
        negative_suggestions: Vec::new(),
        learned_count: 0,
    }
}

pub fn optimize_text(prompt: &str, language: TextLanguage) -> OptimizationResult {
    let mut rw = Rewrite::new(prompt);

    if prompt.split_whitespace().count() < TEXT_MIN_TOKENS {
        rw.replace(language.wrap(prompt), LABEL_STRUCTURE);
    }
    if !rw.contains_any(&[language.format_marker(), "format"]) {
        rw.append(language.format_directive(), LABEL_OUTPUT_FORMAT);
    }

    OptimizationResult {
        quality_score: rw.score(TEXT_BASE_SCORE),
        confidence: TEXT_CONFIDENCE,
        optimized_prompt: rw.prompt,
        improvements: rw.improvements,
        negative_suggestions: Vec::new(),
        learned_count: 0,
    }
}
