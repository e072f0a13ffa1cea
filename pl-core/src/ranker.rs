//! Template ranking by keyword overlap blended with a static prior.

use crate::types::Category;
use serde::Serialize;
use std::collections::HashSet;

const PRIOR_WEIGHT: f64 = 0.7;
const MATCH_WEIGHT: f64 = 0.3;
const MAX_RECOMMENDATIONS: usize = 3;
const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct CatalogTemplate {
    pub name: &'static str,
    pub template: &'static str,
    pub prior: f64,
    pub reason: &'static str,
}

const IMAGE_TEMPLATES: &[CatalogTemplate] = &[
    CatalogTemplate {
        name: "High-quality portrait",
        template: "{subject}, professional portrait, studio lighting, 4k, ultra detailed, sharp focus",
        prior: 0.9,
        reason: "Tuned for portrait generation",
    },
    CatalogTemplate {
        name: "Cinematic landscape",
        template: "{subject}, cinematic landscape, dramatic lighting, wide angle, 8k, film grain",
        prior: 0.85,
        reason: "Suited to cinematic landscape imagery",
    },
    CatalogTemplate {
        name: "Product photography",
        template: "{subject}, product photography, white background, professional lighting, high detail, commercial quality",
        prior: 0.8,
        reason: "Tuned for product shots",
    },
];

const VIDEO_TEMPLATES: &[CatalogTemplate] = &[
    CatalogTemplate {
        name: "Single-scene video",
        template: "{description}, smooth camera movement, consistent lighting, 24fps, cinematic quality",
        prior: 0.9,
        reason: "Consistent quality across a single scene",
    },
    CatalogTemplate {
        name: "Action sequence",
        template: "{description}, dynamic action, fast-paced movement, dramatic angles, high energy",
        prior: 0.85,
        reason: "Tuned for action scenes",
    },
];

pub fn catalog(category: Category) -> &'static [CatalogTemplate] {
    match category {
        Category::Image => IMAGE_TEMPLATES,
        Category::Video => VIDEO_TEMPLATES,
        Category::Text => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTemplate {
    pub name: String,
    pub template: String,
    #[serde(rename = "score")]
    pub prior: f64,
    pub reason: String,
    pub match_score: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRecommendation {
    #[serde(rename = "recommended_templates")]
    pub templates: Vec<RankedTemplate>,
    pub reasoning: String,
    pub confidence: f64,
}

/// Ranks catalog templates for the input. An unknown category yields an
/// empty recommendation instead of an error.
pub fn recommend(user_input: &str, category: &str, _model: Option<&str>) -> TemplateRecommendation {
    match category.parse::<Category>() {
        Ok(category) => rank(user_input, category, catalog(category)),
        Err(_) => TemplateRecommendation {
            templates: Vec::new(),
            reasoning: reasoning(category.trim()),
            confidence: FALLBACK_CONFIDENCE,
        },
    }
}

pub fn rank(
    user_input: &str,
    category: Category,
    templates: &[CatalogTemplate],
) -> TemplateRecommendation {
    let input_tokens = tokens(user_input);
    let mut ranked: Vec<RankedTemplate> = templates
        .iter()
        .map(|t| {
            let match_score = match_score(&input_tokens, t.template);
            RankedTemplate {
                name: t.name.to_string(),
                template: t.template.to_string(),
                prior: t.prior,
                reason: t.reason.to_string(),
                match_score,
                final_score: PRIOR_WEIGHT * t.prior + MATCH_WEIGHT * match_score,
            }
        })
        .collect();

    // Vec::sort_by is stable; equal scores keep catalog order.
    ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    ranked.truncate(MAX_RECOMMENDATIONS);

    let confidence = ranked
        .first()
        .map(|t| t.final_score)
        .unwrap_or(FALLBACK_CONFIDENCE);

    TemplateRecommendation {
        templates: ranked,
        reasoning: reasoning(category.as_str()),
        confidence,
    }
}

fn reasoning(category: &str) -> String {
    format!("Recommended the {category} templates that most closely match the input.")
}

fn tokens(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

fn match_score(input_tokens: &HashSet<String>, template: &str) -> f64 {
    let template_tokens = tokens(template);
    let overlap = input_tokens.intersection(&template_tokens).count();
    overlap as f64 / input_tokens.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn portrait_template_wins_for_portrait_input() {
        let rec = recommend("studio lighting portrait", "image", None);
        assert_eq!(rec.templates.len(), 3);
        assert_eq!(rec.templates[0].name, "High-quality portrait");
        // only "studio" overlaps verbatim; "lighting," keeps its comma
        assert!((rec.templates[0].match_score - 1.0 / 3.0).abs() < EPS);
        assert!((rec.confidence - rec.templates[0].final_score).abs() < EPS);
    }

    #[test]
    fn final_score_blends_prior_and_match() {
        let rec = recommend("cinematic landscape", "image", None);
        let landscape = rec
            .templates
            .iter()
            .find(|t| t.name == "Cinematic landscape")
            .expect("landscape ranked");
        assert!((landscape.match_score - 0.5).abs() < EPS);
        assert!((landscape.final_score - (0.7 * 0.85 + 0.3 * 0.5)).abs() < EPS);
    }

    #[test]
    fn duplicate_input_tokens_collapse() {
        let rec = recommend("studio studio STUDIO", "image", None);
        assert!((rec.templates[0].match_score - 1.0).abs() < EPS);
    }

    #[test]
    fn empty_input_scores_by_prior_only() {
        let rec = recommend("   ", "video", None);
        assert_eq!(rec.templates.len(), 2);
        assert!(rec.templates.iter().all(|t| t.match_score == 0.0));
        assert_eq!(rec.templates[0].name, "Single-scene video");
        assert!((rec.confidence - 0.63).abs() < EPS);
    }

    #[test]
    fn ties_keep_catalog_order() {
        let catalog = [
            CatalogTemplate {
                name: "first",
                template: "alpha beta",
                prior: 0.5,
                reason: "",
            },
            CatalogTemplate {
                name: "second",
                template: "gamma delta",
                prior: 0.5,
                reason: "",
            },
            CatalogTemplate {
                name: "third",
                template: "alpha epsilon",
                prior: 0.5,
                reason: "",
            },
        ];
        let rec = rank("alpha", Category::Image, &catalog);
        let names: Vec<&str> = rec.templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "third", "second"]);

        let rec = rank("zeta", Category::Image, &catalog);
        let names: Vec<&str> = rec.templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn top_three_only() {
        let many: Vec<CatalogTemplate> = (0..5)
            .map(|i| CatalogTemplate {
                name: "t",
                template: "x",
                prior: i as f64 / 10.0,
                reason: "",
            })
            .collect();
        let rec = rank("x", Category::Image, &many);
        assert_eq!(rec.templates.len(), 3);
        assert!((rec.templates[0].prior - 0.4).abs() < EPS);
    }

    #[test]
    fn text_and_unknown_categories_yield_empty_lists() {
        let rec = recommend("anything", "text", None);
        assert!(rec.templates.is_empty());
        assert!((rec.confidence - 0.5).abs() < EPS);

        let rec = recommend("anything", "audio", None);
        assert!(rec.templates.is_empty());
        assert!((rec.confidence - 0.5).abs() < EPS);
    }
}
