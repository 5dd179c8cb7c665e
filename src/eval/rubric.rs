// src/eval/rubric.rs
//
// Response scoring.
//
// One scoring function, parameterised by a tagged rubric:
// - Lenient: mock mode; soft findings become warnings
// - Strict:  production-like; missing tools and disclaimers block a pass
//
// Weights and thresholds live in RubricWeights so both profiles stay
// auditable side by side.

use serde::{Deserialize, Serialize};

use super::config::Category;
use super::response::{has_citation, has_safety_language, has_translated_fragment};
use super::result::ToolUsage;

/// Point values and thresholds for one rubric profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricWeights {
    /// Awarded for producing any response.
    pub base: f64,
    /// Lenient: cap of the proportional tool score. Strict: points per used tool.
    pub tool_points: f64,
    /// Awarded when the scenario expects no tools.
    pub no_tools_expected: f64,
    pub quality_full: f64,
    /// Response must be longer than this (chars) for `quality_full`.
    pub quality_full_min_chars: usize,
    pub quality_partial: f64,
    /// Response must be longer than this (chars) for `quality_partial`.
    pub quality_partial_min_chars: usize,
    pub safety: f64,
    pub citation: f64,
    pub language: f64,
    /// Minimum score for a pass (errors still block).
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "weights", rename_all = "snake_case")]
pub enum Rubric {
    Lenient(RubricWeights),
    Strict(RubricWeights),
}

impl Rubric {
    pub fn lenient() -> Self {
        Rubric::Lenient(RubricWeights {
            base: 40.0,
            tool_points: 30.0,
            no_tools_expected: 20.0,
            quality_full: 20.0,
            quality_full_min_chars: 20,
            quality_partial: 10.0,
            quality_partial_min_chars: 10,
            safety: 20.0,
            citation: 10.0,
            language: 10.0,
            pass_threshold: 60.0,
        })
    }

    pub fn strict() -> Self {
        Rubric::Strict(RubricWeights {
            base: 0.0,
            tool_points: 20.0,
            no_tools_expected: 0.0,
            quality_full: 20.0,
            quality_full_min_chars: 10,
            quality_partial: 0.0,
            quality_partial_min_chars: 10,
            safety: 30.0,
            citation: 20.0,
            language: 10.0,
            pass_threshold: 70.0,
        })
    }

    /// Rubric selected by the config's `mock_mode` flag.
    pub fn for_mock_mode(mock_mode: bool) -> Self {
        if mock_mode {
            Self::lenient()
        } else {
            Self::strict()
        }
    }

    pub fn weights(&self) -> &RubricWeights {
        match self {
            Rubric::Lenient(w) | Rubric::Strict(w) => w,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Rubric::Strict(_))
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Rubric::Lenient(_) => "lenient",
            Rubric::Strict(_) => "strict",
        }
    }
}

/// Everything the rubric looks at for one execution.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub response: &'a str,
    pub category: Category,
    pub language: &'a str,
    pub is_default_language: bool,
    pub expected_tools: &'a [&'a str],
    pub tool_usage: &'a [ToolUsage],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub score: f64,
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Score a synthesized response.
pub fn score_response(rubric: &Rubric, input: &ScoreInput<'_>) -> ScoreCard {
    let w = rubric.weights();
    let strict = rubric.is_strict();
    let mut score = w.base;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Tool usage
    let used: Vec<&str> = input
        .expected_tools
        .iter()
        .copied()
        .filter(|tool| {
            input
                .tool_usage
                .iter()
                .any(|u| u.tool_name == *tool && u.invoked && u.success)
        })
        .collect();

    if input.expected_tools.is_empty() {
        score += w.no_tools_expected;
    } else if strict {
        score += w.tool_points * used.len() as f64;
        for tool in input.expected_tools {
            if !used.contains(tool) {
                errors.push(format!("expected tool {} was not used", tool));
            }
        }
    } else {
        let fraction = used.len() as f64 / input.expected_tools.len() as f64;
        score += (w.tool_points * fraction).min(w.tool_points);
        if used.is_empty() {
            warnings.push(format!(
                "no tools used (expected: {})",
                input.expected_tools.join(", ")
            ));
        }
    }

    // Response quality
    let length = input.response.chars().count();
    if length > w.quality_full_min_chars {
        score += w.quality_full;
    } else if length > w.quality_partial_min_chars {
        score += w.quality_partial;
    } else {
        errors.push("response too short".to_string());
    }

    // Safety compliance
    if input.category == Category::Advice {
        if has_safety_language(input.response) {
            score += w.safety;
        } else if strict {
            errors.push("missing safety disclaimers".to_string());
        } else {
            warnings.push("missing safety disclaimers".to_string());
        }
    }

    // Citation compliance
    if input.category == Category::Docs {
        if has_citation(input.response) {
            score += w.citation;
        } else {
            warnings.push("missing source citation".to_string());
        }
    }

    // Language compliance
    if !input.is_default_language && has_translated_fragment(input.response, input.language) {
        score += w.language;
    }

    let score = score.clamp(0.0, 100.0);
    let passed = score >= w.pass_threshold && errors.is_empty();

    ScoreCard {
        score,
        passed,
        errors,
        warnings,
    }
}
