// src/eval/aggregate.rs
//
// Roll-up of per-pair results into the run summary.
//
// Pure: the same results list (and wall-clock figure) always yields the same
// numbers. Empty denominators default to 0 for pass rates and averages, and
// to 1.0 for the safety rates so an absent category is not penalised.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::config::Category;
use super::gate::GateStatus;
use super::response::has_citation;
use super::result::EvaluationResult;

/// Counts and rates for one group of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub average_score: f64,
}

impl Breakdown {
    fn from_results<'a>(results: impl IntoIterator<Item = &'a EvaluationResult>) -> Self {
        let mut total = 0usize;
        let mut passed = 0usize;
        let mut score_sum = 0.0;
        for r in results {
            total += 1;
            if r.passed {
                passed += 1;
            }
            score_sum += r.score;
        }
        Self {
            total,
            passed,
            failed: total - passed,
            pass_rate: ratio(passed, total, 0.0),
            average_score: if total == 0 {
                0.0
            } else {
                score_sum / total as f64
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyScores {
    /// Fraction of advice results that passed.
    pub advice_safety: f64,
    /// Fraction of docs results whose response cites a source.
    pub docs_citation: f64,
    /// Mean of the two rates above.
    pub overall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_time_ms: u64,
    pub average_time_per_scenario_ms: f64,
    pub total_tool_calls: usize,
    pub successful_tool_calls: usize,
    pub failed_tool_calls: usize,
}

/// Aggregate view over all results of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_scenarios: usize,
    pub passed: usize,
    pub failed: usize,
    pub overall_pass_rate: f64,
    pub by_category: BTreeMap<Category, Breakdown>,
    pub by_language: BTreeMap<String, Breakdown>,
    pub safety_scores: SafetyScores,
    /// Filled in by the CI gate stage.
    #[serde(default)]
    pub ci_gate: GateStatus,
    pub execution: ExecutionSummary,
}

fn ratio(numerator: usize, denominator: usize, empty: f64) -> f64 {
    if denominator == 0 {
        empty
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Safety rates over a results list.
pub fn compute_safety(results: &[EvaluationResult]) -> SafetyScores {
    let advice: Vec<&EvaluationResult> = results
        .iter()
        .filter(|r| r.category == Category::Advice)
        .collect();
    let docs: Vec<&EvaluationResult> = results
        .iter()
        .filter(|r| r.category == Category::Docs)
        .collect();

    let advice_passed = advice.iter().filter(|r| r.passed).count();
    let docs_cited = docs
        .iter()
        .filter(|r| has_citation(&r.details.actual_response))
        .count();

    let advice_safety = ratio(advice_passed, advice.len(), 1.0);
    let docs_citation = ratio(docs_cited, docs.len(), 1.0);

    SafetyScores {
        advice_safety,
        docs_citation,
        overall: (advice_safety + docs_citation) / 2.0,
    }
}

/// Build the run summary.
///
/// `languages` seeds the language breakdown so every configured language is
/// listed even without results; codes seen only in results are added too.
pub fn summarize_results(
    results: &[EvaluationResult],
    languages: &[String],
    total_time_ms: u64,
) -> EvaluationSummary {
    let overall = Breakdown::from_results(results);

    let by_category: BTreeMap<Category, Breakdown> = Category::ALL
        .iter()
        .map(|category| {
            (
                *category,
                Breakdown::from_results(results.iter().filter(|r| r.category == *category)),
            )
        })
        .collect();

    let mut codes: Vec<&str> = languages.iter().map(String::as_str).collect();
    for r in results {
        if !codes.contains(&r.language.as_str()) {
            codes.push(r.language.as_str());
        }
    }
    let by_language: BTreeMap<String, Breakdown> = codes
        .into_iter()
        .map(|code| {
            (
                code.to_string(),
                Breakdown::from_results(results.iter().filter(|r| r.language == code)),
            )
        })
        .collect();

    let total_tool_calls: usize = results.iter().map(|r| r.details.tool_usage.len()).sum();
    let successful_tool_calls: usize = results.iter().map(|r| r.successful_tools().count()).sum();

    EvaluationSummary {
        total_scenarios: overall.total,
        passed: overall.passed,
        failed: overall.failed,
        overall_pass_rate: overall.pass_rate,
        by_category,
        by_language,
        safety_scores: compute_safety(results),
        ci_gate: GateStatus::default(),
        execution: ExecutionSummary {
            total_time_ms,
            average_time_per_scenario_ms: if results.is_empty() {
                0.0
            } else {
                total_time_ms as f64 / results.len() as f64
            },
            total_tool_calls,
            successful_tool_calls,
            failed_tool_calls: total_tool_calls - successful_tool_calls,
        },
    }
}
