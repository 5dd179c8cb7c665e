// src/eval/result.rs
//
// Per-execution records: tool usage, decision trace, evaluation result.
//
// All of these are created once and never mutated afterwards; the executor
// appends them to per-execution lists and the runner appends results to the
// run-lifetime list.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::config::{Category, EvaluationScenario};

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One simulated tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool_name: String,
    pub invoked: bool,
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One step of the simulated reasoning process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    pub step: u32,
    pub action: String,
    pub reasoning: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetails {
    pub input: String,
    pub expected_response: String,
    pub actual_response: String,
    #[serde(default)]
    pub tool_usage: Vec<ToolUsage>,
    #[serde(default)]
    pub decision_trace: Vec<DecisionTrace>,
    /// Blocking findings; any entry forces a fail.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Advisory findings; never block a pass.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Outcome of one scenario x language execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scenario_id: String,
    pub category: Category,
    pub language: String,
    pub passed: bool,
    /// Clamped to [0, 100].
    pub score: f64,
    pub details: ResultDetails,
    pub execution_time_ms: u64,
    pub timestamp: String,
}

impl EvaluationResult {
    /// Failed result for an execution that raised an error.
    pub fn from_failure(
        scenario: &EvaluationScenario,
        language: &str,
        error: String,
        execution_time_ms: u64,
        timestamp: String,
    ) -> Self {
        Self {
            scenario_id: scenario.id.clone(),
            category: scenario.category,
            language: language.to_string(),
            passed: false,
            score: 0.0,
            details: ResultDetails {
                input: scenario.input.clone(),
                expected_response: scenario.mock_response.clone(),
                actual_response: String::new(),
                tool_usage: Vec::new(),
                decision_trace: Vec::new(),
                errors: vec![error],
                warnings: Vec::new(),
            },
            execution_time_ms,
            timestamp,
        }
    }

    /// Tools that were invoked and succeeded.
    pub fn successful_tools(&self) -> impl Iterator<Item = &ToolUsage> {
        self.details
            .tool_usage
            .iter()
            .filter(|t| t.invoked && t.success)
    }
}
