// src/eval/mod.rs
//
// Gold Copilot evaluation pipeline.
//
// This module provides:
// - EvaluationConfig: YAML scenario catalogue, thresholds, output settings
// - ScenarioExecutor: simulated tool calls, response synthesis, scoring
// - EvaluationSummary: per-category / per-language / safety roll-up
// - GateStatus: CI threshold check and exit-code decision
// - EvaluationReport: persisted JSON run with checksum and optional debug info
//
// Stages are independent: each one takes the previous stage's output by value
// or reference, so any of them can be driven directly from tests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod report;
pub mod response;
pub mod result;
pub mod rubric;
pub mod tools;

pub use aggregate::{compute_safety, summarize_results, Breakdown, EvaluationSummary, SafetyScores};
pub use config::{
    Category, EvaluationConfig, EvaluationScenario, GateReportFormat, DEFAULT_CONFIG_PATH,
};
pub use error::{EvalError, ExecutionError};
pub use executor::{ExecutorOptions, RunOutcome, ScenarioExecutor};
pub use gate::{check_thresholds, evaluate_gate, GateState, GateStatus};
pub use report::{
    compute_results_checksum, load_report, markdown_path_for, print_console_summary,
    write_json_report, write_markdown_report, EvaluationReport,
};
pub use result::{DecisionTrace, EvaluationResult, ResultDetails, ToolUsage};
pub use rubric::{score_response, Rubric, RubricWeights};
pub use tools::{expected_tools, ScriptedFaults, SeededFaults, ToolCallOutcome, ToolFaultModel};
