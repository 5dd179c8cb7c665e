//! Gold Copilot evaluation harness.
//!
//! Runs a catalogue of chat scenarios against a simulated Gold Copilot,
//! scores every scenario x language pair, and gates CI on the aggregate.
//! The binary (`src/main.rs`) is a thin driver around these stages.
//!
//! # Pipeline
//!
//! - **Loader** (`eval::config`): parse and validate the YAML catalogue.
//! - **Executor** (`eval::executor`): simulate tool calls through an
//!   injectable fault model, synthesize the response, score it with the
//!   lenient (mock) or strict rubric.
//! - **Aggregator** (`eval::aggregate`): pass rates by category and
//!   language, advice-safety and docs-citation rates.
//! - **Reporter** (`eval::report`): JSON report, optional Markdown
//!   companion, console summary.
//! - **CI Gate** (`eval::gate`): threshold check that decides the exit code.

pub mod eval;
pub mod logging;

pub use eval::{
    evaluate_gate, summarize_results, EvalError, EvaluationConfig, EvaluationReport,
    EvaluationResult, EvaluationSummary, ScenarioExecutor,
};
