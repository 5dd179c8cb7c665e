// src/eval/report.rs
//
// Run report: JSON persistence, optional Markdown companion, console summary.
//
// Report layout:
// - evaluation_id / timestamp / config_version
// - results_checksum: SHA-256 over result outcomes, for run comparison
// - summary + detailed_results
// - debug_info (config + execution traces), debug runs only

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::aggregate::{Breakdown, EvaluationSummary};
use super::config::{Category, EvaluationConfig};
use super::error::EvalError;
use super::gate::GateState;
use super::result::{timestamp_now, DecisionTrace, EvaluationResult};

/// Decision trace of one execution, kept for debug output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub scenario_id: String,
    pub language: String,
    pub trace: Vec<DecisionTrace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInfo {
    pub config: EvaluationConfig,
    pub execution_traces: Vec<ExecutionTrace>,
}

/// Complete persisted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_id: Uuid,
    pub timestamp: String,
    pub config_version: String,
    /// "lenient" (mock mode) or "strict".
    pub scoring_mode: String,
    pub results_checksum: String,
    pub summary: EvaluationSummary,
    pub detailed_results: Vec<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<DebugInfo>,
}

impl EvaluationReport {
    /// Assemble a report for a finished run.
    ///
    /// Output flags decide whether traces and tool usage stay in
    /// `detailed_results`; `debug` adds the raw config and every trace.
    pub fn build(
        config: &EvaluationConfig,
        scoring_mode: &str,
        summary: EvaluationSummary,
        results: &[EvaluationResult],
        debug: bool,
    ) -> Self {
        let output = &config.evaluation.output;
        let detailed_results = results
            .iter()
            .cloned()
            .map(|mut r| {
                if !output.include_traces {
                    r.details.decision_trace.clear();
                }
                if !output.include_tool_usage {
                    r.details.tool_usage.clear();
                }
                r
            })
            .collect();

        let debug_info = debug.then(|| DebugInfo {
            config: config.clone(),
            execution_traces: results
                .iter()
                .map(|r| ExecutionTrace {
                    scenario_id: r.scenario_id.clone(),
                    language: r.language.clone(),
                    trace: r.details.decision_trace.clone(),
                })
                .collect(),
        });

        Self {
            evaluation_id: Uuid::new_v4(),
            timestamp: timestamp_now(),
            config_version: config.version.clone(),
            scoring_mode: scoring_mode.to_string(),
            results_checksum: compute_results_checksum(results),
            summary,
            detailed_results,
            debug_info,
        }
    }
}

/// Checksum over result outcomes.
///
/// Covers, per result and in order: scenario id, language, passed, score
/// (fixed precision) and blocking errors. Timing and timestamps are excluded.
pub fn compute_results_checksum(results: &[EvaluationResult]) -> String {
    let mut hasher = Sha256::new();

    for r in results {
        hasher.update(r.scenario_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(r.language.as_bytes());
        hasher.update([0u8]);
        hasher.update([r.passed as u8]);
        // Round to 6 decimal places for floating point stability
        let score_rounded = (r.score * 1_000_000.0).round() as i64;
        hasher.update(score_rounded.to_le_bytes());
        for error in &r.details.errors {
            hasher.update(error.as_bytes());
            hasher.update([0u8]);
        }
    }

    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// Output Writers
// =============================================================================

/// Write the JSON report, creating missing parent directories.
pub fn write_json_report(report: &EvaluationReport, path: &Path) -> Result<(), EvalError> {
    let write_err = |source| EvalError::ReportWrite {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|source| {
        EvalError::ReportEncode {
            path: path.display().to_string(),
            source,
        }
    })?;
    writer.flush().map_err(write_err)?;
    Ok(())
}

/// Read a report written by `write_json_report`.
pub fn load_report(path: &Path) -> Result<EvaluationReport, EvalError> {
    let contents = fs::read_to_string(path).map_err(|source| EvalError::ReportRead {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| EvalError::ReportDecode {
        path: path.display().to_string(),
        source,
    })
}

/// Markdown companion path: same location and stem, `.md` extension.
pub fn markdown_path_for(json_path: &Path) -> PathBuf {
    json_path.with_extension("md")
}

fn gate_label(state: GateState) -> &'static str {
    match state {
        GateState::Disabled => "DISABLED",
        GateState::Passed => "PASSED",
        GateState::Failed => "FAILED",
    }
}

fn write_breakdown_row<W: Write>(writer: &mut W, name: &str, b: &Breakdown) -> std::io::Result<()> {
    writeln!(
        writer,
        "| {} | {} | {} | {} | {:.1}% | {:.1} |",
        name,
        b.total,
        b.passed,
        b.failed,
        b.pass_rate * 100.0,
        b.average_score
    )
}

/// Write the Markdown report, creating missing parent directories.
pub fn write_markdown_report(report: &EvaluationReport, path: &Path) -> Result<(), EvalError> {
    render_markdown(report, path).map_err(|source| EvalError::ReportWrite {
        path: path.display().to_string(),
        source,
    })
}

fn render_markdown(report: &EvaluationReport, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let summary = &report.summary;

    writeln!(writer, "# Gold Copilot Evaluation Report")?;
    writeln!(writer)?;
    writeln!(writer, "**Evaluation ID:** `{}`", report.evaluation_id)?;
    writeln!(writer, "**Generated:** {}", report.timestamp)?;
    writeln!(writer, "**Config Version:** {}", report.config_version)?;
    writeln!(writer, "**Scoring Mode:** {}", report.scoring_mode)?;
    writeln!(writer)?;

    // Gate status
    match summary.ci_gate.status {
        GateState::Passed => writeln!(writer, "## ✓ CI Gate Passed")?,
        GateState::Disabled => writeln!(writer, "## CI Gate Disabled")?,
        GateState::Failed => {
            writeln!(writer, "## ✗ CI Gate Failed")?;
            writeln!(writer)?;
            for failure in &summary.ci_gate.failures {
                writeln!(writer, "- {}", failure)?;
            }
        }
    }
    writeln!(writer)?;

    writeln!(writer, "## Overview")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "- Results: {} ({} passed, {} failed)",
        summary.total_scenarios, summary.passed, summary.failed
    )?;
    writeln!(
        writer,
        "- Overall pass rate: {:.1}%",
        summary.overall_pass_rate * 100.0
    )?;
    writeln!(
        writer,
        "- Advice safety: {:.1}%",
        summary.safety_scores.advice_safety * 100.0
    )?;
    writeln!(
        writer,
        "- Docs citation: {:.1}%",
        summary.safety_scores.docs_citation * 100.0
    )?;
    writeln!(
        writer,
        "- Tool calls: {} total, {} failed",
        summary.execution.total_tool_calls, summary.execution.failed_tool_calls
    )?;
    writeln!(writer)?;

    writeln!(writer, "## By Category")?;
    writeln!(writer)?;
    writeln!(writer, "| Category | Total | Passed | Failed | Pass Rate | Avg Score |")?;
    writeln!(writer, "|----------|-------|--------|--------|-----------|-----------|")?;
    for category in Category::ALL {
        if let Some(b) = summary.by_category.get(&category) {
            write_breakdown_row(&mut writer, category.as_str(), b)?;
        }
    }
    writeln!(writer)?;

    writeln!(writer, "## By Language")?;
    writeln!(writer)?;
    writeln!(writer, "| Language | Total | Passed | Failed | Pass Rate | Avg Score |")?;
    writeln!(writer, "|----------|-------|--------|--------|-----------|-----------|")?;
    for (code, b) in &summary.by_language {
        write_breakdown_row(&mut writer, code, b)?;
    }
    writeln!(writer)?;

    let failed: Vec<&EvaluationResult> = report
        .detailed_results
        .iter()
        .filter(|r| !r.passed)
        .collect();
    if !failed.is_empty() {
        writeln!(writer, "## Failed Results")?;
        writeln!(writer)?;
        writeln!(writer, "| Scenario | Language | Score | Errors |")?;
        writeln!(writer, "|----------|----------|-------|--------|")?;
        for r in failed {
            writeln!(
                writer,
                "| {} | {} | {:.1} | {} |",
                r.scenario_id,
                r.language,
                r.score,
                r.details.errors.join("; ")
            )?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Print a concise console summary.
pub fn print_console_summary(report: &EvaluationReport) {
    let summary = &report.summary;

    println!("═══════════════════════════════════════════════════════════════");
    println!("GOLD COPILOT EVALUATION: {}", report.evaluation_id);
    println!("═══════════════════════════════════════════════════════════════");
    println!(
        "config={} | mode={} | results={} | time={}ms",
        report.config_version,
        report.scoring_mode,
        summary.total_scenarios,
        summary.execution.total_time_ms
    );
    println!();

    println!(
        "Overall: {}/{} passed ({:.1}%)",
        summary.passed,
        summary.total_scenarios,
        summary.overall_pass_rate * 100.0
    );
    println!();

    println!("By category:");
    for category in Category::ALL {
        if let Some(b) = summary.by_category.get(&category) {
            println!(
                "  {:<8} | {}/{} passed ({:.1}%) avg={:.1}",
                category.as_str(),
                b.passed,
                b.total,
                b.pass_rate * 100.0,
                b.average_score
            );
        }
    }
    println!("By language:");
    for (code, b) in &summary.by_language {
        println!(
            "  {:<8} | {}/{} passed ({:.1}%) avg={:.1}",
            code,
            b.passed,
            b.total,
            b.pass_rate * 100.0,
            b.average_score
        );
    }
    println!();

    println!(
        "Safety: advice={:.1}% docs_citation={:.1}% overall={:.1}%",
        summary.safety_scores.advice_safety * 100.0,
        summary.safety_scores.docs_citation * 100.0,
        summary.safety_scores.overall * 100.0
    );
    println!(
        "Tools:  {} calls, {} succeeded, {} failed",
        summary.execution.total_tool_calls,
        summary.execution.successful_tool_calls,
        summary.execution.failed_tool_calls
    );
    println!();

    match summary.ci_gate.status {
        GateState::Disabled => println!("CI GATE {}", gate_label(GateState::Disabled)),
        GateState::Passed => println!("✓ CI GATE {}", gate_label(GateState::Passed)),
        GateState::Failed => {
            println!(
                "✗ CI GATE {}: {} threshold(s) missed",
                gate_label(GateState::Failed),
                summary.ci_gate.failures.len()
            );
            for failure in &summary.ci_gate.failures {
                println!("  - {}", failure);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
