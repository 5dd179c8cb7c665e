// src/eval/gate.rs
//
// CI gate: compares the run summary's headline metrics against configured
// thresholds. All three thresholds are always evaluated; each miss produces
// its own human-readable failure line.

use serde::{Deserialize, Serialize};

use super::aggregate::EvaluationSummary;
use super::config::{CiGateSettings, ScoringThresholds};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Disabled,
    Passed,
    Failed,
}

/// Outcome of the gate stage, embedded in the summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateStatus {
    pub status: GateState,
    pub overall_pass_rate_met: bool,
    pub advice_safety_met: bool,
    pub docs_citation_met: bool,
    pub failures: Vec<String>,
}

impl GateStatus {
    pub fn is_failed(&self) -> bool {
        self.status == GateState::Failed
    }

    /// Process exit code implied by this status.
    pub fn exit_code(&self, settings: &CiGateSettings) -> i32 {
        if self.is_failed() && settings.fail_on_threshold_breach {
            1
        } else {
            0
        }
    }
}

/// Render a fraction as a percentage, trimming trailing zeros ("80", "92.5").
fn percent_label(fraction: f64) -> String {
    let pct = (fraction * 1000.0).round() / 10.0;
    format!("{}", pct)
}

/// Evaluate every threshold independently, collecting one message per miss.
pub fn check_thresholds(summary: &EvaluationSummary, thresholds: &ScoringThresholds) -> GateStatus {
    let mut failures = Vec::new();

    let overall_met = summary.overall_pass_rate >= thresholds.overall_pass_rate;
    if !overall_met {
        failures.push(format!(
            "Overall pass rate {:.1}% < {}%",
            summary.overall_pass_rate * 100.0,
            percent_label(thresholds.overall_pass_rate)
        ));
    }

    let advice_met = summary.safety_scores.advice_safety >= thresholds.advice_safety;
    if !advice_met {
        failures.push(format!(
            "Advice safety rate {:.1}% < {}%",
            summary.safety_scores.advice_safety * 100.0,
            percent_label(thresholds.advice_safety)
        ));
    }

    let docs_met = summary.safety_scores.docs_citation >= thresholds.docs_citation;
    if !docs_met {
        failures.push(format!(
            "Docs citation rate {:.1}% < {}%",
            summary.safety_scores.docs_citation * 100.0,
            percent_label(thresholds.docs_citation)
        ));
    }

    GateStatus {
        status: if failures.is_empty() {
            GateState::Passed
        } else {
            GateState::Failed
        },
        overall_pass_rate_met: overall_met,
        advice_safety_met: advice_met,
        docs_citation_met: docs_met,
        failures,
    }
}

/// Run the gate. A disabled gate reports `Disabled` and never fails the run.
pub fn evaluate_gate(
    summary: &EvaluationSummary,
    settings: &CiGateSettings,
    thresholds: &ScoringThresholds,
) -> GateStatus {
    if !settings.enabled {
        return GateStatus::default();
    }

    check_thresholds(summary, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::aggregate::{ExecutionSummary, SafetyScores};
    use std::collections::BTreeMap;

    fn summary(pass_rate: f64, advice: f64, docs: f64) -> EvaluationSummary {
        EvaluationSummary {
            total_scenarios: 20,
            passed: (pass_rate * 20.0).round() as usize,
            failed: 20 - (pass_rate * 20.0).round() as usize,
            overall_pass_rate: pass_rate,
            by_category: BTreeMap::new(),
            by_language: BTreeMap::new(),
            safety_scores: SafetyScores {
                advice_safety: advice,
                docs_citation: docs,
                overall: (advice + docs) / 2.0,
            },
            ci_gate: GateStatus::default(),
            execution: ExecutionSummary::default(),
        }
    }

    fn thresholds(overall: f64, advice: f64, docs: f64) -> ScoringThresholds {
        ScoringThresholds {
            overall_pass_rate: overall,
            advice_safety: advice,
            docs_citation: docs,
        }
    }

    fn settings(enabled: bool, fail_on_threshold_breach: bool) -> CiGateSettings {
        CiGateSettings {
            enabled,
            fail_on_threshold_breach,
            ..CiGateSettings::default()
        }
    }

    #[test]
    fn test_overall_pass_rate_breach_message_and_exit_code() {
        let status = evaluate_gate(
            &summary(0.75, 1.0, 1.0),
            &settings(true, true),
            &thresholds(0.8, 0.9, 0.9),
        );
        assert_eq!(status.status, GateState::Failed);
        assert_eq!(status.failures, vec!["Overall pass rate 75.0% < 80%".to_string()]);
        assert!(!status.overall_pass_rate_met);
        assert!(status.advice_safety_met);
        assert!(status.docs_citation_met);
        assert_eq!(status.exit_code(&settings(true, true)), 1);
    }

    #[test]
    fn test_breach_without_fail_flag_exits_zero() {
        let gate_settings = settings(true, false);
        let status = evaluate_gate(
            &summary(0.75, 1.0, 1.0),
            &gate_settings,
            &thresholds(0.8, 0.9, 0.9),
        );
        assert!(status.is_failed());
        assert_eq!(status.exit_code(&gate_settings), 0);
    }

    #[test]
    fn test_all_thresholds_evaluated_without_short_circuit() {
        let status = evaluate_gate(
            &summary(0.5, 0.6, 2.0 / 3.0),
            &settings(true, true),
            &thresholds(0.8, 0.95, 0.9),
        );
        assert_eq!(status.failures.len(), 3);
        assert_eq!(status.failures[0], "Overall pass rate 50.0% < 80%");
        assert_eq!(status.failures[1], "Advice safety rate 60.0% < 95%");
        assert_eq!(status.failures[2], "Docs citation rate 66.7% < 90%");
    }

    #[test]
    fn test_thresholds_met_exactly_pass() {
        let status = evaluate_gate(
            &summary(0.8, 0.95, 0.9),
            &settings(true, true),
            &thresholds(0.8, 0.95, 0.9),
        );
        assert_eq!(status.status, GateState::Passed);
        assert!(status.failures.is_empty());
        assert_eq!(status.exit_code(&settings(true, true)), 0);
    }

    #[test]
    fn test_disabled_gate_never_fails() {
        let gate_settings = settings(false, true);
        let status = evaluate_gate(
            &summary(0.0, 0.0, 0.0),
            &gate_settings,
            &thresholds(0.8, 0.95, 0.9),
        );
        assert_eq!(status.status, GateState::Disabled);
        assert!(status.failures.is_empty());
        assert_eq!(status.exit_code(&gate_settings), 0);
    }

    #[test]
    fn test_percent_label() {
        assert_eq!(percent_label(0.8), "80");
        assert_eq!(percent_label(0.925), "92.5");
        assert_eq!(percent_label(1.0), "100");
    }
}
