// src/eval/executor.rs
//
// Scenario execution.
//
// Each scenario x language pair goes through:
// 1. input analysis      (trace step 1)
// 2. tool execution      (trace step 2)
// 3. response generation (trace step 3)
// 4. scoring
//
// Pairs run one at a time in configuration order. Errors raised inside a
// pair (backend failure, timeout) become a zero-score failed result for that
// pair only.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::{EvaluationConfig, EvaluationScenario};
use super::error::ExecutionError;
use super::response::{synthesize_response, ResponseContext};
use super::result::{timestamp_now, DecisionTrace, EvaluationResult, ResultDetails, ToolUsage};
use super::rubric::{score_response, Rubric, ScoreInput};
use super::tools::{expected_tools, invoke_tools, ToolFaultModel};

/// Confidence recorded for the input-analysis step (no real inference).
const INPUT_ANALYSIS_CONFIDENCE: f64 = 0.95;

/// Confidence recorded for the response-generation step.
const RESPONSE_CONFIDENCE: f64 = 0.85;

/// Runtime knobs for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Await drawn tool latencies. Latencies are recorded either way.
    pub simulate_latency: bool,
    /// Budget per scenario x language pair.
    pub timeout: Duration,
    pub log_tool_usage: bool,
    pub log_decision_path: bool,
}

impl ExecutorOptions {
    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self {
            simulate_latency: true,
            timeout: Duration::from_secs(config.evaluation.timeout_seconds),
            log_tool_usage: config.debug.log_tool_usage,
            log_decision_path: config.debug.log_decision_path,
        }
    }
}

/// Results of a full pass over the configuration.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: Vec<EvaluationResult>,
    /// Wall-clock duration of the whole pass.
    pub total_time_ms: u64,
}

/// Intermediate output of a successful simulation.
struct Simulated {
    response: String,
    expected_tools: Vec<&'static str>,
    tool_usage: Vec<ToolUsage>,
    trace: Vec<DecisionTrace>,
}

pub struct ScenarioExecutor<'a, F: ToolFaultModel> {
    config: &'a EvaluationConfig,
    rubric: Rubric,
    faults: F,
    options: ExecutorOptions,
}

impl<'a, F: ToolFaultModel> ScenarioExecutor<'a, F> {
    /// Executor scoring with the rubric selected by `mock_mode`.
    pub fn new(config: &'a EvaluationConfig, faults: F, options: ExecutorOptions) -> Self {
        Self {
            config,
            rubric: Rubric::for_mock_mode(config.evaluation.mock_mode),
            faults,
            options,
        }
    }

    pub fn with_rubric(mut self, rubric: Rubric) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Execute every scenario x language pair in configuration order.
    pub async fn run_all(&mut self) -> RunOutcome {
        let started = Instant::now();
        let config = self.config;
        let mut results = Vec::new();

        for (scenario, language) in config.pairs() {
            let result = self.execute(scenario, language).await;
            let status_icon = if result.passed { "✓" } else { "✗" };
            info!(
                "{} {}[{}] score={:.1} errors={} warnings={}",
                status_icon,
                result.scenario_id,
                result.language,
                result.score,
                result.details.errors.len(),
                result.details.warnings.len()
            );
            results.push(result);
        }

        RunOutcome {
            results,
            total_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Execute one pair. Never fails: errors are folded into the result.
    pub async fn execute(
        &mut self,
        scenario: &EvaluationScenario,
        language: &str,
    ) -> EvaluationResult {
        let started = Instant::now();
        let timeout = self.options.timeout;

        let simulated = match tokio::time::timeout(timeout, self.simulate(scenario, language)).await
        {
            Ok(inner) => inner,
            Err(_) => Err(ExecutionError::Timeout {
                seconds: timeout.as_secs(),
            }),
        };
        let execution_time_ms = started.elapsed().as_millis() as u64;

        let simulated = match simulated {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    scenario = %scenario.id,
                    language = %language,
                    error = %e,
                    "scenario execution failed"
                );
                return EvaluationResult::from_failure(
                    scenario,
                    language,
                    e.to_string(),
                    execution_time_ms,
                    timestamp_now(),
                );
            }
        };

        let card = score_response(
            &self.rubric,
            &ScoreInput {
                response: &simulated.response,
                category: scenario.category,
                language,
                is_default_language: self.config.is_default_language(language),
                expected_tools: &simulated.expected_tools,
                tool_usage: &simulated.tool_usage,
            },
        );

        EvaluationResult {
            scenario_id: scenario.id.clone(),
            category: scenario.category,
            language: language.to_string(),
            passed: card.passed,
            score: card.score,
            details: ResultDetails {
                input: scenario.input.clone(),
                expected_response: scenario.mock_response.clone(),
                actual_response: simulated.response,
                tool_usage: simulated.tool_usage,
                decision_trace: simulated.trace,
                errors: card.errors,
                warnings: card.warnings,
            },
            execution_time_ms,
            timestamp: timestamp_now(),
        }
    }

    async fn simulate(
        &mut self,
        scenario: &EvaluationScenario,
        language: &str,
    ) -> Result<Simulated, ExecutionError> {
        let mut trace = Vec::with_capacity(3);

        // Step 1: input analysis
        self.record(
            &mut trace,
            &scenario.id,
            "analyze_input",
            format!(
                "Analyzed {} chars of {} input for a {} request",
                scenario.input.chars().count(),
                language,
                scenario.category
            ),
            INPUT_ANALYSIS_CONFIDENCE,
        );

        // Step 2: tool execution
        let expected = expected_tools(&scenario.id);
        let tool_usage = invoke_tools(
            &mut self.faults,
            &expected,
            self.options.simulate_latency,
            self.options.log_tool_usage,
        )
        .await?;
        let succeeded: Vec<&str> = tool_usage
            .iter()
            .filter(|u| u.invoked && u.success)
            .map(|u| u.tool_name.as_str())
            .collect();
        let (tool_reasoning, tool_confidence) = if expected.is_empty() {
            ("No tools required for this request".to_string(), 0.9)
        } else {
            let fraction = succeeded.len() as f64 / expected.len() as f64;
            (
                format!(
                    "Invoked {} tool(s) [{}]; {} succeeded",
                    expected.len(),
                    expected.join(", "),
                    succeeded.len()
                ),
                0.5 + 0.5 * fraction,
            )
        };
        self.record(
            &mut trace,
            &scenario.id,
            "execute_tools",
            tool_reasoning,
            tool_confidence,
        );

        // Step 3: response generation
        let response = synthesize_response(&ResponseContext {
            mock_response: &scenario.mock_response,
            category: scenario.category,
            language,
            is_default_language: self.config.is_default_language(language),
            succeeded_tools: &succeeded,
        });
        self.record(
            &mut trace,
            &scenario.id,
            "generate_response",
            format!(
                "Composed {} char response from template for {}",
                response.chars().count(),
                language
            ),
            RESPONSE_CONFIDENCE,
        );

        Ok(Simulated {
            response,
            expected_tools: expected,
            tool_usage,
            trace,
        })
    }

    fn record(
        &self,
        trace: &mut Vec<DecisionTrace>,
        scenario_id: &str,
        action: &str,
        reasoning: String,
        confidence: f64,
    ) {
        let step = trace.len() as u32 + 1;
        if self.options.log_decision_path {
            debug!(scenario = %scenario_id, step, action, %reasoning, "decision step");
        }
        trace.push(DecisionTrace {
            step,
            action: action.to_string(),
            reasoning,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: timestamp_now(),
        });
    }

    pub fn into_faults(self) -> F {
        self.faults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::response::has_citation;
    use crate::eval::tools::{ScriptedFaults, ToolCallOutcome};

    fn config(mock_mode: bool) -> EvaluationConfig {
        let yaml = format!(
            r#"
version: "1.0"
languages:
  - code: en
  - code: ar
scenarios:
  - id: price_alert_1
    category: advice
    languages: [en]
    input: "Should I set a gold price alert?"
    mock_response: "Gold looks strong this week"
  - id: forecast_weekly
    category: tools
    languages: [en]
    input: "Forecast next week"
    mock_response: "Next week the gold price is expected to rise slightly."
  - id: docs_alerts_faq
    category: docs
    languages: [en, ar]
    input: "How do alerts work?"
    mock_response: "Alerts trigger when the gold price crosses your target."
evaluation:
  mock_mode: {}
  timeout_seconds: 1
"#,
            mock_mode
        );
        EvaluationConfig::from_yaml_str(&yaml).unwrap()
    }

    fn options() -> ExecutorOptions {
        ExecutorOptions {
            simulate_latency: false,
            timeout: Duration::from_secs(5),
            log_tool_usage: false,
            log_decision_path: false,
        }
    }

    #[tokio::test]
    async fn test_mock_mode_price_alert_scores_100() {
        let config = config(true);
        let mut executor =
            ScenarioExecutor::new(&config, ScriptedFaults::always_succeed(60), options());
        let result = executor.execute(&config.scenarios[0], "en").await;

        assert_eq!(result.details.expected_response.chars().count(), 27);
        assert!(result.details.actual_response.contains("DISCLAIMER"));
        assert_eq!(result.score, 100.0);
        assert!(result.passed);
        assert!(result.details.errors.is_empty());
        assert_eq!(result.details.decision_trace.len(), 3);
        let steps: Vec<u32> = result.details.decision_trace.iter().map(|t| t.step).collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(result.details.tool_usage.len(), 2);
    }

    #[tokio::test]
    async fn test_strict_mode_unused_forecast_tool_fails() {
        let config = config(false);
        let mut executor =
            ScenarioExecutor::new(&config, ScriptedFaults::always_fail(90), options());
        let result = executor.execute(&config.scenarios[1], "en").await;

        assert!(result
            .details
            .errors
            .contains(&"expected tool forecast_api was not used".to_string()));
        assert!(!result.passed);
        assert_eq!(result.details.tool_usage.len(), 1);
        assert!(!result.details.tool_usage[0].success);
        assert!(!result.details.actual_response.contains("[Tools used:"));
    }

    #[tokio::test]
    async fn test_backend_error_is_isolated_to_its_pair() {
        let config = config(true);
        let faults = ScriptedFaults::new(
            vec![Err(ExecutionError::ToolBackend {
                tool: "price_api".to_string(),
                message: "connection reset".to_string(),
            })],
            ToolCallOutcome::success(10),
        );
        let mut executor = ScenarioExecutor::new(&config, faults, options());
        let outcome = executor.run_all().await;

        assert_eq!(outcome.results.len(), 4);
        let failed = &outcome.results[0];
        assert_eq!(failed.scenario_id, "price_alert_1");
        assert!(!failed.passed);
        assert_eq!(failed.score, 0.0);
        assert_eq!(failed.details.errors.len(), 1);
        assert!(failed.details.errors[0].contains("connection reset"));
        assert!(failed.details.tool_usage.is_empty());
        assert!(failed.details.decision_trace.is_empty());

        // The remaining pairs still ran.
        assert!(outcome.results[1].passed);
        assert_eq!(outcome.results[1].scenario_id, "forecast_weekly");
    }

    #[tokio::test]
    async fn test_run_all_follows_config_order() {
        let config = config(true);
        let mut executor =
            ScenarioExecutor::new(&config, ScriptedFaults::always_succeed(10), options());
        let outcome = executor.run_all().await;

        let order: Vec<(&str, &str)> = outcome
            .results
            .iter()
            .map(|r| (r.scenario_id.as_str(), r.language.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("price_alert_1", "en"),
                ("forecast_weekly", "en"),
                ("docs_alerts_faq", "en"),
                ("docs_alerts_faq", "ar"),
            ]
        );
        for result in &outcome.results {
            assert!((0.0..=100.0).contains(&result.score));
            if result.passed {
                assert!(result.details.errors.is_empty());
            }
        }
        assert!(has_citation(&outcome.results[2].details.actual_response));
        assert!(outcome.results[3].details.actual_response.contains("الذهب"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tool_times_out() {
        let config = config(true);
        let mut opts = options();
        opts.simulate_latency = true;
        opts.timeout = Duration::from_secs(1);
        let faults = ScriptedFaults::always_succeed(5_000);
        let mut executor = ScenarioExecutor::new(&config, faults, opts);
        let result = executor.execute(&config.scenarios[1], "en").await;

        assert!(!result.passed);
        assert_eq!(result.score, 0.0);
        assert_eq!(
            result.details.errors,
            vec!["scenario timed out after 1s".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rubric_override() {
        let config = config(true);
        let executor = ScenarioExecutor::new(&config, ScriptedFaults::always_succeed(1), options())
            .with_rubric(Rubric::strict());
        assert!(executor.rubric().is_strict());
    }
}
