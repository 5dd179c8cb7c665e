// src/eval/tools.rs
//
// Simulated tool invocation.
//
// - TOOL_KEYWORDS: ordered scenario-id keyword -> tool table
// - ToolFaultModel: injectable source of latency and failure
// - SeededFaults: ChaCha8-backed model (deterministic given a seed)
// - ScriptedFaults: fixed outcome sequence for tests and replays
//
// Failed calls are recorded, never retried.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use super::error::ExecutionError;
use super::result::ToolUsage;

/// Scenario-id keyword -> expected tool, matched in this order.
pub const TOOL_KEYWORDS: &[(&str, &str)] = &[
    ("price", "price_api"),
    ("forecast", "forecast_api"),
    ("alert", "alert_api"),
    ("calculator", "calculator_api"),
    ("export", "export_api"),
    ("news", "news_api"),
    ("health", "health_api"),
];

/// Probability that a simulated call fails.
pub const DEFAULT_FAILURE_RATE: f64 = 0.05;

/// Inclusive latency bounds for a simulated call.
pub const DEFAULT_LATENCY_MS: (u64, u64) = (50, 150);

/// Tools a scenario is expected to use, derived from its id.
pub fn expected_tools(scenario_id: &str) -> Vec<&'static str> {
    let id = scenario_id.to_ascii_lowercase();
    let mut tools: Vec<&'static str> = Vec::new();
    for (keyword, tool) in TOOL_KEYWORDS {
        if id.contains(keyword) && !tools.contains(tool) {
            tools.push(tool);
        }
    }
    tools
}

/// Outcome of one simulated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolCallOutcome {
    pub latency_ms: u64,
    pub succeeded: bool,
}

impl ToolCallOutcome {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            succeeded: true,
        }
    }

    pub fn failure(latency_ms: u64) -> Self {
        Self {
            latency_ms,
            succeeded: false,
        }
    }
}

/// Source of simulated latency and failure.
///
/// `Ok` with `succeeded = false` is an ordinary flaky call; `Err` aborts the
/// whole scenario execution.
pub trait ToolFaultModel {
    fn next_call(&mut self, tool: &str) -> Result<ToolCallOutcome, ExecutionError>;
}

/// Seeded fault model.
#[derive(Debug, Clone)]
pub struct SeededFaults {
    rng: ChaCha8Rng,
    failure_rate: f64,
    latency_ms: (u64, u64),
}

impl SeededFaults {
    pub fn new(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Non-reproducible model for ad-hoc runs without `--seed`.
    pub fn from_entropy() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            failure_rate: DEFAULT_FAILURE_RATE,
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_latency_range(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms.min(max_ms), min_ms.max(max_ms));
        self
    }
}

impl ToolFaultModel for SeededFaults {
    fn next_call(&mut self, _tool: &str) -> Result<ToolCallOutcome, ExecutionError> {
        let latency_ms = self.rng.gen_range(self.latency_ms.0..=self.latency_ms.1);
        let failed = self.rng.gen_bool(self.failure_rate);
        Ok(ToolCallOutcome {
            latency_ms,
            succeeded: !failed,
        })
    }
}

/// Replays a fixed sequence of outcomes, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedFaults {
    script: VecDeque<Result<ToolCallOutcome, ExecutionError>>,
    fallback: ToolCallOutcome,
}

impl ScriptedFaults {
    pub fn new(
        script: impl IntoIterator<Item = Result<ToolCallOutcome, ExecutionError>>,
        fallback: ToolCallOutcome,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
        }
    }

    pub fn always_succeed(latency_ms: u64) -> Self {
        Self::new(Vec::new(), ToolCallOutcome::success(latency_ms))
    }

    pub fn always_fail(latency_ms: u64) -> Self {
        Self::new(Vec::new(), ToolCallOutcome::failure(latency_ms))
    }
}

impl ToolFaultModel for ScriptedFaults {
    fn next_call(&mut self, _tool: &str) -> Result<ToolCallOutcome, ExecutionError> {
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Call every tool in `tools` once, in order.
///
/// One `ToolUsage` per attempt regardless of outcome. When `simulate_latency`
/// is set the drawn latency is awaited.
pub async fn invoke_tools<F>(
    faults: &mut F,
    tools: &[&str],
    simulate_latency: bool,
    log_calls: bool,
) -> Result<Vec<ToolUsage>, ExecutionError>
where
    F: ToolFaultModel + ?Sized,
{
    let mut usage = Vec::with_capacity(tools.len());

    for tool in tools {
        let outcome = faults.next_call(tool)?;
        if simulate_latency && outcome.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(outcome.latency_ms)).await;
        }

        if log_calls {
            debug!(
                tool = %tool,
                latency_ms = outcome.latency_ms,
                success = outcome.succeeded,
                "simulated tool call"
            );
        }

        usage.push(ToolUsage {
            tool_name: tool.to_string(),
            invoked: true,
            success: outcome.succeeded,
            response_time_ms: outcome.latency_ms,
            error: if outcome.succeeded {
                None
            } else {
                Some(format!("{} request failed (simulated upstream error)", tool))
            },
        });
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_tools_keyword_order() {
        assert_eq!(expected_tools("price_alert_1"), vec!["price_api", "alert_api"]);
        assert_eq!(expected_tools("forecast_weekly"), vec!["forecast_api"]);
        assert_eq!(
            expected_tools("export_price_history"),
            vec!["price_api", "export_api"]
        );
        assert!(expected_tools("docs_faq_1").is_empty());
    }

    #[test]
    fn test_expected_tools_case_insensitive_and_deduplicated() {
        assert_eq!(expected_tools("PRICE_price_check"), vec!["price_api"]);
        assert_eq!(expected_tools("System_Health"), vec!["health_api"]);
    }

    #[test]
    fn test_seeded_faults_are_deterministic() {
        let mut a = SeededFaults::new(7);
        let mut b = SeededFaults::new(7);
        for _ in 0..50 {
            assert_eq!(a.next_call("price_api"), b.next_call("price_api"));
        }
    }

    #[test]
    fn test_seeded_latency_within_bounds() {
        let mut faults = SeededFaults::new(42);
        for _ in 0..200 {
            let outcome = faults.next_call("news_api").unwrap();
            assert!((50..=150).contains(&outcome.latency_ms));
        }
    }

    #[test]
    fn test_failure_rate_extremes() {
        let mut never = SeededFaults::new(1).with_failure_rate(0.0);
        let mut always = SeededFaults::new(1).with_failure_rate(1.0);
        for _ in 0..20 {
            assert!(never.next_call("x").unwrap().succeeded);
            assert!(!always.next_call("x").unwrap().succeeded);
        }
    }

    #[test]
    fn test_scripted_faults_replay_then_fallback() {
        let mut faults = ScriptedFaults::new(
            vec![
                Ok(ToolCallOutcome::failure(10)),
                Err(ExecutionError::ToolBackend {
                    tool: "price_api".to_string(),
                    message: "connection reset".to_string(),
                }),
            ],
            ToolCallOutcome::success(5),
        );
        assert_eq!(faults.next_call("a"), Ok(ToolCallOutcome::failure(10)));
        assert!(faults.next_call("a").is_err());
        assert_eq!(faults.next_call("a"), Ok(ToolCallOutcome::success(5)));
        assert_eq!(faults.next_call("a"), Ok(ToolCallOutcome::success(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_tools_records_every_attempt() {
        let mut faults = ScriptedFaults::new(
            vec![Ok(ToolCallOutcome::success(80))],
            ToolCallOutcome::failure(120),
        );
        let usage = invoke_tools(&mut faults, &["price_api", "alert_api"], true, false)
            .await
            .unwrap();

        assert_eq!(usage.len(), 2);
        assert!(usage[0].success);
        assert_eq!(usage[0].response_time_ms, 80);
        assert!(usage[0].error.is_none());
        assert!(usage[1].invoked);
        assert!(!usage[1].success);
        assert!(usage[1].error.as_deref().unwrap().contains("alert_api"));
    }

    #[tokio::test]
    async fn test_invoke_tools_propagates_backend_error() {
        let mut faults = ScriptedFaults::new(
            vec![Err(ExecutionError::ToolBackend {
                tool: "forecast_api".to_string(),
                message: "model unavailable".to_string(),
            })],
            ToolCallOutcome::success(1),
        );
        let result = invoke_tools(&mut faults, &["forecast_api"], false, false).await;
        assert!(matches!(result, Err(ExecutionError::ToolBackend { .. })));
    }
}
