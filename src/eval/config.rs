// src/eval/config.rs
//
// Evaluation configuration: parsing and validation.
//
// The configuration fully defines a run:
// - categories and languages (with weights, informational)
// - the ordered scenario list
// - evaluation settings (scoring mode, thresholds, output, CI gate)
// - debug settings
//
// YAML is the primary format; JSON documents parse through the same path.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::EvalError;

/// Default configuration path used when the CLI gets no positional argument.
pub const DEFAULT_CONFIG_PATH: &str = "eval/copilot_scenarios.yaml";

/// Scenario category. The set is closed; breakdowns always list all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Tool-calling behaviour (price lookups, alerts, exports).
    Tools,
    /// Answers grounded in product documentation; must cite sources.
    Docs,
    /// System/provider status questions.
    Status,
    /// Investment-adjacent questions; must carry safety disclaimers.
    Advice,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Tools,
        Category::Docs,
        Category::Status,
        Category::Advice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tools => "tools",
            Category::Docs => "docs",
            Category::Status => "status",
            Category::Advice => "advice",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category definition (documentation and weighting metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Declared number of scenarios in this category.
    #[serde(default)]
    pub scenarios: u32,
}

/// Language definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// A single configured test case.
///
/// `expected_behavior` and `success_criteria` are carried through to the
/// report untouched; scoring does not read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationScenario {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub languages: Vec<String>,
    pub input: String,
    #[serde(default)]
    pub expected_behavior: Vec<String>,
    #[serde(default)]
    pub success_criteria: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub mock_response: String,
}

/// Aggregate thresholds checked by the CI gate (fractions in [0, 1]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringThresholds {
    #[serde(default = "default_overall_pass_rate")]
    pub overall_pass_rate: f64,
    #[serde(default = "default_advice_safety")]
    pub advice_safety: f64,
    #[serde(default = "default_docs_citation")]
    pub docs_citation: f64,
}

fn default_overall_pass_rate() -> f64 {
    0.8
}

fn default_advice_safety() -> f64 {
    0.95
}

fn default_docs_citation() -> f64 {
    0.9
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            overall_pass_rate: default_overall_pass_rate(),
            advice_safety: default_advice_safety(),
            docs_citation: default_docs_citation(),
        }
    }
}

/// Serialization format of the main report file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
}

/// Where and how the run report is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    /// Keep per-result decision traces in `detailed_results`.
    #[serde(default = "default_true")]
    pub include_traces: bool,
    /// Keep per-result tool usage in `detailed_results`.
    #[serde(default = "default_true")]
    pub include_tool_usage: bool,
}

fn default_output_file() -> PathBuf {
    PathBuf::from("eval/results/copilot_eval_report.json")
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            file: default_output_file(),
            include_traces: true,
            include_tool_usage: true,
        }
    }
}

/// How the CI gate outcome is reported beyond the JSON file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReportFormat {
    /// Console summary only.
    #[default]
    Console,
    /// Console summary plus a Markdown file next to the JSON report.
    Markdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiGateSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Exit non-zero when any threshold is missed.
    #[serde(default = "default_true")]
    pub fail_on_threshold_breach: bool,
    #[serde(default)]
    pub report_format: GateReportFormat,
}

impl Default for CiGateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_on_threshold_breach: true,
            report_format: GateReportFormat::Console,
        }
    }
}

/// Global evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Lenient scoring for running without a live backend.
    #[serde(default = "default_true")]
    pub mock_mode: bool,
    /// Per scenario x language wall-clock budget.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Informational only: simulated tool calls are never retried.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub scoring: ScoringThresholds,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub ci_gate: CiGateSettings,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            mock_mode: true,
            timeout_seconds: default_timeout_seconds(),
            max_retries: 0,
            default_language: default_language(),
            scoring: ScoringThresholds::default(),
            output: OutputSettings::default(),
            ci_gate: CiGateSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugSettings {
    #[serde(default)]
    pub enabled: bool,
    /// tracing level directive ("error", "warn", "info", "debug", "trace").
    #[serde(default = "default_trace_level")]
    pub trace_level: String,
    #[serde(default)]
    pub log_tool_usage: bool,
    #[serde(default)]
    pub log_decision_path: bool,
}

fn default_trace_level() -> String {
    "info".to_string()
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            trace_level: default_trace_level(),
            log_tool_usage: false,
            log_decision_path: false,
        }
    }
}

/// Complete evaluation configuration. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Uses BTreeMap for stable ordering.
    #[serde(default)]
    pub categories: BTreeMap<String, CategorySpec>,
    #[serde(default)]
    pub languages: Vec<LanguageSpec>,
    pub scenarios: Vec<EvaluationScenario>,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub debug: DebugSettings,
}

impl EvaluationConfig {
    /// Load a configuration from a YAML (or JSON) file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, EvalError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| EvalError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse a configuration from a YAML (or JSON) string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EvalError> {
        Self::parse(yaml, "<string>")
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, EvalError> {
        let config: EvaluationConfig =
            serde_yaml::from_str(contents).map_err(|source| EvalError::ConfigParse {
                path: origin.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Violations are fatal.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.version.trim().is_empty() {
            return Err(EvalError::invalid("version", "version cannot be empty"));
        }

        if self.scenarios.is_empty() {
            return Err(EvalError::invalid(
                "scenarios",
                "scenarios list cannot be empty",
            ));
        }

        let mut seen = BTreeSet::new();
        for (i, scenario) in self.scenarios.iter().enumerate() {
            if scenario.id.trim().is_empty() {
                return Err(EvalError::invalid(
                    format!("scenarios[{}].id", i),
                    "scenario id cannot be empty",
                ));
            }
            if !seen.insert(scenario.id.as_str()) {
                return Err(EvalError::invalid(
                    format!("scenarios[{}].id", i),
                    format!("duplicate scenario id '{}'", scenario.id),
                ));
            }
            if scenario.languages.is_empty() {
                return Err(EvalError::invalid(
                    format!("scenarios[{}].languages", i),
                    "at least one language is required",
                ));
            }
        }

        let scoring = &self.evaluation.scoring;
        for (field, value) in [
            ("overall_pass_rate", scoring.overall_pass_rate),
            ("advice_safety", scoring.advice_safety),
            ("docs_citation", scoring.docs_citation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvalError::invalid(
                    format!("evaluation.scoring.{}", field),
                    format!("threshold must be within [0, 1], got {}", value),
                ));
            }
        }

        if self.evaluation.timeout_seconds == 0 {
            return Err(EvalError::invalid(
                "evaluation.timeout_seconds",
                "timeout_seconds must be > 0",
            ));
        }

        if self.evaluation.output.file.as_os_str().is_empty() {
            return Err(EvalError::invalid(
                "evaluation.output.file",
                "output file path cannot be empty",
            ));
        }

        if self.evaluation.default_language.trim().is_empty() {
            return Err(EvalError::invalid(
                "evaluation.default_language",
                "default_language cannot be empty",
            ));
        }

        Ok(())
    }

    /// Soft inconsistencies worth a warning but not fatal.
    pub fn lint(&self) -> Vec<String> {
        let mut notes = Vec::new();

        let declared: BTreeSet<&str> = self.languages.iter().map(|l| l.code.as_str()).collect();
        if !declared.is_empty() {
            for scenario in &self.scenarios {
                for code in &scenario.languages {
                    if !declared.contains(code.as_str()) {
                        notes.push(format!(
                            "scenario '{}' targets undeclared language '{}'",
                            scenario.id, code
                        ));
                    }
                }
            }
        }

        for category in Category::ALL {
            if let Some(spec) = self.categories.get(category.as_str()) {
                let actual = self
                    .scenarios
                    .iter()
                    .filter(|s| s.category == category)
                    .count();
                if spec.scenarios as usize != actual {
                    notes.push(format!(
                        "category '{}' declares {} scenarios but {} are configured",
                        category, spec.scenarios, actual
                    ));
                }
            }
        }

        for name in self.categories.keys() {
            if !Category::ALL.iter().any(|c| c.as_str() == name) {
                notes.push(format!("unknown category definition '{}'", name));
            }
        }

        notes
    }

    /// Whether `code` is the default (untranslated) language.
    pub fn is_default_language(&self, code: &str) -> bool {
        code == self.evaluation.default_language
    }

    /// Language codes to report on: declared languages first, in order.
    pub fn language_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for lang in &self.languages {
            if !codes.contains(&lang.code) {
                codes.push(lang.code.clone());
            }
        }
        codes
    }

    /// Scenario x language pairs in execution order.
    pub fn pairs(&self) -> impl Iterator<Item = (&EvaluationScenario, &str)> {
        self.scenarios
            .iter()
            .flat_map(|s| s.languages.iter().map(move |l| (s, l.as_str())))
    }
}
