// src/main.rs
//
// Command-line driver for the Gold Copilot evaluation harness.
// Loads the scenario catalogue, runs every scenario x language pair,
// writes the report and applies the CI gate.
//
// Usage:
//   copilot_eval                               # eval/copilot_scenarios.yaml
//   copilot_eval path/to/config.yaml --debug
//   copilot_eval --seed 42 --no-latency --output /tmp/report.json
//
// Exit codes:
//   0 - run completed (gate passed, disabled, or breach tolerated)
//   1 - config load failure, report write failure, or gate breach
//   2 - invalid command-line arguments

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use copilot_eval::eval::{
    evaluate_gate, markdown_path_for, print_console_summary, summarize_results,
    write_json_report, write_markdown_report, EvalError, EvaluationConfig, EvaluationReport,
    ExecutorOptions, GateReportFormat, ScenarioExecutor, SeededFaults, DEFAULT_CONFIG_PATH,
};
use copilot_eval::logging::{init_logging, resolve_level};

/// Command-line arguments for the evaluation binary.
#[derive(Parser, Debug)]
#[command(name = "copilot_eval", version, about)]
struct Cli {
    /// Evaluation configuration (YAML).
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug mode: debug-level logging and debug_info in the report.
    #[arg(long)]
    debug: bool,

    /// Seed for simulated tool latency and failures (reproducible runs).
    #[arg(long)]
    seed: Option<u64>,

    /// Override `evaluation.output.file`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Record drawn latencies without sleeping.
    #[arg(long)]
    no_latency: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = EvaluationConfig::from_yaml_file(&cli.config);
    let level = match &loaded {
        Ok(config) => resolve_level(&config.debug, cli.debug),
        Err(_) if cli.debug => "debug".to_string(),
        Err(_) => "info".to_string(),
    };
    init_logging(&level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, &cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mut config: EvaluationConfig, cli: &Cli) -> Result<ExitCode, EvalError> {
    if let Some(output) = &cli.output {
        config.evaluation.output.file = output.clone();
    }
    for warning in config.lint() {
        warn!("config: {}", warning);
    }

    let debug = cli.debug || config.debug.enabled;
    info!(
        "Loaded {} scenarios ({} pairs) from {}",
        config.scenarios.len(),
        config.pairs().count(),
        cli.config.display()
    );

    let faults = match cli.seed {
        Some(seed) => SeededFaults::new(seed),
        None => SeededFaults::from_entropy(),
    };
    let mut options = ExecutorOptions::from_config(&config);
    options.simulate_latency = !cli.no_latency;
    if debug {
        options.log_tool_usage = true;
        options.log_decision_path = true;
    }

    let mut executor = ScenarioExecutor::new(&config, faults, options);
    let scoring_mode = executor.rubric().mode_name();
    let outcome = executor.run_all().await;

    let mut summary = summarize_results(
        &outcome.results,
        &config.language_codes(),
        outcome.total_time_ms,
    );
    summary.ci_gate = evaluate_gate(
        &summary,
        &config.evaluation.ci_gate,
        &config.evaluation.scoring,
    );

    let report = EvaluationReport::build(&config, scoring_mode, summary, &outcome.results, debug);
    let report_path = &config.evaluation.output.file;
    write_json_report(&report, report_path)?;
    info!("Report written to {}", report_path.display());

    if config.evaluation.ci_gate.report_format == GateReportFormat::Markdown {
        let md_path = markdown_path_for(report_path);
        write_markdown_report(&report, &md_path)?;
        info!("Markdown report written to {}", md_path.display());
    }

    print_console_summary(&report);

    let gate = &report.summary.ci_gate;
    for failure in &gate.failures {
        warn!("CI gate: {}", failure);
    }
    Ok(match gate.exit_code(&config.evaluation.ci_gate) {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
