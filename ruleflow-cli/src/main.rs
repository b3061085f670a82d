//! Ruleflow CLI
//!
//! Reference command-line wrapper around the rule engine: validate a rule
//! file, or evaluate it against a JSON input record.
//!
//! Exit codes: 0 success, 2 validation errors, 3 evaluation error,
//! 4 I/O error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use codespan_reporting::term::{
    self,
    termcolor::{ColorChoice, StandardStream},
};
use ruleflow_analyzer::{validate_rule, ValidationReport};
use ruleflow_diagnostics::SourceMap;
use ruleflow_engine::{json_inputs, RuleEngine, Value};

const EXIT_OK: i32 = 0;
const EXIT_VALIDATION: i32 = 2;
const EXIT_EVALUATION: i32 = 3;
const EXIT_IO: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Ruleflow - evaluate and validate business rules
#[derive(Parser)]
#[command(name = "ruleflow")]
#[command(about = "Evaluate and validate Ruleflow business rules")]
#[command(version)]
struct Cli {
    /// Path to the rule file (YAML)
    #[arg(long)]
    rule: PathBuf,

    /// Input record: inline JSON or a path to a JSON file
    #[arg(long)]
    input: Option<String>,

    /// Validate the rule without evaluating it
    #[arg(long)]
    validate_only: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let rule_text = match std::fs::read_to_string(&cli.rule) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("error: cannot read {}: {}", cli.rule.display(), error);
            return EXIT_IO;
        }
    };

    let report = validate_rule(&rule_text);

    if cli.validate_only {
        print_report(&report, cli.format);
        return if report.is_valid() { EXIT_OK } else { EXIT_VALIDATION };
    }

    if !report.is_valid() {
        print_report(&report, cli.format);
        if cli.format == OutputFormat::Text {
            render_parse_diagnostics(&rule_text);
        }
        return EXIT_VALIDATION;
    }

    let inputs = match load_inputs(cli.input.as_deref()) {
        Ok(inputs) => inputs,
        Err(error) => {
            eprintln!("error: {:#}", error);
            return EXIT_IO;
        }
    };

    let engine = RuleEngine::default();
    let result = engine.evaluate(&rule_text, inputs);

    match cli.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).expect("result serializes")
        ),
        OutputFormat::Text => {
            println!(
                "condition: {}",
                if result.condition_result { "matched" } else { "not matched" }
            );
            if result.circuit_breaker_triggered {
                println!(
                    "circuit breaker: {}",
                    result.circuit_breaker_message.as_deref().unwrap_or("tripped")
                );
            }
            for (name, value) in &result.outputs {
                println!("  {} = {}", name, value.to_json());
            }
            for event in &result.events {
                println!("note [{}]: {}", event.code, event.message);
            }
            if let Some(error) = &result.error {
                eprintln!("evaluation failed: {}", error);
            }
            println!("elapsed: {} ms", result.execution_ms);
        }
    }

    if result.success {
        EXIT_OK
    } else {
        EXIT_EVALUATION
    }
}

/// Inline JSON first; if that fails and the argument names a file, read it.
fn load_inputs(input: Option<&str>) -> Result<HashMap<String, Value>> {
    let Some(input) = input else {
        return Ok(HashMap::new());
    };
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(input) {
        return Ok(json_inputs(&json));
    }
    let path = Path::new(input);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("--input is neither inline JSON nor a readable file: {}", input))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(json_inputs(&json))
}

fn print_report(report: &ValidationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report.to_json()).expect("report serializes")
        ),
        OutputFormat::Text => {
            println!(
                "validation: {} (quality score {})",
                report.status().as_str(),
                report.quality_score()
            );
            for issue in &report.issues {
                let location = issue
                    .location
                    .as_deref()
                    .map(|l| format!(" at {}", l))
                    .unwrap_or_default();
                println!(
                    "  [{}] {} {}{}: {}",
                    issue.severity.as_str(),
                    issue.category.as_str(),
                    issue.code,
                    location,
                    issue.message
                );
                if let Some(suggestion) = &issue.suggestion {
                    println!("      suggestion: {}", suggestion);
                }
            }
        }
    }
}

/// Rich terminal rendering of parse failures with source snippets.
fn render_parse_diagnostics(rule_text: &str) {
    let mut sources = SourceMap::new();
    let Err(diagnostics) = ruleflow_yaml::parse_rule_str(rule_text, &mut sources) else {
        return;
    };
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    for diagnostic in diagnostics.iter() {
        let _ = term::emit(
            &mut writer.lock(),
            &config,
            &sources,
            &diagnostic.to_codespan_diagnostic(),
        );
    }
}
