use crate::coordinator::{RunOutcome, RunSummary};
use crate::models::{EvaluationRecord, ModelInfo, ProgressEvent, ScenarioInfo, TrustRating};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Trust score as a percentage with one decimal, e.g. `82.3%`
fn format_trust(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// Print the model catalog in the specified format
pub fn print_models(models: &[ModelInfo], format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            println!("Available models ({}):", models.len());
            for model in models {
                match &model.description {
                    Some(description) => {
                        println!("  {}  {} ({})", model.id, model.name, description)
                    }
                    None => println!("  {}  {}", model.id, model.name),
                }
            }
        }
        OutputFormat::Json => print_json(models),
    }
}

/// Print the scenario catalog in the specified format
pub fn print_scenarios(scenarios: &[ScenarioInfo], format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            println!("Available scenarios ({}):", scenarios.len());
            for scenario in scenarios {
                let category = scenario.category.as_deref().unwrap_or("uncategorized");
                println!("  {}  {} [{}]", scenario.id, scenario.title, category);
            }
        }
        OutputFormat::Json => print_json(scenarios),
    }
}

/// Print the filtered history table with its result count
pub fn print_history(rows: &[EvaluationRecord], total: usize, format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_history_plain(rows, total),
        OutputFormat::Json => print_json(rows),
    }
}

fn print_history_plain(rows: &[EvaluationRecord], total: usize) {
    if rows.is_empty() {
        if total == 0 {
            println!("No evaluations yet.");
        } else {
            println!("No evaluations match the filter ({} total).", total);
        }
        return;
    }

    println!("Showing {} of {} evaluations", rows.len(), total);
    println!(
        "{:<20} {:<30} {:>8} {:>6} {:>6}  {:<20} {}",
        "Model", "Scenario", "Trust", "Found", "Fixed", "Timestamp", "Rating"
    );
    println!("{}", "-".repeat(100));

    for row in rows {
        let rating = TrustRating::from_score(row.metrics.trust_score);
        println!(
            "{:<20} {:<30} {:>8} {:>6} {:>6}  {:<20} {}",
            row.model.name,
            row.scenario.title,
            format_trust(row.metrics.trust_score),
            row.metrics.hallucinations_found,
            row.metrics.hallucinations_corrected,
            row.timestamp.format("%Y-%m-%d %H:%M:%S"),
            rating.label()
        );
    }
}

/// Print one live progress line while a run is tracked
pub fn print_progress_line(event: &ProgressEvent, completed: usize, total: usize) {
    println!(
        "[{:>3.0}%] ({}/{}) {}",
        event.progress, completed, total, event.status
    );
    if let Some(result) = &event.result {
        println!(
            "  finished: {} on \"{}\" (trust {})",
            result.model.name,
            result.scenario.title,
            format_trust(result.metrics.trust_score)
        );
    }
    if let Some(error) = &event.error {
        eprintln!("warning: {}", error);
    }
}

/// Print one finished pair with its metrics, reports, and log
pub fn print_outcome(index: usize, outcome: &RunOutcome) {
    let record = &outcome.record;

    println!(
        "=== Result #{}: {} on \"{}\" ===",
        index + 1,
        record.model.name,
        record.scenario.title
    );
    println!(
        "Trust score: {}  (found: {}, corrected: {})",
        format_trust(record.metrics.trust_score),
        record.metrics.hallucinations_found,
        record.metrics.hallucinations_corrected
    );

    println!("Raw model output:");
    println!("{}", record.raw_model_output);
    println!("Corrected output:");
    println!("{}", record.advisor_corrected_output);

    if record.detailed_hallucination_report.is_empty() {
        println!("Detected hallucinations: none");
    } else {
        println!("Detected hallucinations:");
        for finding in &record.detailed_hallucination_report {
            println!(
                "  • {}: {} ({})",
                finding.kind,
                finding.text.as_deref().unwrap_or("N/A"),
                finding.description.as_deref().unwrap_or("No description")
            );
        }
    }

    if record.detailed_corrections_log.is_empty() {
        println!("Applied corrections: none");
    } else {
        println!("Applied corrections:");
        for correction in &record.detailed_corrections_log {
            println!("  • {}: {}", correction.original, correction.reason);
        }
    }

    match &outcome.log {
        Some(log) => {
            println!("Full evaluation log:");
            println!("{}", log);
        }
        None => println!("Log not available."),
    }
    println!();
}

/// Print the end-of-run summary in the specified format
pub fn print_summary(summary: &RunSummary, format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            println!("{}", summary.message);
            println!(
                "Completed {} of {} evaluation pairs",
                summary.completed, summary.total
            );
            for warning in &summary.warnings {
                eprintln!("warning: {}", warning);
            }
        }
        OutputFormat::Json => print_json(&summary.outcomes),
    }
}

/// Print any serializable value as pretty JSON
fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}
