use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

mod api;
mod channel;
mod config;
mod coordinator;
mod error;
mod export;
mod history;
mod models;
mod output;
mod store;
mod stream;

use crate::api::ApiClient;
use crate::channel::EventChannel;
use crate::config::ClientConfig;
use crate::coordinator::RunCoordinator;
use crate::history::{HistoryView, SortKey};
use crate::output::OutputFormat;
use crate::store::SelectionStore;
use crate::stream::EventStream;

/// Console client for the evaluations backend - submit runs, track progress,
/// and browse past results
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models available for evaluation
    Models {
        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },
    /// List the available evaluation scenarios
    Scenarios {
        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },
    /// Show past evaluations, filtered and sorted
    History {
        /// Case-insensitive text matched against model name, scenario title,
        /// and scenario category
        #[arg(short, long)]
        filter: Option<String>,
        /// Sort order for the table
        #[arg(short, long, default_value = "timestamp-desc")]
        sort: SortKey,
        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },
    /// Export past evaluations as CSV
    Export {
        /// Case-insensitive text matched against model name, scenario title,
        /// and scenario category
        #[arg(short, long)]
        filter: Option<String>,
        /// Sort order for the exported rows
        #[arg(short, long, default_value = "timestamp-desc")]
        sort: SortKey,
        /// Target file; defaults to evaluations_<date>.csv in the working
        /// directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Submit an evaluation run and track it to completion
    Run {
        /// Model id to evaluate (repeatable); defaults to the saved selection
        #[arg(long = "model")]
        models: Vec<String>,
        /// Scenario id to evaluate (repeatable); defaults to the saved
        /// selection
        #[arg(long = "scenario")]
        scenarios: Vec<String>,
        /// Evaluate every model in the catalog
        #[arg(long)]
        all_models: bool,
        /// Evaluate every scenario in the catalog
        #[arg(long)]
        all_scenarios: bool,
        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;
    let api = ApiClient::new(&config)?;

    match cli.command {
        Command::Models { output } => {
            let models = api.fetch_models().await?;
            output::print_models(&models, output);
        }
        Command::Scenarios { output } => {
            let scenarios = api.fetch_scenarios().await?;
            output::print_scenarios(&scenarios, output);
        }
        Command::History {
            filter,
            sort,
            output,
        } => {
            let view = build_history_view(&api, filter.as_deref(), sort).await?;
            output::print_history(&view.apply(), view.total_count(), output);
        }
        Command::Export { filter, sort, out } => {
            let view = build_history_view(&api, filter.as_deref(), sort).await?;
            let rows = view.apply();
            let path = out.unwrap_or_else(|| {
                PathBuf::from(export::default_file_name(
                    chrono::Utc::now().date_naive(),
                ))
            });
            export::export_to_file(&rows, &path)?;
            println!("Exported {} evaluations to {}", rows.len(), path.display());
        }
        Command::Run {
            models,
            scenarios,
            all_models,
            all_scenarios,
            output,
        } => {
            run_and_track(
                &config,
                &api,
                models,
                scenarios,
                all_models,
                all_scenarios,
                output,
            )
            .await?;
        }
    }

    Ok(())
}

/// Fetch the history and wrap it in a view with the requested filter and sort
async fn build_history_view(
    api: &ApiClient,
    filter: Option<&str>,
    sort: SortKey,
) -> Result<HistoryView> {
    let records = api.fetch_evaluations().await?;
    let mut view = HistoryView::new(records);
    if let Some(filter) = filter {
        view.set_filter(filter);
    }
    view.set_sort(sort);
    Ok(view)
}

/// Build the selection from CLI flags, falling back to the saved one
fn build_selection(
    coordinator: &mut RunCoordinator,
    store: Option<&SelectionStore>,
    models: &[String],
    scenarios: &[String],
    all_models: bool,
    all_scenarios: bool,
) {
    if all_models {
        coordinator.select_all_models();
    } else {
        for id in models {
            coordinator.toggle_model(id);
        }
    }
    if all_scenarios {
        coordinator.select_all_scenarios();
    } else {
        for id in scenarios {
            coordinator.toggle_scenario(id);
        }
    }

    if coordinator.selected_models().is_empty() && coordinator.selected_scenarios().is_empty() {
        if let Some(store) = store {
            let saved = store.load();
            if !saved.is_empty() {
                coordinator.restore_selection(&saved);
                tracing::info!(
                    models = coordinator.selected_models().len(),
                    scenarios = coordinator.selected_scenarios().len(),
                    "restored saved selection"
                );
            }
        }
    }
}

/// Submit a run, stream its progress, and print the finalized results
async fn run_and_track(
    config: &ClientConfig,
    api: &ApiClient,
    models: Vec<String>,
    scenarios: Vec<String>,
    all_models: bool,
    all_scenarios: bool,
    output: OutputFormat,
) -> Result<()> {
    let model_catalog = api.fetch_models().await?;
    let scenario_catalog = api.fetch_scenarios().await?;
    let mut coordinator = RunCoordinator::new(
        model_catalog,
        scenario_catalog,
        Duration::from_secs(config.event_timeout_secs),
    );

    let store = SelectionStore::default_location();
    build_selection(
        &mut coordinator,
        store.as_ref(),
        &models,
        &scenarios,
        all_models,
        all_scenarios,
    );

    // The transport must be attached before the run starts so the earliest
    // events are already flowing into the channel.
    let channel = EventChannel::new();
    let stream = EventStream::new(config)?;
    let pump = {
        let channel = channel.clone();
        tokio::spawn(async move {
            if let Err(error) = stream.pump(&channel).await {
                tracing::warn!(%error, "event stream ended with an error");
            }
        })
    };

    let handle = match coordinator.submit(api, &channel).await {
        Ok(handle) => handle,
        Err(error) => {
            pump.abort();
            return Err(error.into());
        }
    };

    if let Some(store) = &store {
        if let Err(error) = store.save(&coordinator.saved_selection()) {
            tracing::warn!(%error, "failed to persist the selection");
        }
    }

    println!(
        "Run submitted: {} models x {} scenarios ({} pairs)",
        coordinator.selected_models().len(),
        coordinator.selected_scenarios().len(),
        coordinator.total()
    );

    let total = coordinator.total();
    let mut completed = 0usize;
    let tracked = coordinator
        .track(handle, api, |event| {
            if event.result.is_some() {
                completed += 1;
            }
            output::print_progress_line(event, completed, total);
        })
        .await;
    pump.abort();
    let summary = tracked?;

    if matches!(output, OutputFormat::Plain) {
        for (index, outcome) in summary.outcomes.iter().enumerate() {
            output::print_outcome(index, outcome);
        }
    }
    output::print_summary(&summary, output);

    if let Some(history) = summary.history {
        let view = HistoryView::new(history);
        println!();
        output::print_history(&view.apply(), view.total_count(), OutputFormat::Plain);
    }

    Ok(())
}
