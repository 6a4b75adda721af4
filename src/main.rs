// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! opcontext main entry point - demo scenarios and config commands.

use std::path::Path;

use clap::{Parser, Subcommand};
use colored::Colorize;

use opcontext::config::{self, ClientSettings, ResolvedSettings, CONFIG_FILES};
use opcontext::demo::{run_scenario, Scenario, ScenarioReport};
use opcontext::diagnostics::{init_logging, parse_level, LoggingConfig};
use opcontext::ids::short_id;
use opcontext::{ChannelKind, IdFormat, StoreKind, TelemetryConfiguration, TelemetryItem};

/// opcontext version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// opcontext - operation correlation for telemetry clients.
#[derive(Parser)]
#[command(name = "opcontext")]
#[command(author, version, about = "Operation correlation for telemetry clients", long_about = None)]
struct Cli {
    /// Context store (ambient, scoped)
    #[arg(long, env = "OPCONTEXT_STORE")]
    store: Option<StoreKind>,

    /// Channel for finished items (log, none)
    #[arg(long, env = "OPCONTEXT_CHANNEL")]
    channel: Option<ChannelKind>,

    /// Format of generated operation ids (uuid, hex)
    #[arg(long, env = "OPCONTEXT_ID_FORMAT")]
    id_format: Option<IdFormat>,

    /// Do not copy ambient correlation ids onto new items
    #[arg(long)]
    no_correlation: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OPCONTEXT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Show debug output, including operation span lifecycles
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for opcontext.
#[derive(Subcommand)]
enum Commands {
    /// Run a demo scenario and print the submitted items
    Demo {
        /// Scenario to run (nested, out-of-order, override, concurrent); all if omitted
        scenario: Option<Scenario>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Print client metrics after each scenario
        #[arg(short, long)]
        metrics: bool,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show resolved configuration
    Show,
    /// Write a workspace config file with default values
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = ClientSettings {
        store: cli.store,
        channel: cli.channel,
        id_format: cli.id_format,
        correlation: if cli.no_correlation { Some(false) } else { None },
        log_level: cli.log_level,
    };

    let workspace_root = std::env::current_dir()?;
    let settings = config::load_settings(&workspace_root, overrides)?;

    let logging = if cli.debug {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_level(parse_level(&settings.log_level)?)
    };
    let _guard = init_logging(&logging)?;

    match cli.command {
        Commands::Demo {
            scenario,
            json,
            metrics,
        } => handle_demo(&settings, scenario, json, metrics).await,
        Commands::Config { action } => handle_config(&workspace_root, &settings, action),
        Commands::Version => {
            println!("opcontext {}", VERSION);
            Ok(())
        }
    }
}

async fn handle_demo(
    settings: &ResolvedSettings,
    scenario: Option<Scenario>,
    json: bool,
    metrics: bool,
) -> anyhow::Result<()> {
    let scenarios = match scenario {
        Some(scenario) => vec![scenario],
        None => Scenario::ALL.to_vec(),
    };

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let configuration = TelemetryConfiguration::from_settings(settings);
        reports.push(run_scenario(scenario, configuration).await?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        print_report(report, metrics);
    }
    Ok(())
}

fn print_report(report: &ScenarioReport, metrics: bool) {
    println!(
        "\n{}",
        format!("== {} ==", report.scenario).bright_blue().bold()
    );

    for item in &report.items {
        print_item(item);
    }

    match &report.residual_context {
        None => println!("{}", "context restored to empty".green()),
        Some(snapshot) => println!(
            "{} {}",
            "context left behind:".yellow(),
            snapshot.parent_operation_id()
        ),
    }

    if metrics {
        println!("\n{}", report.metrics.format_report().dimmed());
    }
}

fn print_item(item: &TelemetryItem) {
    let operation = item.operation();
    let duration = item
        .duration()
        .map(|d| format!("{:.2?}", d))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{} {} {}",
        format!("{:<10}", item.kind()).bright_cyan(),
        item.name().unwrap_or("<unnamed>").bright_white(),
        duration.dimmed()
    );
    println!(
        "    id {}  parent {}  root {} ({})",
        display_id(operation.id.as_deref()).bright_magenta(),
        display_id(operation.parent_id.as_deref()),
        display_id(operation.root_id.as_deref()),
        operation.root_name.as_deref().unwrap_or("-")
    );
}

fn display_id(id: Option<&str>) -> String {
    id.map(short_id).unwrap_or("-").to_string()
}

fn handle_config(
    workspace_root: &Path,
    settings: &ResolvedSettings,
    action: Option<ConfigAction>,
) -> anyhow::Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("{}", serde_json::to_string_pretty(settings)?);
        }
        Some(ConfigAction::Init) => {
            if let Some(existing) = CONFIG_FILES
                .iter()
                .map(|name| workspace_root.join(name))
                .find(|path| path.exists())
            {
                anyhow::bail!("Config file already exists: {}", existing.display());
            }
            let defaults = ClientSettings::from(&ResolvedSettings::default());
            let path = config::save_workspace_settings(workspace_root, &defaults)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}
