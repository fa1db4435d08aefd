//! Blinc Combobox CLI
//!
//! Load a combobox configuration and filter it or replay scripted
//! interactions against it.

use anyhow::{Context, Result};
use blinc_combobox::prelude::*;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod script;

#[derive(Parser)]
#[command(name = "blinc-combobox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exercise the Blinc combobox state engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Combobox configuration (TOML)
    #[arg(short, long, global = true, default_value = "combobox.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the options visible for a query
    Filter {
        /// Free-text query (empty shows everything)
        #[arg(default_value = "")]
        query: String,
    },

    /// Replay an interaction script, one intent per line
    Replay {
        /// Script file
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = ComboboxConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let mut combobox = Combobox::from_config(config);
    info!("Loaded combobox '{}'", combobox.id());

    match cli.command {
        Commands::Filter { query } => cmd_filter(&mut combobox, &query),
        Commands::Replay { script } => cmd_replay(&mut combobox, &script),
    }
}

fn cmd_filter(combobox: &mut Combobox, query: &str) -> Result<()> {
    combobox.filter(query);
    print_visible(combobox.visible());
    Ok(())
}

fn cmd_replay(combobox: &mut Combobox, path: &Path) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let steps = script::parse_script(&content)?;
    info!("Replaying {} steps from {}", steps.len(), path.display());

    for step in &steps {
        script::apply(combobox, step);
    }

    if combobox.is_open() {
        print_visible(combobox.visible());
    }
    print_selection(combobox);
    Ok(())
}

fn print_option(option: &ComboOption, indent: &str) {
    let mut flags = Vec::new();
    if option.disabled {
        flags.push("disabled");
    }
    if option.is_appended() {
        flags.push("tag");
    }
    if flags.is_empty() {
        println!("{}{} ({})", indent, option.label, option.value);
    } else {
        println!("{}{} ({}) [{}]", indent, option.label, option.value, flags.join(", "));
    }
}

fn print_visible(visible: &FilterResult) {
    match visible {
        FilterResult::Flat(options) => {
            for option in options {
                print_option(option, "  ");
            }
        }
        FilterResult::Grouped(groups) => {
            for group in groups {
                println!("  {}", group.label);
                for option in &group.options {
                    print_option(option, "    ");
                }
            }
        }
    }
    println!("{} visible", visible.len());
}

fn print_selection(combobox: &Combobox) {
    println!("selected:");
    for option in combobox.selected_options() {
        print_option(option, "  ");
    }
    println!("value: {}", combobox.value().to_json());
    println!("display: {:?}", combobox.display_text());
}
