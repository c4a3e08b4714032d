//! mddrt CLI
//!
//! Discovers multi-dimensional directly-rooted trees from event logs and
//! prints their per-node cost, time, rework and optionality statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use mddrt::commands::{
    build_parameters, display_version, execute_discover, validate_args, validate_log_file,
    DiscoverArgs,
};
use mddrt::tree::Dimension;

/// mddrt - Multi-dimensional directly-rooted tree discovery
#[derive(Parser, Debug)]
#[command(name = "mddrt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover a tree from an event log
    Discover {
        /// Path to the JSON event log (array of row objects)
        #[arg(short, long)]
        log: PathBuf,

        /// JSON file with column keys, dimensions and grouping switch
        #[arg(short, long, env = "MDDRT_CONFIG")]
        config: Option<PathBuf>,

        /// Disable the cost dimension
        #[arg(long)]
        no_cost: bool,

        /// Disable the time dimension
        #[arg(long)]
        no_time: bool,

        /// Disable the rework dimension
        #[arg(long)]
        no_rework: bool,

        /// Disable the optionality dimension
        #[arg(long)]
        no_optionality: bool,

        /// Collapse non-branching chains into grouped nodes
        #[arg(long)]
        group: bool,

        /// Activities to merge per case before discovery (comma separated)
        #[arg(long, value_delimiter = ',')]
        pre_group: Vec<String>,

        /// Deepest node depth printed in the summary
        #[arg(long)]
        max_depth: Option<i64>,

        /// Write the summary to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate an event log file
    Validate {
        /// Path to the JSON event log
        #[arg(short, long)]
        log: PathBuf,

        /// JSON file with column keys
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Discover {
            log,
            config,
            no_cost,
            no_time,
            no_rework,
            no_optionality,
            group,
            pre_group,
            max_depth,
            output,
        } => {
            let disabled_dimensions = [
                (no_cost, Dimension::Cost),
                (no_time, Dimension::Time),
                (no_rework, Dimension::Rework),
                (no_optionality, Dimension::Optionality),
            ]
            .into_iter()
            .filter_map(|(off, dimension)| off.then_some(dimension))
            .collect();

            let args = DiscoverArgs {
                log_path: log,
                config_path: config,
                disabled_dimensions,
                group_activities: group,
                pre_group,
                max_depth,
                output,
            };

            // Validate args first
            validate_args(&args)?;

            execute_discover(args)?;
        }

        Commands::Validate { log, config } => {
            let args = DiscoverArgs {
                log_path: log,
                config_path: config,
                ..Default::default()
            };
            validate_args(&args)?;
            let params = build_parameters(&args)?;
            validate_log_file(&args.log_path, &params)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
