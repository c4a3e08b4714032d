//! Discover command implementation.
//!
//! The discover command:
//! 1. Resolves discovery parameters (config file, then CLI overrides)
//! 2. Reads the event log
//! 3. Pre-groups selected activities (optional)
//! 4. Discovers the tree
//! 5. Writes the text summary

use crate::eventlog::{group_log_activities, load_log};
use crate::output::{generate_tree_summary, SummaryOptions};
use crate::tree::{discover_multi_dimensional_drt, Dimension, Drt};
use crate::utils::config::DrtParameters;
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the discover command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct DiscoverArgs {
    /// Path to the JSON event log
    pub log_path: PathBuf,

    /// Optional JSON file with discovery parameters
    pub config_path: Option<PathBuf>,

    /// Dimensions switched off on the command line
    pub disabled_dimensions: Vec<Dimension>,

    /// Collapse non-branching chains
    pub group_activities: bool,

    /// Activities merged per case before discovery
    pub pre_group: Vec<String>,

    /// Deepest depth printed in the summary
    pub max_depth: Option<i64>,

    /// Write the summary to a file instead of stdout
    pub output: Option<PathBuf>,
}

/// Execute the discover command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Discover command arguments
///
/// # Returns
/// The discovered tree, after the summary has been written
///
/// # Errors
/// * Config file read or parse failures
/// * Log read failures (missing columns, malformed rows)
/// * Pre-grouping failures (unknown activities, unmergeable attributes)
/// * Discovery failures (missing per-activity values)
///
/// # Example
/// ```ignore
/// let args = DiscoverArgs {
///     log_path: PathBuf::from("log.json"),
///     group_activities: true,
///     ..Default::default()
/// };
///
/// execute_discover(args)?;
/// ```
pub fn execute_discover(args: DiscoverArgs) -> Result<Drt> {
    let start_time = Instant::now();

    info!("Starting discovery for log: {}", args.log_path.display());

    // Step 1: Resolve parameters
    info!("Step 1/5: Resolving discovery parameters...");
    let params = build_parameters(&args)?;
    debug!("Discovery parameters: {:?}", params);

    // Step 2: Read log
    info!("Step 2/5: Reading event log...");
    let mut log = load_log(&args.log_path, &params)
        .with_context(|| format!("Failed to read event log {}", args.log_path.display()))?;

    // Step 3: Pre-group (if requested)
    if args.pre_group.is_empty() {
        info!("Step 3/5: Skipping pre-grouping (not requested)");
    } else {
        info!("Step 3/5: Pre-grouping {} activities...", args.pre_group.len());
        let activities: BTreeSet<String> = args.pre_group.iter().cloned().collect();
        log = group_log_activities(&log, &activities).context("Failed to pre-group activities")?;
    }

    // Step 4: Discover
    info!("Step 4/5: Discovering tree...");
    let tree = discover_multi_dimensional_drt(&log, &params).context("Failed to discover tree")?;

    // Step 5: Summary
    info!("Step 5/5: Writing summary...");
    let options = SummaryOptions {
        max_depth: args.max_depth,
    };
    let summary = generate_tree_summary(&tree, &options);

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", summary))
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            info!("✓ Summary written to: {}", path.display());
        }
        None => {
            println!("\n{}", "=".repeat(80));
            println!("{}", summary);
            println!("{}", "=".repeat(80));
        }
    }

    let elapsed = start_time.elapsed();
    info!("Discovery completed in {:.2}s", elapsed.as_secs_f64());

    Ok(tree)
}

/// Parameters from the config file (if any) with CLI overrides applied
///
/// **Public** - shared with the validate command
pub fn build_parameters(args: &DiscoverArgs) -> Result<DrtParameters> {
    let mut params = match &args.config_path {
        Some(path) => DrtParameters::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DrtParameters::default(),
    };

    for dimension in &args.disabled_dimensions {
        params.dimensions.set(*dimension, false);
    }
    if args.group_activities {
        params.group_activities = true;
    }

    params.validate().context("Invalid discovery parameters")?;
    Ok(params)
}

/// Validate discover arguments
///
/// **Public** - can be called before execute_discover for early validation
///
/// # Arguments
/// * `args` - Arguments to validate
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &DiscoverArgs) -> Result<()> {
    if args.log_path.as_os_str().is_empty() {
        anyhow::bail!("Log path cannot be empty");
    }

    if !args.log_path.is_file() {
        anyhow::bail!("Log file not found: {}", args.log_path.display());
    }

    if let Some(config) = &args.config_path {
        if !config.is_file() {
            anyhow::bail!("Config file not found: {}", config.display());
        }
    }

    if args.pre_group.iter().any(|a| a.trim().is_empty()) {
        anyhow::bail!("Pre-grouping activity names cannot be empty");
    }

    if let Some(depth) = args.max_depth {
        if depth < 0 {
            anyhow::bail!("max_depth cannot be negative");
        }
    }

    Ok(())
}
