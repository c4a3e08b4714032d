use crate::eventlog::{dimension_available, read_records};
use crate::metrics::{mandatory_activities, optional_activities};
use crate::tree::{Dimension, DimensionSet};
use crate::utils::config::DrtParameters;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Validate an event log file and report its shape
///
/// Dimensions whose columns are missing are reported and left out, so the
/// rest of the log can still be checked.
pub fn validate_log_file(log_path: &Path, params: &DrtParameters) -> Result<()> {
    println!("Validating event log: {}", log_path.display());

    let file = File::open(log_path)
        .with_context(|| format!("Failed to open event log {}", log_path.display()))?;
    let rows: Vec<Value> = serde_json::from_reader(BufReader::new(file))
        .context("Event log is not a JSON array of rows")?;

    let mut usable = DimensionSet::none();
    for dimension in params.dimensions.iter() {
        usable.set(dimension, dimension_available(&rows, params, dimension));
    }
    let log = read_records(&rows, &params.clone().with_dimensions(usable))
        .context("Failed to read event log")?;

    let mandatory = mandatory_activities(&log);
    let optional = optional_activities(&log);

    println!("✓ Valid event log");
    println!("  Cases: {}", log.case_count());
    println!("  Events: {}", log.event_count());
    println!("  Activities: {}", log.activity_names().len());
    println!("  Mandatory Activities: {}", mandatory.len());
    println!("  Optional Activities: {}", optional.len());
    println!("  Usable Dimensions: {}", dimension_list(&usable));

    let unusable: Vec<Dimension> = params
        .dimensions
        .iter()
        .filter(|d| !usable.contains(*d))
        .collect();
    if !unusable.is_empty() {
        println!("  Missing Columns For: {}", dimension_list(&DimensionSet::only(&unusable)));
    }

    Ok(())
}

fn dimension_list(dimensions: &DimensionSet) -> String {
    if dimensions.is_empty() {
        return "none".to_string();
    }
    dimensions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display version information
pub fn display_version() {
    println!("mddrt v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Multi-dimensional directly-rooted tree discovery for event logs.");
}
