//! End-to-end discovery: event log in, tree out.

use super::builder::build_tree;
use super::compactor::compact_tree;
use super::node::Drt;
use crate::eventlog::EventLog;
use crate::metrics::{sequence_case, CaseMetricsResolver, CaseSequence};
use crate::utils::config::DrtParameters;
use crate::utils::error::{DataError, DrtError};
use log::{debug, info};

/// Discover the tree of a log
///
/// **Public** - main entry point of the library
///
/// # Arguments
/// * `log` - Event log, rows already sorted inside each case
/// * `params` - Column keys, enabled dimensions and grouping switch
///
/// # Returns
/// The finished tree; grouped when `params.group_activities` is set
///
/// # Errors
/// * `DrtError::Config` - invalid column keys
/// * `DrtError::Data` - empty log or case, missing per-activity values
pub fn discover_multi_dimensional_drt(log: &EventLog, params: &DrtParameters) -> Result<Drt, DrtError> {
    params.validate()?;
    if log.is_empty() {
        return Err(DataError::EmptyLog.into());
    }

    let dimensions = params.dimensions;
    info!(
        "Discovering tree for {} cases ({} events), dimensions: {}",
        log.case_count(),
        log.event_count(),
        dimensions
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    info!("Step 1/4: Resolving case metrics...");
    let metrics = CaseMetricsResolver::new(log, dimensions).resolve()?;

    info!("Step 2/4: Sequencing case activities...");
    let sequences = log
        .cases()
        .iter()
        .map(|case| sequence_case(case, &dimensions))
        .collect::<Result<Vec<CaseSequence>, _>>()?;

    info!("Step 3/4: Building tree...");
    let mut tree = build_tree(dimensions, sequences.iter().zip(metrics.iter()))?;
    debug!("Tree has {} nodes, max depth {}", tree.len(), tree.max_depth());

    if params.group_activities {
        info!("Step 4/4: Grouping non-branching chains...");
        let merged = compact_tree(&mut tree);
        debug!("Grouped tree has {} nodes after {} merges", tree.len(), merged);
    } else {
        info!("Step 4/4: Skipping grouping (not requested)");
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::Event;
    use crate::tree::{Dimension, DimensionSet};
    use crate::utils::error::ConfigError;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap()
    }

    fn chain_log() -> EventLog {
        EventLog::from_events(vec![
            Event::new("c1", "X", at(1)).with_start(at(0)).with_cost(10.0),
            Event::new("c1", "Y", at(3)).with_start(at(2)).with_cost(10.0),
            Event::new("c1", "Z", at(5)).with_start(at(4)).with_cost(10.0),
        ])
    }

    #[test]
    fn test_discover_without_grouping() {
        let tree = discover_multi_dimensional_drt(&chain_log(), &DrtParameters::new()).unwrap();
        assert!(!tree.is_grouped());
        assert_eq!(tree.len(), 4);
        assert!(tree.find_path(&["X", "Y", "Z"]).is_some());
    }

    #[test]
    fn test_discover_with_grouping() {
        let params = DrtParameters::new().with_grouping(true);
        let tree = discover_multi_dimensional_drt(&chain_log(), &params).unwrap();

        assert!(tree.is_grouped());
        assert_eq!(tree.len(), 2);
        let merged = tree.node(tree.find_path(&["From X to Z"]).unwrap());
        assert_eq!(merged.dimensions.cost.unwrap().total, 30.0);
    }

    #[test]
    fn test_empty_log_is_rejected() {
        let err = discover_multi_dimensional_drt(&EventLog::default(), &DrtParameters::new()).unwrap_err();
        assert!(matches!(err, DrtError::Data(DataError::EmptyLog)));
    }

    #[test]
    fn test_invalid_params_are_rejected_first() {
        let mut params = DrtParameters::new().with_dimensions(DimensionSet::only(&[Dimension::Cost]));
        params.columns.cost = String::new();
        let err = discover_multi_dimensional_drt(&EventLog::default(), &params).unwrap_err();
        assert!(matches!(err, DrtError::Config(ConfigError::EmptyColumnKey(_))));
    }
}
