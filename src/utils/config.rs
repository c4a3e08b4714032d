//! Configuration and constants for tree discovery.

use crate::tree::{Dimension, DimensionSet};
use crate::utils::error::{ConfigError, DrtError};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Default column keys follow the XES attribute naming convention
pub const DEFAULT_CASE_ID_KEY: &str = "case:concept:name";
pub const DEFAULT_ACTIVITY_KEY: &str = "concept:name";
pub const DEFAULT_TIMESTAMP_KEY: &str = "time:timestamp";
pub const DEFAULT_START_TIMESTAMP_KEY: &str = "start_timestamp";
pub const DEFAULT_COST_KEY: &str = "cost:total";

/// Naive timestamp layouts accepted besides RFC 3339 (interpreted as UTC)
pub const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Prefix and separator of synthetic node names produced by compaction
pub const GROUPED_NODE_PREFIX: &str = "From";
pub const GROUPED_NODE_SEPARATOR: &str = "to";

/// Widest node label printed by the text summary
pub const SUMMARY_LABEL_WIDTH: usize = 48;

/// Column names used to read the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnKeys {
    pub case_id: String,
    pub activity: String,
    pub timestamp: String,
    pub start_timestamp: String,
    pub cost: String,
}

impl Default for ColumnKeys {
    fn default() -> Self {
        Self {
            case_id: DEFAULT_CASE_ID_KEY.to_string(),
            activity: DEFAULT_ACTIVITY_KEY.to_string(),
            timestamp: DEFAULT_TIMESTAMP_KEY.to_string(),
            start_timestamp: DEFAULT_START_TIMESTAMP_KEY.to_string(),
            cost: DEFAULT_COST_KEY.to_string(),
        }
    }
}

impl ColumnKeys {
    /// Columns every log must carry, with a human label for errors
    pub fn required(&self) -> [(&'static str, &str); 3] {
        [
            ("case id", self.case_id.as_str()),
            ("activity", self.activity.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]
    }

    /// Columns an enabled dimension depends on
    pub fn for_dimension(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Cost => std::slice::from_ref(&self.cost),
            Dimension::Time => std::slice::from_ref(&self.start_timestamp),
            Dimension::Rework | Dimension::Optionality => &[],
        }
    }
}

/// Parameters of one discovery run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrtParameters {
    pub columns: ColumnKeys,
    pub dimensions: DimensionSet,

    /// Collapse non-branching chains after the tree is built
    pub group_activities: bool,
}

impl DrtParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(mut self, dimensions: DimensionSet) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_columns(mut self, columns: ColumnKeys) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_grouping(mut self, group_activities: bool) -> Self {
        self.group_activities = group_activities;
        self
    }

    /// Reject column keys that can never match a column
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, key) in self.columns.required() {
            if key.is_empty() {
                return Err(ConfigError::EmptyColumnKey(label));
            }
        }
        if self.dimensions.contains(Dimension::Cost) && self.columns.cost.is_empty() {
            return Err(ConfigError::EmptyColumnKey("cost"));
        }
        if self.dimensions.contains(Dimension::Time) && self.columns.start_timestamp.is_empty() {
            return Err(ConfigError::EmptyColumnKey("start timestamp"));
        }
        Ok(())
    }

    /// Load parameters from a JSON file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DrtError> {
        let file = std::fs::File::open(path)?;
        let params: Self = serde_json::from_reader(file)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: DrtParameters = serde_json::from_str(
            r#"{"columns": {"cost": "Cost"}, "dimensions": {"time": false}, "group_activities": true}"#,
        )
        .unwrap();

        assert_eq!(params.columns.cost, "Cost");
        assert_eq!(params.columns.case_id, DEFAULT_CASE_ID_KEY);
        assert!(!params.dimensions.contains(Dimension::Time));
        assert!(params.dimensions.contains(Dimension::Cost));
        assert!(params.group_activities);
    }

    #[test]
    fn test_validate_empty_required_key() {
        let mut params = DrtParameters::new();
        params.columns.activity = String::new();
        assert!(matches!(
            params.validate(),
            Err(ConfigError::EmptyColumnKey("activity"))
        ));
    }

    #[test]
    fn test_validate_ignores_disabled_dimension_keys() {
        let mut params = DrtParameters::new().with_dimensions(DimensionSet::only(&[Dimension::Rework]));
        params.columns.cost = String::new();
        params.columns.start_timestamp = String::new();
        assert!(params.validate().is_ok());
    }
}
