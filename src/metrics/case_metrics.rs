//! Case-level scalar metrics.
//!
//! Per case: duration, total cost, rework count and optionality count.
//! Optionality needs the mandatory-activity set of the whole log, which is
//! computed once per resolver and reused for every case.

use crate::eventlog::{Case, EventLog};
use crate::tree::{Dimension, DimensionSet};
use crate::utils::error::DataError;
use chrono::TimeDelta;
use log::debug;
use std::collections::BTreeSet;

/// Scalar metrics of one case
///
/// A field is `Some` exactly when its dimension is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseMetrics {
    pub case_id: String,
    /// Last completion minus first start
    pub duration: Option<TimeDelta>,
    pub cost: Option<f64>,
    /// Events minus distinct activities
    pub rework: Option<u64>,
    /// Distinct activities minus the size of the mandatory set
    pub optionality: Option<i64>,
    pub unique_activities: usize,
    pub total_activities: usize,
}

impl CaseMetrics {
    /// Case-level scalar of a numeric dimension
    pub fn numeric(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Cost => self.cost,
            Dimension::Rework => self.rework.map(|r| r as f64),
            Dimension::Optionality => self.optionality.map(|o| o as f64),
            Dimension::Time => None,
        }
    }
}

/// Activities present in every case of the log
///
/// **Public** - exposed for callers that pre-compute the set
pub fn mandatory_activities(log: &EventLog) -> BTreeSet<String> {
    let mut cases = log.cases().iter();
    let Some(first) = cases.next() else {
        return BTreeSet::new();
    };

    let mut mandatory: BTreeSet<&str> = first.distinct_activities();
    for case in cases {
        let activities = case.distinct_activities();
        mandatory.retain(|a| activities.contains(a));
        if mandatory.is_empty() {
            break;
        }
    }

    mandatory.into_iter().map(str::to_string).collect()
}

/// Activities of the log that some case skips
pub fn optional_activities(log: &EventLog) -> BTreeSet<String> {
    let mandatory = mandatory_activities(log);
    log.activity_names()
        .into_iter()
        .filter(|a| !mandatory.contains(*a))
        .map(str::to_string)
        .collect()
}

/// Resolves case metrics for a whole log
#[derive(Debug)]
pub struct CaseMetricsResolver<'a> {
    log: &'a EventLog,
    dimensions: DimensionSet,
    mandatory: Option<BTreeSet<String>>,
}

impl<'a> CaseMetricsResolver<'a> {
    pub fn new(log: &'a EventLog, dimensions: DimensionSet) -> Self {
        Self {
            log,
            dimensions,
            mandatory: None,
        }
    }

    /// Use a pre-computed mandatory-activity set instead of deriving it
    pub fn with_mandatory_activities(mut self, mandatory: BTreeSet<String>) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    /// Mandatory-activity set, computed on first use
    pub fn mandatory_activities(&mut self) -> &BTreeSet<String> {
        let log = self.log;
        self.mandatory.get_or_insert_with(|| {
            let set = mandatory_activities(log);
            debug!("Log has {} mandatory activities", set.len());
            set
        })
    }

    /// Metrics of every case, in log order
    ///
    /// # Errors
    /// * `DataError::EmptyLog` - the log has no cases
    /// * `DataError::EmptyCase` - a case has no events
    /// * `DataError::MissingActivityValue` - cost or start timestamp absent
    ///   while its dimension is enabled
    pub fn resolve(&mut self) -> Result<Vec<CaseMetrics>, DataError> {
        if self.log.case_count() == 0 {
            return Err(DataError::EmptyLog);
        }

        let mandatory_count = if self.dimensions.optionality {
            Some(self.mandatory_activities().len())
        } else {
            None
        };

        let log = self.log;
        log.cases()
            .iter()
            .map(|case| self.resolve_case(case, mandatory_count))
            .collect()
    }

    /// **Private** - per-case computation
    fn resolve_case(&self, case: &Case, mandatory_count: Option<usize>) -> Result<CaseMetrics, DataError> {
        let (Some(first), Some(last)) = (case.events.first(), case.events.last()) else {
            return Err(DataError::EmptyCase(case.id.clone()));
        };

        let duration = if self.dimensions.time {
            let start = first.start.ok_or_else(|| DataError::MissingActivityValue {
                case_id: case.id.clone(),
                activity: first.activity.clone(),
                dimension: Dimension::Time,
            })?;
            Some(last.complete - start)
        } else {
            None
        };

        let cost = if self.dimensions.cost {
            let mut total = 0.0;
            for event in &case.events {
                total += event.cost.ok_or_else(|| DataError::MissingActivityValue {
                    case_id: case.id.clone(),
                    activity: event.activity.clone(),
                    dimension: Dimension::Cost,
                })?;
            }
            Some(total)
        } else {
            None
        };

        let unique_activities = case.distinct_activities().len();
        let total_activities = case.len();

        Ok(CaseMetrics {
            case_id: case.id.clone(),
            duration,
            cost,
            rework: self
                .dimensions
                .rework
                .then(|| (total_activities - unique_activities) as u64),
            optionality: mandatory_count.map(|m| unique_activities as i64 - m as i64),
            unique_activities,
            total_activities,
        })
    }
}
