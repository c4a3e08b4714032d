//! Per-case activity sequences with derived per-activity values.
//!
//! For activity `i`: `service = complete - start`,
//! `waiting = start - complete(i-1)` (zero for the first activity) and
//! `lead = service + waiting`. Prefix sums of cost and lead time are
//! produced here once and consumed by the tree builder.

use crate::eventlog::Case;
use crate::tree::{Dimension, DimensionSet};
use crate::utils::error::DataError;
use chrono::TimeDelta;
use log::warn;

/// Per-activity cost with its prefix sums
#[derive(Debug, Clone, PartialEq)]
pub struct CostSeries {
    pub values: Vec<f64>,
    pub cumulative: Vec<f64>,
}

/// Per-activity timing with lead-time prefix sums
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub service: Vec<TimeDelta>,
    pub waiting: Vec<TimeDelta>,
    pub lead_cumulative: Vec<TimeDelta>,
}

impl TimeSeries {
    pub fn lead(&self, position: usize) -> TimeDelta {
        self.service[position] + self.waiting[position]
    }
}

/// The ordered activities of one case
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSequence {
    pub case_id: String,
    pub activities: Vec<String>,
    /// Present when the cost dimension is enabled
    pub cost: Option<CostSeries>,
    /// Present when the time dimension is enabled
    pub time: Option<TimeSeries>,
}

impl CaseSequence {
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Build the activity sequence of a case
///
/// Out-of-order timestamps give negative waiting (and possibly lead) times;
/// they are kept as-is and reported once per case.
///
/// # Errors
/// * `DataError::EmptyCase` - the case has no events
/// * `DataError::MissingActivityValue` - a cost or start timestamp is absent
///   while its dimension is enabled
pub fn sequence_case(case: &Case, dimensions: &DimensionSet) -> Result<CaseSequence, DataError> {
    if case.is_empty() {
        return Err(DataError::EmptyCase(case.id.clone()));
    }

    let activities: Vec<String> = case.events.iter().map(|e| e.activity.clone()).collect();

    let cost = if dimensions.cost {
        let values = case
            .events
            .iter()
            .map(|e| e.cost.ok_or_else(|| missing(case, &e.activity, Dimension::Cost)))
            .collect::<Result<Vec<f64>, _>>()?;
        let cumulative = prefix_sums(&values, 0.0);
        Some(CostSeries { values, cumulative })
    } else {
        None
    };

    let time = if dimensions.time {
        Some(time_series(case)?)
    } else {
        None
    };

    Ok(CaseSequence {
        case_id: case.id.clone(),
        activities,
        cost,
        time,
    })
}

/// **Private** - timing derivation for sequence_case
fn time_series(case: &Case) -> Result<TimeSeries, DataError> {
    let mut service = Vec::with_capacity(case.len());
    let mut waiting = Vec::with_capacity(case.len());
    let mut previous_complete = None;
    let mut negative_waits = 0usize;

    for event in &case.events {
        let start = event
            .start
            .ok_or_else(|| missing(case, &event.activity, Dimension::Time))?;
        let wait = match previous_complete {
            Some(prev) => start - prev,
            None => TimeDelta::zero(),
        };
        if wait < TimeDelta::zero() {
            negative_waits += 1;
        }

        service.push(event.complete - start);
        waiting.push(wait);
        previous_complete = Some(event.complete);
    }

    if negative_waits > 0 {
        warn!(
            "Case '{}' has {} activities starting before their predecessor completed; keeping negative waiting times",
            case.id, negative_waits
        );
    }

    let leads: Vec<TimeDelta> = service.iter().zip(&waiting).map(|(s, w)| *s + *w).collect();
    let lead_cumulative = prefix_sums(&leads, TimeDelta::zero());

    Ok(TimeSeries {
        service,
        waiting,
        lead_cumulative,
    })
}

fn missing(case: &Case, activity: &str, dimension: Dimension) -> DataError {
    DataError::MissingActivityValue {
        case_id: case.id.clone(),
        activity: activity.to_string(),
        dimension,
    }
}

/// Running totals of `values`
///
/// **Private** - internal utility
fn prefix_sums<T>(values: &[T], zero: T) -> Vec<T>
where
    T: Copy + std::ops::Add<Output = T>,
{
    values
        .iter()
        .scan(zero, |acc, v| {
            *acc = *acc + *v;
            Some(*acc)
        })
        .collect()
}

/// Share of a case-level scalar attributed to one position
///
/// Rework and optionality have no per-activity value: the case scalar is
/// spread evenly over the sequence.
pub fn even_share(case_scalar: f64, length: usize) -> f64 {
    case_scalar / length as f64
}

/// Cumulative even share up to and including `depth`
pub fn even_cumulative(case_scalar: f64, depth: usize, length: usize) -> f64 {
    case_scalar * (depth + 1) as f64 / length as f64
}
