//! Per-node statistics for the four measurement dimensions.
//!
//! Cost, rework and optionality share the numeric record; time carries its
//! own duration-valued record. Every record keeps
//! `remainder == total_case - accumulated` after each update.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent axis of aggregated measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Cost,
    Time,
    /// Repeated activities inside a case (process "quality")
    Rework,
    /// Activities beyond the mandatory set (process "flexibility")
    Optionality,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Cost,
        Dimension::Time,
        Dimension::Rework,
        Dimension::Optionality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Time => "time",
            Self::Rework => "rework",
            Self::Optionality => "optionality",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The dimensions enabled for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionSet {
    pub cost: bool,
    pub time: bool,
    pub rework: bool,
    pub optionality: bool,
}

impl Default for DimensionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl DimensionSet {
    pub fn all() -> Self {
        Self {
            cost: true,
            time: true,
            rework: true,
            optionality: true,
        }
    }

    pub fn none() -> Self {
        Self {
            cost: false,
            time: false,
            rework: false,
            optionality: false,
        }
    }

    pub fn only(dimensions: &[Dimension]) -> Self {
        let mut set = Self::none();
        for dimension in dimensions {
            set.set(*dimension, true);
        }
        set
    }

    pub fn contains(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Cost => self.cost,
            Dimension::Time => self.time,
            Dimension::Rework => self.rework,
            Dimension::Optionality => self.optionality,
        }
    }

    pub fn set(&mut self, dimension: Dimension, enabled: bool) {
        match dimension {
            Dimension::Cost => self.cost = enabled,
            Dimension::Time => self.time = enabled,
            Dimension::Rework => self.rework = enabled,
            Dimension::Optionality => self.optionality = enabled,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.cost || self.time || self.rework || self.optionality)
    }

    /// Enabled dimensions in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Dimension> + '_ {
        Dimension::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

/// Statistics of a numeric dimension (cost, rework, optionality)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericData {
    /// Sum of per-visit values folded at this node
    pub total: f64,
    /// Sum of the case-level totals of every visiting case
    pub total_case: f64,
    /// Sum of path-cumulative values up to and including this node
    pub accumulated: f64,
    /// `total_case - accumulated`
    pub remainder: f64,
    pub max: f64,
    pub min: f64,
}

impl Default for NumericData {
    fn default() -> Self {
        Self {
            total: 0.0,
            total_case: 0.0,
            accumulated: 0.0,
            remainder: 0.0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
        }
    }
}

impl NumericData {
    /// Fold one case visit into the record
    ///
    /// `extremum` is the value min/max are tracked against: the per-activity
    /// value for cost, the case-level scalar for rework and optionality.
    pub fn fold(&mut self, value: f64, case_total: f64, accumulated: f64, extremum: f64) {
        self.total += value;
        self.total_case += case_total;
        self.accumulated += accumulated;
        self.remainder = self.total_case - self.accumulated;
        self.max = self.max.max(extremum);
        self.min = self.min.min(extremum);
    }

    /// Recombine the records of a merged chain, first node first
    ///
    /// Case totals come from the first node, path-cumulative values from the
    /// last; totals and extrema are reduced over the whole chain.
    pub fn merge_chain(chain: &[&NumericData]) -> Option<NumericData> {
        let (first, last) = (chain.first()?, chain.last()?);
        let mut merged = NumericData {
            total: 0.0,
            total_case: first.total_case,
            accumulated: last.accumulated,
            remainder: last.remainder,
            ..NumericData::default()
        };
        for data in chain {
            merged.total += data.total;
            merged.max = merged.max.max(data.max);
            merged.min = merged.min.min(data.min);
        }
        Some(merged)
    }

    /// Root statistics derived from its direct children
    pub fn rollup<'a>(children: impl IntoIterator<Item = &'a NumericData>) -> NumericData {
        let mut root = NumericData::default();
        for child in children {
            root.total += child.total;
            root.total_case += child.total_case;
            root.max = root.max.max(child.max);
            root.min = root.min.min(child.min);
        }
        root.remainder = root.total_case - root.accumulated;
        root
    }

    pub fn remainder_holds(&self) -> bool {
        self.remainder == self.total_case - self.accumulated
    }

    /// Mean of `total` over the visits folded at this node
    pub fn mean(&self, frequency: u64) -> f64 {
        if frequency == 0 {
            0.0
        } else {
            self.total / frequency as f64
        }
    }
}

/// Statistics of the time dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeData {
    pub service: TimeDelta,
    pub waiting: TimeDelta,
    /// Sum of service + waiting per visit
    pub lead: TimeDelta,
    /// Sum of case durations of every visiting case
    pub lead_case: TimeDelta,
    /// Sum of lead-time prefix sums up to and including this node
    pub lead_accumulated: TimeDelta,
    /// `lead_case - lead_accumulated`
    pub lead_remainder: TimeDelta,
    /// Extrema of the per-visit service time
    pub max: TimeDelta,
    pub min: TimeDelta,
}

impl Default for TimeData {
    fn default() -> Self {
        Self {
            service: TimeDelta::zero(),
            waiting: TimeDelta::zero(),
            lead: TimeDelta::zero(),
            lead_case: TimeDelta::zero(),
            lead_accumulated: TimeDelta::zero(),
            lead_remainder: TimeDelta::zero(),
            max: TimeDelta::MIN,
            min: TimeDelta::MAX,
        }
    }
}

impl TimeData {
    /// Fold one case visit into the record
    pub fn fold(
        &mut self,
        service: TimeDelta,
        waiting: TimeDelta,
        case_duration: TimeDelta,
        lead_accumulated: TimeDelta,
    ) {
        self.service += service;
        self.waiting += waiting;
        self.lead += service + waiting;
        self.lead_case += case_duration;
        self.lead_accumulated += lead_accumulated;
        self.lead_remainder = self.lead_case - self.lead_accumulated;
        self.max = self.max.max(service);
        self.min = self.min.min(service);
    }

    /// Same boundary/sum recombination as [`NumericData::merge_chain`]
    pub fn merge_chain(chain: &[&TimeData]) -> Option<TimeData> {
        let (first, last) = (chain.first()?, chain.last()?);
        let mut merged = TimeData {
            lead_case: first.lead_case,
            lead_accumulated: last.lead_accumulated,
            lead_remainder: last.lead_remainder,
            ..TimeData::default()
        };
        for data in chain {
            merged.service += data.service;
            merged.waiting += data.waiting;
            merged.lead += data.lead;
            merged.max = merged.max.max(data.max);
            merged.min = merged.min.min(data.min);
        }
        Some(merged)
    }

    pub fn rollup<'a>(children: impl IntoIterator<Item = &'a TimeData>) -> TimeData {
        let mut root = TimeData::default();
        for child in children {
            root.service += child.service;
            root.waiting += child.waiting;
            root.lead += child.lead;
            root.lead_case += child.lead_case;
            root.max = root.max.max(child.max);
            root.min = root.min.min(child.min);
        }
        root.lead_remainder = root.lead_case - root.lead_accumulated;
        root
    }

    pub fn remainder_holds(&self) -> bool {
        self.lead_remainder == self.lead_case - self.lead_accumulated
    }
}

/// Borrowed view of one dimension's record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimensionData<'a> {
    Numeric(&'a NumericData),
    Time(&'a TimeData),
}

/// The records of every enabled dimension at one node
///
/// A field is `Some` exactly when its dimension is enabled for the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDimensions {
    pub cost: Option<NumericData>,
    pub time: Option<TimeData>,
    pub rework: Option<NumericData>,
    pub optionality: Option<NumericData>,
}

impl NodeDimensions {
    pub fn new(enabled: &DimensionSet) -> Self {
        Self {
            cost: enabled.cost.then(NumericData::default),
            time: enabled.time.then(TimeData::default),
            rework: enabled.rework.then(NumericData::default),
            optionality: enabled.optionality.then(NumericData::default),
        }
    }

    pub fn get(&self, dimension: Dimension) -> Option<DimensionData<'_>> {
        match dimension {
            Dimension::Time => self.time.as_ref().map(DimensionData::Time),
            numeric => self.numeric(numeric).map(DimensionData::Numeric),
        }
    }

    /// Record of a numeric dimension; `None` for time or when disabled
    pub fn numeric(&self, dimension: Dimension) -> Option<&NumericData> {
        match dimension {
            Dimension::Cost => self.cost.as_ref(),
            Dimension::Rework => self.rework.as_ref(),
            Dimension::Optionality => self.optionality.as_ref(),
            Dimension::Time => None,
        }
    }

    pub fn numeric_mut(&mut self, dimension: Dimension) -> Option<&mut NumericData> {
        match dimension {
            Dimension::Cost => self.cost.as_mut(),
            Dimension::Rework => self.rework.as_mut(),
            Dimension::Optionality => self.optionality.as_mut(),
            Dimension::Time => None,
        }
    }

    /// Whether every enabled record satisfies the remainder identity
    pub fn remainders_hold(&self) -> bool {
        [&self.cost, &self.rework, &self.optionality]
            .into_iter()
            .flatten()
            .all(NumericData::remainder_holds)
            && self.time.as_ref().map_or(true, TimeData::remainder_holds)
    }
}
