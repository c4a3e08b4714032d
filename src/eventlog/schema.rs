//! In-memory event log model.
//!
//! Rows are grouped into cases in first-appearance order. Row order inside a
//! case is taken as the true execution order; sorting is the caller's job.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A typed cell of a column the engine does not interpret itself
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    Flag(bool),
    Other(serde_json::Value),
}

impl AttributeValue {
    /// Short type name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
            Self::Flag(_) => "flag",
            Self::Other(_) => "json",
        }
    }
}

/// One row of the log
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub case_id: String,
    pub activity: String,

    /// Completion timestamp
    pub complete: DateTime<Utc>,

    pub start: Option<DateTime<Utc>>,

    pub cost: Option<f64>,

    /// Columns carried through untouched
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Event {
    pub fn new(case_id: impl Into<String>, activity: impl Into<String>, complete: DateTime<Utc>) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            complete,
            start: None,
            cost: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// The ordered events of one process instance
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: String,
    pub events: Vec<Event>,
}

impl Case {
    pub fn new(id: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            id: id.into(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Activity names in execution order
    pub fn activity_names(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.activity.as_str())
    }

    /// Distinct activity names of the case
    pub fn distinct_activities(&self) -> BTreeSet<&str> {
        self.activity_names().collect()
    }
}

/// A materialized event log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    cases: Vec<Case>,
}

impl EventLog {
    /// Group rows into cases, keeping first-appearance order of case ids
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut cases: Vec<Case> = Vec::new();

        for event in events {
            let slot = match index.get(&event.case_id) {
                Some(&slot) => slot,
                None => {
                    index.insert(event.case_id.clone(), cases.len());
                    cases.push(Case::new(event.case_id.clone(), Vec::new()));
                    cases.len() - 1
                }
            };
            cases[slot].events.push(event);
        }

        Self { cases }
    }

    pub fn from_cases(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn case(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn event_count(&self) -> usize {
        self.cases.iter().map(Case::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.event_count() == 0
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.cases.iter().flat_map(|c| c.events.iter())
    }

    /// Every activity name occurring in the log
    pub fn activity_names(&self) -> BTreeSet<&str> {
        self.events().map(|e| e.activity.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, minute, 0).unwrap()
    }

    #[test]
    fn test_from_events_groups_by_first_appearance() {
        let log = EventLog::from_events(vec![
            Event::new("2", "A", at(0)),
            Event::new("1", "A", at(1)),
            Event::new("2", "B", at(2)),
            Event::new("1", "C", at(3)),
        ]);

        assert_eq!(log.case_count(), 2);
        assert_eq!(log.cases()[0].id, "2");
        let names: Vec<&str> = log.cases()[0].activity_names().collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(log.event_count(), 4);
    }

    #[test]
    fn test_distinct_activities() {
        let case = Case::new(
            "1",
            vec![
                Event::new("1", "A", at(0)),
                Event::new("1", "B", at(1)),
                Event::new("1", "A", at(2)),
            ],
        );
        assert_eq!(case.distinct_activities().len(), 2);
    }

    #[test]
    fn test_attribute_kind() {
        assert_eq!(AttributeValue::Number(1.0).kind(), "number");
        assert_eq!(AttributeValue::Flag(true).kind(), "flag");
    }
}
