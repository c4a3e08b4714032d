//! Manual pre-grouping of log activities.
//!
//! Within each case, one occurrence of every selected activity is merged into
//! a single row. Given `{A, B}` and the trace `A B C D B C A B`, the result is
//! `[A,B] C D [B,A] C B`: the trailing `B` stays alone because no third `A`
//! follows it.

use super::schema::{AttributeValue, Case, Event, EventLog};
use crate::utils::error::GroupingError;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Merge selected activity occurrences of every case
///
/// **Public** - main entry point for pre-grouping
///
/// # Errors
/// * `GroupingError::UnknownActivities` - a selected activity never occurs
/// * `GroupingError::UnsupportedType` - an attribute cannot be merged
/// * `GroupingError::TypeMismatch` - two rows disagree on an attribute type
pub fn group_log_activities(
    log: &EventLog,
    activities: &BTreeSet<String>,
) -> Result<EventLog, GroupingError> {
    validate_activities(log, activities)?;

    let cases = log
        .cases()
        .iter()
        .map(|case| group_case(case, activities))
        .collect::<Result<Vec<_>, _>>()?;

    let grouped = EventLog::from_cases(cases);
    debug!(
        "Pre-grouping reduced {} events to {}",
        log.event_count(),
        grouped.event_count()
    );
    Ok(grouped)
}

/// **Private** - internal validation
fn validate_activities(log: &EventLog, activities: &BTreeSet<String>) -> Result<(), GroupingError> {
    let known = log.activity_names();
    let unknown: Vec<String> = activities
        .iter()
        .filter(|a| !known.contains(a.as_str()))
        .cloned()
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(GroupingError::UnknownActivities(unknown))
    }
}

/// Group the rows of one case
///
/// **Private** - internal helper for group_log_activities
fn group_case(case: &Case, activities: &BTreeSet<String>) -> Result<Case, GroupingError> {
    let mut rows: Vec<Event> = Vec::with_capacity(case.len());
    let mut left: BTreeSet<&str> = activities.iter().map(String::as_str).collect();
    let mut open_group: Option<usize> = None;

    for event in &case.events {
        if left.is_empty() {
            left = activities.iter().map(String::as_str).collect();
        }

        if !left.contains(event.activity.as_str()) {
            rows.push(event.clone());
            continue;
        }

        match open_group {
            Some(slot) if left.len() < activities.len() => {
                rows[slot] = merge_events(&rows[slot], event)?;
            }
            _ => {
                open_group = Some(rows.len());
                rows.push(event.clone());
            }
        }
        left.remove(event.activity.as_str());
    }

    if !left.is_empty() && left.len() < activities.len() {
        warn!(
            "Case '{}' ends with an incomplete group (missing {:?})",
            case.id, left
        );
    }

    Ok(Case::new(case.id.clone(), rows))
}

/// Merge an incoming row into a group row
///
/// **Private** - internal merge rules
fn merge_events(base: &Event, incoming: &Event) -> Result<Event, GroupingError> {
    let start = match (base.start, incoming.start) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    let cost = match (base.cost, incoming.cost) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };

    let mut attributes: BTreeMap<String, AttributeValue> = base.attributes.clone();
    for (key, value) in &incoming.attributes {
        let merged = match attributes.get(key) {
            Some(existing) => merge_attribute(key, existing, value)?,
            None => {
                ensure_mergeable(key, value)?;
                value.clone()
            }
        };
        attributes.insert(key.clone(), merged);
    }
    for (key, value) in &base.attributes {
        if !incoming.attributes.contains_key(key) {
            ensure_mergeable(key, value)?;
        }
    }

    Ok(Event {
        case_id: base.case_id.clone(),
        activity: bracket_concat(&base.activity, &incoming.activity),
        complete: base.complete.max(incoming.complete),
        start,
        cost,
        attributes,
    })
}

/// **Private** - internal merge rules per attribute type
fn merge_attribute(
    key: &str,
    base: &AttributeValue,
    incoming: &AttributeValue,
) -> Result<AttributeValue, GroupingError> {
    ensure_mergeable(key, base)?;
    ensure_mergeable(key, incoming)?;

    match (base, incoming) {
        (AttributeValue::Number(a), AttributeValue::Number(b)) => Ok(AttributeValue::Number(a + b)),
        (AttributeValue::Text(a), AttributeValue::Text(b)) => {
            Ok(AttributeValue::Text(bracket_concat(a, b)))
        }
        (AttributeValue::Timestamp(a), AttributeValue::Timestamp(b)) => {
            Ok(AttributeValue::Timestamp(*a.min(b)))
        }
        (AttributeValue::Duration(a), AttributeValue::Duration(b)) => {
            Ok(AttributeValue::Duration(*a + *b))
        }
        _ => Err(GroupingError::TypeMismatch {
            attribute: key.to_string(),
            base: base.kind(),
            incoming: incoming.kind(),
        }),
    }
}

/// **Private** - flags and raw JSON have no merge rule
fn ensure_mergeable(key: &str, value: &AttributeValue) -> Result<(), GroupingError> {
    match value {
        AttributeValue::Flag(_) | AttributeValue::Other(_) => Err(GroupingError::UnsupportedType {
            attribute: key.to_string(),
            kind: value.kind(),
        }),
        _ => Ok(()),
    }
}

/// Concatenate text values as a bracketed list, extending an existing list
///
/// **Private** - internal utility
fn bracket_concat(base: &str, incoming: &str) -> String {
    if base.contains('[') || base.contains(']') {
        format!("{},{}]", base.replace(']', ""), incoming)
    } else {
        format!("[{},{}]", base, incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, minute, 0).unwrap()
    }

    fn event(activity: &str, minute: u32) -> Event {
        Event::new("c1", activity, at(minute + 1))
            .with_start(at(minute))
            .with_cost(10.0)
    }

    fn selected(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_groups_one_occurrence_per_activity() {
        let trace = ["A", "B", "C", "D", "B", "C", "A", "B"];
        let events: Vec<Event> = trace
            .iter()
            .enumerate()
            .map(|(i, name)| event(name, i as u32 * 2))
            .collect();
        let log = EventLog::from_events(events);

        let grouped = group_log_activities(&log, &selected(&["A", "B"])).unwrap();
        let names: Vec<&str> = grouped.cases()[0].activity_names().collect();

        assert_eq!(names, vec!["[A,B]", "C", "D", "[B,A]", "C", "B"]);
    }

    #[test]
    fn test_merge_rules() {
        let log = EventLog::from_events(vec![
            event("A", 0).with_attribute("units", AttributeValue::Number(2.0)),
            event("B", 10).with_attribute("units", AttributeValue::Number(3.0)),
        ]);

        let grouped = group_log_activities(&log, &selected(&["A", "B"])).unwrap();
        let merged = &grouped.cases()[0].events[0];

        assert_eq!(grouped.event_count(), 1);
        assert_eq!(merged.start, Some(at(0)));
        assert_eq!(merged.complete, at(11));
        assert_eq!(merged.cost, Some(20.0));
        assert_eq!(merged.attributes["units"], AttributeValue::Number(5.0));
    }

    #[test]
    fn test_three_way_name_list() {
        let log = EventLog::from_events(vec![event("A", 0), event("B", 2), event("C", 4)]);
        let grouped = group_log_activities(&log, &selected(&["A", "B", "C"])).unwrap();
        assert_eq!(grouped.cases()[0].events[0].activity, "[A,B,C]");
    }

    #[test]
    fn test_duration_and_text_attributes() {
        let log = EventLog::from_events(vec![
            event("A", 0)
                .with_attribute("wait", AttributeValue::Duration(TimeDelta::minutes(5)))
                .with_attribute("who", AttributeValue::Text("ana".into())),
            event("B", 2)
                .with_attribute("wait", AttributeValue::Duration(TimeDelta::minutes(7)))
                .with_attribute("who", AttributeValue::Text("bo".into())),
        ]);
        let grouped = group_log_activities(&log, &selected(&["A", "B"])).unwrap();
        let merged = &grouped.cases()[0].events[0];

        assert_eq!(merged.attributes["wait"], AttributeValue::Duration(TimeDelta::minutes(12)));
        assert_eq!(merged.attributes["who"], AttributeValue::Text("[ana,bo]".into()));
    }

    #[test]
    fn test_unknown_activity() {
        let log = EventLog::from_events(vec![event("A", 0)]);
        let err = group_log_activities(&log, &selected(&["A", "Z"])).unwrap_err();
        assert!(matches!(err, GroupingError::UnknownActivities(ref names) if names == &["Z".to_string()]));
    }

    #[test]
    fn test_unsupported_attribute_type() {
        let log = EventLog::from_events(vec![
            event("A", 0).with_attribute("urgent", AttributeValue::Flag(true)),
            event("B", 2).with_attribute("urgent", AttributeValue::Flag(false)),
        ]);
        let err = group_log_activities(&log, &selected(&["A", "B"])).unwrap_err();
        assert!(matches!(err, GroupingError::UnsupportedType { kind: "flag", .. }));
    }

    #[test]
    fn test_unsupported_attribute_on_either_side() {
        let base_only = EventLog::from_events(vec![
            event("A", 0).with_attribute("urgent", AttributeValue::Flag(true)),
            event("B", 2),
        ]);
        let incoming_only = EventLog::from_events(vec![
            event("A", 0),
            event("B", 2).with_attribute("extra", AttributeValue::Other(serde_json::json!([1, 2]))),
        ]);

        for log in [base_only, incoming_only] {
            let err = group_log_activities(&log, &selected(&["A", "B"])).unwrap_err();
            assert!(matches!(err, GroupingError::UnsupportedType { .. }));
        }
    }

    #[test]
    fn test_unsupported_attribute_outside_group_passes_through() {
        let log = EventLog::from_events(vec![
            event("A", 0),
            event("C", 1).with_attribute("urgent", AttributeValue::Flag(true)),
            event("B", 2),
        ]);
        let grouped = group_log_activities(&log, &selected(&["A", "B"])).unwrap();
        assert_eq!(grouped.cases()[0].activity_names().collect::<Vec<_>>(), vec!["[A,B]", "C"]);
    }

    #[test]
    fn test_mismatched_attribute_type() {
        let log = EventLog::from_events(vec![
            event("A", 0).with_attribute("x", AttributeValue::Number(1.0)),
            event("B", 2).with_attribute("x", AttributeValue::Text("one".into())),
        ]);
        let err = group_log_activities(&log, &selected(&["A", "B"])).unwrap_err();
        assert!(matches!(err, GroupingError::TypeMismatch { .. }));
    }

    #[test]
    fn test_group_state_resets_per_case() {
        let mut second = event("B", 0);
        second.case_id = "c2".to_string();
        let log = EventLog::from_events(vec![event("A", 0), second]);

        let grouped = group_log_activities(&log, &selected(&["A", "B"])).unwrap();
        assert_eq!(grouped.cases()[0].events[0].activity, "A");
        assert_eq!(grouped.cases()[1].events[0].activity, "B");
    }
}
