//! Event log reader for JSON row records.
//!
//! Turns an array of JSON objects (one object per log row) into an
//! `EventLog`, using the caller-supplied column keys. The keys of the first
//! row act as the table header: a required column missing from it is a
//! configuration error, raised before any row is interpreted.

use super::schema::{AttributeValue, Event, EventLog};
use crate::tree::Dimension;
use crate::utils::config::{DrtParameters, NAIVE_TIMESTAMP_FORMATS};
use crate::utils::error::{ConfigError, DataError, DrtError};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load an event log from a JSON file holding an array of row objects
///
/// **Public** - main entry point for file-based logs
///
/// # Errors
/// * `DrtError::Io` - file cannot be opened
/// * `DrtError::Json` - file is not valid JSON
/// * `DrtError::Config` - a required column is missing
/// * `DrtError::Data` - a row holds a missing or malformed value
pub fn load_log(path: impl AsRef<Path>, params: &DrtParameters) -> Result<EventLog, DrtError> {
    let path = path.as_ref();
    info!("Reading event log from: {}", path.display());

    let file = File::open(path)?;
    let rows: Vec<Value> = serde_json::from_reader(BufReader::new(file))?;

    read_records(&rows, params)
}

/// Convert JSON row records into an event log
///
/// **Public** - used by `load_log` and by callers holding rows in memory
pub fn read_records(rows: &[Value], params: &DrtParameters) -> Result<EventLog, DrtError> {
    params.validate()?;

    let Some(first) = rows.first() else {
        return Err(DataError::EmptyLog.into());
    };
    let header = as_object(first)?;
    check_header(header, params)?;

    let mut events = Vec::with_capacity(rows.len());
    for (row, value) in rows.iter().enumerate() {
        events.push(parse_row(row, as_object(value)?, params)?);
    }

    let log = EventLog::from_events(events);
    debug!(
        "Read {} events across {} cases",
        log.event_count(),
        log.case_count()
    );
    Ok(log)
}

/// Verify that every column the enabled dimensions need is present
///
/// **Private** - internal validation
fn check_header(header: &Map<String, Value>, params: &DrtParameters) -> Result<(), ConfigError> {
    for (_, key) in params.columns.required() {
        if !header.contains_key(key) {
            return Err(ConfigError::MissingColumn {
                column: key.to_string(),
            });
        }
    }

    for dimension in params.dimensions.iter() {
        for key in params.columns.for_dimension(dimension) {
            if !header.contains_key(key) {
                return Err(ConfigError::MissingDimensionColumn {
                    column: key.clone(),
                    dimension,
                });
            }
        }
    }

    Ok(())
}

/// **Private** - internal helper for read_records
fn as_object(value: &Value) -> Result<&Map<String, Value>, DataError> {
    value
        .as_object()
        .ok_or_else(|| DataError::NotAnObject(value.to_string()))
}

/// Parse a single row into an event
///
/// **Private** - internal parsing logic
fn parse_row(row: usize, obj: &Map<String, Value>, params: &DrtParameters) -> Result<Event, DataError> {
    let columns = &params.columns;

    let case_id = required_text(row, obj, &columns.case_id)?;
    let activity = required_text(row, obj, &columns.activity)?;
    let complete = match present(obj, &columns.timestamp) {
        Some(value) => parse_timestamp(row, &columns.timestamp, value)?,
        None => return Err(missing(row, &columns.timestamp)),
    };

    let start = present(obj, &columns.start_timestamp)
        .map(|value| parse_timestamp(row, &columns.start_timestamp, value))
        .transpose()?;
    let cost = present(obj, &columns.cost)
        .map(|value| parse_number(row, &columns.cost, value))
        .transpose()?;

    let known = [
        columns.case_id.as_str(),
        columns.activity.as_str(),
        columns.timestamp.as_str(),
        columns.start_timestamp.as_str(),
        columns.cost.as_str(),
    ];
    let attributes: BTreeMap<String, AttributeValue> = obj
        .iter()
        .filter(|(key, value)| !known.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), attribute_from_json(value)))
        .collect();

    Ok(Event {
        case_id,
        activity,
        complete,
        start,
        cost,
        attributes,
    })
}

/// Non-null value of a column, if any
///
/// **Private** - internal utility
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn missing(row: usize, column: &str) -> DataError {
    DataError::MissingValue {
        row,
        column: column.to_string(),
    }
}

fn invalid(row: usize, column: &str, reason: impl Into<String>) -> DataError {
    DataError::InvalidValue {
        row,
        column: column.to_string(),
        reason: reason.into(),
    }
}

/// Case ids and activity names may be strings or numbers
///
/// **Private** - internal utility
fn required_text(row: usize, obj: &Map<String, Value>, key: &str) -> Result<String, DataError> {
    match present(obj, key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(invalid(row, key, format!("expected text, found {}", other))),
        None => Err(missing(row, key)),
    }
}

/// Parse a cost cell from a number or a numeric string
///
/// **Private** - internal utility
fn parse_number(row: usize, key: &str, value: &Value) -> Result<f64, DataError> {
    if let Some(n) = value.as_f64() {
        Ok(n)
    } else if let Some(s) = value.as_str() {
        s.trim()
            .parse::<f64>()
            .map_err(|e| invalid(row, key, format!("invalid number '{}': {}", s, e)))
    } else {
        Err(invalid(
            row,
            key,
            format!("expected number or string, found {}", value),
        ))
    }
}

/// Parse a timestamp cell
///
/// **Private** - internal utility
fn parse_timestamp(row: usize, key: &str, value: &Value) -> Result<DateTime<Utc>, DataError> {
    let Some(text) = value.as_str() else {
        return Err(invalid(
            row,
            key,
            format!("expected timestamp string, found {}", value),
        ));
    };
    parse_timestamp_str(text).ok_or_else(|| invalid(row, key, format!("unrecognized timestamp '{}'", text)))
}

/// Parse RFC 3339 or one of the accepted naive layouts (as UTC)
///
/// **Public** - shared with tests and callers building events by hand
pub fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Map an uninterpreted JSON cell to a typed attribute
///
/// **Private** - internal conversion
fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => AttributeValue::Number(f),
            None => AttributeValue::Other(value.clone()),
        },
        Value::String(s) => match parse_timestamp_str(s) {
            Some(ts) => AttributeValue::Timestamp(ts),
            None => AttributeValue::Text(s.clone()),
        },
        Value::Bool(b) => AttributeValue::Flag(*b),
        other => AttributeValue::Other(other.clone()),
    }
}

/// Whether a dimension can be computed from the columns of this log
///
/// **Public** - used by the validate command to report usable dimensions
pub fn dimension_available(rows: &[Value], params: &DrtParameters, dimension: Dimension) -> bool {
    rows.first()
        .and_then(Value::as_object)
        .map(|header| {
            params
                .columns
                .for_dimension(dimension)
                .iter()
                .all(|key| header.contains_key(key))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DimensionSet;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({
                "case:concept:name": "1",
                "concept:name": "A",
                "start_timestamp": "2024-01-01T08:00:00Z",
                "time:timestamp": "2024-01-01T08:10:00Z",
                "cost:total": 100,
                "org:resource": "ana"
            }),
            json!({
                "case:concept:name": 1,
                "concept:name": "B",
                "start_timestamp": "2024-01-01 08:15:00",
                "time:timestamp": "2024-01-01 08:30:00",
                "cost:total": "50.5",
                "org:resource": null
            }),
        ]
    }

    #[test]
    fn test_read_records() {
        let log = read_records(&rows(), &DrtParameters::new()).unwrap();

        assert_eq!(log.case_count(), 1);
        let case = &log.cases()[0];
        assert_eq!(case.len(), 2);
        assert_eq!(case.events[1].cost, Some(50.5));
        assert_eq!(
            case.events[0].attributes.get("org:resource"),
            Some(&AttributeValue::Text("ana".to_string()))
        );
        assert!(case.events[1].attributes.is_empty());
    }

    #[test]
    fn test_missing_cost_column_is_config_error() {
        let rows = vec![json!({
            "case:concept:name": "1",
            "concept:name": "A",
            "start_timestamp": "2024-01-01T08:00:00Z",
            "time:timestamp": "2024-01-01T08:10:00Z"
        })];

        let err = read_records(&rows, &DrtParameters::new()).unwrap_err();
        assert!(matches!(
            err,
            DrtError::Config(ConfigError::MissingDimensionColumn {
                dimension: Dimension::Cost,
                ..
            })
        ));

        let params = DrtParameters::new().with_dimensions(DimensionSet::only(&[Dimension::Time]));
        assert!(read_records(&rows, &params).is_ok());
    }

    #[test]
    fn test_missing_case_column_is_config_error() {
        let rows = vec![json!({"concept:name": "A", "time:timestamp": "2024-01-01T08:10:00Z"})];
        let err = read_records(&rows, &DrtParameters::new()).unwrap_err();
        assert!(matches!(err, DrtError::Config(ConfigError::MissingColumn { .. })));
    }

    #[test]
    fn test_bad_timestamp_is_data_error() {
        let mut rows = rows();
        rows[1]["time:timestamp"] = json!("yesterday");
        let err = read_records(&rows, &DrtParameters::new()).unwrap_err();
        assert!(matches!(
            err,
            DrtError::Data(DataError::InvalidValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_empty_records() {
        let err = read_records(&[], &DrtParameters::new()).unwrap_err();
        assert!(matches!(err, DrtError::Data(DataError::EmptyLog)));
    }

    #[test]
    fn test_parse_timestamp_str() {
        assert!(parse_timestamp_str("2024-03-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp_str("2024-03-01 10:00:00.250").is_some());
        assert!(parse_timestamp_str("2024-03-01 10:00").is_some());
        assert!(parse_timestamp_str("not a date").is_none());
    }

    #[test]
    fn test_load_log_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        serde_json::to_writer(&mut file, &rows()).unwrap();

        let log = load_log(file.path(), &DrtParameters::new()).unwrap();
        assert_eq!(log.event_count(), 2);
    }

    #[test]
    fn test_dimension_available() {
        let params = DrtParameters::new();
        assert!(dimension_available(&rows(), &params, Dimension::Cost));
        assert!(dimension_available(&rows(), &params, Dimension::Rework));
        assert!(!dimension_available(&[], &params, Dimension::Cost));
    }
}
