use chrono::NaiveDate;

/// Compute the canonical stream name for one (prefix, day, host, instance)
/// tuple.
///
/// Deterministic given its inputs; the calendar date is the rotation unit, so
/// the same process writes to a new stream after every day boundary.
pub fn stream_name(prefix: &str, date: NaiveDate, host: &str, instance: &str) -> String {
    format!("{}_{}_{}_{}", prefix, date.format("%Y-%m-%d"), host, instance)
}
