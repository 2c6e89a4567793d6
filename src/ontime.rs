mod burst;
mod delta;

pub use burst::{day_runtimes, DayRuntime};
pub use delta::{capped_daily_on_hours, next_sample_on_minutes, next_sample_on_seconds};

use chrono::{DateTime, NaiveDate, Utc};

/// One classified sample: when it was taken and whether the machine read as
/// running at that instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePoint {
    pub timestamp: DateTime<Utc>,
    pub running: bool,
}

/// Sources do not guarantee ordering, so every integration entry point works
/// on its own sorted copy. The sort is stable; duplicate timestamps keep
/// their arrival order.
fn sorted(points: &[StatePoint]) -> Vec<StatePoint> {
    let mut points = points.to_vec();
    points.sort_by_key(|point| point.timestamp);
    points
}

fn span_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Splits sorted points into runs sharing a UTC calendar day.
fn day_slices(points: &[StatePoint]) -> Vec<(NaiveDate, &[StatePoint])> {
    let mut slices = Vec::new();
    let mut start = 0;
    while start < points.len() {
        let date = points[start].timestamp.date_naive();
        let mut end = start + 1;
        while end < points.len() && points[end].timestamp.date_naive() == date {
            end += 1;
        }
        slices.push((date, &points[start..end]));
        start = end;
    }
    slices
}
