//! Best contiguous drying window.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, TimeZone};
use serde::Serialize;

use crate::models::HourlyRecord;

/// A run of consecutive suitable hours, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DryingWindow {
    /// Start of the first suitable hour
    pub start: DateTime<FixedOffset>,
    /// Start of the last suitable hour
    pub end: DateTime<FixedOffset>,
    /// Number of hours covered
    pub hours: u32,
}

impl DryingWindow {
    pub fn contains(&self, timestamp: DateTime<FixedOffset>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Record the run `start..end` if it beats the current best.
fn close_run(start: usize, end: usize, best: &mut Option<(usize, usize)>) {
    let len = end - start;
    if best.is_none_or(|(_, best_len)| len > best_len) {
        *best = Some((start, len));
    }
}

/// Find the longest run of consecutive hours satisfying `is_suitable`.
///
/// `hours` must be sorted chronologically with unique timestamps. A run
/// ends at the first unsuitable hour or at a gap in the hourly sequence.
/// Ties go to the earliest run. The winning window's end is clamped to `end_hour` on its
/// start date. Returns `None` when no hour qualifies.
pub fn find_best_window<P>(
    hours: &[HourlyRecord],
    is_suitable: P,
    end_hour: u32,
) -> Option<DryingWindow>
where
    P: Fn(&HourlyRecord) -> bool,
{
    // (start index, length)
    let mut best: Option<(usize, usize)> = None;
    let mut run_start: Option<usize> = None;

    for (i, hour) in hours.iter().enumerate() {
        let follows_previous =
            i > 0 && hour.timestamp - hours[i - 1].timestamp == ChronoDuration::hours(1);

        if is_suitable(hour) {
            match run_start {
                Some(_) if follows_previous => {}
                Some(start) => {
                    close_run(start, i, &mut best);
                    run_start = Some(i);
                }
                None => run_start = Some(i),
            }
        } else if let Some(start) = run_start.take() {
            close_run(start, i, &mut best);
        }
    }

    // Handle run extending to the end of the data
    if let Some(start) = run_start {
        close_run(start, hours.len(), &mut best);
    }

    let (start_idx, len) = best?;
    let start = hours[start_idx].timestamp;
    let mut end = hours[start_idx + len - 1].timestamp;

    let limit = start
        .date_naive()
        .and_hms_opt(end_hour, 0, 0)
        .and_then(|naive| start.offset().from_local_datetime(&naive).single());
    if let Some(limit) = limit {
        if end > limit {
            end = limit.max(start);
        }
    }

    Some(DryingWindow {
        start,
        end,
        hours: (end - start).num_hours() as u32 + 1,
    })
}
