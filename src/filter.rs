use chrono::{Duration, NaiveDate};
use log::warn;

use crate::portal::models::Course;

/// Default age of the certificates to download, in days
pub const DEFAULT_DAYS: i64 = 7;

/// Keep the courses absolved in the last `days` days, `today - days` included
///
/// A window reaching past the calendar's range keeps every dated course.
pub fn recent(courses: &[Course], today: NaiveDate, days: i64) -> Vec<(NaiveDate, &Course)> {
    let since = Duration::try_days(days)
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);

    courses
        .iter()
        .filter_map(|course| match course.absolved_date() {
            Ok(Some(date)) => Some((date, course)),
            Ok(None) => {
                warn!("No completion date for {}, skipped", course.name);
                None
            }
            Err(e) => {
                warn!("{e}, {} skipped", course.name);
                None
            }
        })
        .filter(|(date, _)| *date >= since)
        .collect()
}
