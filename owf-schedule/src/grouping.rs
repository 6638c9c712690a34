use chrono::{NaiveDate, NaiveDateTime};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{Scheduled, ScheduleError};

/// A calendar date and the items starting on it, in start order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Day<'a, T> {
    pub date: NaiveDate,
    pub items: Vec<&'a T>,
}

/// Drops unscheduled items and stable-sorts the rest by start time.
pub fn scheduled<'a, T, I>(items: I) -> Vec<&'a T>
where
    T: Scheduled + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut items = items
        .into_iter()
        .filter(|item| item.starts_at().is_some())
        .collect::<Vec<_>>();

    items.sort_by_key(|item| item.starts_at());
    items
}

/// Splits start-ordered items into runs sharing a calendar date.
///
/// Items must all be scheduled and sorted, as [`scheduled`] leaves them.
/// Anything else is rejected rather than grouped into a misleading listing.
pub fn group_by_day<'a, T: Scheduled>(items: &[&'a T]) -> Result<Vec<Day<'a, T>>, ScheduleError> {
    let mut days: Vec<Day<'a, T>> = Vec::new();
    let mut previous: Option<NaiveDateTime> = None;

    for (index, &item) in items.iter().enumerate() {
        let starts_at = item
            .starts_at()
            .ok_or(ScheduleError::Unscheduled { index })?;

        if previous.is_some_and(|previous| starts_at < previous) {
            return Err(ScheduleError::Unsorted { index });
        }
        previous = Some(starts_at);

        let date = starts_at.date();
        match days.last_mut() {
            Some(day) if day.date == date => day.items.push(item),
            _ => days.push(Day {
                date,
                items: vec![item],
            }),
        }
    }

    Ok(days)
}
