//! Read-only conference schedule records and the grouping used to lay them
//! out: day-by-day listings and the per-room "at a glance" time table.

mod error;
mod grouping;
mod structs;
mod timetable;

#[cfg(feature = "ics")]
mod ics;

pub use error::ScheduleError;
pub use grouping::{group_by_day, scheduled, Day};
pub use structs::{Room, RoomId, Scheduled, Speaker, SpeakerId, Talk, TalkId, Track, TrackId};
pub use timetable::{build_time_table, Cell, RoomTalks, Row, ScheduledTalk, Slot, TimeTable};

#[cfg(feature = "ics")]
pub use crate::ics::calendar;
