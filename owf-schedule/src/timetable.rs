use chrono::{Duration, NaiveDateTime};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{Room, ScheduleError, Talk, Track};

/// A talk together with the track it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTalk<'a> {
    pub talk: &'a Talk,
    pub track: &'a Track,
}

/// One time-table column: a room and every talk held in it, in start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTalks<'a> {
    pub room: &'a Room,
    pub talks: Vec<ScheduledTalk<'a>>,
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    #[must_use]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start <= time && time < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Cell<'a> {
    /// Set when a track opens in this slot, unset for its continuation.
    pub track: Option<&'a Track>,
    pub talks: Vec<&'a Talk>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Row<'a> {
    pub slot: Slot,
    /// One cell per room, in room order.
    pub cells: Vec<Cell<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TimeTable<'a> {
    pub rooms: Vec<&'a Room>,
    pub rows: Vec<Row<'a>>,
    /// Every track opening in some cell, room by room. Not deduplicated.
    pub tracks: Vec<&'a Track>,
}

fn slots(day_start: NaiveDateTime, day_end: NaiveDateTime, width: Duration) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut start = day_start;

    while start < day_end {
        let Some(end) = start.checked_add_signed(width) else {
            break;
        };
        slots.push(Slot { start, end });
        start = end;
    }

    slots
}

/// Lays out a day as rows of fixed-width slots by columns of rooms.
///
/// Each cell holds the room's talks starting within the slot. The cell is
/// tagged with a track only when one of those talks belongs to a track that
/// itself starts within the slot, so later slots of a running track stay
/// untagged. The last slot may run past `day_end`.
pub fn build_time_table<'a>(
    rooms: &[RoomTalks<'a>],
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
    slot_width: Duration,
) -> Result<TimeTable<'a>, ScheduleError> {
    if slot_width <= Duration::zero() {
        return Err(ScheduleError::InvalidSlotWidth {
            seconds: slot_width.num_seconds(),
        });
    }

    if let Some(unscheduled) = rooms
        .iter()
        .flat_map(|room| &room.talks)
        .find(|entry| entry.talk.starts_at.is_none())
    {
        return Err(ScheduleError::UnscheduledTalk {
            talk: unscheduled.talk.id,
        });
    }

    let slots = slots(day_start, day_end, slot_width);
    let mut tracks = Vec::new();
    let mut columns = Vec::with_capacity(rooms.len());

    for room in rooms {
        let mut column = Vec::with_capacity(slots.len());

        for slot in &slots {
            let in_slot = room
                .talks
                .iter()
                .filter(|entry| entry.talk.starts_at.is_some_and(|time| slot.contains(time)))
                .collect::<Vec<_>>();

            let track = in_slot
                .iter()
                .map(|entry| entry.track)
                .find(|track| track.starts_at.is_some_and(|time| slot.contains(time)));

            if let Some(track) = track {
                tracks.push(track);
            }

            column.push(Cell {
                track,
                talks: in_slot.iter().map(|entry| entry.talk).collect(),
            });
        }

        columns.push(column.into_iter());
    }

    let rows = slots
        .into_iter()
        .map(|slot| Row {
            slot,
            cells: columns.iter_mut().filter_map(Iterator::next).collect(),
        })
        .collect();

    Ok(TimeTable {
        rooms: rooms.iter().map(|column| column.room).collect(),
        rows,
        tracks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        format!("2013-10-04T{s}:00").parse().unwrap()
    }

    fn room(id: u32, capacity: u32) -> Room {
        Room {
            id,
            name: format!("Room {id}"),
            capacity,
        }
    }

    fn track(id: u32, room: u32, starts_at: &str) -> Track {
        Track {
            id,
            name: format!("Track {id}"),
            theme: Some("CODE".to_string()),
            starts_at: Some(at(starts_at)),
            room: Some(room),
            description: None,
        }
    }

    fn talk(id: u32, track: u32, starts_at: Option<&str>) -> Talk {
        Talk {
            id,
            title: format!("Talk {id}"),
            track,
            starts_at: starts_at.map(at),
            ends_at: None,
            speakers: Vec::new(),
            summary: None,
        }
    }

    fn cell_ids(cell: &Cell<'_>) -> (Option<u32>, Vec<u32>) {
        (
            cell.track.map(|track| track.id),
            cell.talks.iter().map(|talk| talk.id).collect(),
        )
    }

    #[test]
    fn two_rooms_two_slots() {
        let (a, b) = (room(1, 100), room(2, 50));
        let (x, y) = (track(10, 1, "09:00"), track(20, 2, "10:00"));
        let (t1, t2) = (talk(1, 10, Some("09:15")), talk(2, 20, Some("10:30")));

        let rooms = [
            RoomTalks {
                room: &a,
                talks: vec![ScheduledTalk { talk: &t1, track: &x }],
            },
            RoomTalks {
                room: &b,
                talks: vec![ScheduledTalk { talk: &t2, track: &y }],
            },
        ];

        let table =
            build_time_table(&rooms, at("09:00"), at("11:00"), Duration::minutes(60)).unwrap();

        assert_eq!(table.rows.len(), 2);
        let grid = table
            .rows
            .iter()
            .map(|row| row.cells.iter().map(cell_ids).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(
            grid,
            vec![
                vec![(Some(10), vec![1]), (None, vec![])],
                vec![(None, vec![]), (Some(20), vec![2])],
            ]
        );
        assert_eq!(table.tracks, vec![&x, &y]);
        assert_eq!(table.rooms, vec![&a, &b]);
        assert_eq!(table.rows[1].slot.start, at("10:00"));
    }

    #[test]
    fn grid_shape_ignores_talks() {
        let (a, b, c) = (room(1, 300), room(2, 200), room(3, 100));
        let rooms = [&a, &b, &c].map(|room| RoomTalks {
            room,
            talks: Vec::new(),
        });

        // 09:00 to 20:00 in hour slots, and a ragged 09:00 to 10:30.
        let full = build_time_table(&rooms, at("09:00"), at("20:00"), Duration::minutes(60)).unwrap();
        assert_eq!(full.rows.len(), 11);
        assert!(full.rows.iter().all(|row| row.cells.len() == 3));

        let ragged =
            build_time_table(&rooms, at("09:00"), at("10:30"), Duration::minutes(60)).unwrap();
        assert_eq!(ragged.rows.len(), 2);
        assert_eq!(ragged.rows[1].slot.end, at("11:00"));

        let empty = build_time_table(&rooms, at("10:00"), at("10:00"), Duration::minutes(60)).unwrap();
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn running_track_is_tagged_once() {
        let a = room(1, 100);
        let x = track(10, 1, "09:00");
        let talks = [
            talk(1, 10, Some("09:00")),
            talk(2, 10, Some("09:30")),
            talk(3, 10, Some("10:00")),
            talk(4, 10, Some("11:45")),
        ];

        let rooms = [RoomTalks {
            room: &a,
            talks: talks
                .iter()
                .map(|talk| ScheduledTalk { talk, track: &x })
                .collect(),
        }];

        let table =
            build_time_table(&rooms, at("09:00"), at("12:00"), Duration::minutes(60)).unwrap();
        let column = table
            .rows
            .iter()
            .map(|row| cell_ids(&row.cells[0]))
            .collect::<Vec<_>>();

        assert_eq!(
            column,
            vec![(Some(10), vec![1, 2]), (None, vec![3]), (None, vec![4])]
        );
        assert_eq!(table.tracks, vec![&x]);
    }

    #[test]
    fn track_starting_mid_slot_tagged_by_its_own_talks() {
        let a = room(1, 100);
        let (x, y) = (track(10, 1, "08:00"), track(20, 1, "09:30"));
        let (t1, t2) = (talk(1, 10, Some("09:00")), talk(2, 20, Some("09:30")));

        let rooms = [RoomTalks {
            room: &a,
            talks: vec![
                ScheduledTalk { talk: &t1, track: &x },
                ScheduledTalk { talk: &t2, track: &y },
            ],
        }];

        let table =
            build_time_table(&rooms, at("09:00"), at("10:00"), Duration::minutes(60)).unwrap();

        assert_eq!(cell_ids(&table.rows[0].cells[0]), (Some(20), vec![1, 2]));
    }

    #[test]
    fn tracks_list_keeps_duplicates() {
        let (a, b) = (room(1, 100), room(2, 50));
        // A track spread across two rooms opens in both columns.
        let x = track(10, 1, "09:00");
        let (t1, t2) = (talk(1, 10, Some("09:00")), talk(2, 10, Some("09:10")));

        let rooms = [
            RoomTalks {
                room: &a,
                talks: vec![ScheduledTalk { talk: &t1, track: &x }],
            },
            RoomTalks {
                room: &b,
                talks: vec![ScheduledTalk { talk: &t2, track: &x }],
            },
        ];

        let table =
            build_time_table(&rooms, at("09:00"), at("10:00"), Duration::minutes(60)).unwrap();
        assert_eq!(table.tracks, vec![&x, &x]);
    }

    #[test]
    fn talks_outside_the_day_are_dropped() {
        let a = room(1, 100);
        let x = track(10, 1, "08:00");
        let (early, late) = (talk(1, 10, Some("08:30")), talk(2, 10, Some("21:00")));

        let rooms = [RoomTalks {
            room: &a,
            talks: vec![
                ScheduledTalk { talk: &early, track: &x },
                ScheduledTalk { talk: &late, track: &x },
            ],
        }];

        let table =
            build_time_table(&rooms, at("09:00"), at("20:00"), Duration::minutes(60)).unwrap();
        assert!(table.rows.iter().all(|row| row.cells[0].talks.is_empty()));
        assert!(table.tracks.is_empty());
    }

    #[test]
    fn rejects_bad_input() {
        let a = room(1, 100);
        let x = track(10, 1, "09:00");
        let unscheduled = talk(7, 10, None);

        let rooms = [RoomTalks {
            room: &a,
            talks: vec![ScheduledTalk {
                talk: &unscheduled,
                track: &x,
            }],
        }];

        assert_eq!(
            build_time_table(&rooms, at("09:00"), at("10:00"), Duration::minutes(60)),
            Err(ScheduleError::UnscheduledTalk { talk: 7 })
        );
        assert_eq!(
            build_time_table(&[], at("09:00"), at("10:00"), Duration::zero()),
            Err(ScheduleError::InvalidSlotWidth { seconds: 0 })
        );
    }
}
