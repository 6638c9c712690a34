use chrono::NaiveDateTime;
use ics::{
    properties::{Categories, Description, DtEnd, DtStart, Location, RRule, Summary, TzName},
    Daylight, ICalendar, Standard, TimeZone,
};

use crate::{Room, Talk, Track};

fn ics_time(time: NaiveDateTime) -> String {
    time.format("%Y%m%dT%H%M%S").to_string()
}

/// Builds a calendar carrying the central european time zone definition
/// under `tzid`, plus the given events.
pub fn calendar<'a, I>(name: &'a str, tzid: &'a str, events: I) -> ICalendar<'a>
where
    I: IntoIterator<Item = ics::Event<'a>>,
{
    let mut cet_standard = Standard::new("19701025T030000", "+0200", "+0100");
    cet_standard.push(TzName::new("CET"));
    cet_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"));

    let mut cest_daylight = Daylight::new("19700329T020000", "+0100", "+0200");
    cest_daylight.push(TzName::new("CEST"));
    cest_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"));

    let mut timezone = TimeZone::daylight(tzid, cest_daylight);
    timezone.add_standard(cet_standard);

    let mut icalendar = ICalendar::new("2.0", name);
    icalendar.add_timezone(timezone);

    for event in events {
        icalendar.add_event(event);
    }

    icalendar
}

impl Talk {
    /// Returns `None` for talks without a start time.
    #[must_use]
    pub fn to_ics<'a>(&'a self, track: &'a Track, room: Option<&'a Room>) -> Option<ics::Event<'a>> {
        let start = ics_time(self.starts_at?);
        let id = format!("owf-talk-{}", self.id);

        let mut ics_event = ics::Event::new(id, start.clone());

        ics_event.push(DtStart::new(start));
        if let Some(ends_at) = self.ends_at {
            ics_event.push(DtEnd::new(ics_time(ends_at)));
        }
        ics_event.push(Summary::new(&self.title));
        ics_event.push(Description::new(&track.name));

        if let Some(theme) = &track.theme {
            ics_event.push(Categories::new(theme));
        }

        if let Some(room) = room {
            ics_event.push(Location::new(&room.name));
        }

        Some(ics_event)
    }
}
