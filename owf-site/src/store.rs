//! The conference content store: rooms, tracks, talks and speakers loaded
//! once from a JSON document and queried read-only by the views.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use owf_schedule::{
    scheduled, Room, RoomId, RoomTalks, ScheduledTalk, Speaker, SpeakerId, Talk, Track, TrackId,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed conference data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    #[error("{kind} {id} refers to unknown {target} {target_id}")]
    DanglingReference {
        kind: &'static str,
        id: u32,
        target: &'static str,
        target_id: u32,
    },

    #[error("invalid site settings: {0}")]
    Settings(&'static str),
}

/// Site-wide settings carried in the `site` section of the data file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Site {
    pub title: String,
    /// Two-letter language codes served under `/{lang}/`; the first is the
    /// default.
    pub languages: Vec<String>,
    /// Calendar date of schedule day 1.
    pub first_day: NaiveDate,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub slot_minutes: i64,
    /// Track listed on day 1 instead of the time table.
    pub plenary_track: Option<TrackId>,
    pub timezone: String,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            title: "Open World Forum 2013".to_string(),
            languages: vec!["en".to_string(), "fr".to_string()],
            first_day: NaiveDate::from_ymd_opt(2013, 10, 3).unwrap_or_default(),
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
            slot_minutes: 60,
            plenary_track: None,
            timezone: "Europe/Paris".to_string(),
        }
    }
}

impl Site {
    pub fn default_language(&self) -> &str {
        self.languages.first().map_or("en", String::as_str)
    }

    pub fn serves(&self, lang: &str) -> bool {
        self.languages.iter().any(|served| served == lang)
    }

    pub fn slot_width(&self) -> Duration {
        Duration::minutes(self.slot_minutes)
    }

    /// Date of the given 1-based schedule day.
    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        let offset = u64::from(day.checked_sub(1)?);
        self.first_day.checked_add_days(chrono::Days::new(offset))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Document {
    #[serde(default)]
    site: Site,
    #[serde(default)]
    rooms: Vec<Room>,
    #[serde(default)]
    tracks: Vec<Track>,
    #[serde(default)]
    talks: Vec<Talk>,
    #[serde(default)]
    speakers: Vec<Speaker>,
}

#[derive(Debug, Clone)]
pub struct Conference {
    pub site: Site,
    /// Directory that relative photo paths resolve against.
    root: PathBuf,
    rooms: Vec<Room>,
    tracks: Vec<Track>,
    talks: Vec<Talk>,
    speakers: Vec<Speaker>,
}

fn unique_ids<I: IntoIterator<Item = u32>>(kind: &'static str, ids: I) -> Result<HashSet<u32>, LoadError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(LoadError::DuplicateId { kind, id });
        }
    }
    Ok(seen)
}

fn scheduled_first<'a>(talks: impl Iterator<Item = &'a Talk>) -> Vec<&'a Talk> {
    let mut talks = talks.collect::<Vec<_>>();
    talks.sort_by_key(|talk| (talk.starts_at.is_none(), talk.starts_at));
    talks
}

impl Conference {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut conference = Self::from_json(&json)?;
        if let Some(root) = path.parent() {
            conference.root = root.to_path_buf();
        }
        Ok(conference)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let document: Document = serde_json::from_str(json)?;
        let conference = Self {
            site: document.site,
            root: PathBuf::new(),
            rooms: document.rooms,
            tracks: document.tracks,
            talks: document.talks,
            speakers: document.speakers,
        };
        conference.validate()?;

        debug!(
            rooms = conference.rooms.len(),
            tracks = conference.tracks.len(),
            talks = conference.talks.len(),
            speakers = conference.speakers.len(),
            "Loaded conference"
        );
        Ok(conference)
    }

    fn validate(&self) -> Result<(), LoadError> {
        if !(1..=24 * 60).contains(&self.site.slot_minutes) {
            return Err(LoadError::Settings("slot_minutes must be between 1 and 1440"));
        }
        if self.site.languages.is_empty() {
            return Err(LoadError::Settings("at least one language is required"));
        }
        if let Some(lang) = self.site.languages.iter().find(|lang| lang.len() != 2) {
            debug!(lang = %lang, "Rejecting language code");
            return Err(LoadError::Settings("language codes must have two letters"));
        }

        let rooms = unique_ids("room", self.rooms.iter().map(|room| room.id))?;
        let tracks = unique_ids("track", self.tracks.iter().map(|track| track.id))?;
        unique_ids("talk", self.talks.iter().map(|talk| talk.id))?;
        let speakers = unique_ids("speaker", self.speakers.iter().map(|speaker| speaker.id))?;

        for track in &self.tracks {
            if let Some(room) = track.room.filter(|room| !rooms.contains(room)) {
                return Err(LoadError::DanglingReference {
                    kind: "track",
                    id: track.id,
                    target: "room",
                    target_id: room,
                });
            }
        }

        for talk in &self.talks {
            if !tracks.contains(&talk.track) {
                return Err(LoadError::DanglingReference {
                    kind: "talk",
                    id: talk.id,
                    target: "track",
                    target_id: talk.track,
                });
            }
            if let Some(&speaker) = talk.speakers.iter().find(|id| !speakers.contains(id)) {
                return Err(LoadError::DanglingReference {
                    kind: "talk",
                    id: talk.id,
                    target: "speaker",
                    target_id: speaker,
                });
            }
        }

        if let Some(plenary) = self.site.plenary_track.filter(|id| !tracks.contains(id)) {
            return Err(LoadError::DanglingReference {
                kind: "site",
                id: 0,
                target: "track",
                target_id: plenary,
            });
        }

        Ok(())
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    pub fn speaker(&self, id: SpeakerId) -> Option<&Speaker> {
        self.speakers.iter().find(|speaker| speaker.id == id)
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn track_of(&self, talk: &Talk) -> Option<&Track> {
        self.track(talk.track)
    }

    pub fn room_of(&self, track: &Track) -> Option<&Room> {
        track.room.and_then(|id| self.room(id))
    }

    /// Scheduled tracks by start time, optionally restricted to one theme.
    pub fn tracks_by_start(&self, theme: Option<&str>) -> Vec<&Track> {
        scheduled(self.tracks.iter().filter(|track| {
            theme.map_or(true, |theme| {
                track
                    .theme
                    .as_deref()
                    .is_some_and(|own| own.eq_ignore_ascii_case(theme))
            })
        }))
    }

    pub fn talks_by_start(&self) -> Vec<&Talk> {
        scheduled(&self.talks)
    }

    /// All talks of a track, scheduled ones first in start order.
    pub fn talks_of(&self, track: &Track) -> Vec<&Talk> {
        scheduled_first(self.talks.iter().filter(|talk| talk.track == track.id))
    }

    pub fn tracks_in(&self, room: &Room) -> Vec<&Track> {
        self.tracks
            .iter()
            .filter(|track| track.room == Some(room.id))
            .collect()
    }

    /// Rooms by descending capacity.
    pub fn rooms_by_capacity(&self) -> Vec<&Room> {
        let mut rooms = self.rooms.iter().collect::<Vec<_>>();
        rooms.sort_by(|a, b| b.capacity.cmp(&a.capacity));
        rooms
    }

    /// Rooms hosting at least one track, by descending capacity, each with
    /// its tracks by start time (unscheduled tracks first).
    pub fn rooms_with_tracks(&self) -> Vec<(&Room, Vec<&Track>)> {
        self.rooms_by_capacity()
            .into_iter()
            .filter_map(|room| {
                let mut tracks = self.tracks_in(room);
                tracks.sort_by_key(|track| track.starts_at);
                (!tracks.is_empty()).then_some((room, tracks))
            })
            .collect()
    }

    /// Scheduled talks of every track held in the room, by start time.
    pub fn talks_for_room<'a>(&'a self, room: &'a Room) -> RoomTalks<'a> {
        let tracks = self.tracks_in(room);
        let talks = scheduled(
            self.talks
                .iter()
                .filter(|talk| tracks.iter().any(|track| track.id == talk.track)),
        );

        RoomTalks {
            room,
            talks: talks
                .into_iter()
                .filter_map(|talk| {
                    let track = self.track_of(talk)?;
                    Some(ScheduledTalk { talk, track })
                })
                .collect(),
        }
    }

    pub fn speakers_by_last_name(&self) -> Vec<&Speaker> {
        let mut speakers = self.speakers.iter().collect::<Vec<_>>();
        speakers.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        speakers
    }

    /// All talks given by a speaker, ordered like [`Conference::talks_of`].
    pub fn talks_by(&self, speaker: &Speaker) -> Vec<&Talk> {
        scheduled_first(
            self.talks
                .iter()
                .filter(|talk| talk.speakers.contains(&speaker.id)),
        )
    }

    pub fn photo_of(&self, speaker: &Speaker) -> Option<PathBuf> {
        speaker.photo.as_ref().map(|photo| self.root.join(photo))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FIXTURE: &str = r#"{
        "site": { "plenary_track": 8, "languages": ["en", "fr"] },
        "rooms": [
            { "id": 1, "name": "Salon", "capacity": 50 },
            { "id": 2, "name": "Grand Amphi", "capacity": 400 },
            { "id": 3, "name": "Empty", "capacity": 20 }
        ],
        "tracks": [
            { "id": 8, "name": "Plenary", "theme": "THINK", "starts_at": "2013-10-03T09:00:00", "room": 2 },
            { "id": 10, "name": "Open Data", "theme": "THINK", "starts_at": "2013-10-04T09:00:00", "room": 2 },
            { "id": 11, "name": "Rust & Friends", "theme": "CODE", "starts_at": "2013-10-04T10:00:00", "room": 1 },
            { "id": 12, "name": "Unscheduled", "theme": "CODE", "room": 1 }
        ],
        "talks": [
            { "id": 1, "title": "Welcome", "track": 8, "starts_at": "2013-10-03T09:00:00", "speakers": [1] },
            { "id": 2, "title": "Keynote", "track": 8, "starts_at": "2013-10-03T09:30:00", "speakers": [2] },
            { "id": 3, "title": "Open data in cities", "track": 10, "starts_at": "2013-10-04T09:15:00", "ends_at": "2013-10-04T09:45:00", "speakers": [1] },
            { "id": 4, "title": "Data journalism", "track": 10, "starts_at": "2013-10-04T10:00:00" },
            { "id": 5, "title": "Ownership", "track": 11, "starts_at": "2013-10-04T10:30:00", "speakers": [2] },
            { "id": 6, "title": "TBD", "track": 12, "speakers": [2] }
        ],
        "speakers": [
            { "id": 1, "first_name": "Ada", "last_name": "Lovelace", "photo": "photos/ada.png" },
            { "id": 2, "first_name": "Grace", "last_name": "Hopper", "organisation": "Navy" }
        ]
    }"#;

    pub(crate) fn fixture() -> Conference {
        Conference::from_json(FIXTURE).unwrap()
    }

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> u32) -> Vec<u32> {
        items.iter().map(|item| id(item)).collect()
    }

    #[test]
    fn site_defaults_apply() {
        let conference = Conference::from_json(r#"{ "rooms": [] }"#).unwrap();
        assert_eq!(conference.site.slot_minutes, 60);
        assert_eq!(conference.site.default_language(), "en");
        assert_eq!(
            conference.site.date_of(2),
            NaiveDate::from_ymd_opt(2013, 10, 4)
        );
        assert_eq!(conference.site.date_of(0), None);
    }

    #[test]
    fn rejects_dangling_references() {
        let err = Conference::from_json(
            r#"{ "tracks": [ { "id": 1, "name": "Lost", "room": 9 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::DanglingReference { kind: "track", target: "room", target_id: 9, .. }
        ));

        let err = Conference::from_json(
            r#"{ "tracks": [ { "id": 1, "name": "T" } ], "talks": [ { "id": 1, "title": "x", "track": 1, "speakers": [3] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::DanglingReference { target: "speaker", target_id: 3, .. }
        ));
    }

    #[test]
    fn rejects_duplicates_and_bad_settings() {
        let err = Conference::from_json(
            r#"{ "rooms": [ { "id": 1, "name": "A", "capacity": 1 }, { "id": 1, "name": "B", "capacity": 2 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { kind: "room", id: 1 }));

        let err = Conference::from_json(r#"{ "site": { "slot_minutes": 0 } }"#).unwrap_err();
        assert!(matches!(err, LoadError::Settings(_)));

        let err = Conference::from_json(r#"{ "site": { "languages": ["eng"] } }"#).unwrap_err();
        assert!(matches!(err, LoadError::Settings(_)));
    }

    #[test]
    fn tracks_by_start_filters_theme() {
        let conference = fixture();
        assert_eq!(ids(&conference.tracks_by_start(None), |t| t.id), [8, 10, 11]);
        assert_eq!(ids(&conference.tracks_by_start(Some("code")), |t| t.id), [11]);
        assert!(conference.tracks_by_start(Some("EXPERIMENT")).is_empty());
    }

    #[test]
    fn rooms_with_tracks_by_capacity() {
        let conference = fixture();
        let rooms = conference.rooms_with_tracks();

        let summary = rooms
            .iter()
            .map(|(room, tracks)| (room.id, ids(tracks, |t| t.id)))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![(2, vec![8, 10]), (1, vec![12, 11])]);
    }

    #[test]
    fn talks_for_room_spans_its_tracks() {
        let conference = fixture();
        let room = conference.room(2).unwrap();
        let column = conference.talks_for_room(room);

        let talks = column
            .talks
            .iter()
            .map(|entry| (entry.talk.id, entry.track.id))
            .collect::<Vec<_>>();
        assert_eq!(talks, vec![(1, 8), (2, 8), (3, 10), (4, 10)]);
    }

    #[test]
    fn speaker_talks_list_unscheduled_last() {
        let conference = fixture();
        let speaker = conference.speaker(2).unwrap();
        assert_eq!(ids(&conference.talks_by(speaker), |t| t.id), [2, 5, 6]);
    }

    #[test]
    fn photos_resolve_against_the_data_directory() {
        let mut conference = fixture();
        assert_eq!(conference.photo_of(conference.speaker(2).unwrap()), None);
        assert_eq!(
            conference.photo_of(conference.speaker(1).unwrap()),
            Some(PathBuf::from("photos/ada.png"))
        );

        conference.root = PathBuf::from("/srv/owf");
        assert_eq!(
            conference.photo_of(conference.speaker(1).unwrap()),
            Some(PathBuf::from("/srv/owf/photos/ada.png"))
        );
    }

    #[test]
    fn talks_of_track_lists_unscheduled_last() {
        let conference = fixture();
        let track = conference.track(12).unwrap();
        assert_eq!(ids(&conference.talks_of(track), |t| t.id), [6]);

        let speaker = conference.speaker(1).unwrap();
        assert_eq!(ids(&conference.talks_by(speaker), |t| t.id), [1, 3]);

        let speakers = conference.speakers_by_last_name();
        assert_eq!(ids(&speakers, |s| s.id), [2, 1]);
    }
}
