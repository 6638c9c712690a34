use chrono::NaiveDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type RoomId = u32;
pub type TrackId = u32;
pub type TalkId = u32;
pub type SpeakerId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub theme: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub starts_at: Option<NaiveDateTime>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub room: Option<RoomId>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Talk {
    pub id: TalkId,
    pub title: String,
    pub track: TrackId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub starts_at: Option<NaiveDateTime>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub ends_at: Option<NaiveDateTime>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub speakers: Vec<SpeakerId>,
    #[cfg_attr(
        feature = "serde",
        serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")
    )]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Speaker {
    pub id: SpeakerId,
    pub first_name: String,
    pub last_name: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub organisation: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub bio: Option<String>,
    /// Portrait image, relative to the directory of the conference data.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub photo: Option<String>,
}

impl Speaker {
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Anything placed on the conference calendar, possibly not (yet) scheduled.
pub trait Scheduled {
    fn starts_at(&self) -> Option<NaiveDateTime>;
}

impl Scheduled for Talk {
    fn starts_at(&self) -> Option<NaiveDateTime> {
        self.starts_at
    }
}

impl Scheduled for Track {
    fn starts_at(&self) -> Option<NaiveDateTime> {
        self.starts_at
    }
}

impl<T: Scheduled + ?Sized> Scheduled for &T {
    fn starts_at(&self) -> Option<NaiveDateTime> {
        (**self).starts_at()
    }
}
