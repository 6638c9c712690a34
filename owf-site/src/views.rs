//! Localized views, all mounted under `/{lang}/`.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        request::Parts,
        Uri,
    },
    response::{IntoResponse, Redirect, Response},
};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use owf_schedule::{build_time_table, calendar, group_by_day, scheduled, Day, Speaker, Talk, Track};

use crate::error::SiteError;
use crate::i18n::{gettext, gettext_with};
use crate::photo::{self, PhotoError};
use crate::render::{page, ViewQuery};
use crate::store::Conference;
use crate::AppState;

const FEATURED_SPEAKERS: usize = 12;

/// The served language taken from the `lang` path segment.
pub struct Lang(pub String);

async fn path_params(parts: &mut Parts, state: &AppState) -> HashMap<String, String> {
    Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default()
}

#[async_trait]
impl FromRequestParts<AppState> for Lang {
    type Rejection = SiteError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let site = &state.conference.site;
        match path_params(parts, state).await.remove("lang") {
            Some(lang) if site.serves(&lang) => Ok(Lang(lang)),
            _ => Err(SiteError::not_found(site.default_language())),
        }
    }
}

/// A numeric path segment; anything else is a missing page, not a bad request.
pub struct Id(pub u32);

#[async_trait]
impl FromRequestParts<AppState> for Id {
    type Rejection = SiteError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let params = path_params(parts, state).await;
        let lang = params
            .get("lang")
            .filter(|lang| state.conference.site.serves(lang))
            .map_or(state.conference.site.default_language(), String::as_str);

        params
            .get("id")
            .or_else(|| params.get("day"))
            .and_then(|id| id.parse().ok())
            .map(Id)
            .ok_or_else(|| SiteError::not_found(lang))
    }
}

fn speakers_of<'a>(conference: &'a Conference, talk: &Talk) -> Vec<&'a Speaker> {
    talk.speakers
        .iter()
        .filter_map(|id| conference.speaker(*id))
        .collect()
}

fn talk_entry(conference: &Conference, talk: &Talk) -> Value {
    json!({
        "talk": talk,
        "track": conference.track_of(talk),
        "speakers": speakers_of(conference, talk),
    })
}

fn track_entry(conference: &Conference, track: &Track) -> Value {
    json!({
        "track": track,
        "room": conference.room_of(track),
    })
}

fn days_json<T>(days: &[Day<'_, T>], entry: impl Fn(&T) -> Value) -> Value {
    days.iter()
        .map(|day| {
            json!({
                "date": day.date,
                "items": day.items.iter().map(|item| entry(item)).collect::<Vec<_>>(),
            })
        })
        .collect()
}

fn program(
    conference: &Conference,
    lang: &str,
    title: &str,
    tracks: &[&Track],
    as_json: bool,
) -> Result<Response, SiteError> {
    let days = group_by_day(tracks)?;
    let days = days_json(&days, |track| track_entry(conference, track));
    page(lang, "program.html", title, json!({ "days": days }), as_json)
}

pub async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(&format!("/{}/", state.conference.site.default_language()))
}

pub async fn home(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let speakers = featured_speakers(state.conference.speakers());
    let site = &state.conference.site;

    let response = page(
        &lang,
        "index.html",
        &site.title,
        json!({ "speakers": speakers }),
        query.json,
    )?;
    Ok(([(CACHE_CONTROL, "no-store")], response).into_response())
}

/// A random sample of speakers, or none unless there are enough to fill the
/// home page.
fn featured_speakers(speakers: &[Speaker]) -> Vec<&Speaker> {
    if speakers.len() < FEATURED_SPEAKERS {
        return Vec::new();
    }

    speakers
        .choose_multiple(&mut rand::thread_rng(), FEATURED_SPEAKERS)
        .collect()
}

pub async fn program_view(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let tracks = conference.tracks_by_start(None);
    program(conference, &lang, gettext(&lang, "Program"), &tracks, query.json)
}

pub async fn tracks(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let theme = query
        .theme
        .as_deref()
        .filter(|theme| !theme.is_empty())
        .map(str::to_uppercase);

    let tracks = conference.tracks_by_start(theme.as_deref());
    let title = match &theme {
        Some(theme) => gettext_with(&lang, "Program for theme {theme}", &[("theme", theme.as_str())]),
        None => gettext(&lang, "Program").to_string(),
    };

    program(conference, &lang, &title, &tracks, query.json)
}

pub async fn talks(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let talks = conference.talks_by_start();
    let days = group_by_day(&talks)?;
    let days = days_json(&days, |talk| talk_entry(conference, talk));

    page(
        &lang,
        "talks.html",
        gettext(&lang, "Talks"),
        json!({ "days": days }),
        query.json,
    )
}

pub async fn rooms(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let rooms = state
        .conference
        .rooms_with_tracks()
        .into_iter()
        .map(|(room, tracks)| json!({ "room": room, "tracks": tracks }))
        .collect::<Vec<_>>();

    page(
        &lang,
        "rooms.html",
        gettext(&lang, "Rooms"),
        json!({ "rooms": rooms }),
        query.json,
    )
}

pub async fn room(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(id): Id,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let room = conference.room(id).ok_or_else(|| SiteError::not_found(&lang))?;

    let tracks = scheduled(conference.tracks_in(room));
    let title = gettext_with(&lang, "Program for room {room}", &[("room", room.name.as_str())]);
    program(conference, &lang, &title, &tracks, query.json)
}

pub async fn track(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(id): Id,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let track = conference.track(id).ok_or_else(|| SiteError::not_found(&lang))?;

    let talks = conference
        .talks_of(track)
        .into_iter()
        .map(|talk| talk_entry(conference, talk))
        .collect::<Vec<_>>();

    page(
        &lang,
        "track.html",
        &track.name,
        json!({
            "track": track,
            "room": conference.room_of(track),
            "talks": talks,
        }),
        query.json,
    )
}

pub async fn speakers(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    page(
        &lang,
        "speakers.html",
        gettext(&lang, "Speakers"),
        json!({ "speakers": state.conference.speakers_by_last_name() }),
        query.json,
    )
}

pub async fn speaker(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(id): Id,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let speaker = conference
        .speaker(id)
        .ok_or_else(|| SiteError::not_found(&lang))?;

    let talks = conference
        .talks_by(speaker)
        .into_iter()
        .map(|talk| talk_entry(conference, talk))
        .collect::<Vec<_>>();

    page(
        &lang,
        "speaker.html",
        &speaker.name(),
        json!({ "speaker": speaker, "talks": talks }),
        query.json,
    )
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    /// Thumbnail edge in pixels; zero serves the portrait as stored.
    s: Option<u32>,
}

/// A speaker's square thumbnail, or the silhouette when there is no portrait.
pub async fn speaker_photo(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(id): Id,
    Query(query): Query<PhotoQuery>,
) -> Result<Response, SiteError> {
    let size = query.s.unwrap_or(photo::DEFAULT_SIZE);
    if size > photo::MAX_SIZE {
        return Err(SiteError::PhotoSize { size });
    }

    let conference = &state.conference;
    let speaker = conference
        .speaker(id)
        .ok_or_else(|| SiteError::not_found(&lang))?;

    let Some(path) = conference.photo_of(speaker) else {
        return Ok(Redirect::to(photo::SILHOUETTE).into_response());
    };

    let jpeg = tokio::task::spawn_blocking(move || photo::load(&path, size))
        .await
        .map_err(PhotoError::from)??;
    Ok(([(CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}

pub async fn schedule_index(Lang(lang): Lang) -> Redirect {
    Redirect::to(&format!("/{lang}/schedule/1/"))
}

/// Day 1 lists the plenary track; later days show the room-by-slot grid.
pub async fn schedule(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(day): Id,
    Query(query): Query<ViewQuery>,
) -> Result<Response, SiteError> {
    if day == 0 {
        return Ok(Redirect::to(&format!("/{lang}/schedule/1/")).into_response());
    }

    let conference = &state.conference;
    let site = &conference.site;

    if day == 1 {
        let track = site
            .plenary_track
            .and_then(|id| conference.track(id))
            .ok_or_else(|| SiteError::not_found(&lang))?;

        let talks = conference
            .talks_of(track)
            .into_iter()
            .map(|talk| talk_entry(conference, talk))
            .collect::<Vec<_>>();

        return page(
            &lang,
            "day1.html",
            gettext(&lang, "Day 1 - Plenary session"),
            json!({ "day": day, "track": track, "talks": talks }),
            query.json,
        );
    }

    let date = site.date_of(day).ok_or_else(|| SiteError::not_found(&lang))?;
    let rooms = conference
        .rooms_by_capacity()
        .into_iter()
        .map(|room| conference.talks_for_room(room))
        .collect::<Vec<_>>();

    let time_table = build_time_table(
        &rooms,
        date.and_time(site.day_start),
        date.and_time(site.day_end),
        site.slot_width(),
    )?;
    debug!(
        day,
        rows = time_table.rows.len(),
        rooms = time_table.rooms.len(),
        "Built time table"
    );

    page(
        &lang,
        "day23.html",
        &gettext_with(&lang, "Day {day} - At a glance", &[("day", day.to_string().as_str())]),
        json!({ "day": day, "time_table": time_table }),
        query.json,
    )
}

fn ics_response(body: String) -> Response {
    ([(CONTENT_TYPE, "text/calendar")], body).into_response()
}

pub async fn schedule_ics(State(state): State<AppState>, Lang(_): Lang) -> Response {
    let conference = &state.conference;
    let site = &conference.site;

    let events = conference.talks_by_start().into_iter().filter_map(|talk| {
        let track = conference.track_of(talk)?;
        talk.to_ics(track, conference.room_of(track))
    });

    ics_response(calendar(&site.title, &site.timezone, events).to_string())
}

pub async fn track_ics(
    State(state): State<AppState>,
    Lang(lang): Lang,
    Id(id): Id,
) -> Result<Response, SiteError> {
    let conference = &state.conference;
    let track = conference.track(id).ok_or_else(|| SiteError::not_found(&lang))?;
    let room = conference.room_of(track);

    let events = conference
        .talks_of(track)
        .into_iter()
        .filter_map(|talk| talk.to_ics(track, room));

    Ok(ics_response(
        calendar(&track.name, &conference.site.timezone, events).to_string(),
    ))
}

/// Renders the 404 page in the language the path asks for, when served.
pub async fn fallback(State(state): State<AppState>, uri: Uri) -> SiteError {
    let site = &state.conference.site;
    let lang = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .filter(|lang| site.serves(lang))
        .unwrap_or(site.default_language());

    SiteError::not_found(lang)
}
