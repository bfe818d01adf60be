/// Inbound game-state snapshots.
///
/// The server pushes loosely structured JSON. Everything is decoded into an
/// all-optional wire schema first, then validated into the typed `Snapshot`
/// the rest of the viewer works with. Container fields that are absent (or
/// `null`) default to "no value" / empty; entity coordinates and identities
/// are required, and their absence fails the whole frame.

use serde::Deserialize;
use thiserror::Error;

// ── Decoded model ──

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub time_left: Option<i64>,
    pub players: Vec<Player>,
    pub track: Vec<TrackItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: Option<String>,
    pub car: i64,
    pub score: Option<i64>,
    pub x: i64,
    pub y: i64,
}

impl Player {
    /// Grid label and palette token for this player's vehicle.
    pub fn car_token(&self) -> String {
        format!("car-{}", self.car)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackItem {
    pub name: String,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{entity} #{index} is missing `{field}`")]
    MissingField {
        entity: &'static str,
        index: usize,
        field: &'static str,
    },
}

// ── Wire schema (everything optional) ──

#[derive(Deserialize, Debug, Default)]
struct WireMessage {
    #[serde(default)]
    payload: Option<WirePayload>,
}

#[derive(Deserialize, Debug, Default)]
struct WirePayload {
    #[serde(default)]
    timeleft: Option<i64>,
    #[serde(default)]
    players: Option<Vec<WirePlayer>>,
    #[serde(default)]
    track: Option<Vec<WireTrackItem>>,
}

#[derive(Deserialize, Debug)]
struct WirePlayer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    car: Option<i64>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    x: Option<i64>,
    #[serde(default)]
    y: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct WireTrackItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    x: Option<i64>,
    #[serde(default)]
    y: Option<i64>,
}

// ── Decoding ──

impl Snapshot {
    /// Decode one text frame from the stream.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let msg: WireMessage = serde_json::from_str(text)?;
        let payload = msg.payload.unwrap_or_default();

        let players = payload
            .players
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                Ok(Player {
                    car: required(p.car, "player", i, "car")?,
                    x: required(p.x, "player", i, "x")?,
                    y: required(p.y, "player", i, "y")?,
                    name: p.name,
                    score: p.score,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        let track = payload
            .track
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                Ok(TrackItem {
                    name: required(t.name, "track item", i, "name")?,
                    x: required(t.x, "track item", i, "x")?,
                    y: required(t.y, "track item", i, "y")?,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(Snapshot {
            time_left: payload.timeleft,
            players,
            track,
        })
    }
}

fn required<T>(
    value: Option<T>,
    entity: &'static str,
    index: usize,
    field: &'static str,
) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingField { entity, index, field })
}
