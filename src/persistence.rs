use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PersistError;

pub mod keys {
    pub const SCHEMA: &str = "challenge:schema";
    pub const PHASE: &str = "challenge:phase";
    pub const SIZE: &str = "challenge:size";
    pub const FLAVOR: &str = "challenge:flavor";
    pub const MOTD_TITLE: &str = "challenge:motdTitle";
    pub const MOTD_SUBTITLE: &str = "challenge:motdSubtitle";
    pub const NWB_X: &str = "challenge:nwbX";
    pub const NWB_Y: &str = "challenge:nwbY";
    pub const NWB_Z: &str = "challenge:nwbZ";
    pub const TEAM_DATA: &str = "challenge:teamData";
    pub const PLAYER_STATE: &str = "challenge:playerState";

    pub const ALL_WORLD: [&str; 11] = [
        SCHEMA,
        PHASE,
        SIZE,
        FLAVOR,
        MOTD_TITLE,
        MOTD_SUBTITLE,
        NWB_X,
        NWB_Y,
        NWB_Z,
        TEAM_DATA,
        PLAYER_STATE,
    ];

    pub const PLAYER_TEAM_ID: &str = "challenge:teamId";
    pub const PLAYER_VOTE_A: &str = "challenge:voteA";
    pub const PLAYER_VOTE_B: &str = "challenge:voteB";
    pub const PLAYER_ROLE: &str = "challenge:role";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSaveData {
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub s: i64,
    #[serde(default)]
    pub t: i64,
}

fn unassigned() -> i64 {
    -1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStateEntry {
    #[serde(default)]
    pub r: i64,
    #[serde(default = "unassigned")]
    pub t: i64,
    #[serde(default = "unassigned")]
    pub v: i64,
    #[serde(default = "unassigned")]
    pub x: i64,
}

impl Default for PlayerStateEntry {
    fn default() -> Self {
        Self {
            r: 0,
            t: -1,
            v: -1,
            x: -1,
        }
    }
}

pub fn encode_team_data(teams: &[TeamSaveData]) -> Result<String, PersistError> {
    Ok(serde_json::to_string(teams)?)
}

/// Decodes the team blob. Positions are kept: a malformed entry becomes a
/// default entry so later teams still line up with their index.
pub fn decode_team_data(text: &str) -> Result<Vec<TeamSaveData>, PersistError> {
    let raw: Vec<Value> = serde_json::from_str(text)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(team = index, %error, "ignoring malformed team entry");
                TeamSaveData::default()
            }
        })
        .collect())
}

/// Encodes player entries in the given order until the running size estimate
/// passes `budget`; the entry that crosses it and every later one are dropped.
/// Returns the blob and the number of dropped entries.
pub fn encode_player_state<'a>(
    entries: impl IntoIterator<Item = (&'a str, PlayerStateEntry)>,
    budget: usize,
) -> Result<(String, usize), PersistError> {
    let mut map = Map::new();
    let mut estimate = 2usize;
    let mut dropped = 0usize;
    for (name, entry) in entries {
        if dropped > 0 {
            dropped += 1;
            continue;
        }
        let value = serde_json::to_value(entry)?;
        estimate += name.len() + value.to_string().len() + 4;
        if estimate > budget {
            dropped += 1;
            continue;
        }
        map.insert(name.to_string(), value);
    }
    Ok((serde_json::to_string(&Value::Object(map))?, dropped))
}

pub fn decode_player_state(text: &str) -> Result<Vec<(String, PlayerStateEntry)>, PersistError> {
    let raw: Map<String, Value> = serde_json::from_str(text)?;
    let mut entries = Vec::with_capacity(raw.len());
    for (name, value) in raw {
        match serde_json::from_value::<PlayerStateEntry>(value) {
            Ok(entry) => entries.push((name, entry)),
            Err(error) => warn!(player = %name, %error, "ignoring malformed player entry"),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_blob_keeps_positions_for_malformed_entries() {
        let decoded =
            decode_team_data(r#"[{"n":"Red","s":10,"t":2},{"n":5},{"s":7}]"#).expect("decode");
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].n, "Red");
        assert_eq!(decoded[1], TeamSaveData::default());
        assert_eq!(decoded[2].s, 7);
        assert_eq!(decoded[2].n, "");
    }

    #[test]
    fn team_blob_rejects_non_arrays() {
        assert!(decode_team_data("{oops").is_err());
        assert!(decode_team_data(r#"{"n":"x"}"#).is_err());
    }

    #[test]
    fn player_entries_fill_missing_fields_with_unassigned() {
        let decoded = decode_player_state(r#"{"bob":{"r":1},"amy":{"r":"x"},"cal":{"t":3,"v":1}}"#)
            .expect("decode");
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, "bob");
        assert_eq!(decoded[0].1.t, -1);
        assert_eq!(decoded[1].0, "cal");
        assert_eq!(decoded[1].1.v, 1);
        assert_eq!(decoded[1].1.x, -1);
    }

    #[test]
    fn player_blob_drops_entries_past_the_budget() {
        let names: Vec<String> = (0..400).map(|idx| format!("player_{idx:04}")).collect();
        let entries = names.iter().map(|name| {
            (
                name.as_str(),
                PlayerStateEntry {
                    r: 1,
                    t: 3,
                    v: 2,
                    x: 1,
                },
            )
        });
        let (text, dropped) = encode_player_state(entries, 8192).expect("encode");
        assert!(dropped > 0);
        assert!(text.len() <= 8192);
        let decoded = decode_player_state(&text).expect("decode");
        assert_eq!(decoded.len() + dropped, 400);
        assert_eq!(decoded[0].0, "player_0000");
    }
}
