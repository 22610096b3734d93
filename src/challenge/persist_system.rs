use super::*;

use tracing::warn;

use crate::constants::{PERSIST_SCHEMA_VERSION, PLAYER_STATE_BYTE_BUDGET};
use crate::host::PropertyValue;
use crate::persistence::{
    decode_player_state, decode_team_data, encode_player_state, encode_team_data, keys,
    PlayerStateEntry, TeamSaveData,
};

impl Challenge {
    pub fn save(&self, host: &mut impl Host) {
        host.set_world_property(keys::SCHEMA, PropertyValue::from(PERSIST_SCHEMA_VERSION as i64));
        host.set_world_property(keys::PHASE, PropertyValue::from(self.phase.code() as i64));
        host.set_world_property(keys::SIZE, PropertyValue::from(self.size.team_count() as i64));
        host.set_world_property(keys::FLAVOR, PropertyValue::from(self.flavor.code() as i64));
        host.set_world_property(keys::MOTD_TITLE, PropertyValue::from(self.motd_title.as_str()));
        host.set_world_property(
            keys::MOTD_SUBTITLE,
            PropertyValue::from(self.motd_subtitle.as_str()),
        );
        if let Some(nwb) = self.nwb {
            host.set_world_property(keys::NWB_X, PropertyValue::from(nwb.x as i64));
            host.set_world_property(keys::NWB_Y, PropertyValue::from(nwb.y as i64));
            host.set_world_property(keys::NWB_Z, PropertyValue::from(nwb.z as i64));
        }

        let mut team_data: Vec<TeamSaveData> = self.teams.iter().map(Team::save_data).collect();
        // Entries past the current board stay stored for a later size increase.
        team_data.extend(self.stored_team_data(host).into_iter().skip(self.teams.len()));
        match encode_team_data(&team_data) {
            Ok(blob) => host.set_world_property(keys::TEAM_DATA, PropertyValue::from(blob)),
            Err(error) => warn!(%error, "failed to encode team data"),
        }

        let entries: Vec<(String, PlayerStateEntry)> = self
            .players
            .iter()
            .map(|player| (player.key(), player.to_state_entry()))
            .collect();
        match encode_player_state(
            entries.iter().map(|(key, entry)| (key.as_str(), *entry)),
            PLAYER_STATE_BYTE_BUDGET,
        ) {
            Ok((blob, dropped)) => {
                if dropped > 0 {
                    warn!(
                        dropped,
                        budget = PLAYER_STATE_BYTE_BUDGET,
                        "player state over budget; later players not saved"
                    );
                }
                host.set_world_property(keys::PLAYER_STATE, PropertyValue::from(blob));
            }
            Err(error) => warn!(%error, "failed to encode player state"),
        }

        for player in self.players.iter().filter(|player| player.connected) {
            if let Err(error) = player.save_to_host(host) {
                debug!(player = %player.name, %error, "skipping player-scoped save");
            }
        }
    }

    fn stored_team_data(&self, host: &impl Host) -> Vec<TeamSaveData> {
        let Some(blob) = text_property(host, keys::TEAM_DATA) else {
            return Vec::new();
        };
        decode_team_data(&blob).unwrap_or_default()
    }

    pub(crate) fn load_session(&mut self, host: &impl Host) -> bool {
        if let Some(version) = number_property(host, keys::SCHEMA) {
            if version != PERSIST_SCHEMA_VERSION as i64 {
                warn!(
                    stored = version,
                    supported = PERSIST_SCHEMA_VERSION,
                    "unsupported persisted schema; starting from defaults"
                );
                return false;
            }
        }

        if let Some(code) = number_property(host, keys::PHASE) {
            match Phase::from_code(code) {
                Some(phase) => self.phase = phase,
                None => warn!(code, "ignoring unknown stored phase"),
            }
        }
        if let Some(count) = number_property(host, keys::SIZE) {
            match BoardSize::from_team_count(count) {
                Some(size) => self.size = size,
                None => warn!(count, "ignoring unknown stored board size"),
            }
        }
        if let Some(code) = number_property(host, keys::FLAVOR) {
            match Flavor::from_code(code) {
                Some(flavor) => self.flavor = flavor,
                None => warn!(code, "ignoring unknown stored flavor"),
            }
        }
        if let Some(title) = text_property(host, keys::MOTD_TITLE) {
            self.motd_title = title;
        }
        if let Some(subtitle) = text_property(host, keys::MOTD_SUBTITLE) {
            self.motd_subtitle = subtitle;
        }
        let x = number_property(host, keys::NWB_X);
        let y = number_property(host, keys::NWB_Y);
        let z = number_property(host, keys::NWB_Z);
        if let (Some(x), Some(y), Some(z)) = (x, y, z) {
            self.nwb = Some(BlockPos::new(x as i32, y as i32, z as i32));
        }
        true
    }

    pub(crate) fn load_teams(&mut self, host: &impl Host, from_index: usize) {
        let Some(blob) = text_property(host, keys::TEAM_DATA) else {
            return;
        };
        let data = match decode_team_data(&blob) {
            Ok(data) => data,
            Err(error) => {
                warn!(%error, "ignoring unreadable team data");
                return;
            }
        };
        for (team, entry) in self.teams.iter_mut().zip(data.iter()).skip(from_index) {
            team.load_from_data(entry);
        }
    }

    pub(crate) fn load_player_state(&mut self, host: &impl Host) {
        let Some(blob) = text_property(host, keys::PLAYER_STATE) else {
            return;
        };
        let entries = match decode_player_state(&blob) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "ignoring unreadable player state");
                return;
            }
        };
        let team_count = self.teams.len();
        for (name, entry) in entries {
            let idx = self.get_or_create_player(&name);
            self.players[idx].apply_state_entry(&entry, team_count);
            self.sync_membership(idx);
        }
    }

    pub fn debug_lines(&self, host: &impl Host) -> Vec<String> {
        keys::ALL_WORLD
            .iter()
            .map(|key| match host.world_property(key) {
                Some(PropertyValue::Number(value)) => format!("{key} = {value}"),
                Some(PropertyValue::Text(value)) => format!("{key} = {value}"),
                None => format!("{key} = (unset)"),
            })
            .collect()
    }
}

fn number_property(host: &impl Host, key: &str) -> Option<i64> {
    host.world_property(key).and_then(|value| value.as_i64())
}

fn text_property(host: &impl Host, key: &str) -> Option<String> {
    host.world_property(key)
        .and_then(|value| value.as_text().map(str::to_string))
}
