use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::PersistError;
use crate::host::memory::MemoryHost;
use crate::host::PropertyValue;

pub const SNAPSHOT_VERSION: u8 = 1;

type PropertyMap = BTreeMap<String, PropertyValue>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub version: u8,
    pub world: PropertyMap,
    pub players: BTreeMap<String, PropertyMap>,
}

#[derive(Clone, Debug, Deserialize)]
struct PropertySnapshotRaw {
    version: u8,
    #[serde(default)]
    world: Map<String, Value>,
    #[serde(default)]
    players: Map<String, Value>,
}

impl PropertySnapshot {
    pub fn capture(host: &MemoryHost) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            world: host.world_props.clone(),
            players: host.player_props.clone(),
        }
    }

    pub fn apply_to(&self, host: &mut MemoryHost) {
        host.world_props.extend(self.world.clone());
        for (player, props) in &self.players {
            host.player_props
                .entry(player.clone())
                .or_default()
                .extend(props.clone());
        }
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot yet; starting empty");
                return Ok(Self {
                    version: SNAPSHOT_VERSION,
                    ..Self::default()
                });
            }
            Err(error) => return Err(error.into()),
        };
        let raw: PropertySnapshotRaw = serde_json::from_str(&text)?;
        if raw.version != SNAPSHOT_VERSION {
            return Err(PersistError::UnsupportedVersion(raw.version as u32));
        }

        let world = sanitize_props(raw.world, "world");
        let mut players = BTreeMap::new();
        for (player, value) in raw.players {
            let Value::Object(props) = value else {
                warn!(player = %player, path = %path.display(), "skipping malformed player entry");
                continue;
            };
            let props = sanitize_props(props, &player);
            if !props.is_empty() {
                players.insert(player, props);
            }
        }
        Ok(Self {
            version: SNAPSHOT_VERSION,
            world,
            players,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn sanitize_props(raw: Map<String, Value>, scope: &str) -> PropertyMap {
    let mut props = PropertyMap::new();
    for (key, value) in raw {
        match serde_json::from_value::<PropertyValue>(value) {
            Ok(value) => {
                props.insert(key, value);
            }
            Err(error) => {
                warn!(scope, key = %key, %error, "skipping invalid property");
            }
        }
    }
    props
}
