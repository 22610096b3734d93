use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::types::{BlockPos, GameMode, ItemStack, TeamDialog, Vec3};

pub mod memory;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(value.trunc() as i64),
            Self::Number(_) => None,
            Self::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub trait WorldAccess {
    /// Block type id at `pos`, or `None` while the chunk is not loaded.
    fn block(&self, pos: BlockPos) -> Option<String>;
    fn set_block(&mut self, pos: BlockPos, type_id: &str) -> Result<(), HostError>;
    fn fill(&mut self, from: BlockPos, to: BlockPos, type_id: &str) -> Result<(), HostError>;
    fn container_items(&self, pos: BlockPos) -> Option<Vec<ItemStack>>;
    fn place_structure(&mut self, name: &str, pos: BlockPos) -> Result<(), HostError>;
    fn run_command(&mut self, command: &str) -> Result<(), HostError>;
    fn set_world_spawn(&mut self, pos: BlockPos);
    fn set_default_game_mode(&mut self, mode: GameMode);

    fn online_players(&self) -> Vec<String>;
    fn player_location(&self, name: &str) -> Option<Vec3>;
    fn player_view_block(&self, name: &str) -> Option<BlockPos>;
    fn teleport_player(
        &mut self,
        name: &str,
        location: Vec3,
        facing: Option<Vec3>,
    ) -> Result<(), HostError>;
    fn set_player_game_mode(&mut self, name: &str, mode: GameMode) -> Result<(), HostError>;
    fn give_item(&mut self, name: &str, item: &str, amount: u32) -> Result<(), HostError>;
}

pub trait PropertyStore {
    fn world_property(&self, key: &str) -> Option<PropertyValue>;
    fn set_world_property(&mut self, key: &str, value: PropertyValue);
    fn player_property(&self, name: &str, key: &str) -> Option<PropertyValue>;
    fn set_player_property(
        &mut self,
        name: &str,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), HostError>;
}

pub trait Presentation {
    fn show_title(&mut self, target: Option<&str>, title: &str, subtitle: &str);
    fn send_message(&mut self, name: &str, text: &str);
    fn broadcast(&mut self, text: &str);
    fn play_sound(&mut self, name: &str, sound_id: &str);
    fn reset_scoreboard(&mut self, objective_title: &str);
    fn set_score(&mut self, label: &str, score: i64);
    fn show_team_dialog(&mut self, name: &str, dialog: TeamDialog) -> Result<(), HostError>;
}

pub trait Host: WorldAccess + PropertyStore + Presentation {}

impl<T: WorldAccess + PropertyStore + Presentation> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_values_coerce_numbers_and_numeric_text() {
        assert_eq!(PropertyValue::Number(3.9).as_i64(), Some(3));
        assert_eq!(PropertyValue::Text(" 12 ".to_string()).as_i64(), Some(12));
        assert_eq!(PropertyValue::Text("x".to_string()).as_i64(), None);
        assert_eq!(PropertyValue::Number(f64::NAN).as_i64(), None);
        assert_eq!(PropertyValue::from("a").as_text(), Some("a"));
    }

    #[test]
    fn property_values_serialize_as_bare_json_scalars() {
        let encoded = serde_json::to_string(&vec![
            PropertyValue::from(4),
            PropertyValue::from("four"),
        ])
        .expect("serialize");
        assert_eq!(encoded, r#"[4.0,"four"]"#);
        let decoded: Vec<PropertyValue> = serde_json::from_str("[1, \"b\"]").expect("decode");
        assert_eq!(decoded[0], PropertyValue::Number(1.0));
        assert_eq!(decoded[1], PropertyValue::Text("b".to_string()));
    }
}
