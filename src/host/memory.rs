use std::collections::{BTreeMap, HashMap, HashSet};

use crate::constants::AIR_BLOCK;
use crate::error::HostError;
use crate::types::{BlockPos, GameMode, ItemStack, TeamDialog, Vec3};

use super::{Presentation, PropertyStore, PropertyValue, WorldAccess};

#[derive(Clone, Debug)]
pub struct MemoryPlayer {
    pub location: Vec3,
    pub facing: Option<Vec3>,
    pub game_mode: GameMode,
    pub view_block: Option<BlockPos>,
    pub inventory: BTreeMap<String, u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TitleRecord {
    pub target: Option<String>,
    pub title: String,
    pub subtitle: String,
}

#[derive(Clone, Debug)]
pub struct MemoryHost {
    pub blocks: HashMap<BlockPos, String>,
    pub unloaded: HashSet<BlockPos>,
    pub containers: HashMap<BlockPos, Vec<ItemStack>>,
    pub players: BTreeMap<String, MemoryPlayer>,
    pub world_props: BTreeMap<String, PropertyValue>,
    pub player_props: BTreeMap<String, BTreeMap<String, PropertyValue>>,
    pub commands: Vec<String>,
    pub structures: Vec<(String, BlockPos)>,
    pub messages: Vec<(String, String)>,
    pub broadcasts: Vec<String>,
    pub titles: Vec<TitleRecord>,
    pub sounds: Vec<(String, String)>,
    pub scoreboard: BTreeMap<String, i64>,
    pub scoreboard_resets: usize,
    pub dialogs: Vec<(String, TeamDialog)>,
    pub world_spawn: Option<BlockPos>,
    pub default_game_mode: GameMode,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            unloaded: HashSet::new(),
            containers: HashMap::new(),
            players: BTreeMap::new(),
            world_props: BTreeMap::new(),
            player_props: BTreeMap::new(),
            commands: Vec::new(),
            structures: Vec::new(),
            messages: Vec::new(),
            broadcasts: Vec::new(),
            titles: Vec::new(),
            sounds: Vec::new(),
            scoreboard: BTreeMap::new(),
            scoreboard_resets: 0,
            dialogs: Vec::new(),
            world_spawn: None,
            default_game_mode: GameMode::Survival,
        }
    }

    pub fn connect_player(&mut self, name: &str, location: Vec3) {
        self.players.insert(
            name.to_string(),
            MemoryPlayer {
                location,
                facing: None,
                game_mode: GameMode::Survival,
                view_block: None,
                inventory: BTreeMap::new(),
            },
        );
    }

    pub fn disconnect_player(&mut self, name: &str) {
        self.players.remove(name);
    }

    pub fn move_player(&mut self, name: &str, location: Vec3) {
        if let Some(player) = self.players.get_mut(name) {
            player.location = location;
        }
    }

    pub fn messages_for(&self, name: &str) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(target, _)| target == name)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn last_message_for(&self, name: &str) -> Option<&str> {
        self.messages_for(name).last().copied()
    }

    fn player_mut(&mut self, name: &str) -> Result<&mut MemoryPlayer, HostError> {
        self.players
            .get_mut(name)
            .ok_or_else(|| HostError::StalePlayer(name.to_string()))
    }
}

fn ordered(from: BlockPos, to: BlockPos) -> (BlockPos, BlockPos) {
    (
        BlockPos::new(from.x.min(to.x), from.y.min(to.y), from.z.min(to.z)),
        BlockPos::new(from.x.max(to.x), from.y.max(to.y), from.z.max(to.z)),
    )
}

impl WorldAccess for MemoryHost {
    fn block(&self, pos: BlockPos) -> Option<String> {
        if self.unloaded.contains(&pos) {
            return None;
        }
        Some(
            self.blocks
                .get(&pos)
                .cloned()
                .unwrap_or_else(|| AIR_BLOCK.to_string()),
        )
    }

    fn set_block(&mut self, pos: BlockPos, type_id: &str) -> Result<(), HostError> {
        if self.unloaded.contains(&pos) {
            return Err(HostError::Unloaded(format!("{} {} {}", pos.x, pos.y, pos.z)));
        }
        if type_id == AIR_BLOCK {
            self.blocks.remove(&pos);
            self.containers.remove(&pos);
        } else {
            self.blocks.insert(pos, type_id.to_string());
        }
        Ok(())
    }

    fn fill(&mut self, from: BlockPos, to: BlockPos, type_id: &str) -> Result<(), HostError> {
        let (min, max) = ordered(from, to);
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let pos = BlockPos::new(x, y, z);
                    if self.unloaded.contains(&pos) {
                        continue;
                    }
                    self.set_block(pos, type_id)?;
                }
            }
        }
        Ok(())
    }

    fn container_items(&self, pos: BlockPos) -> Option<Vec<ItemStack>> {
        self.containers.get(&pos).cloned()
    }

    fn place_structure(&mut self, name: &str, pos: BlockPos) -> Result<(), HostError> {
        self.structures.push((name.to_string(), pos));
        Ok(())
    }

    fn run_command(&mut self, command: &str) -> Result<(), HostError> {
        self.commands.push(command.to_string());
        Ok(())
    }

    fn set_world_spawn(&mut self, pos: BlockPos) {
        self.world_spawn = Some(pos);
    }

    fn set_default_game_mode(&mut self, mode: GameMode) {
        self.default_game_mode = mode;
    }

    fn online_players(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    fn player_location(&self, name: &str) -> Option<Vec3> {
        self.players.get(name).map(|player| player.location)
    }

    fn player_view_block(&self, name: &str) -> Option<BlockPos> {
        self.players.get(name).and_then(|player| player.view_block)
    }

    fn teleport_player(
        &mut self,
        name: &str,
        location: Vec3,
        facing: Option<Vec3>,
    ) -> Result<(), HostError> {
        let player = self.player_mut(name)?;
        player.location = location;
        player.facing = facing;
        Ok(())
    }

    fn set_player_game_mode(&mut self, name: &str, mode: GameMode) -> Result<(), HostError> {
        self.player_mut(name)?.game_mode = mode;
        Ok(())
    }

    fn give_item(&mut self, name: &str, item: &str, amount: u32) -> Result<(), HostError> {
        let player = self.player_mut(name)?;
        *player.inventory.entry(item.to_string()).or_insert(0) += amount;
        Ok(())
    }
}

impl PropertyStore for MemoryHost {
    fn world_property(&self, key: &str) -> Option<PropertyValue> {
        self.world_props.get(key).cloned()
    }

    fn set_world_property(&mut self, key: &str, value: PropertyValue) {
        self.world_props.insert(key.to_string(), value);
    }

    fn player_property(&self, name: &str, key: &str) -> Option<PropertyValue> {
        self.player_props
            .get(name)
            .and_then(|props| props.get(key))
            .cloned()
    }

    fn set_player_property(
        &mut self,
        name: &str,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), HostError> {
        if !self.players.contains_key(name) {
            return Err(HostError::StalePlayer(name.to_string()));
        }
        self.player_props
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

impl Presentation for MemoryHost {
    fn show_title(&mut self, target: Option<&str>, title: &str, subtitle: &str) {
        self.titles.push(TitleRecord {
            target: target.map(|value| value.to_string()),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        });
    }

    fn send_message(&mut self, name: &str, text: &str) {
        self.messages.push((name.to_string(), text.to_string()));
    }

    fn broadcast(&mut self, text: &str) {
        self.broadcasts.push(text.to_string());
    }

    fn play_sound(&mut self, name: &str, sound_id: &str) {
        self.sounds.push((name.to_string(), sound_id.to_string()));
    }

    fn reset_scoreboard(&mut self, _objective_title: &str) {
        self.scoreboard.clear();
        self.scoreboard_resets += 1;
    }

    fn set_score(&mut self, label: &str, score: i64) {
        self.scoreboard.insert(label.to_string(), score);
    }

    fn show_team_dialog(&mut self, name: &str, dialog: TeamDialog) -> Result<(), HostError> {
        if !self.players.contains_key(name) {
            return Err(HostError::StalePlayer(name.to_string()));
        }
        self.dialogs.push((name.to_string(), dialog));
        Ok(())
    }
}
