use std::ops::Add;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f64 + 0.5,
            self.y as f64,
            self.z as f64 + 0.5,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn lerp(self, to: Vec3, t: f64) -> Vec3 {
        Vec3 {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            z: self.z + (to.z - self.z) * t,
        }
    }

    pub fn floor(self) -> BlockPos {
        BlockPos {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Setup,
    Pre,
    Build,
    Vote,
    Post,
}

impl Phase {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "setup" => Some(Self::Setup),
            "pre" => Some(Self::Pre),
            "build" => Some(Self::Build),
            "vote" => Some(Self::Vote),
            "post" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Setup => 0,
            Self::Pre => 1,
            Self::Build => 2,
            Self::Vote => 3,
            Self::Post => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Setup),
            1 => Some(Self::Pre),
            2 => Some(Self::Build),
            3 => Some(Self::Vote),
            4 => Some(Self::Post),
            _ => None,
        }
    }

    pub fn is_judging(self) -> bool {
        matches!(self, Self::Vote | Self::Post)
    }

    pub fn game_mode(self) -> GameMode {
        match self {
            Self::Setup | Self::Build => GameMode::Creative,
            Self::Pre | Self::Vote | Self::Post => GameMode::Adventure,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Pre => "pre",
            Self::Build => "build",
            Self::Vote => "vote",
            Self::Post => "post",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    #[default]
    Regular,
    GoodVibes,
}

impl Flavor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "regular" => Some(Self::Regular),
            "goodvibes" | "good_vibes" => Some(Self::GoodVibes),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Regular => 0,
            Self::GoodVibes => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Regular),
            1 => Some(Self::GoodVibes),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::GoodVibes => "goodvibes",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSize {
    #[default]
    Small,
    Medium,
    Large,
    XtraLarge,
}

impl BoardSize {
    pub fn team_count(self) -> usize {
        match self {
            Self::Small => 4,
            Self::Medium => 8,
            Self::Large => 16,
            Self::XtraLarge => 32,
        }
    }

    pub fn from_team_count(count: i64) -> Option<Self> {
        match count {
            4 => Some(Self::Small),
            8 => Some(Self::Medium),
            16 => Some(Self::Large),
            32 => Some(Self::XtraLarge),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if let Ok(count) = normalized.parse::<i64>() {
            return Self::from_team_count(count);
        }
        match normalized.as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "xtralarge" | "xl" => Some(Self::XtraLarge),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    Player,
    Admin,
    Judge,
    Spectator,
    AdminSpectator,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "player" => Some(Self::Player),
            "admin" => Some(Self::Admin),
            "judge" => Some(Self::Judge),
            "spectator" => Some(Self::Spectator),
            "adminspectator" | "admin_spectator" => Some(Self::AdminSpectator),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Player => 1,
            Self::Admin => 2,
            Self::Judge => 3,
            Self::Spectator => 4,
            Self::AdminSpectator => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Player),
            2 => Some(Self::Admin),
            3 => Some(Self::Judge),
            4 => Some(Self::Spectator),
            5 => Some(Self::AdminSpectator),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Player => "player",
            Self::Admin => "admin",
            Self::Judge => "judge",
            Self::Spectator => "spectator",
            Self::AdminSpectator => "admin spectator",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::AdminSpectator)
    }

    pub fn is_spectator(self) -> bool {
        matches!(self, Self::Spectator | Self::AdminSpectator)
    }

    pub fn forced_game_mode(self) -> Option<GameMode> {
        match self {
            Self::Admin => Some(GameMode::Creative),
            Self::Judge => Some(GameMode::Adventure),
            Self::Spectator | Self::AdminSpectator => Some(GameMode::Spectator),
            Self::Unknown | Self::Player => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    #[default]
    BlockScan,
    VoteOnly,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    #[serde(rename = "typeId")]
    pub type_id: String,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(type_id: impl Into<String>, amount: u32) -> Self {
        Self {
            type_id: type_id.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamDialog {
    pub ticket: u64,
    pub team_index: usize,
    pub title: String,
    pub body: String,
    pub current_name: String,
    pub can_rename: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogOutcome {
    Submitted { name: String },
    Canceled,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    PlayerJoined {
        name: String,
    },
    PlayerLeft {
        name: String,
    },
    LeverActivated {
        player: String,
        block: BlockPos,
    },
    ItemUsedOnBlock {
        player: String,
        item: String,
        block: BlockPos,
    },
    ChatMessage {
        sender: String,
        message: String,
    },
    ScriptEvent {
        sender: Option<String>,
        id: String,
        message: String,
    },
    DialogResponse {
        player: String,
        ticket: u64,
        outcome: DialogOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_codes_round_trip_and_reject_unknown() {
        for phase in [Phase::Setup, Phase::Pre, Phase::Build, Phase::Vote, Phase::Post] {
            assert_eq!(Phase::from_code(phase.code() as i64), Some(phase));
            assert_eq!(Phase::parse(phase.label()), Some(phase));
        }
        assert_eq!(Phase::from_code(9), None);
        assert_eq!(Phase::parse("lobby"), None);
    }

    #[test]
    fn board_size_parses_names_and_counts() {
        assert_eq!(BoardSize::parse("medium"), Some(BoardSize::Medium));
        assert_eq!(BoardSize::parse(" 16 "), Some(BoardSize::Large));
        assert_eq!(BoardSize::parse("xtralarge"), Some(BoardSize::XtraLarge));
        assert_eq!(BoardSize::parse("12"), None);
        assert_eq!(BoardSize::XtraLarge.team_count(), 32);
    }

    #[test]
    fn roles_map_to_forced_game_modes() {
        assert_eq!(Role::Player.forced_game_mode(), None);
        assert_eq!(
            Role::AdminSpectator.forced_game_mode(),
            Some(GameMode::Spectator)
        );
        assert!(Role::AdminSpectator.is_admin());
        assert!(!Role::Judge.is_admin());
        assert_eq!(Role::parse("admin_spectator"), Some(Role::AdminSpectator));
    }

    #[test]
    fn vec3_floor_and_lerp() {
        let a = Vec3::new(0.0, 10.0, -1.5);
        let b = Vec3::new(10.0, 10.0, 8.5);
        assert_eq!(a.floor(), BlockPos::new(0, 10, -2));
        assert_eq!(a.lerp(b, 0.5), Vec3::new(5.0, 10.0, 3.5));
    }
}
