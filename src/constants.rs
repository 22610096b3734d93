use crate::types::{Flavor, Phase};

pub const TICK_INTERVAL: u32 = 2;
pub const GAME_TICKS_PER_SECOND: u32 = 20;
pub const ADVANCE_MS: u64 = 1000 * TICK_INTERVAL as u64 / GAME_TICKS_PER_SECOND as u64;

pub const POST_INIT_TICK: u64 = 10;
pub const PAD_INIT_START_TICK: u64 = 20;
pub const SCORE_REFRESH_DELAY_TICKS: u64 = 40;
pub const META_REFRESH_DELAY_TICKS: u64 = 80;
pub const CLEAR_PADS_DELAY_TICKS: u64 = 60;
pub const TOCK_INTERVAL_TICKS: u64 = 200;
pub const META_BONUS_INTERVAL_TICKS: u64 = 600;
pub const TRACK_PERIOD_TICKS: u64 = 300;

pub const DEFAULT_MAX_PLAYERS_PER_TEAM: usize = 4;
pub const DEFAULT_TEAM_SWITCH_COOLDOWN_TICKS: u64 = 600;
pub const DEFAULT_DIALOG_TIMEOUT_TICKS: u64 = 3_000;

pub const PLAYER_STATE_BYTE_BUDGET: usize = 8192;
pub const PERSIST_SCHEMA_VERSION: u32 = 1;

// Arena grid: 6x6 cells with the centre 2x2 left open.
pub const GRID_SIDE: i32 = 6;
pub const GRID_HOLE_START: i32 = 2;
pub const GRID_HOLE_SIZE: i32 = 2;
pub const MAX_TEAM_SLOTS: usize = 32;

pub const BUILD_SIZE_X: i32 = 32;
pub const BUILD_SIZE_Y: i32 = 24;
pub const BUILD_SIZE_Z: i32 = 32;
pub const PAD_BORDER: i32 = 3;
pub const PAD_SIZE_X: i32 = BUILD_SIZE_X + PAD_BORDER * 2;
pub const PAD_SIZE_Z: i32 = BUILD_SIZE_Z + PAD_BORDER * 2;
pub const PAD_SPACING: i32 = 6;
pub const CELL_SIZE_X: i32 = PAD_SIZE_X + PAD_SPACING;
pub const CELL_SIZE_Z: i32 = PAD_SIZE_Z + PAD_SPACING;
pub const ARENA_SIZE_X: i32 = CELL_SIZE_X * GRID_SIDE;
pub const ARENA_SIZE_Z: i32 = CELL_SIZE_Z * GRID_SIDE;
pub const KEEP_OUT_HEADROOM: i32 = 4;

pub const SCAN_AREAS_PER_TEAM: u64 = 16;
pub const STRIP_DEPTH: i32 = BUILD_SIZE_Z / SCAN_AREAS_PER_TEAM as i32;

pub const TEAM_NAME_MIN_LEN: usize = 2;
pub const TEAM_NAME_MAX_LEN: usize = 10;
pub const MOTD_MIN_LEN: usize = 2;
pub const MOTD_MAX_LEN: usize = 39;

pub const DEFAULT_MOTD_TITLE: &str = "Build Challenge";
pub const DEFAULT_MOTD_SUBTITLE: &str = "Build something amazing";
pub const SCOREBOARD_TITLE: &str = "Build Challenge";

pub const AIR_BLOCK: &str = "minecraft:air";
pub const CHEST_BLOCK: &str = "minecraft:chest";
pub const PAD_FLOOR_BLOCK: &str = "minecraft:smooth_stone";
pub const JOIN_LEVER_BLOCK: &str = "minecraft:lever";
pub const OPTIONS_BLOCK: &str = "minecraft:lectern";
pub const HEART_ITEM: &str = "challenge:heart";
pub const VOTE_PEDESTAL_STRUCTURE: &str = "challenge:vote_pedestal";
pub const SUCCESS_SOUND: &str = "random.levelup";
pub const JOIN_SOUND: &str = "random.orb";
pub const TICKING_AREA_PREFIX: &str = "challenge_arena";

pub const WORLD_RULE_COMMANDS: [&str; 5] = [
    "gamerule domobspawning false",
    "gamerule dodaylightcycle false",
    "gamerule doweathercycle false",
    "gamerule keepinventory true",
    "gamerule showcoordinates true",
];

pub fn phase_banner(phase: Phase, flavor: Flavor) -> (&'static str, &'static str) {
    match phase {
        Phase::Setup => ("Setup", "The arena is being prepared"),
        Phase::Pre => ("Welcome!", "Pull a lever to join a team"),
        Phase::Build => ("Build!", "Fill your pad with something great"),
        Phase::Vote => match flavor {
            Flavor::Regular => ("Vote!", "Pull another team's lever to vote"),
            Flavor::GoodVibes => ("Share the love!", "Use a heart on a team you like"),
        },
        Phase::Post => ("Thanks for playing!", "Scores are final"),
    }
}

pub fn block_score(type_id: &str) -> Option<i64> {
    let name = type_id.strip_prefix("minecraft:").unwrap_or(type_id);
    let score = match name {
        "netherite_block" => 100,
        "diamond_block" => 50,
        "emerald_block" => 40,
        "gold_block" => 20,
        "lapis_block" => 12,
        "iron_block" => 10,
        "redstone_block" => 8,
        "copper_block" => 6,
        "quartz_block" => 4,
        "glass" | "stained_glass" => 2,
        "bookshelf" => 3,
        "sea_lantern" | "glowstone" => 3,
        "planks" | "oak_planks" | "spruce_planks" | "birch_planks" => 1,
        "stone_bricks" | "bricks" | "cobblestone" | "stone" => 1,
        "wool" | "white_wool" | "red_wool" | "blue_wool" => 1,
        "concrete" | "white_concrete" | "black_concrete" => 1,
        "flower_pot" | "lantern" => 2,
        _ => return None,
    };
    Some(score)
}

pub fn item_score(type_id: &str) -> Option<i64> {
    let name = type_id.strip_prefix("minecraft:").unwrap_or(type_id);
    let score = match name {
        "nether_star" => 60,
        "netherite_ingot" => 25,
        "diamond" => 5,
        "emerald" => 4,
        "gold_ingot" => 2,
        "iron_ingot" => 1,
        "cake" => 3,
        "golden_apple" => 8,
        _ => return None,
    };
    Some(score)
}
