use build_challenge::challenge::{Challenge, ChallengeOptions};
use build_challenge::constants::{ADVANCE_MS, CHEST_BLOCK, HEART_ITEM, SCAN_AREAS_PER_TEAM};
use build_challenge::host::memory::MemoryHost;
use build_challenge::player::canonical_name;
use build_challenge::property_file::PropertySnapshot;
use build_challenge::types::{
    BlockPos, BoardSize, Flavor, HostEvent, ItemStack, ScoringMode,
};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ARENA_ANCHOR: BlockPos = BlockPos::new(0, 64, 0);
const SETTLE_STEPS: u64 = 120;
const ACTIVITY_EVERY_STEPS: u64 = 10;
const STEPS_PER_MINUTE: u64 = 60_000 / ADVANCE_MS;
const BUILD_PALETTE: [&str; 6] = [
    "minecraft:oak_planks",
    "minecraft:stone_bricks",
    "minecraft:glass",
    "minecraft:iron_block",
    "minecraft:gold_block",
    "minecraft:diamond_block",
];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    players: Option<usize>,
    #[arg(long)]
    size: Option<String>,
    #[arg(long)]
    flavor: Option<String>,
    #[arg(long)]
    build_minutes: Option<u64>,
    #[arg(long)]
    vote_minutes: Option<u64>,
    #[arg(long)]
    vote_only: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    /// Snapshot file the session is loaded from and saved to.
    #[arg(long, env = "CHALLENGE_STATE_PATH")]
    state_path: Option<PathBuf>,
    /// Comma-separated player names that start as admins.
    #[arg(long, env = "CHALLENGE_ADMINS")]
    admins: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Pace steps at the host scheduler rate instead of running flat out.
    #[arg(long)]
    realtime: bool,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    players: usize,
    size: BoardSize,
    flavor: Flavor,
    #[serde(rename = "scoringMode")]
    scoring_mode: ScoringMode,
    #[serde(rename = "buildSteps")]
    build_steps: u64,
    #[serde(rename = "voteSteps")]
    vote_steps: u64,
    seed: u64,
    admins: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct StandingLine {
    team: usize,
    name: String,
    score: i64,
    votes: i64,
    tocks: i64,
    members: usize,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    players: usize,
    teams: usize,
    flavor: Flavor,
    #[serde(rename = "scoringMode")]
    scoring_mode: ScoringMode,
    #[serde(rename = "finishedTick")]
    finished_tick: u64,
    #[serde(rename = "blocksPlaced")]
    blocks_placed: usize,
    #[serde(rename = "votesCast")]
    votes_cast: usize,
    #[serde(rename = "keepOutRedirects")]
    keep_out_redirects: usize,
    standings: Vec<StandingLine>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "statePath", skip_serializing_if = "Option::is_none")]
    state_path: Option<String>,
    scenario: Scenario,
    result: ScenarioResultLine,
}

struct ScenarioRun {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

struct Pacer {
    interval: Option<Interval>,
}

impl Pacer {
    fn flat_out() -> Self {
        Self { interval: None }
    }

    fn realtime() -> Self {
        let mut ticker = interval(Duration::from_millis(ADVANCE_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval: Some(ticker),
        }
    }

    async fn wait(&mut self) {
        if let Some(ticker) = self.interval.as_mut() {
            ticker.tick().await;
        }
    }
}

#[derive(Default)]
struct Tally {
    blocks_placed: usize,
    votes_cast: usize,
    anomalies: Vec<String>,
    anomaly_records: Vec<AnomalyRecord>,
    anomaly_seen: HashSet<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let scenario = resolve_scenario(&cli);
    let started_at = now_iso();
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(scenario.seed, Utc::now().timestamp_millis()));

    let mut host = MemoryHost::new();
    if let Some(path) = cli.state_path.as_ref() {
        match PropertySnapshot::load(path) {
            Ok(snapshot) => snapshot.apply_to(&mut host),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable snapshot");
            }
        }
    }

    info!(
        event = "scenario_started",
        match_id = %match_id,
        scenario = %scenario.name,
        seed = scenario.seed,
        players = scenario.players,
        teams = scenario.size.team_count(),
    );
    let pacer = if cli.realtime {
        Pacer::realtime()
    } else {
        Pacer::flat_out()
    };
    let run = run_scenario(&scenario, &mut host, pacer).await;
    for anomaly in &run.anomaly_records {
        warn!(
            event = "anomaly_detected",
            match_id = %match_id,
            tick = anomaly.tick,
            message = %anomaly.message,
        );
    }

    if let Some(path) = cli.state_path.as_ref() {
        if let Err(error) = PropertySnapshot::capture(&host).save(path) {
            warn!(path = %path.display(), %error, "failed to save snapshot");
        }
    }

    println!(
        "{}",
        serde_json::to_string(&run.result).expect("scenario result should serialize")
    );

    let summary = RunSummary {
        match_id: match_id.clone(),
        started_at,
        finished_at: now_iso(),
        anomaly_count: run.anomaly_records.len(),
        state_path: cli
            .state_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
        scenario,
        result: run.result,
    };
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            warn!(
                event = "summary_write_failed",
                path = %path.display(),
                %error,
            );
            std::process::exit(2);
        }
    }
    info!(
        event = "run_finished",
        match_id = %match_id,
        anomaly_count = summary.anomaly_count,
        finished_tick = summary.result.finished_tick,
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run_scenario(scenario: &Scenario, host: &mut MemoryHost, mut pacer: Pacer) -> ScenarioRun {
    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut tally = Tally::default();
    let mut challenge = Challenge::new(ChallengeOptions {
        scoring_mode: scenario.scoring_mode,
        admins: scenario.admins.clone(),
        ..ChallengeOptions::default()
    });
    challenge.init(host);

    console(&mut challenge, host, "!setphase setup");
    console(
        &mut challenge,
        host,
        &format!("!setsize {}", scenario.size.team_count()),
    );
    console(
        &mut challenge,
        host,
        &format!("!setflavor {}", scenario.flavor.label()),
    );
    if challenge.nwb().is_none() {
        console(
            &mut challenge,
            host,
            &format!(
                "!setstart {} {} {}",
                ARENA_ANCHOR.x, ARENA_ANCHOR.y, ARENA_ANCHOR.z
            ),
        );
    }
    run_steps(&mut challenge, host, &mut pacer, &mut tally, SETTLE_STEPS).await;

    let names: Vec<String> = (0..scenario.players)
        .map(|idx| format!("Builder{:02}", idx + 1))
        .collect();
    let spawn = challenge
        .nwb()
        .map(|nwb| nwb.offset(-8, 1, -8).center())
        .unwrap_or_default();
    for name in &names {
        host.connect_player(name, spawn);
        challenge.handle_event(host, HostEvent::PlayerJoined { name: name.clone() });
    }

    console(&mut challenge, host, "!setphase pre");
    let team_count = challenge.teams().len();
    for name in &names {
        let first_choice = rng.random_range(0..team_count);
        for offset in 0..team_count {
            let team = (first_choice + offset) % team_count;
            if let Some(block) = challenge.teams()[team].join_cell() {
                challenge.handle_event(
                    host,
                    HostEvent::LeverActivated {
                        player: name.clone(),
                        block,
                    },
                );
            }
            if challenge.player(name).and_then(|p| p.team_id).is_some() {
                break;
            }
        }
    }

    console(&mut challenge, host, "!setphase build");
    for step in 0..scenario.build_steps {
        if step % ACTIVITY_EVERY_STEPS == 0 {
            for name in &names {
                build_activity(&challenge, host, &mut rng, &mut tally, name);
            }
        }
        run_steps(&mut challenge, host, &mut pacer, &mut tally, 1).await;
    }
    // One full scan cycle so every team's final build is counted.
    let full_cycle = SCAN_AREAS_PER_TEAM * team_count as u64;
    run_steps(&mut challenge, host, &mut pacer, &mut tally, full_cycle).await;

    console(&mut challenge, host, "!setphase vote");
    for name in &names {
        for _ in 0..2 {
            let team = rng.random_range(0..team_count);
            let Some(block) = challenge.teams()[team].join_cell() else {
                continue;
            };
            let before = challenge.player(name).map(|p| (p.vote_a, p.vote_b));
            let event = match scenario.flavor {
                Flavor::Regular => HostEvent::LeverActivated {
                    player: name.clone(),
                    block,
                },
                Flavor::GoodVibes => HostEvent::ItemUsedOnBlock {
                    player: name.clone(),
                    item: HEART_ITEM.to_string(),
                    block,
                },
            };
            challenge.handle_event(host, event);
            if challenge.player(name).map(|p| (p.vote_a, p.vote_b)) != before {
                tally.votes_cast += 1;
            }
        }
    }
    run_steps(&mut challenge, host, &mut pacer, &mut tally, scenario.vote_steps).await;
    console(&mut challenge, host, "!setphase post");
    run_steps(&mut challenge, host, &mut pacer, &mut tally, 1).await;

    let keep_out_redirects = host
        .messages
        .iter()
        .filter(|(_, text)| text.contains("belongs to"))
        .count();
    ScenarioRun {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            players: scenario.players,
            teams: team_count,
            flavor: scenario.flavor,
            scoring_mode: scenario.scoring_mode,
            finished_tick: challenge.tick_index(),
            blocks_placed: tally.blocks_placed,
            votes_cast: tally.votes_cast,
            keep_out_redirects,
            standings: build_standings(&challenge),
            anomalies: tally.anomalies,
        },
        anomaly_records: tally.anomaly_records,
    }
}

async fn run_steps(
    challenge: &mut Challenge,
    host: &mut MemoryHost,
    pacer: &mut Pacer,
    tally: &mut Tally,
    steps: u64,
) {
    for _ in 0..steps {
        pacer.wait().await;
        challenge.advance(host);
        let tick = challenge.tick_index();
        for message in collect_session_anomalies(challenge) {
            push_anomaly(tally, tick, message);
        }
    }
}

fn console(challenge: &mut Challenge, host: &mut MemoryHost, command: &str) {
    if !challenge.process_message(host, None, command) {
        warn!(command, "console text was not a command");
    }
}

fn build_activity(
    challenge: &Challenge,
    host: &mut MemoryHost,
    rng: &mut StdRng,
    tally: &mut Tally,
    name: &str,
) {
    let team = challenge
        .player(name)
        .and_then(|player| player.team_id)
        .and_then(|team| challenge.team(team));
    let Some((min, max)) = team.and_then(|team| team.build_bounds()) else {
        if let Some(nwb) = challenge.nwb() {
            let x = rng.random_range(0..264);
            let z = rng.random_range(0..264);
            host.move_player(name, nwb.offset(x, 2, z).center());
        }
        return;
    };

    let stand = BlockPos::new(
        rng.random_range(min.x..=max.x),
        min.y,
        rng.random_range(min.z..=max.z),
    );
    host.move_player(name, stand.center());
    if !rng.random_bool(0.3) {
        return;
    }
    let target = BlockPos::new(
        rng.random_range(min.x..=max.x),
        rng.random_range(min.y..=max.y),
        rng.random_range(min.z..=max.z),
    );
    if rng.random_bool(0.05) {
        host.blocks.insert(target, CHEST_BLOCK.to_string());
        host.containers.insert(
            target,
            vec![ItemStack::new("minecraft:diamond", rng.random_range(1..=8))],
        );
    } else {
        let block = BUILD_PALETTE[rng.random_range(0..BUILD_PALETTE.len())];
        host.blocks.insert(target, block.to_string());
    }
    tally.blocks_placed += 1;
}

fn collect_session_anomalies(challenge: &Challenge) -> Vec<String> {
    let mut anomalies = Vec::new();
    let teams = challenge.teams();
    let cap = challenge.options().max_players_per_team;

    for player in challenge.players() {
        let key = canonical_name(&player.name);
        if let Some(team) = player.team_id {
            match teams.get(team) {
                Some(team) if team.has_member(&key) => {}
                Some(team) => anomalies.push(format!(
                    "player {} not listed on team {}",
                    player.name, team.index
                )),
                None => anomalies.push(format!(
                    "player {} on missing team {team}",
                    player.name
                )),
            }
        }
        if player.vote_a.is_some() && player.vote_a == player.vote_b {
            anomalies.push(format!("player {} voted twice for one team", player.name));
        }
        if player.team_id.is_some()
            && (player.vote_a == player.team_id || player.vote_b == player.team_id)
        {
            anomalies.push(format!("player {} voted for own team", player.name));
        }
    }

    for team in teams {
        if team.block_tally_score < 0 {
            anomalies.push(format!("team {} has a negative tally", team.index));
        }
        let exempt = |member: &str| {
            challenge
                .player(member)
                .is_some_and(|player| player.allow_team_change_always)
        };
        if team.capped_member_count(exempt) > cap {
            anomalies.push(format!("team {} is over capacity", team.index));
        }
        for member in team.members() {
            let listed = challenge
                .player(member)
                .is_some_and(|player| player.team_id == Some(team.index));
            if !listed {
                anomalies.push(format!("team {} lists stray member {member}", team.index));
            }
        }
    }
    anomalies
}

fn build_standings(challenge: &Challenge) -> Vec<StandingLine> {
    challenge
        .standings()
        .into_iter()
        .filter_map(|(index, name, score)| {
            challenge.team(index).map(|team| StandingLine {
                team: index,
                name,
                score,
                votes: team.votes,
                tocks: team.player_tocks,
                members: team.members().len(),
            })
        })
        .collect()
}

fn resolve_scenario(cli: &Cli) -> Scenario {
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);
    let size = cli
        .size
        .as_deref()
        .and_then(BoardSize::parse)
        .unwrap_or(BoardSize::Small);
    let flavor = cli
        .flavor
        .as_deref()
        .and_then(Flavor::parse)
        .unwrap_or(Flavor::Regular);
    let players = cli.players.unwrap_or(8).clamp(1, 128);
    let admins = cli
        .admins
        .as_deref()
        .map(parse_admins)
        .unwrap_or_default();
    Scenario {
        name: format!("{}-teams{}-players{}", flavor.label(), size.team_count(), players),
        players,
        size,
        flavor,
        scoring_mode: if cli.vote_only {
            ScoringMode::VoteOnly
        } else {
            ScoringMode::BlockScan
        },
        build_steps: cli.build_minutes.unwrap_or(3).clamp(1, 60) * STEPS_PER_MINUTE,
        vote_steps: cli.vote_minutes.unwrap_or(1).clamp(1, 30) * STEPS_PER_MINUTE,
        seed,
        admins,
    }
}

fn parse_admins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn push_anomaly(tally: &mut Tally, tick: u64, message: String) {
    tally.anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if tally.anomaly_seen.insert(message.clone()) {
        tally.anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
