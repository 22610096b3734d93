use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info};

use crate::constants::{
    DEFAULT_DIALOG_TIMEOUT_TICKS, DEFAULT_MAX_PLAYERS_PER_TEAM, DEFAULT_MOTD_SUBTITLE,
    DEFAULT_MOTD_TITLE, DEFAULT_TEAM_SWITCH_COOLDOWN_TICKS, HEART_ITEM, SCOREBOARD_TITLE,
};
use crate::host::Host;
use crate::layout::team_cells;
use crate::player::{canonical_name, ChallengePlayer};
use crate::team::{assign_usage_quartiles, assign_vote_ranks, ScoreContext, Team};
use crate::track::{arena_tracks, Track};
use crate::types::{BlockPos, BoardSize, Flavor, Phase, Role, ScoringMode};

mod action_system;
mod command_system;
mod event_system;
mod persist_system;
mod scan_system;
mod tick_system;

pub use self::action_system::DialogResolution;
pub use self::scan_system::{container_score, score_strip};

#[derive(Clone, Debug)]
pub struct ChallengeOptions {
    pub scoring_mode: ScoringMode,
    pub max_players_per_team: usize,
    pub team_switch_cooldown_ticks: u64,
    pub dialog_timeout_ticks: u64,
    pub admins: Vec<String>,
}

impl Default for ChallengeOptions {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::BlockScan,
            max_players_per_team: DEFAULT_MAX_PLAYERS_PER_TEAM,
            team_switch_cooldown_ticks: DEFAULT_TEAM_SWITCH_COOLDOWN_TICKS,
            dialog_timeout_ticks: DEFAULT_DIALOG_TIMEOUT_TICKS,
            admins: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledAction {
    RefreshTeamScores,
    UpdateMetaBonuses,
    ClearPads,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledEntry {
    due_tick: u64,
    action: ScheduledAction,
}

#[derive(Clone, Debug)]
struct PendingDialog {
    player: String,
    team_index: usize,
    opened_tick: u64,
}

#[derive(Clone, Debug)]
pub struct Challenge {
    options: ChallengeOptions,
    phase: Phase,
    flavor: Flavor,
    size: BoardSize,
    nwb: Option<BlockPos>,
    motd_title: String,
    motd_subtitle: String,
    tick_index: u64,
    teams: Vec<Team>,
    players: Vec<ChallengePlayer>,
    player_lookup: HashMap<String, usize>,
    active_team_score: i64,
    tracks: Vec<Track>,
    pad_refresh_cursor: Option<usize>,
    pad_clear_cursor: Option<usize>,
    scheduled: Vec<ScheduledEntry>,
    pending_dialogs: BTreeMap<u64, PendingDialog>,
    next_dialog_ticket: u64,
}

impl Challenge {
    pub fn new(options: ChallengeOptions) -> Self {
        Self {
            options,
            phase: Phase::Setup,
            flavor: Flavor::Regular,
            size: BoardSize::Small,
            nwb: None,
            motd_title: DEFAULT_MOTD_TITLE.to_string(),
            motd_subtitle: DEFAULT_MOTD_SUBTITLE.to_string(),
            tick_index: 0,
            teams: Vec::new(),
            players: Vec::new(),
            player_lookup: HashMap::new(),
            active_team_score: -1,
            tracks: Vec::new(),
            pad_refresh_cursor: None,
            pad_clear_cursor: None,
            scheduled: Vec::new(),
            pending_dialogs: BTreeMap::new(),
            next_dialog_ticket: 1,
        }
    }

    pub fn init(&mut self, host: &mut impl Host) {
        let blobs_usable = self.load_session(host);
        self.init_teams();
        if blobs_usable {
            self.load_teams(host, 0);
            self.load_player_state(host);
        }
        if let Some(anchor) = self.nwb {
            self.relocate(anchor);
        }
        info!(
            phase = self.phase.label(),
            flavor = self.flavor.label(),
            teams = self.teams.len(),
            players = self.players.len(),
            anchored = self.nwb.is_some(),
            "challenge initialized"
        );
    }

    pub fn options(&self) -> &ChallengeOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn nwb(&self) -> Option<BlockPos> {
        self.nwb
    }

    pub fn motd(&self) -> (&str, &str) {
        (&self.motd_title, &self.motd_subtitle)
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }

    pub fn players(&self) -> &[ChallengePlayer] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&ChallengePlayer> {
        self.player_index(name).map(|idx| &self.players[idx])
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn active_team_score(&self) -> i64 {
        self.active_team_score
    }

    pub fn pending_dialog_count(&self) -> usize {
        self.pending_dialogs.len()
    }

    pub fn score_context(&self) -> ScoreContext {
        ScoreContext {
            phase: self.phase,
            team_count: self.teams.len(),
            scoring_mode: self.options.scoring_mode,
        }
    }

    pub fn effective_score(&self, team_index: usize) -> Option<i64> {
        let ctx = self.score_context();
        self.teams
            .get(team_index)
            .map(|team| team.effective_score(&ctx))
    }

    pub fn standings(&self) -> Vec<(usize, String, i64)> {
        let ctx = self.score_context();
        let mut rows: Vec<(usize, String, i64)> = self
            .teams
            .iter()
            .map(|team| (team.index, team.base_name(), team.effective_score(&ctx)))
            .collect();
        rows.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        rows
    }

    pub(crate) fn init_teams(&mut self) -> usize {
        let first_new = self.teams.len();
        let target = self.size.team_count();
        if first_new >= target {
            return first_new;
        }
        let mut cells = team_cells(target);
        cells.sort_by_key(|(team, _, _)| *team);
        for (index, col, row) in cells.into_iter().skip(first_new) {
            let mut team = Team::new(index, col, row);
            if let Some(anchor) = self.nwb {
                team.update_location(anchor);
            }
            self.teams.push(team);
        }
        debug!(from = first_new, to = self.teams.len(), "teams initialized");
        first_new
    }

    pub(crate) fn relocate(&mut self, anchor: BlockPos) {
        self.nwb = Some(anchor);
        for team in &mut self.teams {
            team.update_location(anchor);
        }
        self.tracks = arena_tracks(anchor);
    }

    pub(crate) fn player_index(&self, name: &str) -> Option<usize> {
        self.player_lookup.get(&canonical_name(name)).copied()
    }

    pub(crate) fn get_or_create_player(&mut self, name: &str) -> usize {
        let key = canonical_name(name);
        if let Some(idx) = self.player_lookup.get(&key) {
            return *idx;
        }
        let mut player = ChallengePlayer::new(name);
        if self
            .options
            .admins
            .iter()
            .any(|admin| canonical_name(admin) == key)
        {
            player.role = Role::Admin;
        }
        self.players.push(player);
        let idx = self.players.len() - 1;
        self.player_lookup.insert(key, idx);
        idx
    }

    pub(crate) fn sync_membership(&mut self, player_idx: usize) {
        let key = self.players[player_idx].key();
        let team_id = self.players[player_idx]
            .team_id
            .filter(|team| *team < self.teams.len());
        self.players[player_idx].team_id = team_id;
        for team in &mut self.teams {
            if Some(team.index) != team_id {
                team.remove_member(&key);
            }
        }
        if let Some(team) = team_id {
            self.teams[team].add_member(&key);
        }
    }

    pub fn set_phase(&mut self, host: &mut impl Host, phase: Phase) {
        if phase == self.phase {
            debug!(phase = phase.label(), "phase re-applied");
            self.apply_phase(host);
            return;
        }
        let previous = self.phase;
        self.phase = phase;
        info!(from = previous.label(), to = phase.label(), "phase changed");
        self.apply_phase(host);
        if previous == Phase::Vote || phase == Phase::Vote {
            self.pad_refresh_cursor = Some(0);
        }
        self.refresh_team_scores(host);
        self.save(host);
    }

    pub fn set_flavor(&mut self, host: &mut impl Host, flavor: Flavor) {
        self.flavor = flavor;
        info!(flavor = flavor.label(), "flavor changed");
        self.save(host);
    }

    pub fn set_size(&mut self, host: &mut impl Host, size: BoardSize) -> bool {
        if size.team_count() <= self.size.team_count() {
            debug!(
                current = self.size.team_count(),
                requested = size.team_count(),
                "board size can only grow"
            );
            return false;
        }
        self.save(host);
        host.broadcast(&format!(
            "The arena is growing to {} teams.",
            size.team_count()
        ));
        self.clear_pad_floors(host);

        self.size = size;
        let first_new = self.init_teams();
        self.load_teams(host, first_new);
        self.active_team_score = -1;
        self.pad_refresh_cursor = Some(0);
        info!(teams = self.teams.len(), "board size grown");
        self.refresh_team_scores(host);
        self.save(host);
        true
    }

    pub(crate) fn apply_phase(&mut self, host: &mut impl Host) {
        host.set_default_game_mode(self.phase.game_mode());
        let (title, subtitle) = crate::constants::phase_banner(self.phase, self.flavor);
        host.show_title(None, title, subtitle);
        for idx in 0..self.players.len() {
            if !self.players[idx].connected {
                continue;
            }
            self.apply_player_game_mode(host, idx);
            if self.phase == Phase::Vote && self.flavor == Flavor::GoodVibes {
                self.give_heart(host, idx);
            }
        }
    }

    pub(crate) fn apply_player_game_mode(&self, host: &mut impl Host, idx: usize) {
        let player = &self.players[idx];
        let mode = player
            .role
            .forced_game_mode()
            .unwrap_or_else(|| self.phase.game_mode());
        if let Err(error) = host.set_player_game_mode(&player.name, mode) {
            debug!(player = %player.name, %error, "could not apply game mode");
        }
    }

    pub(crate) fn give_heart(&self, host: &mut impl Host, idx: usize) {
        let player = &self.players[idx];
        if player.allow_team_change_always || player.role.is_spectator() {
            return;
        }
        if let Err(error) = host.give_item(&player.name, HEART_ITEM, 1) {
            debug!(player = %player.name, %error, "could not hand out heart");
        }
    }

    fn recompute_votes(&mut self) {
        for team in &mut self.teams {
            team.votes = 0;
        }
        for player in &self.players {
            for team in player.votes() {
                if let Some(team) = self.teams.get_mut(team) {
                    team.votes += 1;
                }
            }
        }
    }

    pub fn update_meta_bonuses(&mut self, host: &mut impl Host) -> bool {
        self.recompute_votes();
        let ranks_changed = assign_vote_ranks(&mut self.teams);
        let quartiles_changed = assign_usage_quartiles(&mut self.teams);
        let changed = ranks_changed || quartiles_changed;
        if changed {
            debug!(ranks_changed, quartiles_changed, "meta bonuses changed");
            self.refresh_team_scores(host);
        }
        changed
    }

    pub fn refresh_team_scores(&self, host: &mut impl Host) {
        let ctx = self.score_context();
        host.reset_scoreboard(SCOREBOARD_TITLE);
        for team in &self.teams {
            if team.is_active() || team.block_tally_score != 0 {
                host.set_score(&team.display_name(&ctx), team.effective_score(&ctx));
            }
        }
    }

    pub(crate) fn always_allowed_keys(&self) -> HashSet<String> {
        self.players
            .iter()
            .filter(|player| player.allow_team_change_always)
            .map(|player| player.key())
            .collect()
    }

    fn schedule(&mut self, delay: u64, action: ScheduledAction) {
        self.scheduled.push(ScheduledEntry {
            due_tick: self.tick_index + delay,
            action,
        });
    }
}
