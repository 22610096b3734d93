use super::*;

use tracing::warn;

use crate::constants::{
    AIR_BLOCK, JOIN_LEVER_BLOCK, META_BONUS_INTERVAL_TICKS, META_REFRESH_DELAY_TICKS,
    OPTIONS_BLOCK, PAD_FLOOR_BLOCK, PAD_INIT_START_TICK, POST_INIT_TICK,
    SCORE_REFRESH_DELAY_TICKS, TOCK_INTERVAL_TICKS, TRACK_PERIOD_TICKS, VOTE_PEDESTAL_STRUCTURE,
    WORLD_RULE_COMMANDS,
};
use crate::error::HostError;
use crate::types::Vec3;

const PEDESTAL_EXTENT: i32 = 2;

impl Challenge {
    pub fn advance(&mut self, host: &mut impl Host) {
        self.tick_index += 1;
        let tick = self.tick_index;

        self.run_due_actions(host);
        if tick == POST_INIT_TICK {
            self.post_init(host);
        }
        if tick == PAD_INIT_START_TICK {
            self.pad_refresh_cursor = Some(0);
        }
        self.step_pad_refresh(host);
        self.step_pad_clear(host);
        self.update_player_positions(host);
        self.update_count(host);
        if tick % TOCK_INTERVAL_TICKS == 0 {
            self.update_tocks(host);
        }
        if tick % META_BONUS_INTERVAL_TICKS == 0 {
            self.update_meta_bonuses(host);
        }
        self.expire_dialogs();
    }

    fn run_due_actions(&mut self, host: &mut impl Host) {
        let tick = self.tick_index;
        let (due, pending): (Vec<ScheduledEntry>, Vec<ScheduledEntry>) = self
            .scheduled
            .drain(..)
            .partition(|entry| entry.due_tick <= tick);
        self.scheduled = pending;
        for entry in due {
            debug!(action = ?entry.action, tick, "running scheduled action");
            match entry.action {
                ScheduledAction::RefreshTeamScores => self.refresh_team_scores(host),
                ScheduledAction::UpdateMetaBonuses => {
                    self.update_meta_bonuses(host);
                }
                ScheduledAction::ClearPads => self.pad_clear_cursor = Some(0),
            }
        }
    }

    fn post_init(&mut self, host: &mut impl Host) {
        for command in WORLD_RULE_COMMANDS {
            if let Err(error) = host.run_command(command) {
                warn!(command, %error, "world rule command failed");
            }
        }
        host.set_default_game_mode(self.phase.game_mode());
        host.show_title(None, &self.motd_title, &self.motd_subtitle);
        self.schedule(SCORE_REFRESH_DELAY_TICKS, ScheduledAction::RefreshTeamScores);
        self.schedule(META_REFRESH_DELAY_TICKS, ScheduledAction::UpdateMetaBonuses);
        debug!(tick = self.tick_index, "post-init done");
    }

    fn step_pad_refresh(&mut self, host: &mut impl Host) {
        let Some(cursor) = self.pad_refresh_cursor else {
            return;
        };
        if cursor >= self.teams.len() {
            self.pad_refresh_cursor = None;
            debug!(teams = self.teams.len(), "pad refresh finished");
            return;
        }
        self.init_pad(host, cursor);
        self.pad_refresh_cursor = Some(cursor + 1);
    }

    fn step_pad_clear(&mut self, host: &mut impl Host) {
        let Some(cursor) = self.pad_clear_cursor else {
            return;
        };
        if cursor >= self.teams.len() {
            self.pad_clear_cursor = None;
            info!(teams = self.teams.len(), "pads cleared");
            return;
        }
        if let Some((from, to)) = self.teams[cursor].build_bounds() {
            if let Err(error) = host.fill(from, to, AIR_BLOCK) {
                warn!(team = cursor, %error, "could not clear build area");
            }
        }
        self.pad_clear_cursor = Some(cursor + 1);
    }

    pub(crate) fn init_pad(&self, host: &mut impl Host, team_index: usize) {
        if let Err(error) = self.lay_pad(host, &self.teams[team_index]) {
            debug!(team = team_index, %error, "pad not refreshed");
        }
    }

    fn lay_pad(&self, host: &mut impl Host, team: &Team) -> Result<(), HostError> {
        let (Some((floor_from, floor_to)), Some(join), Some(options), Some(pedestal)) = (
            team.pad_bounds(),
            team.join_cell(),
            team.options_cell(),
            team.pedestal_cell(),
        ) else {
            return Ok(());
        };
        host.fill(floor_from, floor_to, PAD_FLOOR_BLOCK)?;
        host.set_block(join, JOIN_LEVER_BLOCK)?;
        host.set_block(options, OPTIONS_BLOCK)?;
        if self.phase == Phase::Vote {
            host.place_structure(VOTE_PEDESTAL_STRUCTURE, pedestal)
        } else {
            host.fill(
                pedestal,
                pedestal.offset(PEDESTAL_EXTENT, PEDESTAL_EXTENT, PEDESTAL_EXTENT),
                AIR_BLOCK,
            )
        }
    }

    fn update_player_positions(&mut self, host: &mut impl Host) {
        let keep_out = self.phase == Phase::Build;
        for name in host.online_players() {
            let Some(idx) = self.player_index(&name) else {
                continue;
            };
            let player = &self.players[idx];
            match player.role {
                Role::Spectator | Role::AdminSpectator => self.follow_track(host, &name),
                Role::Unknown | Role::Player if keep_out => {
                    let Some(location) = host.player_location(&name) else {
                        continue;
                    };
                    let own_team = player.team_id;
                    let exit = self
                        .teams
                        .iter()
                        .filter(|team| Some(team.index) != own_team)
                        .find_map(|team| {
                            team.keep_out_exit(location)
                                .map(|exit| (team.base_name(), exit))
                        });
                    if let Some((team_name, exit)) = exit {
                        if host.teleport_player(&name, exit, None).is_ok() {
                            host.send_message(&name, &format!("That pad belongs to {team_name}."));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn follow_track(&self, host: &mut impl Host, name: &str) {
        if self.tracks.is_empty() {
            return;
        }
        let pass = self.tick_index / TRACK_PERIOD_TICKS;
        let track = &self.tracks[(pass % self.tracks.len() as u64) as usize];
        let t = (self.tick_index % TRACK_PERIOD_TICKS) as f64 / TRACK_PERIOD_TICKS as f64;
        let position: Vec3 = track.position_at(t);
        if let Err(error) = host.teleport_player(name, position, Some(track.facing_at(t))) {
            debug!(player = name, %error, "spectator camera skipped");
        }
    }

    fn update_tocks(&mut self, host: &mut impl Host) {
        let mut moved = 0usize;
        for player in self.players.iter_mut().filter(|player| player.connected) {
            let Some(team) = player.team_id else {
                continue;
            };
            let Some(location) = host.player_location(&player.name) else {
                continue;
            };
            if player.tock(location.floor()) {
                if let Some(team) = self.teams.get_mut(team) {
                    team.player_tocks += 1;
                    moved += 1;
                }
            }
        }
        if moved > 0 {
            debug!(moved, "activity recorded");
            self.save(host);
        }
    }

    fn expire_dialogs(&mut self) {
        let tick = self.tick_index;
        let timeout = self.options.dialog_timeout_ticks;
        self.pending_dialogs.retain(|ticket, dialog| {
            let open = tick.saturating_sub(dialog.opened_tick) < timeout;
            if !open {
                debug!(ticket, player = %dialog.player, "team dialog abandoned");
            }
            open
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::WorldAccess;

    fn advance_to(challenge: &mut Challenge, host: &mut MemoryHost, tick: u64) {
        while challenge.tick_index() < tick {
            challenge.advance(host);
        }
    }

    #[test]
    fn post_init_applies_world_rules_and_schedules_refreshes() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        advance_to(&mut challenge, &mut host, POST_INIT_TICK);
        assert_eq!(host.commands.len(), WORLD_RULE_COMMANDS.len());
        assert_eq!(
            host.titles.last().map(|t| t.title.as_str()),
            Some(challenge.motd().0)
        );
        assert_eq!(host.scoreboard_resets, 0);
        advance_to(&mut challenge, &mut host, POST_INIT_TICK + SCORE_REFRESH_DELAY_TICKS);
        assert_eq!(host.scoreboard_resets, 1);
    }

    #[test]
    fn pad_refresh_lays_one_pad_per_step() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        advance_to(&mut challenge, &mut host, PAD_INIT_START_TICK);
        let first = challenge.teams()[0].join_cell().expect("located");
        let second = challenge.teams()[1].join_cell().expect("located");
        assert_eq!(host.block(first).as_deref(), Some(JOIN_LEVER_BLOCK));
        assert_eq!(host.block(second).as_deref(), Some(AIR_BLOCK));
        advance_to(&mut challenge, &mut host, PAD_INIT_START_TICK + 4);
        for team in challenge.teams() {
            let canary = team.canary_cell(0).expect("located");
            assert_eq!(host.block(canary).as_deref(), Some(PAD_FLOOR_BLOCK));
        }
        assert_eq!(challenge.pad_refresh_cursor, None);
    }

    #[test]
    fn vote_phase_pads_get_pedestals() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        challenge.phase = Phase::Vote;
        challenge.init_pad(&mut host, 2);
        let pedestal = challenge.teams()[2].pedestal_cell().expect("located");
        assert_eq!(
            host.structures,
            vec![(VOTE_PEDESTAL_STRUCTURE.to_string(), pedestal)]
        );
    }

    #[test]
    fn unloaded_pads_are_skipped_quietly() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        let join = challenge.teams()[0].join_cell().expect("located");
        host.unloaded.insert(join);
        challenge.init_pad(&mut host, 0);
        assert_eq!(host.block(join), None);
        challenge.init_pad(&mut host, 1);
        let other = challenge.teams()[1].join_cell().expect("located");
        assert_eq!(host.block(other).as_deref(), Some(JOIN_LEVER_BLOCK));
    }

    #[test]
    fn clear_pads_empties_every_build_area() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        let (from, _) = challenge.teams()[3].build_bounds().expect("located");
        host.blocks.insert(from, "minecraft:gold_block".to_string());
        challenge.schedule(1, ScheduledAction::ClearPads);
        for _ in 0..6 {
            challenge.advance(&mut host);
        }
        assert_eq!(host.block(from).as_deref(), Some(AIR_BLOCK));
        assert_eq!(challenge.pad_clear_cursor, None);
    }

    #[test]
    fn build_phase_keeps_players_off_other_pads() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Intruder");
        join(&mut challenge, &mut host, "Owner");
        let idx = challenge.player_index("owner").expect("joined");
        challenge.players[idx].team_id = Some(0);
        challenge.sync_membership(idx);
        challenge.phase = Phase::Build;

        let inside = challenge.teams()[0].nwb().expect("located").center();
        host.move_player("Intruder", inside);
        host.move_player("Owner", inside);
        challenge.advance(&mut host);

        assert_ne!(host.players["Intruder"].location, inside);
        assert!(challenge.teams()[0]
            .keep_out_exit(host.players["Intruder"].location)
            .is_none());
        assert_eq!(host.players["Owner"].location, inside);
        assert!(host
            .last_message_for("Intruder")
            .is_some_and(|text| text.contains("belongs to")));
    }

    #[test]
    fn judges_and_admins_may_walk_anywhere() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Judy");
        let idx = challenge.player_index("judy").expect("joined");
        challenge.players[idx].role = Role::Judge;
        challenge.phase = Phase::Build;
        let inside = challenge.teams()[1].nwb().expect("located").center();
        host.move_player("Judy", inside);
        challenge.advance(&mut host);
        assert_eq!(host.players["Judy"].location, inside);
    }

    #[test]
    fn spectators_ride_the_camera_tracks() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Cam");
        join(&mut challenge, &mut host, "Director");
        let idx = challenge.player_index("cam").expect("joined");
        challenge.players[idx].role = Role::Spectator;
        let idx = challenge.player_index("director").expect("joined");
        challenge.players[idx].role = Role::AdminSpectator;
        challenge.advance(&mut host);
        let track = challenge.tracks()[0];
        let expected = track.position_at(1.0 / TRACK_PERIOD_TICKS as f64);
        for name in ["Cam", "Director"] {
            assert_eq!(host.players[name].location, expected);
            assert!(host.players[name].facing.is_some());
        }
    }

    #[test]
    fn tocks_count_movement_of_team_members() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Walker");
        let idx = challenge.player_index("walker").expect("joined");
        challenge.players[idx].team_id = Some(2);
        challenge.sync_membership(idx);

        advance_to(&mut challenge, &mut host, TOCK_INTERVAL_TICKS);
        assert_eq!(challenge.teams()[2].player_tocks, 0);
        host.move_player("Walker", Vec3::new(-30.0, 65.0, -20.0));
        advance_to(&mut challenge, &mut host, TOCK_INTERVAL_TICKS * 2);
        assert_eq!(challenge.teams()[2].player_tocks, 1);
        advance_to(&mut challenge, &mut host, TOCK_INTERVAL_TICKS * 3);
        assert_eq!(challenge.teams()[2].player_tocks, 1);
    }

    #[test]
    fn unanswered_dialogs_are_abandoned() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        challenge.options.dialog_timeout_ticks = 5;
        challenge.pending_dialogs.insert(
            7,
            PendingDialog {
                player: "late".to_string(),
                team_index: 0,
                opened_tick: 0,
            },
        );
        advance_to(&mut challenge, &mut host, 4);
        assert_eq!(challenge.pending_dialog_count(), 1);
        advance_to(&mut challenge, &mut host, 5);
        assert_eq!(challenge.pending_dialog_count(), 0);
    }
}
