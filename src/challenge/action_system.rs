use super::*;

use crate::constants::{GAME_TICKS_PER_SECOND, JOIN_SOUND, TICK_INTERVAL};
use crate::types::{DialogOutcome, TeamDialog};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogResolution {
    Renamed,
    Rejected,
    Canceled,
    Unknown,
}

impl Challenge {
    pub fn do_action(&mut self, host: &mut impl Host, player_name: &str, block: BlockPos) -> bool {
        let target = self.teams.iter().find_map(|team| {
            if team.options_cell() == Some(block) {
                Some((team.index, false))
            } else if team.join_cell() == Some(block) {
                Some((team.index, true))
            } else {
                None
            }
        });
        let Some((team_index, is_join)) = target else {
            return false;
        };

        let player_idx = self.get_or_create_player(player_name);
        if !is_join {
            self.open_team_dialog(host, player_idx, team_index);
        } else if self.phase == Phase::Vote {
            self.vote_for_team(host, player_idx, team_index);
        } else {
            self.join_team(host, player_idx, team_index);
        }
        true
    }

    fn join_team(&mut self, host: &mut impl Host, player_idx: usize, team_index: usize) {
        let player = &self.players[player_idx];
        let name = player.name.clone();
        let key = player.key();
        let team_name = self.teams[team_index].base_name();

        if player.team_id == Some(team_index) {
            host.send_message(&name, &format!("You are already on {team_name}."));
            return;
        }
        if !player.allow_team_change_always {
            let exempt = self.always_allowed_keys();
            let count = self.teams[team_index].capped_member_count(|member| exempt.contains(member));
            if count >= self.options.max_players_per_team {
                host.send_message(&name, &format!("{team_name} is full."));
                return;
            }
        }
        let cooldown = self.options.team_switch_cooldown_ticks;
        if player.team_id.is_some() && !player.can_switch_team(self.tick_index, cooldown) {
            let ready_at = player.last_team_switch_tick.unwrap_or(0) + cooldown;
            let seconds = (ready_at - self.tick_index) * TICK_INTERVAL as u64
                / GAME_TICKS_PER_SECOND as u64;
            host.send_message(
                &name,
                &format!("You can switch teams again in {} seconds.", seconds.max(1)),
            );
            return;
        }

        if let Some(previous) = player.team_id {
            self.teams[previous].remove_member(&key);
        }
        self.teams[team_index].add_member(&key);
        let player = &mut self.players[player_idx];
        player.team_id = Some(team_index);
        player.last_team_switch_tick = Some(self.tick_index);
        if player.role == Role::Unknown {
            player.role = Role::Player;
        }
        info!(player = %name, team = team_index, "player joined team");

        host.send_message(&name, &format!("You joined {team_name}!"));
        host.broadcast(&format!("{name} joined {team_name}."));
        host.play_sound(&name, JOIN_SOUND);
        self.update_meta_bonuses(host);
        self.refresh_team_scores(host);
        self.save(host);
    }

    fn vote_for_team(&mut self, host: &mut impl Host, player_idx: usize, team_index: usize) {
        let player = &self.players[player_idx];
        let name = player.name.clone();
        if player.team_id == Some(team_index) {
            let text = match self.flavor {
                Flavor::Regular => "You can't vote for your own team.",
                Flavor::GoodVibes => "That's your own team! Share the love with another one.",
            };
            host.send_message(&name, text);
            return;
        }
        if player.allow_team_change_always || player.role.is_spectator() {
            host.send_message(&name, "Only players can vote.");
            return;
        }

        if self.players[player_idx].cast_vote(team_index) {
            debug!(player = %name, team = team_index, "vote cast");
            self.update_meta_bonuses(host);
            self.refresh_team_scores(host);
            self.save(host);
        }
        let player = &self.players[player_idx];
        let ballots: Vec<String> = player
            .votes()
            .map(|team| self.teams[team].base_name())
            .collect();
        host.send_message(&name, &format!("Your votes: {}", ballots.join(", ")));
    }

    fn open_team_dialog(&mut self, host: &mut impl Host, player_idx: usize, team_index: usize) {
        let player = &self.players[player_idx];
        let name = player.name.clone();
        let key = player.key();
        let team = &self.teams[team_index];
        let ctx = self.score_context();
        let can_rename = team.has_member(&key) && !self.phase.is_judging();

        let members: Vec<&str> = team
            .members()
            .iter()
            .map(|member| {
                self.player_lookup
                    .get(member)
                    .map_or(member.as_str(), |idx| self.players[*idx].name.as_str())
            })
            .collect();
        let body = format!(
            "Members: {}\nScore: {}",
            if members.is_empty() {
                "none".to_string()
            } else {
                members.join(", ")
            },
            team.effective_score(&ctx)
        );
        let ticket = self.next_dialog_ticket;
        let dialog = TeamDialog {
            ticket,
            team_index,
            title: team.display_name(&ctx),
            body,
            current_name: team.base_name(),
            can_rename,
        };
        if let Err(error) = host.show_team_dialog(&name, dialog) {
            debug!(player = %name, %error, "team dialog not shown");
            return;
        }
        self.next_dialog_ticket += 1;
        if can_rename {
            self.pending_dialogs.insert(
                ticket,
                PendingDialog {
                    player: key,
                    team_index,
                    opened_tick: self.tick_index,
                },
            );
        }
    }

    pub fn handle_dialog_response(
        &mut self,
        host: &mut impl Host,
        player_name: &str,
        ticket: u64,
        outcome: DialogOutcome,
    ) -> DialogResolution {
        let key = canonical_name(player_name);
        let Some(pending) = self.pending_dialogs.remove(&ticket) else {
            return DialogResolution::Unknown;
        };
        if pending.player != key {
            self.pending_dialogs.insert(ticket, pending);
            return DialogResolution::Unknown;
        }
        let DialogOutcome::Submitted { name } = outcome else {
            return DialogResolution::Canceled;
        };
        let team = &mut self.teams[pending.team_index];
        if !team.has_member(&key) || self.phase.is_judging() {
            return DialogResolution::Rejected;
        }
        let candidate = name.trim();
        if !team.rename(candidate) {
            return DialogResolution::Rejected;
        }
        info!(team = pending.team_index, name = candidate, "team renamed");
        host.broadcast(&format!("{player_name} renamed their team to {candidate}."));
        self.refresh_team_scores(host);
        self.save(host);
        DialogResolution::Renamed
    }
}
