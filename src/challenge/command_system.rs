use super::*;

use tracing::warn;

use crate::commands::{help_lines, parse_command, ChallengeCommand};
use crate::constants::{
    AIR_BLOCK, ARENA_SIZE_X, ARENA_SIZE_Z, CLEAR_PADS_DELAY_TICKS, TICKING_AREA_PREFIX,
};
use crate::layout::arena_centre;

impl Challenge {
    /// Runs a `!` command from chat or a normalized script event. `sender` is
    /// `None` for console and script sources, which are trusted as admins.
    /// Returns whether the text was a command.
    pub fn process_message(&mut self, host: &mut impl Host, sender: Option<&str>, text: &str) -> bool {
        let command = match parse_command(text) {
            Ok(Some(command)) => command,
            Ok(None) => return false,
            Err(error) => {
                debug!(sender = ?sender, %error, "command rejected");
                reply(host, sender, &error.to_string());
                return true;
            }
        };
        self.execute_command(host, sender, command);
        true
    }

    fn is_admin_sender(&self, sender: Option<&str>) -> bool {
        match sender {
            None => true,
            Some(name) => self
                .player(name)
                .is_some_and(|player| player.role.is_admin()),
        }
    }

    fn execute_command(&mut self, host: &mut impl Host, sender: Option<&str>, command: ChallengeCommand) {
        if command == ChallengeCommand::Help {
            for line in help_lines() {
                reply(host, sender, line);
            }
            return;
        }
        let open_to_all = matches!(command, ChallengeCommand::Debug);
        if !open_to_all && !self.is_admin_sender(sender) {
            reply(host, sender, "Only admins can use that command.");
            return;
        }
        let setup_only = matches!(
            command,
            ChallengeCommand::SetStart { .. } | ChallengeCommand::SetSize(_) | ChallengeCommand::ClearPads
        );
        if setup_only && self.phase != Phase::Setup {
            reply(host, sender, "That command only works during setup.");
            return;
        }
        info!(sender = ?sender, ?command, "running command");

        match command {
            ChallengeCommand::Help => {}
            ChallengeCommand::SetMotdTitle(title) => {
                self.motd_title = title;
                self.save(host);
                self.show_motd_to(host, sender);
            }
            ChallengeCommand::SetMotdSubtitle(subtitle) => {
                self.motd_subtitle = subtitle;
                self.save(host);
                self.show_motd_to(host, sender);
            }
            ChallengeCommand::SetStart { at } => {
                let anchor = at.or_else(|| sender.and_then(|name| host.player_view_block(name)));
                match anchor {
                    Some(anchor) => {
                        self.set_start(host, anchor);
                        reply(
                            host,
                            sender,
                            &format!("Arena anchored at {} {} {}.", anchor.x, anchor.y, anchor.z),
                        );
                    }
                    None => reply(host, sender, "Look at a block or give coordinates: !setstart x y z"),
                }
            }
            ChallengeCommand::Debug => {
                for line in self.debug_lines(host) {
                    reply(host, sender, &line);
                }
                reply(
                    host,
                    sender,
                    &format!(
                        "tick {} players {} pending dialogs {}",
                        self.tick_index,
                        self.players.len(),
                        self.pending_dialogs.len()
                    ),
                );
            }
            ChallengeCommand::SetPhase(phase) => {
                self.set_phase(host, phase);
                reply(host, sender, &format!("Phase is now {}.", phase.label()));
            }
            ChallengeCommand::SetFlavor(Some(flavor)) => {
                self.set_flavor(host, flavor);
                reply(host, sender, &format!("Flavor is now {}.", flavor.label()));
            }
            ChallengeCommand::SetFlavor(None) => {
                reply(host, sender, &format!("Flavor is {}.", self.flavor.label()));
            }
            ChallengeCommand::SetRole { player, role } => {
                let Some(idx) = self.player_index(&player) else {
                    reply(host, sender, &format!("Unknown player: {player}"));
                    return;
                };
                let current = self.players[idx].role;
                let role = match role {
                    Role::Spectator if current.is_admin() => Role::AdminSpectator,
                    other => other,
                };
                self.players[idx].role = role;
                if self.players[idx].connected {
                    self.apply_player_game_mode(host, idx);
                }
                self.save(host);
                let name = self.players[idx].name.clone();
                reply(host, sender, &format!("{name} is now {}.", role.label()));
            }
            ChallengeCommand::SetAllowTeamChange { player, value } => {
                let Some(idx) = self.player_index(&player) else {
                    reply(host, sender, &format!("Unknown player: {player}"));
                    return;
                };
                let target = &mut self.players[idx];
                target.allow_team_change_always = value.unwrap_or(!target.allow_team_change_always);
                let text = format!(
                    "{} {} change teams freely.",
                    target.name,
                    if target.allow_team_change_always { "can" } else { "can no longer" }
                );
                reply(host, sender, &text);
            }
            ChallengeCommand::SetSize(size) => {
                if !self.set_size(host, size) {
                    reply(host, sender, "The board can only grow.");
                }
            }
            ChallengeCommand::ClearPads => {
                self.pad_clear_cursor = Some(0);
                reply(host, sender, "Clearing every pad.");
            }
        }
    }

    fn show_motd_to(&self, host: &mut impl Host, sender: Option<&str>) {
        if let Some(name) = sender {
            host.show_title(Some(name), &self.motd_title, &self.motd_subtitle);
        }
    }

    pub fn set_start(&mut self, host: &mut impl Host, anchor: BlockPos) {
        self.relocate(anchor);
        if let Err(error) = host.fill(anchor.offset(-1, 1, -1), anchor.offset(1, 3, 1), AIR_BLOCK) {
            debug!(%error, "could not clear the anchor pocket");
        }

        let mut commands = vec!["tickingarea remove_all".to_string()];
        let half_x = ARENA_SIZE_X / 2;
        let half_z = ARENA_SIZE_Z / 2;
        for (quarter, (dx, dz)) in [(0, 0), (half_x, 0), (0, half_z), (half_x, half_z)]
            .into_iter()
            .enumerate()
        {
            let from = anchor.offset(dx, 0, dz);
            let to = from.offset(half_x - 1, 0, half_z - 1);
            commands.push(format!(
                "tickingarea add {} {} {} {} {} {} {TICKING_AREA_PREFIX}_{quarter}",
                from.x, from.y, from.z, to.x, to.y, to.z
            ));
        }
        for command in &commands {
            if let Err(error) = host.run_command(command) {
                warn!(command = %command, %error, "ticking area command failed");
            }
        }

        host.set_world_spawn(arena_centre(anchor));
        self.pad_refresh_cursor = Some(0);
        self.schedule(CLEAR_PADS_DELAY_TICKS, ScheduledAction::ClearPads);
        info!(x = anchor.x, y = anchor.y, z = anchor.z, "arena anchored");
        self.save(host);
    }

    pub(crate) fn clear_pad_floors(&self, host: &mut impl Host) {
        for team in &self.teams {
            if let Some((from, to)) = team.pad_bounds() {
                if let Err(error) = host.fill(from, to, AIR_BLOCK) {
                    debug!(team = team.index, %error, "pad floor not cleared");
                }
            }
        }
    }
}

fn reply(host: &mut impl Host, sender: Option<&str>, text: &str) {
    match sender {
        Some(name) => host.send_message(name, text),
        None => info!(reply = text, "command reply"),
    }
}
