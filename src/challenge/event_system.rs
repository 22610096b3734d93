use super::*;

use crate::commands::script_event_to_message;
use crate::types::HostEvent;

impl Challenge {
    pub fn handle_event(&mut self, host: &mut impl Host, event: HostEvent) {
        match event {
            HostEvent::PlayerJoined { name } => self.on_player_joined(host, &name),
            HostEvent::PlayerLeft { name } => self.on_player_left(host, &name),
            HostEvent::LeverActivated { player, block } => {
                self.do_action(host, &player, block);
            }
            HostEvent::ItemUsedOnBlock {
                player,
                item,
                block,
            } => {
                if item == HEART_ITEM
                    && self.flavor == Flavor::GoodVibes
                    && self.phase == Phase::Vote
                {
                    self.do_action(host, &player, block);
                }
            }
            HostEvent::ChatMessage { sender, message } => {
                self.process_message(host, Some(&sender), &message);
            }
            HostEvent::ScriptEvent {
                sender,
                id,
                message,
            } => match script_event_to_message(&id, &message) {
                Some(text) => {
                    self.process_message(host, sender.as_deref(), &text);
                }
                None => debug!(id = %id, "ignoring foreign script event"),
            },
            HostEvent::DialogResponse {
                player,
                ticket,
                outcome,
            } => {
                let resolution = self.handle_dialog_response(host, &player, ticket, outcome);
                debug!(player = %player, ticket, ?resolution, "dialog answered");
            }
        }
    }

    fn on_player_joined(&mut self, host: &mut impl Host, name: &str) {
        let idx = self.get_or_create_player(name);
        let team_count = self.teams.len();
        let player = &mut self.players[idx];
        player.name = name.trim().to_string();
        player.connected = true;
        let restored = player.load_from_host(host, team_count);
        self.sync_membership(idx);
        info!(player = %name, restored, "player connected");

        self.apply_player_game_mode(host, idx);
        host.show_title(Some(name), &self.motd_title, &self.motd_subtitle);
        if self.phase == Phase::Vote && self.flavor == Flavor::GoodVibes {
            self.give_heart(host, idx);
        }
        self.save(host);
    }

    fn on_player_left(&mut self, host: &mut impl Host, name: &str) {
        let Some(idx) = self.player_index(name) else {
            return;
        };
        if let Err(error) = self.players[idx].save_to_host(host) {
            debug!(player = %name, %error, "skipping player-scoped save on leave");
        }
        self.players[idx].connected = false;
        info!(player = %name, "player disconnected");
        self.save(host);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::{PropertyStore, PropertyValue};
    use crate::persistence::keys;
    use crate::types::{GameMode, Vec3};

    #[test]
    fn joining_restores_player_scoped_state() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        host.connect_player("Returner", Vec3::default());
        host.set_player_property("Returner", keys::PLAYER_TEAM_ID, PropertyValue::from(2))
            .expect("online");
        host.set_player_property("Returner", keys::PLAYER_ROLE, PropertyValue::from(3))
            .expect("online");
        challenge.handle_event(
            &mut host,
            HostEvent::PlayerJoined {
                name: "Returner".to_string(),
            },
        );
        let player = challenge.player("returner").expect("known");
        assert!(player.connected);
        assert_eq!(player.team_id, Some(2));
        assert_eq!(player.role, Role::Judge);
        assert!(challenge.teams()[2].has_member("returner"));
        assert_eq!(host.players["Returner"].game_mode, GameMode::Adventure);
        assert_eq!(
            host.titles.last().and_then(|t| t.target.as_deref()),
            Some("Returner")
        );
    }

    #[test]
    fn leaving_marks_the_player_offline() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Leaver");
        let idx = challenge.player_index("leaver").expect("known");
        challenge.players[idx].team_id = Some(3);
        challenge.players[idx].vote_a = Some(1);
        challenge.handle_event(
            &mut host,
            HostEvent::PlayerLeft {
                name: "Leaver".to_string(),
            },
        );
        assert!(!challenge.player("leaver").expect("known").connected);
        assert_eq!(
            host.player_property("Leaver", keys::PLAYER_TEAM_ID),
            Some(PropertyValue::from(3))
        );
        assert_eq!(
            host.player_property("Leaver", keys::PLAYER_VOTE_A),
            Some(PropertyValue::from(1))
        );
    }

    #[test]
    fn hearts_vote_only_in_good_vibes_voting() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        join(&mut challenge, &mut host, "Fan");
        let block = challenge.teams()[1].join_cell().expect("located");
        let use_heart = |challenge: &mut Challenge, host: &mut MemoryHost| {
            challenge.handle_event(
                host,
                HostEvent::ItemUsedOnBlock {
                    player: "Fan".to_string(),
                    item: HEART_ITEM.to_string(),
                    block,
                },
            )
        };

        challenge.phase = Phase::Vote;
        use_heart(&mut challenge, &mut host);
        assert_eq!(challenge.player("fan").and_then(|p| p.vote_a), None);

        challenge.flavor = Flavor::GoodVibes;
        use_heart(&mut challenge, &mut host);
        assert_eq!(challenge.player("fan").and_then(|p| p.vote_a), Some(1));
    }

    #[test]
    fn foreign_script_events_are_ignored() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        challenge.handle_event(
            &mut host,
            HostEvent::ScriptEvent {
                sender: None,
                id: "other:setphase".to_string(),
                message: "build".to_string(),
            },
        );
        assert_eq!(challenge.phase(), Phase::Setup);

        challenge.handle_event(
            &mut host,
            HostEvent::ScriptEvent {
                sender: None,
                id: "challenge:setphase".to_string(),
                message: "build".to_string(),
            },
        );
        assert_eq!(challenge.phase(), Phase::Build);
    }
}
