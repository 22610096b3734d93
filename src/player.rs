use crate::error::HostError;
use crate::host::{PropertyStore, PropertyValue};
use crate::persistence::{keys, PlayerStateEntry};
use crate::types::{BlockPos, Role};

pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn index_from_code(code: i64, limit: usize) -> Option<usize> {
    usize::try_from(code).ok().filter(|index| *index < limit)
}

fn index_to_code(index: Option<usize>) -> i64 {
    index.map_or(-1, |value| value as i64)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChallengePlayer {
    pub name: String,
    pub team_id: Option<usize>,
    pub role: Role,
    pub vote_a: Option<usize>,
    pub vote_b: Option<usize>,
    pub last_team_switch_tick: Option<u64>,
    pub allow_team_change_always: bool,
    pub connected: bool,
    tock_pos: Option<BlockPos>,
}

impl ChallengePlayer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            team_id: None,
            role: Role::Unknown,
            vote_a: None,
            vote_b: None,
            last_team_switch_tick: None,
            allow_team_change_always: false,
            connected: false,
            tock_pos: None,
        }
    }

    pub fn key(&self) -> String {
        canonical_name(&self.name)
    }

    pub fn cast_vote(&mut self, team: usize) -> bool {
        if self.vote_a == Some(team) || self.team_id == Some(team) {
            return false;
        }
        self.vote_b = self.vote_a;
        self.vote_a = Some(team);
        true
    }

    pub fn votes(&self) -> impl Iterator<Item = usize> {
        self.vote_a.into_iter().chain(self.vote_b)
    }

    pub fn can_switch_team(&self, now: u64, cooldown: u64) -> bool {
        if self.role.is_admin() || self.allow_team_change_always {
            return true;
        }
        match self.last_team_switch_tick {
            Some(switched_at) => now >= switched_at.saturating_add(cooldown),
            None => true,
        }
    }

    pub fn tock(&mut self, position: BlockPos) -> bool {
        let moved = self.tock_pos.is_some_and(|previous| previous != position);
        self.tock_pos = Some(position);
        moved
    }

    pub fn to_state_entry(&self) -> PlayerStateEntry {
        PlayerStateEntry {
            r: self.role.code() as i64,
            t: index_to_code(self.team_id),
            v: index_to_code(self.vote_a),
            x: index_to_code(self.vote_b),
        }
    }

    pub fn apply_state_entry(&mut self, entry: &PlayerStateEntry, team_count: usize) {
        if let Some(role) = Role::from_code(entry.r) {
            self.role = role;
        }
        self.team_id = index_from_code(entry.t, team_count);
        self.vote_a = index_from_code(entry.v, team_count);
        self.vote_b = index_from_code(entry.x, team_count);
    }

    pub fn save_to_host(&self, store: &mut (impl PropertyStore + ?Sized)) -> Result<(), HostError> {
        let name = self.name.as_str();
        store.set_player_property(
            name,
            keys::PLAYER_TEAM_ID,
            PropertyValue::from(index_to_code(self.team_id)),
        )?;
        store.set_player_property(
            name,
            keys::PLAYER_VOTE_A,
            PropertyValue::from(index_to_code(self.vote_a)),
        )?;
        store.set_player_property(
            name,
            keys::PLAYER_VOTE_B,
            PropertyValue::from(index_to_code(self.vote_b)),
        )?;
        store.set_player_property(
            name,
            keys::PLAYER_ROLE,
            PropertyValue::from(self.role.code() as i64),
        )
    }

    pub fn load_from_host(&mut self, store: &(impl PropertyStore + ?Sized), team_count: usize) -> bool {
        let read = |key: &str| {
            store
                .player_property(&self.name, key)
                .and_then(|value| value.as_i64())
        };
        let team = read(keys::PLAYER_TEAM_ID);
        let vote_a = read(keys::PLAYER_VOTE_A);
        let vote_b = read(keys::PLAYER_VOTE_B);
        let role = read(keys::PLAYER_ROLE);
        let found = team.is_some() || vote_a.is_some() || vote_b.is_some() || role.is_some();

        if let Some(code) = team {
            self.team_id = index_from_code(code, team_count);
        }
        if let Some(code) = vote_a {
            self.vote_a = index_from_code(code, team_count);
        }
        if let Some(code) = vote_b {
            self.vote_b = index_from_code(code, team_count);
        }
        if let Some(role) = role.and_then(Role::from_code) {
            self.role = role;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::types::Vec3;

    #[test]
    fn canonical_name_trims_and_lowercases() {
        assert_eq!(canonical_name("  Steve "), "steve");
        assert_eq!(ChallengePlayer::new(" Alex ").name, "Alex");
    }

    #[test]
    fn votes_shift_and_skip_repeats() {
        let mut player = ChallengePlayer::new("Voter");
        assert!(player.cast_vote(2));
        assert!(player.cast_vote(5));
        assert!(player.cast_vote(2));
        assert_eq!((player.vote_a, player.vote_b), (Some(2), Some(5)));
        assert!(!player.cast_vote(2));
        assert_eq!((player.vote_a, player.vote_b), (Some(2), Some(5)));
        assert_eq!(player.votes().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn own_team_cannot_be_voted() {
        let mut player = ChallengePlayer::new("Builder");
        player.team_id = Some(1);
        assert!(!player.cast_vote(1));
        assert_eq!(player.vote_a, None);
    }

    #[test]
    fn switch_cooldown_boundary() {
        let mut player = ChallengePlayer::new("Hopper");
        player.last_team_switch_tick = Some(100);
        assert!(!player.can_switch_team(100 + 600 - 1, 600));
        assert!(player.can_switch_team(100 + 600, 600));

        player.allow_team_change_always = true;
        assert!(player.can_switch_team(101, 600));
        player.allow_team_change_always = false;
        player.role = Role::Admin;
        assert!(player.can_switch_team(101, 600));
    }

    #[test]
    fn first_tock_sample_only_records() {
        let mut player = ChallengePlayer::new("Walker");
        assert!(!player.tock(BlockPos::new(0, 64, 0)));
        assert!(!player.tock(BlockPos::new(0, 64, 0)));
        assert!(player.tock(BlockPos::new(0, 65, 0)));
    }

    #[test]
    fn state_entry_drops_out_of_range_indices() {
        let mut player = ChallengePlayer::new("Loader");
        player.apply_state_entry(
            &PlayerStateEntry {
                r: 3,
                t: 7,
                v: 2,
                x: 9,
            },
            8,
        );
        assert_eq!(player.role, Role::Judge);
        assert_eq!(player.team_id, Some(7));
        assert_eq!(player.vote_b, None);
        assert_eq!(player.to_state_entry().x, -1);
    }

    #[test]
    fn player_scoped_keys_round_trip() {
        let mut host = MemoryHost::new();
        host.connect_player("Saver", Vec3::default());
        let mut player = ChallengePlayer::new("Saver");
        player.team_id = Some(3);
        player.vote_a = Some(1);
        player.role = Role::Player;
        player.save_to_host(&mut host).expect("online player");

        let mut restored = ChallengePlayer::new("Saver");
        assert!(restored.load_from_host(&host, 4));
        assert_eq!(restored.team_id, Some(3));
        assert_eq!(restored.vote_a, Some(1));
        assert_eq!(restored.vote_b, None);
        assert_eq!(restored.role, Role::Player);

        let mut stranger = ChallengePlayer::new("Nobody");
        assert!(!stranger.load_from_host(&host, 4));
    }
}
