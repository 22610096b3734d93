use super::*;

use crate::constants::{
    block_score, item_score, AIR_BLOCK, CHEST_BLOCK, PAD_FLOOR_BLOCK, SCAN_AREAS_PER_TEAM,
    SUCCESS_SOUND,
};
use crate::host::WorldAccess;
use crate::types::ItemStack;

pub fn container_score(items: &[ItemStack]) -> i64 {
    items
        .iter()
        .map(|stack| {
            let amount = stack.amount as i64;
            match item_score(&stack.type_id) {
                Some(points) => points * amount,
                None => block_score(&stack.type_id).map_or(0, |points| points * amount / 2),
            }
        })
        .sum()
}

fn is_chest(world: &(impl WorldAccess + ?Sized), pos: BlockPos) -> bool {
    world.block(pos).as_deref() == Some(CHEST_BLOCK)
}

/// Scores one strip of a team's build volume. Returns `None` when the pad's
/// canary floor cell does not read as the pad floor, which means the area is
/// unloaded or the pad is not laid yet.
pub fn score_strip(world: &(impl WorldAccess + ?Sized), team: &Team, area: u64) -> Option<i64> {
    let canary = team.canary_cell(area)?;
    if world.block(canary).as_deref() != Some(PAD_FLOOR_BLOCK) {
        return None;
    }
    let (min, max) = team.strip_bounds(area)?;

    let mut total = 0i64;
    for x in min.x..=max.x {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                let pos = BlockPos::new(x, y, z);
                let Some(block) = world.block(pos) else {
                    continue;
                };
                if block == AIR_BLOCK {
                    continue;
                }
                // A double chest is counted once, from its west or north half.
                if block == CHEST_BLOCK
                    && !is_chest(world, pos.offset(-1, 0, 0))
                    && !is_chest(world, pos.offset(0, 0, -1))
                {
                    if let Some(items) = world.container_items(pos) {
                        total += container_score(&items);
                    }
                }
                total += block_score(&block).unwrap_or(0);
            }
        }
    }
    Some(total)
}

impl Challenge {
    pub(crate) fn update_count(&mut self, host: &mut impl Host) {
        if self.teams.is_empty() || self.nwb.is_none() {
            return;
        }
        let cycle = self.tick_index % (SCAN_AREAS_PER_TEAM * self.teams.len() as u64);
        let team_index = (cycle / SCAN_AREAS_PER_TEAM) as usize;
        let area = cycle % SCAN_AREAS_PER_TEAM;

        if area == 0 {
            self.active_team_score = 0;
        }
        if self.active_team_score >= 0 {
            match score_strip(host, &self.teams[team_index], area) {
                Some(points) => self.active_team_score += points,
                None => {
                    debug!(team = team_index, area, "scan strip unreadable; pass discarded");
                    self.active_team_score = -1;
                }
            }
        }
        if area == SCAN_AREAS_PER_TEAM - 1 {
            self.apply_scan_result(host, team_index);
        }
    }

    fn apply_scan_result(&mut self, host: &mut impl Host, team_index: usize) {
        let score = self.active_team_score;
        if score < 0 {
            return;
        }
        let previous = self.teams[team_index].block_tally_score;
        if score == previous {
            return;
        }
        if score > previous && previous > 0 {
            for key in self.teams[team_index].members() {
                if let Some(player) = self.player_lookup.get(key).map(|idx| &self.players[*idx]) {
                    if player.connected {
                        host.play_sound(&player.name, SUCCESS_SOUND);
                    }
                }
            }
        }
        self.teams[team_index].block_tally_score = score;
        info!(team = team_index, previous, score, "team score updated");

        let ctx = self.score_context();
        let team = &self.teams[team_index];
        host.set_score(&team.display_name(&ctx), team.effective_score(&ctx));
        self.update_meta_bonuses(host);
        self.save(host);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::host::memory::MemoryHost;

    fn located_team() -> (Team, MemoryHost) {
        let mut team = Team::new(0, 1, 1);
        team.update_location(ANCHOR);
        let mut host = MemoryHost::new();
        lay_floor(&mut host, &team);
        (team, host)
    }

    #[test]
    fn strip_sums_block_scores() {
        let (team, mut host) = located_team();
        let (min, max) = team.strip_bounds(3).expect("located");
        host.blocks.insert(min, "minecraft:diamond_block".to_string());
        host.blocks.insert(max, "minecraft:diamond_block".to_string());
        host.blocks
            .insert(max.offset(0, 0, 1), "minecraft:diamond_block".to_string());
        assert_eq!(score_strip(&host, &team, 3), Some(100));
        assert_eq!(score_strip(&host, &team, 4), Some(50));
        assert_eq!(score_strip(&host, &team, 0), Some(0));
    }

    #[test]
    fn missing_canary_voids_the_strip() {
        let (team, mut host) = located_team();
        let canary = team.canary_cell(5).expect("located");
        host.blocks.remove(&canary);
        assert_eq!(score_strip(&host, &team, 5), None);
        host.blocks.insert(canary, PAD_FLOOR_BLOCK.to_string());
        host.unloaded.insert(canary);
        assert_eq!(score_strip(&host, &team, 5), None);
    }

    #[test]
    fn double_chest_contents_count_once() {
        let (team, mut host) = located_team();
        let (min, _) = team.strip_bounds(0).expect("located");
        let west_half = min.offset(4, 0, 0);
        let east_half = west_half.offset(1, 0, 0);
        let contents = vec![ItemStack::new("minecraft:diamond", 2)];
        for half in [west_half, east_half] {
            host.blocks.insert(half, CHEST_BLOCK.to_string());
            host.containers.insert(half, contents.clone());
        }
        assert_eq!(score_strip(&host, &team, 0), Some(10));
    }

    #[test]
    fn chests_split_across_strips_count_once() {
        let (team, mut host) = located_team();
        let (_, max) = team.strip_bounds(0).expect("located");
        let north_half = BlockPos::new(max.x - 3, max.y - 5, max.z);
        let south_half = north_half.offset(0, 0, 1);
        for half in [north_half, south_half] {
            host.blocks.insert(half, CHEST_BLOCK.to_string());
            host.containers
                .insert(half, vec![ItemStack::new("minecraft:diamond", 1)]);
        }
        let total = score_strip(&host, &team, 0).unwrap_or_default()
            + score_strip(&host, &team, 1).unwrap_or_default();
        assert_eq!(total, 5);
    }

    #[test]
    fn container_items_fall_back_to_half_block_score() {
        assert_eq!(
            container_score(&[
                ItemStack::new("minecraft:diamond", 3),
                ItemStack::new("minecraft:diamond_block", 3),
                ItemStack::new("minecraft:dirt", 64),
            ]),
            15 + 75
        );
    }

    #[test]
    fn full_pass_updates_team_score_and_plays_success_sound() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        for team in challenge.teams().to_vec() {
            lay_floor(&mut host, &team);
        }
        join(&mut challenge, &mut host, "Maker");
        pull_join_lever(&mut challenge, &mut host, "Maker", 1);
        let (min, _) = challenge.teams()[1].build_bounds().expect("located");
        host.blocks.insert(min, "minecraft:diamond_block".to_string());

        // Team 1 owns cycle ticks 16..=31 of each 64-tick cycle.
        let pass_end = |pass: u64| pass * 64 + 31;
        while challenge.tick_index() < pass_end(0) {
            challenge.advance(&mut host);
        }
        assert_eq!(challenge.teams()[1].block_tally_score, 50);
        assert!(host.sounds.iter().all(|(_, sound)| sound != SUCCESS_SOUND));

        host.blocks
            .insert(min.offset(1, 0, 0), "minecraft:diamond_block".to_string());
        while challenge.tick_index() < pass_end(1) {
            challenge.advance(&mut host);
        }
        assert_eq!(challenge.teams()[1].block_tally_score, 100);
        assert!(host
            .sounds
            .contains(&("Maker".to_string(), SUCCESS_SOUND.to_string())));
        assert!(host.scoreboard.values().any(|score| *score == 100));
    }

    #[test]
    fn unreadable_strip_keeps_the_previous_score() {
        let (mut challenge, mut host) = anchored(BoardSize::Small);
        for team in challenge.teams().to_vec() {
            lay_floor(&mut host, &team);
        }
        challenge.teams[0].block_tally_score = 40;
        let canary = challenge.teams()[0].canary_cell(7).expect("located");
        host.unloaded.insert(canary);
        while challenge.tick_index() < 64 + 15 {
            challenge.advance(&mut host);
        }
        assert_eq!(challenge.teams()[0].block_tally_score, 40);
        assert_eq!(challenge.active_team_score(), -1);
    }
}
