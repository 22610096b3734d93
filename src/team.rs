use crate::constants::{
    BUILD_SIZE_X, BUILD_SIZE_Y, BUILD_SIZE_Z, CELL_SIZE_X, CELL_SIZE_Z, KEEP_OUT_HEADROOM, PAD_BORDER,
    PAD_SIZE_X, PAD_SIZE_Z, PAD_SPACING, SCAN_AREAS_PER_TEAM, STRIP_DEPTH, TEAM_NAME_MAX_LEN,
    TEAM_NAME_MIN_LEN,
};
use crate::persistence::TeamSaveData;
use crate::types::{BlockPos, Phase, ScoringMode, Vec3};

const QUARTILE_GLYPHS: [&str; 4] = ["\u{2588}", "\u{2593}", "\u{2592}", "\u{2591}"];
const RANK_GLYPHS: [&str; 3] = ["\u{a7}6\u{2605}", "\u{a7}7\u{2605}", "\u{a7}c\u{2605}"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreContext {
    pub phase: Phase,
    pub team_count: usize,
    pub scoring_mode: ScoringMode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Team {
    pub index: usize,
    pub name: Option<String>,
    pub block_tally_score: i64,
    pub player_tocks: i64,
    pub votes: i64,
    pub rank_by_vote: Option<usize>,
    pub usage_quartile: Option<usize>,
    pub col: i32,
    pub row: i32,
    members: Vec<String>,
    pad_nwb: Option<BlockPos>,
}

impl Team {
    pub fn new(index: usize, col: i32, row: i32) -> Self {
        Self {
            index,
            name: None,
            block_tally_score: 0,
            player_tocks: 0,
            votes: 0,
            rank_by_vote: None,
            usage_quartile: None,
            col,
            row,
            members: Vec::new(),
            pad_nwb: None,
        }
    }

    pub fn base_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Team {}", self.index + 1))
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn has_member(&self, key: &str) -> bool {
        self.members.iter().any(|member| member == key)
    }

    pub fn add_member(&mut self, key: &str) {
        if !self.has_member(key) {
            self.members.push(key.to_string());
        }
    }

    pub fn remove_member(&mut self, key: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != key);
        before != self.members.len()
    }

    pub fn is_active(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn capped_member_count(&self, exempt: impl Fn(&str) -> bool) -> usize {
        self.members
            .iter()
            .filter(|member| !exempt(member.as_str()))
            .count()
    }

    pub fn update_location(&mut self, anchor: BlockPos) {
        self.pad_nwb = Some(anchor.offset(
            self.col * CELL_SIZE_X + PAD_SPACING / 2,
            0,
            self.row * CELL_SIZE_Z + PAD_SPACING / 2,
        ));
    }

    pub fn pad_nwb(&self) -> Option<BlockPos> {
        self.pad_nwb
    }

    pub fn nwb(&self) -> Option<BlockPos> {
        self.pad_nwb
            .map(|pad| pad.offset(PAD_BORDER, 1, PAD_BORDER))
    }

    pub fn pad_bounds(&self) -> Option<(BlockPos, BlockPos)> {
        self.pad_nwb
            .map(|pad| (pad, pad.offset(PAD_SIZE_X - 1, 0, PAD_SIZE_Z - 1)))
    }

    pub fn build_bounds(&self) -> Option<(BlockPos, BlockPos)> {
        self.nwb().map(|nwb| {
            (
                nwb,
                nwb.offset(BUILD_SIZE_X - 1, BUILD_SIZE_Y - 1, BUILD_SIZE_Z - 1),
            )
        })
    }

    pub fn join_cell(&self) -> Option<BlockPos> {
        self.pad_nwb.map(|pad| pad.offset(PAD_SIZE_X / 2 - 2, 1, 1))
    }

    pub fn options_cell(&self) -> Option<BlockPos> {
        self.pad_nwb.map(|pad| pad.offset(PAD_SIZE_X / 2 + 2, 1, 1))
    }

    pub fn pedestal_cell(&self) -> Option<BlockPos> {
        self.pad_nwb
            .map(|pad| pad.offset(PAD_SIZE_X / 2 - 1, 1, PAD_SIZE_Z - PAD_BORDER + 1))
    }

    pub fn canary_cell(&self, area: u64) -> Option<BlockPos> {
        if area >= SCAN_AREAS_PER_TEAM {
            return None;
        }
        self.pad_nwb
            .map(|pad| pad.offset(0, 0, PAD_BORDER + area as i32 * STRIP_DEPTH))
    }

    pub fn strip_bounds(&self, area: u64) -> Option<(BlockPos, BlockPos)> {
        if area >= SCAN_AREAS_PER_TEAM {
            return None;
        }
        self.nwb().map(|nwb| {
            let start = nwb.offset(0, 0, area as i32 * STRIP_DEPTH);
            (
                start,
                start.offset(BUILD_SIZE_X - 1, BUILD_SIZE_Y - 1, STRIP_DEPTH - 1),
            )
        })
    }

    pub fn keep_out_exit(&self, location: Vec3) -> Option<Vec3> {
        let pad = self.pad_nwb?;
        let x0 = pad.x as f64;
        let z0 = pad.z as f64;
        let x1 = x0 + PAD_SIZE_X as f64;
        let z1 = z0 + PAD_SIZE_Z as f64;
        let y0 = pad.y as f64 - 1.0;
        let y1 = (pad.y + 1 + BUILD_SIZE_Y + KEEP_OUT_HEADROOM) as f64;
        let inside = location.x >= x0
            && location.x < x1
            && location.z >= z0
            && location.z < z1
            && location.y >= y0
            && location.y < y1;
        if !inside {
            return None;
        }

        let candidates = [
            (location.x - x0, Vec3::new(x0 - 0.5, location.y, location.z)),
            (x1 - location.x, Vec3::new(x1 + 0.5, location.y, location.z)),
            (location.z - z0, Vec3::new(location.x, location.y, z0 - 0.5)),
            (z1 - location.z, Vec3::new(location.x, location.y, z1 + 0.5)),
        ];
        candidates
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, exit)| exit)
    }

    pub fn effective_score(&self, ctx: &ScoreContext) -> i64 {
        if ctx.scoring_mode == ScoringMode::VoteOnly {
            return self.votes;
        }

        let tally = self.block_tally_score.max(0) as f64;
        let mut score = tally;
        if ctx.team_count >= 4 {
            score += match self.usage_quartile {
                Some(1) => tally / 4.0,
                Some(2) => tally / 2.0,
                Some(3) => tally,
                _ => 0.0,
            };
        }
        if ctx.phase.is_judging() && ctx.team_count >= 3 {
            score += match self.rank_by_vote {
                Some(0) => tally * 2.0,
                Some(1) => tally,
                Some(2) => tally * 0.5,
                _ => 0.0,
            };
        }
        score.floor() as i64
    }

    pub fn display_name(&self, ctx: &ScoreContext) -> String {
        let mut label = self.base_name();
        if ctx.team_count >= 4 {
            if let Some(glyph) = self.usage_quartile.and_then(|q| QUARTILE_GLYPHS.get(q)) {
                label.push(' ');
                label.push_str(glyph);
            }
        }
        if ctx.phase.is_judging() && ctx.team_count >= 3 {
            if let Some(glyph) = self.rank_by_vote.and_then(|rank| RANK_GLYPHS.get(rank)) {
                label.push(' ');
                label.push_str(glyph);
                label.push_str("\u{a7}r");
            }
            label.push_str(&format!(" ({})", self.votes));
        }
        label
    }

    pub fn rename(&mut self, candidate: &str) -> bool {
        let length = candidate.chars().count();
        if !(TEAM_NAME_MIN_LEN..=TEAM_NAME_MAX_LEN).contains(&length) {
            return false;
        }
        if !candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ')
        {
            return false;
        }
        if self.name.as_deref() == Some(candidate) {
            return false;
        }
        self.name = Some(candidate.to_string());
        true
    }

    pub fn save_data(&self) -> TeamSaveData {
        TeamSaveData {
            n: self.name.clone().unwrap_or_default(),
            s: self.block_tally_score,
            t: self.player_tocks,
        }
    }

    /// Empty or zero fields leave the current value alone, so a stored zero
    /// cannot overwrite a non-zero default.
    pub fn load_from_data(&mut self, data: &TeamSaveData) {
        if !data.n.is_empty() {
            self.name = Some(data.n.clone());
        }
        if data.s != 0 {
            self.block_tally_score = data.s;
        }
        if data.t != 0 {
            self.player_tocks = data.t;
        }
    }
}

/// Ranks the three most-voted teams. A team tied with the one directly above
/// it shares that rank; only the 1st/2nd and 2nd/3rd pairs are compared.
/// Teams without votes stay unranked. Returns whether any rank changed.
pub fn assign_vote_ranks(teams: &mut [Team]) -> bool {
    let mut order: Vec<usize> = (0..teams.len()).filter(|&i| teams[i].votes > 0).collect();
    order.sort_by(|&a, &b| teams[b].votes.cmp(&teams[a].votes).then(a.cmp(&b)));

    let mut ranks: Vec<Option<usize>> = vec![None; teams.len()];
    for (position, &idx) in order.iter().take(3).enumerate() {
        ranks[idx] = Some(position);
    }
    if order.len() > 1 && teams[order[1]].votes == teams[order[0]].votes {
        ranks[order[1]] = ranks[order[0]];
    }
    if order.len() > 2 && teams[order[2]].votes == teams[order[1]].votes {
        ranks[order[2]] = ranks[order[1]];
    }

    let mut changed = false;
    for (team, rank) in teams.iter_mut().zip(ranks) {
        if team.rank_by_vote != rank {
            team.rank_by_vote = rank;
            changed = true;
        }
    }
    changed
}

pub fn assign_usage_quartiles(teams: &mut [Team]) -> bool {
    let mut order: Vec<usize> = (0..teams.len())
        .filter(|&i| {
            let team = &teams[i];
            team.is_active() || (team.block_tally_score != 0 && team.player_tocks > 0)
        })
        .collect();
    order.sort_by(|&a, &b| {
        teams[b]
            .player_tocks
            .cmp(&teams[a].player_tocks)
            .then(a.cmp(&b))
    });

    let mut quartiles: Vec<Option<usize>> = vec![None; teams.len()];
    let count = order.len();
    for (position, &idx) in order.iter().enumerate() {
        quartiles[idx] = Some(position * 4 / count);
    }

    let mut changed = false;
    for (team, quartile) in teams.iter_mut().zip(quartiles) {
        if team.usage_quartile != quartile {
            team.usage_quartile = quartile;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(phase: Phase, team_count: usize) -> ScoreContext {
        ScoreContext {
            phase,
            team_count,
            scoring_mode: ScoringMode::BlockScan,
        }
    }

    fn team_with(index: usize, votes: i64, tocks: i64) -> Team {
        let mut team = Team::new(index, 0, 0);
        team.votes = votes;
        team.player_tocks = tocks;
        team
    }

    #[test]
    fn vote_only_mode_reports_votes_verbatim() {
        let mut team = Team::new(0, 1, 2);
        team.votes = 5;
        team.block_tally_score = 900;
        let context = ScoreContext {
            phase: Phase::Build,
            team_count: 4,
            scoring_mode: ScoringMode::VoteOnly,
        };
        assert_eq!(team.effective_score(&context), 5);
    }

    #[test]
    fn quartile_bonus_applies_with_four_teams() {
        let mut team = Team::new(0, 1, 2);
        team.block_tally_score = 100;
        team.usage_quartile = Some(2);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 4)), 150);
        team.usage_quartile = Some(1);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 4)), 125);
        team.usage_quartile = Some(3);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 4)), 200);
        team.usage_quartile = Some(0);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 4)), 100);
        team.usage_quartile = Some(3);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 3)), 100);
    }

    #[test]
    fn vote_rank_bonus_needs_judging_phase_and_three_teams() {
        let mut team = Team::new(0, 1, 2);
        team.block_tally_score = 100;
        team.rank_by_vote = Some(0);
        team.usage_quartile = Some(3);
        assert_eq!(team.effective_score(&ctx(Phase::Vote, 3)), 300);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 3)), 100);
        assert_eq!(team.effective_score(&ctx(Phase::Post, 2)), 100);
        team.rank_by_vote = Some(2);
        team.usage_quartile = None;
        assert_eq!(team.effective_score(&ctx(Phase::Post, 3)), 150);
    }

    #[test]
    fn negative_tally_clamps_and_fractions_floor() {
        let mut team = Team::new(0, 1, 2);
        team.block_tally_score = -40;
        team.usage_quartile = Some(3);
        assert_eq!(team.effective_score(&ctx(Phase::Vote, 8)), 0);
        team.block_tally_score = 7;
        team.usage_quartile = Some(1);
        assert_eq!(team.effective_score(&ctx(Phase::Build, 8)), 8);
    }

    #[test]
    fn rename_validates_charset_length_and_change() {
        let mut team = Team::new(2, 0, 0);
        assert_eq!(team.base_name(), "Team 3");
        assert!(!team.rename("A"));
        assert!(!team.rename("Way Too Long Name"));
        assert!(!team.rename("Bad!"));
        assert!(team.rename("Red 5"));
        assert!(!team.rename("Red 5"));
        assert_eq!(team.base_name(), "Red 5");
    }

    #[test]
    fn save_data_round_trip_ignores_zero_fields() {
        let mut source = Team::new(0, 0, 0);
        source.rename("Blue");
        source.block_tally_score = 42;
        source.player_tocks = 7;
        let mut restored = Team::new(0, 0, 0);
        restored.load_from_data(&source.save_data());
        assert_eq!(restored.base_name(), "Blue");
        assert_eq!(restored.block_tally_score, 42);
        assert_eq!(restored.player_tocks, 7);

        let mut keeps_current = Team::new(0, 0, 0);
        keeps_current.block_tally_score = 12;
        keeps_current.player_tocks = 3;
        keeps_current.load_from_data(&TeamSaveData {
            n: String::new(),
            s: 0,
            t: 0,
        });
        assert_eq!(keeps_current.block_tally_score, 12);
        assert_eq!(keeps_current.player_tocks, 3);
        assert_eq!(keeps_current.name, None);
    }

    #[test]
    fn vote_ranks_share_ties_with_the_team_above() {
        let mut teams = vec![
            team_with(0, 3, 0),
            team_with(1, 5, 0),
            team_with(2, 5, 0),
            team_with(3, 1, 0),
            team_with(4, 0, 0),
        ];
        assert!(assign_vote_ranks(&mut teams));
        assert_eq!(teams[1].rank_by_vote, Some(0));
        assert_eq!(teams[2].rank_by_vote, Some(0));
        assert_eq!(teams[0].rank_by_vote, Some(2));
        assert_eq!(teams[3].rank_by_vote, None);
        assert_eq!(teams[4].rank_by_vote, None);
        assert!(!assign_vote_ranks(&mut teams));
    }

    #[test]
    fn fourth_tied_team_is_not_ranked() {
        let mut teams: Vec<Team> = (0..4).map(|i| team_with(i, 2, 0)).collect();
        assign_vote_ranks(&mut teams);
        assert_eq!(teams[0].rank_by_vote, Some(0));
        assert_eq!(teams[1].rank_by_vote, Some(0));
        assert_eq!(teams[2].rank_by_vote, Some(0));
        assert_eq!(teams[3].rank_by_vote, None);
    }

    #[test]
    fn usage_quartiles_bucket_eligible_teams_by_tocks() {
        let mut teams: Vec<Team> = (0..5).map(|i| team_with(i, 0, (i as i64 + 1) * 10)).collect();
        for team in teams.iter_mut().take(4) {
            team.add_member(&format!("p{}", team.index));
        }
        assert!(assign_usage_quartiles(&mut teams));
        assert_eq!(teams[3].usage_quartile, Some(0));
        assert_eq!(teams[2].usage_quartile, Some(1));
        assert_eq!(teams[1].usage_quartile, Some(2));
        assert_eq!(teams[0].usage_quartile, Some(3));
        assert_eq!(teams[4].usage_quartile, None);

        teams[4].block_tally_score = 10;
        assert!(assign_usage_quartiles(&mut teams));
        assert_eq!(teams[4].usage_quartile, Some(0));
    }

    #[test]
    fn geometry_follows_the_anchor() {
        let mut team = Team::new(0, 1, 2);
        assert_eq!(team.join_cell(), None);
        team.update_location(BlockPos::new(0, 64, 0));
        let pad = team.pad_nwb().expect("located");
        assert_eq!(pad, BlockPos::new(47, 64, 91));
        assert_eq!(team.nwb(), Some(BlockPos::new(50, 65, 94)));
        assert_eq!(team.canary_cell(0), Some(BlockPos::new(47, 64, 94)));
        assert_eq!(team.canary_cell(16), None);
        let (start, end) = team.strip_bounds(15).expect("strip");
        assert_eq!(start, BlockPos::new(50, 65, 124));
        assert_eq!(end, BlockPos::new(81, 88, 125));
        assert_ne!(team.join_cell(), team.options_cell());
    }

    #[test]
    fn keep_out_exit_uses_nearest_edge() {
        let mut team = Team::new(0, 0, 0);
        team.update_location(BlockPos::new(0, 64, 0));
        assert_eq!(team.keep_out_exit(Vec3::new(0.0, 70.0, 0.0)), None);
        let exit = team
            .keep_out_exit(Vec3::new(5.0, 70.0, 20.0))
            .expect("inside pad");
        assert_eq!(exit, Vec3::new(2.5, 70.0, 20.0));
        let exit = team
            .keep_out_exit(Vec3::new(20.0, 70.0, 39.0))
            .expect("inside pad");
        assert_eq!(exit, Vec3::new(20.0, 70.0, 41.5));
        assert_eq!(team.keep_out_exit(Vec3::new(20.0, 200.0, 20.0)), None);
    }

    #[test]
    fn display_name_decorations() {
        let mut team = Team::new(0, 0, 0);
        team.rename("Red");
        team.usage_quartile = Some(0);
        team.rank_by_vote = Some(1);
        team.votes = 4;
        assert_eq!(team.display_name(&ctx(Phase::Build, 2)), "Red");
        assert_eq!(team.display_name(&ctx(Phase::Build, 4)), "Red \u{2588}");
        assert_eq!(
            team.display_name(&ctx(Phase::Vote, 3)),
            "Red \u{a7}7\u{2605}\u{a7}r (4)"
        );
    }
}
