use crate::constants::{
    ARENA_SIZE_X, ARENA_SIZE_Z, GRID_HOLE_SIZE, GRID_HOLE_START, GRID_SIDE, MAX_TEAM_SLOTS,
};
use crate::types::{BlockPos, Vec3};

pub fn team_index_from_slot(slot: usize) -> Option<usize> {
    let team = match slot {
        0 => 16,
        1 => 17,
        2 => 12,
        3 => 18,
        4 => 19,
        5 => 20,
        6 => 21,
        7 => 8,
        8 => 4,
        9 => 1,
        10 => 9,
        11 => 22,
        12 => 23,
        13 => 0,
        14 => 5,
        15 => 13,
        16 => 15,
        17 => 7,
        18 => 2,
        19 => 24,
        20 => 25,
        21 => 11,
        22 => 3,
        23 => 6,
        24 => 10,
        25 => 26,
        26 => 27,
        27 => 28,
        28 => 29,
        29 => 14,
        30 => 30,
        31 => 31,
        _ => return None,
    };
    Some(team)
}

fn is_hole(col: i32, row: i32) -> bool {
    let hole = GRID_HOLE_START..GRID_HOLE_START + GRID_HOLE_SIZE;
    hole.contains(&col) && hole.contains(&row)
}

pub fn slot_cell(slot: usize) -> Option<(i32, i32)> {
    if slot >= MAX_TEAM_SLOTS {
        return None;
    }
    let mut remaining = slot;
    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            if is_hole(col, row) {
                continue;
            }
            if remaining == 0 {
                return Some((col, row));
            }
            remaining -= 1;
        }
    }
    None
}

pub fn team_cells(team_count: usize) -> Vec<(usize, i32, i32)> {
    (0..MAX_TEAM_SLOTS)
        .filter_map(|slot| {
            let team = team_index_from_slot(slot)?;
            if team >= team_count {
                return None;
            }
            let (col, row) = slot_cell(slot)?;
            Some((team, col, row))
        })
        .collect()
}

pub fn arena_extent(anchor: BlockPos) -> (BlockPos, BlockPos) {
    (
        anchor,
        anchor.offset(ARENA_SIZE_X - 1, 0, ARENA_SIZE_Z - 1),
    )
}

pub fn arena_centre(anchor: BlockPos) -> BlockPos {
    anchor.offset(ARENA_SIZE_X / 2, 1, ARENA_SIZE_Z / 2)
}

pub fn arena_centre_point(anchor: BlockPos) -> Vec3 {
    arena_centre(anchor).center()
}
