use crate::constants::{ARENA_SIZE_X, ARENA_SIZE_Z};
use crate::types::{BlockPos, Vec3};

const TRACK_HEIGHT: f64 = 28.0;
const TRACK_OVERHANG: f64 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub from: Vec3,
    pub to: Vec3,
    pub facing_adjust: Vec3,
}

impl Track {
    pub fn new(from: Vec3, to: Vec3, facing_adjust: Vec3) -> Self {
        Self {
            from,
            to,
            facing_adjust,
        }
    }

    pub fn position_at(&self, t: f64) -> Vec3 {
        self.from.lerp(self.to, t.clamp(0.0, 1.0))
    }

    pub fn facing_at(&self, t: f64) -> Vec3 {
        self.position_at(t) + self.facing_adjust
    }
}

pub fn arena_tracks(anchor: BlockPos) -> Vec<Track> {
    let x0 = anchor.x as f64 - TRACK_OVERHANG;
    let z0 = anchor.z as f64 - TRACK_OVERHANG;
    let x1 = (anchor.x + ARENA_SIZE_X) as f64 + TRACK_OVERHANG;
    let z1 = (anchor.z + ARENA_SIZE_Z) as f64 + TRACK_OVERHANG;
    let y = anchor.y as f64 + TRACK_HEIGHT;
    vec![
        Track::new(
            Vec3::new(x0, y, z0),
            Vec3::new(x1, y, z0),
            Vec3::new(0.0, -10.0, 20.0),
        ),
        Track::new(
            Vec3::new(x1, y, z0),
            Vec3::new(x1, y, z1),
            Vec3::new(-20.0, -10.0, 0.0),
        ),
        Track::new(
            Vec3::new(x1, y, z1),
            Vec3::new(x0, y, z1),
            Vec3::new(0.0, -10.0, -20.0),
        ),
    ]
}
