//! Feature blocks shared by the per-role encoders.
//!
//! Offsets are normalized by the window size and distances are the length of
//! the normalized offset. Top-K blocks are sorted nearest first; missing
//! slots are filled with the block's sentinel so downstream models see a
//! consistent "far / none" value.

use crate::snapshot::{Body, Unit, WorldSnapshot};
use crate::types::{Size, Vec2};

/// Divisor for the velocities of entities other than the owner.
pub const GENERIC_VELOCITY_DIVISOR: f64 = 10.0;

/// Missing bullet slot: `[dx, dy, dist, vx, vy]`.
pub const BULLET_PAD: [f64; 5] = [1.0, 1.0, 2.0, 0.0, 0.0];

/// Missing moving-target slot (enemy or companion with velocity).
pub const MOVING_TARGET_PAD: [f64; 5] = [0.0, 0.0, 2.0, 0.0, 0.0];

/// Missing static-target slot `[dx, dy, dist]`.
pub const STATIC_TARGET_PAD: [f64; 3] = [0.0, 0.0, 3.0];

/// Missing neighbouring-companion slot `[dx, dy, dist]`.
pub const COMPANION_PAD: [f64; 3] = [1.0, 1.0, 2.0];

/// Missing player, position-only.
pub const PLAYER_PAD: [f64; 3] = [0.0, 0.0, 3.0];

/// Missing player, with velocity.
pub const PLAYER_MOTION_PAD: [f64; 5] = [0.0, 0.0, 3.0, 0.0, 0.0];

/// Missing boss: `[dx, dy, dist, present]`.
pub const BOSS_PAD: [f64; 4] = [0.0, 0.0, 3.0, 0.0];

/// Missing waypoint `[dx, dy, dist]`.
pub const WAYPOINT_PAD: [f64; 3] = [0.0, 0.0, 3.0];

/// Obstacle distance feature when there is no obstacle.
pub const NO_OBSTACLE: f64 = 1.0;

/// Player distance feature when there is no player.
pub const NO_PLAYER_DISTANCE: f64 = 3.0;

/// Normalized offset and distance from `origin` to `target`.
fn relative(origin: Vec2, target: Vec2, window: Size) -> (f64, f64, f64) {
    let n = window.normalize(target - origin);
    (n.x, n.y, n.length())
}

/// `[x, y, vx, vy]` of the owner relative to its bounds.
pub fn push_self(out: &mut Vec<f64>, owner: &Unit, world: &WorldSnapshot, velocity_divisor: f64) {
    push_position(out, owner, world);
    out.push(owner.velocity().x / velocity_divisor);
    out.push(owner.velocity().y / velocity_divisor);
}

/// `[x, y]` of the owner relative to its bounds.
pub fn push_position(out: &mut Vec<f64>, owner: &Unit, world: &WorldSnapshot) {
    let p = owner.position();
    out.push((p.x - world.bounds.left()) / world.window.width);
    out.push((p.y - world.bounds.top()) / world.window.height);
}

/// Distances to the left, right, top and bottom walls.
pub fn push_walls(out: &mut Vec<f64>, owner: &Unit, world: &WorldSnapshot) {
    let p = owner.position();
    let b = world.bounds;
    out.push((p.x - b.left()) / world.window.width);
    out.push((b.right() - p.x) / world.window.width);
    out.push((p.y - b.top()) / world.window.height);
    out.push((b.bottom() - p.y) / world.window.height);
}

/// The `k` nearest bodies, five features each: `[dx, dy, dist, vx, vy]`.
pub fn push_nearest_moving<I>(
    out: &mut Vec<f64>,
    origin: Vec2,
    bodies: I,
    k: usize,
    window: Size,
    pad: &[f64; 5],
) where
    I: IntoIterator<Item = Body>,
{
    let nearest = nearest_k(origin, bodies, k);
    for slot in 0..k {
        match nearest.get(slot) {
            Some(body) => {
                let (dx, dy, dist) = relative(origin, body.position, window);
                out.extend([
                    dx,
                    dy,
                    dist,
                    body.velocity.x / GENERIC_VELOCITY_DIVISOR,
                    body.velocity.y / GENERIC_VELOCITY_DIVISOR,
                ]);
            }
            None => out.extend_from_slice(pad),
        }
    }
}

/// The `k` nearest positions, three features each: `[dx, dy, dist]`.
pub fn push_nearest_static<I>(
    out: &mut Vec<f64>,
    origin: Vec2,
    bodies: I,
    k: usize,
    window: Size,
    pad: &[f64; 3],
) where
    I: IntoIterator<Item = Body>,
{
    let nearest = nearest_k(origin, bodies, k);
    for slot in 0..k {
        match nearest.get(slot) {
            Some(body) => {
                let (dx, dy, dist) = relative(origin, body.position, window);
                out.extend([dx, dy, dist]);
            }
            None => out.extend_from_slice(pad),
        }
    }
}

/// `[dx, dy, dist]` to `target`, or the pad.
pub fn push_target(
    out: &mut Vec<f64>,
    origin: Vec2,
    target: Option<Vec2>,
    window: Size,
    pad: &[f64; 3],
) {
    match target {
        Some(t) => {
            let (dx, dy, dist) = relative(origin, t, window);
            out.extend([dx, dy, dist]);
        }
        None => out.extend_from_slice(pad),
    }
}

/// `[dx, dy, dist, vx, vy]` to `target`, or the pad.
pub fn push_target_motion(
    out: &mut Vec<f64>,
    origin: Vec2,
    target: Option<&Unit>,
    window: Size,
    pad: &[f64; 5],
) {
    match target {
        Some(t) => {
            let (dx, dy, dist) = relative(origin, t.position(), window);
            out.extend([
                dx,
                dy,
                dist,
                t.velocity().x / GENERIC_VELOCITY_DIVISOR,
                t.velocity().y / GENERIC_VELOCITY_DIVISOR,
            ]);
        }
        None => out.extend_from_slice(pad),
    }
}

/// Normalized distance from `origin` to `target`, or `missing`.
pub fn distance_or(origin: Vec2, target: Option<Vec2>, window: Size, missing: f64) -> f64 {
    target.map_or(missing, |t| relative(origin, t, window).2)
}

/// Bodies of the enemies plus the boss, if any.
pub fn hostile_bodies(world: &WorldSnapshot) -> impl Iterator<Item = Body> + '_ {
    world
        .enemies
        .iter()
        .chain(world.boss.iter())
        .map(|u| u.body)
}

/// Bodies of the other companions (the owner is recognized by position).
pub fn other_companions<'a>(
    owner: &'a Unit,
    world: &'a WorldSnapshot,
) -> impl Iterator<Item = Body> + 'a {
    world
        .companions
        .iter()
        .filter(move |c| c.position() != owner.position())
        .map(|c| c.body)
}

/// Sorts by distance from `origin` (ascending) and keeps the first `k`.
pub fn nearest_k<I>(origin: Vec2, bodies: I, k: usize) -> Vec<Body>
where
    I: IntoIterator<Item = Body>,
{
    let mut all: Vec<(f64, Body)> = bodies
        .into_iter()
        .map(|b| (origin.distance_to(&b.position), b))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0));
    all.into_iter().take(k).map(|(_, b)| b).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;

    fn world() -> WorldSnapshot {
        WorldSnapshot::empty(Size::new(1000.0, 500.0))
    }

    #[test]
    fn nearest_k_sorts_and_truncates() {
        let bodies = [
            Body::new(Vec2::new(30.0, 0.0), Vec2::zero()),
            Body::new(Vec2::new(10.0, 0.0), Vec2::zero()),
            Body::new(Vec2::new(20.0, 0.0), Vec2::zero()),
        ];
        let got = nearest_k(Vec2::zero(), bodies, 2);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].position.x, 10.0);
        assert_eq!(got[1].position.x, 20.0);
    }

    #[test]
    fn moving_block_pads_missing_slots() {
        let mut out = Vec::new();
        let one = [Body::new(Vec2::new(100.0, 0.0), Vec2::new(5.0, 0.0))];
        push_nearest_moving(&mut out, Vec2::zero(), one, 3, world().window, &BULLET_PAD);
        assert_eq!(out.len(), 15);
        assert_eq!(&out[..5], &[0.1, 0.0, 0.1, 0.5, 0.0]);
        assert_eq!(&out[5..10], &BULLET_PAD);
        assert_eq!(&out[10..15], &BULLET_PAD);
    }

    #[test]
    fn walls_relative_to_bounds() {
        let mut w = world();
        w.bounds = Rect::new(100.0, 100.0, 300.0, 200.0);
        let owner = Unit::new(Vec2::new(200.0, 150.0), 1.0);
        let mut out = Vec::new();
        push_walls(&mut out, &owner, &w);
        assert_eq!(out, vec![0.1, 0.2, 0.1, 0.3]);
    }

    #[test]
    fn other_companions_skips_owner() {
        let owner = Unit::new(Vec2::new(10.0, 10.0), 1.0);
        let mut w = world();
        w.companions = vec![owner, Unit::new(Vec2::new(50.0, 10.0), 1.0)];
        assert_eq!(other_companions(&owner, &w).count(), 1);
    }
}
