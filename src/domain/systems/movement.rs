// Bot wander + human input steering, axis-separated collider resolution,
// and map-bounds clamping.

use crate::domain::map::Rect;
use crate::domain::state::{MatchEntity, WanderState};
use rand::Rng;

pub const SPEED_BASE: f32 = 110.0;
pub const BODY_W: f32 = 10.0;
pub const BODY_H: f32 = 6.0;
const WANDER_JITTER: f32 = 4.0;
const WANDER_MIN_RADIUS: f32 = 80.0;
const WANDER_SPEED_FACTOR: f32 = 0.7;
const WANDER_BLEND: f32 = 0.12;
const WANDER_STALL_SPEED: f32 = 6.0;

/// Computes the desired velocity for one entity this tick and writes it to
/// `entity.vel`. Does not move the entity; that's `resolve_collisions`.
pub fn step_entity_velocity(
    entity: &mut MatchEntity,
    input: Option<(f32, f32)>,
    safe_center: (f32, f32),
    safe_radius: f32,
    map_bounds: (f32, f32),
    dt: f32,
    rng: &mut impl Rng,
) {
    if entity.is_npc {
        step_wander(entity, safe_center, safe_radius, map_bounds, dt, rng);
    } else {
        let (ix, iy) = input.unwrap_or((0.0, 0.0));
        entity.vel = (ix.clamp(-1.0, 1.0) * SPEED_BASE, iy.clamp(-1.0, 1.0) * SPEED_BASE);
    }
}

fn step_wander(
    entity: &mut MatchEntity,
    safe_center: (f32, f32),
    safe_radius: f32,
    map_bounds: (f32, f32),
    dt: f32,
    rng: &mut impl Rng,
) {
    let (mw, mh) = map_bounds;
    let max_radius = (0.65 * safe_radius).min(0.45 * mw.min(mh));
    let wander = entity.wander.get_or_insert(WanderState {
        angle: rng.gen_range(0.0..std::f32::consts::TAU),
        radius: WANDER_MIN_RADIUS,
        retarget_timer: rng.gen_range(1.8..3.2),
    });

    wander.retarget_timer -= dt;
    if wander.retarget_timer <= 0.0 {
        wander.angle += rng.gen_range(-0.22..0.22);
        wander.radius = (wander.radius + rng.gen_range(-18.0..18.0)).clamp(WANDER_MIN_RADIUS, max_radius.max(WANDER_MIN_RADIUS));
        wander.retarget_timer = rng.gen_range(1.8..3.2);
    }

    let anchor = (
        safe_center.0 + wander.angle.cos() * wander.radius,
        safe_center.1 + wander.angle.sin() * wander.radius,
    );
    let dist_from_center = dist(entity.pos, safe_center);
    let dir = if dist_from_center > 0.88 * safe_radius {
        (safe_center.0 - entity.pos.0, safe_center.1 - entity.pos.1)
    } else {
        (anchor.0 - entity.pos.0, anchor.1 - entity.pos.1)
    };

    let len = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    let unit = if len > 1e-6 { (dir.0 / len, dir.1 / len) } else { (0.0, 0.0) };

    let desired = (
        unit.0 * SPEED_BASE * WANDER_SPEED_FACTOR + rng.gen_range(-WANDER_JITTER..WANDER_JITTER),
        unit.1 * SPEED_BASE * WANDER_SPEED_FACTOR + rng.gen_range(-WANDER_JITTER..WANDER_JITTER),
    );

    let blended = (
        entity.vel.0 * (1.0 - WANDER_BLEND) + desired.0 * WANDER_BLEND,
        entity.vel.1 * (1.0 - WANDER_BLEND) + desired.1 * WANDER_BLEND,
    );

    let speed = (blended.0 * blended.0 + blended.1 * blended.1).sqrt();
    entity.vel = if speed < WANDER_STALL_SPEED {
        let impulse_angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        (
            blended.0 + impulse_angle.cos() * WANDER_STALL_SPEED,
            blended.1 + impulse_angle.sin() * WANDER_STALL_SPEED,
        )
    } else {
        blended
    };
}

fn dist(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Axis-aligned body rect anchored midbottom at `pos`.
fn body_rect(pos: (f32, f32)) -> Rect {
    Rect {
        x: pos.0 - BODY_W / 2.0,
        y: pos.1 - BODY_H,
        w: BODY_W,
        h: BODY_H,
    }
}

/// Moves `pos` by `vel * dt`, axis-separated against `colliders`, then clamps
/// the body AABB inside `map_bounds`.
pub fn resolve_collisions(
    pos: (f32, f32),
    vel: (f32, f32),
    dt: f32,
    colliders: &[Rect],
    map_bounds: (f32, f32),
) -> (f32, f32) {
    let mut x = pos.0 + vel.0 * dt;
    let y0 = pos.1;
    for c in colliders {
        let body = body_rect((x, y0));
        if body.intersects(c) {
            if vel.0 > 0.0 {
                x = c.left() - BODY_W / 2.0;
            } else if vel.0 < 0.0 {
                x = c.right() + BODY_W / 2.0;
            }
        }
    }

    let mut y = y0 + vel.1 * dt;
    for c in colliders {
        let body = body_rect((x, y));
        if body.intersects(c) {
            if vel.1 > 0.0 {
                y = c.top();
            } else if vel.1 < 0.0 {
                y = c.bottom() + BODY_H;
            }
        }
    }

    let (mw, mh) = map_bounds;
    x = x.clamp(BODY_W / 2.0, (mw - BODY_W / 2.0).max(BODY_W / 2.0));
    y = y.clamp(BODY_H, mh.max(BODY_H));
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand::SeedableRng;

    fn human(id: &str) -> MatchEntity {
        MatchEntity {
            player_id: std::sync::Arc::from(id),
            pos: (50.0, 50.0),
            vel: (0.0, 0.0),
            char_name: "default".into(),
            is_npc: false,
            display_name: id.into(),
            outside_timer: 0.0,
            wander: None,
            idle_timer: 0.0,
        }
    }

    #[test]
    fn human_velocity_scales_and_clamps_input() {
        let mut e = human("p1");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        step_entity_velocity(&mut e, Some((2.0, -2.0)), (500.0, 500.0), 500.0, (1000.0, 1000.0), 1.0 / 15.0, &mut rng);
        assert_eq!(e.vel, (SPEED_BASE, -SPEED_BASE));
    }

    #[test]
    fn collision_stops_entity_at_collider_edge() {
        let colliders = vec![Rect { x: 100.0, y: 0.0, w: 50.0, h: 50.0 }];
        let pos = resolve_collisions((80.0, 20.0), (200.0, 0.0), 1.0, &colliders, (1000.0, 1000.0));
        assert!(pos.0 <= 100.0 - BODY_W / 2.0 + 0.01);
    }

    #[test]
    fn body_clamped_inside_map_bounds() {
        let pos = resolve_collisions((5.0, 5.0), (-500.0, -500.0), 1.0, &[], (1000.0, 1000.0));
        assert_eq!(pos, (BODY_W / 2.0, BODY_H));
    }
}
