// Match lifecycle and the fixed-tick-rate world simulation.
//
// `start_match` loads the pinned map, generates perimeter spawn points, and
// places every lobby player (plus bot fill, if enabled) around the arena
// edge. `tick` runs the nine-step per-tick pipeline: stale-duel cleanup,
// safe-zone shrink, per-entity steering, collision resolution, out-of-zone
// and idle fail-safes, auto-pairing nearby entities into duels, and
// end-of-match detection. Snapshot assembly/broadcast is the authority's job.

use crate::domain::map::MapDocument;
use crate::domain::rng::seeded_rng;
use crate::domain::state::{LobbyState, MatchEntity, MatchState};
use crate::domain::systems::{apply_shrink, check_idle, check_out_of_zone, resolve_collisions, step_entity_velocity};
use crate::domain::{npc_id, PlayerId};
use crate::use_cases::duel::{DuelBroker, DUEL_COOLDOWN_SECS};
use crate::use_cases::eliminator;
use crate::use_cases::minigames::Registry;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::time::Instant;

/// Number of bots added to fill the arena when the lobby has NPCs enabled.
pub const NPC_FILL_COUNT: usize = 2;
/// Distance at which two nearby, idle entities are auto-paired into a duel.
pub const AUTO_DUEL_RANGE: f32 = 44.0;
/// Cooldown after any duel starts before the next auto-pairing scan runs.
pub const AUTO_DUEL_SCAN_INTERVAL: f32 = 0.5;
const DT: f32 = 1.0 / 15.0;

#[derive(Debug)]
pub enum MatchStartError {
    MapUnreadable(String),
    MapInvalid(String),
}

pub fn start_match(
    lobby: &LobbyState,
    map_dir: &Path,
    seed: String,
) -> Result<(MatchState, Vec<(PlayerId, (f32, f32))>), MatchStartError> {
    let path = map_dir.join(format!("{}.json", lobby.map_name));
    let raw = std::fs::read_to_string(&path).map_err(|e| MatchStartError::MapUnreadable(e.to_string()))?;
    let doc: MapDocument = serde_json::from_str(&raw).map_err(|e| MatchStartError::MapInvalid(e.to_string()))?;

    let bounds = doc.bounds();
    let colliders = doc.colliders();

    let human_count = lobby.players.len();
    let npc_count = if lobby.allow_npc { NPC_FILL_COUNT } else { 0 };
    let total = human_count + npc_count;

    let spawns = crate::domain::map::perimeter_spawn_points(
        bounds,
        crate::domain::map::DEFAULT_SPAWN_MARGIN,
        total,
        &seed,
    );

    let center = (bounds.0 / 2.0, bounds.1 / 2.0);
    let mut state = MatchState::new(seed, bounds, colliders);
    let mut assignments = Vec::with_capacity(total);

    for (i, player) in lobby.players.iter().enumerate() {
        let pos = spawns.get(i).copied().unwrap_or(center);
        state.entities.insert(
            player.player_id.clone(),
            MatchEntity {
                player_id: player.player_id.clone(),
                pos,
                vel: (0.0, 0.0),
                char_name: player.char_name.clone(),
                is_npc: false,
                display_name: player.name.clone(),
                outside_timer: 0.0,
                wander: None,
                idle_timer: 0.0,
            },
        );
        assignments.push((player.player_id.clone(), pos));
    }

    for i in 0..npc_count {
        let id = npc_id(i);
        let pos = spawns.get(human_count + i).copied().unwrap_or(center);
        state.entities.insert(
            id.clone(),
            MatchEntity {
                player_id: id.clone(),
                pos,
                vel: (0.0, 0.0),
                char_name: "default".to_string(),
                is_npc: true,
                display_name: format!("Bot {}", i + 1),
                outside_timer: 0.0,
                wander: None,
                idle_timer: 0.0,
            },
        );
        assignments.push((id, pos));
    }

    Ok((state, assignments))
}

#[derive(Debug, Default)]
pub struct TickEvents {
    pub eliminated: Vec<PlayerId>,
    pub duels_started: Vec<(PlayerId, PlayerId)>,
    pub match_ended: Option<MatchEndReason>,
}

#[derive(Debug, Clone, Copy)]
pub enum MatchEndReason {
    OneHumanRemains,
    NoHumansRemain,
}

/// Runs one simulation tick, mutating `state` in place. `broker` is consulted
/// to skip auto-pairing entities already in a duel.
pub fn tick(state: &mut MatchState, broker: &mut DuelBroker, registry: &Registry, now: Instant) -> TickEvents {
    let mut events = TickEvents::default();
    if !state.active {
        return events;
    }
    state.tick += 1;

    let (elapsed, radius) = apply_shrink(
        state.shrink_elapsed,
        state.safe_radius,
        DT,
        state.shrink_delay,
        state.shrink_rate,
        state.safe_radius_min,
    );
    state.shrink_elapsed = elapsed;
    state.safe_radius = radius;

    if state.duel_cooldown > 0.0 {
        state.duel_cooldown = (state.duel_cooldown - DT).max(0.0);
    }

    let tick_seed = format!("{}:{}", state.seed, state.tick);
    let mut rng = ChaCha8Rng::seed_from_u64(seed_rng_u64(&tick_seed));

    let ids: Vec<PlayerId> = state.entities.keys().cloned().collect();
    for id in &ids {
        // Duelists are frozen in place and exempt from the safe-zone/idle
        // fail-safes until their duel resolves.
        if broker.is_busy(id) {
            if let Some(entity) = state.entities.get_mut(id) {
                entity.vel = (0.0, 0.0);
            }
            continue;
        }

        let input = state.inputs.get(id).copied();
        let (safe_center, safe_radius, map_bounds, colliders) =
            (state.safe_center, state.safe_radius, state.map_bounds, state.colliders.clone());
        let Some(entity) = state.entities.get_mut(id) else { continue };
        step_entity_velocity(entity, input, safe_center, safe_radius, map_bounds, DT, &mut rng);
        let new_pos = resolve_collisions(entity.pos, entity.vel, DT, &colliders, map_bounds);
        entity.pos = new_pos;

        let (timer, eliminate_zone) = check_out_of_zone(entity.pos, safe_center, safe_radius, entity.outside_timer, DT);
        entity.outside_timer = timer;

        let eliminate_idle = if entity.is_npc {
            let speed = entity.speed();
            let (timer, should) = check_idle(speed, entity.idle_timer, DT);
            entity.idle_timer = timer;
            should
        } else {
            false
        };

        if eliminate_zone || eliminate_idle {
            events.eliminated.push(id.clone());
        }
    }

    for id in &events.eliminated {
        eliminator::eliminate(state, id);
        if let Some(duel_id) = broker.abandon(id) {
            let _ = duel_id;
        }
    }

    state.auto_duel_timer += DT;
    if state.auto_duel_timer >= AUTO_DUEL_SCAN_INTERVAL {
        state.auto_duel_timer = 0.0;
        // Only one duel runs in the arena at a time; skip the scan entirely
        // while one is active or the post-duel cooldown hasn't elapsed.
        if state.duel_cooldown <= 0.0 && !broker.has_active_duel() {
            let candidates: Vec<PlayerId> = state.entities.keys().cloned().collect();
            'scan: for i in 0..candidates.len() {
                for j in (i + 1)..candidates.len() {
                    let a = &candidates[i];
                    let b = &candidates[j];
                    if broker.is_busy(a) || broker.is_busy(b) {
                        continue;
                    }
                    let (Some(pa), Some(pb)) = (state.entities.get(a), state.entities.get(b)) else { continue };
                    let d = ((pa.pos.0 - pb.pos.0).powi(2) + (pa.pos.1 - pb.pos.1).powi(2)).sqrt();
                    if d <= AUTO_DUEL_RANGE {
                        let duel_id: crate::domain::DuelId =
                            std::sync::Arc::from(format!("duel-{}-{}-{}", state.tick, a, b));
                        if broker.auto_pair(a, b, &state.seed, state.tick, registry, duel_id, now).is_some() {
                            state.duel_cooldown = DUEL_COOLDOWN_SECS;
                            events.duels_started.push((a.clone(), b.clone()));
                            break 'scan;
                        }
                    }
                }
            }
        }
    }

    let remaining_humans = state.remaining_humans();
    let remaining_bots = state.remaining_bots();
    let match_ended = if remaining_humans == 0 {
        Some(MatchEndReason::NoHumansRemain)
    } else if remaining_humans == 1 && remaining_bots == 0 {
        Some(MatchEndReason::OneHumanRemains)
    } else {
        None
    };
    if let Some(reason) = match_ended {
        state.active = false;
        events.match_ended = Some(reason);
    }

    events
}

fn seed_rng_u64(seed: &str) -> u64 {
    let mut rng = seeded_rng(&[seed]);
    rand::RngCore::next_u64(&mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::map::Rect;

    #[test]
    fn match_ends_when_one_entity_remains() {
        let mut state = MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new());
        state.entities.insert(
            std::sync::Arc::from("p1"),
            MatchEntity {
                player_id: std::sync::Arc::from("p1"),
                pos: (500.0, 500.0),
                vel: (0.0, 0.0),
                char_name: "default".into(),
                is_npc: false,
                display_name: "p1".into(),
                outside_timer: 0.0,
                wander: None,
                idle_timer: 0.0,
            },
        );
        let mut broker = DuelBroker::default();
        let registry = Registry::load(None);
        let events = tick(&mut state, &mut broker, &registry, Instant::now());
        assert!(!state.active);
        assert!(matches!(events.match_ended, Some(MatchEndReason::OneHumanRemains)));
    }

    #[test]
    fn nearby_entities_get_auto_paired_into_a_duel() {
        let mut state = MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new());
        for (id, pos) in [("a", (500.0, 500.0)), ("b", (510.0, 500.0)), ("c", (520.0, 500.0))] {
            state.entities.insert(
                std::sync::Arc::from(id),
                MatchEntity {
                    player_id: std::sync::Arc::from(id),
                    pos,
                    vel: (0.0, 0.0),
                    char_name: "default".into(),
                    is_npc: false,
                    display_name: id.into(),
                    outside_timer: 0.0,
                    wander: None,
                    idle_timer: 0.0,
                },
            );
        }
        state.auto_duel_timer = AUTO_DUEL_SCAN_INTERVAL;
        let mut broker = DuelBroker::default();
        let registry = Registry::load(None);
        let events = tick(&mut state, &mut broker, &registry, Instant::now());
        assert!(!events.duels_started.is_empty());
    }

    fn entity(id: &str, pos: (f32, f32), is_npc: bool) -> MatchEntity {
        MatchEntity {
            player_id: std::sync::Arc::from(id),
            pos,
            vel: (0.0, 0.0),
            char_name: "default".into(),
            is_npc,
            display_name: id.into(),
            outside_timer: 0.0,
            wander: None,
            idle_timer: 0.0,
        }
    }

    #[test]
    fn match_ends_when_no_humans_remain_even_with_bots_alive() {
        let mut state = MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new());
        state.entities.insert(std::sync::Arc::from("npc-0"), entity("npc-0", (500.0, 500.0), true));
        let mut broker = DuelBroker::default();
        let registry = Registry::load(None);
        let events = tick(&mut state, &mut broker, &registry, Instant::now());
        assert!(!state.active);
        assert!(matches!(events.match_ended, Some(MatchEndReason::NoHumansRemain)));
    }

    #[test]
    fn match_does_not_end_with_one_human_and_a_bot_remaining() {
        let mut state = MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new());
        state.entities.insert(std::sync::Arc::from("p1"), entity("p1", (500.0, 500.0), false));
        state.entities.insert(std::sync::Arc::from("npc-0"), entity("npc-0", (100.0, 100.0), true));
        let mut broker = DuelBroker::default();
        let registry = Registry::load(None);
        let events = tick(&mut state, &mut broker, &registry, Instant::now());
        assert!(state.active);
        assert!(events.match_ended.is_none());
    }

    #[test]
    fn busy_duelists_are_frozen_and_skip_zone_checks() {
        let mut state = MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new());
        let a: PlayerId = std::sync::Arc::from("a");
        let b: PlayerId = std::sync::Arc::from("b");
        state.entities.insert(a.clone(), entity("a", (-5000.0, -5000.0), false));
        state.entities.insert(b.clone(), entity("b", (500.0, 500.0), false));
        state.inputs.insert(a.clone(), (1.0, 0.0));

        let mut broker = DuelBroker::default();
        let registry = Registry::load(None);
        let duel_id: crate::domain::DuelId = std::sync::Arc::from("duel-x");
        broker.auto_pair(&a, &b, "seed", 0, &registry, duel_id, Instant::now()).unwrap();

        let events = tick(&mut state, &mut broker, &registry, Instant::now());
        assert!(events.eliminated.is_empty());
        let entity_a = &state.entities[&a];
        assert_eq!(entity_a.pos, (-5000.0, -5000.0));
        assert_eq!(entity_a.vel, (0.0, 0.0));
    }

    #[test]
    fn unused_rect_import_guard() {
        let _ = Rect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 };
    }
}
