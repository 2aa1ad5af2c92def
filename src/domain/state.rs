// Domain-level entities: lobby, match, and duel bookkeeping.
//
// These types hold pure in-memory state with no tokio/network dependency;
// the use-cases layer mutates them through the functions in `systems` and in
// `use_cases::{lobby, match_sim, duel}`.

use crate::domain::ids::{DuelId, MinigameId, PlayerId};
use crate::domain::map::Rect;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct LobbyPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub char_name: String,
}

/// Multiplayer is pinned to a single map and mode; `set_map`/`set_mode`/
/// `set_allow_npc` are accepted but ignored by the authority.
#[derive(Debug, Clone)]
pub struct LobbyState {
    pub map_name: String,
    pub mode: String,
    pub allow_npc: bool,
    pub host_id: Option<PlayerId>,
    pub players: Vec<LobbyPlayer>,
}

impl Default for LobbyState {
    fn default() -> Self {
        Self {
            map_name: "test_arena".to_string(),
            mode: "tournament".to_string(),
            allow_npc: false,
            host_id: None,
            players: Vec::new(),
        }
    }
}

impl LobbyState {
    pub fn player(&self, id: &str) -> Option<&LobbyPlayer> {
        self.players.iter().find(|p| &*p.player_id == id)
    }

    pub fn player_mut(&mut self, id: &str) -> Option<&mut LobbyPlayer> {
        self.players.iter_mut().find(|p| &*p.player_id == id)
    }

    pub fn is_host(&self, id: &str) -> bool {
        self.host_id.as_deref() == Some(id)
    }
}

/// Per-bot steering memory for the wander behaviour.
#[derive(Debug, Clone, Copy)]
pub struct WanderState {
    pub angle: f32,
    pub radius: f32,
    /// Seconds remaining until the next direction jitter.
    pub retarget_timer: f32,
}

#[derive(Debug, Clone)]
pub struct MatchEntity {
    pub player_id: PlayerId,
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub char_name: String,
    pub is_npc: bool,
    pub display_name: String,
    pub outside_timer: f32,
    pub wander: Option<WanderState>,
    /// Seconds the bot has been moving slower than the idle threshold;
    /// drives the NPC idle fail-safe.
    pub idle_timer: f32,
}

impl MatchEntity {
    pub fn speed(&self) -> f32 {
        (self.vel.0 * self.vel.0 + self.vel.1 * self.vel.1).sqrt()
    }
}

pub struct MatchState {
    pub seed: String,
    pub map_bounds: (f32, f32),
    pub colliders: Vec<Rect>,
    pub entities: HashMap<PlayerId, MatchEntity>,
    pub inputs: HashMap<PlayerId, (f32, f32)>,
    pub tick: u64,
    pub safe_center: (f32, f32),
    pub safe_radius: f32,
    pub safe_radius_min: f32,
    pub shrink_rate: f32,
    pub shrink_delay: f32,
    pub shrink_elapsed: f32,
    pub eliminated_bots: HashSet<PlayerId>,
    pub eliminated_humans: HashSet<PlayerId>,
    pub duel_cooldown: f32,
    pub auto_duel_timer: f32,
    pub active: bool,
}

impl MatchState {
    pub fn new(seed: String, map_bounds: (f32, f32), colliders: Vec<Rect>) -> Self {
        let (w, h) = map_bounds;
        let safe_radius_min = 220.0_f32.max(w.min(h) / 3.0);
        Self {
            seed,
            map_bounds,
            colliders,
            entities: HashMap::new(),
            inputs: HashMap::new(),
            tick: 0,
            safe_center: (w / 2.0, h / 2.0),
            safe_radius: 0.75 * w.max(h),
            safe_radius_min,
            shrink_rate: 8.0,
            shrink_delay: 8.0,
            shrink_elapsed: 0.0,
            eliminated_bots: HashSet::new(),
            eliminated_humans: HashSet::new(),
            duel_cooldown: 0.0,
            auto_duel_timer: 0.0,
            active: true,
        }
    }

    pub fn remaining_humans(&self) -> usize {
        self.entities.values().filter(|e| !e.is_npc).count()
    }

    pub fn remaining_bots(&self) -> usize {
        self.entities.values().filter(|e| e.is_npc).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticipantResult {
    pub entry: Option<String>,
    pub outcome: Option<String>,
}

pub struct DuelRecord {
    pub duel_id: DuelId,
    pub participants: (PlayerId, PlayerId),
    pub wheel: Vec<MinigameId>,
    pub selected: MinigameId,
    pub results: HashMap<PlayerId, ParticipantResult>,
    pub scores: HashMap<PlayerId, u32>,
    pub round: u32,
    pub round_entries: HashMap<PlayerId, String>,
    /// When the current round's answer window opened; reset each time a
    /// round resolves. Starts at `start` for round 1.
    pub round_started_at: Instant,
    pub forced_winner: Option<PlayerId>,
    pub forced_loser: Option<PlayerId>,
    pub start: Instant,
}

impl DuelRecord {
    pub fn involves(&self, id: &str) -> bool {
        &*self.participants.0 == id || &*self.participants.1 == id
    }

    pub fn other(&self, id: &str) -> Option<&PlayerId> {
        if &*self.participants.0 == id {
            Some(&self.participants.1)
        } else if &*self.participants.1 == id {
            Some(&self.participants.0)
        } else {
            None
        }
    }

    pub fn has_npc(&self) -> bool {
        crate::domain::ids::is_bot_id(&self.participants.0) || crate::domain::ids::is_bot_id(&self.participants.1)
    }
}

#[derive(Debug, Clone)]
pub struct DuelRequest {
    pub initiator: PlayerId,
    pub target: PlayerId,
    pub ts: Instant,
}

/// The arbitrated outcome of a duel, handed to the eliminator and the
/// broadcast fabric.
#[derive(Debug, Clone)]
pub struct DuelResult {
    pub duel_id: DuelId,
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub entries: HashMap<PlayerId, ParticipantResult>,
}

/// Requests/duels are keyed by the unordered participant pair; sort so
/// `(a, b)` and `(b, a)` collide on the same key.
pub fn unordered_key(a: &PlayerId, b: &PlayerId) -> (PlayerId, PlayerId) {
    if a.as_ref() <= b.as_ref() {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}
