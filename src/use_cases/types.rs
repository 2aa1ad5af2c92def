// Shared types for the authority actor: inbound commands, outbound events,
// and the small bits of state (server_meta, status) that cross the
// use-cases/interface-adapters boundary.

use crate::domain::{DuelId, MinigameId, PlayerId};
use crate::domain::state::{LobbyState, ParticipantResult};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Commands fed into the authority's single mpsc queue, from connection
/// tasks and from the headless admin HTTP façade alike.
#[derive(Debug)]
pub enum AuthorityCommand {
    Connect {
        player_id: PlayerId,
        outbox: tokio::sync::mpsc::Sender<Outbound>,
        reply: oneshot::Sender<ConnectOutcome>,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Hello {
        player_id: PlayerId,
        name: String,
    },
    SetReady {
        player_id: PlayerId,
        ready: bool,
    },
    SetChar {
        player_id: PlayerId,
        char_name: String,
    },
    StartMatch {
        player_id: PlayerId,
        seed: Option<String>,
    },
    Input {
        player_id: PlayerId,
        vec: (f32, f32),
    },
    RequestDuel {
        player_id: PlayerId,
        target: PlayerId,
    },
    DuelChoice {
        player_id: PlayerId,
        duel_id: DuelId,
        entry: String,
    },
    DuelAction {
        player_id: PlayerId,
        duel_id: DuelId,
        payload: serde_json::Value,
    },
    DuelResultReport {
        player_id: PlayerId,
        duel_id: DuelId,
        outcome: String,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
        entry: Option<String>,
    },
    StartMinigame {
        player_id: PlayerId,
        minigame: String,
        participants: Vec<PlayerId>,
        duel_id: Option<DuelId>,
    },
    MinigameResult {
        player_id: PlayerId,
        payload: serde_json::Value,
    },
    DebugStartDuel {
        player_id: PlayerId,
        target: Option<PlayerId>,
    },
    AdminKick {
        player_id: PlayerId,
    },
    AdminForceStart {
        seed: Option<String>,
        reply: oneshot::Sender<bool>,
    },
    AdminReset,
    AdminSetLock {
        locked: bool,
    },
    AdminUpdateConfig {
        patch: AdminConfigPatch,
        reply: oneshot::Sender<AdminConfig>,
    },
    AdminStatus {
        reply: oneshot::Sender<StatusSnapshot>,
    },
}

#[derive(Debug)]
pub enum ConnectOutcome {
    Welcome { lobby: LobbyState, meta: ServerMeta },
    Rejected { match_active: bool, lobby_locked: bool },
}

/// Auto-start and lock configuration, hot-updatable via the admin façade.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub auto_start: bool,
    pub min_players: usize,
    pub ready_required: bool,
    pub ready_timeout: f32,
    pub start_delay: f32,
    pub reset_delay: f32,
    pub map_name: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            min_players: 2,
            ready_required: true,
            ready_timeout: 20.0,
            start_delay: 5.0,
            reset_delay: 5.0,
            map_name: "test_arena".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdminConfigPatch {
    pub auto_start: Option<bool>,
    pub min_players: Option<usize>,
    pub ready_required: Option<bool>,
    pub ready_timeout: Option<f32>,
    pub start_delay: Option<f32>,
    pub reset_delay: Option<f32>,
    pub map_name: Option<String>,
}

impl AdminConfig {
    pub fn apply(&mut self, patch: AdminConfigPatch) {
        if let Some(v) = patch.auto_start {
            self.auto_start = v;
        }
        if let Some(v) = patch.min_players {
            self.min_players = v;
        }
        if let Some(v) = patch.ready_required {
            self.ready_required = v;
        }
        if let Some(v) = patch.ready_timeout {
            self.ready_timeout = v;
        }
        if let Some(v) = patch.start_delay {
            self.start_delay = v;
        }
        if let Some(v) = patch.reset_delay {
            self.reset_delay = v;
        }
        if let Some(v) = patch.map_name {
            self.map_name = v;
        }
    }
}

/// Snapshot-appended metadata describing lifecycle/admin state.
#[derive(Debug, Clone)]
pub struct ServerMeta {
    pub auto_start: bool,
    pub min_players: usize,
    pub ready_required: bool,
    pub ready_timeout: f32,
    pub start_delay: f32,
    pub reset_delay: f32,
    pub auto_start_in: Option<f32>,
    pub lobby_locked: bool,
    pub join_locked: bool,
}

#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub uptime_secs: u64,
    pub player_count: usize,
    pub match_active: bool,
    pub lobby_locked: bool,
    pub join_locked: bool,
    pub config: AdminConfig,
}

#[derive(Debug, Clone, Copy)]
pub enum RejectReason {
    MatchActive,
    LobbyLocked,
}

/// Who an `Outbound` event is routed to; the broadcast fabric resolves this
/// against its registered connection senders.
#[derive(Debug, Clone)]
pub enum Recipients {
    All,
    Only(PlayerId),
    Subset(Vec<PlayerId>),
}

#[derive(Debug, Clone)]
pub struct EntityView {
    pub id: PlayerId,
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub char_name: String,
    pub is_npc: bool,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub ts: u64,
    pub entities: Vec<EntityView>,
    pub remaining: usize,
    pub remaining_humans: usize,
    pub remaining_total: usize,
    pub winner: Option<PlayerId>,
    pub npc_winner: bool,
}

#[derive(Debug, Clone)]
pub enum OutboundEvent {
    Welcome { player_id: PlayerId, lobby: LobbyState, meta: ServerMeta },
    Reject { reason: RejectReason },
    LobbyState { lobby: LobbyState, meta: ServerMeta },
    StartMatch {
        map: String,
        mode: String,
        seed: String,
        allow_npc: bool,
        players: Vec<PlayerId>,
        spawns: Vec<(PlayerId, (f32, f32))>,
    },
    MatchState(MatchSnapshot),
    StartDuel {
        duel_id: DuelId,
        participants: (PlayerId, PlayerId),
        wheel_entries: Vec<MinigameId>,
        wheel_spin_seed: u64,
        selected_entry: MinigameId,
    },
    DuelRequest { from: PlayerId, to: PlayerId },
    DuelRoundResult {
        duel_id: DuelId,
        round: u32,
        choices: HashMap<PlayerId, String>,
        winner: Option<PlayerId>,
        scores: HashMap<PlayerId, u32>,
    },
    DuelResult {
        duel_id: DuelId,
        winner: PlayerId,
        loser: PlayerId,
        entries: HashMap<PlayerId, ParticipantResult>,
    },
    DuelAction { duel_id: DuelId, from: PlayerId, payload: serde_json::Value },
    StartMinigame { minigame: String, participants: Vec<PlayerId>, duel_id: DuelId },
    MinigameResult { payload: serde_json::Value },
    Eliminate { player_id: PlayerId },
}

#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: Recipients,
    pub event: OutboundEvent,
}

impl Outbound {
    pub fn all(event: OutboundEvent) -> Self {
        Self { to: Recipients::All, event }
    }

    pub fn only(player_id: PlayerId, event: OutboundEvent) -> Self {
        Self { to: Recipients::Only(player_id), event }
    }

    pub fn subset(ids: Vec<PlayerId>, event: OutboundEvent) -> Self {
        Self { to: Recipients::Subset(ids), event }
    }
}
