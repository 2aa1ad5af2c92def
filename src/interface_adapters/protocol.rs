// Wire protocol DTOs. Messages are flat, internally-tagged JSON
// objects (`{"type": "...", ...fields}`).

use crate::domain::state::{LobbyPlayer, LobbyState};
use crate::domain::{DuelId, MinigameId, PlayerId};
use crate::use_cases::types::{EntityView, MatchSnapshot, OutboundEvent, RejectReason, ServerMeta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Hello { #[serde(default)] name: String },
    SetReady { ready: bool },
    SetChar { char_name: String },
    SetMap { #[serde(default)] map: String },
    SetMode { #[serde(default)] mode: String },
    SetAllowNpc { #[serde(default)] allow_npc: bool },
    StartMatch { #[serde(default)] seed: Option<String> },
    Input { #[serde(default)] x: f32, #[serde(default)] y: f32 },
    MatchInput { #[serde(default)] x: f32, #[serde(default)] y: f32 },
    RequestDuel { target: String },
    DuelChoice { duel_id: String, entry: String },
    DuelAction { duel_id: String, payload: serde_json::Value },
    DuelResult {
        duel_id: String,
        outcome: String,
        #[serde(default)]
        winner: Option<String>,
        #[serde(default)]
        loser: Option<String>,
        #[serde(default)]
        entry: Option<String>,
    },
    StartMinigame {
        minigame: String,
        participants: Vec<String>,
        #[serde(default)]
        duel_id: Option<String>,
    },
    MinigameResult { payload: serde_json::Value },
    DebugStartDuel { #[serde(default)] target: Option<String> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { player_id: String, lobby: LobbyStateDto, meta: ServerMetaDto },
    Reject { reason: &'static str },
    LobbyState { lobby: LobbyStateDto, meta: ServerMetaDto },
    StartMatch {
        map: String,
        mode: String,
        seed: String,
        allow_npc: bool,
        players: Vec<String>,
        spawns: Vec<SpawnDto>,
    },
    MatchState(MatchStateDto),
    StartDuel {
        duel_id: String,
        participants: (String, String),
        wheel_entries: Vec<String>,
        wheel_spin_seed: u64,
        selected_entry: String,
    },
    DuelRequest { from: String, to: String },
    DuelRoundResult {
        duel_id: String,
        round: u32,
        choices: HashMap<String, String>,
        winner: Option<String>,
        scores: HashMap<String, u32>,
    },
    DuelResult {
        duel_id: String,
        winner: String,
        loser: String,
        entries: HashMap<String, ParticipantResultDto>,
    },
    DuelAction { duel_id: String, from: String, payload: serde_json::Value },
    StartMinigame { minigame: String, participants: Vec<String>, duel_id: String },
    MinigameResult { payload: serde_json::Value },
    Eliminate { player_id: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SpawnDto {
    pub player_id: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ParticipantResultDto {
    pub entry: Option<String>,
    pub outcome: Option<String>,
}

impl From<&crate::domain::state::ParticipantResult> for ParticipantResultDto {
    fn from(r: &crate::domain::state::ParticipantResult) -> Self {
        Self { entry: r.entry.clone(), outcome: r.outcome.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyPlayerDto {
    pub player_id: String,
    pub name: String,
    pub ready: bool,
    pub char_name: String,
}

impl From<&LobbyPlayer> for LobbyPlayerDto {
    fn from(p: &LobbyPlayer) -> Self {
        Self { player_id: p.player_id.to_string(), name: p.name.clone(), ready: p.ready, char_name: p.char_name.clone() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyStateDto {
    pub map_name: String,
    pub mode: String,
    pub allow_npc: bool,
    pub host_id: Option<String>,
    pub players: Vec<LobbyPlayerDto>,
}

impl From<&LobbyState> for LobbyStateDto {
    fn from(l: &LobbyState) -> Self {
        Self {
            map_name: l.map_name.clone(),
            mode: l.mode.clone(),
            allow_npc: l.allow_npc,
            host_id: l.host_id.as_ref().map(|h| h.to_string()),
            players: l.players.iter().map(LobbyPlayerDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerMetaDto {
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

impl From<&ServerMeta> for ServerMetaDto {
    fn from(m: &ServerMeta) -> Self {
        Self {
            auto_start: m.auto_start,
            min_players: m.min_players,
            ready_required: m.ready_required,
            ready_timeout: m.ready_timeout,
            start_delay: m.start_delay,
            reset_delay: m.reset_delay,
            auto_start_in: m.auto_start_in,
            lobby_locked: m.lobby_locked,
            join_locked: m.join_locked,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub char_name: String,
    pub is_npc: bool,
    pub display_name: String,
}

impl From<&EntityView> for EntityDto {
    fn from(e: &EntityView) -> Self {
        Self {
            id: e.id.to_string(),
            x: e.pos.0,
            y: e.pos.1,
            vx: e.vel.0,
            vy: e.vel.1,
            char_name: e.char_name.clone(),
            is_npc: e.is_npc,
            display_name: e.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchStateDto {
    pub tick: u64,
    pub ts: u64,
    pub entities: Vec<EntityDto>,
    pub remaining: usize,
    pub remaining_humans: usize,
    pub remaining_total: usize,
    pub winner: Option<String>,
    pub npc_winner: bool,
}

impl From<&MatchSnapshot> for MatchStateDto {
    fn from(s: &MatchSnapshot) -> Self {
        Self {
            tick: s.tick,
            ts: s.ts,
            entities: s.entities.iter().map(EntityDto::from).collect(),
            remaining: s.remaining,
            remaining_humans: s.remaining_humans,
            remaining_total: s.remaining_total,
            winner: s.winner.as_ref().map(|w| w.to_string()),
            npc_winner: s.npc_winner,
        }
    }
}

fn reason_str(r: RejectReason) -> &'static str {
    match r {
        RejectReason::MatchActive => "match_active",
        RejectReason::LobbyLocked => "lobby_locked",
    }
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::Welcome { player_id, lobby, meta } => ServerMessage::Welcome {
                player_id: player_id.to_string(),
                lobby: LobbyStateDto::from(&lobby),
                meta: ServerMetaDto::from(&meta),
            },
            OutboundEvent::Reject { reason } => ServerMessage::Reject { reason: reason_str(reason) },
            OutboundEvent::LobbyState { lobby, meta } => {
                ServerMessage::LobbyState { lobby: LobbyStateDto::from(&lobby), meta: ServerMetaDto::from(&meta) }
            }
            OutboundEvent::StartMatch { map, mode, seed, allow_npc, players, spawns } => ServerMessage::StartMatch {
                map,
                mode,
                seed,
                allow_npc,
                players: players.iter().map(|p| p.to_string()).collect(),
                spawns: spawns
                    .into_iter()
                    .map(|(id, (x, y))| SpawnDto { player_id: id.to_string(), x, y })
                    .collect(),
            },
            OutboundEvent::MatchState(snapshot) => ServerMessage::MatchState(MatchStateDto::from(&snapshot)),
            OutboundEvent::StartDuel { duel_id, participants, wheel_entries, wheel_spin_seed, selected_entry } => {
                ServerMessage::StartDuel {
                    duel_id: duel_id.to_string(),
                    participants: (participants.0.to_string(), participants.1.to_string()),
                    wheel_entries: wheel_entries.iter().map(|e| e.to_string()).collect(),
                    wheel_spin_seed,
                    selected_entry: selected_entry.to_string(),
                }
            }
            OutboundEvent::DuelRequest { from, to } => {
                ServerMessage::DuelRequest { from: from.to_string(), to: to.to_string() }
            }
            OutboundEvent::DuelRoundResult { duel_id, round, choices, winner, scores } => {
                ServerMessage::DuelRoundResult {
                    duel_id: duel_id.to_string(),
                    round,
                    choices: choices.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                    winner: winner.map(|w| w.to_string()),
                    scores: scores.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                }
            }
            OutboundEvent::DuelResult { duel_id, winner, loser, entries } => ServerMessage::DuelResult {
                duel_id: duel_id.to_string(),
                winner: winner.to_string(),
                loser: loser.to_string(),
                entries: entries.iter().map(|(k, v)| (k.to_string(), ParticipantResultDto::from(v))).collect(),
            },
            OutboundEvent::DuelAction { duel_id, from, payload } => {
                ServerMessage::DuelAction { duel_id: duel_id.to_string(), from: from.to_string(), payload }
            }
            OutboundEvent::StartMinigame { minigame, participants, duel_id } => ServerMessage::StartMinigame {
                minigame,
                participants: participants.iter().map(|p| p.to_string()).collect(),
                duel_id: duel_id.to_string(),
            },
            OutboundEvent::MinigameResult { payload } => ServerMessage::MinigameResult { payload },
            OutboundEvent::Eliminate { player_id } => ServerMessage::Eliminate { player_id: player_id.to_string() },
        }
    }
}

pub fn player_id_from(s: &str) -> PlayerId {
    std::sync::Arc::from(s)
}

pub fn duel_id_from(s: &str) -> DuelId {
    std::sync::Arc::from(s)
}

pub fn minigame_id_from(s: &str) -> MinigameId {
    std::sync::Arc::from(s)
}
