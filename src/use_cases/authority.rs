// The authority actor: the single task that owns every piece of mutable
// server state (lobby, match, duels, admin) and serializes all mutation
// through one `tokio::select!` loop.

use crate::domain::{is_bot_id, DuelId, PlayerId};
use crate::domain::state::ParticipantResult;
use crate::use_cases::admin::{self, AutoStart};
use crate::use_cases::duel::{DuelBroker, RequestOutcome, RoundOutcome};
use crate::use_cases::eliminator;
use crate::use_cases::lobby;
use crate::use_cases::match_sim::{self, MatchEndReason};
use crate::use_cases::minigames::Registry;
use crate::use_cases::types::{
    AdminConfig, AuthorityCommand, ConnectOutcome, EntityView, MatchSnapshot, Outbound, OutboundEvent,
    RejectReason, ServerMeta, StatusSnapshot,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const SIM_TICK: Duration = Duration::from_millis(1000 / 15);
pub const ADMIN_TICK: Duration = Duration::from_millis(500);

pub struct Authority {
    lobby: crate::domain::state::LobbyState,
    match_state: Option<crate::domain::state::MatchState>,
    broker: DuelBroker,
    registry: Registry,
    admin: AutoStart,
    connections: HashMap<PlayerId, mpsc::Sender<Outbound>>,
    map_dir: PathBuf,
    started_at: Instant,
}

impl Authority {
    pub fn new(config: AdminConfig, map_dir: PathBuf, minigame_dir: Option<PathBuf>) -> Self {
        let mut lobby_state = crate::domain::state::LobbyState::default();
        lobby_state.map_name = config.map_name.clone();
        Self {
            lobby: lobby_state,
            match_state: None,
            broker: DuelBroker::default(),
            registry: Registry::load(minigame_dir.as_deref()),
            admin: AutoStart::new(config),
            connections: HashMap::new(),
            map_dir,
            started_at: Instant::now(),
        }
    }

    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<AuthorityCommand>) {
        let mut sim_interval = tokio::time::interval(SIM_TICK);
        let mut admin_interval = tokio::time::interval(ADMIN_TICK);
        info!("authority actor started");
        loop {
            tokio::select! {
                maybe_cmd = cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            info!("authority command channel closed, shutting down");
                            break;
                        }
                    }
                }
                _ = sim_interval.tick() => {
                    self.sim_tick();
                }
                _ = admin_interval.tick() => {
                    self.admin_tick();
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: AuthorityCommand) {
        match cmd {
            AuthorityCommand::Connect { player_id, outbox, reply } => {
                self.on_connect(player_id, outbox, reply);
            }
            AuthorityCommand::Disconnect { player_id } => self.on_disconnect(player_id),
            AuthorityCommand::Hello { player_id, name } => {
                lobby::hello(&mut self.lobby, &player_id, &name);
                self.broadcast_lobby_state();
            }
            AuthorityCommand::SetReady { player_id, ready } => {
                lobby::set_ready(&mut self.lobby, &player_id, ready);
                self.broadcast_lobby_state();
            }
            AuthorityCommand::SetChar { player_id, char_name } => {
                lobby::set_char(&mut self.lobby, &player_id, &char_name);
                self.broadcast_lobby_state();
            }
            AuthorityCommand::StartMatch { player_id, seed } => self.try_start_match(Some(player_id), seed),
            AuthorityCommand::Input { player_id, vec } => {
                if let Some(m) = self.match_state.as_mut() {
                    let clamped = (vec.0.clamp(-1.0, 1.0), vec.1.clamp(-1.0, 1.0));
                    m.inputs.insert(player_id, clamped);
                }
            }
            AuthorityCommand::RequestDuel { player_id, target } => self.on_request_duel(player_id, target),
            AuthorityCommand::DuelChoice { player_id, duel_id, entry } => {
                self.on_duel_choice(player_id, duel_id, entry);
            }
            AuthorityCommand::DuelAction { player_id, duel_id, payload } => {
                let involved = self.broker.get(&duel_id).is_some_and(|r| r.involves(&player_id));
                if involved {
                    // Observers as well as the opponent see the action relay.
                    self.broadcast(OutboundEvent::DuelAction { duel_id, from: player_id, payload });
                }
            }
            AuthorityCommand::DuelResultReport { player_id, duel_id, outcome, winner, loser, entry } => {
                self.on_duel_result_report(player_id, duel_id, outcome, winner, loser, entry);
            }
            AuthorityCommand::StartMinigame { participants, minigame, duel_id, .. } => {
                let duel_id = duel_id.unwrap_or_else(|| std::sync::Arc::from("adhoc"));
                self.broadcast_to(participants.clone(), OutboundEvent::StartMinigame { minigame, participants, duel_id });
            }
            AuthorityCommand::MinigameResult { payload, .. } => {
                self.broadcast(OutboundEvent::MinigameResult { payload });
            }
            AuthorityCommand::DebugStartDuel { player_id, target } => {
                if let Some(target) = target.or_else(|| self.any_other_entity(&player_id)) {
                    self.on_request_duel(player_id.clone(), target.clone());
                    self.on_request_duel(target, player_id);
                }
            }
            AuthorityCommand::AdminKick { player_id } => {
                self.on_disconnect(player_id);
            }
            AuthorityCommand::AdminForceStart { seed, reply } => {
                let started = self.admin.try_force_start(Instant::now());
                if started {
                    self.try_start_match(None, seed);
                }
                let _ = reply.send(started);
            }
            AuthorityCommand::AdminReset => {
                self.match_state = None;
                admin::reset_lobby(&mut self.lobby);
                self.broadcast_lobby_state();
            }
            AuthorityCommand::AdminSetLock { locked } => {
                self.admin.lobby_locked = locked;
                self.broadcast_lobby_state();
            }
            AuthorityCommand::AdminUpdateConfig { patch, reply } => {
                self.admin.config.apply(patch);
                let _ = reply.send(self.admin.config.clone());
                self.broadcast_lobby_state();
            }
            AuthorityCommand::AdminStatus { reply } => {
                let _ = reply.send(StatusSnapshot {
                    uptime_secs: self.started_at.elapsed().as_secs(),
                    player_count: self.lobby.players.len(),
                    match_active: self.match_state.as_ref().is_some_and(|m| m.active),
                    lobby_locked: self.admin.lobby_locked,
                    join_locked: self.admin.join_locked,
                    config: self.admin.config.clone(),
                });
            }
        }
    }

    fn on_connect(&mut self, player_id: PlayerId, outbox: mpsc::Sender<Outbound>, reply: tokio::sync::oneshot::Sender<ConnectOutcome>) {
        if self.match_state.as_ref().is_some_and(|m| m.active) {
            let _ = reply.send(ConnectOutcome::Rejected { match_active: true, lobby_locked: self.admin.join_locked });
            return;
        }
        if self.admin.join_locked {
            let _ = reply.send(ConnectOutcome::Rejected { match_active: false, lobby_locked: true });
            return;
        }
        self.connections.insert(player_id.clone(), outbox);
        lobby::on_accept(&mut self.lobby, player_id.clone());
        let _ = reply.send(ConnectOutcome::Welcome { lobby: self.lobby.clone(), meta: self.admin.meta() });
        self.send_to(
            &player_id,
            OutboundEvent::Welcome { player_id: player_id.clone(), lobby: self.lobby.clone(), meta: self.admin.meta() },
        );
        self.broadcast_lobby_state();
    }

    fn on_disconnect(&mut self, player_id: PlayerId) {
        self.connections.remove(&player_id);
        lobby::on_disconnect(&mut self.lobby, &player_id);
        if let Some(m) = self.match_state.as_mut() {
            eliminator::eliminate(m, &player_id);
        }
        self.broker.abandon(&player_id);
        self.broadcast_lobby_state();
    }

    fn try_start_match(&mut self, requested_by: Option<PlayerId>, seed: Option<String>) {
        if let Some(requester) = &requested_by {
            if !self.lobby.is_host(requester) {
                self.send_to(requester, OutboundEvent::Reject { reason: RejectReason::LobbyLocked });
                return;
            }
        }
        if self.lobby.players.is_empty() {
            return;
        }
        let seed = seed.unwrap_or_else(random_seed);
        match match_sim::start_match(&self.lobby, &self.map_dir, seed.clone()) {
            Ok((state, spawns)) => {
                let map = self.lobby.map_name.clone();
                let mode = self.lobby.mode.clone();
                let allow_npc = self.lobby.allow_npc;
                let players: Vec<PlayerId> = self.lobby.players.iter().map(|p| p.player_id.clone()).collect();
                self.match_state = Some(state);
                self.broadcast(OutboundEvent::StartMatch { map, mode, seed, allow_npc, players, spawns });
            }
            Err(err) => {
                warn!(?err, "failed to start match");
            }
        }
    }

    /// `request_duel` only starts a duel once both sides have asked for it:
    /// the first call records a pending request and notifies the target; the
    /// target calling `request_duel` back within `REQUEST_TTL_SECS` is what
    /// actually starts it. A request against an NPC target starts right away
    /// since there's no other side to consent. Either path is still gated on
    /// the arena's single-duel-at-a-time cooldown.
    fn on_request_duel(&mut self, player_id: PlayerId, target: PlayerId) {
        let Some(m) = self.match_state.as_ref() else { return };
        let known: std::collections::HashSet<PlayerId> = m.entities.keys().cloned().collect();
        let seed = m.seed.clone();
        let tick = m.tick;
        let can_start = m.duel_cooldown <= 0.0 && !self.broker.has_active_duel();

        match self.broker.request(player_id.clone(), target.clone(), &known, Instant::now(), can_start) {
            Ok(RequestOutcome::Pending) => {
                self.send_to(&target, OutboundEvent::DuelRequest { from: player_id, to: target });
            }
            Ok(RequestOutcome::ReadyToStart) => self.start_requested_duel(player_id, target, &seed, tick),
            Err(_) => {}
        }
    }

    fn start_requested_duel(&mut self, a: PlayerId, b: PlayerId, seed: &str, tick: u64) {
        let duel_id: DuelId = std::sync::Arc::from(format!("duel-{tick}-{a}-{b}"));
        let started = self
            .broker
            .accept(&a, &b, seed, tick, &self.registry, duel_id.clone(), Instant::now())
            .is_some();
        if !started {
            return;
        }
        if let Some(m) = self.match_state.as_mut() {
            m.duel_cooldown = crate::use_cases::duel::DUEL_COOLDOWN_SECS;
        }
        if let Some(record) = self.broker.get(&duel_id) {
            self.broadcast(OutboundEvent::StartDuel {
                duel_id: record.duel_id.clone(),
                participants: (a, b),
                wheel_entries: record.wheel.clone(),
                wheel_spin_seed: tick,
                selected_entry: record.selected.clone(),
            });
        }
    }

    fn on_duel_choice(&mut self, player_id: PlayerId, duel_id: DuelId, entry: String) {
        let Some(outcome) = self.broker.submit_rps_choice(&duel_id, &player_id, &entry, Instant::now()) else { return };
        self.handle_round_outcome(duel_id, outcome);
    }

    fn handle_round_outcome(&mut self, duel_id: DuelId, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Waiting => {}
            RoundOutcome::RoundResolved { round, winner } => {
                let (scores, entries) = {
                    let Some(record) = self.broker.get(&duel_id) else { return };
                    (record.scores.clone(), record.round_entries.clone())
                };
                self.broadcast(OutboundEvent::DuelRoundResult { duel_id, round, winner, scores, choices: choices_map(&entries) });
            }
            RoundOutcome::DuelComplete { winner, loser } => {
                self.finish_duel(duel_id, winner, loser);
            }
        }
    }

    /// Records the reporting side's entry/outcome against the duel. An
    /// explicit `winner`/`loser` pair finishes the duel outright. Otherwise,
    /// a decisive `outcome` (`win`/`lose`/`forfeit`) finishes it only when an
    /// NPC is involved, since an NPC opponent never reports its own side.
    /// A payload naming `winner`/`loser` for a `duel_id` the broker no
    /// longer tracks (already swept, or never recorded) is a failsafe: trust
    /// the report and resolve it directly.
    fn on_duel_result_report(
        &mut self,
        player_id: PlayerId,
        duel_id: DuelId,
        outcome: String,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
        entry: Option<String>,
    ) {
        let Some(record) = self.broker.get(&duel_id) else {
            if let (Some(winner), Some(loser)) = (winner, loser) {
                warn!(%duel_id, "synthesizing duel_result for unknown duel from reported winner/loser");
                self.finish_unknown_duel(duel_id, winner, loser);
            }
            return;
        };

        let resolved = match outcome.as_str() {
            "win" => record.other(&player_id).cloned().map(|loser| (player_id.clone(), loser)),
            "lose" | "forfeit" => record.other(&player_id).cloned().map(|winner| (winner, player_id.clone())),
            _ => None,
        };
        let decisive = record.has_npc();

        if let Some(slot) = self.broker.get_mut(&duel_id) {
            let result = slot.results.entry(player_id).or_default();
            result.entry = entry;
            result.outcome = Some(outcome);
        }

        if let (Some(winner), Some(loser)) = (winner, loser) {
            self.finish_duel(duel_id, winner, loser);
        } else if decisive {
            if let Some((winner, loser)) = resolved {
                self.finish_duel(duel_id, winner, loser);
            }
        }
    }

    fn finish_unknown_duel(&mut self, duel_id: DuelId, winner: PlayerId, loser: PlayerId) {
        if let Some(m) = self.match_state.as_mut() {
            eliminator::eliminate(m, &loser);
        }
        self.broadcast(OutboundEvent::DuelResult {
            duel_id,
            winner,
            loser: loser.clone(),
            entries: HashMap::<PlayerId, ParticipantResult>::new(),
        });
        self.broadcast(OutboundEvent::Eliminate { player_id: loser });
    }

    fn finish_duel(&mut self, duel_id: DuelId, winner: PlayerId, loser: PlayerId) {
        let Some(entries) = self.broker.finish(&duel_id, winner.clone(), loser.clone()) else { return };
        if let Some(m) = self.match_state.as_mut() {
            eliminator::eliminate(m, &loser);
        }
        self.broadcast(OutboundEvent::DuelResult { duel_id, winner, loser: loser.clone(), entries });
        self.broadcast(OutboundEvent::Eliminate { player_id: loser });
    }

    fn any_other_entity(&self, exclude: &PlayerId) -> Option<PlayerId> {
        self.match_state.as_ref()?.entities.keys().find(|id| *id != exclude).cloned()
    }

    fn sim_tick(&mut self) {
        self.broker.expire_requests(Instant::now());

        let now = Instant::now();
        let now_secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        for (duel_id, p0, p1) in self.broker.sweep_stale(now, now_secs) {
            if is_bot_id(&p0) || is_bot_id(&p1) {
                self.resolve_rps_after_sweep(duel_id);
            }
        }

        let Some(mut state) = self.match_state.take() else { return };
        let events = match_sim::tick(&mut state, &mut self.broker, &self.registry, Instant::now());

        for id in &events.eliminated {
            self.broadcast(OutboundEvent::Eliminate { player_id: id.clone() });
        }
        for (a, b) in &events.duels_started {
            if let Some(record) = self.broker.duel_for(a) {
                self.broadcast(OutboundEvent::StartDuel {
                    duel_id: record.duel_id.clone(),
                    participants: (a.clone(), b.clone()),
                    wheel_entries: record.wheel.clone(),
                    wheel_spin_seed: state.tick,
                    selected_entry: record.selected.clone(),
                });
            }
        }

        let snapshot = build_snapshot(&state, events.match_ended);
        self.broadcast(OutboundEvent::MatchState(snapshot));

        if let Some(reason) = events.match_ended {
            info!(?reason, "match ended");
            self.match_state = None;
            admin::reset_lobby(&mut self.lobby);
            self.broadcast_lobby_state();
        } else {
            self.match_state = Some(state);
        }
    }

    fn resolve_rps_after_sweep(&mut self, duel_id: DuelId) {
        let outcome = {
            let Some(record) = self.broker.get(&duel_id) else { return };
            if record.scores.values().any(|&v| v >= 2) {
                let winner = record.scores.iter().max_by_key(|(_, v)| **v).map(|(k, _)| k.clone());
                winner.map(|w| {
                    let loser = record.other(&w).cloned().unwrap_or_else(|| record.participants.0.clone());
                    (w, loser)
                })
            } else {
                None
            }
        };
        if let Some((winner, loser)) = outcome {
            self.finish_duel(duel_id, winner, loser);
        }
    }

    fn admin_tick(&mut self) {
        let should_start = self.admin.tick(&self.lobby, ADMIN_TICK.as_secs_f32());
        if should_start {
            self.try_start_match(None, None);
        }
        self.broadcast_lobby_state();
    }

    fn broadcast_lobby_state(&mut self) {
        let event = OutboundEvent::LobbyState { lobby: self.lobby.clone(), meta: self.admin.meta() };
        self.broadcast(event);
    }

    fn broadcast(&mut self, event: OutboundEvent) {
        let msg = Outbound::all(event);
        self.fan_out(&msg);
    }

    fn broadcast_to(&mut self, ids: Vec<PlayerId>, event: OutboundEvent) {
        let msg = Outbound::subset(ids, event);
        self.fan_out(&msg);
    }

    fn send_to(&mut self, player_id: &PlayerId, event: OutboundEvent) {
        let msg = Outbound::only(player_id.clone(), event);
        self.fan_out(&msg);
    }

    fn fan_out(&mut self, msg: &Outbound) {
        let targets: Vec<PlayerId> = match &msg.to {
            crate::use_cases::types::Recipients::All => self.connections.keys().cloned().collect(),
            crate::use_cases::types::Recipients::Only(id) => vec![id.clone()],
            crate::use_cases::types::Recipients::Subset(ids) => ids.clone(),
        };
        let mut dead = Vec::new();
        for id in targets {
            if let Some(tx) = self.connections.get(&id) {
                if tx.try_send(msg.clone()).is_err() {
                    dead.push(id);
                }
            }
        }
        for id in dead {
            debug!(player_id = %id, "dropping dead connection from fan-out");
            self.connections.remove(&id);
        }
    }
}

fn choices_map(entries: &HashMap<PlayerId, String>) -> HashMap<PlayerId, String> {
    entries.clone()
}

fn build_snapshot(state: &crate::domain::state::MatchState, match_ended: Option<MatchEndReason>) -> MatchSnapshot {
    let entities = state
        .entities
        .values()
        .map(|e| EntityView {
            id: e.player_id.clone(),
            pos: e.pos,
            vel: e.vel,
            char_name: e.char_name.clone(),
            is_npc: e.is_npc,
            display_name: e.display_name.clone(),
        })
        .collect();
    let remaining_humans = state.remaining_humans();
    let remaining_bots = state.remaining_bots();
    let winner = match match_ended {
        Some(MatchEndReason::OneHumanRemains) => state.entities.values().find(|e| !e.is_npc).map(|e| e.player_id.clone()),
        _ => None,
    };
    let npc_winner = matches!(match_ended, Some(MatchEndReason::NoHumansRemain)) && remaining_bots > 0;
    MatchSnapshot {
        tick: state.tick,
        ts: SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64,
        entities,
        remaining: remaining_humans + remaining_bots,
        remaining_humans,
        remaining_total: remaining_humans + remaining_bots,
        winner,
        npc_winner,
    }
}

fn random_seed() -> String {
    crate::domain::rng::random_seed_hex()
}

#[derive(Clone)]
pub struct AuthorityHandle {
    pub sender: mpsc::Sender<AuthorityCommand>,
}

impl AuthorityHandle {
    pub fn spawn(config: AdminConfig, map_dir: PathBuf, minigame_dir: Option<PathBuf>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let authority = Authority::new(config, map_dir, minigame_dir);
        tokio::spawn(authority.run(rx));
        Self { sender: tx }
    }
}
