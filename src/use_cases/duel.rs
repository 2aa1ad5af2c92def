// 1v1 duel broker: request/accept handshake, minigame
// wheel spin, round resolution for the built-in `rps_duel` hook, and a
// stale sweep that force-resolves duels where an NPC (or a silent human)
// never submits a choice.

use crate::domain::rng::seeded_rng;
use crate::domain::state::{unordered_key, DuelRecord, DuelRequest, ParticipantResult};
use crate::domain::{is_bot_id, DuelId, MinigameId, PlayerId};
use crate::use_cases::minigames::{Registry, RpsChoice};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

pub const REQUEST_TTL_SECS: f32 = 10.0;
pub const STALE_SWEEP_SECS: f32 = 8.0;
/// Seconds the arena sits without a new duel starting after one ends.
pub const DUEL_COOLDOWN_SECS: f32 = 2.5;
const WHEEL_SIZE: usize = 5;
const ROUND_WINS_TO_TAKE_DUEL: u32 = 2;
const RPS_MINIGAME: &str = "rps_duel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    SelfTarget,
    AlreadyBusy,
    AlreadyPending,
    UnknownTarget,
    OnCooldown,
}

/// Outcome of a `request` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Recorded; waiting on the other side (or on an NPC-target gate) to
    /// open up before the duel can start.
    Pending,
    /// Both sides have now consented (or the target is an NPC); the caller
    /// should immediately call `accept`.
    ReadyToStart,
}

/// Outcome of submitting a round choice.
pub enum RoundOutcome {
    /// Waiting on the other participant.
    Waiting,
    /// Round resolved, duel continues.
    RoundResolved { round: u32, winner: Option<PlayerId> },
    /// Duel finished outright.
    DuelComplete { winner: PlayerId, loser: PlayerId },
}

#[derive(Default)]
pub struct DuelBroker {
    pending: HashMap<(PlayerId, PlayerId), DuelRequest>,
    active: HashMap<DuelId, DuelRecord>,
    busy: HashSet<PlayerId>,
}

impl DuelBroker {
    pub fn is_busy(&self, id: &PlayerId) -> bool {
        self.busy.contains(id)
    }

    pub fn get(&self, duel_id: &DuelId) -> Option<&DuelRecord> {
        self.active.get(duel_id)
    }

    pub fn get_mut(&mut self, duel_id: &DuelId) -> Option<&mut DuelRecord> {
        self.active.get_mut(duel_id)
    }

    pub fn duel_for(&self, player_id: &PlayerId) -> Option<&DuelRecord> {
        self.active.values().find(|d| d.involves(player_id))
    }

    /// Whether any duel anywhere in the match is currently running. The
    /// arena runs at most one duel at a time.
    pub fn has_active_duel(&self) -> bool {
        !self.active.is_empty()
    }

    /// Records (or matches) a duel request. Both participants must exist in
    /// the match and neither may already be in a duel.
    ///
    /// A request against an NPC target, or a request that mirrors an
    /// already-pending request from the other side, yields
    /// `ReadyToStart` once `can_start` allows it (arena not on cooldown, no
    /// other duel active); the caller should then call `accept`. A first
    /// request against a human target is recorded as `Pending` and the
    /// target must call `request` back within `REQUEST_TTL_SECS` for the
    /// duel to start.
    pub fn request(
        &mut self,
        initiator: PlayerId,
        target: PlayerId,
        known_entities: &HashSet<PlayerId>,
        now: Instant,
        can_start: bool,
    ) -> Result<RequestOutcome, RequestError> {
        if initiator == target {
            return Err(RequestError::SelfTarget);
        }
        if !known_entities.contains(&target) {
            return Err(RequestError::UnknownTarget);
        }
        if self.busy.contains(&initiator) || self.busy.contains(&target) {
            return Err(RequestError::AlreadyBusy);
        }

        let key = unordered_key(&initiator, &target);

        if is_bot_id(&target) {
            return if can_start { Ok(RequestOutcome::ReadyToStart) } else { Err(RequestError::OnCooldown) };
        }

        if let Some(existing) = self.pending.get(&key) {
            if existing.initiator == target && existing.target == initiator {
                return if can_start { Ok(RequestOutcome::ReadyToStart) } else { Err(RequestError::OnCooldown) };
            }
            return Err(RequestError::AlreadyPending);
        }

        self.pending.insert(key, DuelRequest { initiator, target, ts: now });
        Ok(RequestOutcome::Pending)
    }

    /// Removes requests older than `REQUEST_TTL_SECS`.
    pub fn expire_requests(&mut self, now: Instant) -> Vec<(PlayerId, PlayerId)> {
        let mut expired = Vec::new();
        self.pending.retain(|key, req| {
            let alive = now.duration_since(req.ts).as_secs_f32() < REQUEST_TTL_SECS;
            if !alive {
                expired.push(key.clone());
            }
            alive
        });
        expired
    }

    /// Accepts a pending request between `a` and `b` (order-independent),
    /// spins the minigame wheel, and starts the duel. A no-op pending-removal
    /// is fine: an NPC-target request never had a pending entry to begin
    /// with.
    pub fn accept(
        &mut self,
        a: &PlayerId,
        b: &PlayerId,
        match_seed: &str,
        tick: u64,
        registry: &Registry,
        duel_id: DuelId,
        now: Instant,
    ) -> Option<&DuelRecord> {
        let key = unordered_key(a, b);
        self.pending.remove(&key);
        self.start_duel(&key.0, &key.1, match_seed, tick, registry, duel_id, now)
    }

    /// Directly pairs two idle entities into a duel, bypassing the
    /// request/accept handshake. Used by proximity auto-pairing, where
    /// consent isn't meaningful.
    pub fn auto_pair(
        &mut self,
        a: &PlayerId,
        b: &PlayerId,
        match_seed: &str,
        tick: u64,
        registry: &Registry,
        duel_id: DuelId,
        now: Instant,
    ) -> Option<&DuelRecord> {
        if self.busy.contains(a) || self.busy.contains(b) {
            return None;
        }
        self.start_duel(a, b, match_seed, tick, registry, duel_id, now)
    }

    fn start_duel(
        &mut self,
        a: &PlayerId,
        b: &PlayerId,
        match_seed: &str,
        tick: u64,
        registry: &Registry,
        duel_id: DuelId,
        now: Instant,
    ) -> Option<&DuelRecord> {
        let entries = registry.multiplayer_entries();
        if entries.is_empty() {
            return None;
        }

        let mut rng = seeded_rng(&[match_seed, &tick.to_string(), a, b]);
        let mut wheel: Vec<MinigameId> = entries.clone();
        wheel.shuffle(&mut rng);
        wheel.truncate(WHEEL_SIZE.min(wheel.len()));
        let selected = wheel.choose(&mut rng).cloned().unwrap_or_else(|| entries[0].clone());

        self.busy.insert(a.clone());
        self.busy.insert(b.clone());

        let record = DuelRecord {
            duel_id: duel_id.clone(),
            participants: (a.clone(), b.clone()),
            wheel,
            selected,
            results: HashMap::new(),
            scores: HashMap::new(),
            round: 1,
            round_entries: HashMap::new(),
            round_started_at: now,
            forced_winner: None,
            forced_loser: None,
            start: now,
        };
        self.active.insert(duel_id.clone(), record);
        self.active.get(&duel_id)
    }

    /// Submits one participant's choice for the current round of an
    /// `rps_duel`. Returns `None` if the duel or player isn't found.
    pub fn submit_rps_choice(
        &mut self,
        duel_id: &DuelId,
        player_id: &PlayerId,
        entry: &str,
        now: Instant,
    ) -> Option<RoundOutcome> {
        let (p0, p1) = {
            let record = self.active.get(duel_id)?;
            if !record.involves(player_id) || record.selected.as_ref() != RPS_MINIGAME {
                return None;
            }
            record.participants.clone()
        };
        let choice = RpsChoice::parse(entry)?;
        {
            let record = self.active.get_mut(duel_id)?;
            record.round_entries.insert(player_id.clone(), choice.as_str().to_string());
        }

        let (c0, c1) = {
            let record = self.active.get(duel_id)?;
            (
                record.round_entries.get(&p0).and_then(|s| RpsChoice::parse(s)),
                record.round_entries.get(&p1).and_then(|s| RpsChoice::parse(s)),
            )
        };
        let (Some(c0), Some(c1)) = (c0, c1) else {
            return Some(RoundOutcome::Waiting);
        };

        Some(self.resolve_round(duel_id, c0, c1, now))
    }

    fn resolve_round(&mut self, duel_id: &DuelId, c0: RpsChoice, c1: RpsChoice, now: Instant) -> RoundOutcome {
        let record = self.active.get_mut(duel_id).expect("duel exists");
        let (p0, p1) = record.participants.clone();
        let round_winner = match c0.beats(c1) {
            Some(true) => Some(p0.clone()),
            Some(false) => Some(p1.clone()),
            None => None,
        };
        if let Some(ref w) = round_winner {
            *record.scores.entry(w.clone()).or_insert(0) += 1;
        }
        record.round_entries.clear();
        record.round_started_at = now;
        let round = record.round;
        record.round += 1;

        if let Some(winner) = &round_winner {
            if record.scores.get(winner).copied().unwrap_or(0) >= ROUND_WINS_TO_TAKE_DUEL {
                let loser = record.other(winner).cloned().unwrap_or_else(|| {
                    if *winner == p0 { p1.clone() } else { p0.clone() }
                });
                return RoundOutcome::DuelComplete { winner: winner.clone(), loser };
            }
        }
        RoundOutcome::RoundResolved { round, winner: round_winner }
    }

    /// Force-resolves duels whose current round has sat unanswered for
    /// `STALE_SWEEP_SECS`. The missing side's choice is synthesized from a
    /// seed derived from the duel id and current time so repeated sweeps at
    /// the same instant are deterministic.
    pub fn sweep_stale(&mut self, now: Instant, now_secs: u64) -> Vec<(DuelId, PlayerId, PlayerId)> {
        let stale: Vec<DuelId> = self
            .active
            .iter()
            .filter_map(|(id, r)| {
                if now.duration_since(r.round_started_at).as_secs_f32() >= STALE_SWEEP_SECS {
                    Some(id.clone())
                } else {
                    None
                }
            })
            .collect();

        let mut resolved = Vec::new();
        for duel_id in stale {
            let mut rng = seeded_rng(&[&duel_id, &now_secs.to_string()]);
            let forced = RpsChoice::ai_choice(&mut rng);
            let (p0, p1) = self.active.get(&duel_id).unwrap().participants.clone();
            let missing = {
                let record = self.active.get(&duel_id).unwrap();
                if record.round_entries.contains_key(&p0) { p1.clone() } else { p0.clone() }
            };
            self.submit_rps_choice(&duel_id, &missing, forced.as_str(), now);
            if let Some(record) = self.active.get(&duel_id) {
                resolved.push((duel_id, record.participants.0.clone(), record.participants.1.clone()));
            }
        }
        resolved
    }

    /// Ends a duel, clearing both participants' busy flags and returning
    /// the final result to feed the broadcast fabric / eliminator.
    pub fn finish(&mut self, duel_id: &DuelId, winner: PlayerId, loser: PlayerId) -> Option<HashMap<PlayerId, ParticipantResult>> {
        let record = self.active.remove(duel_id)?;
        self.busy.remove(&record.participants.0);
        self.busy.remove(&record.participants.1);
        let mut results = record.results;
        results.entry(winner).or_default().outcome = Some("win".to_string());
        results.entry(loser).or_default().outcome = Some("loss".to_string());
        Some(results)
    }

    /// Clears the busy flag for a participant without a formal result, used
    /// when an opponent disconnects or is eliminated mid-duel.
    pub fn abandon(&mut self, player_id: &PlayerId) -> Option<DuelId> {
        let duel_id = self.duel_for(player_id).map(|d| d.duel_id.clone())?;
        if let Some(record) = self.active.remove(&duel_id) {
            self.busy.remove(&record.participants.0);
            self.busy.remove(&record.participants.1);
        }
        Some(duel_id)
    }

    pub fn ai_choice_for(&self, duel_id: &DuelId, rng: &mut impl Rng) -> Option<String> {
        self.active.get(duel_id).map(|_| RpsChoice::ai_choice(rng).as_str().to_string())
    }

    pub fn npc_participant(&self, duel_id: &DuelId) -> Option<PlayerId> {
        let record = self.active.get(duel_id)?;
        if is_bot_id(&record.participants.0) {
            Some(record.participants.0.clone())
        } else if is_bot_id(&record.participants.1) {
            Some(record.participants.1.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::minigames::Registry;
    use std::sync::Arc;

    fn ids(a: &str, b: &str) -> (PlayerId, PlayerId) {
        (Arc::from(a), Arc::from(b))
    }

    #[test]
    fn request_rejects_self_target_and_requires_a_mirrored_request() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let mut known = HashSet::new();
        known.insert(a.clone());
        known.insert(b.clone());
        assert_eq!(
            broker.request(a.clone(), a.clone(), &known, Instant::now(), true),
            Err(RequestError::SelfTarget)
        );
        assert_eq!(
            broker.request(a.clone(), b.clone(), &known, Instant::now(), true),
            Ok(RequestOutcome::Pending)
        );
        // Same-direction repeat while pending: still just pending.
        assert_eq!(
            broker.request(a.clone(), b.clone(), &known, Instant::now(), true),
            Err(RequestError::AlreadyPending)
        );
        // The target requesting back mirrors the pending request: ready to start.
        assert_eq!(
            broker.request(b.clone(), a.clone(), &known, Instant::now(), true),
            Ok(RequestOutcome::ReadyToStart)
        );
    }

    #[test]
    fn request_against_cooldown_reports_on_cooldown_without_losing_pending_state() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let mut known = HashSet::new();
        known.insert(a.clone());
        known.insert(b.clone());
        broker.request(a.clone(), b.clone(), &known, Instant::now(), true).unwrap();
        assert_eq!(
            broker.request(b.clone(), a.clone(), &known, Instant::now(), false),
            Err(RequestError::OnCooldown)
        );
        // The mirrored request is still pending; once the gate opens it can start.
        assert_eq!(
            broker.request(b.clone(), a.clone(), &known, Instant::now(), true),
            Ok(RequestOutcome::ReadyToStart)
        );
    }

    #[test]
    fn requesting_an_npc_target_is_ready_to_start_immediately() {
        let mut broker = DuelBroker::default();
        let a: PlayerId = Arc::from("a");
        let npc: PlayerId = Arc::from("npc-0");
        let mut known = HashSet::new();
        known.insert(a.clone());
        known.insert(npc.clone());
        assert_eq!(
            broker.request(a, npc, &known, Instant::now(), true),
            Ok(RequestOutcome::ReadyToStart)
        );
    }

    #[test]
    fn accept_spins_wheel_and_marks_participants_busy() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let mut known = HashSet::new();
        known.insert(a.clone());
        known.insert(b.clone());
        broker.request(a.clone(), b.clone(), &known, Instant::now(), true).unwrap();
        broker.request(b.clone(), a.clone(), &known, Instant::now(), true).unwrap();

        let registry = Registry::load(None);
        let duel_id: DuelId = Arc::from("duel-1");
        let record = broker
            .accept(&a, &b, "seed", 10, &registry, duel_id.clone(), Instant::now())
            .unwrap();
        assert!(!record.wheel.is_empty());
        assert!(broker.is_busy(&a));
        assert!(broker.is_busy(&b));
        assert!(broker.has_active_duel());
    }

    #[test]
    fn best_of_three_ends_duel_after_two_round_wins() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let registry = Registry::load(None);
        let duel_id: DuelId = Arc::from("duel-2");
        broker.auto_pair(&a, &b, "seed", 0, &registry, duel_id.clone(), Instant::now()).unwrap();

        let now = Instant::now();
        for _ in 0..2 {
            broker.submit_rps_choice(&duel_id, &a, "rock", now);
            let outcome = broker.submit_rps_choice(&duel_id, &b, "scissors", now);
            if let Some(RoundOutcome::DuelComplete { winner, loser }) = outcome {
                assert_eq!(winner, a);
                assert_eq!(loser, b);
                return;
            }
        }
        panic!("expected duel to complete within two rounds");
    }

    #[test]
    fn submit_rps_choice_ignores_non_rps_minigame_selection() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let registry = Registry::load(None);
        let duel_id: DuelId = Arc::from("duel-3");
        broker.auto_pair(&a, &b, "seed", 0, &registry, duel_id.clone(), Instant::now()).unwrap();
        broker.get_mut(&duel_id).unwrap().selected = Arc::from("wheel_spin");

        assert!(broker.submit_rps_choice(&duel_id, &a, "rock", Instant::now()).is_none());
    }

    #[test]
    fn sweep_stale_fires_even_when_nobody_ever_answers() {
        let mut broker = DuelBroker::default();
        let (a, b) = ids("a", "b");
        let registry = Registry::load(None);
        let duel_id: DuelId = Arc::from("duel-4");
        let start = Instant::now();
        broker.auto_pair(&a, &b, "seed", 0, &registry, duel_id.clone(), start).unwrap();

        let later = start + std::time::Duration::from_secs_f32(STALE_SWEEP_SECS + 1.0);
        let resolved = broker.sweep_stale(later, 0);
        assert_eq!(resolved.len(), 1);
    }
}
