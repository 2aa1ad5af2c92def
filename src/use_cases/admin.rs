// Headless admin auto-start state machine and lobby reset.
//
// The authority polls this on its admin tick (every 500ms); it owns no
// networking of its own, it just decides when to fire `StartMatch` /
// `ResetLobby` events for the authority loop to act on.

use crate::use_cases::lobby;
use crate::use_cases::types::{AdminConfig, ServerMeta};
use crate::domain::state::LobbyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    WaitingForReady,
    CountingDown,
}

#[derive(Debug)]
pub struct AutoStart {
    pub config: AdminConfig,
    pub lobby_locked: bool,
    pub join_locked: bool,
    phase: Phase,
    ready_elapsed: f32,
    countdown_elapsed: f32,
    last_force_start: Option<std::time::Instant>,
}

impl AutoStart {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config,
            lobby_locked: false,
            join_locked: false,
            phase: Phase::Idle,
            ready_elapsed: 0.0,
            countdown_elapsed: 0.0,
            last_force_start: None,
        }
    }

    /// Advances the state machine by `dt` seconds. Returns `true` once the
    /// countdown has fully elapsed and the match should start.
    pub fn tick(&mut self, lobby_state: &LobbyState, dt: f32) -> bool {
        if !self.config.auto_start || self.lobby_locked {
            self.phase = Phase::Idle;
            self.ready_elapsed = 0.0;
            self.countdown_elapsed = 0.0;
            return false;
        }

        let have_min = lobby_state.players.len() >= self.config.min_players;
        let ready = !self.config.ready_required || lobby::all_ready(lobby_state, self.config.min_players);

        match self.phase {
            Phase::Idle => {
                if have_min {
                    self.phase = Phase::WaitingForReady;
                    self.ready_elapsed = 0.0;
                }
            }
            Phase::WaitingForReady => {
                if !have_min {
                    self.phase = Phase::Idle;
                } else if ready {
                    self.phase = Phase::CountingDown;
                    self.countdown_elapsed = 0.0;
                } else {
                    self.ready_elapsed += dt;
                    if self.config.ready_timeout > 0.0 && self.ready_elapsed >= self.config.ready_timeout {
                        // Ready timeout elapsed; start anyway with whoever is ready.
                        self.phase = Phase::CountingDown;
                        self.countdown_elapsed = 0.0;
                    }
                }
            }
            Phase::CountingDown => {
                if !have_min {
                    self.phase = Phase::Idle;
                } else {
                    self.countdown_elapsed += dt;
                    if self.countdown_elapsed >= self.config.start_delay {
                        self.phase = Phase::Idle;
                        self.ready_elapsed = 0.0;
                        self.countdown_elapsed = 0.0;
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn auto_start_in(&self) -> Option<f32> {
        match self.phase {
            Phase::CountingDown => Some((self.config.start_delay - self.countdown_elapsed).max(0.0)),
            _ => None,
        }
    }

    /// Force-start is rate-limited to once per second to keep an admin's
    /// fat-fingered retry from tearing down an in-progress start sequence.
    pub fn try_force_start(&mut self, now: std::time::Instant) -> bool {
        if let Some(last) = self.last_force_start {
            if now.duration_since(last).as_secs_f32() < 1.0 {
                return false;
            }
        }
        self.last_force_start = Some(now);
        true
    }

    pub fn meta(&self) -> ServerMeta {
        ServerMeta {
            auto_start: self.config.auto_start,
            min_players: self.config.min_players,
            ready_required: self.config.ready_required,
            ready_timeout: self.config.ready_timeout,
            start_delay: self.config.start_delay,
            reset_delay: self.config.reset_delay,
            auto_start_in: self.auto_start_in(),
            lobby_locked: self.lobby_locked,
            join_locked: self.join_locked,
        }
    }
}

/// Resets the lobby to a fresh, post-match state: every player's ready flag
/// clears, character/map/mode selections are retained.
pub fn reset_lobby(lobby_state: &mut LobbyState) {
    for p in &mut lobby_state.players {
        p.ready = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::LobbyPlayer;
    use std::sync::Arc;

    fn lobby_with(n: usize, all_ready: bool) -> LobbyState {
        let mut l = LobbyState::default();
        for i in 0..n {
            l.players.push(LobbyPlayer {
                player_id: Arc::from(format!("p{i}")),
                name: format!("p{i}"),
                ready: all_ready,
                char_name: "default".into(),
            });
        }
        l
    }

    #[test]
    fn counts_down_and_fires_once_all_ready() {
        let config = AdminConfig { min_players: 2, ready_required: true, start_delay: 1.0, ..AdminConfig::default() };
        let mut auto = AutoStart::new(config);
        let lobby_state = lobby_with(2, true);
        assert!(!auto.tick(&lobby_state, 0.5));
        assert!(auto.tick(&lobby_state, 0.6));
    }

    #[test]
    fn stays_idle_below_min_players() {
        let mut auto = AutoStart::new(AdminConfig { min_players: 3, ..AdminConfig::default() });
        let lobby_state = lobby_with(2, true);
        for _ in 0..100 {
            assert!(!auto.tick(&lobby_state, 1.0));
        }
    }

    #[test]
    fn zero_ready_timeout_never_auto_starts_without_all_ready() {
        let config = AdminConfig { min_players: 2, ready_required: true, ready_timeout: 0.0, start_delay: 1.0, ..AdminConfig::default() };
        let mut auto = AutoStart::new(config);
        let lobby_state = lobby_with(2, false);
        for _ in 0..50 {
            assert!(!auto.tick(&lobby_state, 1.0));
        }
    }

    #[test]
    fn locking_the_lobby_suppresses_auto_start() {
        let mut auto = AutoStart::new(AdminConfig { min_players: 1, ready_required: false, start_delay: 0.1, ..AdminConfig::default() });
        auto.lobby_locked = true;
        let lobby_state = lobby_with(1, false);
        assert!(!auto.tick(&lobby_state, 1.0));
    }
}
