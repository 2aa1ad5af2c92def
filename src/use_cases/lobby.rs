// Operations on the single lobby the authority owns. There is
// exactly one lobby per server process, so these are plain functions over
// `domain::LobbyState`, not a registry of handles.

use crate::domain::state::{LobbyPlayer, LobbyState};
use crate::domain::PlayerId;

const MAX_NAME_CODEPOINTS: usize = 24;
const MAX_CHAR_CODEPOINTS: usize = 32;
const DEFAULT_NAME: &str = "Player";

fn truncate_codepoints(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Adds a freshly-connected player to the lobby with a placeholder name,
/// unready, no chosen character. Returns `false` if already present.
pub fn on_accept(lobby: &mut LobbyState, player_id: PlayerId) -> bool {
    if lobby.player(&player_id).is_some() {
        return false;
    }
    let is_first = lobby.players.is_empty();
    let name = format!("{DEFAULT_NAME} {}", lobby.players.len() + 1);
    lobby.players.push(LobbyPlayer {
        player_id: player_id.clone(),
        name,
        ready: false,
        char_name: "default".to_string(),
    });
    if is_first {
        lobby.host_id = Some(player_id);
    }
    true
}

/// Sets the display name for a lobby player, truncating to 24 codepoints and
/// falling back to the default name if empty after truncation.
pub fn hello(lobby: &mut LobbyState, player_id: &PlayerId, name: &str) {
    let trimmed = truncate_codepoints(name.trim(), MAX_NAME_CODEPOINTS);
    let name = if trimmed.is_empty() { DEFAULT_NAME.to_string() } else { trimmed };
    if let Some(p) = lobby.player_mut(player_id) {
        p.name = name;
    }
}

pub fn set_ready(lobby: &mut LobbyState, player_id: &PlayerId, ready: bool) {
    if let Some(p) = lobby.player_mut(player_id) {
        p.ready = ready;
    }
}

pub fn set_char(lobby: &mut LobbyState, player_id: &PlayerId, char_name: &str) {
    let name = truncate_codepoints(char_name.trim(), MAX_CHAR_CODEPOINTS);
    if let Some(p) = lobby.player_mut(player_id) {
        p.char_name = if name.is_empty() { "default".to_string() } else { name };
    }
}

/// Removes a player from the lobby, promoting the next-joined player to host
/// if the departing player was host. Returns `true` if the player was present.
pub fn on_disconnect(lobby: &mut LobbyState, player_id: &PlayerId) -> bool {
    let idx = lobby.players.iter().position(|p| &p.player_id == player_id);
    let Some(idx) = idx else { return false };
    lobby.players.remove(idx);
    if lobby.is_host(player_id) {
        lobby.host_id = lobby.players.first().map(|p| p.player_id.clone());
    }
    true
}

pub fn all_ready(lobby: &LobbyState, min_players: usize) -> bool {
    lobby.players.len() >= min_players && lobby.players.iter().all(|p| p.ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> LobbyState {
        LobbyState::default()
    }

    #[test]
    fn first_joiner_becomes_host() {
        let mut l = lobby();
        on_accept(&mut l, std::sync::Arc::from("a"));
        on_accept(&mut l, std::sync::Arc::from("b"));
        assert_eq!(l.host_id.as_deref(), Some("a"));
    }

    #[test]
    fn hello_truncates_and_falls_back_to_default() {
        let mut l = lobby();
        let id: PlayerId = std::sync::Arc::from("a");
        on_accept(&mut l, id.clone());
        hello(&mut l, &id, &"x".repeat(40));
        assert_eq!(l.player(&id).unwrap().name.chars().count(), MAX_NAME_CODEPOINTS);

        hello(&mut l, &id, "   ");
        assert_eq!(l.player(&id).unwrap().name, DEFAULT_NAME);
    }

    #[test]
    fn on_accept_assigns_numbered_default_names() {
        let mut l = lobby();
        let a: PlayerId = std::sync::Arc::from("a");
        let b: PlayerId = std::sync::Arc::from("b");
        on_accept(&mut l, a.clone());
        on_accept(&mut l, b.clone());
        assert_eq!(l.player(&a).unwrap().name, "Player 1");
        assert_eq!(l.player(&b).unwrap().name, "Player 2");
    }

    #[test]
    fn host_promotion_on_disconnect() {
        let mut l = lobby();
        let a: PlayerId = std::sync::Arc::from("a");
        let b: PlayerId = std::sync::Arc::from("b");
        on_accept(&mut l, a.clone());
        on_accept(&mut l, b.clone());
        on_disconnect(&mut l, &a);
        assert_eq!(l.host_id.as_deref(), Some("b"));
    }

    #[test]
    fn all_ready_requires_min_players_and_all_flags() {
        let mut l = lobby();
        let a: PlayerId = std::sync::Arc::from("a");
        on_accept(&mut l, a.clone());
        assert!(!all_ready(&l, 2));
        set_ready(&mut l, &a, true);
        assert!(!all_ready(&l, 2));
    }
}
