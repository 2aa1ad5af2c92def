// Entity elimination bookkeeping. Humans are flagged and kept
// around (so the client can render a spectator/eliminated state); bots are
// removed outright once eliminated.

use crate::domain::state::MatchState;
use crate::domain::{is_bot_id, PlayerId};

/// Eliminates `player_id` from the running match. Returns `true` if the
/// entity existed and was eliminated.
pub fn eliminate(match_state: &mut MatchState, player_id: &PlayerId) -> bool {
    let existed = match_state.entities.contains_key(player_id);
    if !existed {
        return false;
    }

    if is_bot_id(player_id) {
        match_state.entities.remove(player_id);
        match_state.eliminated_bots.insert(player_id.clone());
    } else {
        match_state.eliminated_humans.insert(player_id.clone());
    }

    match_state.inputs.remove(player_id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::MatchEntity;
    use std::sync::Arc;

    fn entity(id: &str, is_npc: bool) -> MatchEntity {
        MatchEntity {
            player_id: Arc::from(id),
            pos: (0.0, 0.0),
            vel: (0.0, 0.0),
            char_name: "default".into(),
            is_npc,
            display_name: id.into(),
            outside_timer: 0.0,
            wander: None,
            idle_timer: 0.0,
        }
    }

    fn base_match() -> MatchState {
        MatchState::new("seed".into(), (1000.0, 1000.0), Vec::new())
    }

    #[test]
    fn bot_is_removed_on_elimination() {
        let mut m = base_match();
        let id: PlayerId = Arc::from("npc-0");
        m.entities.insert(id.clone(), entity("npc-0", true));
        assert!(eliminate(&mut m, &id));
        assert!(!m.entities.contains_key(&id));
        assert!(m.eliminated_bots.contains(&id));
    }

    #[test]
    fn human_is_flagged_and_retained() {
        let mut m = base_match();
        let id: PlayerId = Arc::from("p1");
        m.entities.insert(id.clone(), entity("p1", false));
        assert!(eliminate(&mut m, &id));
        assert!(m.entities.contains_key(&id));
        assert!(m.eliminated_humans.contains(&id));
    }

    #[test]
    fn eliminating_unknown_entity_is_a_no_op() {
        let mut m = base_match();
        let id: PlayerId = Arc::from("ghost");
        assert!(!eliminate(&mut m, &id));
    }
}
