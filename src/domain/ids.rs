// Opaque identifiers shared across the authority.
//
// IDs are `Arc<str>` rather than `String` so cloning a participant list or a
// duel record doesn't allocate.

use std::sync::Arc;

pub type PlayerId = Arc<str>;
pub type DuelId = Arc<str>;
pub type MinigameId = Arc<str>;

/// Bots are distinguished by an `npc-` id prefix rather than a separate type.
pub const NPC_PREFIX: &str = "npc-";

pub fn is_bot_id(id: &str) -> bool {
    id.starts_with(NPC_PREFIX)
}

pub fn npc_id(index: usize) -> PlayerId {
    Arc::from(format!("{NPC_PREFIX}{index}"))
}
