// Domain layer: core simulation types and pure transition functions.
//
// Nothing in this module touches tokio, the network, or wall-clock time
// directly; callers pass in `dt` and RNGs so behaviour stays deterministic
// and unit-testable.

pub mod ids;
pub mod map;
pub mod rng;
pub mod state;
pub mod systems;

pub use ids::{is_bot_id, npc_id, DuelId, MinigameId, PlayerId};
pub use state::{
    DuelRecord, DuelRequest, DuelResult, LobbyPlayer, LobbyState, MatchEntity, MatchState,
    WanderState,
};
