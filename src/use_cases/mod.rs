// Use cases layer: application workflows for the match server. Every
// module here is either a pure function over `domain` state or, for
// `authority`, the single actor that owns and serializes all of it.

pub mod admin;
pub mod authority;
pub mod duel;
pub mod eliminator;
pub mod lobby;
pub mod match_sim;
pub mod minigames;
pub mod types;

pub use authority::AuthorityHandle;
pub use types::{AuthorityCommand, Outbound, OutboundEvent};
