use std::env;

// Runtime/server constants (not gameplay tuning; those live in
// `use_cases::types::AdminConfig` and `domain::state::MatchState::new`).

pub fn headless_admin_token() -> Option<String> {
    env::var("HEADLESS_ADMIN_TOKEN").ok().filter(|v| !v.is_empty())
}

pub fn minigame_descriptor_dir() -> Option<std::path::PathBuf> {
    env::var("MINIGAME_DESCRIPTOR_DIR").ok().map(std::path::PathBuf::from)
}

pub fn map_dir() -> std::path::PathBuf {
    env::var("MAP_DIR").ok().map(std::path::PathBuf::from).unwrap_or_else(|| std::path::PathBuf::from("maps"))
}

/// Capacity for the authority's single inbound command queue.
pub const AUTHORITY_CHANNEL_CAPACITY: usize = 1024;
