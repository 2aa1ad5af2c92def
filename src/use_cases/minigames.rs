// Minigame hook registry. Each minigame is a descriptor loaded
// from a directory of JSON files at startup; the server only needs a
// handful of hooks to run the duel wheel, so we load descriptors as plain
// data rather than executing arbitrary minigame code.

use crate::domain::MinigameId;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Always available even if no descriptor directory is configured or
/// readable, so the duel wheel never comes up empty.
pub const FALLBACK_MINIGAMES: &[&str] = &["rps_duel"];

#[derive(Debug, Clone, Deserialize)]
pub struct MinigameDescriptor {
    pub minigame_id: String,
    #[serde(default = "default_true")]
    pub multiplayer_enabled: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: HashMap<MinigameId, MinigameDescriptor>,
}

impl Registry {
    /// Loads `*.json` descriptor files from `dir`, falling back to the
    /// built-in `rps_duel` entry when the directory is missing, unreadable,
    /// or simply doesn't define it.
    pub fn load(dir: Option<&Path>) -> Self {
        let mut descriptors = HashMap::new();

        if let Some(dir) = dir {
            match std::fs::read_dir(dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        let path = entry.path();
                        if path.extension().and_then(|e| e.to_str()) != Some("json") {
                            continue;
                        }
                        match std::fs::read_to_string(&path)
                            .ok()
                            .and_then(|s| serde_json::from_str::<MinigameDescriptor>(&s).ok())
                        {
                            Some(desc) => {
                                descriptors.insert(Arc::from(desc.minigame_id.as_str()), desc);
                            }
                            None => warn!(path = %path.display(), "skipping unreadable minigame descriptor"),
                        }
                    }
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "minigame descriptor directory unreadable, using fallback set");
                }
            }
        }

        for id in FALLBACK_MINIGAMES {
            descriptors.entry(Arc::from(*id)).or_insert_with(|| MinigameDescriptor {
                minigame_id: id.to_string(),
                multiplayer_enabled: true,
                display_name: None,
            });
        }

        Self { descriptors }
    }

    pub fn get(&self, id: &str) -> Option<&MinigameDescriptor> {
        self.descriptors.get(id)
    }

    /// All minigames eligible to appear on the duel wheel.
    pub fn multiplayer_entries(&self) -> Vec<MinigameId> {
        let mut ids: Vec<MinigameId> = self
            .descriptors
            .values()
            .filter(|d| d.multiplayer_enabled)
            .map(|d| Arc::from(d.minigame_id.as_str()))
            .collect();
        ids.sort();
        ids
    }
}

/// Rock-paper-scissors choices, the only minigame with native server-side
/// resolution logic; everything else is relayed opaquely to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rock" => Some(Self::Rock),
            "paper" => Some(Self::Paper),
            "scissors" => Some(Self::Scissors),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }

    /// Uniform-random choice for an NPC duel participant.
    pub fn ai_choice(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..3) {
            0 => Self::Rock,
            1 => Self::Paper,
            _ => Self::Scissors,
        }
    }

    /// `Some(true)` if `self` beats `other`, `Some(false)` if it loses,
    /// `None` on a tie.
    pub fn beats(self, other: Self) -> Option<bool> {
        use RpsChoice::*;
        if self == other {
            return None;
        }
        let wins = matches!((self, other), (Rock, Scissors) | (Scissors, Paper) | (Paper, Rock));
        Some(wins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_registry_always_has_rps_duel() {
        let reg = Registry::load(None);
        assert!(reg.get("rps_duel").is_some());
        assert!(reg.multiplayer_entries().contains(&Arc::from("rps_duel")));
    }

    #[test]
    fn rps_resolves_rock_paper_scissors_cycle() {
        assert_eq!(RpsChoice::Rock.beats(RpsChoice::Scissors), Some(true));
        assert_eq!(RpsChoice::Scissors.beats(RpsChoice::Rock), Some(false));
        assert_eq!(RpsChoice::Rock.beats(RpsChoice::Rock), None);
    }
}
