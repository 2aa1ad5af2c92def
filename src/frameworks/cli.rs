// Command-line surface for the dedicated server binary.

use crate::use_cases::types::AdminConfig;
use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(
    name = "arena-authority",
    version,
    about = "Authoritative arena battle-royale match server",
    long_about = "Runs the lobby/match/duel authority over raw TCP and exposes a \
                  headless admin façade over HTTP."
)]
pub struct Args {
    /// Game listener host
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Game listener port
    #[arg(long, default_value_t = 8765)]
    pub port: u16,

    /// Admin HTTP listener host
    #[arg(long, default_value = "0.0.0.0")]
    pub web_host: String,

    /// Admin HTTP listener port
    #[arg(long, default_value_t = 5000)]
    pub web_port: u16,

    /// Automatically start a match once the lobby is ready
    #[arg(long, default_value_t = true, overrides_with = "no_auto_start")]
    pub auto_start: bool,
    #[arg(long = "no-auto-start", action = clap::ArgAction::SetFalse, overrides_with = "auto_start")]
    no_auto_start: bool,

    /// Minimum players required before auto-start may fire
    #[arg(long, default_value_t = 2)]
    pub min_players: usize,

    /// Require every player to flag ready before auto-start may fire
    #[arg(long, default_value_t = true, overrides_with = "no_ready_required")]
    pub ready_required: bool,
    #[arg(long = "no-ready-required", action = clap::ArgAction::SetFalse, overrides_with = "ready_required")]
    no_ready_required: bool,

    /// Seconds to wait for stragglers to ready up
    #[arg(long, default_value_t = 20.0)]
    pub ready_timeout: f32,

    /// Countdown seconds once the lobby is ready, before the match starts
    #[arg(long, default_value_t = 5.0)]
    pub start_delay: f32,

    /// Seconds to hold the lobby open after a match ends before accepting joins
    #[arg(long, default_value_t = 5.0)]
    pub reset_delay: f32,

    /// Pinned map name
    #[arg(long, default_value = "test_arena")]
    pub map_name: String,
}

impl Args {
    pub fn game_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }

    pub fn admin_addr(&self) -> SocketAddr {
        format!("{}:{}", self.web_host, self.web_port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.web_port)))
    }

    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            auto_start: self.auto_start,
            min_players: self.min_players,
            ready_required: self.ready_required,
            ready_timeout: self.ready_timeout,
            start_delay: self.start_delay,
            reset_delay: self.reset_delay,
            map_name: self.map_name.clone(),
        }
    }
}
