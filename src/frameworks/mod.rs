// Frameworks & drivers: CLI parsing, process bootstrap, runtime/tracing init.

pub mod cli;
pub mod config;
pub mod server;
