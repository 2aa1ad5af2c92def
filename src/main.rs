use arena_authority::frameworks::cli::Args;
use arena_authority::frameworks::server;
use clap::Parser;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = server::run_with_args(args).await {
        tracing::error!(error = %e, "arena authority exited with error");
        std::process::exit(1);
    }
}
