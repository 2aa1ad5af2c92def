// Framework bootstrap: tracing/runtime init plus the two listeners (game TCP,
// admin HTTP) that front the single authority actor.

use crate::frameworks::cli::Args;
use crate::frameworks::config;
use crate::interface_adapters::http;
use crate::interface_adapters::net::run_listener;
use crate::interface_adapters::state::AppState;
use crate::use_cases::AuthorityHandle;

use std::io::Result;

pub fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run_with_args(args: Args) -> Result<()> {
    init_runtime();

    let game_addr = args.game_addr();
    let admin_addr = args.admin_addr();
    let admin_config = args.admin_config();

    let authority = AuthorityHandle::spawn(
        admin_config,
        config::map_dir(),
        config::minigame_descriptor_dir(),
        config::AUTHORITY_CHANNEL_CAPACITY,
    );

    let admin_token = config::headless_admin_token();
    let state = AppState { authority: authority.clone(), admin_token };
    let router = http::router(state);

    let admin_listener = tokio::net::TcpListener::bind(admin_addr).await.inspect_err(|e| {
        tracing::error!(%admin_addr, error = %e, "failed to bind admin listener");
    })?;
    tracing::info!(%admin_addr, "admin http listening");
    let admin_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(admin_listener, router).await {
            tracing::error!(error = %e, "admin http server error");
        }
    });

    tracing::info!(%game_addr, "arena authority starting");
    let game_result = run_listener(game_addr, authority).await;

    admin_server.abort();
    game_result
}
