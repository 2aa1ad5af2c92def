// Shared primitives for one-time server bootstrapping across integration tests.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use arena_authority::frameworks::config;
use arena_authority::interface_adapters::http;
use arena_authority::interface_adapters::net::run_listener;
use arena_authority::interface_adapters::state::AppState;
use arena_authority::use_cases::types::AdminConfig;
use arena_authority::use_cases::AuthorityHandle;

pub struct Harness {
    pub game_addr: std::net::SocketAddr,
    pub admin_url: String,
}

static HARNESS: OnceLock<Harness> = OnceLock::new();

/// Boots the authority once per test binary: a game TCP listener and an
/// admin HTTP listener, both on ephemeral ports, on a dedicated background
/// runtime so individual `#[tokio::test]`s can connect to a stable server.
pub fn ensure_server() -> &'static Harness {
    HARNESS.get_or_init(|| {
        let published = Arc::new(OnceLock::<(std::net::SocketAddr, std::net::SocketAddr)>::new());
        let published_thread = Arc::clone(&published);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let config = AdminConfig { auto_start: false, ..AdminConfig::default() };
                let authority =
                    AuthorityHandle::spawn(config, config::map_dir(), None, config::AUTHORITY_CHANNEL_CAPACITY);

                let game_listener =
                    tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral game port");
                let game_addr = game_listener.local_addr().expect("game addr");
                // Drop immediately so `run_listener` can rebind the same ephemeral port;
                // nothing else races for it between here and the rebind.
                drop(game_listener);

                let state = AppState { authority: authority.clone(), admin_token: None };
                let admin_listener =
                    tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral admin port");
                let admin_addr = admin_listener.local_addr().expect("admin addr");

                let _ = published_thread.set((game_addr, admin_addr));

                tokio::spawn(async move {
                    let _ = axum::serve(admin_listener, http::router(state)).await;
                });

                // Reuse the already-bound listener's address for the long-running accept loop.
                let _ = run_listener(game_addr, authority).await;
            });
        });

        let (game_addr, admin_addr) = loop {
            if let Some(addrs) = published.get() {
                break *addrs;
            }
            std::thread::sleep(Duration::from_millis(10));
        };

        for _ in 0..200 {
            if std::net::TcpStream::connect(admin_addr).is_ok() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        Harness { game_addr, admin_url: format!("http://{admin_addr}") }
    })
}
