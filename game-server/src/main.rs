use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use game_core::WordCatalog;
use game_persistence::connection::connect_and_migrate;
use game_server::{
    config::Config, create_routes, game_manager::GameManager, language_sync::LanguageSync,
    rate_limiter::RateLimiter, username_policy::UsernamePolicy,
};

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting wordle server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Loading languages from directory: {}",
        config.data_directory.display()
    );
    let catalog = match WordCatalog::load_dir(&config.data_directory, config.game.word_length) {
        Ok(catalog) => {
            info!("Loaded languages: {}", catalog.languages().join(", "));
            catalog
        }
        Err(e) => {
            error!(
                "Failed to load languages from '{}': {}",
                config.data_directory.display(),
                e
            );
            error!("Set DATA_DIRECTORY to a directory containing <code>.json language files.");
            std::process::exit(1);
        }
    };

    let policy = match UsernamePolicy::load(
        &config.username_filter_file,
        &config.username_blocklist_file,
    ) {
        Ok(policy) => policy,
        Err(e) => {
            error!("Failed to build username policy: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let game_manager = Arc::new(GameManager::new(
        db,
        catalog,
        config.data_directory.clone(),
        config.game,
        policy,
    ));

    if let Some(upstream) = &config.upstream_language_url {
        info!("Syncing languages from {}", upstream);
        match LanguageSync::new(upstream.clone()).sync_all(&game_manager).await {
            Ok(updated) => info!("Language sync finished, {} updated", updated),
            Err(e) => error!("Language sync failed: {}", e),
        }
    }

    let rate_limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute));

    // Forget clients whose buckets have refilled
    let pruned_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            pruned_limiter.prune_idle();
        }
    });

    let routes = create_routes(game_manager, rate_limiter, config.version.clone());

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) = match warp::serve(routes)
        .try_bind_with_graceful_shutdown((ip, config.port), shutdown_signal())
    {
        Ok(bound) => bound,
        Err(e) => {
            error!("Failed to bind {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
    #[cfg(unix)]
    {
        let (mut sigint, mut sigterm) = match (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
