
use game_server::create_routes;
use game_server::language_sync::{LanguageSync, SyncOutcome};
use game_server::rate_limiter::RateLimiter;
use std::net::SocketAddr;
use std::sync::Arc;
use test_helpers::*;

/// Serve `setup` on an ephemeral local port and return its base URL.
fn serve(setup: &TestGameServerSetup) -> String {
    let routes = create_routes(
        setup.game_manager.clone(),
        Arc::new(RateLimiter::per_minute(1000)),
        "test".to_string(),
    );
    let (addr, server): (SocketAddr, _) =
        warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

async fn upstream() -> TestGameServerSetup {
    let data_dir = TestDataDir::new()
        .with_language("en", &english_document())
        .with_language("de", &german_document());
    TestGameServerSetup::with_data_dir(data_dir).await
}

#[tokio::test]
async fn test_remote_queries() {
    let upstream = upstream().await;
    let sync = LanguageSync::new(serve(&upstream));

    assert_eq!(
        sync.remote_languages().await.unwrap(),
        vec!["de".to_string(), "en".to_string()]
    );
    assert_eq!(
        sync.remote_checksum("de").await.unwrap(),
        game_core::checksum(&german_document())
    );
    assert_eq!(sync.download("de").await.unwrap(), german_document());
    assert!(sync.remote_checksum("xx").await.is_err());
}

#[tokio::test]
async fn test_sync_installs_missing_languages() {
    let upstream = upstream().await;
    let sync = LanguageSync::new(serve(&upstream));
    let local = TestGameServerSetup::new().await;

    assert_eq!(
        sync.sync_language(&local.game_manager, "en").await.unwrap(),
        SyncOutcome::UpToDate
    );

    let updated = sync.sync_all(&local.game_manager).await.unwrap();
    assert_eq!(updated, 1);
    assert_eq!(
        local.game_manager.languages().await,
        vec!["de".to_string(), "en".to_string()]
    );
    assert!(local.data_dir.path().join("de.json").exists());

    // Nothing left to do on a second pass
    assert_eq!(sync.sync_all(&local.game_manager).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sync_replaces_changed_language() {
    let upstream = upstream().await;
    let sync = LanguageSync::new(serve(&upstream));

    let stale = serde_json::to_vec(&serde_json::json!({
        "wordlist": ["crane", "slate"],
        "solutions": ["slate"],
        "letters": ALPHABET,
    }))
    .unwrap();
    let local =
        TestGameServerSetup::with_data_dir(TestDataDir::new().with_language("en", &stale)).await;

    let outcome = sync.sync_language(&local.game_manager, "en").await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            checksum: game_core::checksum(&english_document())
        }
    );

    // Every new game now draws from the refreshed list
    let response = local
        .game_manager
        .start_game("alice", "secret", "en")
        .await
        .unwrap();
    assert_eq!(response.letters.len(), 26);
    let response = local
        .game_manager
        .submit_guess("alice", "secret", "crane")
        .await
        .unwrap();
    assert_eq!(response.game_status, game_types::GameStatus::Won);
}
