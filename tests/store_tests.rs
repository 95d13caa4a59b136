//! Store-level tests that need real connection-pool concurrency, so they
//! run against a throwaway file-backed database instead of `::memory:`.

use alumni_connect::config::SecurityConfig;
use alumni_connect::db::repositories::user::hash_password;
use alumni_connect::db::{ConsumeOutcome, DecisionOutcome, NewApplication, Store};
use alumni_connect::entities::mentor_applications::ApplicationStatus;
use alumni_connect::entities::users::Role;

fn cheap_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        reset_token_ttl_hours: 2,
    }
}

/// Unique path per test so parallel test binaries never share a database.
fn temp_db_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "alumni-connect-{tag}-{}-{nanos}.db",
        std::process::id()
    ))
}

fn remove_db(path: &std::path::Path) {
    std::fs::remove_file(path).ok();
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        std::fs::remove_file(side).ok();
    }
}

#[tokio::test]
async fn concurrent_consume_has_single_winner() {
    let path = temp_db_path("consume");
    let db_url = format!("sqlite:{}", path.display());
    let store = Store::with_pool_options(&db_url, 5, 1).await.unwrap();
    let security = cheap_security();

    let user = store
        .create_user("rey", "original-pass", Role::User, None, &security)
        .await
        .unwrap()
        .unwrap();

    let token = "b".repeat(64);
    let expires = (chrono::Utc::now() + chrono::Duration::hours(2)).to_rfc3339();
    store
        .insert_reset_token(user.id, &token, &expires)
        .await
        .unwrap();

    let hash_a = hash_password("first-new-pass", &security).unwrap();
    let hash_b = hash_password("second-new-pass", &security).unwrap();

    let (a, b) = tokio::join!(
        store.consume_reset_token(&token, &hash_a),
        store.consume_reset_token(&token, &hash_b),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let wins = outcomes
        .iter()
        .filter(|o| matches!(o, ConsumeOutcome::Consumed { .. }))
        .count();
    assert_eq!(wins, 1, "exactly one consumer must claim the token");
    assert!(outcomes.contains(&ConsumeOutcome::InvalidOrExpired));
    assert_eq!(store.count_reset_tokens(user.id).await.unwrap(), 0);

    // Whichever hash won, exactly one of the two passwords verifies.
    let verified = [
        store
            .verify_credentials("rey", "first-new-pass", &security)
            .await
            .unwrap(),
        store
            .verify_credentials("rey", "second-new-pass", &security)
            .await
            .unwrap(),
    ];
    assert_eq!(verified.iter().filter(|v| v.is_some()).count(), 1);

    remove_db(&path);
}

#[tokio::test]
async fn concurrent_approve_creates_one_mentorship() {
    let path = temp_db_path("approve");
    let db_url = format!("sqlite:{}", path.display());
    let store = Store::with_pool_options(&db_url, 5, 1).await.unwrap();

    let app = store
        .submit_mentor_application(NewApplication {
            user_id: None,
            name: "Vikram".to_string(),
            email: "vikram@example.com".to_string(),
            field: "Databases".to_string(),
            note: "Ten years at a storage vendor".to_string(),
        })
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        store.approve_mentor_application(app.id),
        store.approve_mentor_application(app.id),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let decided = outcomes
        .iter()
        .filter(|o| matches!(o, DecisionOutcome::Decided))
        .count();
    assert_eq!(decided, 1, "exactly one approval must win");
    // The loser reports the state the winner installed.
    assert!(outcomes.contains(&DecisionOutcome::AlreadyDecided(ApplicationStatus::Approved)));

    let mentorships = store.list_mentorships().await.unwrap();
    assert_eq!(mentorships.len(), 1);
    assert_eq!(mentorships[0].title, "Mentor: Vikram");

    remove_db(&path);
}
