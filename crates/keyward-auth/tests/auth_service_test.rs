//! Integration tests for the authentication service.

use chrono::{Duration, Utc};
use keyward_auth::config::AuthConfig;
use keyward_auth::error::AuthError;
use keyward_auth::password::{self, PasswordHashParameters};
use keyward_auth::service::{AuthService, LoginInput, RegisterInput};
use keyward_core::repository::CredentialRepository;
use keyward_db::repository::{SurrealCredentialRepository, SurrealSessionRepository};
use keyward_db::{DbConfig, DbManager};
use surrealdb::engine::any::Any;

type Service = AuthService<SurrealCredentialRepository<Any>, SurrealSessionRepository<Any>>;

/// Cheap parameters so each test does not pay 64 MiB per hash.
fn fast_params() -> PasswordHashParameters {
    PasswordHashParameters::new(256, 1, 1, 16, 32).unwrap()
}

fn test_config() -> AuthConfig {
    AuthConfig {
        password_hash: fast_params(),
        session_ttl_secs: None,
        track_session_last_used: false,
        rehash_on_login: true,
        min_password_length: 12,
    }
}

/// Spin up an embedded in-memory DB with migrations applied.
async fn setup_with(config: AuthConfig) -> (Service, DbManager) {
    let db = DbManager::connect(&DbConfig {
        url: "mem://".into(),
        namespace: "test".into(),
        database: "test".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let svc = AuthService::new(
        db.credential_repository(),
        db.session_repository(),
        config,
    )
    .unwrap();
    (svc, db)
}

async fn setup() -> (Service, DbManager) {
    let (svc, db) = setup_with(test_config()).await;
    svc.register(RegisterInput {
        principal_id: "alice".into(),
        password: "correct-horse-battery".into(),
    })
    .await
    .unwrap();
    (svc, db)
}

fn login(principal: &str, password: &str) -> LoginInput {
    LoginInput {
        principal_id: principal.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_happy_path() {
    let (svc, _db) = setup().await;

    let out = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();

    assert_eq!(out.principal_id, "alice");
    assert_eq!(out.token.len(), 32);
    assert_eq!(svc.authenticate(&out.token).await.unwrap(), "alice");
}

#[tokio::test]
async fn each_login_opens_a_new_session() {
    let (svc, _db) = setup().await;

    let first = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
    let second = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();

    assert_ne!(first.token, second.token);
    assert_eq!(svc.authenticate(&first.token).await.unwrap(), "alice");
    assert_eq!(svc.authenticate(&second.token).await.unwrap(), "alice");
}

#[tokio::test]
async fn wrong_password_and_unknown_principal_look_the_same() {
    let (svc, _db) = setup().await;

    let wrong = svc
        .login(login("alice", "wrong-password-here"))
        .await
        .unwrap_err();
    let unknown = svc
        .login(login("mallory", "correct-horse-battery"))
        .await
        .unwrap_err();

    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert_eq!(wrong.public_message(), unknown.public_message());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (svc, _db) = setup().await;

    let err = svc
        .register(RegisterInput {
            principal_id: "alice".into(),
            password: "another-long-password".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PrincipalExists));

    // The original password still works.
    svc.login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
}

#[tokio::test]
async fn short_password_is_rejected() {
    let (svc, db) = setup_with(test_config()).await;

    let err = svc
        .register(RegisterInput {
            principal_id: "bob".into(),
            password: "short".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PasswordTooShort { min: 12 }));

    // Nothing was stored.
    let stored = db.credential_repository().get_credential("bob").await;
    assert!(stored.unwrap_err().is_not_found());
}

#[tokio::test]
async fn stored_credential_is_an_encoded_hash() {
    let (_svc, db) = setup().await;

    let cred = db
        .credential_repository()
        .get_credential("alice")
        .await
        .unwrap();
    assert!(cred.password_hash.starts_with("$argon2id$v=19$m=256,t=1,p=1$"));
    assert!(!cred.password_hash.contains("correct-horse-battery"));
}

#[tokio::test]
async fn logout_invalidates_session() {
    let (svc, _db) = setup().await;

    let out = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
    svc.logout(&out.token).await.unwrap();

    let err = svc.authenticate(&out.token).await.unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound));
    assert!(err.is_unauthenticated());
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let (svc, _db) = setup().await;

    let err = svc.authenticate("not-a-real-token").await.unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound));
}

#[tokio::test]
async fn session_expires_after_ttl() {
    let (svc, _db) = setup_with(AuthConfig {
        session_ttl_secs: Some(60),
        ..test_config()
    })
    .await;
    svc.register(RegisterInput {
        principal_id: "alice".into(),
        password: "correct-horse-battery".into(),
    })
    .await
    .unwrap();

    let out = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
    assert_eq!(svc.authenticate(&out.token).await.unwrap(), "alice");

    let later = Utc::now() + Duration::seconds(61);
    let err = svc
        .sessions()
        .validate_at(&out.token, later)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(err.public_message(), "unauthenticated");
}

#[tokio::test]
async fn last_use_is_recorded_when_enabled() {
    let (svc, db) = setup_with(AuthConfig {
        track_session_last_used: true,
        ..test_config()
    })
    .await;
    svc.register(RegisterInput {
        principal_id: "alice".into(),
        password: "correct-horse-battery".into(),
    })
    .await
    .unwrap();

    let out = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
    svc.authenticate(&out.token).await.unwrap();

    use keyward_core::repository::SessionRepository;
    let key = keyward_auth::token::token_key(&out.token);
    let session = db.session_repository().get_session(&key).await.unwrap();
    assert!(session.last_used_at.is_some());
}

#[tokio::test]
async fn legacy_hash_is_upgraded_on_login() {
    let (svc, db) = setup_with(test_config()).await;
    let repo = db.credential_repository();

    let legacy = PasswordHashParameters::new(64, 2, 1, 8, 16).unwrap();
    let old_hash = password::hash_password(b"legacy-password-1", &legacy)
        .unwrap()
        .to_string();
    repo.put_credential("carol", &old_hash).await.unwrap();

    svc.login(login("carol", "legacy-password-1"))
        .await
        .unwrap();

    let upgraded = repo.get_credential("carol").await.unwrap().password_hash;
    assert_ne!(upgraded, old_hash);
    assert!(!password::needs_rehash(&upgraded, &fast_params()).unwrap());
    assert!(password::verify_password(b"legacy-password-1", &upgraded).unwrap());

    // And the upgraded hash keeps working.
    svc.login(login("carol", "legacy-password-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn legacy_hash_is_kept_when_rehash_disabled() {
    let (svc, db) = setup_with(AuthConfig {
        rehash_on_login: false,
        ..test_config()
    })
    .await;
    let repo = db.credential_repository();

    let legacy = PasswordHashParameters::new(64, 2, 1, 8, 16).unwrap();
    let old_hash = password::hash_password(b"legacy-password-1", &legacy)
        .unwrap()
        .to_string();
    repo.put_credential("carol", &old_hash).await.unwrap();

    svc.login(login("carol", "legacy-password-1"))
        .await
        .unwrap();

    assert_eq!(
        repo.get_credential("carol").await.unwrap().password_hash,
        old_hash
    );
}

#[tokio::test]
async fn corrupt_stored_hash_is_surfaced() {
    let (svc, db) = setup_with(test_config()).await;
    let repo = db.credential_repository();

    repo.put_credential("dave", "$argon2id$v=19$m=64,t=1,p=1$truncated")
        .await
        .unwrap();
    let err = svc
        .login(login("dave", "whatever-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidHashFormat(_)), "{err:?}");
    assert!(!err.is_unauthenticated());
}

#[tokio::test]
async fn unsupported_version_is_surfaced() {
    let (svc, db) = setup_with(test_config()).await;
    let repo = db.credential_repository();

    let hash = password::hash_password(b"versioned-password", &fast_params())
        .unwrap()
        .to_string()
        .replace("v=19", "v=16");
    repo.put_credential("erin", &hash).await.unwrap();

    let err = svc
        .login(login("erin", "versioned-password"))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            AuthError::UnsupportedVersion {
                found: 16,
                expected: 19
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let db = DbManager::connect(&DbConfig {
        url: "mem://".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let result = AuthService::new(
        db.credential_repository(),
        db.session_repository(),
        AuthConfig {
            session_ttl_secs: Some(0),
            ..test_config()
        },
    );
    assert!(matches!(result, Err(AuthError::InvalidParameters(_))));
}

#[test]
fn input_debug_redacts_password() {
    let input = login("alice", "correct-horse-battery");
    let shown = format!("{input:?}");
    assert!(shown.contains("alice"));
    assert!(!shown.contains("correct-horse-battery"));
}

#[tokio::test]
async fn login_output_debug_hides_token() {
    let (svc, _db) = setup().await;

    let out = svc
        .login(login("alice", "correct-horse-battery"))
        .await
        .unwrap();
    let shown = format!("{out:?}");
    assert!(shown.contains("alice"));
    assert!(!shown.contains(&out.token));
}
