//! Integration tests for the authentication service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bazaar_auth::config::AuthConfig;
use bazaar_auth::service::{AuthService, LoginCredentials, LoginInput, LoginPath};
use bazaar_auth::token::{self, TokenClaims};
use bazaar_auth::{AuthError, AuthResult};
use bazaar_core::error::{BazaarError, BazaarResult};
use bazaar_core::models::credential::{Credential, NewCredential};
use bazaar_core::repository::CredentialRepository;
use bazaar_db::repository::SurrealCredentialRepository;
use chrono::Duration;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

const SECRET: &str = "integration-test-secret";

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.into(),
        token_expires: "14d".into(),
        ..Default::default()
    }
}

/// Wraps the real store and counts lookups.
#[derive(Clone)]
struct CountingRepository {
    inner: SurrealCredentialRepository<Db>,
    lookups: Arc<AtomicUsize>,
}

impl CredentialRepository for CountingRepository {
    async fn find_by_login(&self, login: &str) -> BazaarResult<Option<Credential>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_login(login).await
    }

    async fn insert(&self, input: NewCredential) -> BazaarResult<Credential> {
        self.inner.insert(input).await
    }
}

/// A store whose backend is down.
struct UnavailableRepository;

impl CredentialRepository for UnavailableRepository {
    async fn find_by_login(&self, _login: &str) -> BazaarResult<Option<Credential>> {
        Err(BazaarError::Database("connection refused".into()))
    }

    async fn insert(&self, _input: NewCredential) -> BazaarResult<Credential> {
        Err(BazaarError::Database("connection refused".into()))
    }
}

/// Spin up in-memory DB, run migrations and wrap it in a counter.
async fn setup_with(config: AuthConfig) -> (AuthService<CountingRepository>, Arc<AtomicUsize>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    bazaar_db::run_migrations(&db).await.unwrap();

    let lookups = Arc::new(AtomicUsize::new(0));
    let repo = CountingRepository {
        inner: SurrealCredentialRepository::new(db),
        lookups: lookups.clone(),
    };
    (AuthService::new(repo, config), lookups)
}

async fn setup() -> (AuthService<CountingRepository>, Arc<AtomicUsize>) {
    setup_with(test_config()).await
}

fn creds(login: &str, password: &str) -> LoginCredentials {
    LoginCredentials {
        login: login.into(),
        password: password.into(),
    }
}

async fn register_alice(svc: &AuthService<CountingRepository>) -> i64 {
    svc.register(creds("alice", "secret1")).await.unwrap().user_id
}

// -----------------------------------------------------------------------
// Registration
// -----------------------------------------------------------------------

#[tokio::test]
async fn register_then_duplicate() {
    let (svc, _) = setup().await;

    let first = svc.register(creds("alice", "secret1")).await.unwrap();
    assert_eq!(first.login, "alice");

    let err = svc
        .register(creds("alice", "another-pass"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::DuplicateLogin);

    // The original password still works; the second was never stored.
    let out = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.identity.user_id, first.user_id);
}

#[tokio::test]
async fn register_rejects_bad_lengths() {
    let (svc, _) = setup().await;

    for (login, password) in [
        ("", "pw"),
        ("seventeen-chars-x", "pw"),
        ("bob", ""),
        ("bob", "this-password-is-way-over-32-chars"),
    ] {
        let err = svc.register(creds(login, password)).await.unwrap_err();
        assert!(
            matches!(err, AuthError::InvalidInput(_)),
            "{login:?}/{password:?} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn register_accepts_sixteen_char_login() {
    let (svc, _) = setup().await;
    let out = svc
        .register(creds("sixteen-chars-xx", "pw"))
        .await
        .unwrap();
    assert_eq!(out.login.chars().count(), 16);
}

// -----------------------------------------------------------------------
// Credential path
// -----------------------------------------------------------------------

#[tokio::test]
async fn login_with_correct_credentials() {
    let (svc, _) = setup().await;
    let user_id = register_alice(&svc).await;

    let out = svc
        .login(LoginInput {
            authorization: None,
            credentials: Some(creds("alice", "secret1")),
        })
        .await
        .unwrap();

    assert_eq!(out.path, LoginPath::Credentials);
    assert_eq!(out.identity.login, "alice");
    assert_eq!(out.identity.user_id, user_id);
    assert_eq!(out.authorization_header(), format!("Bearer {}", out.token));

    let claims = token::parse_token(&out.token, SECRET.as_bytes()).unwrap();
    assert_eq!(claims.login, "alice");
    assert_eq!(claims.user_id, user_id);
    assert!(!claims.is_expired());
}

#[tokio::test]
async fn login_wrong_password() {
    let (svc, _) = setup().await;
    register_alice(&svc).await;

    let err = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "wrongpass")),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn unknown_login_looks_like_wrong_password() {
    let (svc, _) = setup().await;
    register_alice(&svc).await;

    let err = svc
        .login(LoginInput {
            credentials: Some(creds("nobody", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn login_without_header_or_body() {
    let (svc, lookups) = setup().await;

    let err = svc.login(LoginInput::default()).await.unwrap_err();
    assert_eq!(err, AuthError::MissingCredentials);
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn store_failure_is_distinct_from_bad_password() {
    let svc = AuthService::new(UnavailableRepository, test_config());

    let err = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(
        matches!(err, AuthError::StoreUnavailable(_)),
        "expected StoreUnavailable, got: {err:?}"
    );
}

// -----------------------------------------------------------------------
// Token path
// -----------------------------------------------------------------------

#[tokio::test]
async fn valid_token_skips_credential_store() {
    let (svc, lookups) = setup().await;
    let user_id = register_alice(&svc).await;

    let first = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap();
    let header = first.authorization_header();
    let before = lookups.load(Ordering::SeqCst);

    let second = svc
        .login(LoginInput {
            authorization: Some(header.clone()),
            credentials: None,
        })
        .await
        .unwrap();

    assert_eq!(second.path, LoginPath::Token);
    assert_eq!(second.identity.user_id, user_id);
    assert_eq!(second.authorization_header(), header);
    assert_eq!(lookups.load(Ordering::SeqCst), before, "store was consulted");
}

#[tokio::test]
async fn expired_token_falls_back_to_credentials() {
    let (svc, _) = setup().await;
    let user_id = register_alice(&svc).await;

    let stale = TokenClaims::new(user_id, "alice", Duration::days(-1)).unwrap();
    let stale_token = token::issue_token(&stale, SECRET.as_bytes()).unwrap();

    let out = svc
        .login(LoginInput {
            authorization: Some(format!("Bearer {stale_token}")),
            credentials: Some(creds("alice", "secret1")),
        })
        .await
        .unwrap();

    assert_eq!(out.path, LoginPath::Credentials);
    assert_ne!(out.token, stale_token);
}

#[tokio::test]
async fn expired_token_without_body_is_missing_credentials() {
    let (svc, _) = setup().await;

    let stale = TokenClaims::new(1, "alice", Duration::days(-1)).unwrap();
    let stale_token = token::issue_token(&stale, SECRET.as_bytes()).unwrap();

    let err = svc
        .login(LoginInput {
            authorization: Some(format!("Bearer {stale_token}")),
            credentials: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::MissingCredentials);
}

#[tokio::test]
async fn garbled_header_falls_back_to_credentials() {
    let (svc, _) = setup().await;
    register_alice(&svc).await;

    for header in ["Token abc", "Bearer not.a.jwt", "Bearer"] {
        let out = svc
            .login(LoginInput {
                authorization: Some(header.into()),
                credentials: Some(creds("alice", "secret1")),
            })
            .await
            .unwrap();
        assert_eq!(out.path, LoginPath::Credentials, "header {header:?}");
    }
}

#[tokio::test]
async fn token_signed_with_other_secret_falls_back() {
    let (svc, _) = setup().await;
    let user_id = register_alice(&svc).await;

    let foreign = TokenClaims::new(user_id, "alice", Duration::days(1)).unwrap();
    let foreign_token = token::issue_token(&foreign, b"someone-else").unwrap();

    let err = svc
        .login(LoginInput {
            authorization: Some(format!("Bearer {foreign_token}")),
            credentials: Some(creds("alice", "wrongpass")),
        })
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
}

// -----------------------------------------------------------------------
// Identity gate
// -----------------------------------------------------------------------

#[tokio::test]
async fn authorize_accepts_only_valid_tokens() {
    let (svc, _) = setup().await;
    register_alice(&svc).await;

    let out = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap();

    let header = out.authorization_header();
    match svc.authorize(Some(&header)) {
        AuthResult::Authenticated(identity) => assert_eq!(identity.login, "alice"),
        other => panic!("expected Authenticated, got {other:?}"),
    }

    assert_eq!(
        svc.authorize(None),
        AuthResult::Rejected(AuthError::HeaderMissing)
    );
    assert_eq!(
        svc.authorize(Some("Token abc")),
        AuthResult::Rejected(AuthError::MalformedHeader)
    );

    let foreign = TokenClaims::new(1, "alice", Duration::days(1)).unwrap();
    let foreign = token::issue_token(&foreign, b"x").unwrap();
    assert_eq!(
        svc.authorize(Some(&format!("Bearer {foreign}"))),
        AuthResult::Rejected(AuthError::SignatureInvalid)
    );
}

#[tokio::test]
async fn zero_day_tokens_are_born_expired() {
    let (svc, _) = setup_with(AuthConfig {
        token_expires: "0d".into(),
        ..test_config()
    })
    .await;
    register_alice(&svc).await;

    let out = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(
        svc.authorize(Some(&out.authorization_header())),
        AuthResult::Rejected(AuthError::Expired)
    );
}

#[tokio::test]
async fn bad_expiry_config_surfaces_on_issue() {
    let (svc, _) = setup_with(AuthConfig {
        token_expires: "two weeks".into(),
        ..test_config()
    })
    .await;
    register_alice(&svc).await;

    let err = svc
        .login(LoginInput {
            credentials: Some(creds("alice", "secret1")),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidDurationFormat(_)));
}
