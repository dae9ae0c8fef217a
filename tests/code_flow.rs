use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drive_auth::{acquire_via_auth_code, AuthError, CredentialRecord, OAuthConfig, TokenStore};

const CLIENT_ID: &str = "client-abc.apps.example";

fn config_for(server: &MockServer) -> OAuthConfig {
    OAuthConfig::new(CLIENT_ID, "s3cret").with_endpoints(
        "https://accounts.example.test/o/oauth2/auth",
        format!("{}/token", server.uri()),
    )
}

/// Prompt that records every URL it is shown and answers with `code`.
fn recording_prompt(
    code: &'static str,
) -> (
    impl Fn(&str) -> Result<String, AuthError> + Send + Sync,
    Arc<Mutex<Vec<String>>>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let prompt = move |url: &str| -> Result<String, AuthError> {
        log.lock().unwrap().push(url.to_string());
        Ok(code.to_string())
    };
    (prompt, seen)
}

fn refusing_prompt(url: &str) -> Result<String, AuthError> {
    panic!("prompt must not be invoked, was shown {url}");
}

fn cached_record(refresh_token: &str, expires_in: Duration) -> CredentialRecord {
    CredentialRecord {
        access_token: "ya29.cached".into(),
        token_type: "Bearer".into(),
        refresh_token: refresh_token.into(),
        expiry: Some(Utc::now() + expires_in),
    }
}

async fn mount_code_exchange(server: &MockServer, code: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={code}")))
        .and(body_string_contains(format!("client_id={CLIENT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "refresh_token": "1//fresh-refresh",
            "token_type": "Bearer",
            "expires_in": 3599,
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn read_bytes(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}

#[tokio::test]
async fn test_cached_refreshable_token_skips_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    TokenStore::new(&token_file)
        .write(&cached_record("1//cached-refresh", Duration::hours(1)))
        .await
        .unwrap();

    let client = acquire_via_auth_code(&config_for(&server), &token_file, &refusing_prompt)
        .await
        .unwrap();

    assert_eq!(client.token().await.unwrap().access_token, "ya29.cached");
}

#[tokio::test]
async fn test_missing_cache_prompts_once_and_persists() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "auth-code-123", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let (prompt, seen) = recording_prompt("  auth-code-123\n");

    let client = acquire_via_auth_code(&config_for(&server), &token_file, &prompt)
        .await
        .unwrap();

    let urls = seen.lock().unwrap().clone();
    assert_eq!(urls.len(), 1);
    let url = url::Url::parse(&urls[0]).unwrap();
    let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(pairs["client_id"], CLIENT_ID);
    assert_eq!(pairs["access_type"], "offline");
    assert_eq!(pairs["response_type"], "code");

    let saved = TokenStore::new(&token_file).read().await.unwrap().unwrap();
    assert_eq!(saved.access_token, "ya29.fresh");
    assert_eq!(saved.refresh_token, "1//fresh-refresh");
    assert!(saved.expiry.unwrap() > Utc::now());

    // The freshly exchanged token is used without another round trip.
    assert_eq!(client.token().await.unwrap().access_token, "ya29.fresh");
}

#[tokio::test]
async fn test_cached_token_without_refresh_token_reauthorizes() {
    let server = MockServer::start().await;
    mount_code_exchange(&server, "second-code", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    TokenStore::new(&token_file)
        .write(&cached_record("", Duration::hours(1)))
        .await
        .unwrap();

    let (prompt, seen) = recording_prompt("second-code");
    acquire_via_auth_code(&config_for(&server), &token_file, &prompt)
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
    let saved = TokenStore::new(&token_file).read().await.unwrap().unwrap();
    assert_eq!(saved.access_token, "ya29.fresh");
    assert_eq!(saved.refresh_token, "1//fresh-refresh");
}

#[tokio::test]
async fn test_failed_exchange_leaves_existing_file_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    TokenStore::new(&token_file)
        .write(&cached_record("", Duration::hours(1)))
        .await
        .unwrap();
    let before = read_bytes(&token_file);

    let (prompt, _) = recording_prompt("bad-code");
    let err = acquire_via_auth_code(&config_for(&server), &token_file, &prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthorizationFailed(_)), "got {err:?}");
    assert!(err.to_string().contains("invalid_grant"));
    assert_eq!(read_bytes(&token_file), before);
}

#[tokio::test]
async fn test_failed_exchange_does_not_create_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized_client"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let (prompt, _) = recording_prompt("whatever");

    let err = acquire_via_auth_code(&config_for(&server), &token_file, &prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::AuthorizationFailed(_)));
    assert!(err.is_rejected_by_provider());
    assert!(!token_file.exists());
}

#[tokio::test]
async fn test_prompt_error_is_returned_without_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let prompt = |_: &str| -> Result<String, AuthError> { Err(AuthError::Prompt("aborted".into())) };

    let err = acquire_via_auth_code(&config_for(&server), &token_file, &prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Prompt(_)));
    assert!(!token_file.exists());
}

#[tokio::test]
async fn test_malformed_cache_is_an_error_not_a_prompt() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    std::fs::write(&token_file, "this is not a token").unwrap();

    let err = acquire_via_auth_code(&config_for(&server), &token_file, &refusing_prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::CacheParse { .. }));
}

#[tokio::test]
async fn test_expired_cached_token_is_refreshed_and_saved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.refreshed",
            "token_type": "Bearer",
            "expires_in": 3599,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    TokenStore::new(&token_file)
        .write(&cached_record("1//keep-me", -Duration::minutes(5)))
        .await
        .unwrap();

    let client = acquire_via_auth_code(&config_for(&server), &token_file, &refusing_prompt)
        .await
        .unwrap();

    assert_eq!(client.token().await.unwrap().access_token, "ya29.refreshed");
    // Second call reuses the refreshed token.
    assert_eq!(client.token().await.unwrap().access_token, "ya29.refreshed");

    let saved = TokenStore::new(&token_file).read().await.unwrap().unwrap();
    assert_eq!(saved.access_token, "ya29.refreshed");
    assert_eq!(saved.refresh_token, "1//keep-me");
}

#[tokio::test]
async fn test_unparseable_auth_url_is_reported_before_prompting() {
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    let config = OAuthConfig::new(CLIENT_ID, "s3cret")
        .with_endpoints("::not-a-url::", "http://127.0.0.1:9/token");

    let err = acquire_via_auth_code(&config, &token_file, &refusing_prompt)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidConfig(_)), "got {err:?}");
    assert!(!token_file.exists());
}
