mod common;

use std::time::Duration;

use common::{Harness, token_body, user_body};
use serde_json::json;
use sporlapi::{error::Error, storage::ProfileStore};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_first_login_creates_profile_and_session() {
    let harness = Harness::start().await;
    harness.mount_code_exchange("good-code", "access-1").await;
    harness.mount_me("access-1", user_body("user-a", "a@x.com")).await;

    let flow = harness.login_flow();
    let start = flow.begin_login(Some("https://app/dash")).await.unwrap();

    assert!(start.authorize_url.starts_with(common::AUTH_URL));
    assert!(start.authorize_url.contains("client_id=client-id"));
    assert!(start.authorize_url.contains("response_type=code"));
    assert!(start.authorize_url.contains(&format!("state={}", start.state)));

    let outcome = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await
        .unwrap();

    assert_eq!(outcome.profile.email, "a@x.com");
    assert_eq!(outcome.profile.user.id, "user-a");
    assert_eq!(outcome.profile.created_at, outcome.profile.updated_at);
    assert_eq!(harness.sessions.verify(&outcome.token).unwrap(), "a@x.com");
    assert_eq!(
        outcome.redirect_to,
        format!("https://app/dash?token={}", outcome.token)
    );

    let stored = harness
        .store
        .get_profile_with_email("a@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.credentials.access_token, "access-1");
    assert_eq!(stored.credentials.refresh_token, "refresh-1");
    assert_eq!(stored.credentials.expires_in, 3600);
}

#[tokio::test]
async fn test_second_login_keeps_created_at() {
    let harness = Harness::start().await;
    harness.mount_code_exchange("good-code", "access-1").await;
    harness.mount_me("access-1", user_body("user-a", "a@x.com")).await;
    let flow = harness.login_flow();

    let start = flow.begin_login(None).await.unwrap();
    let first = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = flow.begin_login(None).await.unwrap();
    let second = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await
        .unwrap();

    assert_eq!(second.profile.created_at, first.profile.created_at);
    assert!(second.profile.updated_at > first.profile.updated_at);
    assert_eq!(
        second.profile.credentials.created_at,
        first.profile.credentials.created_at
    );
}

#[tokio::test]
async fn test_missing_redirect_falls_back_to_default_view() {
    let harness = Harness::start().await;
    harness.mount_code_exchange("good-code", "access-1").await;
    harness.mount_me("access-1", user_body("user-a", "a@x.com")).await;
    let flow = harness.login_flow();

    let start = flow.begin_login(None).await.unwrap();
    let outcome = flow
        .complete_login("good-code", &start.state, None)
        .await
        .unwrap();

    assert_eq!(
        outcome.redirect_to,
        format!("/api/v1/spotify/profile?token={}", outcome.token)
    );
}

#[tokio::test]
async fn test_each_login_issues_a_fresh_state() {
    let harness = Harness::start().await;
    let flow = harness.login_flow();

    let a = flow.begin_login(None).await.unwrap();
    let b = flow.begin_login(None).await.unwrap();

    assert_ne!(a.state, b.state);
    assert_eq!(harness.cache.len().await, 2);
}

#[tokio::test]
async fn test_empty_state_is_rejected_regardless_of_cookie() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;
    let flow = harness.login_flow();

    for cookie in [None, Some(""), Some("anything")] {
        let result = flow.complete_login("good-code", "", cookie).await;
        assert!(
            matches!(result, Err(Error::StateMismatch)),
            "cookie {:?} should not rescue an empty state",
            cookie
        );
    }
}

#[tokio::test]
async fn test_cookie_mismatch_is_rejected_before_exchange() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.server)
        .await;
    let flow = harness.login_flow();

    let start = flow.begin_login(None).await.unwrap();
    let result = flow
        .complete_login("good-code", &start.state, Some("forged"))
        .await;

    assert!(matches!(result, Err(Error::StateMismatch)));
    // the rejected attempt leaves the state in place
    assert_eq!(harness.cache.len().await, 1);
}

#[tokio::test]
async fn test_replayed_state_is_not_found() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("access-1", Some("refresh-1"), 3600)),
        )
        .expect(1)
        .mount(&harness.server)
        .await;
    harness.mount_me("access-1", user_body("user-a", "a@x.com")).await;
    let flow = harness.login_flow();

    let start = flow.begin_login(None).await.unwrap();
    flow.complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await
        .unwrap();

    let replay = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await;
    assert!(matches!(replay, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_unknown_state_is_not_found() {
    let harness = Harness::start().await;
    let flow = harness.login_flow();

    let result = flow
        .complete_login("good-code", "never-issued", Some("never-issued"))
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_missing_code_is_a_validation_error() {
    let harness = Harness::start().await;
    let flow = harness.login_flow();
    let start = flow.begin_login(None).await.unwrap();

    let result = flow.complete_login("", &start.state, Some(start.state.as_str())).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_rejected_code_is_upstream_error() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .mount(&harness.server)
        .await;
    let flow = harness.login_flow();
    let start = flow.begin_login(None).await.unwrap();

    let result = flow
        .complete_login("stale-code", &start.state, Some(start.state.as_str()))
        .await;

    match result {
        Err(Error::Upstream { status, message }) => {
            assert_eq!(status, Some(400));
            assert!(message.contains("invalid_grant"));
        }
        other => panic!("expected upstream error, got {:?}", other.map(|o| o.token)),
    }
}

#[tokio::test]
async fn test_malformed_token_response_is_decode_error() {
    let harness = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&harness.server)
        .await;
    let flow = harness.login_flow();
    let start = flow.begin_login(None).await.unwrap();

    let result = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await;
    assert!(matches!(result, Err(Error::Decode(_))));
}

#[tokio::test]
async fn test_profile_without_email_is_rejected() {
    let harness = Harness::start().await;
    harness.mount_code_exchange("good-code", "access-1").await;
    harness
        .mount_me("access-1", json!({ "id": "user-a", "display_name": "No Mail" }))
        .await;
    let flow = harness.login_flow();
    let start = flow.begin_login(None).await.unwrap();

    let result = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await;

    assert!(matches!(result, Err(Error::Decode(_))));
    assert!(
        harness
            .store
            .get_profile_with_email("")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_profile_fetch_failure_is_upstream_and_state_is_spent() {
    let harness = Harness::start().await;
    harness.mount_code_exchange("good-code", "access-1").await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "status": 401, "message": "Invalid access token" }
        })))
        .mount(&harness.server)
        .await;
    let flow = harness.login_flow();
    let start = flow.begin_login(None).await.unwrap();

    let result = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await;
    assert!(matches!(result, Err(Error::Upstream { status: Some(401), .. })));
    assert!(
        harness
            .store
            .get_profile_with_email("a@x.com")
            .await
            .unwrap()
            .is_none()
    );

    let replay = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await;
    assert!(matches!(replay, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_redirect_to_allowed_origin_is_kept() {
    let mut harness = Harness::start().await;
    harness.config.allowed_redirect_origins = vec!["https://app.example".to_string()];
    harness.mount_code_exchange("good-code", "access-1").await;
    harness.mount_me("access-1", user_body("user-a", "a@x.com")).await;
    let flow = harness.login_flow();

    let start = flow
        .begin_login(Some("https://app.example/dash"))
        .await
        .unwrap();
    let outcome = flow
        .complete_login("good-code", &start.state, Some(start.state.as_str()))
        .await
        .unwrap();

    assert_eq!(
        outcome.redirect_to,
        format!("https://app.example/dash?token={}", outcome.token)
    );
}

#[tokio::test]
async fn test_redirect_to_foreign_origin_is_refused() {
    let mut harness = Harness::start().await;
    harness.config.allowed_redirect_origins = vec!["https://app.example".to_string()];
    let flow = harness.login_flow();

    for target in [
        "https://evil.example/steal",
        "https://app.example.evil.example/",
        "http://app.example/dash",
        "//evil.example/steal",
        "/\\evil.example/steal",
        "not a url",
    ] {
        let result = flow.begin_login(Some(target)).await;
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "redirect {:?} should be refused",
            target
        );
    }
    assert_eq!(harness.cache.len().await, 0);
}

#[tokio::test]
async fn test_local_paths_pass_the_origin_list() {
    let mut harness = Harness::start().await;
    harness.config.allowed_redirect_origins = vec!["https://app.example".to_string()];
    let flow = harness.login_flow();

    flow.begin_login(Some("/dash")).await.unwrap();
    flow.begin_login(None).await.unwrap();

    assert_eq!(harness.cache.len().await, 2);
}

#[tokio::test]
async fn test_empty_origin_list_allows_any_target() {
    let harness = Harness::start().await;
    let flow = harness.login_flow();

    flow.begin_login(Some("https://anywhere.example/x"))
        .await
        .unwrap();

    assert_eq!(harness.cache.len().await, 1);
}
