use crate::e2e::helpers;

use helpers::{fake_mp3, TestContext};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_context::test_context;
use uuid::Uuid;
use voicecast_backend::domain::user::SubscriptionTier;

async fn synthesize_as_guest(ctx: &TestContext, guest_id: &str, text: &str) -> String {
    let response = ctx
        .client
        .post_with_headers(
            "/api/tts/synthesize",
            &json!({ "text": text, "voice": "alloy" }),
            &[("x-guest-id", guest_id)],
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    response.header("x-cache").cloned().unwrap_or_default()
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_cache_stats_to_admin(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(1)).await;
    let guest_id = Uuid::new_v4().to_string();
    synthesize_as_guest(ctx, &guest_id, "First clip").await;
    synthesize_as_guest(ctx, &guest_id, "Second clip").await;

    let response = ctx
        .client
        .get_with_auth("/api/admin/cache/stats", &ctx.admin_token())
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let stats: Value = response.json().unwrap();
    assert_eq!(stats["count"], 2);
    assert_eq!(stats["total_bytes"], 2 * fake_mp3(1).len() as u64);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_forbid_cache_admin_for_regular_users(ctx: &TestContext) {
    let token = ctx.user_token(SubscriptionTier::Premium);

    ctx.client
        .get_with_auth("/api/admin/cache/stats", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::FORBIDDEN);

    ctx.client
        .delete_with_auth("/api/admin/cache", &token)
        .await
        .unwrap()
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_token_for_cache_admin(ctx: &TestContext) {
    ctx.client
        .get("/api/admin/cache/stats")
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED);

    ctx.client
        .delete("/api/admin/cache")
        .await
        .unwrap()
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clear_only_the_requested_owner(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(4)).await;
    let cleared = Uuid::new_v4().to_string();
    let kept = Uuid::new_v4().to_string();

    assert_eq!(synthesize_as_guest(ctx, &cleared, "Hello").await, "MISS");
    assert_eq!(synthesize_as_guest(ctx, &kept, "Hello").await, "MISS");

    let response = ctx
        .client
        .delete_with_auth(
            &format!("/api/admin/cache?owner_id=guest-{}", cleared),
            &ctx.admin_token(),
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    let body: Value = response.json().unwrap();
    assert_eq!(body["removed"], 1);

    assert_eq!(synthesize_as_guest(ctx, &cleared, "Hello").await, "MISS");
    assert_eq!(synthesize_as_guest(ctx, &kept, "Hello").await, "HIT");

    // Clearing again is a no-op
    let response = ctx
        .client
        .delete_with_auth(
            &format!("/api/admin/cache?owner_id=guest-{}", kept),
            &ctx.admin_token(),
        )
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap()["removed"], 1);
    let response = ctx
        .client
        .delete_with_auth(
            &format!("/api/admin/cache?owner_id=guest-{}", kept),
            &ctx.admin_token(),
        )
        .await
        .unwrap();
    assert_eq!(response.json::<Value>().unwrap()["removed"], 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clear_everything_without_owner(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(5)).await;
    synthesize_as_guest(ctx, &Uuid::new_v4().to_string(), "One").await;
    synthesize_as_guest(ctx, &Uuid::new_v4().to_string(), "Two").await;

    let response = ctx
        .client
        .delete_with_auth("/api/admin/cache", &ctx.admin_token())
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>().unwrap()["removed"], 2);

    let stats: Value = ctx
        .client
        .get_with_auth("/api/admin/cache/stats", &ctx.admin_token())
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(stats["count"], 0);
}
