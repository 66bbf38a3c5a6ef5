use crate::e2e::helpers;

use helpers::{fake_mp3, TestContext};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_context::test_context;
use uuid::Uuid;
use voicecast_backend::domain::user::{Role, SubscriptionTier};

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_free_voice_for_guest(ctx: &TestContext) {
    let audio = fake_mp3(1);
    ctx.mock_openai_audio(&audio).await;

    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "Hello", "voice": "alloy" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    response
        .assert_header("content-type", "audio/mpeg")
        .assert_header("x-cache", "MISS")
        .assert_header("x-voice-used", "alloy")
        .assert_header("x-provider", "openai")
        .assert_header("x-character-count", "5");
    assert_eq!(response.body_bytes, audio);

    // A guest id is issued for the caller to reuse
    let guest_id = response.header("x-guest-id").expect("missing x-guest-id");
    assert!(Uuid::parse_str(guest_id).is_ok());

    assert_eq!(ctx.openai_calls().await, 1);
    assert_eq!(ctx.fpt_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_send_model_voice_and_format_to_openai(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(1)).await;

    ctx.client
        .post(
            "/api/tts/synthesize",
            &json!({ "text": "Hello   there https://example.com", "voice": "echo", "speed": 1.5, "format": "wav" }),
        )
        .await
        .unwrap()
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/wav");

    let requests = ctx.openai.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "tts-1");
    assert_eq!(body["voice"], "echo");
    assert_eq!(body["input"], "Hello there");
    assert_eq!(body["speed"], 1.5);
    assert_eq!(body["response_format"], "wav");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_poll_fpt_then_serve_repeat_from_cache(ctx: &TestContext) {
    let audio = fake_mp3(7);
    ctx.mock_fpt_audio(&audio, 2).await;
    let token = ctx.user_token(SubscriptionTier::Free);
    let request = json!({ "text": "Xin chào các bạn", "voice": "banmai" });

    let first = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &request, &token)
        .await
        .unwrap();
    first
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "MISS")
        .assert_header("x-provider", "fpt");
    assert_eq!(first.body_bytes, audio);
    assert!(first.header("x-guest-id").is_none());

    // One submit plus three polls (two not ready, one ready)
    let calls_after_first = ctx.fpt_calls().await;
    assert_eq!(calls_after_first, 4);

    let second = ctx
        .client
        .post_with_auth("/api/tts/synthesize", &request, &token)
        .await
        .unwrap();
    second
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "HIT");
    assert_eq!(second.body_bytes, first.body_bytes);

    assert_eq!(ctx.fpt_calls().await, calls_after_first);
    assert_eq!(ctx.openai_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reuse_guest_cache_with_same_guest_id(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(3)).await;
    let guest_id = Uuid::new_v4().to_string();
    let request = json!({ "text": "Hello again", "voice": "alloy" });

    let first = ctx
        .client
        .post_with_headers("/api/tts/synthesize", &request, &[("x-guest-id", guest_id.as_str())])
        .await
        .unwrap();
    first
        .assert_status(StatusCode::OK)
        .assert_header("x-guest-id", &guest_id)
        .assert_header("x-cache", "MISS");

    let second = ctx
        .client
        .post_with_headers("/api/tts/synthesize", &request, &[("x-guest-id", guest_id.as_str())])
        .await
        .unwrap();
    second.assert_header("x-cache", "HIT");

    // Another guest does not see that entry
    let other = ctx
        .client
        .post("/api/tts/synthesize", &request)
        .await
        .unwrap();
    other.assert_header("x-cache", "MISS");

    assert_eq!(ctx.openai_calls().await, 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_guest_id_belonging_to_a_user(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(6)).await;
    let user_id = Uuid::new_v4();
    let token = ctx.token_for(user_id, SubscriptionTier::Free, Role::User);
    let request = json!({ "text": "Private note", "voice": "alloy" });

    ctx.client
        .post_with_auth("/api/tts/synthesize", &request, &token)
        .await
        .unwrap()
        .assert_status(StatusCode::OK)
        .assert_header("x-cache", "MISS");

    let user_id = user_id.to_string();
    let response = ctx
        .client
        .post_with_headers("/api/tts/synthesize", &request, &[("x-guest-id", user_id.as_str())])
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.header("x-cache").is_none());
    assert_eq!(ctx.openai_calls().await, 1);

    // The user still hits their own cache
    ctx.client
        .post_with_auth("/api/tts/synthesize", &request, &token)
        .await
        .unwrap()
        .assert_header("x-cache", "HIT");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_upgrade_for_pro_voice(ctx: &TestContext) {
    ctx.mock_openai_audio(&fake_mp3(1)).await;
    let token = ctx.user_token(SubscriptionTier::Free);

    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Hello", "voice": "onyx" }),
            &token,
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error_message("pro");
    assert_eq!(ctx.openai_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_login_for_registered_voice(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "Xin chào", "voice": "banmai" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("sign in");
    assert_eq!(ctx.fpt_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_localize_error_messages(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_headers(
            "/api/tts/synthesize",
            &json!({ "text": "Xin chào", "voice": "banmai" }),
            &[("accept-language", "vi-VN,vi;q=0.9")],
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("đăng nhập");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unknown_voice(ctx: &TestContext) {
    let token = ctx.user_token(SubscriptionTier::Premium);

    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Hello", "voice": "does-not-exist" }),
            &token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.openai_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_over_tier_limit(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            "/api/tts/synthesize",
            &json!({ "text": "a".repeat(501), "voice": "alloy" }),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message("500");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text_and_bad_speed(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "   ", "voice": "alloy" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = ctx
        .client
        .post(
            "/api/tts/synthesize",
            &json!({ "text": "Hello", "voice": "alloy", "speed": 9.0 }),
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_token_instead_of_treating_as_guest(ctx: &TestContext) {
    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Hello", "voice": "alloy" }),
            "not-a-jwt",
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.openai_calls().await, 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_hide_upstream_details_on_provider_failure(ctx: &TestContext) {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal stack trace"))
        .mount(&ctx.openai)
        .await;

    let response = ctx
        .client
        .post("/api/tts/synthesize", &json!({ "text": "Hello", "voice": "alloy" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_message("try again");
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert!(!body.contains("stack trace"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_time_out_when_fpt_never_ready(ctx: &TestContext) {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    Mock::given(method("POST"))
        .and(path(helpers::FPT_SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "async": format!("{}{}", ctx.fpt.uri(), helpers::FPT_AUDIO_PATH),
            "error": 0
        })))
        .mount(&ctx.fpt)
        .await;
    Mock::given(method("GET"))
        .and(path(helpers::FPT_AUDIO_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ctx.fpt)
        .await;

    let token = ctx.user_token(SubscriptionTier::Free);
    let response = ctx
        .client
        .post_with_auth(
            "/api/tts/synthesize",
            &json!({ "text": "Xin chào", "voice": "banmai" }),
            &token,
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    // One submit plus the configured five poll attempts
    assert_eq!(ctx.fpt_calls().await, 6);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_list_voices_with_permissions(ctx: &TestContext) {
    let response = ctx.client.get("/api/tts/voices").await.unwrap();
    response.assert_status(StatusCode::OK);

    let voices: Vec<Value> = response.json().unwrap();
    let allowed = |voices: &[Value], id: &str| {
        voices
            .iter()
            .find(|v| v["id"] == id)
            .and_then(|v| v["allowed"].as_bool())
    };
    assert_eq!(allowed(&voices, "alloy"), Some(true));
    assert_eq!(allowed(&voices, "banmai"), Some(false));
    assert_eq!(allowed(&voices, "shimmer"), Some(false));

    let token = ctx.user_token(SubscriptionTier::Premium);
    let response = ctx.client.get_with_auth("/api/tts/voices", &token).await.unwrap();
    let voices: Vec<Value> = response.json().unwrap();
    assert!(voices.iter().all(|v| v["allowed"] == true));
}
