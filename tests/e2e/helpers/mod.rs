use anyhow::Result;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use voicecast_backend::domain::auth::JwtManager;
use voicecast_backend::domain::user::{Role, SubscriptionTier};
use voicecast_backend::infrastructure::config::{CacheBackend, Config, Environment, LogFormat};
use voicecast_backend::infrastructure::http::build_application;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub mod api_client;

use api_client::TestClient;

pub const FPT_SUBMIT_PATH: &str = "/hmi/tts/v5";
pub const FPT_AUDIO_PATH: &str = "/files/clip.mp3";

pub struct TestContext {
    pub client: TestClient,
    pub config: Config,
    pub openai: MockServer,
    pub fpt: MockServer,
    shutdown: CancellationToken,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            TestContext::start()
                .await
                .expect("Failed to start test application")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.shutdown.cancel();
        }
    }
}

impl TestContext {
    async fn start() -> Result<Self> {
        let openai = MockServer::start().await;
        let fpt = MockServer::start().await;

        // Create test configuration
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0, // Will be assigned by the OS
            database_url: None,
            jwt_secret: "test-jwt-secret-key-for-testing-only".to_string(),
            jwt_expiration_hours: 1,
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
            openai_api_key: "test-openai-key".to_string(),
            openai_base_url: openai.uri(),
            openai_model: "tts-1".to_string(),
            openai_timeout_secs: 5,
            fpt_api_key: "test-fpt-key".to_string(),
            fpt_base_url: format!("{}{}", fpt.uri(), FPT_SUBMIT_PATH),
            fpt_request_timeout_secs: 5,
            fpt_poll_base_delay_ms: 10,
            fpt_poll_growth_factor: 2.0,
            fpt_poll_max_delay_ms: 40,
            fpt_poll_max_attempts: 5,
            fpt_min_audio_bytes: 16,
            synthesis_timeout_secs: 10,
            cache_backend: CacheBackend::Memory,
            cache_dir: "./unused".into(),
            cache_memory_max_bytes: 16 * 1024 * 1024,
            artifact_retention_hours: 24,
            reaper_interval_secs: 600,
            reaper_batch_size: 100,
            text_limit_guest: 500,
            text_limit_free: 1000,
            text_limit_pro: 2500,
            text_limit_premium: 4000,
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid test config: {}", e))?;

        let shutdown = CancellationToken::new();
        let app = build_application(&config, shutdown.clone())
            .await
            .map_err(|e| anyhow::anyhow!("failed to build application: {}", e))?;

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);

        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app.router)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
                .unwrap();
        });

        Ok(Self {
            client: TestClient::new(&base_url),
            config,
            openai,
            fpt,
            shutdown,
        })
    }

    pub fn token_for(&self, user_id: Uuid, tier: SubscriptionTier, role: Role) -> String {
        JwtManager::new(self.config.jwt_secret.clone(), 1)
            .generate_token(user_id, tier, role)
            .unwrap()
    }

    pub fn user_token(&self, tier: SubscriptionTier) -> String {
        self.token_for(Uuid::new_v4(), tier, Role::User)
    }

    pub fn admin_token(&self) -> String {
        self.token_for(Uuid::new_v4(), SubscriptionTier::Free, Role::Admin)
    }

    /// OpenAI answers every speech request with `audio`
    pub async fn mock_openai_audio(&self, audio: &[u8]) {
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(audio.to_vec()),
            )
            .mount(&self.openai)
            .await;
    }

    /// FPT accepts the job, reports `not_ready_polls` placeholders, then serves `audio`
    pub async fn mock_fpt_audio(&self, audio: &[u8], not_ready_polls: u64) {
        Mock::given(method("POST"))
            .and(path(FPT_SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "async": format!("{}{}", self.fpt.uri(), FPT_AUDIO_PATH),
                "error": 0,
                "message": "The content will be returned after a few seconds under the async link.",
                "request_id": "e2e"
            })))
            .mount(&self.fpt)
            .await;

        if not_ready_polls > 0 {
            Mock::given(method("GET"))
                .and(path(FPT_AUDIO_PATH))
                .respond_with(ResponseTemplate::new(404))
                .up_to_n_times(not_ready_polls)
                .with_priority(1)
                .mount(&self.fpt)
                .await;
        }

        Mock::given(method("GET"))
            .and(path(FPT_AUDIO_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(audio.to_vec()),
            )
            .with_priority(2)
            .mount(&self.fpt)
            .await;
    }

    pub async fn openai_calls(&self) -> usize {
        self.openai
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }

    pub async fn fpt_calls(&self) -> usize {
        self.fpt
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0)
    }
}

/// Bytes long enough to pass the minimum audio size check
pub fn fake_mp3(tag: u8) -> Vec<u8> {
    let mut audio = b"ID3".to_vec();
    audio.extend(std::iter::repeat(tag).take(64));
    audio
}
