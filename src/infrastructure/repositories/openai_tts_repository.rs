use super::tts_repository::{ProviderError, SpeechRequest, TtsRepository};
use crate::domain::voice::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// OpenAI accepts speeds in this closed range
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Serialize)]
struct CreateSpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

/// OpenAI TTS implementation of TTS repository.
///
/// One request, one response. No retries; callers that want resilience wrap
/// this themselves.
pub struct OpenAiTtsRepository {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiTtsRepository {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn clamp_speed(speed: f32) -> f32 {
        if speed.is_nan() {
            return 1.0;
        }
        speed.clamp(MIN_SPEED, MAX_SPEED)
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ProviderError> {
        let start_time = std::time::Instant::now();
        let speed = Self::clamp_speed(request.speed);

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %request.voice,
            speed = speed,
            text_length = request.text.len(),
            "Calling OpenAI TTS API"
        );

        let body = CreateSpeechRequest {
            model: &self.model,
            input: &request.text,
            voice: &request.voice,
            speed,
            response_format: request.format.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    provider = "openai",
                    voice = %request.voice,
                    "OpenAI TTS request failed"
                );
                ProviderError::from_reqwest(Provider::OpenAi, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = "openai",
                status = status.as_u16(),
                body = %body,
                voice = %request.voice,
                "OpenAI TTS API returned an error"
            );
            return Err(ProviderError::Upstream {
                provider: Provider::OpenAi,
                status: Some(status.as_u16()),
                body,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(Provider::OpenAi, e))?
            .to_vec();

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %request.voice,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            "TTS synthesis completed"
        );

        Ok(audio)
    }
}
