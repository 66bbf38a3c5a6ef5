use super::dispatcher::ProviderDispatcher;
use super::dto::{SynthesisRequest, SynthesisResult, VoiceResponse};
use super::error::TtsServiceError;
use super::text::{char_count, clean_text, TextLimits};
use crate::domain::artifact::{ArtifactService, ArtifactServiceError};
use crate::domain::user::Caller;
use crate::domain::voice::{all_voices, find_voice, resolve, DenyReason, Permission};
use crate::infrastructure::cache::{AudioCache, CacheKey};
use crate::infrastructure::repositories::{SpeechRequest, TtsRepository};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;
const DEFAULT_SPEED: f32 = 1.0;

pub struct TtsService {
    dispatcher: Arc<dyn TtsRepository>,
    cache: Arc<AudioCache>,
    artifacts: Arc<ArtifactService>,
    limits: TextLimits,
    synthesis_timeout: Duration,
}

impl TtsService {
    pub fn new(
        dispatcher: Arc<dyn TtsRepository>,
        cache: Arc<AudioCache>,
        artifacts: Arc<ArtifactService>,
        limits: TextLimits,
        synthesis_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            cache,
            artifacts,
            limits,
            synthesis_timeout,
        }
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize text to speech for a caller
    ///
    /// This operation:
    /// - Normalizes the text and checks voice permission and limits
    /// - Registers the caller's artifact
    /// - Returns cached audio when the exact request was synthesized before
    /// - Otherwise calls the provider owning the voice and caches the result
    async fn synthesize(
        &self,
        caller: &Caller,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, TtsServiceError>;

    /// Voice catalogue, flagged with what this caller may use
    fn list_voices(&self, caller: &Caller) -> Vec<VoiceResponse>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(
        &self,
        caller: &Caller,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, TtsServiceError> {
        let started = Instant::now();

        // 1. Normalize text
        let text = clean_text(&request.text);
        let char_count = char_count(&text);

        tracing::info!(
            user_id = ?caller.user_id,
            guest_id = ?caller.guest_id,
            voice = %request.voice,
            original_length = request.text.len(),
            char_count,
            "TTS synthesis request"
        );

        // 2. Voice permission
        match resolve(
            &request.voice,
            caller.is_authenticated(),
            caller.tier,
            caller.role,
        ) {
            Permission::Allow => {}
            Permission::Deny(DenyReason::InvalidVoice) => {
                return Err(TtsServiceError::InvalidVoice(request.voice));
            }
            Permission::Deny(reason) => return Err(TtsServiceError::PermissionDenied(reason)),
        }

        // 3. Validate text and parameters
        let limit = self.limits.limit_for(caller);
        if text.is_empty() {
            return Err(TtsServiceError::Validation(
                "text is empty after normalization".to_string(),
            ));
        }
        if char_count > limit {
            return Err(TtsServiceError::TextTooLong {
                length: char_count,
                limit,
            });
        }
        let speed = validate_speed(request.speed)?;
        let format = request.format.unwrap_or_default();

        // 4. Register the artifact the audio will belong to
        let artifact = self
            .artifacts
            .register_for(caller)
            .await
            .map_err(|e| match e {
                ArtifactServiceError::OwnerConflict(_) => TtsServiceError::Validation(
                    "this guest id cannot be used, retry without X-Guest-Id".to_string(),
                ),
                other => TtsServiceError::Dependency(other.to_string()),
            })?
            .ok_or_else(|| TtsServiceError::Validation("caller has no identity".to_string()))?;
        let owner_id = artifact.cache_owner();

        let provider = find_voice(&request.voice).map(|v| v.provider);
        let key = CacheKey::new(&owner_id, &text, &request.voice, speed, format);

        // 5. Cache lookup; a broken cache only costs a provider call
        match self.cache.get(&key).await {
            Ok(Some(audio_data)) => {
                tracing::info!(
                    owner_id = %owner_id,
                    voice = %request.voice,
                    cache_hit = true,
                    audio_size = audio_data.len(),
                    "TTS cache hit - returning cached audio"
                );
                return Ok(SynthesisResult {
                    audio_data,
                    content_type: format.content_type(),
                    voice: request.voice,
                    provider,
                    char_count,
                    cache_hit: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Cache read failed, treating as miss");
            }
        }

        // 6. Synthesize with the provider owning the voice
        let speech = SpeechRequest {
            text,
            voice: request.voice.clone(),
            speed,
            format,
        };
        let audio_data = tokio::time::timeout(self.synthesis_timeout, self.dispatcher.synthesize(&speech))
            .await
            .map_err(|_| TtsServiceError::Timeout {
                provider: ProviderDispatcher::provider_for(&speech.voice),
            })??;

        // 7. Store for next time
        if let Err(e) = self.cache.set(&key, &audio_data).await {
            tracing::warn!(owner_id = %owner_id, error = %e, "Failed to cache synthesized audio");
        }

        tracing::info!(
            owner_id = %owner_id,
            voice = %speech.voice,
            provider = ?provider,
            cache_hit = false,
            audio_size = audio_data.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "TTS synthesis completed"
        );

        Ok(SynthesisResult {
            audio_data,
            content_type: format.content_type(),
            voice: speech.voice,
            provider,
            char_count,
            cache_hit: false,
        })
    }

    fn list_voices(&self, caller: &Caller) -> Vec<VoiceResponse> {
        all_voices()
            .iter()
            .map(|voice| VoiceResponse {
                id: voice.id.to_string(),
                provider: voice.provider,
                tier: voice.tier,
                language: voice.language.to_string(),
                gender: voice.gender,
                region: voice.region.map(str::to_string),
                allowed: resolve(voice.id, caller.is_authenticated(), caller.tier, caller.role)
                    .is_allowed(),
            })
            .collect()
    }
}

fn validate_speed(speed: Option<f32>) -> Result<f32, TtsServiceError> {
    let speed = speed.unwrap_or(DEFAULT_SPEED);
    if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(TtsServiceError::Validation(format!(
            "speed must be between {} and {}",
            MIN_SPEED, MAX_SPEED
        )));
    }
    Ok(speed)
}
