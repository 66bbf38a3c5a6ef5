use crate::domain::tts::AudioFormat;
use crate::domain::voice::Provider;
use async_trait::async_trait;

/// Parameters handed to a TTS provider for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    pub format: AudioFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a failure, or could not be reached at all
    /// (`status` is `None` when no HTTP response was received).
    #[error("{provider} upstream error (status {status:?}): {body}")]
    Upstream {
        provider: Provider,
        status: Option<u16>,
        body: String,
    },
    #[error("{provider} timed out")]
    Timeout { provider: Provider },
    #[error("{provider} synthesis cancelled")]
    Cancelled { provider: Provider },
}

impl ProviderError {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::Upstream { provider, .. }
            | ProviderError::Timeout { provider }
            | ProviderError::Cancelled { provider } => *provider,
        }
    }

    /// Classify a transport-level reqwest failure
    pub fn from_reqwest(provider: Provider, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Upstream {
                provider,
                status: err.status().map(|s| s.as_u16()),
                body: err.to_string(),
            }
        }
    }
}

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (OpenAI, FPT, ...).
///
/// Every provider, and the dispatcher that routes between them, exposes this
/// single capability so callers never branch on the provider themselves.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize text to speech
    ///
    /// Returns raw audio bytes in the requested format
    ///
    /// # Errors
    /// Returns error if synthesis fails or provider is unavailable
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ProviderError>;
}
