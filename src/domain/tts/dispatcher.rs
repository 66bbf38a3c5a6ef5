use crate::domain::voice::{is_fpt_voice, Provider};
use crate::infrastructure::repositories::{ProviderError, SpeechRequest, TtsRepository};
use async_trait::async_trait;
use std::sync::Arc;

/// Routes a synthesis to the provider that owns the voice.
///
/// Voices in the registry go to their declared provider. Anything else falls
/// through to OpenAI, which rejects voices it does not know.
pub struct ProviderDispatcher {
    openai: Arc<dyn TtsRepository>,
    fpt: Arc<dyn TtsRepository>,
}

impl ProviderDispatcher {
    pub fn new(openai: Arc<dyn TtsRepository>, fpt: Arc<dyn TtsRepository>) -> Self {
        Self { openai, fpt }
    }

    pub fn provider_for(voice_id: &str) -> Provider {
        if is_fpt_voice(voice_id) {
            Provider::Fpt
        } else {
            Provider::OpenAi
        }
    }

    fn repository_for(&self, provider: Provider) -> &Arc<dyn TtsRepository> {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Fpt => &self.fpt,
        }
    }
}

#[async_trait]
impl TtsRepository for ProviderDispatcher {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, ProviderError> {
        let provider = Self::provider_for(&request.voice);
        tracing::debug!(voice = %request.voice, provider = %provider, "Dispatching synthesis");
        self.repository_for(provider).synthesize(request).await
    }
}
