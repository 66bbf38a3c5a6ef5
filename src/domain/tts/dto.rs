use crate::domain::voice::Provider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request for POST /api/tts/synthesize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
}

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub audio_data: Vec<u8>,
    pub content_type: &'static str,
    pub voice: String,
    /// `None` when the voice is outside the registry (admin-only path)
    pub provider: Option<Provider>,
    pub char_count: usize,
    pub cache_hit: bool,
}

/// Entry of GET /api/tts/voices
#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub id: String,
    pub provider: Provider,
    pub tier: crate::domain::voice::VoiceTier,
    pub language: String,
    pub gender: crate::domain::voice::Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub allowed: bool,
}
