use serde::{Deserialize, Serialize};

/// External TTS backends the service can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "fpt")]
    Fpt,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Fpt => "fpt",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimum access level a voice requires.
///
/// Ordered from least to most restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTier {
    Free,
    Registered,
    Pro,
    Premium,
}

impl std::fmt::Display for VoiceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceTier::Free => write!(f, "free"),
            VoiceTier::Registered => write!(f, "registered"),
            VoiceTier::Pro => write!(f, "pro"),
            VoiceTier::Premium => write!(f, "premium"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceDescriptor {
    pub id: &'static str,
    pub provider: Provider,
    pub tier: VoiceTier,
    /// BCP 47 language tag
    pub language: &'static str,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<&'static str>,
}
