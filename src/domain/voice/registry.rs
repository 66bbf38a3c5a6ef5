use super::model::{Gender, Provider, VoiceDescriptor, VoiceTier};

const fn voice(
    id: &'static str,
    provider: Provider,
    tier: VoiceTier,
    language: &'static str,
    gender: Gender,
    region: Option<&'static str>,
) -> VoiceDescriptor {
    VoiceDescriptor {
        id,
        provider,
        tier,
        language,
        gender,
        region,
    }
}

/// Every voice the service can synthesize with. Closed at compile time.
static VOICES: &[VoiceDescriptor] = &[
    // OpenAI
    voice("alloy", Provider::OpenAi, VoiceTier::Free, "en", Gender::Neutral, None),
    voice("echo", Provider::OpenAi, VoiceTier::Free, "en", Gender::Male, None),
    voice("fable", Provider::OpenAi, VoiceTier::Registered, "en", Gender::Male, Some("GB")),
    voice("nova", Provider::OpenAi, VoiceTier::Registered, "en", Gender::Female, None),
    voice("onyx", Provider::OpenAi, VoiceTier::Pro, "en", Gender::Male, None),
    voice("shimmer", Provider::OpenAi, VoiceTier::Premium, "en", Gender::Female, None),
    // FPT
    voice("lannhi", Provider::Fpt, VoiceTier::Free, "vi", Gender::Female, Some("south")),
    voice("banmai", Provider::Fpt, VoiceTier::Registered, "vi", Gender::Female, Some("north")),
    voice("leminh", Provider::Fpt, VoiceTier::Registered, "vi", Gender::Male, Some("north")),
    voice("myan", Provider::Fpt, VoiceTier::Pro, "vi", Gender::Female, Some("central")),
    voice("giahuy", Provider::Fpt, VoiceTier::Pro, "vi", Gender::Male, Some("central")),
    voice("thuminh", Provider::Fpt, VoiceTier::Premium, "vi", Gender::Female, Some("north")),
    voice("linhsan", Provider::Fpt, VoiceTier::Premium, "vi", Gender::Female, Some("south")),
];

pub fn all_voices() -> &'static [VoiceDescriptor] {
    VOICES
}

pub fn find_voice(voice_id: &str) -> Option<&'static VoiceDescriptor> {
    VOICES.iter().find(|v| v.id == voice_id)
}

/// Whether the voice is served by the async FPT provider
pub fn is_fpt_voice(voice_id: &str) -> bool {
    matches!(find_voice(voice_id), Some(v) if v.provider == Provider::Fpt)
}
