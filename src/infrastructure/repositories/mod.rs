pub mod artifact_repository;
pub mod fpt_tts_repository;
pub mod openai_tts_repository;
pub mod tts_repository;

pub use artifact_repository::{
    ArtifactRepository, ArtifactStoreError, InMemoryArtifactRepository, PgArtifactRepository,
};
pub use fpt_tts_repository::{
    FptSettings, FptTtsRepository, PollBackoff, Sleeper, SynthesisJob, TokioSleeper,
};
pub use openai_tts_repository::OpenAiTtsRepository;
pub use tts_repository::{ProviderError, SpeechRequest, TtsRepository};
