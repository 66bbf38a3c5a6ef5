pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod service;
pub mod text;

pub use dispatcher::ProviderDispatcher;
pub use dto::{AudioFormat, SynthesisRequest, SynthesisResult, VoiceResponse};
pub use error::{Locale, TtsServiceError};
pub use service::{TtsService, TtsServiceApi};
pub use text::{clean_text, TextLimits};
