pub mod artifact;
pub mod auth;
pub mod tts;
pub mod user;
pub mod voice;
