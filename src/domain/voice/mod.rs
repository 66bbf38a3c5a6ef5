pub mod model;
pub mod permission;
pub mod registry;

pub use model::{Gender, Provider, VoiceDescriptor, VoiceTier};
pub use permission::{resolve, DenyReason, Permission};
pub use registry::{all_voices, find_voice, is_fpt_voice};
