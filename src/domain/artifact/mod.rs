pub mod model;
pub mod reaper;
pub mod service;

pub use model::{parse_cache_owner, ArtifactOwnership};
pub use reaper::{SweepReport, TemporaryArtifactReaper};
pub use service::{ArtifactService, ArtifactServiceError};
