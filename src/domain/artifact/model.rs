use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const GUEST_OWNER_PREFIX: &str = "guest-";
const USER_OWNER_PREFIX: &str = "user-";

/// Ownership record of one audio artifact.
///
/// Guest artifacts are temporary and become eligible for deletion once
/// `retention_deadline` has passed. Owned artifacts are never reaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtifactOwnership {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub is_temporary: bool,
    pub created_at: DateTime<Utc>,
    pub retention_deadline: Option<DateTime<Utc>>,
}

impl ArtifactOwnership {
    /// Owned, non-temporary artifact of an authenticated user
    pub fn owned(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id,
            owner_id: Some(user_id),
            is_temporary: false,
            created_at: now,
            retention_deadline: None,
        }
    }

    /// Temporary artifact of a guest, expiring after `retention`
    pub fn temporary(guest_id: Uuid, now: DateTime<Utc>, retention: Duration) -> Self {
        Self {
            id: guest_id,
            owner_id: None,
            is_temporary: true,
            created_at: now,
            retention_deadline: Some(now + retention),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_temporary && self.retention_deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Owner segment of this artifact's cache entries.
    ///
    /// Guest and user ids live in separate namespaces, so a guest id equal to
    /// some user id never reaches that user's audio.
    pub fn cache_owner(&self) -> String {
        let prefix = if self.is_temporary {
            GUEST_OWNER_PREFIX
        } else {
            USER_OWNER_PREFIX
        };
        format!("{}{}", prefix, self.id)
    }
}

/// Split a cache owner into `(is_temporary, artifact id)`
pub fn parse_cache_owner(owner: &str) -> Option<(bool, Uuid)> {
    let (is_temporary, id) = if let Some(id) = owner.strip_prefix(GUEST_OWNER_PREFIX) {
        (true, id)
    } else {
        (false, owner.strip_prefix(USER_OWNER_PREFIX)?)
    };
    Uuid::parse_str(id).ok().map(|id| (is_temporary, id))
}
