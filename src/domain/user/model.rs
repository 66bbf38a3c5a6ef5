use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SubscriptionTier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "pro")]
    Pro,
    #[serde(rename = "premium")]
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Who is asking for audio.
///
/// Guests are unauthenticated and carry a client-held guest id instead of a
/// user id. Their tier is always `Free` and their role is always `User`.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub tier: SubscriptionTier,
    pub role: Role,
}

impl Caller {
    pub fn guest(guest_id: Uuid) -> Self {
        Self {
            user_id: None,
            guest_id: Some(guest_id),
            tier: SubscriptionTier::Free,
            role: Role::User,
        }
    }

    pub fn user(user_id: Uuid, tier: SubscriptionTier, role: Role) -> Self {
        Self {
            user_id: Some(user_id),
            guest_id: None,
            tier,
            role,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
