use super::model::VoiceTier;
use super::registry::find_voice;
use crate::domain::user::{Role, SubscriptionTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    InvalidVoice,
    RequiresLogin,
    /// Caller must upgrade to at least this subscription tier
    RequiresUpgrade(SubscriptionTier),
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::InvalidVoice => write!(f, "invalid voice"),
            DenyReason::RequiresLogin => write!(f, "login required"),
            DenyReason::RequiresUpgrade(tier) => write!(f, "requires upgrade to {}", tier),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allow,
    Deny(DenyReason),
}

impl Permission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Permission::Allow)
    }
}

/// Decide whether a caller may synthesize with a voice.
///
/// Rules apply in order: admins bypass everything, unknown voices are
/// rejected, then the voice tier is compared against the caller.
pub fn resolve(
    voice_id: &str,
    is_authenticated: bool,
    tier: SubscriptionTier,
    role: Role,
) -> Permission {
    if role == Role::Admin {
        return Permission::Allow;
    }

    let Some(voice) = find_voice(voice_id) else {
        return Permission::Deny(DenyReason::InvalidVoice);
    };

    match voice.tier {
        VoiceTier::Free => Permission::Allow,
        VoiceTier::Registered => {
            if is_authenticated {
                Permission::Allow
            } else {
                Permission::Deny(DenyReason::RequiresLogin)
            }
        }
        VoiceTier::Pro => match tier {
            SubscriptionTier::Pro | SubscriptionTier::Premium => Permission::Allow,
            SubscriptionTier::Free => {
                Permission::Deny(DenyReason::RequiresUpgrade(SubscriptionTier::Pro))
            }
        },
        VoiceTier::Premium => match tier {
            SubscriptionTier::Premium => Permission::Allow,
            SubscriptionTier::Free | SubscriptionTier::Pro => {
                Permission::Deny(DenyReason::RequiresUpgrade(SubscriptionTier::Premium))
            }
        },
    }
}
