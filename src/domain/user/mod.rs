pub mod model;

pub use model::{Caller, Role, SubscriptionTier};
