pub mod middleware;
pub mod request_id;

pub use middleware::{optional_auth_middleware, require_admin_middleware, X_GUEST_ID};
pub use request_id::{request_id_middleware, RequestId};
