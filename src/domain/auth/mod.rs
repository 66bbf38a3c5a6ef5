pub mod jwt;

pub use jwt::{Claims, JwtManager};
