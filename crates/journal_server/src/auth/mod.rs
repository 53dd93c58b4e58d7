mod middleware;
mod password;

pub use middleware::{AuthExtractor, AuthUser, RequireAuth, validate_token};
pub use password::{hash_password, verify_password};
