mod jwt;
mod middleware;

pub use jwt::{AuthError, Claims, Identity, JwtVerifier, TokenVerifier};
pub use middleware::{bearer_token, reject_unauthenticated};
