mod jwt;
mod middleware;

pub use jwt::{JwtError, JwtService, SessionClaims};
pub use middleware::{RequestContext, require_session};
