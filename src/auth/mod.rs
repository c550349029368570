pub mod handlers;
pub mod middleware;
pub mod token;

pub use middleware::{require_auth, AuthUser};
pub use token::{SessionClaims, TokenError, TokenSigner};
