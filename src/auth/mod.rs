pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::{Claims, RefreshClaims};
pub use jwt::{IssuedTokens, JwtService};
pub use middleware::{AuthMiddleware, AuthenticatedUser};
