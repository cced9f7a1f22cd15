pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{session_auth_middleware, AuthTenant, SessionToken};
pub use rate_limit::{rate_limit_middleware, RateLimitPolicy};
pub use response::{ApiResponse, ApiResult};
