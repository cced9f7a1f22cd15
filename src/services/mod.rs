pub mod rate_limiter;
pub mod session_service;

pub use rate_limiter::{RateLimitOutcome, RateLimiter};
pub use session_service::{Authentication, SessionService};
