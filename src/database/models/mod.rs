pub mod rate_limit;
pub mod session;
pub mod tenant;

pub use rate_limit::RateLimitCounter;
pub use session::Session;
pub use tenant::Tenant;
