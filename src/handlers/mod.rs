// Two security tiers, mirrored in the route tables:
// Public (no auth, /auth/*) -> Protected (session cookie, /api/*)
pub mod protected;
pub mod public;
