// handlers - HTTP surface of the navigation service
//
// Public (no auth)       → /, /health
// Protected (/api/*)     → role page ordering, navigation resolution
//
// Only /api/navigation requires a bearer token today; the role endpoints are
// expected to sit behind the dashboard's admin gateway.
pub mod protected;
pub mod public;
