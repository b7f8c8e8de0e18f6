/// Router Module Index
///
/// Routing is split by who may reach a route. Role checks beyond authentication are
/// made per course by the authorization engine inside the handlers.

/// Routes reachable without credentials.
pub mod public;

/// Routes behind the `AuthUser` middleware.
pub mod authenticated;

/// Course lifecycle routes that only admins pass authorization for.
pub mod admin;
