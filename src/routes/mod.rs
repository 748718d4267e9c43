//! Router Module Index
//!
//! Routes are grouped by how they are guarded. Access control is split in two steps:
//! authentication is a router layer, and the capability check happens in each handler.

/// Routes open to anonymous callers.
pub mod public;

/// Routes behind the session layer; handlers check their own capability.
pub mod authenticated;

/// Routes under `/admin`, all requiring the admin role.
pub mod admin;
