//! Business-rule layer for the listing service.
//! - `repository`: generic keyed store, one instance per entity kind.
//! - `facade`: sole orchestration point for every multi-entity rule.
//! - `auth`: password hashing and token issuance/verification.
//! - Clear error taxonomy in `errors`, mapped to transport codes by the
//!   HTTP adapter.

pub mod auth;
pub mod errors;
pub mod facade;
pub mod repository;

pub use facade::Facade;
