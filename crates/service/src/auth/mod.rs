//! Auth module: domain types, errors, and the token/credential service.
//!
//! Token verification yields an [`domain::Identity`] (subject id plus admin
//! flag); the HTTP layer passes only that identity into the facade.

pub mod domain;
pub mod errors;
pub mod service;

pub use service::AuthService;
