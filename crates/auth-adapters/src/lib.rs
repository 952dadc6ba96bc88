//! school-desk/crates/auth-adapters/src/lib.rs
//!
//! `IdentityProvider` implementations. The transport builds one provider per
//! request from whatever credential it received.

pub mod error;
pub mod static_identity;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use error::AuthError;
pub use static_identity::{AnonymousIdentity, StaticIdentity};

#[cfg(feature = "auth-jwt")]
pub use jwt::{BearerIdentity, Claims, JwtVerifier};
