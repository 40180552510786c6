//! HTTP-facing error types.

mod auth_error;

pub use auth_error::AuthError;
