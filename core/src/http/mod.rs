//! HTTP integration.

pub mod error;
pub mod security;
