//! Authentication, authorization and the security middleware.
//!
//! # Module Structure
//!
//! - `authentication` - Caller identity (`Authentication`, `AuthenticationResult`)
//! - `config` - Pluggable contracts (`AuthenticationManager`, `AccessManager`)
//! - `authenticator` - Built-in authentication managers
//! - `authorizer` - Built-in access managers
//! - `manager` - Built-in provider registration
//! - `metadata` - Endpoint access metadata and handler resolution
//! - `middleware` - Security middleware (`SecurityTransform`)
//! - `audit` - Security decision events
//! - `context` - Task-local access to the current caller
//! - `extractor` - Actix Web extractors (`Authenticated`, `OptionalAuthentication`)

pub use audit::{InMemoryEventSink, SecurityEvent, SecurityEventSink, SecurityOutcome};
pub use authentication::{Authentication, AuthenticationResult};
pub use authenticator::{IdentityConfig, InMemoryAuthenticationManager, TimeoutAuthenticationManager};
pub use authorizer::{DenyAllAccessManager, RoleAccessManager};
pub use config::{AccessManager, AuthenticationManager};
pub use context::SecurityContext;
pub use extractor::{Authenticated, OptionalAuthentication, SecurityExt};
pub use metadata::{
    EndpointDeclaration, EndpointMetadataTable, EndpointSecurityMetadata, HandlerResolver,
    MatchPatternResolver, MetadataError, SecurityOverride,
};
pub use middleware::{SecurityService, SecurityTransform};

mod authentication;
mod config;
mod extractor;

pub mod audit;
pub mod authenticator;
pub mod authorizer;
pub mod context;
pub mod manager;
pub mod metadata;
pub mod middleware;
