//! Declarative endpoint access metadata.
//!
//! Each endpoint is identified by a *handler id*: the request method and
//! the route pattern actix matched, separated by one space (e.g.
//! `GET /items/{id}`). Two handlers sharing a path under different methods
//! therefore carry separate requirements. The [`EndpointMetadataTable`] maps
//! handler ids to [`EndpointSecurityMetadata`]. Entries come from two places:
//!
//! - `#[requires_action]` / `#[security_override]` attributes, which submit
//!   an [`EndpointDeclaration`] collected at link time
//! - explicit registration on the table, which wins over declarations for
//!   the same handler id
//!
//! An endpoint without metadata is forbidden.
//!
//! # Example
//! ```
//! use warden_core::http::security::EndpointMetadataTable;
//!
//! let table = EndpointMetadataTable::new()
//!     .action("GET /items", "read")
//!     .action("POST /items", "write")
//!     .bypass("GET /health", false);
//!
//! assert_eq!(table.resolve("GET /items").and_then(|m| m.required_action()), Some("read"));
//! assert_eq!(table.resolve("POST /items").and_then(|m| m.required_action()), Some("write"));
//! assert!(table.resolve("GET /health").is_some_and(|m| m.is_bypassed()));
//! assert!(table.resolve("DELETE /items").is_none());
//! ```

use std::collections::HashMap;

use actix_web::dev::ServiceRequest;
use derive_more::{Display, Error};

/// Endpoint declarations that cannot be merged.
#[derive(Debug, Display, Error)]
pub enum MetadataError {
    #[display("conflicting actions declared for '{handler}': '{first}' and '{second}'")]
    ConflictingAction {
        handler: String,
        first: String,
        second: String,
    },
}

/// Marks an endpoint as exempt from authentication and authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecurityOverride {
    pub log_access: bool,
}

/// Access requirements of one endpoint.
///
/// With neither an override nor an action, the endpoint is implicitly
/// forbidden.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointSecurityMetadata {
    security_override: Option<SecurityOverride>,
    action: Option<String>,
}

impl EndpointSecurityMetadata {
    /// Metadata with neither an override nor an action.
    pub fn forbidden() -> Self {
        Self::default()
    }

    /// Metadata requiring `action`.
    pub fn requires(action: impl Into<String>) -> Self {
        Self::default().with_action(action)
    }

    /// Metadata bypassing the pipeline.
    pub fn bypassed(log_access: bool) -> Self {
        Self::default().with_override(SecurityOverride { log_access })
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_override(mut self, security_override: SecurityOverride) -> Self {
        self.security_override = Some(security_override);
        self
    }

    pub fn security_override(&self) -> Option<SecurityOverride> {
        self.security_override
    }

    pub fn is_bypassed(&self) -> bool {
        self.security_override.is_some()
    }

    pub fn required_action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    fn apply(&mut self, handler: &str, declaration: &EndpointDeclaration) -> Result<(), MetadataError> {
        match declaration.kind {
            DeclarationKind::Action(action) => match &self.action {
                Some(existing) if existing != action => {
                    return Err(MetadataError::ConflictingAction {
                        handler: handler.to_string(),
                        first: existing.clone(),
                        second: action.to_string(),
                    });
                }
                _ => self.action = Some(action.to_string()),
            },
            DeclarationKind::Override { log_access } => {
                let current = self.security_override.unwrap_or_default();
                self.security_override = Some(SecurityOverride {
                    log_access: current.log_access || log_access,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum DeclarationKind {
    Action(&'static str),
    Override { log_access: bool },
}

/// Link-time endpoint declaration, submitted by the attribute macros.
///
/// ```ignore
/// warden::__private::inventory::submit! {
///     EndpointDeclaration::action("GET", "/items", "read")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EndpointDeclaration {
    method: &'static str,
    pattern: &'static str,
    kind: DeclarationKind,
}

impl EndpointDeclaration {
    pub const fn action(method: &'static str, pattern: &'static str, action: &'static str) -> Self {
        EndpointDeclaration {
            method,
            pattern,
            kind: DeclarationKind::Action(action),
        }
    }

    pub const fn bypass(method: &'static str, pattern: &'static str, log_access: bool) -> Self {
        EndpointDeclaration {
            method,
            pattern,
            kind: DeclarationKind::Override { log_access },
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Handler id this declaration applies to.
    pub fn handler_id(&self) -> String {
        handler_id(self.method, self.pattern)
    }
}

/// Joins a method and a route pattern into a handler id.
pub fn handler_id(method: &str, pattern: &str) -> String {
    format!("{} {}", method, pattern)
}

inventory::collect!(EndpointDeclaration);

/// Handler id to metadata lookup.
#[derive(Debug, Clone, Default)]
pub struct EndpointMetadataTable {
    declared: HashMap<String, EndpointSecurityMetadata>,
    explicit: HashMap<String, EndpointSecurityMetadata>,
}

impl EndpointMetadataTable {
    /// Empty table: every endpoint is forbidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding every declaration linked into the binary.
    ///
    /// # Errors
    /// [`MetadataError::ConflictingAction`] if one handler id is declared
    /// with two different actions.
    pub fn declared() -> Result<Self, MetadataError> {
        Self::from_declarations(inventory::iter::<EndpointDeclaration>)
    }

    /// Table built from the given declarations.
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = &'a EndpointDeclaration>,
    ) -> Result<Self, MetadataError> {
        let mut declared: HashMap<String, EndpointSecurityMetadata> = HashMap::new();
        for declaration in declarations {
            let handler = declaration.handler_id();
            declared
                .entry(handler.clone())
                .or_default()
                .apply(&handler, declaration)?;
        }
        tracing::debug!(endpoints = declared.len(), "collected endpoint declarations");

        Ok(EndpointMetadataTable {
            declared,
            explicit: HashMap::new(),
        })
    }

    /// Requires `action` on `handler`.
    pub fn action(mut self, handler: impl Into<String>, action: impl Into<String>) -> Self {
        let entry = self.explicit.entry(handler.into()).or_default();
        entry.action = Some(action.into());
        self
    }

    /// Exempts `handler` from the pipeline.
    pub fn bypass(mut self, handler: impl Into<String>, log_access: bool) -> Self {
        let entry = self.explicit.entry(handler.into()).or_default();
        entry.security_override = Some(SecurityOverride { log_access });
        self
    }

    /// Sets the whole metadata of `handler`.
    pub fn insert(mut self, handler: impl Into<String>, metadata: EndpointSecurityMetadata) -> Self {
        self.explicit.insert(handler.into(), metadata);
        self
    }

    /// Metadata of `handler`; explicit entries shadow declarations.
    pub fn resolve(&self, handler: &str) -> Option<&EndpointSecurityMetadata> {
        self.explicit
            .get(handler)
            .or_else(|| self.declared.get(handler))
    }

    /// Number of distinct handler ids with metadata.
    pub fn len(&self) -> usize {
        self.declared.len()
            + self
                .explicit
                .keys()
                .filter(|k| !self.declared.contains_key(*k))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty() && self.explicit.is_empty()
    }
}

/// Maps a request to its handler id.
pub trait HandlerResolver: Send + Sync {
    fn resolve(&self, req: &ServiceRequest) -> Option<String>;
}

/// Uses the request method and the route pattern actix matched, e.g.
/// `POST /orders`.
///
/// Yields `None` for requests no route matched. The middleware must be
/// registered on a scope (or with `App::wrap` on a service that already
/// routed) for the pattern to be known.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPatternResolver;

impl HandlerResolver for MatchPatternResolver {
    fn resolve(&self, req: &ServiceRequest) -> Option<String> {
        req.match_pattern()
            .map(|pattern| handler_id(req.method().as_str(), &pattern))
    }
}

impl<F> HandlerResolver for F
where
    F: Fn(&ServiceRequest) -> Option<String> + Send + Sync,
{
    fn resolve(&self, req: &ServiceRequest) -> Option<String> {
        self(req)
    }
}
