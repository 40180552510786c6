//! Security decision events.
//!
//! Every request that passes through the security middleware ends in exactly
//! one [`SecurityOutcome`]. When an event sink is configured, the middleware
//! reports that outcome as a [`SecurityEvent`].
//!
//! # Example
//!
//! ```
//! use warden_core::http::security::audit::{InMemoryEventSink, SecurityEvent, SecurityEventSink, SecurityOutcome};
//!
//! let sink = InMemoryEventSink::new();
//! sink.record(&SecurityEvent::new(SecurityOutcome::Granted).handler("GET /items").sso_id("alice"));
//!
//! assert_eq!(sink.count(SecurityOutcome::Granted), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use parking_lot::Mutex;

use crate::http::error::AuthError;

/// Terminal branch of one security pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityOutcome {
    /// The endpoint carries a security override; no authentication ran.
    Bypassed,
    /// The credential did not authenticate.
    Unauthenticated,
    /// No handler or no metadata could be resolved for the request.
    MissingMetadata,
    /// Metadata exists but names neither an override nor an action.
    MissingAction,
    /// The access manager refused the action.
    AccessDenied,
    /// A manager panicked.
    ManagerFault,
    /// The action was authorized.
    Granted,
}

impl SecurityOutcome {
    /// Error the request is rejected with, or `None` when it is forwarded
    /// to the handler.
    pub fn rejection(self) -> Option<AuthError> {
        match self {
            SecurityOutcome::Bypassed | SecurityOutcome::Granted => None,
            SecurityOutcome::Unauthenticated => Some(AuthError::Unauthorized),
            SecurityOutcome::MissingMetadata
            | SecurityOutcome::MissingAction
            | SecurityOutcome::AccessDenied
            | SecurityOutcome::ManagerFault => Some(AuthError::Forbidden),
        }
    }

    /// Response status, or `None` when the request is forwarded to the handler.
    pub fn status(self) -> Option<StatusCode> {
        self.rejection().map(|error| error.status_code())
    }

    pub fn is_allowed(self) -> bool {
        self.status().is_none()
    }

    /// Stable label, used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            SecurityOutcome::Bypassed => "BYPASSED",
            SecurityOutcome::Unauthenticated => "UNAUTHENTICATED",
            SecurityOutcome::MissingMetadata => "MISSING_METADATA",
            SecurityOutcome::MissingAction => "MISSING_ACTION",
            SecurityOutcome::AccessDenied => "ACCESS_DENIED",
            SecurityOutcome::ManagerFault => "MANAGER_FAULT",
            SecurityOutcome::Granted => "GRANTED",
        }
    }
}

impl fmt::Display for SecurityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One security decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityEvent {
    /// Unix epoch milliseconds
    pub timestamp: u64,
    pub outcome: SecurityOutcome,
    /// Resolved handler id, if any
    pub handler: Option<String>,
    /// Caller, once authenticated
    pub sso_id: Option<String>,
    /// Requested action, once known
    pub action: Option<String>,
}

impl SecurityEvent {
    pub fn new(outcome: SecurityOutcome) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        SecurityEvent {
            timestamp,
            outcome,
            handler: None,
            sso_id: None,
            action: None,
        }
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn sso_id(mut self, sso_id: impl Into<String>) -> Self {
        self.sso_id = Some(sso_id.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Single-line `key=value` rendering.
    pub fn to_log_line(&self) -> String {
        let mut line = format!("[{}]", self.outcome);
        for (key, value) in [
            ("handler", &self.handler),
            ("sso_id", &self.sso_id),
            ("action", &self.action),
        ] {
            if let Some(value) = value {
                line.push_str(&format!(" {}={}", key, value));
            }
        }
        line
    }
}

/// Receives security decisions.
///
/// Called inline on the request path; implementations must not block.
pub trait SecurityEventSink: Send + Sync {
    fn record(&self, event: &SecurityEvent);
}

/// Sink that calls a closure.
pub struct ClosureSink<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    handler: F,
}

impl<F> ClosureSink<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        ClosureSink { handler }
    }
}

impl<F> SecurityEventSink for ClosureSink<F>
where
    F: Fn(&SecurityEvent) + Send + Sync,
{
    fn record(&self, event: &SecurityEvent) {
        (self.handler)(event);
    }
}

/// Bounded in-memory sink for tests and debugging.
///
/// Clones share the same buffer. The oldest event is dropped once the
/// buffer is full.
#[derive(Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<SecurityEvent>>>,
    capacity: usize,
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        InMemoryEventSink {
            events: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<SecurityEvent> {
        self.events.lock().back().cloned()
    }

    /// Number of recorded events with the given outcome.
    pub fn count(&self, outcome: SecurityOutcome) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.outcome == outcome)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SecurityEventSink for InMemoryEventSink {
    fn record(&self, event: &SecurityEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}
