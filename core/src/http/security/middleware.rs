//! Security middleware for Actix Web.
//!
//! Every request goes through the same strictly sequential pipeline:
//!
//! 1. resolve the handler id and its [`EndpointSecurityMetadata`]; none ⇒ 403
//! 2. a security override lets the request through unauthenticated
//! 3. authenticate the credential header; invalid ⇒ 401
//! 4. authorize the endpoint's action; no action or refused ⇒ 403
//! 5. attach the [`Authentication`] and run the handler
//!
//! A panicking manager denies the request with 403.
//!
//! [`EndpointSecurityMetadata`]: crate::http::security::EndpointSecurityMetadata

use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_web::body::EitherBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, AUTHORIZATION};
use actix_web::{Error, HttpMessage, ResponseError};
use futures_util::future::{ok, FutureExt, LocalBoxFuture, Ready};

use crate::http::security::audit::{SecurityEvent, SecurityEventSink, SecurityOutcome};
use crate::http::security::config::{AccessManager, AuthenticationManager};
use crate::http::security::metadata::{EndpointMetadataTable, HandlerResolver, MatchPatternResolver};
use crate::http::security::{Authentication, AuthenticationResult, SecurityContext};
use crate::logging::ACCESS_TARGET;
use crate::registry::{ComponentKey, Registry, RegistryError};

/// Security middleware factory.
///
/// # Example
/// ```ignore
/// let security = SecurityTransform::from_registry(&registry, EndpointMetadataTable::declared()?)?;
///
/// App::new().service(
///     web::scope("")
///         .wrap(security.clone())
///         .service(list_items),
/// )
/// ```
#[derive(Clone)]
pub struct SecurityTransform {
    authentication: Arc<dyn AuthenticationManager>,
    access: Arc<dyn AccessManager>,
    metadata: Arc<EndpointMetadataTable>,
    resolver: Arc<dyn HandlerResolver>,
    credential_header: HeaderName,
    event_sink: Option<Arc<dyn SecurityEventSink>>,
}

impl SecurityTransform {
    pub fn new(
        authentication: Arc<dyn AuthenticationManager>,
        access: Arc<dyn AccessManager>,
        metadata: EndpointMetadataTable,
    ) -> Self {
        SecurityTransform {
            authentication,
            access,
            metadata: Arc::new(metadata),
            resolver: Arc::new(MatchPatternResolver),
            credential_header: AUTHORIZATION,
            event_sink: None,
        }
    }

    /// Uses the managers installed in `registry`.
    ///
    /// # Errors
    /// Fails if either manager has not been initialized.
    pub fn from_registry(registry: &Registry, metadata: EndpointMetadataTable) -> Result<Self, RegistryError> {
        let authentication =
            registry.get::<dyn AuthenticationManager>(&ComponentKey::of::<dyn AuthenticationManager>())?;
        let access = registry.get::<dyn AccessManager>(&ComponentKey::of::<dyn AccessManager>())?;
        Ok(Self::new(authentication, access, metadata))
    }

    /// Header carrying the credential (default: `Authorization`).
    pub fn credential_header(mut self, header: HeaderName) -> Self {
        self.credential_header = header;
        self
    }

    /// Replaces the default [`MatchPatternResolver`].
    pub fn resolver(mut self, resolver: impl HandlerResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Reports every decision to `sink`.
    pub fn event_sink(mut self, sink: impl SecurityEventSink + 'static) -> Self {
        self.event_sink = Some(Arc::new(sink));
        self
    }

    async fn evaluate(&self, req: &ServiceRequest) -> Verdict {
        let Some(handler) = self.resolver.resolve(req) else {
            tracing::trace!(target: ACCESS_TARGET, path = req.path(), "no handler resolved");
            return Verdict::new(SecurityOutcome::MissingMetadata);
        };

        let Some(metadata) = self.metadata.resolve(&handler) else {
            tracing::trace!(target: ACCESS_TARGET, %handler, "no security metadata");
            return Verdict::new(SecurityOutcome::MissingMetadata).handler(handler);
        };

        if let Some(security_override) = metadata.security_override() {
            if security_override.log_access {
                tracing::info!(
                    target: ACCESS_TARGET,
                    %handler,
                    method = %req.method(),
                    path = req.path(),
                    "security override"
                );
            } else {
                tracing::trace!(target: ACCESS_TARGET, %handler, "security override");
            }
            return Verdict::new(SecurityOutcome::Bypassed).handler(handler);
        }

        let credential = req
            .headers()
            .get(&self.credential_header)
            .and_then(|value| value.to_str().ok());

        let authenticated = AssertUnwindSafe(async { self.authentication.authenticate(credential).await })
            .catch_unwind()
            .await;
        let authentication = match authenticated {
            Ok(AuthenticationResult::Valid(authentication)) => authentication,
            Ok(AuthenticationResult::Invalid) => {
                tracing::trace!(target: ACCESS_TARGET, %handler, "authentication failed");
                return Verdict::new(SecurityOutcome::Unauthenticated).handler(handler);
            }
            Err(_) => {
                tracing::error!(target: ACCESS_TARGET, %handler, "authentication manager panicked");
                return Verdict::new(SecurityOutcome::ManagerFault).handler(handler);
            }
        };

        let Some(action) = metadata.required_action() else {
            tracing::trace!(
                target: ACCESS_TARGET,
                %handler,
                sso_id = authentication.sso_id(),
                "endpoint declares no action"
            );
            return Verdict::new(SecurityOutcome::MissingAction)
                .handler(handler)
                .authentication(authentication);
        };

        let decided = AssertUnwindSafe(async { self.access.has_access(&authentication, action).await })
            .catch_unwind()
            .await;
        let outcome = match decided {
            Ok(true) => SecurityOutcome::Granted,
            Ok(false) => {
                tracing::trace!(
                    target: ACCESS_TARGET,
                    %handler,
                    sso_id = authentication.sso_id(),
                    action,
                    "access denied"
                );
                SecurityOutcome::AccessDenied
            }
            Err(_) => {
                tracing::error!(
                    target: ACCESS_TARGET,
                    %handler,
                    sso_id = authentication.sso_id(),
                    action,
                    "access manager panicked"
                );
                SecurityOutcome::ManagerFault
            }
        };

        if outcome == SecurityOutcome::Granted {
            tracing::debug!(
                target: ACCESS_TARGET,
                %handler,
                sso_id = authentication.sso_id(),
                correlation_id = authentication.correlation_id(),
                action,
                "access granted"
            );
        }

        Verdict {
            outcome,
            handler: Some(handler),
            action: Some(action.to_string()),
            authentication: Some(authentication),
        }
    }

    fn record(&self, verdict: &Verdict) {
        let Some(sink) = &self.event_sink else {
            return;
        };

        let mut event = SecurityEvent::new(verdict.outcome);
        event.handler = verdict.handler.clone();
        event.action = verdict.action.clone();
        event.sso_id = verdict
            .authentication
            .as_ref()
            .map(|a| a.sso_id().to_string());
        sink.record(&event);
    }
}

/// Result of one pipeline run.
struct Verdict {
    outcome: SecurityOutcome,
    handler: Option<String>,
    action: Option<String>,
    authentication: Option<Authentication>,
}

impl Verdict {
    fn new(outcome: SecurityOutcome) -> Self {
        Verdict {
            outcome,
            handler: None,
            action: None,
            authentication: None,
        }
    }

    fn handler(mut self, handler: String) -> Self {
        self.handler = Some(handler);
        self
    }

    fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityTransform
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SecurityService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecurityService {
            security: Rc::new(self.clone()),
            service: Rc::new(service),
        })
    }
}

/// Security middleware service.
pub struct SecurityService<S> {
    security: Rc<SecurityTransform>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let security = Rc::clone(&self.security);
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let verdict = security.evaluate(&req).await;
            security.record(&verdict);

            if let Some(error) = verdict.outcome.rejection() {
                return Ok(req.into_response(error.error_response().map_into_right_body()));
            }

            let authentication = verdict.authentication;
            if let Some(authentication) = &authentication {
                req.extensions_mut().insert(authentication.clone());
            }

            let res = SecurityContext::run_with(authentication, service.call(req)).await?;
            Ok(res.map_into_left_body())
        })
    }
}
