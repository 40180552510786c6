//! Security pipeline tests.
//!
//! Tests the middleware decision order: metadata, override, authentication,
//! authorization, handler.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use actix_web::http::header::HeaderName;
use actix_web::http::StatusCode;
use actix_web::test::{call_service, read_body, TestRequest};
use futures_util::future::join_all;

use common::*;
use warden::http::security::{EndpointSecurityMetadata, InMemoryEventSink, SecurityOutcome, SecurityTransform};

// =============================================================================
// Authentication Tests
// =============================================================================

#[actix_web::test]
async fn test_missing_credential_is_unauthorized() {
    let app = create_standard_app().await;

    let req = TestRequest::get().uri("/items").to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_unknown_credential_is_unauthorized() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer("t-mallory"))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_rejections_have_empty_bodies() {
    let app = create_test_app(security(
        FakeAuthenticationManager::new(),
        FakeAccessManager::deny_everything(),
    ))
    .await;

    let req = TestRequest::get().uri("/items").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(read_body(resp).await.is_empty());

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(read_body(resp).await.is_empty());
}

#[actix_web::test]
async fn test_default_identity_for_missing_credential() {
    let app = create_test_app(security(
        FakeAuthenticationManager::new().with_default_identity(),
        FakeAccessManager::standard(),
    ))
    .await;

    let req = TestRequest::get().uri("/items").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "items for anonymous");

    // the default identity may read but not write
    let req = TestRequest::post().uri("/orders").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_custom_credential_header() {
    let security = security(FakeAuthenticationManager::new(), FakeAccessManager::standard())
        .credential_header(HeaderName::from_static("x-api-token"));
    let app = create_test_app(security).await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(("x-api-token", ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Authorization is no longer read
    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Authorization Tests
// =============================================================================

#[actix_web::test]
async fn test_valid_credential_without_permission_is_forbidden() {
    let app = create_standard_app().await;

    // alice can read but not write
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_granted_request_reaches_handler() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "items for alice");

    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(read_body(resp).await, "created by bob");
}

#[actix_web::test]
async fn test_methods_sharing_a_path_require_their_own_action() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // GET /items grants read, which must not open POST /items
    let req = TestRequest::post()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::post()
        .uri("/items")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(read_body(resp).await, "item added by bob");
}

#[actix_web::test]
async fn test_pattern_route_uses_pattern_metadata() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/items/42")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "item 42 for alice");
}

#[actix_web::test]
async fn test_application_caller_without_grant_is_forbidden() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(BATCH_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_scoped_route_with_path_argument() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/api/v1/reports")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "reports for alice");
}

// =============================================================================
// Missing Metadata Tests
// =============================================================================

#[actix_web::test]
async fn test_undeclared_endpoint_is_forbidden_without_authenticating() {
    let authentication = FakeAuthenticationManager::new();
    let calls = authentication.calls();
    let app = create_test_app(security(authentication, FakeAccessManager::standard())).await;

    // even without a credential: missing metadata wins over authentication
    let req = TestRequest::get().uri("/undeclared").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = TestRequest::get()
        .uri("/undeclared")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_metadata_without_action_is_forbidden_after_authentication() {
    let sink = InMemoryEventSink::new();
    let metadata = test_metadata().insert("GET /undeclared", EndpointSecurityMetadata::forbidden());
    let security = SecurityTransform::new(
        Arc::new(FakeAuthenticationManager::new()),
        Arc::new(FakeAccessManager::standard()),
        metadata,
    )
    .event_sink(sink.clone());
    let app = create_test_app(security).await;

    let req = TestRequest::get()
        .uri("/undeclared")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(read_body(resp).await.is_empty());

    let event = sink.last().unwrap();
    assert_eq!(event.outcome, SecurityOutcome::MissingAction);
    assert_eq!(event.sso_id.as_deref(), Some("bob"));
    assert_eq!(event.action, None);

    // metadata exists, so authentication runs first
    let req = TestRequest::get().uri("/undeclared").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(sink.last().unwrap().outcome, SecurityOutcome::Unauthenticated);
}

#[actix_web::test]
async fn test_unmatched_route_is_forbidden() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/no/such/route")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_explicit_entry_secures_undeclared_handler() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/context")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "alice|t-alice");
}

// =============================================================================
// Security Override Tests
// =============================================================================

#[actix_web::test]
async fn test_override_skips_authentication() {
    let authentication = FakeAuthenticationManager::new();
    let calls = authentication.calls();
    let app = create_test_app(security(authentication, FakeAccessManager::deny_everything())).await;

    let req = TestRequest::get().uri("/health").to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "ok");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn test_override_ignores_garbage_credential() {
    let app = create_standard_app().await;

    let req = TestRequest::get()
        .uri("/health")
        .insert_header(bearer("definitely-not-a-token"))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_override_attaches_no_caller() {
    let app = create_standard_app().await;

    // a valid credential is not resolved on a bypassed endpoint
    let req = TestRequest::get()
        .uri("/whoami")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, "anonymous");

    // a handler that insists on a caller answers 401 itself
    let req = TestRequest::get()
        .uri("/bypass/me")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_override_survives_panicking_managers() {
    let app = create_test_app(security(PanickingAuthenticationManager, PanickingAccessManager)).await;

    let req = TestRequest::get().uri("/health").to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Manager Fault Tests
// =============================================================================

#[actix_web::test]
async fn test_panicking_authentication_manager_is_forbidden() {
    let app = create_test_app(security(PanickingAuthenticationManager, FakeAccessManager::standard())).await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_panicking_access_manager_is_forbidden() {
    let app = create_test_app(security(FakeAuthenticationManager::new(), PanickingAccessManager)).await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(ALICE_TOKEN))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // the worker keeps serving after a fault
    let req = TestRequest::get().uri("/health").to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Audit Tests
// =============================================================================

#[actix_web::test]
async fn test_every_decision_is_reported() {
    let sink = InMemoryEventSink::new();
    let security = security(FakeAuthenticationManager::new(), FakeAccessManager::standard())
        .event_sink(sink.clone());
    let app = create_test_app(security).await;

    let requests = vec![
        TestRequest::get().uri("/health").to_request(),
        TestRequest::get().uri("/items").to_request(),
        TestRequest::get().uri("/undeclared").to_request(),
        TestRequest::post()
            .uri("/orders")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
        TestRequest::get()
            .uri("/items")
            .insert_header(bearer(ALICE_TOKEN))
            .to_request(),
    ];
    for req in requests {
        call_service(&app, req).await;
    }

    assert_eq!(sink.len(), 5);
    assert_eq!(sink.count(SecurityOutcome::Bypassed), 1);
    assert_eq!(sink.count(SecurityOutcome::Unauthenticated), 1);
    assert_eq!(sink.count(SecurityOutcome::MissingMetadata), 1);
    assert_eq!(sink.count(SecurityOutcome::AccessDenied), 1);
    assert_eq!(sink.count(SecurityOutcome::Granted), 1);

    let last = sink.last().unwrap();
    assert_eq!(last.handler.as_deref(), Some("GET /items"));
    assert_eq!(last.sso_id.as_deref(), Some("alice"));
    assert_eq!(last.action.as_deref(), Some("read"));
}

#[actix_web::test]
async fn test_manager_fault_is_reported() {
    let sink = InMemoryEventSink::new();
    let security = security(FakeAuthenticationManager::new(), PanickingAccessManager).event_sink(sink.clone());
    let app = create_test_app(security).await;

    let req = TestRequest::get()
        .uri("/items")
        .insert_header(bearer(BOB_TOKEN))
        .to_request();
    call_service(&app, req).await;

    let event = sink.last().unwrap();
    assert_eq!(event.outcome, SecurityOutcome::ManagerFault);
    assert_eq!(event.outcome.status(), Some(StatusCode::FORBIDDEN));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[actix_web::test]
async fn test_concurrent_requests_are_independent() {
    let authentication = FakeAuthenticationManager::new();
    let calls = authentication.calls();
    let app = Arc::new(create_test_app(security(authentication, FakeAccessManager::standard())).await);

    let tokens = [ALICE_TOKEN, BOB_TOKEN, BATCH_TOKEN, "t-unknown"];
    let responses = join_all((0..20).map(|i| {
        let app = Arc::clone(&app);
        let token = tokens[i % tokens.len()];
        async move {
            let req = TestRequest::post()
                .uri("/orders")
                .insert_header(bearer(token))
                .to_request();
            (token, call_service(app.as_ref(), req).await.status())
        }
    }))
    .await;

    for (token, status) in responses {
        let expected = match token {
            BOB_TOKEN => StatusCode::CREATED,
            ALICE_TOKEN | BATCH_TOKEN => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };
        assert_eq!(status, expected, "token {}", token);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}
