use axum::{
    extract::{FromRef, Request}, 
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response, 
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: authorization, enrollment and roster export.
pub mod authz;
pub mod enrollment;
pub mod roster;
pub mod courses;

// Collaborators and plumbing.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{public, authenticated, admin};
use auth::AuthUser;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{RepositoryState, PostgresRepository};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for the service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_me, handlers::list_courses, handlers::get_course,
        handlers::create_course, handlers::update_course, handlers::delete_course,
        handlers::get_course_students, handlers::update_course_students,
        handlers::export_course_roster
    ),
    components(
        schemas(
            models::Role, models::Course, models::CreateCourseRequest, models::UpdateCourseRequest,
            models::EnrollmentRequest, models::EnrollmentResponse, models::CoursePage,
            models::RosterRow, models::RosterExport, models::UserProfile,
            error::ErrorResponse, authz::DenyReason, enrollment::Rejection,
        )
    ),
    tags(
        (name = "course-roster", description = "Course, enrollment and roster export API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler needs, built once in `main` and cloned per request. The
/// collaborators are injected here rather than held in globals.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator (Postgres in production).
    pub repo: RepositoryState,
    /// Artifact storage collaborator (S3/MinIO).
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Lets extractors such as `AuthUser` pull single components out of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless an `AuthUser` can be resolved.
async fn auth_middleware(
    _auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles all routes, the auth layer and the tracing/request-id layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware
                ))
        )
        // Admin-only operations are decided by the authorization engine in the handlers.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // 3. Request id + tracing.
    base_router
        .layer(
             ServiceBuilder::new()
                 .layer(SetRequestIdLayer::new(
                     x_request_id.clone(),
                     MakeRequestUuid,
                 ))
                 .layer(
                     TraceLayer::new_for_http()
                         .make_span_with(trace_span_logger)
                         .on_response(
                             DefaultOnResponse::new()
                                 .level(Level::INFO)
                                 .latency_unit(tower_http::LatencyUnit::Millis)
                         )
                 )
                 .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`, tagged with the request id so all log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id, 
    )
}
