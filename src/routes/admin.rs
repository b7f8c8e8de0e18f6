use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post},
};

/// Admin Router Module
///
/// Course creation and deletion. Nested under `/admin`; the handlers reject any
/// non-admin principal through the authorization engine (`InsufficientRole`).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/courses
        .route("/courses", post(handlers::create_course))
        // DELETE /admin/courses/{id}
        .route("/courses/{id}", delete(handlers::delete_course))
}
