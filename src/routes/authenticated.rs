use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// Every handler here receives a resolved `AuthUser`. Listing and course metadata are open
/// to any principal; roster reads, roster changes and exports go through the
/// authorization engine against the target course.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /courses?page=&subject=&number=&term=
        .route("/courses", get(handlers::list_courses))
        // GET/PUT /courses/{id}
        // Updates are limited to admins and the course's own instructor.
        .route(
            "/courses/{id}",
            get(handlers::get_course).put(handlers::update_course),
        )
        // GET/PATCH /courses/{id}/students
        // PATCH applies an add/remove batch all-or-nothing.
        .route(
            "/courses/{id}/students",
            get(handlers::get_course_students).patch(handlers::update_course_students),
        )
        // GET /courses/{id}/roster
        // Regenerates the CSV export and returns its download reference.
        .route("/courses/{id}/roster", get(handlers::export_course_roster))
}
