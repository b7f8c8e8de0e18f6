use crate::{
    AppState,
    auth::AuthUser,
    authz::{self, Operation},
    courses,
    enrollment::{self, EnrollmentBatch, EnrollmentOutcome},
    error::{AppError, ErrorResponse},
    models::{
        Course, CourseFilter, CoursePage, CreateCourseRequest, EnrollmentRequest,
        EnrollmentResponse, RosterExport, RosterRow, UpdateCourseRequest, UserProfile,
    },
    roster,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// CourseListParams
///
/// Query parameters of `GET /courses`. All filters are exact matches.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CourseListParams {
    /// 1-indexed page number. Defaults to 1.
    pub page: Option<i64>,
    pub subject: Option<String>,
    pub number: Option<String>,
    pub term: Option<String>,
}

// --- Handlers ---

/// get_me
///
/// [Authenticated Route] The resolved principal of the request.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(AuthUser { id, role }: AuthUser) -> Json<UserProfile> {
    Json(UserProfile { id, role })
}

/// list_courses
///
/// [Authenticated Route] Lists courses one page at a time. Not gated by role.
#[utoipa::path(
    get,
    path = "/courses",
    params(CourseListParams),
    responses((status = 200, description = "One page of courses", body = CoursePage))
)]
pub async fn list_courses(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CourseListParams>,
) -> Result<Json<CoursePage>, AppError> {
    let filter = CourseFilter {
        subject: params.subject,
        number: params.number,
        term: params.term,
    };
    let page = courses::list_courses(
        state.repo.as_ref(),
        params.page.unwrap_or(1),
        &filter,
        state.config.page_size,
    )
    .await?;
    Ok(Json(page))
}

/// get_course
///
/// [Authenticated Route] Course metadata.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Found", body = Course),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = courses::load_course(state.repo.as_ref(), id).await?;
    authz::require(&user, Operation::ReadCourse, &course)?;
    Ok(Json(course))
}

/// create_course
///
/// [Admin Route] Creates a course with an empty roster.
#[utoipa::path(
    post,
    path = "/admin/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 400, description = "Invalid instructor", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn create_course(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = courses::create_course(state.repo.as_ref(), &user, payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// update_course
///
/// [Authenticated Route] Partial update of course metadata by an admin or the course's instructor.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    let course = courses::update_course(state.repo.as_ref(), &user, id, payload).await?;
    Ok(Json(course))
}

/// delete_course
///
/// [Admin Route] Deletes a course and its roster.
#[utoipa::path(
    delete,
    path = "/admin/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_course(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    courses::delete_course(state.repo.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// get_course_students
///
/// [Authenticated Route] The roster as rows, sorted by student id.
#[utoipa::path(
    get,
    path = "/courses/{id}/students",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Roster", body = [RosterRow]),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    )
)]
pub async fn get_course_students(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RosterRow>>, AppError> {
    let course = courses::load_course(state.repo.as_ref(), id).await?;
    authz::require(&user, Operation::ReadRoster, &course)?;
    let rows = roster::build_roster(state.repo.as_ref(), id).await?;
    Ok(Json(rows))
}

/// update_course_students
///
/// [Authenticated Route] Applies an add/remove batch to the roster. Either the whole
/// batch is applied, or the request fails with every invalid id and nothing changes.
#[utoipa::path(
    patch,
    path = "/courses/{id}/students",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = EnrollmentRequest,
    responses(
        (status = 200, description = "Applied", body = EnrollmentResponse),
        (status = 400, description = "Rejected", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_course_students(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnrollmentRequest>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let course = courses::load_course(state.repo.as_ref(), id).await?;
    authz::require(&user, Operation::MutateRoster, &course)?;

    let batch = EnrollmentBatch::from(payload);
    match enrollment::apply_enrollment(state.repo.as_ref(), id, &batch).await? {
        EnrollmentOutcome::Applied { roster_size } => Ok(Json(EnrollmentResponse {
            course_id: id,
            roster_size,
        })),
        EnrollmentOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// export_course_roster
///
/// [Authenticated Route] Regenerates the CSV roster export and returns where to download it.
#[utoipa::path(
    get,
    path = "/courses/{id}/roster",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Export written", body = RosterExport),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn export_course_roster(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RosterExport>, AppError> {
    let course = courses::load_course(state.repo.as_ref(), id).await?;
    authz::require(&user, Operation::ReadRosterExport, &course)?;
    let export = roster::export_roster(state.repo.as_ref(), state.storage.as_ref(), id).await?;
    Ok(Json(export))
}
