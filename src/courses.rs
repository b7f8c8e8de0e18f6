use uuid::Uuid;

use crate::{
    auth::AuthUser,
    authz::{self, Operation},
    error::AppError,
    models::{Course, CourseFilter, CoursePage, CreateCourseRequest, Role, UpdateCourseRequest},
    repository::Repository,
};

/// list_courses
///
/// One page of courses matching `filter`. `page` is 1-indexed; page 0 and pages past the
/// end come back empty rather than as errors.
pub async fn list_courses(
    repo: &dyn Repository,
    page: i64,
    filter: &CourseFilter,
    page_size: i64,
) -> Result<CoursePage, AppError> {
    let items = if page < 1 {
        vec![]
    } else {
        let offset = (page - 1).saturating_mul(page_size);
        repo.query_courses(filter, page_size, offset).await?
    };

    Ok(CoursePage {
        page,
        page_size,
        items,
    })
}

/// Fetches a course or reports it as not found.
pub async fn load_course(repo: &dyn Repository, id: Uuid) -> Result<Course, AppError> {
    repo.get_course(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {id}")))
}

/// Checks that `instructor_id` names an existing identity with the instructor role.
pub async fn validate_instructor(repo: &dyn Repository, instructor_id: Uuid) -> Result<(), AppError> {
    match repo.get_user(instructor_id).await? {
        Some(user) if user.role == Role::Instructor => Ok(()),
        _ => Err(AppError::validation(
            "instructor must reference an existing instructor",
            vec![instructor_id],
        )),
    }
}

pub async fn create_course(
    repo: &dyn Repository,
    principal: &AuthUser,
    req: CreateCourseRequest,
) -> Result<Course, AppError> {
    let candidate = Course {
        id: Uuid::new_v4(),
        subject: req.subject,
        number: req.number,
        term: req.term,
        instructor_id: req.instructor_id,
        students: vec![],
        assignments: req.assignments,
        ..Course::default()
    };
    authz::require(principal, Operation::CreateCourse, &candidate)?;
    validate_instructor(repo, candidate.instructor_id).await?;

    let course = repo.create_course(candidate).await?;
    tracing::info!(course = %course.id, instructor = %course.instructor_id, "course created");
    Ok(course)
}

pub async fn update_course(
    repo: &dyn Repository,
    principal: &AuthUser,
    id: Uuid,
    req: UpdateCourseRequest,
) -> Result<Course, AppError> {
    let course = load_course(repo, id).await?;
    authz::require(principal, Operation::UpdateCourse, &course)?;
    // The owner must still be an instructor after every update, not only on reassignment.
    validate_instructor(repo, req.instructor_id.unwrap_or(course.instructor_id)).await?;

    repo.update_course(id, req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {id}")))
}

pub async fn delete_course(repo: &dyn Repository, principal: &AuthUser, id: Uuid) -> Result<(), AppError> {
    let course = load_course(repo, id).await?;
    authz::require(principal, Operation::DeleteCourse, &course)?;

    if repo.delete_course(id).await? {
        tracing::info!(course = %id, "course deleted");
        Ok(())
    } else {
        Err(AppError::NotFound(format!("course {id}")))
    }
}
