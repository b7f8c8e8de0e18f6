use crate::{
    error::AppError,
    models::{Course, CourseFilter, UpdateCourseRequest, User},
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence collaborator consumed by the core. Handlers and core components only
/// ever see this trait, so the Postgres implementation can be swapped for an in-memory
/// one in tests.
///
/// Every method may fail with `AppError::Dependency`; "not found" is expressed through
/// `Option`/`bool` so callers decide how to report it.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identities ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    // Bulk lookup. Unknown ids are simply absent from the result.
    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;

    // --- Courses ---
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, AppError>;
    // Equality filters, deterministic order, `limit`/`offset` window.
    async fn query_courses(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, AppError>;
    async fn create_course(&self, course: Course) -> Result<Course, AppError>;
    // Partial update of course metadata. Never touches the roster.
    async fn update_course(
        &self,
        id: Uuid,
        req: UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError>;
    async fn delete_course(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Roster ---
    /// Replaces the whole membership set in a single write. Returns `None` if the
    /// course no longer exists.
    async fn replace_roster(
        &self,
        course_id: Uuid,
        students: &[Uuid],
    ) -> Result<Option<Course>, AppError>;
}

/// RepositoryState
///
/// The shared handle injected into the application state.
pub type RepositoryState = Arc<dyn Repository>;

const COURSE_COLUMNS: &str = "id, subject, number, term, instructor_id, students, assignments, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, name, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, name, role FROM profiles WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    /// query_courses
    ///
    /// Builds the listing query with `QueryBuilder` so every filter value is bound,
    /// never interpolated.
    async fn query_courses(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, AppError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses WHERE TRUE"));

        if let Some(subject) = &filter.subject {
            builder.push(" AND subject = ");
            builder.push_bind(subject.clone());
        }
        if let Some(number) = &filter.number {
            builder.push(" AND number = ");
            builder.push_bind(number.clone());
        }
        if let Some(term) = &filter.term {
            builder.push(" AND term = ");
            builder.push_bind(term.clone());
        }

        builder.push(" ORDER BY subject, number, term, id LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let courses = builder
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;
        Ok(courses)
    }

    async fn create_course(&self, course: Course) -> Result<Course, AppError> {
        let created = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (id, subject, number, term, instructor_id, students, assignments, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course.id)
        .bind(course.subject)
        .bind(course.number)
        .bind(course.term)
        .bind(course.instructor_id)
        .bind(course.students)
        .bind(course.assignments)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// update_course
    ///
    /// Uses `COALESCE` so that only the provided fields change.
    async fn update_course(
        &self,
        id: Uuid,
        req: UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError> {
        let updated = sqlx::query_as::<_, Course>(&format!(
            r#"
            UPDATE courses
            SET subject = COALESCE($2, subject),
                number = COALESCE($3, number),
                term = COALESCE($4, term),
                instructor_id = COALESCE($5, instructor_id),
                assignments = COALESCE($6, assignments),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.subject)
        .bind(req.number)
        .bind(req.term)
        .bind(req.instructor_id)
        .bind(req.assignments)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// replace_roster
    ///
    /// One `UPDATE` per batch: the membership array is swapped as a whole, so readers
    /// never observe a half-applied batch. Concurrent batches are last-write-wins.
    async fn replace_roster(
        &self,
        course_id: Uuid,
        students: &[Uuid],
    ) -> Result<Option<Course>, AppError> {
        let updated = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET students = $2, updated_at = NOW() WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course_id)
        .bind(students)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}
