use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of roles an identity can hold. Stored as lowercase text in
/// `public.profiles.role` and matched exhaustively by the authorization engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Instructor,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User
///
/// The identity record stored in `public.profiles`. Owned by the external identity
/// provider; this service only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, mirrors the external auth provider's user id.
    pub id: Uuid,
    pub email: String,
    // Display name used in roster exports.
    pub name: String,
    pub role: Role,
}

/// Course
///
/// A course record from `public.courses`. The course exclusively owns its roster:
/// `students` is only ever rewritten as a whole by the enrollment mutator.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    // e.g. "CS"
    pub subject: String,
    // e.g. "101"
    pub number: String,
    // e.g. "2025-fall"
    pub term: String,
    // FK to public.profiles.id, must reference an instructor.
    pub instructor_id: Uuid,
    // Enrolled student ids, kept sorted.
    pub students: Vec<Uuid>,
    pub assignments: Vec<Uuid>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn is_enrolled(&self, student_id: Uuid) -> bool {
        self.students.contains(&student_id)
    }
}

/// --- Request Payloads (Input Schemas) ---

/// CreateCourseRequest
///
/// Input payload for `POST /admin/courses`. New courses start with an empty roster.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub subject: String,
    pub number: String,
    pub term: String,
    pub instructor_id: Uuid,
    #[serde(default)]
    pub assignments: Vec<Uuid>,
}

/// UpdateCourseRequest
///
/// Partial update payload for `PUT /courses/{id}`. Only fields that are `Some` are applied.
/// The roster is deliberately absent: it changes only through `PATCH /courses/{id}/students`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<Uuid>>,
}

/// EnrollmentRequest
///
/// Input payload for `PATCH /courses/{id}/students`: the batch of students to add and remove.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub add: Vec<Uuid>,
    #[serde(default)]
    pub remove: Vec<Uuid>,
}

/// CourseFilter
///
/// Optional equality filters applied when listing courses.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CourseFilter {
    pub subject: Option<String>,
    pub number: Option<String>,
    pub term: Option<String>,
}

impl CourseFilter {
    pub fn matches(&self, course: &Course) -> bool {
        self.subject.as_ref().is_none_or(|s| *s == course.subject)
            && self.number.as_ref().is_none_or(|n| *n == course.number)
            && self.term.as_ref().is_none_or(|t| *t == course.term)
    }
}

/// --- Output Schemas ---

/// CoursePage
///
/// One page of the course listing. `items` is empty for out-of-range pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CoursePage {
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<Course>,
}

/// EnrollmentResponse
///
/// Returned when a batch has been applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EnrollmentResponse {
    pub course_id: Uuid,
    pub roster_size: usize,
}

/// RosterRow
///
/// One exported roster line: the student's identifier plus display fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct RosterRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// RosterExport
///
/// Reference to a generated roster artifact. `url` is the retrievable location handed
/// back by the storage service; `key` is the stable object key for the course.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RosterExport {
    pub course_id: Uuid,
    pub key: String,
    pub url: String,
    pub rows: usize,
}

/// UserProfile
///
/// Output schema for the authenticated principal (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub role: Role,
}
