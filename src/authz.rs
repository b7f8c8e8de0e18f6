use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Course, Role},
};

/// Operation
///
/// Every course-scoped operation the authorization engine knows how to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadCourse,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    ReadRoster,
    MutateRoster,
    ReadRosterExport,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::ReadCourse,
        Operation::CreateCourse,
        Operation::UpdateCourse,
        Operation::DeleteCourse,
        Operation::ReadRoster,
        Operation::MutateRoster,
        Operation::ReadRosterExport,
    ];
}

/// DenyReason
///
/// Why a request was refused. Surfaced to clients as the error code of a 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum DenyReason {
    /// The principal is an instructor, but not the course's instructor.
    NotOwner,
    /// The principal's role can never perform this operation.
    InsufficientRole,
    /// The principal is a student who is not on the course roster.
    NotEnrolled,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotOwner => "not_owner",
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::NotEnrolled => "not_enrolled",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// authorize
///
/// Decides whether `principal` may perform `operation` on `course`.
///
/// This is a pure function of the principal, the operation and the current course
/// state. For `CreateCourse` the caller passes the course it is about to insert.
pub fn authorize(principal: &AuthUser, operation: Operation, course: &Course) -> Decision {
    use Operation::*;

    // Course metadata is visible to every resolved principal.
    if operation == ReadCourse {
        return Decision::Allow;
    }

    match principal.role {
        Role::Admin => Decision::Allow,
        Role::Instructor => match operation {
            UpdateCourse | ReadRoster | MutateRoster | ReadRosterExport => {
                if course.instructor_id == principal.id {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
            CreateCourse | DeleteCourse => Decision::Deny(DenyReason::InsufficientRole),
            ReadCourse => Decision::Allow,
        },
        Role::Student => match operation {
            ReadRoster => {
                if course.is_enrolled(principal.id) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NotEnrolled)
                }
            }
            CreateCourse | UpdateCourse | DeleteCourse | MutateRoster | ReadRosterExport => {
                Decision::Deny(DenyReason::InsufficientRole)
            }
            ReadCourse => Decision::Allow,
        },
    }
}

/// require
///
/// Gate used by the handlers: runs `authorize` and converts a denial into
/// `AppError::Forbidden`, logging the decision.
pub fn require(principal: &AuthUser, operation: Operation, course: &Course) -> Result<(), AppError> {
    match authorize(principal, operation, course) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::warn!(
                principal = %principal.id,
                role = %principal.role,
                course = %course.id,
                ?operation,
                %reason,
                "authorization denied"
            );
            Err(AppError::Forbidden(reason))
        }
    }
}
