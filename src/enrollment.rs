use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{EnrollmentRequest, Role},
    repository::Repository,
};

/// EnrollmentBatch
///
/// One add/remove change request against a single course roster. Duplicates in the
/// incoming payload collapse here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentBatch {
    pub add: BTreeSet<Uuid>,
    pub remove: BTreeSet<Uuid>,
}

impl EnrollmentBatch {
    pub fn new(
        add: impl IntoIterator<Item = Uuid>,
        remove: impl IntoIterator<Item = Uuid>,
    ) -> Self {
        Self {
            add: add.into_iter().collect(),
            remove: remove.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

impl From<EnrollmentRequest> for EnrollmentBatch {
    fn from(req: EnrollmentRequest) -> Self {
        EnrollmentBatch::new(req.add, req.remove)
    }
}

/// Rejection
///
/// Every identifier that made a batch invalid, grouped by cause. All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Rejection {
    /// Listed in both `add` and `remove`.
    pub overlapping: Vec<Uuid>,
    /// Listed in `add` but not an existing student identity.
    pub unknown_students: Vec<Uuid>,
    /// Listed in `remove` but not currently on the roster.
    pub not_enrolled: Vec<Uuid>,
}

impl Rejection {
    pub fn is_empty(&self) -> bool {
        self.overlapping.is_empty() && self.unknown_students.is_empty() && self.not_enrolled.is_empty()
    }

    /// All offending identifiers, sorted and deduplicated.
    pub fn invalid_ids(&self) -> Vec<Uuid> {
        self.overlapping
            .iter()
            .chain(&self.unknown_students)
            .chain(&self.not_enrolled)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError::validation(
            "please make sure all students to add/remove are valid",
            rejection.invalid_ids(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Applied { roster_size: usize },
    Rejected(Rejection),
}

/// plan_enrollment
///
/// Validates `batch` against the current roster and the set of ids known to be student
/// identities, and computes the resulting roster.
///
/// Removals are applied before additions. Adding a student who is already enrolled is a
/// no-op, but removing one who is not enrolled invalidates the whole batch.
pub fn plan_enrollment(
    roster: &BTreeSet<Uuid>,
    batch: &EnrollmentBatch,
    known_students: &BTreeSet<Uuid>,
) -> Result<BTreeSet<Uuid>, Rejection> {
    let rejection = Rejection {
        overlapping: batch.add.intersection(&batch.remove).copied().collect(),
        unknown_students: batch.add.difference(known_students).copied().collect(),
        not_enrolled: batch.remove.difference(roster).copied().collect(),
    };
    if !rejection.is_empty() {
        return Err(rejection);
    }

    let mut next: BTreeSet<Uuid> = roster.difference(&batch.remove).copied().collect();
    next.extend(batch.add.iter().copied());
    Ok(next)
}

/// apply_enrollment
///
/// Applies `batch` to the roster of `course_id` with all-or-nothing semantics: either
/// every change lands in one atomic roster replace, or nothing is written.
///
/// Returns `Err(AppError::NotFound)` for a missing course and propagates collaborator
/// failures unchanged. Authorization must already have passed.
pub async fn apply_enrollment(
    repo: &dyn Repository,
    course_id: Uuid,
    batch: &EnrollmentBatch,
) -> Result<EnrollmentOutcome, AppError> {
    let course = repo
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {course_id}")))?;
    let roster: BTreeSet<Uuid> = course.students.iter().copied().collect();

    let candidates: Vec<Uuid> = batch.add.iter().copied().collect();
    let known_students: BTreeSet<Uuid> = repo
        .get_users(&candidates)
        .await?
        .into_iter()
        .filter(|user| user.role == Role::Student)
        .map(|user| user.id)
        .collect();

    let next = match plan_enrollment(&roster, batch, &known_students) {
        Ok(next) => next,
        Err(rejection) => {
            tracing::info!(
                course = %course_id,
                invalid = rejection.invalid_ids().len(),
                "enrollment batch rejected"
            );
            return Ok(EnrollmentOutcome::Rejected(rejection));
        }
    };

    if next == roster {
        tracing::debug!(course = %course_id, "enrollment batch left roster unchanged");
        return Ok(EnrollmentOutcome::Applied {
            roster_size: next.len(),
        });
    }

    let students: Vec<Uuid> = next.into_iter().collect();
    let updated = repo
        .replace_roster(course_id, &students)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {course_id}")))?;

    tracing::info!(
        course = %course_id,
        added = batch.add.len(),
        removed = batch.remove.len(),
        roster_size = updated.students.len(),
        "enrollment batch applied"
    );

    Ok(EnrollmentOutcome::Applied {
        roster_size: updated.students.len(),
    })
}
