use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{RosterExport, RosterRow},
    repository::Repository,
    storage::StorageService,
};

pub const CSV_HEADER: [&str; 3] = ["id", "name", "email"];
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Object key of the roster export for a course. One key per course: a new export
/// overwrites the previous one.
pub fn roster_key(course_id: Uuid) -> String {
    format!("rosters/{course_id}.csv")
}

/// build_roster
///
/// Reads the current roster of `course_id` and resolves every member to its display
/// fields. Rows are sorted by student id. A member whose identity no longer resolves is
/// kept with empty display fields.
pub async fn build_roster(repo: &dyn Repository, course_id: Uuid) -> Result<Vec<RosterRow>, AppError> {
    let course = repo
        .get_course(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {course_id}")))?;

    let mut members = course.students.clone();
    members.sort_unstable();
    members.dedup();

    let mut users: HashMap<Uuid, _> = repo
        .get_users(&members)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let rows = members
        .into_iter()
        .map(|id| match users.remove(&id) {
            Some(user) => RosterRow {
                id,
                name: user.name,
                email: user.email,
            },
            None => {
                tracing::warn!(course = %course_id, student = %id, "enrolled student has no profile");
                RosterRow {
                    id,
                    name: String::new(),
                    email: String::new(),
                }
            }
        })
        .collect();

    Ok(rows)
}

/// render_csv
///
/// Header row then one line per row, `\n` terminated. Fields containing a comma, quote,
/// CR or LF are quoted with inner quotes doubled.
pub fn render_csv(rows: &[RosterRow]) -> Vec<u8> {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().copied());
    for row in rows {
        let id = row.id.to_string();
        push_record(&mut out, [id.as_str(), row.name.as_str(), row.email.as_str()]);
    }
    out.into_bytes()
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}

fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

/// export_roster
///
/// Renders the current roster of `course_id` to CSV, writes it to storage under
/// `roster_key(course_id)` and returns where it can be fetched. With an unchanged roster
/// the written bytes are identical between calls.
pub async fn export_roster(
    repo: &dyn Repository,
    storage: &dyn StorageService,
    course_id: Uuid,
) -> Result<RosterExport, AppError> {
    let rows = build_roster(repo, course_id).await?;
    let key = roster_key(course_id);
    let bytes = render_csv(&rows);

    let url = storage
        .put_artifact(&key, bytes, CSV_CONTENT_TYPE)
        .await
        .map_err(AppError::Dependency)?;

    tracing::info!(course = %course_id, rows = rows.len(), %key, "roster exported");

    Ok(RosterExport {
        course_id,
        key,
        url,
        rows: rows.len(),
    })
}
