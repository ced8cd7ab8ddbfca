use crate::error::CorrectorError;
use crate::models::{Commendation, LessonSlot, Student, Subject};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection};
use serde::Serialize;

pub const PRAISE_PHRASES: [&str; 5] = ["Молодец!", "Отлично!", "Хорошо!", "Прекрасно!", "Великолепно!"];

const LOW_POINTS: [i64; 2] = [2, 3];
const FIXED_POINTS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Each step commits on its own; a later failure keeps earlier changes.
    Independent,
    /// All steps share one transaction.
    Atomic,
    /// All steps run in a transaction that is always rolled back.
    DryRun,
}

#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub name_pattern: &'a str,
    pub subject_title: &'a str,
    pub mode: RunMode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub student: Student,
    pub grades_fixed: usize,
    pub remarks_removed: usize,
    pub commendation: Commendation,
    pub committed: bool,
}

/// Finds the single student whose full name contains `pattern`.
pub fn resolve_student(conn: &Connection, pattern: &str) -> Result<Student, CorrectorError> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, year_of_study, group_letter
         FROM datacenter_schoolkid
         WHERE instr(full_name, ?) > 0
         ORDER BY id",
    )?;
    let mut found = stmt
        .query_map([pattern], Student::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    match found.len() {
        0 => Err(CorrectorError::StudentNotFound {
            pattern: pattern.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(CorrectorError::AmbiguousStudent {
            pattern: pattern.to_string(),
            count,
        }),
    }
}

/// Rewrites the student's 2s and 3s to 5. Returns the number of marks changed.
pub fn normalize_grades(conn: &Connection, student: &Student) -> Result<usize, CorrectorError> {
    let changed = conn.execute(
        "UPDATE datacenter_mark SET points = ?
         WHERE schoolkid_id = ? AND points IN (?, ?)",
        params![FIXED_POINTS, student.id, LOW_POINTS[0], LOW_POINTS[1]],
    )?;
    tracing::info!(student_id = student.id, changed, "grades normalized");
    Ok(changed)
}

pub fn clear_remarks(conn: &Connection, student: &Student) -> Result<usize, CorrectorError> {
    let removed = conn.execute(
        "DELETE FROM datacenter_chastisement WHERE schoolkid_id = ?",
        [student.id],
    )?;
    tracing::info!(student_id = student.id, removed, "remarks cleared");
    Ok(removed)
}

fn find_subject(conn: &Connection, title: &str, year_of_study: i64) -> Result<Subject, CorrectorError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, year_of_study
         FROM datacenter_subject
         WHERE title = ? AND year_of_study = ?
         ORDER BY id
         LIMIT 2",
    )?;
    let mut found = stmt
        .query_map(params![title, year_of_study], |row| {
            Ok(Subject {
                id: row.get(0)?,
                title: row.get(1)?,
                year_of_study: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    match found.len() {
        0 => Err(CorrectorError::SubjectNotFound {
            title: title.to_string(),
            year_of_study,
        }),
        1 => Ok(found.remove(0)),
        _ => Err(CorrectorError::AmbiguousSubject {
            title: title.to_string(),
            year_of_study,
        }),
    }
}

fn class_lessons(
    conn: &Connection,
    student: &Student,
    subject: &Subject,
) -> Result<Vec<LessonSlot>, CorrectorError> {
    let mut stmt = conn.prepare(
        "SELECT id, date, teacher_id
         FROM datacenter_lesson
         WHERE year_of_study = ? AND group_letter = ? AND subject_id = ?
         ORDER BY id",
    )?;
    let lessons = stmt
        .query_map(
            params![student.year_of_study, student.group_letter, subject.id],
            |row| {
                Ok(LessonSlot {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    teacher_id: row.get(2)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(subject_id = subject.id, count = lessons.len(), "lessons loaded");
    Ok(lessons)
}

fn parse_lesson_date(raw: &str) -> Result<NaiveDate, CorrectorError> {
    let trimmed = raw.trim();
    // DateTime columns carry a time part after the date.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| CorrectorError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Adds one commendation for `subject_title`, dated and signed like a random
/// lesson of the student's class in that subject.
pub fn add_commendation<R: Rng + ?Sized>(
    conn: &Connection,
    student: &Student,
    subject_title: &str,
    rng: &mut R,
) -> Result<Commendation, CorrectorError> {
    let subject = find_subject(conn, subject_title, student.year_of_study)?;
    let lessons = class_lessons(conn, student, &subject)?;
    let lesson = lessons.choose(rng).ok_or_else(|| CorrectorError::NoLessons {
        subject: subject.title.clone(),
        year_of_study: student.year_of_study,
        group_letter: student.group_letter.clone(),
    })?;
    let text = PRAISE_PHRASES[rng.gen_range(0..PRAISE_PHRASES.len())];
    let created = parse_lesson_date(&lesson.date)?;

    conn.execute(
        "INSERT INTO datacenter_commendation(text, created, schoolkid_id, subject_id, teacher_id)
         VALUES(?, ?, ?, ?, ?)",
        params![
            text,
            created.format("%Y-%m-%d").to_string(),
            student.id,
            subject.id,
            lesson.teacher_id
        ],
    )?;
    let commendation = Commendation {
        id: conn.last_insert_rowid(),
        text: text.to_string(),
        created,
        student_id: student.id,
        subject_id: subject.id,
        teacher_id: lesson.teacher_id,
        lesson_id: lesson.id,
    };
    tracing::info!(
        student_id = student.id,
        subject_id = subject.id,
        lesson_id = lesson.id,
        "commendation added"
    );
    Ok(commendation)
}

fn apply<R: Rng + ?Sized>(
    conn: &Connection,
    req: &RunRequest<'_>,
    rng: &mut R,
) -> Result<RunReport, CorrectorError> {
    let student = resolve_student(conn, req.name_pattern)?;
    tracing::info!(student_id = student.id, full_name = %student.full_name, "student resolved");
    let grades_fixed = normalize_grades(conn, &student)?;
    let remarks_removed = clear_remarks(conn, &student)?;
    let commendation = add_commendation(conn, &student, req.subject_title, rng)?;
    Ok(RunReport {
        student,
        grades_fixed,
        remarks_removed,
        commendation,
        committed: true,
    })
}

/// Resolves the student, then normalizes grades, clears remarks and adds a
/// commendation, in that order.
pub fn run<R: Rng + ?Sized>(
    conn: &Connection,
    req: &RunRequest<'_>,
    rng: &mut R,
) -> Result<RunReport, CorrectorError> {
    match req.mode {
        RunMode::Independent => apply(conn, req, rng),
        RunMode::Atomic | RunMode::DryRun => {
            // Dropping the transaction on the error path rolls it back.
            let tx = conn.unchecked_transaction()?;
            let mut report = apply(&tx, req, rng)?;
            if req.mode == RunMode::DryRun {
                tx.rollback()?;
                report.committed = false;
                tracing::info!("dry run, changes rolled back");
            } else {
                tx.commit()?;
            }
            Ok(report)
        }
    }
}
