use chrono::NaiveDate;
use rusqlite::Row;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub year_of_study: i64,
    pub group_letter: String,
}

impl Student {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Student {
            id: row.get(0)?,
            full_name: row.get(1)?,
            year_of_study: row.get(2)?,
            group_letter: row.get(3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub title: String,
    pub year_of_study: i64,
}

/// The slice of a lesson a commendation borrows from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSlot {
    pub id: i64,
    pub date: String,
    pub teacher_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commendation {
    pub id: i64,
    pub text: String,
    pub created: NaiveDate,
    pub student_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub lesson_id: i64,
}
