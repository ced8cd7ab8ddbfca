use anyhow::{anyhow, Context};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

pub const STUDENTS: &str = "datacenter_schoolkid";
pub const SUBJECTS: &str = "datacenter_subject";
pub const LESSONS: &str = "datacenter_lesson";
pub const MARKS: &str = "datacenter_mark";
pub const CHASTISEMENTS: &str = "datacenter_chastisement";
pub const COMMENDATIONS: &str = "datacenter_commendation";

/// Tables and columns the corrector reads or writes. Anything else in the
/// e-diary database is left alone.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (STUDENTS, &["id", "full_name", "year_of_study", "group_letter"]),
    (SUBJECTS, &["id", "title", "year_of_study"]),
    (
        LESSONS,
        &["id", "year_of_study", "group_letter", "subject_id", "teacher_id", "date"],
    ),
    (MARKS, &["id", "points", "schoolkid_id"]),
    (CHASTISEMENTS, &["id", "schoolkid_id"]),
    (
        COMMENDATIONS,
        &["id", "text", "created", "schoolkid_id", "subject_id", "teacher_id"],
    ),
];

/// Opens an existing records database. The file is never created here: the
/// schema belongs to the application that owns the data.
pub fn open_db(path: &Path) -> anyhow::Result<Connection> {
    if !path.is_file() {
        return Err(anyhow!("database not found: {}", path.to_string_lossy()));
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .with_context(|| format!("failed to open database {}", path.to_string_lossy()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    verify_schema(&conn)?;
    tracing::debug!(path = %path.to_string_lossy(), "database opened");
    Ok(conn)
}

pub fn verify_schema(conn: &Connection) -> anyhow::Result<()> {
    for (table, columns) in REQUIRED_COLUMNS {
        let present = table_columns(conn, table)?;
        if present.is_empty() {
            return Err(anyhow!("table {} is missing", table));
        }
        if let Some(missing) = columns.iter().find(|c| !present.iter().any(|p| p.as_str() == **c)) {
            return Err(anyhow!("table {} has no column {}", table, missing));
        }
    }
    Ok(())
}

/// Creates the subset of the e-diary schema this tool touches. Used to build
/// scratch databases; production databases already carry the full schema.
pub fn create_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS datacenter_schoolkid(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            birthday TEXT,
            entry_year INTEGER,
            year_of_study INTEGER NOT NULL,
            group_letter TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS datacenter_teacher(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            birthday TEXT
        );
        CREATE TABLE IF NOT EXISTS datacenter_subject(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            year_of_study INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS datacenter_lesson(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year_of_study INTEGER NOT NULL,
            group_letter TEXT NOT NULL,
            subject_id INTEGER NOT NULL,
            teacher_id INTEGER NOT NULL,
            room TEXT,
            date TEXT NOT NULL,
            timeslot INTEGER,
            FOREIGN KEY(subject_id) REFERENCES datacenter_subject(id),
            FOREIGN KEY(teacher_id) REFERENCES datacenter_teacher(id)
        );
        CREATE INDEX IF NOT EXISTS idx_lesson_class
            ON datacenter_lesson(year_of_study, group_letter, subject_id);
        CREATE TABLE IF NOT EXISTS datacenter_mark(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            points INTEGER NOT NULL,
            teacher_note TEXT,
            created TEXT,
            schoolkid_id INTEGER NOT NULL,
            subject_id INTEGER,
            teacher_id INTEGER,
            FOREIGN KEY(schoolkid_id) REFERENCES datacenter_schoolkid(id)
        );
        CREATE INDEX IF NOT EXISTS idx_mark_schoolkid ON datacenter_mark(schoolkid_id);
        CREATE TABLE IF NOT EXISTS datacenter_chastisement(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            created TEXT,
            schoolkid_id INTEGER NOT NULL,
            subject_id INTEGER,
            teacher_id INTEGER,
            FOREIGN KEY(schoolkid_id) REFERENCES datacenter_schoolkid(id)
        );
        CREATE INDEX IF NOT EXISTS idx_chastisement_schoolkid
            ON datacenter_chastisement(schoolkid_id);
        CREATE TABLE IF NOT EXISTS datacenter_commendation(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            created TEXT NOT NULL,
            schoolkid_id INTEGER NOT NULL,
            subject_id INTEGER,
            teacher_id INTEGER,
            FOREIGN KEY(schoolkid_id) REFERENCES datacenter_schoolkid(id),
            FOREIGN KEY(subject_id) REFERENCES datacenter_subject(id),
            FOREIGN KEY(teacher_id) REFERENCES datacenter_teacher(id)
        );",
    )?;
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> anyhow::Result<Vec<String>> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get::<_, String>(1)?);
    }
    Ok(out)
}
