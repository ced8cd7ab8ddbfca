#[derive(Debug, thiserror::Error)]
pub enum CorrectorError {
    #[error("Ученик с именем '{pattern}' не найден.")]
    StudentNotFound { pattern: String },

    #[error("Учеников с именем '{pattern}' несколько ({count}), уточните запрос.")]
    AmbiguousStudent { pattern: String, count: usize },

    #[error("Предмет '{title}' для {year_of_study} класса не найден.")]
    SubjectNotFound { title: String, year_of_study: i64 },

    #[error("Предметов '{title}' для {year_of_study} класса несколько.")]
    AmbiguousSubject { title: String, year_of_study: i64 },

    #[error("Уроки по предмету '{subject}' для {year_of_study}{group_letter} не найдены.")]
    NoLessons {
        subject: String,
        year_of_study: i64,
        group_letter: String,
    },

    #[error("Некорректная дата урока: '{value}'")]
    InvalidDate { value: String },

    #[error("Ошибка базы данных")]
    Db(#[from] rusqlite::Error),
}

impl CorrectorError {
    /// Stable machine-readable code, used in the JSON report.
    pub fn code(&self) -> &'static str {
        match self {
            CorrectorError::StudentNotFound { .. }
            | CorrectorError::SubjectNotFound { .. }
            | CorrectorError::NoLessons { .. } => "not_found",
            CorrectorError::AmbiguousStudent { .. } | CorrectorError::AmbiguousSubject { .. } => {
                "ambiguous"
            }
            CorrectorError::InvalidDate { .. } => "bad_data",
            CorrectorError::Db(_) => "db_failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid config value for '{field}': {message}")]
    Invalid { field: String, message: String },
}
