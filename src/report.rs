use crate::corrector::RunReport;
use crate::error::{ConfigError, CorrectorError};
use serde_json::json;

pub const SUCCESS_LINE: &str = "Операция выполнена успешно!";
pub const DRY_RUN_LINE: &str = "Пробный запуск: изменения не сохранены.";
pub const ERROR_PREFIX: &str = "Ошибка при выполнении программы:";

/// Human-readable lines printed after a successful run.
pub fn success_lines(report: &RunReport, name: &str, subject_title: &str) -> Vec<String> {
    let mut lines = vec![
        SUCCESS_LINE.to_string(),
        format!("Исправлены оценки для ученика с именем '{}'.", name),
        format!("Добавлена похвала по предмету '{}'.", subject_title),
    ];
    if !report.committed {
        lines.push(DRY_RUN_LINE.to_string());
    }
    lines
}

pub fn error_line(error: &anyhow::Error) -> String {
    format!("{} {:#}", ERROR_PREFIX, error)
}

pub fn ok(report: &RunReport) -> serde_json::Value {
    json!({
        "ok": true,
        "result": report,
    })
}

pub fn err(error: &anyhow::Error) -> serde_json::Value {
    json!({
        "ok": false,
        "error": {
            "code": error_code(error),
            "message": format!("{:#}", error),
        },
    })
}

fn error_code(error: &anyhow::Error) -> &'static str {
    if let Some(e) = error.downcast_ref::<CorrectorError>() {
        return e.code();
    }
    if error.downcast_ref::<ConfigError>().is_some() {
        return "bad_config";
    }
    "failed"
}
