//! Единый тип ошибок публичного API.
//!
//! Здесь только фатальное: I/O, слой CSV/JSON, структурно нечитаемая
//! выгрузка. Отбраковка отдельной строки — не ошибка, а часть доменной
//! модели (`model::RejectReason`): плохие строки пишутся в отчёт очистки,
//! батч продолжается.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SalioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Structural error: {0}")]
    Structural(String),
}

pub type Result<T> = std::result::Result<T, SalioError>;
