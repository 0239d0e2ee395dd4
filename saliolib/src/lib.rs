//! saliolib — библиотека очистки и агрегации данных о продажах
//! (CSV/PSV -> валидация -> дедупликация -> KPI, JSON, текстовый отчёт)

pub mod aggregate;
pub mod clean;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod model;
pub mod traits;
pub mod validate;

pub mod formats {
    pub mod csv;
    pub mod json;
    pub mod pipe;
    pub mod report;
}
