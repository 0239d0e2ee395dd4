//! Доменные модели — единый «нормализованный» слой между сырыми строками,
//! очисткой и агрегацией.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Канонические имена колонок исходной выгрузки.
pub mod col {
    pub const TRANSACTION_ID: &str = "TransactionID";
    pub const DATE: &str = "Date";
    pub const PRODUCT_ID: &str = "ProductID";
    pub const PRODUCT_NAME: &str = "ProductName";
    pub const QUANTITY: &str = "Quantity";
    pub const UNIT_PRICE: &str = "UnitPrice";
    pub const DISCOUNT: &str = "Discount";
    pub const CUSTOMER_ID: &str = "CustomerID";
    pub const REGION: &str = "Region";
    pub const CATEGORY: &str = "Category";
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Сырая строка как её отдаёт ридер: имя колонки -> скаляр, без схемы.
/// Пустые значения и пробелы считаются отсутствием поля.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow(BTreeMap<String, String>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    /// None и для отсутствующей колонки, и для пустого/пробельного значения.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub type RawBatch = Vec<RawRow>;

/// Одна валидированная транзакция. После валидации не мутируется:
/// обогащение порождает замещающую копию.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesRecord {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub product_id: String,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub customer_id: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
}

impl SalesRecord {
    /// unit_price * quantity * (1 - discount); при пройденной валидации >= 0.
    pub fn line_revenue(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity) * (Decimal::ONE - self.discount)
    }
}

/// Причина отбраковки строки. Восстановимая: строка попадает в отчёт
/// очистки и исключается, батч продолжается.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("cannot coerce `{field}` from `{value}`")]
    TypeCoercion { field: String, value: String },

    #[error("`{field}` out of range: `{value}`")]
    RangeViolation { field: String, value: String },
}

/// Нефатальные находки валидации; попадают в отчёт, строку не отклоняют.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    UnknownRegion,
    UnknownProduct,
    ImputedDiscount,
    SuspectId(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Номер строки в батче, с единицы.
    pub row: usize,
    pub reason: RejectReason,
}

/// Итог одного прогона очистки. После прогона только читается.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub total_rows: usize,
    pub accepted: usize,
    pub rejected: Vec<RejectedRow>,
    pub duplicates_removed: usize,
    pub imputed_discounts: usize,
    pub unknown_regions: usize,
    pub unknown_products: usize,
    pub suspect_ids: usize,
}

impl CleaningReport {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub(crate) fn tally_flag(&mut self, flag: Flag) {
        match flag {
            Flag::UnknownRegion => self.unknown_regions += 1,
            Flag::UnknownProduct => self.unknown_products += 1,
            Flag::ImputedDiscount => self.imputed_discounts += 1,
            Flag::SuspectId(_) => self.suspect_ids += 1,
        }
    }

    /// Счётчики отбраковки по причинам.
    pub fn rejects_by_reason(&self) -> BTreeMap<String, usize> {
        let mut by_reason = BTreeMap::new();
        for r in &self.rejected {
            *by_reason.entry(r.reason.to_string()).or_insert(0) += 1;
        }
        by_reason
    }
}

/// Кортеж значений измерений группировки; Ord даёт детерминированный
/// (лексикографический) порядок выдачи.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey(pub Vec<String>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRank {
    pub product_id: String,
    pub revenue: Decimal,
    pub quantity: u64,
}

/// Значение метрики. Undefined — явный null (деление на ноль, нет прошлого
/// периода), никогда не паника и не молчаливый ноль.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Number(Decimal),
    Products(Vec<ProductRank>),
    Undefined,
}

impl KpiValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            KpiValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_products(&self) -> Option<&[ProductRank]> {
        match self {
            KpiValue::Products(p) => Some(p),
            _ => None,
        }
    }
}

/// Одна именованная метрика на одной группе плюс число записей в группе.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiResult {
    pub key: GroupKey,
    pub value: KpiValue,
    pub count: u64,
}
