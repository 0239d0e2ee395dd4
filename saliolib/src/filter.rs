//! Фильтр по региону и диапазону суммы строки поверх уже чистых записей.

use crate::model::SalesRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub region: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub input: usize,
    pub removed_by_region: usize,
    pub removed_by_amount: usize,
    pub kept: usize,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    /// Сначала регион, затем диапазон суммы; сводка считает снятое на
    /// каждом шаге отдельно.
    pub fn apply(&self, records: Vec<SalesRecord>) -> (Vec<SalesRecord>, FilterSummary) {
        let mut summary = FilterSummary {
            input: records.len(),
            ..FilterSummary::default()
        };

        let mut kept: Vec<SalesRecord> = match &self.region {
            Some(region) => {
                let before = records.len();
                let kept: Vec<SalesRecord> = records
                    .into_iter()
                    .filter(|r| r.region.as_deref() == Some(region.as_str()))
                    .collect();
                summary.removed_by_region = before - kept.len();
                kept
            }
            None => records,
        };

        if self.min_amount.is_some() || self.max_amount.is_some() {
            let before = kept.len();
            kept.retain(|r| {
                let amount = r.line_revenue();
                self.min_amount.is_none_or(|min| amount >= min)
                    && self.max_amount.is_none_or(|max| amount <= max)
            });
            summary.removed_by_amount = before - kept.len();
        }

        summary.kept = kept.len();
        (kept, summary)
    }
}
