//! Обогащение записей справочником товаров. Каталог приходит готовым
//! (JSON-файл читает вызывающая сторона) — сетевых походов внутри ядра
//! нет. Записи не мутируются: возвращаются замещающие копии.

use crate::{
    error::Result,
    model::SalesRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: BTreeMap<String, ProductInfo>,
}

impl ProductCatalog {
    pub fn from_json<R: BufRead>(r: R) -> Result<Self> {
        Ok(serde_json::from_reader(r)?)
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductInfo> {
        self.products.get(product_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Различные идентификаторы, не найденные в каталоге, по возрастанию.
    pub unmatched_ids: Vec<String>,
}

impl EnrichmentSummary {
    pub fn match_rate_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 * 100.0 / self.total as f64
    }
}

/// Проставляет категорию и недостающее имя товара из каталога.
pub fn enrich(
    records: &[SalesRecord],
    catalog: &ProductCatalog,
) -> (Vec<SalesRecord>, EnrichmentSummary) {
    let mut enriched = Vec::with_capacity(records.len());
    let mut summary = EnrichmentSummary {
        total: records.len(),
        ..EnrichmentSummary::default()
    };
    let mut unmatched: BTreeSet<String> = BTreeSet::new();

    for rec in records {
        let mut rec = rec.clone();
        match catalog.get(&rec.product_id) {
            Some(info) => {
                summary.matched += 1;
                if rec.product_name.is_none() {
                    rec.product_name = Some(info.name.clone());
                }
                rec.category = info.category.clone();
            }
            None => {
                summary.unmatched += 1;
                unmatched.insert(rec.product_id.clone());
            }
        }
        enriched.push(rec);
    }

    summary.unmatched_ids = unmatched.into_iter().collect();
    info!(
        total = summary.total,
        matched = summary.matched,
        unmatched = summary.unmatched,
        "catalog enrichment done"
    );
    (enriched, summary)
}
