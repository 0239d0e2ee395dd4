//! JSON-выгрузка: записи, отчёт очистки, сводка обогащения и KPI одним
//! документом для внешнего материализатора.

use crate::{
    aggregate::Aggregation,
    enrich::EnrichmentSummary,
    error::Result,
    model::{CleaningReport, SalesRecord},
};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Document<'a> {
    records: &'a [SalesRecord],
    cleaning: &'a CleaningReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    enrichment: Option<&'a EnrichmentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kpis: Option<&'a Aggregation>,
}

pub struct Json;

impl Json {
    pub fn write_document<W: Write>(
        w: W,
        records: &[SalesRecord],
        cleaning: &CleaningReport,
        enrichment: Option<&EnrichmentSummary>,
        kpis: Option<&Aggregation>,
    ) -> Result<()> {
        serde_json::to_writer_pretty(
            w,
            &Document {
                records,
                cleaning,
                enrichment,
                kpis,
            },
        )?;
        Ok(())
    }
}
