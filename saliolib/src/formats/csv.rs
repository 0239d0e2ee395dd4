//! Простой CSV: заголовки:
//! TransactionID,Date,ProductID,ProductName,Quantity,UnitPrice,Discount,CustomerID,Region
//!
//! Ридер не навязывает схему: колонки сверх канонических сохраняются в
//! сырой строке как есть, недостающие всплывут на валидации. Общие
//! помощники параметризованы разделителем и переиспользуются pipe-форматом.

use crate::{
    error::{Result, SalioError},
    model::{DATE_FORMAT, KpiValue, RawBatch, RawRow, SalesRecord},
    aggregate::Aggregation,
};
use csv::{ReaderBuilder, WriterBuilder};
use std::io::{BufRead, Write};

#[derive(serde::Serialize)]
struct OutRow<'a> {
    #[serde(rename = "TransactionID")]
    transaction_id: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "ProductID")]
    product_id: &'a str,
    #[serde(rename = "ProductName")]
    product_name: Option<&'a str>,
    #[serde(rename = "Quantity")]
    quantity: u32,
    #[serde(rename = "UnitPrice")]
    unit_price: String,
    #[serde(rename = "Discount")]
    discount: String,
    #[serde(rename = "CustomerID")]
    customer_id: Option<&'a str>,
    #[serde(rename = "Region")]
    region: Option<&'a str>,
    #[serde(rename = "Category")]
    category: Option<&'a str>,
}

pub struct Csv;

impl crate::traits::ReadRows for Csv {
    fn read<R: BufRead>(r: R) -> Result<RawBatch> {
        read_rows(r, b',')
    }
}

impl crate::traits::WriteRecords for Csv {
    fn write<W: Write>(w: W, records: &[SalesRecord]) -> Result<()> {
        write_records(w, records, b',')
    }
}

pub(crate) fn read_rows<R: BufRead>(r: R, delimiter: u8) -> Result<RawBatch> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(r);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SalioError::Structural("no header row".into()));
    }

    let mut batch = RawBatch::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut row = RawRow::new();
        // короткая строка даст меньше пар — недостающее поймает валидатор
        for (name, value) in headers.iter().zip(rec.iter()) {
            row.set(name.trim(), value);
        }
        batch.push(row);
    }
    Ok(batch)
}

pub(crate) fn write_records<W: Write>(
    mut w: W,
    records: &[SalesRecord],
    delimiter: u8,
) -> Result<()> {
    let mut wrt = WriterBuilder::new().delimiter(delimiter).from_writer(&mut w);

    for rec in records {
        let out = OutRow {
            transaction_id: &rec.transaction_id,
            date: rec.date.format(DATE_FORMAT).to_string(),
            product_id: &rec.product_id,
            product_name: rec.product_name.as_deref(),
            quantity: rec.quantity,
            unit_price: rec.unit_price.to_string(),
            discount: rec.discount.to_string(),
            customer_id: rec.customer_id.as_deref(),
            region: rec.region.as_deref(),
            category: rec.category.as_deref(),
        };
        wrt.serialize(out)?;
    }
    wrt.flush()?;
    Ok(())
}

/// Плоская таблица KPI: metric,key,product,value,count. Ключ группы
/// склеивается через `|`; для top_products — строка на товар, value —
/// его выручка, count — штук.
pub fn write_kpis<W: Write>(mut w: W, agg: &Aggregation) -> Result<()> {
    let mut wrt = WriterBuilder::new().from_writer(&mut w);
    wrt.write_record(["metric", "key", "product", "value", "count"])?;

    for (metric, results) in &agg.kpis {
        for result in results {
            let key = result.key.0.join("|");
            let count = result.count.to_string();
            match &result.value {
                KpiValue::Number(v) => {
                    let value = v.to_string();
                    wrt.write_record([metric.name(), key.as_str(), "", value.as_str(), count.as_str()])?;
                }
                KpiValue::Undefined => {
                    wrt.write_record([metric.name(), key.as_str(), "", "", count.as_str()])?;
                }
                KpiValue::Products(ranked) => {
                    for p in ranked {
                        let revenue = p.revenue.to_string();
                        let quantity = p.quantity.to_string();
                        wrt.write_record([
                            metric.name(),
                            key.as_str(),
                            p.product_id.as_str(),
                            revenue.as_str(),
                            quantity.as_str(),
                        ])?;
                    }
                }
            }
        }
    }
    wrt.flush()?;
    Ok(())
}
