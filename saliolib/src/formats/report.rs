//! Текстовый отчёт: сводка, разрез по регионам, топы товаров и клиентов,
//! дневной тренд, пиковый день, слабые товары, итоги очистки и обогащения.

use crate::{
    aggregate::{aggregate, AggregateRequest, Dimension, Metric},
    enrich::EnrichmentSummary,
    error::Result,
    model::{CleaningReport, KpiValue, ProductRank, SalesRecord},
};
use chrono::Local;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// Товар считается слабым, если продано меньше этого числа штук.
pub const LOW_QUANTITY_THRESHOLD: u64 = 10;

const WIDTH: usize = 80;

pub struct TextReport;

impl TextReport {
    pub fn write<W: Write>(
        mut w: W,
        records: &[SalesRecord],
        cleaning: &CleaningReport,
        enrichment: Option<&EnrichmentSummary>,
    ) -> Result<()> {
        use std::fmt::Write as FmtWrite;

        let line = "=".repeat(WIDTH);
        let thin = "-".repeat(WIDTH);
        let mut s = String::new();

        let _ = writeln!(s, "{line}");
        let _ = writeln!(s, "{:^WIDTH$}", "SALES ANALYTICS REPORT");
        let _ = writeln!(s, "{line}");
        let _ = writeln!(s, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(s, "Records: {}", records.len());
        let _ = writeln!(s);

        // ---- общая сводка --------------------------------------------------
        let totals = aggregate(
            records,
            &AggregateRequest::new(Vec::new(), vec![Metric::Revenue, Metric::Aov]),
        );
        let total_revenue = single_number(&totals, Metric::Revenue).unwrap_or(Decimal::ZERO);
        let aov = single_number(&totals, Metric::Aov);

        let _ = writeln!(s, "OVERALL SUMMARY");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(s, "Total Revenue:       {}", money(total_revenue));
        let _ = writeln!(s, "Total Transactions:  {}", records.len());
        let _ = writeln!(
            s,
            "Average Order Value: {}",
            aov.map(money).unwrap_or_else(|| "n/a".into())
        );
        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        match (dates.iter().min(), dates.iter().max()) {
            (Some(first), Some(last)) => {
                let _ = writeln!(s, "Date Range:          {first} .. {last}");
            }
            _ => {
                let _ = writeln!(s, "Date Range:          n/a");
            }
        }
        let _ = writeln!(s);

        // ---- регионы -------------------------------------------------------
        let by_region = aggregate(
            records,
            &AggregateRequest::new(vec![Dimension::Region], vec![Metric::Revenue]),
        );
        let _ = writeln!(s, "REGION-WISE PERFORMANCE");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(
            s,
            "{:<20} {:>18} {:>10} {:>14}",
            "Region", "Sales", "Share", "Transactions"
        );
        if let Some(results) = by_region.kpis.get(&Metric::Revenue) {
            let mut rows: Vec<_> = results
                .iter()
                .filter_map(|r| r.value.as_number().map(|v| (r, v)))
                .collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.key.cmp(&b.0.key)));
            for (result, revenue) in rows {
                let share = if total_revenue.is_zero() {
                    "n/a".to_string()
                } else {
                    format!("{}%", (revenue / total_revenue * Decimal::from(100)).round_dp(2))
                };
                let _ = writeln!(
                    s,
                    "{:<20} {:>18} {:>10} {:>14}",
                    display_key(&result.key.0[0]),
                    money(revenue),
                    share,
                    result.count
                );
            }
        }
        let _ = writeln!(s);

        // ---- топ товаров ---------------------------------------------------
        let full_ranking = product_ranking(records);
        let names = product_names(records);

        let _ = writeln!(s, "TOP PRODUCTS");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(
            s,
            "{:<6} {:<30} {:>12} {:>18}",
            "Rank", "Product", "Quantity", "Revenue"
        );
        for (i, p) in full_ranking.iter().take(5).enumerate() {
            let _ = writeln!(
                s,
                "{:<6} {:<30} {:>12} {:>18}",
                i + 1,
                product_label(p, &names),
                p.quantity,
                money(p.revenue)
            );
        }
        let _ = writeln!(s);

        // ---- топ клиентов --------------------------------------------------
        let clv = aggregate(
            records,
            &AggregateRequest::new(Vec::new(), vec![Metric::Clv]),
        );
        let _ = writeln!(s, "TOP CUSTOMERS");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(
            s,
            "{:<6} {:<20} {:>18} {:>10}",
            "Rank", "Customer", "Total Spent", "Orders"
        );
        if let Some(results) = clv.kpis.get(&Metric::Clv) {
            let mut rows: Vec<_> = results
                .iter()
                .filter_map(|r| r.value.as_number().map(|v| (r, v)))
                .collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.key.cmp(&b.0.key)));
            for (i, (result, spent)) in rows.iter().take(5).enumerate() {
                let _ = writeln!(
                    s,
                    "{:<6} {:<20} {:>18} {:>10}",
                    i + 1,
                    result.key.0[0],
                    money(*spent),
                    result.count
                );
            }
        }
        let _ = writeln!(s);

        // ---- дневной тренд -------------------------------------------------
        let daily = aggregate(
            records,
            &AggregateRequest::new(vec![Dimension::Day], vec![Metric::Revenue]),
        );
        // уникальные клиенты считаются здесь: это деталь отчёта, не метрика
        let mut customers_by_day: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for rec in records {
            if let Some(customer) = &rec.customer_id {
                customers_by_day
                    .entry(rec.date.format("%Y-%m-%d").to_string())
                    .or_default()
                    .insert(customer);
            }
        }

        let _ = writeln!(s, "DAILY SALES TREND");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(
            s,
            "{:<12} {:>18} {:>14} {:>18}",
            "Date", "Revenue", "Transactions", "Unique Customers"
        );
        let daily_revenue = daily.kpis.get(&Metric::Revenue);
        if let Some(results) = daily_revenue {
            for result in results {
                let day = &result.key.0[0];
                let revenue = result.value.as_number().unwrap_or(Decimal::ZERO);
                let uniques = customers_by_day.get(day).map(BTreeSet::len).unwrap_or(0);
                let _ = writeln!(
                    s,
                    "{:<12} {:>18} {:>14} {:>18}",
                    day,
                    money(revenue),
                    result.count,
                    uniques
                );
            }
        }
        let _ = writeln!(s);

        // ---- пиковый день --------------------------------------------------
        let peak = daily_revenue.and_then(|results| {
            results
                .iter()
                .filter_map(|r| r.value.as_number().map(|v| (r, v)))
                .max_by(|a, b| a.1.cmp(&b.1))
        });
        let _ = writeln!(s, "PEAK SALES DAY");
        let _ = writeln!(s, "{thin}");
        match peak {
            Some((result, revenue)) => {
                let _ = writeln!(
                    s,
                    "{}: {} across {} transactions",
                    result.key.0[0],
                    money(revenue),
                    result.count
                );
            }
            None => {
                let _ = writeln!(s, "n/a");
            }
        }
        let _ = writeln!(s);

        // ---- слабые товары -------------------------------------------------
        let mut low: Vec<&ProductRank> = full_ranking
            .iter()
            .filter(|p| p.quantity < LOW_QUANTITY_THRESHOLD)
            .collect();
        low.sort_by(|a, b| {
            a.quantity
                .cmp(&b.quantity)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        let _ = writeln!(s, "LOW PERFORMING PRODUCTS (quantity < {LOW_QUANTITY_THRESHOLD})");
        let _ = writeln!(s, "{thin}");
        if low.is_empty() {
            let _ = writeln!(s, "none");
        } else {
            for p in low {
                let _ = writeln!(
                    s,
                    "{:<30} {:>12} {:>18}",
                    product_label(p, &names),
                    p.quantity,
                    money(p.revenue)
                );
            }
        }
        let _ = writeln!(s);

        // ---- очистка -------------------------------------------------------
        let _ = writeln!(s, "CLEANING SUMMARY");
        let _ = writeln!(s, "{thin}");
        let _ = writeln!(s, "Rows in batch:      {}", cleaning.total_rows);
        let _ = writeln!(s, "Accepted:           {}", cleaning.accepted);
        let _ = writeln!(s, "Rejected:           {}", cleaning.rejected.len());
        let _ = writeln!(s, "Duplicates removed: {}", cleaning.duplicates_removed);
        let _ = writeln!(s, "Imputed discounts:  {}", cleaning.imputed_discounts);
        let _ = writeln!(s, "Unknown regions:    {}", cleaning.unknown_regions);
        let _ = writeln!(s, "Unknown products:   {}", cleaning.unknown_products);
        let _ = writeln!(s, "Suspect ids:        {}", cleaning.suspect_ids);
        for (reason, n) in cleaning.rejects_by_reason() {
            let _ = writeln!(s, "  {n} x {reason}");
        }
        let _ = writeln!(s);

        // ---- обогащение ----------------------------------------------------
        if let Some(summary) = enrichment {
            let _ = writeln!(s, "ENRICHMENT SUMMARY");
            let _ = writeln!(s, "{thin}");
            let _ = writeln!(
                s,
                "Matched: {}/{} ({:.1}%)",
                summary.matched,
                summary.total,
                summary.match_rate_percent()
            );
            if !summary.unmatched_ids.is_empty() {
                let _ = writeln!(s, "Not in catalog: {}", summary.unmatched_ids.join(", "));
            }
            let _ = writeln!(s);
        }

        let _ = writeln!(s, "{line}");
        w.write_all(s.as_bytes())?;
        Ok(())
    }
}

fn single_number(agg: &crate::aggregate::Aggregation, metric: Metric) -> Option<Decimal> {
    agg.kpis
        .get(&metric)
        .and_then(|results| results.first())
        .and_then(|r| r.value.as_number())
}

/// Полный рейтинг товаров по выручке (top_products без усечения).
fn product_ranking(records: &[SalesRecord]) -> Vec<ProductRank> {
    let req = AggregateRequest {
        group_by: Vec::new(),
        metrics: vec![Metric::TopProducts],
        top_n: usize::MAX,
    };
    let agg = aggregate(records, &req);
    agg.kpis
        .get(&Metric::TopProducts)
        .and_then(|results| results.first())
        .and_then(|r| match &r.value {
            KpiValue::Products(ranked) => Some(ranked.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn product_names(records: &[SalesRecord]) -> BTreeMap<&str, &str> {
    let mut names = BTreeMap::new();
    for rec in records {
        if let Some(name) = &rec.product_name {
            names.entry(rec.product_id.as_str()).or_insert(name.as_str());
        }
    }
    names
}

fn product_label(p: &ProductRank, names: &BTreeMap<&str, &str>) -> String {
    match names.get(p.product_id.as_str()) {
        Some(name) => format!("{} ({})", p.product_id, name),
        None => p.product_id.clone(),
    }
}

fn display_key(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

/// $1,234,567.89 — целая часть с разделителями, всегда два знака после точки.
fn money(amount: Decimal) -> String {
    let text = amount.round_dp(2).to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text, String::new()),
    };
    let negative = int_part.starts_with('-');
    let digits = int_part.trim_start_matches('-');
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!(
        "{}${}.{:0<2}",
        if negative { "-" } else { "" },
        grouped,
        frac_part
    )
}
