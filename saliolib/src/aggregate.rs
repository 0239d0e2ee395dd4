//! Агрегация KPI по произвольным измерениям. Чистая функция над
//! неизменяемым срезом записей; группировка через BTreeMap, поэтому
//! порядок ключей лексикографический и повторные прогоны дают
//! байт-в-байт одинаковый результат. Денежные суммы — Decimal, без
//! накопления плавающей ошибки.

use crate::model::{GroupKey, KpiResult, KpiValue, ProductRank, SalesRecord};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 10;

/// Измерение группировки. Временные варианты рендерятся в сортируемые
/// строки: `2024-01-05`, `2024-01`, `2024-Q1`, `2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Day,
    Month,
    Quarter,
    Year,
    Region,
    Product,
    Customer,
    Category,
}

impl Dimension {
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Day => "day",
            Dimension::Month => "month",
            Dimension::Quarter => "quarter",
            Dimension::Year => "year",
            Dimension::Region => "region",
            Dimension::Product => "product",
            Dimension::Customer => "customer",
            Dimension::Category => "category",
        }
    }

    pub fn is_time(self) -> bool {
        matches!(
            self,
            Dimension::Day | Dimension::Month | Dimension::Quarter | Dimension::Year
        )
    }

    /// Значение измерения для записи; отсутствующее опциональное поле
    /// группируется под пустой строкой.
    fn value(self, rec: &SalesRecord) -> String {
        match self {
            Dimension::Day => rec.date.format("%Y-%m-%d").to_string(),
            Dimension::Month => rec.date.format("%Y-%m").to_string(),
            Dimension::Quarter => format!("{:04}-Q{}", rec.date.year(), (rec.date.month0() / 3) + 1),
            Dimension::Year => format!("{:04}", rec.date.year()),
            Dimension::Region => rec.region.clone().unwrap_or_default(),
            Dimension::Product => rec.product_id.clone(),
            Dimension::Customer => rec.customer_id.clone().unwrap_or_default(),
            Dimension::Category => rec.category.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Revenue,
    Count,
    Aov,
    GrowthRate,
    Clv,
    TopProducts,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Count => "count",
            Metric::Aov => "aov",
            Metric::GrowthRate => "growth_rate",
            Metric::Clv => "clv",
            Metric::TopProducts => "top_products",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub group_by: Vec<Dimension>,
    pub metrics: Vec<Metric>,
    pub top_n: usize,
}

impl AggregateRequest {
    pub fn new(group_by: Vec<Dimension>, metrics: Vec<Metric>) -> Self {
        Self {
            group_by,
            metrics,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub group_by: Vec<Dimension>,
    pub kpis: BTreeMap<Metric, Vec<KpiResult>>,
}

#[derive(Debug, Default)]
struct Bucket {
    revenue: Decimal,
    count: u64,
    transactions: BTreeSet<String>,
    // товар -> (выручка, штук)
    products: BTreeMap<String, (Decimal, u64)>,
}

/// Считает запрошенные метрики по группам. Независимо от порядка входа:
/// свёртка сумм/счётчиков ассоциативна и коммутативна, ключи сортируются.
pub fn aggregate(records: &[SalesRecord], req: &AggregateRequest) -> Aggregation {
    let mut groups: BTreeMap<GroupKey, Bucket> = BTreeMap::new();
    if req.group_by.is_empty() {
        // итоговая группа существует и на пустом входе: метрики по ней
        // отвечают Undefined, а не исчезают
        groups.entry(GroupKey(Vec::new())).or_default();
    }

    for rec in records {
        let key = GroupKey(req.group_by.iter().map(|d| d.value(rec)).collect());
        let bucket = groups.entry(key).or_default();
        let revenue = rec.line_revenue();
        bucket.revenue += revenue;
        bucket.count += 1;
        bucket.transactions.insert(rec.transaction_id.clone());
        let per_product = bucket.products.entry(rec.product_id.clone()).or_default();
        per_product.0 += revenue;
        per_product.1 += u64::from(rec.quantity);
    }
    debug!(groups = groups.len(), records = records.len(), "grouping done");

    let mut kpis = BTreeMap::new();
    for metric in &req.metrics {
        let results = match metric {
            Metric::Revenue => scalar(&groups, |b| KpiValue::Number(b.revenue)),
            Metric::Count => scalar(&groups, |b| KpiValue::Number(Decimal::from(b.count))),
            Metric::Aov => scalar(&groups, aov),
            Metric::GrowthRate => growth_rate(&groups, &req.group_by),
            Metric::Clv => clv(records),
            Metric::TopProducts => top_products(&groups, req.top_n),
        };
        kpis.insert(*metric, results);
    }

    Aggregation {
        group_by: req.group_by.clone(),
        kpis,
    }
}

fn scalar(
    groups: &BTreeMap<GroupKey, Bucket>,
    value: impl Fn(&Bucket) -> KpiValue,
) -> Vec<KpiResult> {
    groups
        .iter()
        .map(|(key, bucket)| KpiResult {
            key: key.clone(),
            value: value(bucket),
            count: bucket.count,
        })
        .collect()
}

/// revenue / число различных транзакций; пустая группа -> Undefined.
fn aov(bucket: &Bucket) -> KpiValue {
    if bucket.transactions.is_empty() {
        return KpiValue::Undefined;
    }
    let n = Decimal::from(bucket.transactions.len() as u64);
    KpiValue::Number((bucket.revenue / n).round_dp(2))
}

/// (current - prior) / prior против календарно-смежного прошлого периода
/// в том же срезе остальных измерений. Нет временного измерения, нет
/// прошлой группы или её выручка нулевая -> Undefined.
fn growth_rate(groups: &BTreeMap<GroupKey, Bucket>, group_by: &[Dimension]) -> Vec<KpiResult> {
    let time_pos = group_by.iter().position(|d| d.is_time());
    groups
        .iter()
        .map(|(key, bucket)| {
            let value = time_pos
                .and_then(|pos| {
                    let prior = prior_bucket(group_by[pos], &key.0[pos])?;
                    let mut prior_key = key.0.clone();
                    prior_key[pos] = prior;
                    groups.get(&GroupKey(prior_key))
                })
                .filter(|prior| !prior.revenue.is_zero())
                .map(|prior| {
                    KpiValue::Number(((bucket.revenue - prior.revenue) / prior.revenue).round_dp(4))
                })
                .unwrap_or(KpiValue::Undefined);
            KpiResult {
                key: key.clone(),
                value,
                count: bucket.count,
            }
        })
        .collect()
}

/// Календарно-предыдущее значение временного ключа.
fn prior_bucket(dim: Dimension, value: &str) -> Option<String> {
    match dim {
        Dimension::Day => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()?
            .pred_opt()
            .map(|d| d.format("%Y-%m-%d").to_string()),
        Dimension::Month => {
            let (year, month) = value.split_once('-')?;
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            let (py, pm) = if month == 1 {
                (year - 1, 12)
            } else {
                (year, month - 1)
            };
            Some(format!("{py:04}-{pm:02}"))
        }
        Dimension::Quarter => {
            let (year, quarter) = value.split_once("-Q")?;
            let year: i32 = year.parse().ok()?;
            let quarter: u32 = quarter.parse().ok()?;
            let (py, pq) = if quarter == 1 {
                (year - 1, 4)
            } else {
                (year, quarter - 1)
            };
            Some(format!("{py:04}-Q{pq}"))
        }
        Dimension::Year => {
            let year: i32 = value.parse().ok()?;
            Some(format!("{:04}", year - 1))
        }
        _ => None,
    }
}

/// CLV всегда на грануле клиента, какой бы ни была группировка; записи
/// без идентификатора клиента не атрибутируются никому и пропускаются.
fn clv(records: &[SalesRecord]) -> Vec<KpiResult> {
    let mut per_customer: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for rec in records {
        if let Some(customer) = &rec.customer_id {
            let entry = per_customer.entry(customer.clone()).or_default();
            entry.0 += rec.line_revenue();
            entry.1 += 1;
        }
    }
    per_customer
        .into_iter()
        .map(|(customer, (revenue, count))| KpiResult {
            key: GroupKey(vec![customer]),
            value: KpiValue::Number(revenue),
            count,
        })
        .collect()
}

/// Внутри группы товары по выручке по убыванию, ничья — по идентификатору
/// по возрастанию, усечение до top_n.
fn top_products(groups: &BTreeMap<GroupKey, Bucket>, top_n: usize) -> Vec<KpiResult> {
    groups
        .iter()
        .map(|(key, bucket)| {
            let mut ranked: Vec<ProductRank> = bucket
                .products
                .iter()
                .map(|(id, (revenue, quantity))| ProductRank {
                    product_id: id.clone(),
                    revenue: *revenue,
                    quantity: *quantity,
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.revenue
                    .cmp(&a.revenue)
                    .then_with(|| a.product_id.cmp(&b.product_id))
            });
            ranked.truncate(top_n);
            KpiResult {
                key: key.clone(),
                value: KpiValue::Products(ranked),
                count: bucket.count,
            }
        })
        .collect()
}
