use saliolib::{
    aggregate::{aggregate, AggregateRequest, Dimension, Metric},
    clean::clean,
    formats::{json::Json, pipe::Pipe, report::TextReport},
    traits::ReadRows,
    validate::Validator,
};
use std::io::Cursor;

const INPUT: &str = "\
TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
T001|2024-12-01|P101|Laptop|2|45000|C001|North
T002|2024-12-01|P102|Mouse|1|500|C002|South
T003|2024-12-02|P101|Laptop|1|45000|C001|North
T004|2024-12-03|P103|Webcam|1|1200|C003|East
bad-row|nodate|P1|x|1|10|C9|West
";

#[test]
fn report_contains_every_section() {
    let batch = Pipe::read(Cursor::new(INPUT)).expect("read pipe");
    let (records, cleaning) = clean(&Validator::new(), &batch);
    assert_eq!(records.len(), 4);
    assert_eq!(cleaning.rejected.len(), 1);

    let mut out = Vec::new();
    TextReport::write(&mut out, &records, &cleaning, None).expect("write report");
    let text = String::from_utf8(out).expect("utf8");

    for section in [
        "SALES ANALYTICS REPORT",
        "OVERALL SUMMARY",
        "REGION-WISE PERFORMANCE",
        "TOP PRODUCTS",
        "TOP CUSTOMERS",
        "DAILY SALES TREND",
        "PEAK SALES DAY",
        "LOW PERFORMING PRODUCTS",
        "CLEANING SUMMARY",
    ] {
        assert!(text.contains(section), "missing section: {section}");
    }

    // деньги с разделителями тысяч, диапазон дат, пиковый день
    assert!(text.contains("$136,700.00"));
    assert!(text.contains("2024-12-01 .. 2024-12-03"));
    assert!(text.contains("P101 (Laptop)"));
    // 2024-12-01: 90500 против 45000 и 1200 в другие дни
    assert!(text.contains("2024-12-01: $90,500.00 across 2 transactions"));
}

#[test]
fn json_document_is_parseable() {
    let batch = Pipe::read(Cursor::new(INPUT)).expect("read pipe");
    let (records, cleaning) = clean(&Validator::new(), &batch);
    let kpis = aggregate(
        &records,
        &AggregateRequest::new(
            vec![Dimension::Region],
            vec![Metric::Revenue, Metric::Aov, Metric::TopProducts],
        ),
    );

    let mut out = Vec::new();
    Json::write_document(&mut out, &records, &cleaning, None, Some(&kpis)).expect("write json");
    let doc: serde_json::Value = serde_json::from_slice(&out).expect("parse json");

    assert_eq!(doc["records"].as_array().expect("records").len(), 4);
    assert_eq!(doc["cleaning"]["total_rows"], 5);
    assert!(doc["enrichment"].is_null());
    let revenue = doc["kpis"]["kpis"]["revenue"].as_array().expect("revenue");
    assert_eq!(revenue.len(), 3); // East, North, South
    // выручка сериализуется строкой — Decimal без потери точности
    assert_eq!(revenue[0]["value"], "1200");
}

#[test]
fn kpi_table_is_flat_csv() {
    let batch = Pipe::read(Cursor::new(INPUT)).expect("read pipe");
    let (records, _) = clean(&Validator::new(), &batch);
    let kpis = aggregate(
        &records,
        &AggregateRequest::new(vec![Dimension::Region], vec![Metric::Revenue, Metric::TopProducts]),
    );

    let mut out = Vec::new();
    saliolib::formats::csv::write_kpis(&mut out, &kpis).expect("write kpis");
    let text = String::from_utf8(out).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("metric,key,product,value,count"));
    assert!(text.contains("revenue,North,,135000,2"));
    assert!(text.contains("top_products,North,P101,135000,3"));
}
