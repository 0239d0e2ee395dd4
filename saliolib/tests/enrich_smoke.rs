use chrono::NaiveDate;
use rust_decimal::Decimal;
use saliolib::{
    enrich::{enrich, ProductCatalog},
    filter::RecordFilter,
    model::SalesRecord,
};
use std::io::Cursor;

fn rec(id: &str, product: &str, region: &str, qty: u32, price: i64) -> SalesRecord {
    SalesRecord {
        transaction_id: id.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 12, 1).expect("date"),
        product_id: product.to_string(),
        product_name: None,
        quantity: qty,
        unit_price: Decimal::from(price),
        discount: Decimal::ZERO,
        customer_id: Some("C001".to_string()),
        region: Some(region.to_string()),
        category: None,
    }
}

const CATALOG: &str = r#"{
  "products": {
    "P101": { "name": "Laptop", "category": "Electronics", "list_price": "45000" },
    "P102": { "name": "Mouse", "category": "Accessories" }
  }
}"#;

#[test]
fn catalog_fills_name_and_category() {
    let catalog = ProductCatalog::from_json(Cursor::new(CATALOG)).expect("catalog");
    let records = vec![rec("T1", "P101", "North", 1, 45000), rec("T2", "P999", "South", 1, 10)];

    let (enriched, summary) = enrich(&records, &catalog);
    assert_eq!(enriched[0].product_name.as_deref(), Some("Laptop"));
    assert_eq!(enriched[0].category.as_deref(), Some("Electronics"));
    assert_eq!(enriched[1].category, None);

    assert_eq!(summary.total, 2);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.unmatched, 1);
    assert_eq!(summary.unmatched_ids, ["P999"]);
    assert!((summary.match_rate_percent() - 50.0).abs() < f64::EPSILON);

    // исходные записи не тронуты — обогащение порождает копии
    assert_eq!(records[0].category, None);
}

#[test]
fn existing_product_name_is_kept() {
    let catalog = ProductCatalog::from_json(Cursor::new(CATALOG)).expect("catalog");
    let mut record = rec("T1", "P101", "North", 1, 45000);
    record.product_name = Some("Ноутбук".to_string());
    let (enriched, _) = enrich(&[record], &catalog);
    assert_eq!(enriched[0].product_name.as_deref(), Some("Ноутбук"));
}

#[test]
fn filter_by_region_then_amount() {
    let records = vec![
        rec("T1", "P101", "North", 1, 45000),
        rec("T2", "P102", "South", 1, 500),
        rec("T3", "P102", "North", 1, 200),
    ];
    let filter = RecordFilter {
        region: Some("North".to_string()),
        min_amount: Some(Decimal::from(1000)),
        max_amount: None,
    };
    let (kept, summary) = filter.apply(records);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].transaction_id, "T1");
    assert_eq!(summary.input, 3);
    assert_eq!(summary.removed_by_region, 1);
    assert_eq!(summary.removed_by_amount, 1);
    assert_eq!(summary.kept, 1);
}

#[test]
fn empty_filter_keeps_everything() {
    let records = vec![rec("T1", "P101", "North", 1, 45000)];
    let filter = RecordFilter::default();
    assert!(filter.is_empty());
    let (kept, summary) = filter.apply(records);
    assert_eq!(kept.len(), 1);
    assert_eq!(summary.removed_by_region + summary.removed_by_amount, 0);
}
