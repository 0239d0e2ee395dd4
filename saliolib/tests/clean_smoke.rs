use rust_decimal::Decimal;
use saliolib::{
    clean::clean,
    model::{col, RawRow, RejectReason},
    validate::Validator,
};

fn row(id: &str, date: &str, product: &str, qty: &str, price: &str) -> RawRow {
    RawRow::new()
        .with(col::TRANSACTION_ID, id)
        .with(col::DATE, date)
        .with(col::PRODUCT_ID, product)
        .with(col::QUANTITY, qty)
        .with(col::UNIT_PRICE, price)
}

#[test]
fn missing_price_is_rejected_and_reported() {
    let batch = vec![
        row("1", "2024-01-05", "A", "2", "10"),
        RawRow::new()
            .with(col::TRANSACTION_ID, "2")
            .with(col::DATE, "2024-01-06")
            .with(col::PRODUCT_ID, "B")
            .with(col::QUANTITY, "1"),
    ];
    let (records, report) = clean(&Validator::new(), &batch);
    assert_eq!(records.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].row, 2);
    assert_eq!(
        report.rejected[0].reason,
        RejectReason::MissingField(col::UNIT_PRICE.to_string())
    );
    let by_reason = report.rejects_by_reason();
    assert_eq!(by_reason.len(), 1);
    assert_eq!(by_reason.values().sum::<usize>(), 1);
}

#[test]
fn later_timestamp_wins_on_duplicate_id() {
    // повторная отправка той же транзакции с новой ценой
    let batch = vec![
        row("1", "2024-01-05", "A", "2", "10"),
        row("2", "2024-01-07", "B", "1", "5"),
        row("1", "2024-01-06", "A", "2", "12"),
    ];
    let (records, report) = clean(&Validator::new(), &batch);
    assert_eq!(records.len(), 2);
    assert_eq!(report.duplicates_removed, 1);
    // победитель остаётся на позиции первого вхождения
    assert_eq!(records[0].transaction_id, "1");
    assert_eq!(records[0].line_revenue(), Decimal::from(24));
    assert_eq!(records[1].transaction_id, "2");
}

#[test]
fn equal_timestamps_keep_first_occurrence() {
    let batch = vec![
        row("1", "2024-01-05", "A", "2", "10"),
        row("1", "2024-01-05", "A", "2", "99"),
    ];
    let (records, _) = clean(&Validator::new(), &batch);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].unit_price, Decimal::from(10));
}

#[test]
fn missing_discount_is_imputed_to_zero() {
    let (records, report) = clean(&Validator::new(), &[row("1", "2024-01-05", "A", "1", "10")]);
    assert_eq!(records[0].discount, Decimal::ZERO);
    assert_eq!(report.imputed_discounts, 1);
}

#[test]
fn range_violations() {
    let cases = [
        row("1", "2024-01-05", "A", "0", "10"),
        row("2", "2024-01-05", "A", "1", "-5"),
        row("3", "2024-01-05", "A", "1", "10").with(col::DISCOUNT, "1.5"),
    ];
    let v = Validator::new();
    for raw in &cases {
        let reason = v.validate(raw).expect_err("out of range");
        assert!(matches!(reason, RejectReason::RangeViolation { .. }));
    }
}

#[test]
fn unparsable_fields_are_coercion_errors() {
    let v = Validator::new();
    let bad_date = v
        .validate(&row("1", "05.01.2024", "A", "1", "10"))
        .expect_err("bad date");
    assert!(matches!(bad_date, RejectReason::TypeCoercion { .. }));

    let bad_qty = v
        .validate(&row("1", "2024-01-05", "A", "two", "10"))
        .expect_err("bad quantity");
    assert!(matches!(bad_qty, RejectReason::TypeCoercion { .. }));
}

#[test]
fn validation_is_deterministic() {
    let v = Validator::new().with_known_regions(["North"]);
    let raw = row("1", "2024-01-05", "A", "2", "10").with(col::REGION, "Mars");
    let first = v.validate(&raw).expect("valid");
    let second = v.validate(&raw).expect("valid");
    assert_eq!(first, second);
}

#[test]
fn unknown_codes_are_flagged_not_fatal() {
    let v = Validator::new()
        .with_known_regions(["North", "South"])
        .with_known_products(["A"]);
    let batch = vec![
        row("1", "2024-01-05", "A", "1", "10").with(col::REGION, "North"),
        row("2", "2024-01-05", "Z", "1", "10").with(col::REGION, "Mars"),
    ];
    let (records, report) = clean(&v, &batch);
    assert_eq!(records.len(), 2);
    assert_eq!(report.unknown_regions, 1);
    assert_eq!(report.unknown_products, 1);
}

#[test]
fn id_prefix_convention_is_a_flag() {
    let v = Validator::new().with_id_prefixes();
    let batch = vec![
        row("T001", "2024-01-05", "P101", "1", "10").with(col::CUSTOMER_ID, "C001"),
        row("X001", "2024-01-05", "P102", "1", "10"),
    ];
    let (records, report) = clean(&v, &batch);
    assert_eq!(records.len(), 2);
    assert_eq!(report.suspect_ids, 1);
}

#[test]
fn cleaning_is_idempotent() {
    let batch = vec![
        row("1", "2024-01-05", "A", "2", "10"),
        row("1", "2024-01-06", "A", "2", "12"),
        row("2", "2024-01-07", "B", "1", "5").with(col::DISCOUNT, "0.2"),
    ];
    let (records, _) = clean(&Validator::new(), &batch);

    // прогон очистки поверх её собственного результата ничего не меняет
    let again: Vec<RawRow> = records
        .iter()
        .map(|r| {
            let mut raw = RawRow::new()
                .with(col::TRANSACTION_ID, r.transaction_id.clone())
                .with(col::DATE, r.date.format("%Y-%m-%d").to_string())
                .with(col::PRODUCT_ID, r.product_id.clone())
                .with(col::QUANTITY, r.quantity.to_string())
                .with(col::UNIT_PRICE, r.unit_price.to_string());
            raw.set(col::DISCOUNT, r.discount.to_string());
            raw
        })
        .collect();
    let (records2, report2) = clean(&Validator::new(), &again);
    assert_eq!(records, records2);
    assert_eq!(report2.duplicates_removed, 0);
    assert!(report2.rejected.is_empty());
}
