//! Валидатор сырых строк: обязательные поля -> приведение типов ->
//! диапазоны -> справочная проверка кодов. Чистая функция, без
//! глобального состояния: справочники передаются явно.

use crate::model::{col, Flag, RawRow, RejectReason, SalesRecord, DATE_FORMAT};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub record: SalesRecord,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    known_regions: Option<BTreeSet<String>>,
    known_products: Option<BTreeSet<String>>,
    id_prefixes: bool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Справочник регионов: неизвестный код — флаг, не отказ.
    pub fn with_known_regions<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.known_regions = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Справочник товаров: неизвестный код — флаг, не отказ.
    pub fn with_known_products<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.known_products = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    /// Соглашение исходной выгрузки: TransactionID на `T`, ProductID на `P`,
    /// CustomerID на `C`. Несовпадение — флаг SuspectId.
    pub fn with_id_prefixes(mut self) -> Self {
        self.id_prefixes = true;
        self
    }

    /// Детерминированно и независимо от других строк: одна строка ->
    /// либо запись, либо причина отбраковки.
    pub fn validate(&self, row: &RawRow) -> Result<Validated, RejectReason> {
        let mut flags = Vec::new();

        // 1. обязательные поля
        let transaction_id = required(row, col::TRANSACTION_ID)?;
        let date_raw = required(row, col::DATE)?;
        let product_id = required(row, col::PRODUCT_ID)?;
        let price_raw = required(row, col::UNIT_PRICE)?;
        let quantity_raw = required(row, col::QUANTITY)?;

        // 2. приведение типов (разделители тысяч в числах отбрасываем)
        let date = NaiveDate::parse_from_str(date_raw, DATE_FORMAT)
            .map_err(|_| coercion(col::DATE, date_raw))?;
        let quantity: i64 = quantity_raw
            .replace(',', "")
            .parse()
            .map_err(|_| coercion(col::QUANTITY, quantity_raw))?;
        let unit_price: Decimal = price_raw
            .replace(',', "")
            .parse()
            .map_err(|_| coercion(col::UNIT_PRICE, price_raw))?;
        let discount = match row.get(col::DISCOUNT) {
            Some(raw) => raw
                .replace(',', "")
                .parse::<Decimal>()
                .map_err(|_| coercion(col::DISCOUNT, raw))?,
            None => {
                flags.push(Flag::ImputedDiscount);
                Decimal::ZERO
            }
        };

        // 3. диапазоны
        if unit_price < Decimal::ZERO {
            return Err(range(col::UNIT_PRICE, price_raw));
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|&q| q >= 1)
            .ok_or_else(|| range(col::QUANTITY, quantity_raw))?;
        if discount < Decimal::ZERO || discount > Decimal::ONE {
            return Err(range(col::DISCOUNT, row.get(col::DISCOUNT).unwrap_or("")));
        }

        // 4. справочная проверка — нефатальная
        let customer_id = row.get(col::CUSTOMER_ID).map(str::to_string);
        let region = row.get(col::REGION).map(str::to_string);

        if let (Some(known), Some(r)) = (&self.known_regions, &region) {
            if !known.contains(r) {
                flags.push(Flag::UnknownRegion);
            }
        }
        if let Some(known) = &self.known_products {
            if !known.contains(product_id) {
                flags.push(Flag::UnknownProduct);
            }
        }
        if self.id_prefixes {
            if !transaction_id.starts_with('T') {
                flags.push(Flag::SuspectId(col::TRANSACTION_ID));
            }
            if !product_id.starts_with('P') {
                flags.push(Flag::SuspectId(col::PRODUCT_ID));
            }
            if let Some(c) = &customer_id {
                if !c.starts_with('C') {
                    flags.push(Flag::SuspectId(col::CUSTOMER_ID));
                }
            }
        }

        Ok(Validated {
            record: SalesRecord {
                transaction_id: transaction_id.to_string(),
                date,
                product_id: product_id.to_string(),
                product_name: row.get(col::PRODUCT_NAME).map(str::to_string),
                quantity,
                unit_price,
                discount,
                customer_id,
                region,
                category: row.get(col::CATEGORY).map(str::to_string),
            },
            flags,
        })
    }
}

fn required<'a>(row: &'a RawRow, field: &str) -> Result<&'a str, RejectReason> {
    row.get(field)
        .ok_or_else(|| RejectReason::MissingField(field.to_string()))
}

fn coercion(field: &str, value: &str) -> RejectReason {
    RejectReason::TypeCoercion {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn range(field: &str, value: &str) -> RejectReason {
    RejectReason::RangeViolation {
        field: field.to_string(),
        value: value.to_string(),
    }
}
