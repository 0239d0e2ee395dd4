//! Пайп-формат исходной выгрузки:
//! TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
//!
//! Числа в ней встречаются с разделителями тысяч (45,000) — с `|` это
//! безопасно, запятые отбрасывает валидатор.

use crate::{
    error::Result,
    model::{RawBatch, SalesRecord},
};
use std::io::{BufRead, Write};

pub struct Pipe;

impl crate::traits::ReadRows for Pipe {
    fn read<R: BufRead>(r: R) -> Result<RawBatch> {
        super::csv::read_rows(r, b'|')
    }
}

impl crate::traits::WriteRecords for Pipe {
    fn write<W: Write>(w: W, records: &[SalesRecord]) -> Result<()> {
        super::csv::write_records(w, records, b'|')
    }
}
