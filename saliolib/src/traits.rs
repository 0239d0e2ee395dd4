//! Унифицированные трэйты чтения/записи на основе std::io::{BufRead, Write}.

use crate::{
    error::Result,
    model::{RawBatch, SalesRecord},
};
use std::io::{BufRead, Write};

pub trait ReadRows {
    fn read<R: BufRead>(r: R) -> Result<RawBatch>;
}

pub trait WriteRecords {
    fn write<W: Write>(w: W, records: &[SalesRecord]) -> Result<()>;
}

pub trait RowFormat: ReadRows + WriteRecords {}
impl<T: ReadRows + WriteRecords> RowFormat for T {}
