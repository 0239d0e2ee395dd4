//! Очистка батча: валидация каждой строки независимо, разбор на
//! принятые/отклонённые, дедупликация по идентификатору транзакции.
//!
//! Правило дедупликации: побеждает запись с более поздней датой; при
//! равных датах остаётся первое вхождение. Победитель занимает позицию
//! первого вхождения своего идентификатора, так что порядок выдачи
//! детерминирован и выводится из входного порядка. Повторно присланные
//! записи документированно вытесняют старые, а не теряются молча.

use crate::{
    model::{CleaningReport, RawRow, RejectedRow, SalesRecord},
    validate::Validator,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Батч сырых строк -> (чистые записи, отчёт). Отказ отдельной строки
/// не прерывает прогон; структурно нечитаемый вход отсекается раньше,
/// на уровне формата.
pub fn clean(validator: &Validator, batch: &[RawRow]) -> (Vec<SalesRecord>, CleaningReport) {
    let mut report = CleaningReport::new(batch.len());
    let mut accepted: Vec<SalesRecord> = Vec::new();
    // транзакция -> позиция первого вхождения в accepted
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    for (i, row) in batch.iter().enumerate() {
        let row_number = i + 1;
        match validator.validate(row) {
            Ok(v) => {
                for flag in &v.flags {
                    report.tally_flag(*flag);
                }
                match seen.get(&v.record.transaction_id) {
                    Some(&at) => {
                        report.duplicates_removed += 1;
                        if v.record.date > accepted[at].date {
                            accepted[at] = v.record;
                        }
                    }
                    None => {
                        seen.insert(v.record.transaction_id.clone(), accepted.len());
                        accepted.push(v.record);
                    }
                }
            }
            Err(reason) => {
                debug!(row = row_number, reason = %reason, "row rejected");
                report.rejected.push(RejectedRow {
                    row: row_number,
                    reason,
                });
            }
        }
    }

    report.accepted = accepted.len();
    info!(
        total = report.total_rows,
        accepted = report.accepted,
        rejected = report.rejected.len(),
        duplicates = report.duplicates_removed,
        "batch cleaned"
    );
    (accepted, report)
}
