use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::io::Write;

/// Writes audit transaction entries as CSV, one record per entry.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(tx)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
