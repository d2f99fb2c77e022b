use crate::domain::payment::PaymentRequest;
use crate::error::Result;
use std::io::Write;

/// Writes payment request rows as CSV, one record per request.
///
/// Field names become the header row; timestamps are RFC 3339 strings.
pub struct RequestWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RequestWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_requests(&mut self, requests: &[PaymentRequest]) -> Result<()> {
        for request in requests {
            self.writer.serialize(request)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
