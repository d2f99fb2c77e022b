pub mod request_writer;
pub mod transaction_writer;
