use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paygate::application::engine::ApprovalEngine;
use paygate::config::EngineConfig;
use paygate::domain::clock::SystemClock;
use paygate::domain::ports::LedgerBox;
use paygate::infrastructure::executor::SimulatedTransferExecutor;
use paygate::infrastructure::in_memory::InMemoryLedger;
#[cfg(feature = "storage-rocksdb")]
use paygate::infrastructure::rocksdb::RocksDbLedger;
use paygate::interfaces::csv::request_writer::RequestWriter;
use paygate::interfaces::csv::transaction_writer::TransactionWriter;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Auto-approval cutoff in cents. 0 disables auto-approval.
    #[arg(long, default_value_t = 0)]
    auto_approve_threshold: u64,

    /// Maximum request creations in the trailing hour.
    #[arg(long, default_value_t = 10)]
    rate_limit_per_hour: u32,

    /// Opening balance of the simulated transfer executor, in cents.
    #[arg(long, default_value_t = 1_000_000)]
    opening_balance: u64,

    /// Upper bound on a single transfer call, in seconds.
    #[arg(long, default_value_t = 30)]
    transfer_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new payment request.
    Request {
        to_address: String,
        amount_cents: u64,
        #[arg(long)]
        note: Option<String>,
    },
    /// Approve a pending request.
    Approve {
        request_id: Uuid,
        #[arg(long)]
        reviewed_by: String,
    },
    /// Reject a pending request with a reason.
    Reject {
        request_id: Uuid,
        #[arg(long)]
        reviewed_by: String,
        #[arg(long)]
        reason: String,
    },
    /// List requests awaiting review.
    Pending,
    /// Show a single request.
    Show { request_id: Uuid },
    /// Execute every approved request.
    Execute,
    /// Show recent audit log entries, most recent first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn open_ledger(db_path: Option<PathBuf>) -> Result<LedgerBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let ledger = RocksDbLedger::open(path).into_diagnostic()?;
            Ok(Box::new(ledger))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryLedger::new()))
        }
        None => Ok(Box::new(InMemoryLedger::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let ledger = open_ledger(cli.db_path)?;
    let executor = SimulatedTransferExecutor::new(cli.opening_balance);
    let config = EngineConfig {
        auto_approve_threshold_cents: cli.auto_approve_threshold,
        rate_limit_per_hour: cli.rate_limit_per_hour,
        transfer_timeout: Duration::from_secs(cli.transfer_timeout_secs),
    };
    let engine = ApprovalEngine::new(ledger, Box::new(executor), Box::new(SystemClock), config);

    let stdout = io::stdout();
    match cli.command {
        Command::Request {
            to_address,
            amount_cents,
            note,
        } => {
            let request = engine
                .request_payment(&to_address, amount_cents, note)
                .await
                .into_diagnostic()?;
            RequestWriter::new(stdout.lock())
                .write_requests(std::slice::from_ref(&request))
                .into_diagnostic()?;
        }
        Command::Approve {
            request_id,
            reviewed_by,
        } => {
            engine
                .approve_payment(request_id, &reviewed_by)
                .await
                .into_diagnostic()?;
            let request = engine.get_request_by_id(request_id).await.into_diagnostic()?;
            RequestWriter::new(stdout.lock())
                .write_requests(std::slice::from_ref(&request))
                .into_diagnostic()?;
        }
        Command::Reject {
            request_id,
            reviewed_by,
            reason,
        } => {
            engine
                .reject_payment(request_id, &reviewed_by, &reason)
                .await
                .into_diagnostic()?;
            let request = engine.get_request_by_id(request_id).await.into_diagnostic()?;
            RequestWriter::new(stdout.lock())
                .write_requests(std::slice::from_ref(&request))
                .into_diagnostic()?;
        }
        Command::Pending => {
            let pending = engine.get_pending_requests().await.into_diagnostic()?;
            RequestWriter::new(stdout.lock())
                .write_requests(&pending)
                .into_diagnostic()?;
        }
        Command::Show { request_id } => {
            let request = engine.get_request_by_id(request_id).await.into_diagnostic()?;
            RequestWriter::new(stdout.lock())
                .write_requests(std::slice::from_ref(&request))
                .into_diagnostic()?;
        }
        Command::Execute => {
            engine.execute_approved_payments().await.into_diagnostic()?;
        }
        Command::History { limit } => {
            let transactions = engine
                .get_recent_transactions(limit)
                .await
                .into_diagnostic()?;
            TransactionWriter::new(stdout.lock())
                .write_transactions(&transactions)
                .into_diagnostic()?;
        }
    }

    Ok(())
}
