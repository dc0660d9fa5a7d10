use chrono::TimeDelta;
use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use workledger::application::{LedgerConfig, WorkLedger};
use workledger::domain::ports::StoreHandle;
use workledger::infrastructure::clock::ManualClock;
use workledger::infrastructure::in_memory::InMemoryStore;
use workledger::interfaces::csv::command_reader::CommandReader;
use workledger::interfaces::csv::report_writer::ReportWriter;
use workledger::interfaces::replay::CommandReplayer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script (CSV)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Minutes after creation during which the payer may delete a payment
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(i64).range(0..))]
    delete_window_mins: i64,

    /// Most verbose level logged to stderr
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

fn open_store(db_path: Option<PathBuf>) -> Result<StoreHandle> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = workledger::infrastructure::rocksdb::RocksDBStore::open(&path)?;
            info!(path = %path.display(), "using persistent storage");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryStore::new()))
        }
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let payment_delete_window = TimeDelta::try_minutes(cli.delete_window_mins)
        .ok_or_else(|| miette!("--delete-window-mins {} is out of range", cli.delete_window_mins))?;
    let config = LedgerConfig {
        payment_delete_window,
    };
    let store = open_store(cli.db_path)?;
    let clock = ManualClock::default();
    let ledger = WorkLedger::new(store)
        .with_clock(Arc::new(clock.clone()))
        .with_config(config);

    // Replay commands
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let mut replayer = CommandReplayer::new(ledger.clone(), clock);
    let mut rows = 0;
    for (index, command) in reader.commands().enumerate() {
        let row = index + 1;
        rows = row;
        match command {
            Ok(command) => {
                if let Err(e) = replayer.apply(command).await {
                    warn!(row, kind = e.kind(), "Error processing command: {e}");
                }
            }
            Err(e) => {
                warn!(row, "Error reading command: {e}");
            }
        }
    }

    info!(rows, "replay finished");

    // Output final state
    let report = ledger.ledger_report().await?;
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_report(&report)?;

    Ok(())
}
