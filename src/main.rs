use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bodgitt::common::{OwnerId, RecordNo, StoreConfig};
use bodgitt::db::Store;
use bodgitt::record::Schema;

/// Bodgitt - inspect and edit a flat-file record store
#[derive(Parser, Debug)]
#[command(name = "bodgitt")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty database file with the contractor schema
    Init { file: PathBuf },

    /// Print the column layout of a database file
    Schema { file: PathBuf },

    /// Print every valid record
    List { file: PathBuf },

    /// Print one record
    Read { file: PathBuf, rec_no: u32 },

    /// Print records matching one prefix criterion per column ("" matches anything)
    Find {
        file: PathBuf,
        criteria: Vec<String>,
    },

    /// Create a record from one value per column
    Create { file: PathBuf, values: Vec<String> },

    /// Delete a record
    Delete { file: PathBuf, rec_no: u32 },
}

/// The six-column contractor layout the booking application ships with.
fn contractor_schema() -> Schema {
    Schema::builder()
        .column("name", 32)
        .column("location", 64)
        .column("specialties", 64)
        .column("size", 6)
        .column("rate", 8)
        .column("owner", 8)
        .build()
}

fn print_record(rec_no: RecordNo, fields: &[String]) {
    println!("{:>6} | {}", rec_no.as_u32(), fields.join(" | "));
}

/// Deletes `rec_no` under its lock. Returns false if the lock attempt was
/// cancelled and nothing was deleted.
fn delete_record(store: &Store, rec_no: RecordNo, owner: OwnerId) -> bodgitt::Result<bool> {
    match store.lock_guard(rec_no, owner)? {
        Some(lock) => {
            lock.delete()?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn run(cli: Cli) -> bodgitt::Result<()> {
    match cli.command {
        Command::Init { file } => {
            Store::initialize(&file, &contractor_schema(), StoreConfig::default())?;
            println!("Created {}", file.display());
        }
        Command::Schema { file } => {
            let store = Store::open(&file)?;
            let schema = store.schema();
            for col in schema.columns() {
                println!("{:>3} {:<16} {:>4} bytes", col.ordinal(), col.name(), col.length());
            }
            println!("record length:      {}", schema.record_length());
            println!("data section start: {}", schema.data_section_start());
            println!("slots:              {}", store.slot_count()?);
            println!("valid records:      {}", store.record_count()?);
        }
        Command::List { file } => {
            let store = Store::open(&file)?;
            let all = vec![None::<&str>; store.schema().column_count()];
            for rec_no in store.find(&all)? {
                print_record(rec_no, &store.read(rec_no)?);
            }
        }
        Command::Read { file, rec_no } => {
            let store = Store::open(&file)?;
            let rec_no = RecordNo::new(rec_no);
            print_record(rec_no, &store.read(rec_no)?);
        }
        Command::Find { file, criteria } => {
            let store = Store::open(&file)?;
            for rec_no in store.find(&criteria)? {
                print_record(rec_no, &store.read(rec_no)?);
            }
        }
        Command::Create { file, values } => {
            let store = Store::open(&file)?;
            let rec_no = store.create(&values)?;
            store.sync()?;
            println!("Created record {}", rec_no.as_u32());
        }
        Command::Delete { file, rec_no } => {
            let store = Store::open(&file)?;
            let rec_no = RecordNo::new(rec_no);
            if delete_record(&store, rec_no, OwnerId::next())? {
                store.sync()?;
                println!("Deleted record {}", rec_no.as_u32());
            } else {
                println!("Delete of record {} cancelled", rec_no.as_u32());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
