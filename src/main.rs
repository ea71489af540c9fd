//! tabstore - Inspect, filter and stream CSV files as typed column stores

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tabstore::config::{CsvOptions, StreamConfig};
use tabstore::filter::{Condition, FilterOp};
use tabstore::model::{CellValue, DataKind, Field};
use tabstore::parser::{load_csv, write_csv};
use tabstore::stats::describe;
use tabstore::stream::ChunkStream;

/// Typed column store for CSV data
#[derive(Parser, Debug)]
#[command(name = "tabstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Field delimiter
    #[arg(short, long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the inferred schema and row count
    Info {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep the rows matching `column op value` and write them as CSV
    Filter {
        file: PathBuf,

        #[arg(short, long)]
        column: String,

        /// Operator (==, !=, >, >=, <, <=, contains, starts_with, ends_with, is_null, is_not_null)
        #[arg(short, long)]
        op: FilterOp,

        /// Comparison value (ignored by null tests)
        #[arg(long, default_value = "")]
        value: String,

        /// Output file (stdout when omitted)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Print count, nulls, min, max, mean and mode of a column
    Stats {
        file: PathBuf,

        #[arg(short, long)]
        column: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stream the file in chunks and print each chunk's size
    Chunks {
        file: PathBuf,

        #[arg(short = 'n', long, default_value_t = tabstore::config::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
}

#[derive(Serialize)]
struct Info<'a> {
    file: &'a str,
    rows: usize,
    columns: Vec<Field>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let delimiter = u8::try_from(cli.delimiter).context("delimiter must be a single byte")?;
    let options = CsvOptions::default().with_delimiter(delimiter);

    match cli.command {
        Command::Info { file, json } => {
            let dataset = load_csv(&file, &options)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file.display().to_string();
            let info = Info {
                file: &name,
                rows: dataset.len(),
                columns: dataset.fields(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{} ({} rows)", info.file, info.rows);
                for field in &info.columns {
                    println!("  {}: {}", field.name, field.tag);
                }
            }
        }

        Command::Filter {
            file,
            column,
            op,
            value,
            output,
        } => {
            let dataset = load_csv(&file, &options)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let kind = dataset
                .column_type(&column)
                .map(|tag| tag.kind())
                .with_context(|| format!("Column not found: {}", column))?;
            let condition = Condition::new(column, op, value_for(kind, &value));
            let result = condition.apply(&dataset)?;
            match output {
                Some(path) => {
                    tabstore::parser::save_csv(&result, &path, &options)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("{} of {} rows written to {}", result.len(), dataset.len(), path.display());
                }
                None => {
                    let stdout = io::stdout();
                    write_csv(&result, stdout.lock(), &options)?;
                }
            }
        }

        Command::Stats { file, column, json } => {
            let dataset = load_csv(&file, &options)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let stats = describe(&dataset, &column)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| x.to_string());
                println!("Column: {} ({})", stats.column, stats.tag);
                println!("Count:  {}", stats.count);
                println!("Nulls:  {}", stats.nulls);
                println!("Min:    {}", show(stats.min));
                println!("Max:    {}", show(stats.max));
                println!("Mean:   {}", show(stats.mean));
                println!(
                    "Mode:   {}",
                    stats.mode.map_or_else(|| "-".to_string(), |m| m.to_string())
                );
            }
        }

        Command::Chunks { file, chunk_size } => {
            let mut stream = ChunkStream::from_csv(&file, options, StreamConfig::new(chunk_size))
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let sizes = stream.map(|chunk| chunk.len())?;
            let mut out = io::stdout().lock();
            for (index, size) in sizes.iter().enumerate() {
                writeln!(out, "chunk {}: {} rows", index, size)?;
            }
            writeln!(out, "total: {} rows in {} chunks", sizes.iter().sum::<usize>(), sizes.len())?;
        }
    }

    Ok(())
}

/// Comparison value typed after the filtered column; text that does not fit stays a string
fn value_for(kind: DataKind, text: &str) -> CellValue {
    match kind {
        DataKind::Int | DataKind::Float => {
            if let Ok(i) = text.trim().parse::<i32>() {
                CellValue::from(i)
            } else if let Ok(f) = text.trim().parse::<f32>() {
                CellValue::from(f)
            } else {
                CellValue::from(text)
            }
        }
        DataKind::Bool => match text {
            "true" => CellValue::from(true),
            "false" => CellValue::from(false),
            _ => CellValue::from(text),
        },
        DataKind::String | DataKind::Char => CellValue::from(text),
    }
}
