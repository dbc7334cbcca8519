//! Inspect and ship structured log files.
//!
//! ```text
//! elections-logs query --file logs/app.log --level ERROR --message database
//! elections-logs validate --file logs/app.log
//! elections-logs bulk --file logs/app.log > bulk.ndjson
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use elections_logs::index::{bulk, query, validate, Filter, IndexPattern, DEFAULT_PREFIX};
use elections_logs::logging::record::parse_timestamp;
use elections_logs::logging::Level;

#[derive(Parser)]
#[command(name = "elections-logs")]
#[command(about = "Query, validate and export elections API log files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print records matching the filters
    Query {
        #[arg(short, long, default_value = "logs/app.log")]
        file: PathBuf,

        /// Exact level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
        #[arg(short, long)]
        level: Option<Level>,

        /// Substring of the message
        #[arg(short, long)]
        message: Option<String>,

        /// RFC 3339 lower bound (inclusive)
        #[arg(long)]
        since: Option<String>,

        /// RFC 3339 upper bound (inclusive)
        #[arg(long)]
        until: Option<String>,

        /// Stop after this many matches
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Report lines the indexer would drop
    Validate {
        #[arg(short, long, default_value = "logs/app.log")]
        file: PathBuf,
    },
    /// Emit an Elasticsearch bulk request body for the valid lines
    Bulk {
        #[arg(short, long, default_value = "logs/app.log")]
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,
    },
}

fn open(path: &Path) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::Query {
            file,
            level,
            message,
            since,
            until,
            limit,
        } => {
            let mut filter = Filter::new();
            filter.level = level;
            filter.message_contains = message;
            if let Some(raw) = since {
                filter.since = Some(parse_timestamp(&raw)?);
            }
            if let Some(raw) = until {
                filter.until = Some(parse_timestamp(&raw)?);
            }
            query(open(&file)?, &mut out, &filter, limit)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { file } => {
            let summary = validate(open(&file)?, &mut out)?;
            Ok(if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Bulk { file, prefix } => {
            let skipped = bulk(open(&file)?, &mut out, &IndexPattern::new(prefix))?;
            if skipped > 0 {
                eprintln!("skipped {} invalid lines", skipped);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
