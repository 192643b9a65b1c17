//! sky - read and print Sky s-expressions
//!
//! Usage:
//!   sky                       # Read from stdin, keep going after errors
//!   sky a.sky b.sky           # Read files; an error skips the rest of that file
//!   sky --config sky.toml     # Reader limits from TOML
//!   sky --intern              # Intern symbols across all inputs
//!
//! Logging goes to stderr and is controlled by RUST_LOG (default `sky=warn`).

use clap::Parser as ClapParser;
use sky_reader::ReaderConfig;
use sky_repl::{EchoSummary, OnError, Session};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sky")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read Sky s-expressions and print them back", long_about = None)]
struct Cli {
    /// Source files to read (stdin when none are given)
    files: Vec<PathBuf>,

    /// Path to a reader configuration (TOML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Intern symbols so equal names share one symbol
    #[arg(long)]
    intern: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sky=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => match ReaderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => ReaderConfig::default(),
    };
    info!(?config, "reader configured");

    let mut session = Session::new(config);
    if cli.intern {
        session = session.with_interning();
    }

    let ok = if cli.files.is_empty() {
        let stdin = io::stdin();
        report(session.echo(
            stdin.lock(),
            &mut io::stdout(),
            &mut io::stderr(),
            OnError::Continue,
        ))
    } else {
        let mut ok = true;
        for path in &cli.files {
            info!(path = %path.display(), "reading");
            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    eprintln!("Error: Failed to open {}: {}", path.display(), e);
                    ok = false;
                    continue;
                }
            };
            ok &= report(session.echo(
                BufReader::new(file),
                &mut io::stdout(),
                &mut io::stderr(),
                OnError::SkipRest,
            ));
        }
        ok
    };

    if !ok {
        process::exit(1);
    }
}

/// True when the stream was read without errors
fn report(result: io::Result<EchoSummary>) -> bool {
    match result {
        Ok(summary) => summary.is_clean(),
        Err(e) => {
            eprintln!("Error: Failed to write output: {}", e);
            false
        }
    }
}
