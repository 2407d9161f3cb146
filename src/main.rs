//! msil-extract CLI - command-line interface
//!
//! Runs the configured extraction plan once and prints per-page progress and
//! per-data-set verification lines.

use clap::Parser;
use msil_extract::{Config, Event, Extractor};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "msil-extract")]
#[command(about = "Fetch MSIL feature layers as count-verified GeoJSON", long_about = None)]
struct Args {
    /// JSON configuration file (all settings optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory (overrides the configuration file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Records per page (overrides the configuration file)
    #[arg(long)]
    page_size: Option<u32>,

    /// API subscription key
    #[arg(long, env = "MSIL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let extractor = match Extractor::new(config) {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut events = extractor.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress output fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = extractor.run().await;

    // Closing the channel ends the printer once it has drained
    drop(extractor);
    printer.await.ok();

    match result {
        Ok(summary) => {
            let mismatches = summary.mismatches().count();
            if mismatches > 0 {
                println!("done ({mismatches} data set(s) with count mismatch)");
            } else {
                println!("done");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> msil_extract::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(page_size) = args.page_size {
        config.paging.page_size = page_size;
    }
    if args.api_key.is_some() {
        config.api_key = args.api_key.clone();
    }
    Ok(config)
}

fn print_event(event: &Event) {
    match event {
        Event::DatasetStarted { .. } => {}
        Event::ExpectedCount { name, expected } => {
            println!("[{name}] expected count = {expected}");
        }
        Event::PageFetched {
            layer,
            offset,
            fetched,
            total,
            exceeded_transfer_limit,
            ..
        } => match exceeded_transfer_limit {
            Some(flag) => println!(
                "{layer} fetched {fetched}  total {total}  offset {offset}  exceededTransferLimit={flag}"
            ),
            None => println!("{layer} fetched {fetched}  total {total}  offset {offset}"),
        },
        Event::Saved { path, features } => {
            println!("Saved: {} ({features} features)", path.display());
        }
        Event::Verified {
            name,
            expected,
            actual,
            matched,
        } => {
            if *matched {
                println!("[{name}] counts match ({actual})");
            } else {
                println!(
                    "WARNING [{name}] count mismatch: expected={expected}, actual={actual} (features may be missing)"
                );
            }
        }
        Event::RunComplete { .. } => {}
    }
}
