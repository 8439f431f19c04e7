use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mmlgen::pipeline::{self, Status};

/// Static blog generator: renders MML documents, evaluating embedded
/// expression tags.
#[derive(Parser)]
#[command(name = "mmlgen")]
struct Cli {
    /// Directory with input blog data
    input_directory: PathBuf,
    /// Directory for storing the resulting blog files
    output_directory: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = err.print();
                return;
            }
            eprintln!("Invalid command line arguments");
            let _ = err.print();
            process::exit(Status::InvalidArgs as i32);
        }
    };

    let status = pipeline::run(&cli.input_directory, &cli.output_directory);
    process::exit(status as i32);
}
