use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use oxmerge_core::MergeError;
use oxmerge_flatten::Config;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oxmerge")]
#[command(about = "Merge TypeScript/JavaScript sources into a single file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Flatten a file and its local imports into one document
    Flatten(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let started = Instant::now();

    match cli.command {
        Commands::Flatten(cfg) => {
            info!(
                "Flattening {} (using {} threads for config loading)",
                cfg.file.display(),
                rayon::current_num_threads()
            );

            let result = match oxmerge_flatten::run_flatten(cfg.clone()) {
                Ok(result) => result,
                Err(err) => {
                    if let Some(MergeError::ConfigurationNotFound { start }) =
                        err.downcast_ref::<MergeError>()
                    {
                        let mut stderr = std::io::stderr();
                        oxmerge_flatten::print_config_warning(&mut stderr, start)?;
                        std::process::exit(1);
                    }
                    return Err(err);
                }
            };

            match &cfg.output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    oxmerge_flatten::write_merged(&mut writer, &result)?;
                    info!("Wrote merged output to {}", path.display());
                }
                None => {
                    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
                    // See https://github.com/rust-lang/rust/issues/60673
                    let mut stdout = BufWriter::new(std::io::stdout());
                    oxmerge_flatten::write_merged(&mut stdout, &result)?;
                    stdout.flush()?;
                }
            }

            let elapsed_ms = started.elapsed().as_millis();
            let mut stderr = std::io::stderr();
            oxmerge_flatten::print_summary(&mut stderr, &result, elapsed_ms, cfg.list_files)?;

            Ok(())
        }
    }
}
