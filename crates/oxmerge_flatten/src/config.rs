use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use oxmerge_core::UnownedFilePolicy;
use path_clean::clean;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "flatten")]
#[command(about = "Merge a file and every local file it imports into one document")]
pub struct Config {
    /// File to start from
    pub file: PathBuf,

    /// Write the merged document to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Which tsconfig to use when none claims the file: `root` or `nearest`
    #[arg(long, default_value = "root")]
    pub unowned: UnownedFilePolicy,

    /// List every merged file in the summary
    #[arg(long)]
    pub list_files: bool,
}

impl Config {
    /// Absolute form of `file`, canonical when the file exists.
    pub fn start_path(&self) -> Result<PathBuf> {
        normalize_start(&self.file)
    }
}

pub(crate) fn normalize_start(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    // Missing files still get an absolute path so the tsconfig search can run
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to make {} absolute", path.display()))?;
    debug!("{} does not exist yet, using {}", path.display(), absolute.display());
    Ok(clean(absolute))
}
