use anyhow::Result;
use log::{debug, info};

use crate::{config::Config, merger::merge_from, types::MergeResult};

pub fn run_flatten(cfg: Config) -> Result<MergeResult> {
    info!("Starting flatten of {}", cfg.file.display());
    debug!("Unowned file policy: {}", cfg.unowned);

    let start = cfg.start_path()?;
    let result = merge_from(&start, cfg.unowned)?;

    if result.files.is_empty() {
        info!("Nothing to merge at {}", start.display());
    } else {
        info!("Flatten complete. Merged {} files", result.files_merged());
    }
    debug!("Merged document is {} bytes", result.content.len());

    Ok(result)
}
