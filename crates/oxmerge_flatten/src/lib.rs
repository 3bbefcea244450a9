//! Flattens a TypeScript/JavaScript file and its local imports into one document.
//!
//! Starting from a file, the nearest tsconfig.json (with its `extends` chain and
//! project references) decides how imports resolve. Every reachable local file is
//! emitted once, in depth-first pre-order, with its import and re-export
//! statements removed and a provenance header in front. Anything resolving into
//! `node_modules` is left out.
//!
//! # Examples
//!
//! ```no_run
//! use oxmerge_flatten::{Config, run_flatten};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     file: std::path::PathBuf::from("src/index.ts"),
//!     output: None,
//!     unowned: Default::default(),
//!     list_files: false,
//! };
//!
//! let result = run_flatten(cfg)?;
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! oxmerge_flatten::write_merged(&mut stdout, &result)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod flatten;
mod merger;
mod reporter;
mod types;

// Re-export public API
pub use config::Config;
pub use flatten::run_flatten;
pub use merger::{GraphMerger, merge_from, merge_from_with, provenance_header};
pub use reporter::{print_config_warning, print_summary, write_merged};
pub use types::MergeResult;
