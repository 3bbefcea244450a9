//! Core building blocks for oxmerge.
//!
//! This crate provides the pieces the merger is assembled from:
//! - Parsing the top-level import/export statements of JS/TS files
//! - Locating and loading tsconfig.json, its `extends` chain and project references
//! - Resolving module specifiers (relative, `paths` aliases, `baseUrl`, node_modules)
//! - Collecting the files a tsconfig claims

mod collector;
mod config;
mod constants;
mod error;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use config::{load_config_set, locate_nearest_config, select_options_for_file};
pub use constants::{CANDIDATE_EXTENSIONS, OUTPUT_LANGUAGE};
pub use error::MergeError;
pub use parser::{
    ModuleStatement, ModuleSyntax, OxcAnalyzer, StatementKind, SyntaxAnalyzer, strip_statements,
};
pub use resolver::{ResolveCache, resolve};
pub use types::{
    ConfigSet, ModuleResolution, PathAlias, ProjectConfig, Resolution, ResolvedOptions,
    UnownedFilePolicy,
};
