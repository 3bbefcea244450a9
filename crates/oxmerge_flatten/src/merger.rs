use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, info, trace};
use oxmerge_core::{
    CANDIDATE_EXTENSIONS, MergeError, OUTPUT_LANGUAGE, OxcAnalyzer, Resolution, ResolveCache,
    ResolvedOptions, SyntaxAnalyzer, UnownedFilePolicy, load_config_set, locate_nearest_config,
    resolve, select_options_for_file, strip_statements,
};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::{config::normalize_start, types::MergeResult};

/// Merges `start_path` and everything it reaches through local imports.
///
/// Fails with [`MergeError::ConfigurationNotFound`] before reading any file
/// when no tsconfig.json exists above `start_path`.
pub fn merge_from(start_path: &Path, policy: UnownedFilePolicy) -> Result<MergeResult> {
    merge_from_with(start_path, policy, &OxcAnalyzer)
}

/// [`merge_from`] with a caller-supplied parser.
pub fn merge_from_with<A: SyntaxAnalyzer>(
    start_path: &Path,
    policy: UnownedFilePolicy,
    analyzer: &A,
) -> Result<MergeResult> {
    let start = normalize_start(start_path)?;
    info!("Merging from {}", start.display());

    let config_path = locate_nearest_config(&start)
        .ok_or_else(|| MergeError::ConfigurationNotFound { start: start.clone() })?;
    let config_set = load_config_set(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    debug!("Loaded {} with {} references", config_path.display(), config_set.references.len());

    let options = select_options_for_file(&start, &config_set, policy);
    info!("Using options from {}", options.config_path.display());

    GraphMerger::new(options, analyzer).merge(&start)
}

/// Depth-first merge over the local import graph with one fixed set of options.
pub struct GraphMerger<'a, A: SyntaxAnalyzer> {
    options: &'a ResolvedOptions,
    analyzer: &'a A,
    resolve_cache: ResolveCache,
}

impl<'a, A: SyntaxAnalyzer> GraphMerger<'a, A> {
    pub fn new(options: &'a ResolvedOptions, analyzer: &'a A) -> Self {
        Self { options, analyzer, resolve_cache: DashMap::new() }
    }

    pub fn merge(&self, start: &Path) -> Result<MergeResult> {
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut files = Vec::new();
        let content = self.visit(start, &mut visited, &mut files)?;

        info!("Merged {} files from {}", files.len(), start.display());
        debug!("Resolution cache holds {} entries", self.resolve_cache.len());
        Ok(MergeResult { content, language: OUTPUT_LANGUAGE, files })
    }

    /// Returns this file's header and stripped body followed by the
    /// contributions of its local imports, in source order.
    fn visit(
        &self,
        file_path: &Path,
        visited: &mut HashSet<PathBuf>,
        files: &mut Vec<PathBuf>,
    ) -> Result<String> {
        // Marked before recursing so cycles terminate
        if !visited.insert(file_path.to_path_buf()) {
            trace!("Already merged: {}", file_path.display());
            return Ok(String::new());
        }

        let Some(actual) = find_actual_file(file_path) else {
            debug!("No file at {}, nothing to merge", file_path.display());
            return Ok(String::new());
        };
        if actual != file_path && !visited.insert(actual.clone()) {
            trace!("Already merged: {}", actual.display());
            return Ok(String::new());
        }

        trace!("Visiting module: {}", actual.display());
        let text = read_source(&actual)?;

        let mut merged = provenance_header(&actual);
        files.push(actual.clone());

        // JSON modules are data: emitted verbatim, no outgoing edges
        if is_json_module(&actual) {
            trace!("Emitting JSON module as-is: {}", actual.display());
            merged.push_str(&text);
            return Ok(merged);
        }

        let syntax = self.analyzer.parse(&actual, &text)?;
        merged.push_str(&strip_statements(&text, &syntax.extract_statement_ranges()));

        for specifier in syntax.extract_specifiers() {
            match resolve(&specifier, &actual, self.options, &self.resolve_cache)? {
                Resolution::Local(next) => {
                    let child = self.visit(&next, visited, files)?;
                    if !child.is_empty() {
                        merged.push_str("\n\n");
                        merged.push_str(&child);
                    }
                }
                Resolution::External(p) => {
                    trace!("Skipping external '{}' ({})", specifier, p.display());
                }
                Resolution::Unresolved => {
                    trace!("Could not resolve import: '{}'", specifier);
                }
            }
        }

        Ok(merged)
    }
}

/// The marker line placed before each merged file's body.
pub fn provenance_header(path: &Path) -> String {
    format!("// ========== SOURCE FILE: {} ==========\n\n", path.display())
}

/// Reads a source file, replacing invalid UTF-8 sequences instead of failing.
fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!("{} is not valid UTF-8, decoding lossily", path.display());
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    })
}

fn is_json_module(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// The exact path if it is a file, else the first of [`CANDIDATE_EXTENSIONS`]
/// appended to it that is.
fn find_actual_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut candidate = path.as_os_str().to_os_string();
            candidate.push(ext);
            PathBuf::from(candidate)
        })
        .find(|candidate| candidate.is_file())
}
