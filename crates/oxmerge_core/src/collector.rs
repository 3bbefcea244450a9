use anyhow::{Context, Result};
use ignore::{
    WalkBuilder,
    gitignore::{Gitignore, GitignoreBuilder},
};
use log::{debug, trace};
use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

use crate::{
    config::LoadedConfig,
    constants::{DEFAULT_EXCLUDES, JS_SOURCE_EXTENSIONS, TS_SOURCE_EXTENSIONS},
};

/// Collects the files a tsconfig claims: its `files` list plus everything
/// matched by `include` and not matched by `exclude`.
pub(crate) fn collect_owned_files(
    config_path: &Path,
    loaded: &LoadedConfig,
) -> Result<HashSet<PathBuf>> {
    let config_dir = config_path.parent().unwrap_or(Path::new("/"));
    debug!("Collecting files owned by {}", config_path.display());

    let mut owned: HashSet<PathBuf> = HashSet::new();
    if let Some(files) = &loaded.files {
        trace!("Adding {} explicit files", files.len());
        owned.extend(files.iter().cloned());
    }

    let include = match (&loaded.include, &loaded.files) {
        (Some(include), _) => include.clone(),
        // Only an explicit `files` list switches the default include off
        (None, Some(_)) => Vec::new(),
        (None, None) => vec![config_dir.join("**/*").to_string_lossy().to_string()],
    };
    if include.is_empty() {
        return Ok(owned);
    }

    let exclude = match &loaded.exclude {
        Some(exclude) => exclude.clone(),
        None => {
            let mut defaults: Vec<String> = DEFAULT_EXCLUDES
                .iter()
                .map(|d| config_dir.join("**").join(d).to_string_lossy().to_string())
                .collect();
            if let Some(out_dir) = &loaded.out_dir {
                defaults.push(out_dir.to_string_lossy().to_string());
            }
            defaults
        }
    };

    let allow_js = loaded.allow_js.unwrap_or(false);
    let excluded = build_matcher(&exclude)
        .with_context(|| format!("Invalid exclude pattern in {}", config_path.display()))?;

    for pattern in &include {
        let (base, rest) = split_pattern(pattern);
        if rest.is_empty() {
            // A literal path: a single file, or a directory meaning everything below it
            if base.is_file() {
                if is_source_file(&base, allow_js) && !is_excluded(&excluded, &base, false) {
                    owned.insert(base);
                }
                continue;
            }
            walk_matching(&base, "**/*", &excluded, allow_js, &mut owned)?;
        } else {
            walk_matching(&base, &rest, &excluded, allow_js, &mut owned)?;
        }
    }

    Ok(owned)
}

/// Splits an absolute glob into the longest wildcard-free directory prefix and
/// the remaining relative pattern. A final segment with neither a wildcard nor
/// an extension names a directory, as in tsconfig.
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let is_wild = |s: &str| s.contains(['*', '?', '[']);
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy().to_string();
        match component {
            Component::Normal(_) if !rest.is_empty() || is_wild(&text) => rest.push(text),
            _ => base.push(component.as_os_str()),
        }
    }

    if let Some(last) = rest.last()
        && !is_wild(last)
        && !last.contains('.')
    {
        rest.push("**".to_string());
        rest.push("*".to_string());
    }

    (base, rest.join("/"))
}

fn walk_matching(
    base: &Path,
    relative_glob: &str,
    excluded: &Gitignore,
    allow_js: bool,
    owned: &mut HashSet<PathBuf>,
) -> Result<()> {
    if !base.is_dir() {
        trace!("Include base does not exist: {}", base.display());
        return Ok(());
    }

    let anchored = format!("{}/{}", base.to_string_lossy().trim_end_matches('/'), relative_glob);
    let included = build_matcher(&[anchored])?;
    trace!("Walking {} for '{}'", base.display(), relative_glob);

    let prune = excluded.clone();
    let walker = WalkBuilder::new(base)
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !is_excluded(&prune, entry.path(), is_dir)
        })
        .build();

    for res in walker {
        // Unreadable entries are skipped, not fatal
        let dent = match res {
            Ok(dent) => dent,
            Err(err) => {
                debug!("Skipping unreadable entry under {}: {}", base.display(), err);
                continue;
            }
        };
        let p = dent.path();
        if !p.is_file() || !is_source_file(p, allow_js) {
            continue;
        }
        if included.matched(p, false).is_ignore() {
            owned.insert(p.to_path_buf());
        }
    }

    Ok(())
}

/// Matcher over absolute patterns. `ignore`'s gitignore globs are reused for
/// tsconfig globs: a match is reported as `Match::Ignore`.
fn build_matcher(patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new("/");
    for pattern in patterns {
        builder.add_line(None, pattern)?;
    }
    Ok(builder.build()?)
}

fn is_excluded(excluded: &Gitignore, path: &Path, is_dir: bool) -> bool {
    path.has_root() && excluded.matched_path_or_any_parents(path, is_dir).is_ignore()
}

fn is_source_file(path: &Path, allow_js: bool) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            TS_SOURCE_EXTENSIONS.contains(&ext) || (allow_js && JS_SOURCE_EXTENSIONS.contains(&ext))
        }
        None => false,
    }
}
