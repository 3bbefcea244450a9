use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{
    constants::{EXTERNAL_DIRS, INDEX_FILES, JS_TO_TS_EXTENSIONS, RESOLVE_EXTENSIONS},
    types::{ModuleResolution, PathAlias, Resolution, ResolvedOptions},
};

/// Resolutions keyed by (containing directory, specifier). Lives for one merge.
pub type ResolveCache = DashMap<(PathBuf, String), Resolution>;

const CLASSIC_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];
const CLASSIC_JS_EXTENSIONS: &[&str] = &[".js", ".jsx"];

type Loader<'a> = &'a dyn Fn(&Path) -> Option<PathBuf>;

/// Resolves `specifier` as written in `containing_file` the way the TypeScript
/// compiler would under `options`.
///
/// Anything that lands inside a third-party package directory comes back as
/// [`Resolution::External`], even though a file was found.
pub fn resolve(
    specifier: &str,
    containing_file: &Path,
    options: &ResolvedOptions,
    cache: &ResolveCache,
) -> Result<Resolution> {
    let dir = containing_file.parent().unwrap_or(Path::new("/"));
    let key = (dir.to_path_buf(), specifier.to_string());
    if let Some(v) = cache.get(&key) {
        trace!("Cache hit for resolve: '{}' from {}", specifier, containing_file.display());
        return Ok(v.clone());
    }
    trace!("Resolving: '{}' from {}", specifier, containing_file.display());

    let found = match options.module_resolution {
        ModuleResolution::Classic => resolve_classic(dir, specifier, options),
        _ => resolve_node(dir, specifier, options),
    };

    let resolution = match found {
        None => {
            trace!("Failed to resolve '{}'", specifier);
            Resolution::Unresolved
        }
        Some(path) => {
            let path =
                if options.preserve_symlinks { path } else { path.canonicalize().unwrap_or(path) };
            if is_external(&path) {
                trace!("'{}' resolved into a package directory: {}", specifier, path.display());
                Resolution::External(path)
            } else {
                debug!("Resolved '{}' to {}", specifier, path.display());
                Resolution::Local(path)
            }
        }
    };

    cache.insert(key, resolution.clone());
    Ok(resolution)
}

/// True when any component of `path` is a third-party package directory.
pub(crate) fn is_external(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => EXTERNAL_DIRS.iter().any(|d| name == *d),
        _ => false,
    })
}

fn is_path_like(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
}

fn resolve_node(dir: &Path, specifier: &str, options: &ResolvedOptions) -> Option<PathBuf> {
    let load = |p: &Path| load_file_or_directory(p, options);
    if is_path_like(specifier) {
        trace!("Resolving as relative import: '{}'", specifier);
        return load(&clean(dir.join(specifier)));
    }

    resolve_with_settings(specifier, options, &load)
        .or_else(|| resolve_node_module_from_dir(dir, specifier, options))
}

/// `paths`, then `baseUrl`, for a non-relative specifier.
fn resolve_with_settings(
    specifier: &str,
    options: &ResolvedOptions,
    load: Loader<'_>,
) -> Option<PathBuf> {
    resolve_with_paths(specifier, options, load).or_else(|| {
        let base_url = options.base_url.as_ref()?;
        trace!("Trying baseUrl {} for '{}'", base_url.display(), specifier);
        load(&clean(base_url.join(specifier)))
    })
}

fn resolve_with_paths(
    specifier: &str,
    options: &ResolvedOptions,
    load: Loader<'_>,
) -> Option<PathBuf> {
    let (alias, captured) = match_alias(specifier, &options.paths)?;
    trace!("Matched alias '{}' for request '{}'", alias.pattern, specifier);

    for substitution in &alias.substitutions {
        let target = substitution.replacen('*', captured, 1);
        let candidate = clean(options.paths_base.join(&target));
        if let Some(resolved) = load(&candidate) {
            trace!("Resolved alias '{}' to {:?}", alias.pattern, resolved);
            return Some(resolved);
        }
    }
    None
}

/// Finds the `paths` entry for `specifier`: an exact pattern wins, otherwise
/// the wildcard pattern with the longest prefix. Returns the alias and the
/// text matched by `*`.
fn match_alias<'a>(specifier: &'a str, aliases: &'a [PathAlias]) -> Option<(&'a PathAlias, &'a str)> {
    if let Some(exact) = aliases.iter().find(|a| a.pattern == specifier) {
        return Some((exact, ""));
    }

    let mut best: Option<(&PathAlias, &str, usize)> = None;
    for alias in aliases {
        let Some((prefix, suffix)) = alias.pattern.split_once('*') else {
            continue;
        };
        if specifier.len() >= prefix.len() + suffix.len()
            && specifier.starts_with(prefix)
            && specifier.ends_with(suffix)
            && best.is_none_or(|(_, _, len)| prefix.len() > len)
        {
            let captured = &specifier[prefix.len()..specifier.len() - suffix.len()];
            best = Some((alias, captured, prefix.len()));
        }
    }
    best.map(|(alias, captured, _)| (alias, captured))
}

fn load_file_or_directory(candidate: &Path, options: &ResolvedOptions) -> Option<PathBuf> {
    load_as_file(candidate, options).or_else(|| load_as_directory(candidate, options))
}

fn load_as_file(p: &Path, options: &ResolvedOptions) -> Option<PathBuf> {
    let text = p.to_string_lossy();

    if let Some(source) = rewrite_js_extension(&text, None) {
        return Some(source);
    }

    // Try exact path first
    if p.is_file() && has_known_extension(&text, options) {
        return Some(p.to_path_buf());
    }

    // Try adding extensions
    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}{}", text, ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    if options.resolve_json_module {
        let candidate = PathBuf::from(format!("{}.json", text));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}

/// `./util.js` may name `./util.ts`. `allowed` limits the replacement
/// extensions tried.
fn rewrite_js_extension(text: &str, allowed: Option<&[&str]>) -> Option<PathBuf> {
    for (written, replacements) in JS_TO_TS_EXTENSIONS {
        let Some(stem) = text.strip_suffix(written) else {
            continue;
        };
        for ext in *replacements {
            if allowed.is_some_and(|allowed| !allowed.contains(ext)) {
                continue;
            }
            let candidate = PathBuf::from(format!("{}{}", stem, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn has_known_extension(text: &str, options: &ResolvedOptions) -> bool {
    RESOLVE_EXTENSIONS.iter().any(|ext| text.ends_with(ext))
        || (options.resolve_json_module && text.ends_with(".json"))
}

fn load_as_directory(dir: &Path, options: &ResolvedOptions) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    if let Some(pkg) = read_package_json(dir) {
        for field in ["typings", "types", "main"] {
            if let Some(entry) = pkg.get(field).and_then(|x| x.as_str()) {
                let target = clean(dir.join(entry));
                if let Some(resolved) = load_as_file(&target, options)
                    .or_else(|| load_index(&target))
                {
                    return Some(resolved);
                }
            }
        }
    }

    load_index(dir)
}

fn load_index(dir: &Path) -> Option<PathBuf> {
    INDEX_FILES.iter().map(|index_file| dir.join(index_file)).find(|p| p.is_file())
}

fn read_package_json(dir: &Path) -> Option<Value> {
    let pkg_json = dir.join("package.json");
    let txt = fs::read_to_string(&pkg_json).ok()?;
    match serde_json::from_str::<Value>(&txt) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Ignoring unreadable {}: {}", pkg_json.display(), e);
            None
        }
    }
}

/// Splits `@scope/pkg/sub/path` into (`@scope/pkg`, `sub/path`).
fn split_package_name(specifier: &str) -> (&str, &str) {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut end = 0;
    for (i, _) in specifier.match_indices('/') {
        end += 1;
        if end == segments {
            return (&specifier[..i], &specifier[i + 1..]);
        }
    }
    (specifier, "")
}

fn resolve_node_module_from_dir(
    start_dir: &Path,
    specifier: &str,
    options: &ResolvedOptions,
) -> Option<PathBuf> {
    trace!("Walking up from {:?} to find node_modules for '{}'", start_dir, specifier);
    let (pkg, subpath) = split_package_name(specifier);
    // @types/scope__pkg for scoped packages
    let types_pkg = pkg.strip_prefix('@').map(|s| s.replace('/', "__")).unwrap_or(pkg.to_string());

    for dir in start_dir.ancestors() {
        let nm = dir.join("node_modules");
        if !nm.is_dir() {
            continue;
        }
        if let Some(resolved) = resolve_package(&nm.join(pkg), subpath, options)
            .or_else(|| resolve_package(&nm.join("@types").join(&types_pkg), subpath, options))
        {
            return Some(resolved);
        }
    }

    None
}

fn resolve_package(pkg_dir: &Path, subpath: &str, options: &ResolvedOptions) -> Option<PathBuf> {
    if !pkg_dir.exists() {
        trace!("node_modules path does not exist: {:?}", pkg_dir);
        return None;
    }
    trace!("Checking node_modules at: {:?}", pkg_dir);

    if options.module_resolution.uses_exports()
        && let Some(exports) = read_package_json(pkg_dir).and_then(|v| v.get("exports").cloned())
    {
        // An exports map is authoritative: no fallback to main or deep paths
        return resolve_exports(pkg_dir, &exports, subpath, options);
    }

    if subpath.is_empty() {
        load_as_directory(pkg_dir, options)
    } else {
        load_file_or_directory(&clean(pkg_dir.join(subpath)), options)
    }
}

fn resolve_exports(
    pkg_dir: &Path,
    exports: &Value,
    subpath: &str,
    options: &ResolvedOptions,
) -> Option<PathBuf> {
    let key = if subpath.is_empty() { ".".to_string() } else { format!("./{}", subpath) };

    let is_subpath_map =
        exports.as_object().is_some_and(|obj| obj.keys().all(|k| k.starts_with('.')));
    if !is_subpath_map {
        // Bare string, array, or conditions object: all describe "."
        return if key == "." { resolve_export_target(pkg_dir, exports, "", options) } else { None };
    }

    let map = exports.as_object()?;
    if let Some(target) = map.get(&key) {
        return resolve_export_target(pkg_dir, target, "", options);
    }

    // "./*" style patterns, longest prefix first
    let mut patterns: Vec<(&String, &Value)> =
        map.iter().filter(|(k, _)| k.contains('*')).collect();
    patterns.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
    for (pattern, target) in patterns {
        if let Some((prefix, suffix)) = pattern.split_once('*')
            && key.len() >= prefix.len() + suffix.len()
            && key.starts_with(prefix)
            && key.ends_with(suffix)
        {
            let captured = &key[prefix.len()..key.len() - suffix.len()];
            return resolve_export_target(pkg_dir, target, captured, options);
        }
    }

    None
}

fn resolve_export_target(
    pkg_dir: &Path,
    target: &Value,
    captured: &str,
    options: &ResolvedOptions,
) -> Option<PathBuf> {
    match target {
        Value::String(s) => {
            let p = clean(pkg_dir.join(s.replacen('*', captured, 1).trim_start_matches("./")));
            load_file_or_directory(&p, options)
        }
        Value::Array(items) => {
            items.iter().find_map(|t| resolve_export_target(pkg_dir, t, captured, options))
        }
        Value::Object(conditions) => {
            // Prefer types, then import, then require, then default
            ["types", "import", "require", "default"].iter().find_map(|key| {
                conditions
                    .get(*key)
                    .and_then(|t| resolve_export_target(pkg_dir, t, captured, options))
            })
        }
        _ => None,
    }
}

/// Classic resolution only ever loads files: no package.json, no index
/// files. Every TypeScript candidate is tried before any JavaScript one.
fn resolve_classic(dir: &Path, specifier: &str, options: &ResolvedOptions) -> Option<PathBuf> {
    trace!("Classic lookup for '{}' from {:?}", specifier, dir);
    let typescript = |p: &Path| load_classic_file(p, CLASSIC_EXTENSIONS, false);
    let javascript =
        |p: &Path| load_classic_file(p, CLASSIC_JS_EXTENSIONS, options.resolve_json_module);

    resolve_classic_pass(dir, specifier, options, &typescript)
        .or_else(|| {
            if is_path_like(specifier) { None } else { resolve_types_package(dir, specifier, options) }
        })
        .or_else(|| resolve_classic_pass(dir, specifier, options, &javascript))
}

fn resolve_classic_pass(
    dir: &Path,
    specifier: &str,
    options: &ResolvedOptions,
    load: Loader<'_>,
) -> Option<PathBuf> {
    if is_path_like(specifier) {
        return load(&clean(dir.join(specifier)));
    }

    resolve_with_settings(specifier, options, load)
        .or_else(|| dir.ancestors().find_map(|ancestor| load(&clean(ancestor.join(specifier)))))
}

fn load_classic_file(p: &Path, extensions: &[&str], allow_json: bool) -> Option<PathBuf> {
    let text = p.to_string_lossy();

    let exact = extensions.iter().any(|ext| text.ends_with(ext))
        || (allow_json && text.ends_with(".json"));
    if exact && p.is_file() {
        return Some(p.to_path_buf());
    }
    if let Some(source) = rewrite_js_extension(&text, Some(extensions)) {
        return Some(source);
    }

    extensions
        .iter()
        .map(|ext| PathBuf::from(format!("{}{}", text, ext)))
        .find(|candidate| candidate.is_file())
}

/// Classic still consults `node_modules/@types`.
fn resolve_types_package(dir: &Path, specifier: &str, options: &ResolvedOptions) -> Option<PathBuf> {
    let (pkg, subpath) = split_package_name(specifier);
    dir.ancestors().find_map(|ancestor| {
        let types_dir = ancestor.join("node_modules").join("@types");
        if types_dir.is_dir() { resolve_package(&types_dir.join(pkg), subpath, options) } else { None }
    })
}
