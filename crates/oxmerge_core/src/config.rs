use anyhow::{Context, Result};
use log::{debug, trace, warn};
use path_clean::clean;
use rayon::prelude::*;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    collector::collect_owned_files,
    constants::CONFIG_FILE_NAME,
    error::MergeError,
    types::{
        ConfigSet, ModuleResolution, PathAlias, ProjectConfig, ResolvedOptions, UnownedFilePolicy,
    },
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extends: Option<RawExtends>,
    #[serde(default)]
    references: Vec<RawReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
    module_resolution: Option<String>,
    module: Option<String>,
    target: Option<String>,
    preserve_symlinks: Option<bool>,
    allow_js: Option<bool>,
    resolve_json_module: Option<bool>,
    out_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExtends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawReference {
    path: String,
}

/// A tsconfig after its `extends` chain has been applied. Every path is
/// absolute, anchored at the config file that declared it.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoadedConfig {
    pub(crate) base_url: Option<PathBuf>,
    /// Aliases and the directory of the config that declared them
    pub(crate) paths: Option<(Vec<PathAlias>, PathBuf)>,
    pub(crate) module_resolution: Option<String>,
    pub(crate) module: Option<String>,
    pub(crate) target: Option<String>,
    pub(crate) preserve_symlinks: Option<bool>,
    pub(crate) allow_js: Option<bool>,
    pub(crate) resolve_json_module: Option<bool>,
    pub(crate) out_dir: Option<PathBuf>,
    pub(crate) files: Option<Vec<PathBuf>>,
    /// Absolute glob patterns
    pub(crate) include: Option<Vec<String>>,
    pub(crate) exclude: Option<Vec<String>>,
    /// Declared by this config only; references are never inherited
    pub(crate) references: Vec<String>,
}

impl LoadedConfig {
    /// Applies `other` on top of `self`: anything `other` sets wins.
    fn overlay(mut self, other: LoadedConfig) -> LoadedConfig {
        self.base_url = other.base_url.or(self.base_url);
        self.paths = other.paths.or(self.paths);
        self.module_resolution = other.module_resolution.or(self.module_resolution);
        self.module = other.module.or(self.module);
        self.target = other.target.or(self.target);
        self.preserve_symlinks = other.preserve_symlinks.or(self.preserve_symlinks);
        self.allow_js = other.allow_js.or(self.allow_js);
        self.resolve_json_module = other.resolve_json_module.or(self.resolve_json_module);
        self.out_dir = other.out_dir.or(self.out_dir);
        self.files = other.files.or(self.files);
        self.include = other.include.or(self.include);
        self.exclude = other.exclude.or(self.exclude);
        self.references = other.references;
        self
    }

    fn to_options(&self, config_path: &Path) -> ResolvedOptions {
        let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let module_resolution = match self.module_resolution.as_deref() {
            Some(value) => ModuleResolution::from_option(value).unwrap_or_else(|| {
                warn!("Unknown moduleResolution '{}' in {}", value, config_path.display());
                ModuleResolution::default_for_module(self.module.as_deref(), self.target.as_deref())
            }),
            None => ModuleResolution::default_for_module(
                self.module.as_deref(),
                self.target.as_deref(),
            ),
        };

        let (paths, paths_dir) = match &self.paths {
            Some((aliases, dir)) => (aliases.clone(), dir.clone()),
            None => (Vec::new(), config_dir),
        };
        // Substitutions are relative to baseUrl when one is set
        let paths_base = self.base_url.clone().unwrap_or(paths_dir);

        ResolvedOptions {
            config_path: config_path.to_path_buf(),
            base_url: self.base_url.clone(),
            paths,
            paths_base,
            module_resolution,
            preserve_symlinks: self.preserve_symlinks.unwrap_or(false),
            resolve_json_module: self.resolve_json_module.unwrap_or(false),
        }
    }
}

/// Walks up from the directory containing `start_path` and returns the first
/// tsconfig.json found.
pub fn locate_nearest_config(start_path: &Path) -> Option<PathBuf> {
    debug!("Searching for {} above {}", CONFIG_FILE_NAME, start_path.display());
    let mut current_dir = start_path.parent()?;

    loop {
        let candidate = current_dir.join(CONFIG_FILE_NAME);
        trace!("Checking for {} at: {:?}", CONFIG_FILE_NAME, candidate);
        if candidate.is_file() {
            debug!("Found {} at: {:?}", CONFIG_FILE_NAME, candidate);
            return Some(candidate);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent,
            None => {
                debug!("Could not find {} in any parent folder", CONFIG_FILE_NAME);
                return None;
            }
        }
    }
}

/// Loads the config at `config_path` and its direct project references.
///
/// References whose target does not exist are skipped. A reference's own
/// references are not followed.
pub fn load_config_set(config_path: &Path) -> Result<ConfigSet> {
    debug!("Loading config set from {}", config_path.display());
    let config_path = clean(config_path);
    let (root, loaded) = load_project(&config_path)?;

    let config_dir = config_path.parent().unwrap_or(Path::new("/"));
    let reference_paths: Vec<PathBuf> = loaded
        .references
        .iter()
        .filter_map(|reference| {
            let target = reference_target(config_dir, reference);
            if target.is_none() {
                debug!("Skipping missing project reference '{}'", reference);
            }
            target
        })
        .collect();

    debug!("Loading {} project references", reference_paths.len());
    let references = reference_paths
        .par_iter()
        .map(|path| load_project(path).map(|(project, _)| project))
        .collect::<Result<Vec<_>>>()?;

    Ok(ConfigSet { root_config_path: config_path, root, references })
}

/// Picks the options that apply to `file_path`: the root's if it owns the
/// file, else the first reference (in declaration order) that does, else
/// whatever `policy` says.
pub fn select_options_for_file<'a>(
    file_path: &Path,
    config_set: &'a ConfigSet,
    policy: UnownedFilePolicy,
) -> &'a ResolvedOptions {
    let file = clean(file_path);

    if config_set.root.owns(&file) {
        trace!("{} is owned by the root config", file.display());
        return &config_set.root.options;
    }
    if let Some(reference) = config_set.references.iter().find(|r| r.owns(&file)) {
        debug!("{} is owned by {}", file.display(), reference.config_path.display());
        return &reference.options;
    }

    debug!("No config claims {}, falling back to {} policy", file.display(), policy);
    match policy {
        UnownedFilePolicy::Root => &config_set.root.options,
        UnownedFilePolicy::Nearest => {
            let mut best = &config_set.root;
            for candidate in &config_set.references {
                let deeper =
                    candidate.dir().components().count() > best.dir().components().count();
                if file.starts_with(candidate.dir()) && (deeper || !file.starts_with(best.dir())) {
                    best = candidate;
                }
            }
            &best.options
        }
    }
}

fn load_project(config_path: &Path) -> Result<(ProjectConfig, LoadedConfig)> {
    let mut chain = Vec::new();
    let loaded = load_with_extends(config_path, &mut chain)?;
    let options = loaded.to_options(config_path);
    let owned_files = collect_owned_files(config_path, &loaded)?;
    debug!("{} owns {} files", config_path.display(), owned_files.len());

    Ok((ProjectConfig { config_path: config_path.to_path_buf(), options, owned_files }, loaded))
}

fn reference_target(config_dir: &Path, reference: &str) -> Option<PathBuf> {
    let target = clean(config_dir.join(reference));
    if target.is_dir() {
        let nested = target.join(CONFIG_FILE_NAME);
        return nested.is_file().then_some(nested);
    }
    target.is_file().then_some(target)
}

fn load_with_extends(config_path: &Path, chain: &mut Vec<PathBuf>) -> Result<LoadedConfig> {
    if chain.iter().any(|p| p == config_path) {
        return Err(MergeError::ExtendsCycle { path: config_path.to_path_buf() }.into());
    }
    chain.push(config_path.to_path_buf());

    let raw = read_raw_config(config_path)?;
    let dir = config_path.parent().unwrap_or(Path::new("/"));

    let bases = match &raw.extends {
        Some(RawExtends::One(s)) => vec![s.clone()],
        Some(RawExtends::Many(v)) => v.clone(),
        None => Vec::new(),
    };

    let mut merged = LoadedConfig::default();
    for base in &bases {
        let base_path = resolve_extends(dir, base).ok_or_else(|| MergeError::ExtendsNotFound {
            path: config_path.to_path_buf(),
            extends: base.clone(),
        })?;
        trace!("{} extends {}", config_path.display(), base_path.display());
        let loaded = load_with_extends(&base_path, chain)?;
        merged = merged.overlay(loaded);
    }

    chain.pop();
    Ok(merged.overlay(layer_from_raw(raw, dir)))
}

fn layer_from_raw(raw: RawTsConfig, dir: &Path) -> LoadedConfig {
    let anchor = |p: &str| clean(dir.join(p));
    let anchor_pattern = |p: &String| anchor(p.as_str()).to_string_lossy().to_string();
    let opts = raw.compiler_options;

    let paths = opts.paths.map(|table| {
        let aliases = table
            .into_iter()
            .map(|(pattern, substitutions)| {
                trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, substitutions);
                PathAlias { pattern, substitutions }
            })
            .collect();
        (aliases, dir.to_path_buf())
    });

    LoadedConfig {
        base_url: opts.base_url.as_deref().map(anchor),
        paths,
        module_resolution: opts.module_resolution,
        module: opts.module,
        target: opts.target,
        preserve_symlinks: opts.preserve_symlinks,
        allow_js: opts.allow_js,
        resolve_json_module: opts.resolve_json_module,
        out_dir: opts.out_dir.as_deref().map(anchor),
        files: raw.files.map(|files| files.iter().map(|f| anchor(f.as_str())).collect()),
        include: raw.include.map(|v| v.iter().map(anchor_pattern).collect()),
        exclude: raw.exclude.map(|v| v.iter().map(anchor_pattern).collect()),
        references: raw.references.into_iter().map(|r| r.path).collect(),
    }
}

/// Finds the file named by an `extends` entry: a path relative to the config,
/// or a package in a `node_modules` directory above it.
fn resolve_extends(dir: &Path, extends: &str) -> Option<PathBuf> {
    let candidates_for = |base: PathBuf| {
        let mut with_json = base.clone().into_os_string();
        with_json.push(".json");
        [base.clone(), PathBuf::from(with_json), base.join(CONFIG_FILE_NAME)]
    };

    if extends.starts_with('.') || Path::new(extends).is_absolute() {
        return candidates_for(clean(dir.join(extends))).into_iter().find(|p| p.is_file());
    }

    dir.ancestors()
        .flat_map(|ancestor| candidates_for(ancestor.join("node_modules").join(extends)))
        .find(|p| p.is_file())
}

fn read_raw_config(config_path: &Path) -> Result<RawTsConfig> {
    trace!("Reading tsconfig at: {:?}", config_path);
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let normalized = strip_jsonc(&content);

    if normalized.trim().is_empty() {
        return Ok(RawTsConfig::default());
    }
    serde_json::from_str(&normalized).map_err(|source| {
        MergeError::MalformedConfig { path: config_path.to_path_buf(), source }.into()
    })
}

/// Turns tsconfig-flavored JSON into plain JSON: drops `//` and `/* */`
/// comments outside strings, trailing commas, and a leading BOM.
pub(crate) fn strip_jsonc(content: &str) -> String {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 1;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn canonical_root(temp_dir: &TempDir) -> PathBuf {
        // canonicalize can add a /private prefix on macOS
        temp_dir.path().canonicalize().unwrap()
    }

    #[test]
    fn test_locate_nearest_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(&root, "tsconfig.json", "{}");
        let file = create_test_file(&root, "src/components/deep/Button.tsx", "");

        assert_eq!(locate_nearest_config(&file), Some(tsconfig));
    }

    #[test]
    fn test_locate_prefers_closest_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        create_test_file(&root, "tsconfig.json", "{}");
        let nested = create_test_file(&root, "packages/app/tsconfig.json", "{}");
        let file = create_test_file(&root, "packages/app/src/index.ts", "");

        assert_eq!(locate_nearest_config(&file), Some(nested));
    }

    #[test]
    fn test_locate_ignores_directory_named_like_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(&root, "tsconfig.json", "{}");
        fs::create_dir_all(root.join("src/tsconfig.json")).unwrap();
        let file = create_test_file(&root, "src/a.ts", "");

        assert_eq!(locate_nearest_config(&file), Some(tsconfig));
    }

    #[test]
    fn test_locate_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let file = create_test_file(&root, "nested/deep/a.ts", "");

        assert_eq!(locate_nearest_config(&file), None);
    }

    #[test]
    fn test_strip_jsonc_comments_and_trailing_commas() {
        let content = r#"
{
  // This is a comment
  "compilerOptions": {
    /* block
       comment */
    "baseUrl": ".", // Another comment
    "paths": {
      "@/*": ["src/*"], // Path comment
    },
  },
}
"#;
        let json: serde_json::Value = serde_json::from_str(&strip_jsonc(content)).unwrap();
        assert_eq!(json["compilerOptions"]["baseUrl"], ".");
        assert_eq!(json["compilerOptions"]["paths"]["@/*"][0], "src/*");
    }

    #[test]
    fn test_strip_jsonc_keeps_slashes_in_strings() {
        let content = r#"{ "extends": "https://example.com//x", "a": "/* not a comment */", "b": "q\"//" }"#;
        let json: serde_json::Value = serde_json::from_str(&strip_jsonc(content)).unwrap();
        assert_eq!(json["extends"], "https://example.com//x");
        assert_eq!(json["a"], "/* not a comment */");
        assert_eq!(json["b"], "q\"//");
    }

    #[test]
    fn test_load_config_set_options() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{
  "compilerOptions": {
    "baseUrl": "src",
    "moduleResolution": "bundler",
    "paths": { "@components/*": ["components/*"] }
  }
}"#,
        );

        let set = load_config_set(&tsconfig).unwrap();
        let options = &set.root.options;
        assert_eq!(set.root_config_path, tsconfig);
        assert_eq!(options.base_url, Some(root.join("src")));
        assert_eq!(options.paths_base, root.join("src"));
        assert_eq!(options.module_resolution, ModuleResolution::Bundler);
        assert_eq!(options.paths.len(), 1);
        assert_eq!(options.paths[0].pattern, "@components/*");
        assert_eq!(options.paths[0].substitutions, vec!["components/*"]);
        assert!(set.references.is_empty());
    }

    #[test]
    fn test_paths_without_base_url_are_relative_to_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "paths": { "@/*": ["./src/*"] } } }"#,
        );

        let set = load_config_set(&tsconfig).unwrap();
        assert_eq!(set.root.options.base_url, None);
        assert_eq!(set.root.options.paths_base, root);
    }

    #[test]
    fn test_target_decides_resolution_when_module_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        create_test_file(&root, "base.json", r#"{ "compilerOptions": { "target": "ES2017" } }"#);
        let tsconfig = create_test_file(&root, "tsconfig.json", r#"{ "extends": "./base" }"#);
        let legacy = create_test_file(
            &root,
            "legacy/tsconfig.json",
            r#"{ "compilerOptions": { "target": "es5" } }"#,
        );

        let set = load_config_set(&tsconfig).unwrap();
        assert_eq!(set.root.options.module_resolution, ModuleResolution::Classic);

        let set = load_config_set(&legacy).unwrap();
        assert_eq!(set.root.options.module_resolution, ModuleResolution::Node10);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(&root, "tsconfig.json", "{ \"compilerOptions\": ");

        let err = load_config_set(&tsconfig).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::MalformedConfig { .. })
        ));
    }

    #[test]
    fn test_references_loaded_in_order_and_missing_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{
  "files": [],
  "references": [
    { "path": "./packages/b" },
    { "path": "./packages/missing" },
    { "path": "./packages/a/tsconfig.json" }
  ]
}"#,
        );
        let b = create_test_file(&root, "packages/b/tsconfig.json", "{}");
        let a = create_test_file(&root, "packages/a/tsconfig.json", "{}");

        let set = load_config_set(&tsconfig).unwrap();
        let paths: Vec<&PathBuf> = set.references.iter().map(|r| &r.config_path).collect();
        assert_eq!(paths, vec![&b, &a]);
    }

    #[test]
    fn test_references_are_one_level_deep() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{ "files": [], "references": [{ "path": "./a" }] }"#,
        );
        create_test_file(&root, "a/tsconfig.json", r#"{ "references": [{ "path": "../b" }] }"#);
        create_test_file(&root, "b/tsconfig.json", "{}");

        let set = load_config_set(&tsconfig).unwrap();
        assert_eq!(set.references.len(), 1);
        assert_eq!(set.references[0].config_path, root.join("a/tsconfig.json"));
    }

    #[test]
    fn test_reference_options_use_reference_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{ "files": [], "references": [{ "path": "./app" }] }"#,
        );
        create_test_file(&root, "app/tsconfig.json", r#"{ "compilerOptions": { "baseUrl": "." } }"#);

        let set = load_config_set(&tsconfig).unwrap();
        assert_eq!(set.references[0].options.base_url, Some(root.join("app")));
    }

    #[test]
    fn test_extends_relative_and_override() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        create_test_file(
            &root,
            "configs/base.json",
            r#"{ "compilerOptions": { "baseUrl": "..", "preserveSymlinks": true, "paths": { "@lib/*": ["lib/*"] } } }"#,
        );
        let tsconfig = create_test_file(
            &root,
            "tsconfig.json",
            r#"{ "extends": "./configs/base", "compilerOptions": { "preserveSymlinks": false } }"#,
        );

        let set = load_config_set(&tsconfig).unwrap();
        let options = &set.root.options;
        // baseUrl stays relative to the config that declared it
        assert_eq!(options.base_url, Some(root.clone()));
        assert!(!options.preserve_symlinks);
        assert_eq!(options.paths[0].pattern, "@lib/*");
    }

    #[test]
    fn test_extends_package_from_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        create_test_file(
            &root,
            "node_modules/@tsconfig/strictest/tsconfig.json",
            r#"{ "compilerOptions": { "moduleResolution": "node16" } }"#,
        );
        let tsconfig =
            create_test_file(&root, "tsconfig.json", r#"{ "extends": "@tsconfig/strictest" }"#);

        let set = load_config_set(&tsconfig).unwrap();
        assert_eq!(set.root.options.module_resolution, ModuleResolution::Node16);
    }

    #[test]
    fn test_extends_cycle_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        create_test_file(&root, "a.json", r#"{ "extends": "./tsconfig.json" }"#);
        let tsconfig = create_test_file(&root, "tsconfig.json", r#"{ "extends": "./a.json" }"#);

        let err = load_config_set(&tsconfig).unwrap_err();
        assert!(matches!(err.downcast_ref::<MergeError>(), Some(MergeError::ExtendsCycle { .. })));
    }

    #[test]
    fn test_extends_missing_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = canonical_root(&temp_dir);
        let tsconfig = create_test_file(&root, "tsconfig.json", r#"{ "extends": "./nope.json" }"#);

        let err = load_config_set(&tsconfig).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::ExtendsNotFound { .. })
        ));
    }

    fn project(dir: &Path, owned: &[&Path]) -> ProjectConfig {
        let config_path = dir.join(CONFIG_FILE_NAME);
        ProjectConfig {
            options: ResolvedOptions::defaults_for(&config_path),
            config_path,
            owned_files: owned.iter().map(|p| p.to_path_buf()).collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn test_select_options_for_file() {
        let a = Path::new("/repo/src/a.ts");
        let b = Path::new("/repo/packages/lib/b.ts");
        let c = Path::new("/repo/src/c.ts");
        let set = ConfigSet {
            root_config_path: PathBuf::from("/repo/tsconfig.json"),
            root: project(Path::new("/repo"), &[a, c]),
            references: vec![project(Path::new("/repo/packages/lib"), &[b])],
        };

        let root_opts = &set.root.options;
        let ref_opts = &set.references[0].options;
        assert_eq!(select_options_for_file(a, &set, UnownedFilePolicy::Root), root_opts);
        assert_eq!(select_options_for_file(b, &set, UnownedFilePolicy::Root), ref_opts);
        assert_eq!(
            select_options_for_file(Path::new("/repo/src/./c.ts"), &set, UnownedFilePolicy::Root),
            root_opts
        );
        // Owned by neither: root options
        let d = Path::new("/repo/packages/lib/new.ts");
        assert_eq!(select_options_for_file(d, &set, UnownedFilePolicy::Root), root_opts);
        // ... unless the nearest config is asked for
        assert_eq!(select_options_for_file(d, &set, UnownedFilePolicy::Nearest), ref_opts);
    }

    #[test]
    fn test_select_first_reference_wins() {
        let shared = Path::new("/repo/shared/x.ts");
        let set = ConfigSet {
            root_config_path: PathBuf::from("/repo/tsconfig.json"),
            root: project(Path::new("/repo"), &[]),
            references: vec![
                project(Path::new("/repo/one"), &[shared]),
                project(Path::new("/repo/two"), &[shared]),
            ],
        };

        let selected = select_options_for_file(shared, &set, UnownedFilePolicy::Root);
        assert_eq!(selected.config_path, PathBuf::from("/repo/one/tsconfig.json"));
    }

    #[test]
    fn test_select_nearest_outside_all_configs_uses_root() {
        let set = ConfigSet {
            root_config_path: PathBuf::from("/repo/tsconfig.json"),
            root: project(Path::new("/repo"), &[]),
            references: vec![project(Path::new("/repo/lib"), &[])],
        };

        let selected =
            select_options_for_file(Path::new("/elsewhere/x.ts"), &set, UnownedFilePolicy::Nearest);
        assert_eq!(selected, &set.root.options);
    }
}
