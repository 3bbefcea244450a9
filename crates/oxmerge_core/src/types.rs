use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// `compilerOptions.moduleResolution`, with TypeScript's spelling aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleResolution {
    Classic,
    Node10,
    Node16,
    NodeNext,
    Bundler,
}

impl ModuleResolution {
    /// Parses the option value case-insensitively; `node` is the old name of `node10`.
    pub fn from_option(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "classic" => Some(ModuleResolution::Classic),
            "node" | "node10" => Some(ModuleResolution::Node10),
            "node16" => Some(ModuleResolution::Node16),
            "nodenext" => Some(ModuleResolution::NodeNext),
            "bundler" => Some(ModuleResolution::Bundler),
            _ => None,
        }
    }

    /// The mode TypeScript picks when `moduleResolution` is absent, based on
    /// `module`. Without `module`, a `target` of ES2015 or later implies ES
    /// modules and with them Classic resolution.
    pub fn default_for_module(module: Option<&str>, target: Option<&str>) -> Self {
        match module.map(|m| m.to_ascii_lowercase()).as_deref() {
            None if targets_es_modules(target) => ModuleResolution::Classic,
            None | Some("commonjs") => ModuleResolution::Node10,
            Some("node16") => ModuleResolution::Node16,
            Some("nodenext") => ModuleResolution::NodeNext,
            Some("preserve") => ModuleResolution::Bundler,
            Some(_) => ModuleResolution::Classic,
        }
    }

    /// Whether `package.json` `exports` maps are honored.
    pub fn uses_exports(self) -> bool {
        matches!(
            self,
            ModuleResolution::Node16 | ModuleResolution::NodeNext | ModuleResolution::Bundler
        )
    }
}

fn targets_es_modules(target: Option<&str>) -> bool {
    match target.map(|t| t.to_ascii_lowercase()).as_deref() {
        None | Some("es3") | Some("es5") => false,
        Some(_) => true,
    }
}

/// One `compilerOptions.paths` entry. `pattern` holds at most one `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub substitutions: Vec<String>,
}

/// Resolution settings of one tsconfig, with every relative path already made
/// absolute against the config that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub config_path: PathBuf,
    pub base_url: Option<PathBuf>,
    pub paths: Vec<PathAlias>,
    /// Directory `paths` substitutions are relative to
    pub paths_base: PathBuf,
    pub module_resolution: ModuleResolution,
    pub preserve_symlinks: bool,
    pub resolve_json_module: bool,
}

impl ResolvedOptions {
    /// Options of an empty tsconfig at `config_path`.
    pub fn defaults_for(config_path: &Path) -> Self {
        let dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            config_path: config_path.to_path_buf(),
            base_url: None,
            paths: Vec::new(),
            paths_base: dir,
            module_resolution: ModuleResolution::Node10,
            preserve_symlinks: false,
            resolve_json_module: false,
        }
    }
}

/// A loaded tsconfig: where it lives, how it resolves, which files it claims.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub options: ResolvedOptions,
    pub owned_files: HashSet<PathBuf>,
}

impl ProjectConfig {
    pub fn dir(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("/"))
    }

    pub fn owns(&self, file: &Path) -> bool {
        self.owned_files.contains(file)
    }
}

/// The nearest tsconfig plus its direct project references, in declaration order.
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub root_config_path: PathBuf,
    pub root: ProjectConfig,
    pub references: Vec<ProjectConfig>,
}

/// What to do when neither the root config nor any reference claims a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnownedFilePolicy {
    /// Use the root config's options
    #[default]
    Root,
    /// Use the config whose directory is the closest ancestor of the file
    Nearest,
}

impl FromStr for UnownedFilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "root" => Ok(UnownedFilePolicy::Root),
            "nearest" => Ok(UnownedFilePolicy::Nearest),
            other => Err(format!("unknown policy '{}' (expected 'root' or 'nearest')", other)),
        }
    }
}

impl fmt::Display for UnownedFilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnownedFilePolicy::Root => f.write_str("root"),
            UnownedFilePolicy::Nearest => f.write_str("nearest"),
        }
    }
}

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A project file that should be merged
    Local(PathBuf),
    /// Resolved, but inside a third-party package directory
    External(PathBuf),
    Unresolved,
}
