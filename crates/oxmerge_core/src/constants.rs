//! Constants for file names, extensions and resolution strategies.
//!
//! Three different extension lists are in play and they are intentionally not
//! the same:
//!
//! - [`CANDIDATE_EXTENSIONS`]: appended to a path the merger was asked to visit when
//!   the exact path does not exist.
//! - [`RESOLVE_EXTENSIONS`]: appended by the module resolver, in TypeScript's
//!   priority order (sources before declarations before JavaScript).
//! - [`TS_SOURCE_EXTENSIONS`] / [`JS_SOURCE_EXTENSIONS`]: files a tsconfig
//!   `include` glob can claim.

/// The configuration file searched for in every ancestor directory.
pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Language tag attached to merged output.
pub const OUTPUT_LANGUAGE: &str = "typescript";

/// Suffixes tried, in order, after the exact path when visiting a file.
pub const CANDIDATE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"];

/// Suffixes tried when resolving an extensionless module specifier (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] =
    &[".ts", ".tsx", ".d.ts", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.d.ts",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// TypeScript rewrites imports written with a JavaScript extension to the
/// matching source file. Each entry maps the written extension to the
/// candidates tried in its place.
pub const JS_TO_TS_EXTENSIONS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx", ".d.ts"]),
    (".jsx", &[".tsx", ".d.ts"]),
    (".mjs", &[".mts", ".d.mts"]),
    (".cjs", &[".cts", ".d.cts"]),
];

/// Extensions a tsconfig `include` glob claims by default
pub const TS_SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Extensions additionally claimed when `allowJs` is set
pub const JS_SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

/// Directory names whose contents are never merged, even when a specifier
/// resolves into them.
pub const EXTERNAL_DIRS: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

/// Patterns excluded from `include` when a tsconfig has no `exclude` of its own.
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", "bower_components", "jspm_packages"];
