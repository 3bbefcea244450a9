use anyhow::Result;
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{ops::Range, path::Path};

use crate::error::MergeError;

/// Parses a source file down to the module statements the merger cares about.
///
/// The merger only ever talks to this trait, so the concrete parser can be
/// replaced without touching traversal code.
pub trait SyntaxAnalyzer {
    fn parse(&self, path: &Path, text: &str) -> Result<ModuleSyntax>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Import,
    ExportFrom,
}

/// A top-level `import` or `export ... from` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatement {
    pub kind: StatementKind,
    pub specifier: String,
    /// Byte offsets into the parsed text
    pub span: Range<usize>,
}

/// Top-level module statements of one file, in source order.
#[derive(Debug, Clone, Default)]
pub struct ModuleSyntax {
    pub statements: Vec<ModuleStatement>,
}

impl ModuleSyntax {
    pub fn extract_specifiers(&self) -> Vec<String> {
        self.statements.iter().map(|s| s.specifier.clone()).collect()
    }

    pub fn extract_statement_ranges(&self) -> Vec<Range<usize>> {
        self.statements.iter().map(|s| s.span.clone()).collect()
    }
}

/// [`SyntaxAnalyzer`] backed by the oxc parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcAnalyzer;

impl SyntaxAnalyzer for OxcAnalyzer {
    fn parse(&self, path: &Path, text: &str) -> Result<ModuleSyntax> {
        trace!("Parsing file for module statements: {}", path.display());
        let st = source_type_for(path);
        let allocator = Allocator::default();
        let ParserReturn { program, errors, panicked, .. } =
            OxcParser::new(&allocator, text, st).parse();

        if panicked {
            let message = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecoverable syntax error".to_string());
            return Err(MergeError::Parse { path: path.to_path_buf(), message }.into());
        }
        if !errors.is_empty() {
            // The recovered tree still carries every well-formed statement.
            warn!("{} syntax error(s) in {}, continuing", errors.len(), path.display());
        }

        let mut statements = Vec::new();
        for stmt in &program.body {
            let found = match stmt {
                Statement::ImportDeclaration(decl) => {
                    Some((StatementKind::Import, &decl.source, decl.span))
                }
                Statement::ExportNamedDeclaration(decl) => {
                    // `export { a }` and `export const a` have no source and are not edges
                    decl.source.as_ref().map(|src| (StatementKind::ExportFrom, src, decl.span))
                }
                Statement::ExportAllDeclaration(decl) => {
                    Some((StatementKind::ExportFrom, &decl.source, decl.span))
                }
                _ => None,
            };

            if let Some((kind, source, span)) = found {
                trace!("Found {:?} '{}' in {}", kind, source.value, path.display());
                statements.push(ModuleStatement {
                    kind,
                    specifier: source.value.to_string(),
                    span: span.start as usize..span.end as usize,
                });
            }
        }

        debug!("Found {} module statements in {}", statements.len(), path.display());
        Ok(ModuleSyntax { statements })
    }
}

/// Removes `ranges` from `original`, last range first so earlier offsets stay valid.
///
/// Ranges must be in source order and must not overlap; a range that breaks
/// this is left in place.
pub fn strip_statements(original: &str, ranges: &[Range<usize>]) -> String {
    let mut out = original.to_string();
    let mut floor = original.len();

    for range in ranges.iter().rev() {
        if range.start > range.end
            || range.end > floor
            || !original.is_char_boundary(range.start)
            || !original.is_char_boundary(range.end)
        {
            warn!("Skipping invalid statement range {:?}", range);
            continue;
        }
        out.replace_range(range.clone(), "");
        floor = range.start;
    }

    out
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());
    let is_definition = path.to_string_lossy().ends_with(".d.ts");
    let is_typescript = matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts"));

    // Every merged file is parsed as a module so import declarations are legal.
    // JSX is allowed in any JavaScript file, not only `.jsx`.
    SourceType::default()
        .with_module(true)
        .with_jsx(!is_typescript || ext == Some("tsx"))
        .with_typescript(is_typescript)
        .with_typescript_definition(is_definition)
}
