use std::{
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::types::MergeResult;

/// Display form of `path` relative to the current directory, for clickable links
fn relativize_to_cwd(path: &Path) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return path.display().to_string();
        }
    };

    match make_relative(path, &cwd) {
        Some(rel) => {
            trace!("Relativized {:?} to {:?}", path, rel);
            rel.to_string_lossy().to_string()
        }
        None => path.display().to_string(),
    }
}

/// Relative path from `base` to `target`, or `None` when they share no root
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    if target_parts.first() != base_parts.first() {
        return None;
    }

    let common = target_parts.iter().zip(&base_parts).take_while(|(t, b)| t == b).count();

    let mut result = PathBuf::new();
    for _ in &base_parts[common..] {
        result.push("..");
    }
    for component in &target_parts[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

/// Writes the merged document as-is.
pub fn write_merged<W: Write>(writer: &mut W, result: &MergeResult) -> io::Result<()> {
    writer.write_all(result.content.as_bytes())?;
    if !result.content.is_empty() && !result.content.ends_with('\n') {
        writeln!(writer)?;
    }
    writer.flush()
}

pub fn print_summary<W: Write>(
    writer: &mut W,
    result: &MergeResult,
    elapsed_ms: u128,
    list_files: bool,
) -> io::Result<()> {
    if list_files {
        debug!("Listing {} merged files", result.files.len());
        for (idx, file) in result.files.iter().enumerate() {
            let prefix = if idx + 1 == result.files.len() { "└──" } else { "├──" };
            writeln!(writer, "{}  {}", prefix.dimmed(), relativize_to_cwd(file).blue())?;
        }
        writeln!(writer)?;
    }

    writeln!(
        writer,
        "{} Merged {} files in {}ms (language: {})",
        "●".bright_blue(),
        result.files_merged().to_string().cyan(),
        elapsed_ms.to_string().cyan(),
        result.language
    )?;
    writer.flush()
}

pub fn print_config_warning<W: Write>(writer: &mut W, start: &Path) -> io::Result<()> {
    writeln!(
        writer,
        "{} No tsconfig.json found in any directory above {}",
        "⚠".yellow().bold(),
        relativize_to_cwd(start).yellow()
    )?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(files: &[&str], content: &str) -> MergeResult {
        MergeResult {
            content: content.to_string(),
            language: "typescript",
            files: files.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn test_make_relative_same_dir() {
        let result = make_relative(Path::new("/project/src/file.ts"), Path::new("/project/src"));
        assert_eq!(result, Some(PathBuf::from("file.ts")));
    }

    #[test]
    fn test_make_relative_parent_dir() {
        let result =
            make_relative(Path::new("/project/src/file.ts"), Path::new("/project/src/components"));
        assert_eq!(result, Some(PathBuf::from("../file.ts")));
    }

    #[test]
    fn test_make_relative_sibling_dir() {
        let result =
            make_relative(Path::new("/project/apps/web/index.ts"), Path::new("/project/apps/api"));
        assert_eq!(result, Some(PathBuf::from("../web/index.ts")));
    }

    #[test]
    fn test_make_relative_same_path() {
        let result = make_relative(Path::new("/project/src"), Path::new("/project/src"));
        assert_eq!(result, Some(PathBuf::from(".")));
    }

    #[test]
    fn test_make_relative_target_above_base() {
        let result = make_relative(Path::new("/project"), Path::new("/project/apps/web"));
        assert_eq!(result, Some(PathBuf::from("../..")));
    }

    #[test]
    fn test_make_relative_unrelated_roots() {
        assert_eq!(make_relative(Path::new("relative/a.ts"), Path::new("/project")), None);
    }

    #[test]
    fn test_write_merged_adds_trailing_newline() {
        let mut out = Vec::new();
        write_merged(&mut out, &sample_result(&[], "const a = 1;")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "const a = 1;\n");

        let mut out = Vec::new();
        write_merged(&mut out, &sample_result(&[], "")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_print_summary_lists_files_in_order() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        let result = sample_result(&["/p/a.ts", "/p/b.ts"], "");
        print_summary(&mut out, &result, 12, true).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("├──") && lines[0].ends_with("a.ts"));
        assert!(lines[1].starts_with("└──") && lines[1].ends_with("b.ts"));
        assert!(text.contains("Merged 2 files in 12ms (language: typescript)"));
    }

    #[test]
    fn test_print_summary_without_listing() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_summary(&mut out, &sample_result(&["/p/a.ts"], ""), 3, false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains("a.ts"));
    }
}
