use std::path::PathBuf;

/// The merged document handed back to the caller.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub content: String,
    /// Language tag for displaying `content`
    pub language: &'static str,
    /// Actual paths that contributed, in output order
    pub files: Vec<PathBuf>,
}

impl MergeResult {
    pub fn files_merged(&self) -> usize {
        self.files.len()
    }
}
