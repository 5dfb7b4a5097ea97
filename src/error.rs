use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The syllabus yielded nothing to check submissions against.
    #[error("No deadlines parsed from README.md. Exiting.")]
    NoDeadlines,
}

pub fn read_input(path: &std::path::Path) -> Result<String, AnalyzerError> {
    std::fs::read_to_string(path).map_err(|source| AnalyzerError::Read {
        path: path.to_path_buf(),
        source,
    })
}
