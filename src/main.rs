use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analysis;
mod deadlines;
mod error;
mod models;
mod report;
mod submissions;

use error::AnalyzerError;

#[derive(Parser)]
#[command(name = "analyze_submissions", version)]
#[command(
    about = "Report missing, late and OPEN course submissions",
    long_about = None
)]
struct Cli {
    /// Tab-separated submission log
    #[arg(default_value = "subjects.txt")]
    subjects_path: PathBuf,
    /// Syllabus listing the assignment deadlines
    #[arg(default_value = "README.md")]
    readme_path: PathBuf,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "analyze_submissions=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli.subjects_path, &cli.readme_path) {
        Ok(report) => {
            println!("{report}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ AnalyzerError::NoDeadlines) => {
            println!("{err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

/// Reads the syllabus first; the submission log is only opened once at least
/// one deadline is known.
fn run(subjects_path: &Path, readme_path: &Path) -> Result<String, AnalyzerError> {
    let deadlines = deadlines::load_deadlines(readme_path)?;
    if deadlines.is_empty() {
        tracing::warn!(path = %readme_path.display(), "no deadlines found");
        return Err(AnalyzerError::NoDeadlines);
    }

    let records = submissions::load_submissions(subjects_path)?;
    let analysis = analysis::analyze(&deadlines, &records);

    Ok(report::format_report(
        &analysis.missing,
        &analysis.late,
        &analysis.open,
    ))
}
