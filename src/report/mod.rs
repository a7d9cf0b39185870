//! Report module - HTML profile reports per dataset and the comparison report

mod profile;

pub use profile::{report_file_name, ProfileReport, COMPARE_REPORT_FILE};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to format report: {0}")]
    Format(#[from] std::fmt::Error),
}
