//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Printing the final statistics to stdout
//! - Logging running totals when a crawl is interrupted
//! - Exporting the statistics as JSON

mod json;
mod summary;

pub use json::{write_json_report, JsonReport};
pub use summary::{format_statistics, log_progress, print_statistics};
