//! Output module.
//!
//! Writes the JSON report file and prints console feedback.

mod json_format;
mod plain;

pub use json_format::{render_report, write_report};
pub use plain::{
    print_error, print_info, print_scan_header, print_summary, print_warning, progress_bar,
};
