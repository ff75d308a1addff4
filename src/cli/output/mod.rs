//! Terminal output helpers for the CLI.

pub mod progress;
pub mod table;

pub use progress::{create_spinner, render_events};
pub use table::{plan_table, report_table, summary_line};
