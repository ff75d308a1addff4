//! Progress rendering for the engine event stream.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::services::EngineEvent;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for run progress.
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .expect("Invalid spinner template")
            .tick_chars(SPINNER_CHARS),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Drain engine events into the spinner until the stream closes or a done
/// event arrives. Returns the final status line.
pub async fn render_events(mut rx: mpsc::Receiver<EngineEvent>, spinner: ProgressBar) -> String {
    let mut last = String::new();
    while let Some(event) = rx.recv().await {
        let (line, done) = event.status_line();
        last.clone_from(&line);
        if done {
            spinner.finish_with_message(line);
            return last;
        }
        spinner.set_message(line);
    }
    spinner.finish_and_clear();
    last
}
