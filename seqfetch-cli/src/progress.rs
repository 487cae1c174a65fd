//! Terminal progress bar sink.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use seqfetch::download::ProgressSink;

/// Byte-level progress bar on stderr.
///
/// Starts hidden; the engine's `start` call sizes and reveals it, so a
/// skipped download never flashes an empty bar.
pub struct TerminalSink {
    bar: ProgressBar,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalSink {
    fn start(&self, total_bytes: u64) {
        self.bar.set_length(total_bytes);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn update(&self, bytes_completed: u64) {
        self.bar.set_position(bytes_completed);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
