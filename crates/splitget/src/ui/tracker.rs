use std::io::Write;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use splitget_fetch::{FetchPhase, Progress};

pub trait Tracker: Send + Sync {
    fn step(&self, progress: &Progress);
    fn finish(&self, msg: Option<&str>);
}

/// Forward download progress to a tracker.
pub fn progress_callback(tracker: Arc<dyn Tracker>) -> Arc<dyn Fn(&Progress) + Send + Sync> {
    Arc::new(move |progress: &Progress| tracker.step(progress))
}

/// Prints one `.` per completed chunk.
#[derive(Debug, Default)]
pub struct DotTracker;

impl Tracker for DotTracker {
    fn step(&self, progress: &Progress) {
        if progress.phase == FetchPhase::Downloading {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(b".");
            let _ = out.flush();
        }
    }

    fn finish(&self, msg: Option<&str>) {
        println!("{}", msg.unwrap_or_default());
    }
}

const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    let pb_style = match ProgressStyle::with_template(PB_STYLE) {
        Ok(pb_style) => pb_style.tick_chars(TICK).progress_chars(PB_CHARS),
        Err(_) => return None,
    };

    Some(pb_style)
});

/// Byte-based progress bar; the message shows chunk counts.
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl Tracker for ProgressTracker {
    fn step(&self, progress: &Progress) {
        match progress.phase {
            FetchPhase::Planned => self.pb.set_length(progress.bytes_requested),
            FetchPhase::Downloading => self.pb.set_position(progress.bytes_downloaded),
            FetchPhase::Assembling | FetchPhase::Completed => {
                // The last chunk may be short; the bar ends at what arrived.
                self.pb.set_length(progress.bytes_downloaded);
                self.pb.set_position(progress.bytes_downloaded);
            }
        }
        self.pb.set_message(format!(
            "{}/{} chunks ({:.0}%)",
            progress.chunks_completed,
            progress.total_chunks,
            progress.percentage()
        ));
    }

    fn finish(&self, msg: Option<&str>) {
        match msg {
            Some(msg) => self.pb.finish_with_message(msg.to_string()),
            None => self.pb.abandon(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTrackerBuilder {
    prefix: Option<String>,
    hidden: bool,
}

impl ProgressTrackerBuilder {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    #[cfg(test)]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn build(self) -> ProgressTracker {
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        let pb = if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.with_style(style.clone())
        } else {
            pb
        };

        if let Some(prefix) = self.prefix {
            pb.set_prefix(prefix);
        }
        ProgressTracker { pb }
    }
}
