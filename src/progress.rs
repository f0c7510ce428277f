use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// Receives transfer progress from the engine. `position` is the absolute
/// byte offset in the destination file; `total` is `None` when the server
/// sent no length.
pub trait ProgressSink: Send + Sync {
    fn start(&self, label: &str, position: u64, total: Option<u64>);
    fn update(&self, position: u64, total: Option<u64>);
    fn finish(&self, label: &str);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _label: &str, _position: u64, _total: Option<u64>) {}
    fn update(&self, _position: u64, _total: Option<u64>) {}
    fn finish(&self, _label: &str) {}
}

/// One indicatif bar per transfer, drawn on stderr.
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn style(total_known: bool) -> ProgressStyle {
        let template = if total_known {
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes:>12}/{total_bytes:<12} {bytes_per_sec:>12} {eta:>4} {msg}"
        } else {
            "{spinner:.green} [{elapsed_precise}] {bytes:>12} {bytes_per_sec:>12} {msg}"
        };
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn start(&self, label: &str, position: u64, total: Option<u64>) {
        let pb = match total {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
        pb.set_style(Self::style(total.is_some()));
        pb.set_message(label.to_string());
        pb.set_position(position);
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(old) = slot.replace(pb) {
                old.abandon();
            }
        }
    }

    fn update(&self, position: u64, total: Option<u64>) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(pb) = slot.as_ref() {
                if let Some(total) = total {
                    pb.set_length(total);
                }
                pb.set_position(position);
            }
        }
    }

    fn finish(&self, label: &str) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_with_message(label.to_string());
            }
        }
    }
}
