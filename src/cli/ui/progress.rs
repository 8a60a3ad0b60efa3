//! Live progress line for long-running imports

use crate::import::Progress;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::watch;

const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// Animated `finished/total` line fed by a progress sink.
///
/// Starts when created. [`ProgressLine::finish`] stops the ticker and clears
/// the line; dropping without finishing aborts the ticker instead.
pub struct ProgressLine {
    sender: Option<watch::Sender<Progress>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ProgressLine {
    pub fn start(message: impl Into<String>) -> Self {
        let (sender, receiver) = watch::channel(Progress::default());
        let handle = tokio::spawn(Self::run(message.into(), receiver));

        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// Record a new snapshot; safe to call from any thread
    pub fn update(&self, progress: Progress) {
        if let Some(sender) = &self.sender {
            sender.send_replace(progress);
        }
    }

    /// Stop the ticker and wait for its last frame before clearing the line
    pub async fn finish(mut self) {
        // Closing the channel ends the ticker loop
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    async fn run(message: String, mut receiver: watch::Receiver<Progress>) {
        let mut frame = 0;
        let mut stdout = io::stdout();

        loop {
            let progress = *receiver.borrow_and_update();
            let spinner_char = SPINNER_CHARS[frame % SPINNER_CHARS.len()];
            print!(
                "\r{} · {} ({}/{})",
                spinner_char, message, progress.finished, progress.total
            );
            let _ = stdout.flush();

            frame += 1;

            tokio::select! {
                _ = tokio::time::sleep(SPINNER_INTERVAL) => {},
                changed = receiver.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }

    fn clear_line() {
        print!("\r\x1b[K");
        let _ = io::stdout().flush();
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        Self::clear_line();
    }
}
