//! Cancellation requests arriving on stdin
//!
//! A reader thread forwards every line it reads over a channel. The event
//! loop drains the channel without blocking on each tick, so a supervisor
//! can cancel a long export while the loop owns the main thread.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Lines containing this token request a cancel
pub const CANCEL_TOKEN: &str = "CANCEL";

pub fn is_cancel(line: &str) -> bool {
    line.contains(CANCEL_TOKEN)
}

/// Receives stdin lines from the reader thread
pub struct InterruptWatcher {
    lines: Receiver<String>,
    closed: bool,
}

impl InterruptWatcher {
    /// Watch the process's stdin
    ///
    /// The startup line must already have been consumed. `Stdin` buffers
    /// internally, so lines are read straight from it. Its lock is not
    /// `Send`, so the thread takes it.
    pub fn stdin() -> Self {
        Self::spawn(|| io::stdin().lines())
    }

    /// Watch any line source
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self::spawn(move || reader.lines())
    }

    /// Forward the lines `open` yields from a reader thread
    fn spawn<F, I>(open: F) -> Self
    where
        F: FnOnce() -> I + Send + 'static,
        I: Iterator<Item = io::Result<String>>,
    {
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("interrupt-watcher".to_string())
            .spawn(move || {
                for line in open() {
                    let Ok(line) = line else {
                        break;
                    };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            // The sender was dropped with the closure, so the watcher reads as closed
            tracing::warn!("failed to start interrupt watcher: {}", e);
        }

        Self {
            lines: rx,
            closed: false,
        }
    }

    /// Take every line received so far and count the cancel requests
    ///
    /// Never blocks. End of input is not a cancel.
    pub fn drain(&mut self) -> usize {
        let mut cancels = 0;
        loop {
            match self.lines.try_recv() {
                Ok(line) => {
                    if is_cancel(line.trim()) {
                        cancels += 1;
                    } else {
                        tracing::debug!(line = %line.trim(), "ignoring stdin line");
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        tracing::debug!("stdin closed");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        cancels
    }

    /// Whether stdin has reached end of input
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    fn drain_to_end(watcher: &mut InterruptWatcher) -> usize {
        let mut cancels = 0;
        for _ in 0..500 {
            cancels += watcher.drain();
            if watcher.is_closed() {
                return cancels;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("reader never reached end of input");
    }

    #[test]
    fn test_is_cancel() {
        assert!(is_cancel("CANCEL"));
        assert!(is_cancel("please CANCEL now"));
        assert!(!is_cancel("cancel"));
        assert!(!is_cancel(""));
    }

    #[test]
    fn test_one_cancel_per_line() {
        let input = "CANCEL\nhello\nCANCEL CANCEL\n\nstop\nxCANCELx\n";
        let mut watcher = InterruptWatcher::from_reader(Cursor::new(input));
        assert_eq!(drain_to_end(&mut watcher), 3);
    }

    #[test]
    fn test_eof_is_not_a_cancel() {
        let mut watcher = InterruptWatcher::from_reader(Cursor::new(""));
        assert_eq!(drain_to_end(&mut watcher), 0);
        assert_eq!(watcher.drain(), 0);
    }
}
