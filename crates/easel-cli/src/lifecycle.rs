//! Process termination requests

use crate::options::Mode;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug)]
struct State {
    mode: Mode,
    exit_requested: Cell<bool>,
    failed: Cell<bool>,
}

/// Shared handle deciding when the event loop should stop
///
/// Cloned into everything that may end the process. All clones live on
/// the loop thread.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: Rc<State>,
}

impl Lifecycle {
    pub fn new(mode: Mode) -> Self {
        Self {
            state: Rc::new(State {
                mode,
                exit_requested: Cell::new(false),
                failed: Cell::new(false),
            }),
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Finish up: always when headless, otherwise only when `quit`
    ///
    /// A windowed process that is not told to quit stays open until the
    /// user closes the window.
    pub fn done(&self, quit: bool) {
        if self.state.mode.is_headless() || quit {
            tracing::debug!(mode = ?self.state.mode, quit, "exit requested");
            self.state.exit_requested.set(true);
        }
    }

    /// Remember that an export failed, for the exit status
    pub fn mark_failed(&self) {
        self.state.failed.set(true);
    }

    pub fn should_exit(&self) -> bool {
        self.state.exit_requested.get()
    }

    /// Process exit status: 1 after a failed headless export, else 0
    pub fn exit_code(&self) -> u8 {
        u8::from(self.state.mode.is_headless() && self.state.failed.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_always_exits() {
        let lifecycle = Lifecycle::new(Mode::Headless);
        lifecycle.done(false);
        assert!(lifecycle.should_exit());
        assert_eq!(lifecycle.exit_code(), 0);
    }

    #[test]
    fn test_windowed_needs_quit() {
        let lifecycle = Lifecycle::new(Mode::Windowed);
        let clone = lifecycle.clone();
        clone.done(false);
        assert!(!lifecycle.should_exit());
        clone.done(true);
        assert!(lifecycle.should_exit());
    }

    #[test]
    fn test_failure_sets_exit_code() {
        let headless = Lifecycle::new(Mode::Headless);
        headless.mark_failed();
        assert_eq!(headless.exit_code(), 1);

        let windowed = Lifecycle::new(Mode::Windowed);
        windowed.mark_failed();
        assert_eq!(windowed.exit_code(), 0);
    }
}
