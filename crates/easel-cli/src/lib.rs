//! Easel CLI - the script launcher
//!
//! `easel-task` reads one line of JSON from stdin and either exports the
//! script straight to disk (when `export` names a file) or opens a canvas
//! window showing it. Further stdin lines containing `CANCEL` cancel the
//! running export, stop an animation, or close the window.
//!
//! ```text
//! $ echo '{"file": "spiral.rhai", "export": "spiral.gif", "frames": 60}' | easel-task
//! Generating 60 frames [#######.............]
//! ```
//!
//! The `easel` binary is the friendlier front-end: it builds the JSON from
//! command-line flags and relays Ctrl-C to `easel-task` as a `CANCEL` line.

pub mod app;
pub mod console;
pub mod controller;
pub mod interrupt;
pub mod lifecycle;
pub mod options;

pub use app::{AppShell, ScriptApp};
pub use console::Console;
pub use controller::{Activity, Display, Engine, ScriptController};
pub use interrupt::InterruptWatcher;
pub use lifecycle::Lifecycle;
pub use options::{Mode, Options, OptionsError};

use easel_engine::Sandbox;

/// Build the application for `options` and run it to completion
///
/// Returns the process exit status.
pub fn launch(
    options: Options,
    interrupts: InterruptWatcher,
    console: Console,
) -> anyhow::Result<u8> {
    let mode = options.mode();
    tracing::debug!(?mode, file = %options.file().display(), "launching");

    let shell = AppShell::for_mode(mode);
    let lifecycle = Lifecycle::new(mode);
    let controller = ScriptController::new(Sandbox::new(), options, lifecycle.clone(), console)?;

    ScriptApp::new(controller, interrupts, lifecycle).run(shell)
}
