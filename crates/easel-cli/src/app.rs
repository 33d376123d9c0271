//! Application shell: wires options, controller and interrupts to a loop

use crate::controller::{Activity, Engine, IDLE_POLL, ScriptController};
use crate::interrupt::InterruptWatcher;
use crate::lifecycle::Lifecycle;
use crate::options::Mode;
use easel_render::{CanvasHandler, CanvasWindow, Flow, Icon, Shortcut, WindowConfig, app_icon};
use serde_json::Map;
use std::path::{Path, PathBuf};
use std::thread;

/// Process-level setup for a mode
pub enum AppShell {
    /// Plain loop on the main thread; no window system is touched
    Headless,
    /// winit event loop with the application icon
    Windowed { icon: Option<Icon> },
}

impl AppShell {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Headless => Self::Headless,
            Mode::Windowed => Self::Windowed { icon: app_icon() },
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Headless => Mode::Headless,
            Self::Windowed { .. } => Mode::Windowed,
        }
    }
}

/// The running application
pub struct ScriptApp<E: Engine> {
    controller: ScriptController<E>,
    interrupts: InterruptWatcher,
    lifecycle: Lifecycle,
    pending_run: bool,
}

impl<E: Engine> ScriptApp<E> {
    pub fn new(
        controller: ScriptController<E>,
        interrupts: InterruptWatcher,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            controller,
            interrupts,
            lifecycle,
            pending_run: false,
        }
    }

    pub fn controller(&self) -> &ScriptController<E> {
        &self.controller
    }

    /// Kick off the work for the mode: export now, or run once the loop turns
    pub fn did_finish_launching(&mut self) {
        match self.lifecycle.mode() {
            Mode::Headless => self.controller.export(),
            Mode::Windowed => self.pending_run = true,
        }
    }

    /// One pass of the loop: interrupts first, then the deferred run, then work
    pub fn pump(&mut self) -> Activity {
        for _ in 0..self.interrupts.drain() {
            tracing::info!("cancel requested");
            self.controller.cancel();
        }
        if self.lifecycle.should_exit() {
            return Activity::Busy;
        }

        if self.pending_run {
            self.pending_run = false;
            self.controller.run();
        }
        self.controller.tick()
    }

    /// Drive the application until it asks to exit; returns the exit status
    pub fn run(self, shell: AppShell) -> anyhow::Result<u8> {
        match shell {
            AppShell::Headless => Ok(self.run_headless()),
            AppShell::Windowed { icon } => self.run_windowed(icon),
        }
    }

    fn run_headless(mut self) -> u8 {
        self.did_finish_launching();
        loop {
            let activity = self.pump();
            if self.lifecycle.should_exit() {
                break;
            }
            if let Activity::Idle(wait) = activity {
                thread::sleep(wait.min(IDLE_POLL));
            }
        }
        self.lifecycle.exit_code()
    }

    fn run_windowed(self, icon: Option<Icon>) -> anyhow::Result<u8> {
        let file = self.controller.options().file().to_path_buf();
        let config = WindowConfig {
            title: window_title(&file),
            footer: self.controller.options().footer(),
            icon,
            autosave_name: Some(format!("easel:{}", file.display())),
            ..WindowConfig::default()
        };

        let lifecycle = self.lifecycle.clone();
        easel_render::run_canvas_window(config, self)?;
        Ok(lifecycle.exit_code())
    }

    /// Save the current canvas as a PNG next to the script
    fn export_snapshot(&mut self) {
        let target = snapshot_path(self.controller.options().file());
        tracing::info!(path = %target.display(), "saving snapshot");
        self.controller.export_with(&target, &Map::new());
    }
}

impl<E: Engine> CanvasHandler for ScriptApp<E> {
    fn launched(&mut self, window: CanvasWindow) {
        self.controller.attach_display(Box::new(window.clone()));
        if self.controller.options().activate() {
            window.focus();
        }
        self.did_finish_launching();
    }

    fn tick(&mut self) -> Flow {
        let activity = self.pump();
        if self.lifecycle.should_exit() {
            return Flow::Exit;
        }
        match activity {
            Activity::Busy => Flow::Poll,
            Activity::Idle(wait) => Flow::Wait(wait),
        }
    }

    fn shortcut(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Rerun => self.controller.run(),
            Shortcut::Export => self.export_snapshot(),
            Shortcut::Cancel => self.controller.cancel(),
        }
    }

    fn closed(&mut self) {
        self.lifecycle.done(true);
    }
}

/// Window title: the script's file name
fn window_title(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Easel".to_string())
}

/// Where [`ScriptApp`] saves window snapshots for `file`
pub fn snapshot_path(file: &Path) -> PathBuf {
    file.with_extension("png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_for_mode() {
        assert!(matches!(AppShell::for_mode(Mode::Headless), AppShell::Headless));
        assert_eq!(AppShell::for_mode(Mode::Windowed).mode(), Mode::Windowed);
    }

    #[test]
    fn test_window_title() {
        assert_eq!(window_title(Path::new("/tmp/sketches/spiral.rhai")), "spiral.rhai");
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path(Path::new("/tmp/spiral.rhai")),
            Path::new("/tmp/spiral.png")
        );
    }
}
