//! easel-task - runs one script as described by a JSON line on stdin

use easel_cli::{Console, InterruptWatcher, Options};
use std::io::{self, BufRead};
use std::process::ExitCode;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

fn main() -> ExitCode {
    // stdout and stderr carry script output and progress, so logs stay quiet by default
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_ansi(false);
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_env("EASEL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut line = String::new();
    let options = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| e.to_string())
        .and_then(|_| Options::parse_line(&line).map_err(|e| e.to_string()));
    let options = match options {
        Ok(options) => options,
        Err(e) => {
            tracing::debug!("{}", e);
            println!("bad args");
            return ExitCode::from(1);
        }
    };

    // Only the CANCEL line may interrupt; Ctrl-C is relayed by the front-end
    ignore_sigint();

    match easel_cli::launch(options, InterruptWatcher::stdin(), Console::stdio()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn ignore_sigint() {
    // SAFETY: installs the SIG_IGN disposition before any other thread exists
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_IGN);
    }
}

#[cfg(not(unix))]
fn ignore_sigint() {}
