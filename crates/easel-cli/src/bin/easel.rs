//! easel - run a drawing script in a window, or export it to files

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::process::{ExitCode, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Parser)]
#[command(name = "easel")]
#[command(about = "Run a drawing script in a canvas window or export it to files", long_about = None)]
#[command(version)]
#[command(after_help = easel_render::controls_help())]
struct Cli {
    /// Script file to run
    file: PathBuf,

    /// Export to this file instead of opening a window (png, jpg, tiff, gif or mov)
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Number of frames to export
    #[arg(short, long)]
    frames: Option<u32>,

    /// First frame number to export
    #[arg(long)]
    first: Option<u32>,

    /// Frame rate of exported movies
    #[arg(long)]
    fps: Option<u32>,

    /// How many times a GIF repeats (omit to loop forever)
    #[arg(long = "loop")]
    loops: Option<u32>,

    /// Bring the window to the front when it opens
    #[arg(long)]
    activate: bool,

    /// Show the status footer under the canvas
    #[arg(long)]
    footer: bool,

    /// Extra values for the script's OPTS map, as key=value
    #[arg(long = "arg", value_parser = parse_key_val)]
    args: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

impl Cli {
    /// The startup line for easel-task
    fn options(&self) -> Result<Value> {
        let file = std::path::absolute(&self.file)
            .with_context(|| format!("Invalid script path {}", self.file.display()))?;
        let export = match &self.export {
            Some(path) => std::path::absolute(path)?.to_string_lossy().into_owned(),
            None => String::new(),
        };

        let mut options = Map::new();
        for (key, value) in &self.args {
            options.insert(key.clone(), Value::String(value.clone()));
        }
        options.insert("file".to_string(), json!(file));
        options.insert("export".to_string(), json!(export));
        options.insert("activate".to_string(), json!(self.activate));
        options.insert("footer".to_string(), json!(self.footer));
        if let Some(frames) = self.frames {
            options.insert("frames".to_string(), json!(frames));
        }
        if let Some(first) = self.first {
            options.insert("first".to_string(), json!(first));
        }
        if let Some(fps) = self.fps {
            options.insert("fps".to_string(), json!(fps));
        }
        if let Some(loops) = self.loops {
            options.insert("loop".to_string(), json!(loops));
        }
        Ok(Value::Object(options))
    }
}

/// easel-task lives next to this binary; fall back to PATH
fn task_binary() -> PathBuf {
    let name = format!("easel-task{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .map(|exe| exe.with_file_name(&name))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}

async fn run_task(task: &Path, options: &Value) -> Result<u8> {
    let mut child = Command::new(task)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start {}", task.display()))?;

    let mut stdin = child.stdin.take().context("easel-task has no stdin")?;
    stdin
        .write_all(format!("{options}\n").as_bytes())
        .await
        .context("Failed to send options to easel-task")?;
    stdin.flush().await?;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status?,
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                tracing::debug!("relaying interrupt");
                // The task may already be exiting
                if let Err(e) = stdin.write_all(b"CANCEL\n").await {
                    tracing::debug!("could not relay interrupt: {}", e);
                }
            }
        }
    };

    Ok(status.code().map_or(1, |code| u8::try_from(code).unwrap_or(1)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("EASEL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.options() {
        Ok(options) => run_task(&task_binary(), &options).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
