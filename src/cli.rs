use crate::config::FooterInfo;
use crate::model::{RunConfig, TaskPhase};
use crate::orchestrator::{PollOutcome, ProgressController, Redraw};
use crate::runner::TaskRunner;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "progress-demo",
    version,
    about = "Cancellable background task with live progress, in a TUI or headless"
)]
pub struct Cli {
    /// Print every task event as a JSON line plus a summary and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print status lines and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Number of steps the task counts through
    #[arg(long, default_value_t = 10)]
    pub steps: u32,

    /// Time spent on each step
    #[arg(long, default_value = "1s")]
    pub step_interval: humantime::Duration,

    /// Delay between polls of the event channel while a task runs
    #[arg(long, default_value = "100ms")]
    pub poll_interval: humantime::Duration,

    /// Make the task fail at this step (for trying out error handling)
    #[arg(long)]
    pub fail_at: Option<u32>,

    /// Start a task as soon as the TUI opens
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,

    /// Write logs here instead of the default state directory
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }
    // Reject bad numbers before the terminal is taken over.
    build_config(&args)?;

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args).await;
        }
    }

    run_headless(args).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    if args.steps == 0 {
        return Err(anyhow::anyhow!("--steps must be at least 1"));
    }
    if args.fail_at == Some(0) {
        return Err(anyhow::anyhow!("--fail-at counts from 1"));
    }
    Ok(RunConfig {
        steps: args.steps,
        step_interval: Duration::from(args.step_interval),
        fail_at: args.fail_at,
    })
}

#[derive(Debug, Serialize)]
struct RunSummary {
    phase: TaskPhase,
    status: String,
    progress: f64,
    finished_at: String,
}

/// Run a single task without a terminal UI, driving the controller from a blocking thread.
async fn run_headless(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let footer = FooterInfo::from_env();
    let (out_tx, out_handle) = spawn_output_writer();
    let _ = out_tx.send(OutputLine::Stderr(format!(
        "{} · {}",
        footer.version_label(),
        footer.author_label()
    )));

    // Ctrl-C becomes a cancel action instead of killing the process mid-run.
    let interrupt = CancellationToken::new();
    let interrupt_listener = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        })
    };

    let runtime = tokio::runtime::Handle::current();
    let poll_interval = Duration::from(args.poll_interval);
    let json = args.json;
    let lines = out_tx.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let mut controller =
            ProgressController::new(TaskRunner::new(cfg, runtime), poll_interval);
        drive_to_completion(&mut controller, &interrupt, |why, status| {
            let line = match (json, why) {
                (true, Redraw::Applied(ev)) => {
                    serde_json::to_string(ev).ok().map(OutputLine::Stdout)
                }
                (true, Redraw::Reconciled) => None,
                (false, _) => Some(OutputLine::Stderr(status.to_string())),
            };
            if let Some(line) = line {
                let _ = lines.send(line);
            }
        });
        let state = controller.state();
        RunSummary {
            phase: state.phase,
            status: state.status.clone(),
            progress: state.progress,
            finished_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
        }
    })
    .await
    .context("headless controller thread failed")?;
    interrupt_listener.abort();

    if json {
        let out = serde_json::to_string_pretty(&summary)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let _ = out_tx.send(OutputLine::Stdout(summary.status.clone()));
    }
    drop(out_tx);
    let _ = out_handle.await;

    if summary.phase == TaskPhase::Failed {
        return Err(anyhow::anyhow!("task failed: {}", summary.status));
    }
    Ok(())
}

/// Start one task and poll it until it settles or `interrupt` fires.
///
/// Blocks the calling thread; never call this from async code.
fn drive_to_completion<F>(
    controller: &mut ProgressController,
    interrupt: &CancellationToken,
    mut on_redraw: F,
) where
    F: FnMut(Redraw<'_>, &str),
{
    controller.start();
    loop {
        if interrupt.is_cancelled() {
            // No runner event describes a user cancel; only the state changed.
            controller.cancel();
            on_redraw(Redraw::Reconciled, &controller.state().status);
            return;
        }
        match controller.poll(|why, state| on_redraw(why, &state.status)) {
            PollOutcome::Reschedule(after) => std::thread::sleep(after),
            PollOutcome::Settled => return,
        }
    }
}
