use std::io::Write;

use clap::Subcommand;
use serde_json::json;
use serenity_core::storage::Database;
use serenity_core::timer::format_clock;
use serenity_core::{
    CompletedSession, Config, DurationChoice, Event, IntervalTicks, SessionHandle,
    SessionObserver, SessionRunner, SessionTimer, TimerSnapshot,
};
use tokio::sync::mpsc;
use tracing::warn;

/// Last resolved session length, reused when no duration flag is given.
const LAST_DURATION_KEY: &str = "last_duration_secs";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a session in the foreground.
    ///
    /// While running, type `p` to pause, `s` to start or resume, `r` to
    /// reset and `q` to quit. Ctrl-C cancels.
    Run {
        /// Preset index (see `timer presets`)
        #[arg(long, conflicts_with_all = ["minutes", "seconds"])]
        preset: Option<usize>,
        /// Session length in minutes
        #[arg(long, conflicts_with = "seconds")]
        minutes: Option<u64>,
        /// Session length in seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// List the configured presets
    Presets,
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        TimerAction::Run {
            preset,
            minutes,
            seconds,
        } => {
            let db = Database::open()?;
            let choice = preset
                .map(DurationChoice::Preset)
                .or(minutes.map(DurationChoice::Minutes))
                .or(seconds.map(DurationChoice::Seconds));
            let duration_secs = match choice {
                Some(choice) => choice.resolve(&config.timer.presets_min)?,
                None => last_duration(&db)
                    .unwrap_or(config.timer.default_minutes.saturating_mul(60)),
            };
            db.kv_set(LAST_DURATION_KEY, &duration_secs.to_string())?;

            run_session(&config, &db, duration_secs).await?;
        }
        TimerAction::Presets => {
            let presets: Vec<_> = config
                .timer
                .presets_min
                .iter()
                .enumerate()
                .map(|(index, minutes)| json!({ "index": index, "minutes": minutes }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&presets)?);
        }
    }
    Ok(())
}

fn last_duration(db: &Database) -> Option<u64> {
    db.kv_get(LAST_DURATION_KEY)
        .ok()
        .flatten()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&secs| secs > 0)
}

enum Outcome {
    Completed(CompletedSession),
    Cancelled,
}

async fn run_session(
    config: &Config,
    db: &Database,
    duration_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let terminal = Terminal {
        bell: config.notifications.enabled && config.notifications.bell,
    };
    let handle = SessionRunner::spawn(
        SessionTimer::new(duration_secs)?,
        IntervalTicks::default(),
        vec![Box::new(terminal), Box::new(Completions(done_tx))],
    );
    handle.start().await?;

    let mut lines = stdin_lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            Some(session) = done_rx.recv() => break Outcome::Completed(session),
            _ = &mut ctrl_c => break Outcome::Cancelled,
            line = lines.recv(), if stdin_open => match line {
                Some(line) => {
                    if line.trim() == "q" {
                        break Outcome::Cancelled;
                    }
                    control(&handle, line.trim()).await;
                }
                None => stdin_open = false,
            },
        }
    };

    match outcome {
        Outcome::Completed(session) => {
            handle.shutdown().await?;
            db.record_session(&session)?;
            if config.timer.save_remote {
                save_remote(config, &session).await;
            }
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Outcome::Cancelled => {
            let snapshot = handle.shutdown().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}

/// Stdin lines read on a detached thread, so a pending read never holds
/// up process exit.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn control(handle: &SessionHandle, input: &str) {
    let result = match input {
        "p" => handle.pause().await,
        "s" => handle.start().await,
        "r" => handle.reset().await,
        "" => return,
        other => {
            eprintln!("unknown command '{other}' (p: pause, s: start, r: reset, q: quit)");
            return;
        }
    };
    if let Err(e) = result {
        eprintln!("{e}");
    }
}

/// A failed upload never fails the command; the session is already
/// recorded locally.
async fn save_remote(config: &Config, session: &CompletedSession) {
    let result = match super::api_client(config) {
        Ok(client) => client
            .save_session(session.duration_secs)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(e) = result {
        warn!("remote save failed: {e}");
        eprintln!("warning: session not saved remotely: {e}");
    }
}

/// Progress line and completion bell on stderr.
struct Terminal {
    bell: bool,
}

impl Terminal {
    fn status(&self, label: &str, remaining_secs: u64) {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r\x1b[2K{label} {}", format_clock(remaining_secs));
        let _ = err.flush();
    }
}

impl SessionObserver for Terminal {
    fn on_event(&mut self, event: &Event) {
        match event {
            Event::TimerStarted { total_secs, .. } => self.status("running", *total_secs),
            Event::TimerResumed { remaining_secs, .. }
            | Event::Progress { remaining_secs, .. } => self.status("running", *remaining_secs),
            Event::TimerPaused { remaining_secs, .. } => self.status("paused ", *remaining_secs),
            Event::TimerReset { total_secs, .. } => self.status("reset  ", *total_secs),
            Event::SessionConfigured { .. } | Event::TimerCompleted { .. } => {}
        }
    }

    fn on_complete(&mut self, session: &CompletedSession) {
        if self.bell {
            eprint!("\x07");
        }
        eprintln!(
            "\r\x1b[2Ksession complete: {}",
            format_clock(session.duration_secs)
        );
    }

    fn on_cancel(&mut self, snapshot: &TimerSnapshot) {
        eprintln!(
            "\r\x1b[2Ksession cancelled with {} left",
            format_clock(snapshot.remaining_secs)
        );
    }
}

/// Hands completed sessions back to the command loop.
struct Completions(mpsc::UnboundedSender<CompletedSession>);

impl SessionObserver for Completions {
    fn on_complete(&mut self, session: &CompletedSession) {
        // The loop may already have quit.
        let _ = self.0.send(session.clone());
    }
}
