//! Async runner that owns one [`SessionTimer`] and its tick source.
//!
//! The timer, the tick source and the observers all live inside a single
//! tokio task. Callers talk to it through a [`SessionHandle`]; every command
//! resolves only after the task has applied it, so once `pause().await` or
//! `reset().await` returns the tick source is already disarmed.
//!
//! Dropping the handle (or calling [`SessionHandle::shutdown`]) tears the
//! session down: the tick source is disarmed and, if the session was in
//! progress, observers get `on_cancel`.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::engine::{CompletedSession, SessionTimer, TimerPhase, TimerSnapshot};
use super::tick::{next_tick, TickSource};
use crate::error::TimerError;
use crate::events::Event;

const COMMAND_BUFFER: usize = 16;

/// Receives session lifecycle notifications.
///
/// The notification effector (bell, haptics) and the navigation host both
/// plug in here. All methods default to no-ops.
pub trait SessionObserver: Send + 'static {
    /// Called for every transition, including progress ticks.
    fn on_event(&mut self, _event: &Event) {}

    /// Called exactly once when a session runs to zero.
    fn on_complete(&mut self, _session: &CompletedSession) {}

    /// Called when a started session is reset or torn down before completing.
    fn on_cancel(&mut self, _snapshot: &TimerSnapshot) {}
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Configure(u64),
    Start,
    Pause,
    Reset,
    Snapshot,
}

struct Command {
    op: Op,
    reply: oneshot::Sender<Result<TimerSnapshot, TimerError>>,
}

enum Step {
    Tick,
    Command(Option<Command>),
}

/// The task side of a running session.
pub struct SessionRunner<T: TickSource> {
    timer: SessionTimer,
    ticks: T,
    observers: Vec<Box<dyn SessionObserver>>,
    commands: mpsc::Receiver<Command>,
}

impl<T: TickSource> SessionRunner<T> {
    /// Move `timer` and `ticks` into a new task and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        timer: SessionTimer,
        ticks: T,
        observers: Vec<Box<dyn SessionObserver>>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let runner = Self {
            timer,
            ticks,
            observers,
            commands: rx,
        };
        let task = tokio::spawn(runner.run());
        SessionHandle { commands: tx, task }
    }

    async fn run(mut self) -> TimerSnapshot {
        if self.timer.is_running() {
            self.ticks.arm();
        }

        loop {
            let running = self.timer.is_running();
            // Ticks first: a tick that is already due is applied before any
            // command queued behind it.
            let step = tokio::select! {
                biased;
                _ = next_tick(&mut self.ticks), if running => Step::Tick,
                cmd = self.commands.recv() => Step::Command(cmd),
            };

            match step {
                Step::Tick => self.on_tick(),
                Step::Command(Some(cmd)) => self.on_command(cmd),
                Step::Command(None) => break,
            }
        }

        self.teardown()
    }

    fn on_tick(&mut self) {
        let event = match self.timer.tick() {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                warn!("tick rejected: {e}");
                return;
            }
        };

        self.publish(&event);
        if event.is_completion() {
            self.ticks.disarm();
            if let Some(session) = self.timer.completed_session() {
                info!(duration_secs = session.duration_secs, "session completed");
                for observer in &mut self.observers {
                    observer.on_complete(&session);
                }
            }
        }
    }

    fn on_command(&mut self, cmd: Command) {
        let was_running = self.timer.is_running();
        let before = self.timer.snapshot();

        let result = match cmd.op {
            Op::Configure(secs) => self.timer.configure(secs),
            Op::Start => self.timer.start(),
            Op::Pause => self.timer.pause(),
            Op::Reset => Ok(Some(self.timer.reset())),
            Op::Snapshot => Ok(None),
        };

        // Keep the tick source in step with the phase before replying.
        match (was_running, self.timer.is_running()) {
            (true, false) => self.ticks.disarm(),
            (false, true) => self.ticks.arm(),
            _ => {}
        }

        match &result {
            Ok(Some(event)) => {
                self.publish(event);
                if matches!(cmd.op, Op::Reset) && in_progress(before.phase) {
                    self.cancel(&before);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(op = ?cmd.op, "command rejected: {e}"),
        }

        let reply = result.map(|_| self.timer.snapshot());
        // The caller may have given up waiting; nothing to do then.
        let _ = cmd.reply.send(reply);
    }

    fn publish(&mut self, event: &Event) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }

    fn cancel(&mut self, snapshot: &TimerSnapshot) {
        info!(
            remaining_secs = snapshot.remaining_secs,
            total_secs = snapshot.total_secs,
            "session cancelled"
        );
        for observer in &mut self.observers {
            observer.on_cancel(snapshot);
        }
    }

    fn teardown(mut self) -> TimerSnapshot {
        self.ticks.disarm();
        let snapshot = self.timer.snapshot();
        if in_progress(snapshot.phase) {
            self.cancel(&snapshot);
        }
        debug!(phase = %snapshot.phase, "session runner stopped");
        snapshot
    }
}

fn in_progress(phase: TimerPhase) -> bool {
    matches!(phase, TimerPhase::Running | TimerPhase::Paused)
}

/// Caller side of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<TimerSnapshot>,
}

impl SessionHandle {
    pub async fn configure(&self, duration_secs: u64) -> Result<TimerSnapshot, TimerError> {
        self.send(Op::Configure(duration_secs)).await
    }

    pub async fn start(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Op::Start).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Op::Pause).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Op::Reset).await
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        self.send(Op::Snapshot).await
    }

    /// Stop the runner and wait for teardown. Returns the final snapshot.
    pub async fn shutdown(self) -> Result<TimerSnapshot, TimerError> {
        let Self { commands, task } = self;
        drop(commands);
        task.await.map_err(|_| TimerError::RunnerStopped)
    }

    async fn send(&self, op: Op) -> Result<TimerSnapshot, TimerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command { op, reply })
            .await
            .map_err(|_| TimerError::RunnerStopped)?;
        rx.await.map_err(|_| TimerError::RunnerStopped)?
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command").field("op", &self.op).finish()
    }
}
