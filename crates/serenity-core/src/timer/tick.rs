//! Tick sources that drive a [`SessionTimer`](super::SessionTimer).
//!
//! A source is armed when the timer starts running and disarmed on every
//! transition away from `Running`. Disarming drops whatever tick was pending,
//! so a tick scheduled before a pause can never reach the timer afterwards.

use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Default countdown period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Injectable source of one-second ticks.
pub trait TickSource: Send + 'static {
    /// Start a fresh period; the first tick arrives one full period later.
    fn arm(&mut self);

    /// Cancel the pending tick. Nothing is delivered until re-armed.
    fn disarm(&mut self);

    /// Poll for the next tick. Only meaningful while armed.
    fn poll_tick(&mut self, cx: &mut Context<'_>) -> Poll<()>;
}

/// Wait for the next tick of `source`.
pub async fn next_tick<T: TickSource + ?Sized>(source: &mut T) {
    poll_fn(|cx| source.poll_tick(cx)).await
}

/// Wall-clock ticks backed by a tokio interval.
#[derive(Debug)]
pub struct IntervalTicks {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }
}

impl Default for IntervalTicks {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

impl TickSource for IntervalTicks {
    fn arm(&mut self) {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        // A stalled runtime must not replay a burst of ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn disarm(&mut self) {
        self.interval = None;
    }

    fn poll_tick(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.interval.as_mut() {
            Some(interval) => interval.poll_tick(cx).map(|_| ()),
            None => Poll::Pending,
        }
    }
}

/// Ticks delivered by hand through a [`ManualTickHandle`].
///
/// Used to drive a runner deterministically without a clock.
#[derive(Debug)]
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<()>,
    armed: bool,
}

/// Sending half of [`ManualTicks`].
#[derive(Debug, Clone)]
pub struct ManualTickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicks {
    pub fn channel() -> (Self, ManualTickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx, armed: false }, ManualTickHandle { tx })
    }

    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

impl ManualTickHandle {
    /// Queue one tick. Returns false once the source has been dropped.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    /// Queue `n` ticks.
    pub fn tick_n(&self, n: u64) -> bool {
        (0..n).all(|_| self.tick())
    }
}

impl TickSource for ManualTicks {
    fn arm(&mut self) {
        self.drain();
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.drain();
    }

    fn poll_tick(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if !self.armed {
            return Poll::Pending;
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(())) => Poll::Ready(()),
            // All handles dropped: no more ticks will ever come.
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }
}
