use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEventKind};

use crate::timer::Timer;

/// Unified event type consumed by the per-phase frame loops
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    PointerPress,
    Resize,
}

/// Source of terminal events (keyboard, pointer, resize)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    /// Err(Disconnected) means input is unreachable and is treated as fatal by the loop.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(SessionEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Mouse(mouse)) => {
                    if matches!(mouse.kind, MouseEventKind::Down(_))
                        && tx.send(SessionEvent::PointerPress).is_err()
                    {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(SessionEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Per-phase callbacks driven by a [`FrameLoop`].
///
/// `on_frame` runs once per frame tick when no event arrived before the
/// deadline; `on_event` runs for every input event and returns `Some(exit)`
/// to stop the loop or `None` to keep going.
pub trait PhaseDriver {
    type Exit;

    fn on_frame(&mut self, elapsed: f64, budget: Option<f64>) -> io::Result<()>;
    fn on_event(&mut self, event: SessionEvent) -> io::Result<Option<Self::Exit>>;
}

/// How a frame loop ended: the phase budget ran out, or an event handler
/// requested an exit. Callers map this onto the next session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome<T> {
    TimedOut,
    Interrupted(T),
}

/// Drives one phase at a target frame rate while staying responsive to input.
///
/// Each iteration waits for an event with a timeout derived from the next
/// frame deadline; an arriving event short-circuits the wait, so input
/// latency is bounded by event delivery, not by the frame interval.
#[derive(Debug, Clone, Copy)]
pub struct FrameLoop {
    frame_interval: Duration,
    budget: Option<Duration>,
}

impl FrameLoop {
    /// `budget` of `None` means unbounded: the loop only ends on an event exit.
    pub fn new(frame_interval: Duration, budget: Option<Duration>) -> Self {
        Self {
            frame_interval,
            budget,
        }
    }

    pub fn run<S, D>(&self, source: &S, driver: &mut D) -> io::Result<LoopOutcome<D::Exit>>
    where
        S: EventSource,
        D: PhaseDriver,
    {
        let timer = Timer::start();
        let interval = self.frame_interval.as_secs_f64();
        let budget = self.budget.map(|d| d.as_secs_f64());
        let mut next_frame = 0.0_f64;

        loop {
            let elapsed = timer.elapsed();

            if let Some(budget) = budget {
                if elapsed >= budget {
                    return Ok(LoopOutcome::TimedOut);
                }
            }

            let wait = (next_frame - elapsed).max(0.0);

            match source.recv_timeout(Duration::from_secs_f64(wait)) {
                Ok(event) => {
                    if let Some(exit) = driver.on_event(event)? {
                        return Ok(LoopOutcome::Interrupted(exit));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    driver.on_frame(elapsed, budget)?;
                    // Deadlines advance in fixed increments from the loop
                    // origin, not from "now": a slow frame callback delays
                    // but never skips the next deadline.
                    next_frame += interval;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "event source disconnected",
                    ));
                }
            }
        }
    }
}
