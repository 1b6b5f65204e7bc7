use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::debug;

use crate::config::Config;
use crate::runtime::{EventSource, FrameLoop, LoopOutcome, PhaseDriver, SessionEvent};
use crate::sound::SoundPlayer;

/// One discrete state of the break-reminder session. `Wait` is initial,
/// `Exit` is terminal; the orchestrator only ever rests on these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Wait,
    Warning,
    Break,
    End,
    Snooze,
    Restart,
    Exit,
}

/// Shape of the overlay surface currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Small centered popup used for the warning lead time.
    Warning,
    /// Fullscreen surface used for the break and end screens.
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Warning,
    Break,
    End,
}

/// Render model handed to [`Screen::draw`] once per frame. Layout (glyph
/// metrics, centering of multi-line messages) is the renderer's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub kind: ViewKind,
    pub title: String,
    pub message: String,
    pub hint: Option<String>,
    /// Seconds left in the phase, present when the countdown text is enabled.
    pub remaining: Option<f64>,
    /// Progress ratio in [0, 1]; shrinks during a warning, grows during a break.
    pub progress: f64,
}

impl View {
    pub fn warning(config: &Config, elapsed: f64, budget: Option<f64>) -> Self {
        let budget = budget.unwrap_or(0.0);
        let left = (budget - elapsed).max(0.0);
        Self {
            kind: ViewKind::Warning,
            title: config.warning.clone(),
            message: String::new(),
            hint: config.hints_enabled.then(|| config.warning_hint.clone()),
            remaining: config.time_enabled.then_some(left),
            progress: if budget > 0.0 {
                (left / budget).clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn brk(config: &Config, elapsed: f64, budget: Option<f64>) -> Self {
        let budget = budget.unwrap_or(0.0);
        let left = (budget - elapsed).max(0.0);
        Self {
            kind: ViewKind::Break,
            title: config.title.clone(),
            message: config.message.clone(),
            hint: (config.hints_enabled && config.stop_enabled)
                .then(|| "x: end break early   q: quit".to_string()),
            remaining: config.time_enabled.then_some(left),
            progress: if budget > 0.0 {
                (elapsed / budget).clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    pub fn end(config: &Config) -> Self {
        Self {
            kind: ViewKind::End,
            title: config.end_title.clone(),
            message: config.end_message.clone(),
            hint: None,
            remaining: None,
            progress: 1.0,
        }
    }
}

/// The window system and renderer, seen from the session core.
///
/// The production implementation maps overlays onto the terminal's alternate
/// screen and draws views with ratatui; tests substitute a recording mock.
/// Overlay handles are single-owner: only the active phase handler touches
/// them, and the orchestrator tracks what is on screen in its context.
pub trait Screen {
    fn create_overlay(&mut self, kind: OverlayKind) -> io::Result<()>;
    /// Reuse the current overlay surface under a new shape (warning→break handoff).
    fn resize_overlay(&mut self, kind: OverlayKind) -> io::Result<()>;
    fn destroy_overlay(&mut self) -> io::Result<()>;
    fn grab_input(&mut self) -> io::Result<()>;
    fn release_input(&mut self) -> io::Result<()>;
    /// Reclaim focus after a pointer press on another surface.
    fn set_focus(&mut self) -> io::Result<()>;
    /// Hand focus back to whatever held it before the overlay appeared.
    fn restore_focus(&mut self) -> io::Result<()>;
    fn draw(&mut self, view: &View) -> io::Result<()>;
}

/// Mutable session state threaded through every phase handler. Never shared
/// across threads; sound jobs receive copies, not references into this.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub config: Config,
    pub frame_interval: Duration,
    /// What is currently on screen; `None` outside WARNING/BREAK/END.
    pub overlay: Option<OverlayKind>,
    pub input_grabbed: bool,
}

impl SessionContext {
    pub fn new(config: Config) -> Self {
        let frame_interval = config.frame_interval();
        Self {
            config,
            frame_interval,
            overlay: None,
            input_grabbed: false,
        }
    }
}

fn quit_requested(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// A positive config duration bounds the phase; zero means the phase is
/// already elapsed. Unbounded loops (END) pass `None` directly.
fn phase_budget(seconds: f64) -> Option<Duration> {
    if seconds > 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        Some(Duration::ZERO)
    }
}

struct WarningDriver<'a, S: Screen> {
    screen: &'a mut S,
    config: &'a Config,
}

impl<S: Screen> PhaseDriver for WarningDriver<'_, S> {
    type Exit = Phase;

    fn on_frame(&mut self, elapsed: f64, budget: Option<f64>) -> io::Result<()> {
        self.screen.draw(&View::warning(self.config, elapsed, budget))
    }

    fn on_event(&mut self, event: SessionEvent) -> io::Result<Option<Phase>> {
        match event {
            SessionEvent::Key(key) => {
                if quit_requested(&key) {
                    return Ok(Some(Phase::Exit));
                }
                Ok(match key.code {
                    KeyCode::Enter => Some(Phase::Break),
                    KeyCode::Char('s') if self.config.snooze_enabled => Some(Phase::Snooze),
                    KeyCode::Char('x') if self.config.skip_enabled => Some(Phase::Restart),
                    _ => None,
                })
            }
            SessionEvent::PointerPress => {
                self.screen.set_focus()?;
                Ok(None)
            }
            SessionEvent::Resize => Ok(None),
        }
    }
}

struct BreakDriver<'a, S: Screen> {
    screen: &'a mut S,
    config: &'a Config,
}

impl<S: Screen> PhaseDriver for BreakDriver<'_, S> {
    type Exit = Phase;

    fn on_frame(&mut self, elapsed: f64, budget: Option<f64>) -> io::Result<()> {
        self.screen.draw(&View::brk(self.config, elapsed, budget))
    }

    fn on_event(&mut self, event: SessionEvent) -> io::Result<Option<Phase>> {
        match event {
            SessionEvent::Key(key) => {
                if !self.config.stop_enabled {
                    return Ok(None);
                }
                if quit_requested(&key) {
                    return Ok(Some(Phase::Exit));
                }
                Ok(match key.code {
                    KeyCode::Char('x') => Some(Phase::Restart),
                    _ => None,
                })
            }
            SessionEvent::PointerPress => {
                self.screen.set_focus()?;
                Ok(None)
            }
            SessionEvent::Resize => Ok(None),
        }
    }
}

struct EndDriver<'a, S: Screen> {
    screen: &'a mut S,
    config: &'a Config,
}

impl<S: Screen> PhaseDriver for EndDriver<'_, S> {
    type Exit = Phase;

    fn on_frame(&mut self, _elapsed: f64, _budget: Option<f64>) -> io::Result<()> {
        self.screen.draw(&View::end(self.config))
    }

    fn on_event(&mut self, event: SessionEvent) -> io::Result<Option<Phase>> {
        match event {
            // Any key releases the end screen.
            SessionEvent::Key(_) => Ok(Some(if self.config.repeat {
                Phase::Restart
            } else {
                Phase::Exit
            })),
            SessionEvent::PointerPress => {
                self.screen.set_focus()?;
                Ok(None)
            }
            SessionEvent::Resize => Ok(None),
        }
    }
}

/// The session state machine. `run` steps the phase enum until `Exit`;
/// each handler performs its side effects through the collaborator traits,
/// optionally drives a [`FrameLoop`], and returns the next phase.
pub struct Orchestrator<'a, S: Screen, E: EventSource, P: SoundPlayer> {
    ctx: SessionContext,
    screen: &'a mut S,
    events: &'a E,
    sounds: &'a P,
}

impl<'a, S: Screen, E: EventSource, P: SoundPlayer> Orchestrator<'a, S, E, P> {
    pub fn new(config: Config, screen: &'a mut S, events: &'a E, sounds: &'a P) -> Self {
        Self {
            ctx: SessionContext::new(config),
            screen,
            events,
            sounds,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Drive the session from `Wait` to completion.
    pub fn run(&mut self) -> io::Result<()> {
        let mut phase = Phase::Wait;
        while phase != Phase::Exit {
            let next = self.step(phase)?;
            debug!("phase {phase} -> {next}");
            phase = next;
        }
        // Terminal phase still runs its teardown handler.
        self.step(Phase::Exit).map(|_| ())
    }

    /// Dispatch one phase and return the next. Exhaustive over the phase
    /// enum so every transition is covered at compile time.
    pub fn step(&mut self, phase: Phase) -> io::Result<Phase> {
        match phase {
            Phase::Wait => self.handle_wait(),
            Phase::Warning => self.handle_warning(),
            Phase::Snooze => self.handle_snooze(),
            Phase::Break => self.handle_break(),
            Phase::End => self.handle_end(),
            Phase::Restart => self.handle_restart(),
            Phase::Exit => self.handle_exit(),
        }
    }

    fn after_idle(&self) -> Phase {
        if self.ctx.config.warning_enabled {
            Phase::Warning
        } else {
            Phase::Break
        }
    }

    /// Idle between breaks. No UI is visible, so a coarse sleep suffices.
    fn handle_wait(&mut self) -> io::Result<Phase> {
        let idle = self.ctx.config.timer_duration;
        if idle > 0.0 {
            thread::sleep(Duration::from_secs_f64(idle));
        }
        Ok(self.after_idle())
    }

    fn handle_warning(&mut self) -> io::Result<Phase> {
        match self.ctx.overlay {
            Some(OverlayKind::Warning) => {}
            Some(OverlayKind::Fullscreen) => {
                self.screen.resize_overlay(OverlayKind::Warning)?;
                self.ctx.overlay = Some(OverlayKind::Warning);
            }
            None => {
                self.screen.create_overlay(OverlayKind::Warning)?;
                self.ctx.overlay = Some(OverlayKind::Warning);
            }
        }

        let frame_loop = FrameLoop::new(
            self.ctx.frame_interval,
            phase_budget(self.ctx.config.warning_duration),
        );
        let mut driver = WarningDriver {
            screen: &mut *self.screen,
            config: &self.ctx.config,
        };
        let outcome = frame_loop.run(self.events, &mut driver)?;

        Ok(match outcome {
            LoopOutcome::TimedOut => Phase::Break,
            LoopOutcome::Interrupted(next) => match next {
                Phase::Break | Phase::Snooze | Phase::Restart => next,
                _ => Phase::Exit,
            },
        })
    }

    /// Put the warning away and come back for a fresh one later.
    fn handle_snooze(&mut self) -> io::Result<Phase> {
        if self.ctx.overlay.is_some() {
            self.screen.destroy_overlay()?;
            self.ctx.overlay = None;
        }
        self.screen.restore_focus()?;

        let pause = self.ctx.config.snooze_duration;
        if pause > 0.0 {
            thread::sleep(Duration::from_secs_f64(pause));
        }
        Ok(self.after_idle())
    }

    fn handle_break(&mut self) -> io::Result<Phase> {
        match self.ctx.overlay {
            // The warning popup hands its surface over instead of flickering
            // through a destroy/create pair.
            Some(OverlayKind::Warning) => {
                self.screen.resize_overlay(OverlayKind::Fullscreen)?;
            }
            Some(OverlayKind::Fullscreen) => {}
            None => self.screen.create_overlay(OverlayKind::Fullscreen)?,
        }
        self.ctx.overlay = Some(OverlayKind::Fullscreen);

        if self.ctx.config.block_input && !self.ctx.input_grabbed {
            self.screen.grab_input()?;
            self.ctx.input_grabbed = true;
        }

        if self.ctx.config.sound_enabled {
            if let Some(path) = &self.ctx.config.start_sound_path {
                self.sounds.spawn_play(path, self.ctx.config.volume);
            }
        }

        let frame_loop = FrameLoop::new(
            self.ctx.frame_interval,
            phase_budget(self.ctx.config.break_duration),
        );
        let mut driver = BreakDriver {
            screen: &mut *self.screen,
            config: &self.ctx.config,
        };
        let outcome = frame_loop.run(self.events, &mut driver)?;

        Ok(match outcome {
            LoopOutcome::TimedOut => {
                if self.ctx.config.end_enabled {
                    Phase::End
                } else if self.ctx.config.repeat {
                    Phase::Restart
                } else {
                    Phase::Exit
                }
            }
            LoopOutcome::Interrupted(next) => match next {
                Phase::Restart => Phase::Restart,
                _ => Phase::Exit,
            },
        })
    }

    /// Hold the end screen until any key is pressed.
    fn handle_end(&mut self) -> io::Result<Phase> {
        if self.ctx.config.sound_enabled {
            if let Some(path) = &self.ctx.config.end_sound_path {
                self.sounds.spawn_play(path, self.ctx.config.volume);
            }
        }

        let frame_loop = FrameLoop::new(self.ctx.frame_interval, None);
        let mut driver = EndDriver {
            screen: &mut *self.screen,
            config: &self.ctx.config,
        };
        let outcome = frame_loop.run(self.events, &mut driver)?;

        Ok(match outcome {
            // Unreachable with an unbounded budget; exiting is the safe map.
            LoopOutcome::TimedOut => Phase::Exit,
            LoopOutcome::Interrupted(next) => next,
        })
    }

    /// Uniform teardown point for skip requests: every early exit from a
    /// warning or break routes through here so grabs, windows, and focus
    /// are released in one place.
    fn handle_restart(&mut self) -> io::Result<Phase> {
        self.teardown()?;
        Ok(Phase::Wait)
    }

    fn handle_exit(&mut self) -> io::Result<Phase> {
        self.teardown()?;
        Ok(Phase::Exit)
    }

    fn teardown(&mut self) -> io::Result<()> {
        if self.ctx.input_grabbed {
            self.screen.release_input()?;
            self.ctx.input_grabbed = false;
        }
        if self.ctx.overlay.is_some() {
            self.screen.destroy_overlay()?;
            self.ctx.overlay = None;
        }
        self.screen.restore_focus()
    }
}
