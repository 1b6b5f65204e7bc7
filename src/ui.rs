use std::io::{self, Stdout};

use crossterm::{
    cursor::{Hide, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::session::{OverlayKind, Screen, View, ViewKind};

/// Production [`Screen`]: overlays live on the terminal's alternate screen.
///
/// Creating the first overlay enters raw mode and the alternate screen;
/// destroying it hands the terminal back to the shell, which is this
/// rendition's focus restoration. Raw mode already routes every key to the
/// session, so input grabs need no extra work here and are tracked only by
/// the orchestrator.
pub struct TerminalScreen {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    overlay: Option<OverlayKind>,
}

impl TerminalScreen {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            terminal: None,
            overlay: None,
        }
    }

    fn enter(&mut self) -> io::Result<()> {
        if self.terminal.is_none() {
            enable_raw_mode()?;
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
            self.terminal = Some(Terminal::new(CrosstermBackend::new(stdout))?);
        }
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if self.terminal.take().is_some() {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture, Show)?;
        }
        Ok(())
    }
}

impl Screen for TerminalScreen {
    fn create_overlay(&mut self, kind: OverlayKind) -> io::Result<()> {
        self.enter()?;
        self.overlay = Some(kind);
        Ok(())
    }

    fn resize_overlay(&mut self, kind: OverlayKind) -> io::Result<()> {
        self.overlay = Some(kind);
        if let Some(terminal) = &mut self.terminal {
            terminal.clear()?;
        }
        Ok(())
    }

    fn destroy_overlay(&mut self) -> io::Result<()> {
        self.overlay = None;
        self.leave()
    }

    fn grab_input(&mut self) -> io::Result<()> {
        // Raw mode is already exclusive on a terminal.
        Ok(())
    }

    fn release_input(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn set_focus(&mut self) -> io::Result<()> {
        // Focus follows the terminal emulator; redraws happen on the next frame.
        Ok(())
    }

    fn restore_focus(&mut self) -> io::Result<()> {
        // Leaving the alternate screen already returned the terminal.
        Ok(())
    }

    fn draw(&mut self, view: &View) -> io::Result<()> {
        let popup = matches!(self.overlay, Some(OverlayKind::Warning));
        if let Some(terminal) = &mut self.terminal {
            terminal.draw(|frame| render_view(frame, view, popup))?;
        }
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        // Never leave the terminal in raw mode, even on a fatal error path.
        let _ = self.leave();
    }
}

/// Draw one view. `popup` confines it to a small bordered box in the middle
/// of the terminal (the warning overlay); otherwise it fills the area.
pub fn render_view(frame: &mut Frame, view: &View, popup: bool) {
    let area = if popup {
        let rect = popup_rect(frame.area(), view);
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        inner
    } else {
        frame.area()
    };
    render_content(frame, view, area);
}

fn render_content(frame: &mut Frame, view: &View, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim_italic = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);

    let message_height = if view.message.is_empty() {
        0
    } else {
        view.message.lines().count() as u16
    };
    let time_height = u16::from(view.remaining.is_some());
    let gauge_height = u16::from(matches!(view.kind, ViewKind::Warning | ViewKind::Break));

    let message_gap = u16::from(message_height > 0);
    let counter_gap = u16::from(time_height + gauge_height > 0);
    let hint_gap = u16::from(view.hint.is_some());

    let content = 1
        + message_gap
        + message_height
        + counter_gap
        + time_height
        + gauge_height
        + hint_gap * 2;
    let top = area.height.saturating_sub(content) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(top),
            Constraint::Length(1), // title
            Constraint::Length(message_gap),
            Constraint::Length(message_height),
            Constraint::Length(counter_gap),
            Constraint::Length(time_height),
            Constraint::Length(gauge_height),
            Constraint::Length(hint_gap),
            Constraint::Length(hint_gap), // hint line
            Constraint::Min(0),
        ])
        .split(area);

    let title = Paragraph::new(Span::styled(view.title.clone(), bold))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[1]);

    if message_height > 0 {
        let message = Paragraph::new(view.message.clone())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, chunks[3]);
    }

    if let Some(remaining) = view.remaining {
        let timer = Paragraph::new(Span::styled(format_time(remaining), bold))
            .alignment(Alignment::Center);
        frame.render_widget(timer, chunks[5]);
    }

    if gauge_height > 0 {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
            .label("")
            .ratio(view.progress.clamp(0.0, 1.0));
        frame.render_widget(gauge, gauge_area(chunks[6]));
    }

    if let Some(hint) = &view.hint {
        let hint = Paragraph::new(Span::styled(hint.clone(), dim_italic))
            .alignment(Alignment::Center);
        frame.render_widget(hint, chunks[8]);
    }
}

fn gauge_area(row: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(row);
    chunks[1]
}

/// Centered box sized to the warning's widest line, clamped to the terminal.
fn popup_rect(area: Rect, view: &View) -> Rect {
    let hint_width = view.hint.as_deref().map_or(0, UnicodeWidthStr::width);
    let want_width = (view.title.width().max(hint_width) as u16).saturating_add(8);
    let want_height = 9;

    let width = want_width.max(20).min(area.width);
    let height = want_height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// mm:ss with the final partial second rounded up, so a countdown reaches
/// 0:00 exactly when the phase ends.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).ceil() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
