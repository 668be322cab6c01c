//! Terminal interface for keysynth
//!
//! Provides a TUI showing:
//! - Oscilloscope of the output bus
//! - Piano keyboard with the sounding keys lit
//! - Current synth settings and held note frequencies

mod keyboard;
mod keys;
mod scope_view;

pub use keyboard::Keyboard;
pub use keys::{action_for, key_for_note, note_for_key, Action, KeyTracker};
pub use scope_view::{surface_size, ScopeView};

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, Event, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::config::KeysynthConfig;
use crate::control::{BusStatus, ControlSurface};
use crate::error::SynthError;
use crate::scope::{CancelToken, FrameLoop};
use crate::synth::NoteId;

/// Interface state between frames
pub struct App {
    control: ControlSurface,
    tracker: KeyTracker,
    cancel: CancelToken,
    message: Option<String>,
}

impl App {
    pub fn new(control: ControlSurface, tracker: KeyTracker, cancel: CancelToken) -> Self {
        Self {
            control,
            tracker,
            cancel,
            message: None,
        }
    }

    /// Handle one key event
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Release && !self.control.is_live() {
            match self.control.on_first_user_interaction() {
                Ok(_) => self.message = None,
                Err(err) => self.message = Some(format!("Audio unavailable: {}", err)),
            }
        }

        let Some(action) = action_for(&key) else {
            return;
        };

        let result = match action {
            Action::Note(note) => self.on_note(note, key.kind, now),
            _ if key.kind == KeyEventKind::Release => Ok(()),
            Action::Quit => {
                self.cancel.cancel();
                Ok(())
            }
            Action::SetWaveform(waveform) => self.control.on_waveform_change(waveform),
            Action::NudgeBaseFrequency(delta) => {
                let hz = nudge(self.control.settings().base_frequency, delta, 1.0, 20_000.0);
                self.control.on_base_frequency_change(hz).map(|_| ())
            }
            Action::NudgeVolume(delta) => {
                let level = nudge(self.control.settings().volume, delta, 0.0, 1.0);
                self.control.on_volume_change(level)
            }
            Action::NudgeAttack(delta) => {
                let seconds = nudge(self.control.settings().attack, delta, 0.0, 10.0);
                self.control.on_attack_change(seconds)
            }
            Action::NudgeRelease(delta) => {
                let seconds = nudge(self.control.settings().release, delta, 0.0, 10.0);
                self.control.on_release_change(seconds)
            }
        };

        if let Err(err) = result {
            warn!("{}", err);
            self.message = Some(err.to_string());
        }
    }

    fn on_note(&mut self, note: NoteId, kind: KeyEventKind, now: Instant) -> Result<(), SynthError> {
        match kind {
            KeyEventKind::Release => {
                if self.tracker.release(note) {
                    self.control.on_note_up(note)?;
                }
            }
            _ => {
                if self.tracker.press(note, now) {
                    if let Err(err) = self.control.on_note_down(note) {
                        // Not sounding, so the next press must try again
                        self.tracker.release(note);
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    /// Release keys whose repeats have stopped
    pub fn expire_keys(&mut self, now: Instant) {
        for note in self.tracker.expire(now) {
            if let Err(err) = self.control.on_note_up(note) {
                warn!("{}", err);
                self.message = Some(err.to_string());
            }
        }
    }

    fn drain_events(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.on_key(key, Instant::now());
            }
        }
        Ok(())
    }
}

/// Step a slider value, rounded to hundredths
fn nudge(value: f64, delta: f64, min: f64, max: f64) -> f64 {
    ((value + delta) * 100.0).round().clamp(min * 100.0, max * 100.0) / 100.0
}

/// Run the keyboard TUI until the user quits
pub fn run(config: &KeysynthConfig, control: ControlSurface) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let reports_release = matches!(supports_keyboard_enhancement(), Ok(true));
    if reports_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    } else {
        log::info!(
            "terminal does not report key releases, releasing after {} ms without repeats",
            config.keyboard.release_timeout_ms
        );
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let frames = FrameLoop::new(config.scope.frame_rate, CancelToken::new());
    log::debug!("redrawing every {:?}", frames.interval());
    let tracker = KeyTracker::new(
        Duration::from_millis(config.keyboard.release_timeout_ms),
        reports_release,
    );
    let mut app = App::new(control, tracker, frames.token());

    // Main loop
    let result = frames.run(|_| {
        app.drain_events()?;
        app.expire_keys(Instant::now());
        terminal.draw(|f| draw_ui(f, &mut app))?;
        Ok(())
    });

    // Cleanup
    app.control.shutdown();
    if reports_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result.map(|_| ())
}

fn draw_ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Layout: scope on top, keyboard, status at bottom
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // Scope
            Constraint::Length(6), // Keyboard
            Constraint::Length(5), // Status
        ])
        .split(area);

    draw_scope(f, chunks[0], app);
    draw_keyboard(f, chunks[1], app);
    draw_status(f, chunks[2], app);
}

fn draw_scope(f: &mut Frame, area: Rect, app: &mut App) {
    let title = if app.control.is_live() {
        " Scope "
    } else {
        " Scope (press any key to start audio) "
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let (width, height) = surface_size(block.inner(area));
    let frame = app.control.scope_frame(width, height);

    f.render_widget(ScopeView::new(&frame, width, height).block(block), area);
}

fn draw_keyboard(f: &mut Frame, area: Rect, app: &App) {
    let active: Vec<NoteId> = app.control.registry().voices().map(|v| v.note()).collect();
    let keyboard =
        Keyboard::new(&active).block(Block::default().borders(Borders::ALL).title(" Keys "));
    f.render_widget(keyboard, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let settings = app.control.settings();
    let status = app.control.bus_status();
    let (audio, audio_color) = if app.control.is_live() {
        ("LIVE", Color::Green)
    } else {
        ("IDLE", Color::Yellow)
    };

    let settings_line = Line::from(vec![
        Span::raw("  Audio: "),
        Span::styled(audio, Style::default().fg(audio_color)),
        Span::raw(match &status {
            Ok(status) => format!(" @ {:.0} Hz", status.sample_rate),
            Err(_) => String::new(),
        }),
        Span::raw(format!(
            "  |  Wave: {}  |  Base: {:.2} Hz  |  Volume: {:.0}%  |  Attack: {:.2}s  |  Release: {:.2}s",
            settings.waveform,
            settings.base_frequency,
            settings.volume * 100.0,
            settings.attack,
            settings.release,
        )),
    ]);

    let held_line = match &status {
        Ok(status) => Line::from(held_summary(status)),
        Err(_) => Line::from(Span::styled(
            "  Held: engine unavailable",
            Style::default().fg(Color::Red),
        )),
    };

    let help_line = match &app.message {
        Some(message) => Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(
            "  1-4: wave  |  Left/Right: base  |  Up/Down: volume  |  z/x: attack  |  c/v: release  |  q: quit",
        ),
    };

    let paragraph = Paragraph::new(vec![settings_line, held_line, help_line])
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(paragraph, area);
}

fn held_summary(status: &BusStatus) -> String {
    let held: Vec<String> = status
        .voices
        .iter()
        .map(|v| {
            format!(
                "{} {:.2} Hz {} {:.0}%",
                v.note,
                v.frequency,
                v.waveform,
                v.gain * 100.0
            )
        })
        .collect();

    format!(
        "  Held: {}  |  Nodes: {}",
        if held.is_empty() { "-".to_string() } else { held.join(", ") },
        status.nodes
    )
}
