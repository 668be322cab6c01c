//! Computer keyboard bindings and held-key tracking

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::synth::{NoteId, Waveform};

/// Two rows of a QWERTY keyboard laid out like piano keys, C4 to E5
const NOTE_KEYS: [char; 17] = [
    'a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k', 'o', 'l', 'p', ';',
];

pub const BASE_FREQUENCY_STEP: f64 = 1.0;
pub const VOLUME_STEP: f64 = 0.05;
pub const TIME_STEP: f64 = 0.05;

pub fn note_for_key(c: char) -> Option<NoteId> {
    let c = c.to_ascii_lowercase();
    NOTE_KEYS
        .iter()
        .position(|&k| k == c)
        .and_then(|i| NoteId::from_semitone(i as u8).ok())
}

pub fn key_for_note(note: NoteId) -> char {
    NOTE_KEYS[note.semitone() as usize]
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    Note(NoteId),
    SetWaveform(Waveform),
    NudgeBaseFrequency(f64),
    NudgeVolume(f64),
    NudgeAttack(f64),
    NudgeRelease(f64),
}

pub fn action_for(key: &KeyEvent) -> Option<Action> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
        (KeyCode::Esc, _) | (KeyCode::Char('q'), _) => Some(Action::Quit),
        (KeyCode::Char('1'), _) => Some(Action::SetWaveform(Waveform::Sine)),
        (KeyCode::Char('2'), _) => Some(Action::SetWaveform(Waveform::Square)),
        (KeyCode::Char('3'), _) => Some(Action::SetWaveform(Waveform::Sawtooth)),
        (KeyCode::Char('4'), _) => Some(Action::SetWaveform(Waveform::Triangle)),
        (KeyCode::Left, _) => Some(Action::NudgeBaseFrequency(-BASE_FREQUENCY_STEP)),
        (KeyCode::Right, _) => Some(Action::NudgeBaseFrequency(BASE_FREQUENCY_STEP)),
        (KeyCode::Down, _) => Some(Action::NudgeVolume(-VOLUME_STEP)),
        (KeyCode::Up, _) => Some(Action::NudgeVolume(VOLUME_STEP)),
        (KeyCode::Char('z'), _) => Some(Action::NudgeAttack(-TIME_STEP)),
        (KeyCode::Char('x'), _) => Some(Action::NudgeAttack(TIME_STEP)),
        (KeyCode::Char('c'), _) => Some(Action::NudgeRelease(-TIME_STEP)),
        (KeyCode::Char('v'), _) => Some(Action::NudgeRelease(TIME_STEP)),
        (KeyCode::Char(c), _) => note_for_key(c).map(Action::Note),
        _ => None,
    }
}

/// Which notes the user is holding down
///
/// Terminals without key-release reporting only send presses and repeats,
/// so a key counts as released once it has been quiet for `timeout`.
pub struct KeyTracker {
    held: HashMap<NoteId, Instant>,
    timeout: Duration,
    reports_release: bool,
}

impl KeyTracker {
    pub fn new(timeout: Duration, reports_release: bool) -> Self {
        Self {
            held: HashMap::new(),
            timeout,
            reports_release,
        }
    }

    /// Record a press or repeat; true if the note was not already held
    pub fn press(&mut self, note: NoteId, at: Instant) -> bool {
        self.held.insert(note, at).is_none()
    }

    /// Record a release; true if the note was held
    pub fn release(&mut self, note: NoteId) -> bool {
        self.held.remove(&note).is_some()
    }

    /// Notes that timed out, in pitch order; always empty when releases are reported
    pub fn expire(&mut self, now: Instant) -> Vec<NoteId> {
        if self.reports_release {
            return Vec::new();
        }

        let mut expired: Vec<NoteId> = self
            .held
            .iter()
            .filter(|(_, &seen)| now.saturating_duration_since(seen) >= self.timeout)
            .map(|(&note, _)| note)
            .collect();
        expired.sort();
        for note in &expired {
            self.held.remove(note);
        }
        expired
    }
}
