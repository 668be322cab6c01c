//! Note identifiers for the 17-key keyboard

use std::fmt;
use std::str::FromStr;

use crate::error::SynthError;

/// One key of the keyboard, C4 up to E5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoteId {
    C4,
    CSharp4,
    D4,
    DSharp4,
    E4,
    F4,
    FSharp4,
    G4,
    GSharp4,
    A4,
    ASharp4,
    B4,
    C5,
    CSharp5,
    D5,
    DSharp5,
    E5,
}

impl NoteId {
    /// Every key in ascending pitch order
    pub const ALL: [NoteId; 17] = [
        NoteId::C4,
        NoteId::CSharp4,
        NoteId::D4,
        NoteId::DSharp4,
        NoteId::E4,
        NoteId::F4,
        NoteId::FSharp4,
        NoteId::G4,
        NoteId::GSharp4,
        NoteId::A4,
        NoteId::ASharp4,
        NoteId::B4,
        NoteId::C5,
        NoteId::CSharp5,
        NoteId::D5,
        NoteId::DSharp5,
        NoteId::E5,
    ];

    /// The root of the keyboard, multiplier 1.0
    pub const ROOT: NoteId = NoteId::C4;

    /// Semitones above the root
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Look up a note by its semitone distance from the root
    pub fn from_semitone(semitone: u8) -> Result<Self, SynthError> {
        Self::ALL
            .get(semitone as usize)
            .copied()
            .ok_or_else(|| SynthError::UnknownNote(format!("semitone {}", semitone)))
    }

    /// Scientific pitch name, e.g. "C#4"
    pub fn name(self) -> &'static str {
        match self {
            NoteId::C4 => "C4",
            NoteId::CSharp4 => "C#4",
            NoteId::D4 => "D4",
            NoteId::DSharp4 => "D#4",
            NoteId::E4 => "E4",
            NoteId::F4 => "F4",
            NoteId::FSharp4 => "F#4",
            NoteId::G4 => "G4",
            NoteId::GSharp4 => "G#4",
            NoteId::A4 => "A4",
            NoteId::ASharp4 => "A#4",
            NoteId::B4 => "B4",
            NoteId::C5 => "C5",
            NoteId::CSharp5 => "C#5",
            NoteId::D5 => "D5",
            NoteId::DSharp5 => "D#5",
            NoteId::E5 => "E5",
        }
    }

    /// Whether this is a black key on a piano layout
    pub fn is_sharp(self) -> bool {
        self.name().contains('#')
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoteId {
    type Err = SynthError;

    /// Accepts "C#4", "c#4", and the flat spellings "Db4" etc.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = match trimmed.to_ascii_uppercase().as_str() {
            "DB4" => "C#4".to_string(),
            "EB4" => "D#4".to_string(),
            "GB4" => "F#4".to_string(),
            "AB4" => "G#4".to_string(),
            "BB4" => "A#4".to_string(),
            "DB5" => "C#5".to_string(),
            "EB5" => "D#5".to_string(),
            other => other.to_string(),
        };

        Self::ALL
            .iter()
            .copied()
            .find(|note| note.name() == normalized)
            .ok_or_else(|| SynthError::UnknownNote(trimmed.to_string()))
    }
}
