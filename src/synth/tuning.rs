//! Equal-temperament tuning table

use std::sync::OnceLock;

use super::NoteId;

/// Frequency multipliers relative to the base pitch, one per key
#[derive(Debug, Clone, Copy)]
pub struct TuningTable {
    multipliers: [f64; NoteId::ALL.len()],
}

impl TuningTable {
    /// Twelve-tone equal temperament: multiplier = 2^(semitone / 12)
    pub fn equal_temperament() -> Self {
        let mut multipliers = [0.0; NoteId::ALL.len()];
        for note in NoteId::ALL {
            multipliers[note.semitone() as usize] = 2.0f64.powf(note.semitone() as f64 / 12.0);
        }
        Self { multipliers }
    }

    /// Shared table, computed on first use
    pub fn standard() -> &'static Self {
        static TABLE: OnceLock<TuningTable> = OnceLock::new();
        TABLE.get_or_init(Self::equal_temperament)
    }

    /// Multiplier for a note
    pub fn multiplier(&self, note: NoteId) -> f64 {
        self.multipliers[note.semitone() as usize]
    }

    /// Frequency of a note for the given base pitch
    pub fn frequency(&self, note: NoteId, base_frequency: f64) -> f64 {
        base_frequency * self.multiplier(note)
    }
}

impl Default for TuningTable {
    fn default() -> Self {
        Self::equal_temperament()
    }
}

/// Multiplier for a note in the standard table
pub fn frequency_multiplier(note: NoteId) -> f64 {
    TuningTable::standard().multiplier(note)
}
