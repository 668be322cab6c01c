//! Active voices, at most one per note

use std::collections::BTreeMap;

use log::trace;

use super::{NoteId, SynthSettings, Voice};
use crate::engine::Engine;
use crate::error::Result;

/// Logical membership of sounding notes
///
/// An entry exists from note-on until note-off. Release tails keep playing
/// on the engine after the entry is gone.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: BTreeMap<NoteId, Voice>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `note` unless it is already sounding; returns whether a voice was started
    pub fn note_on(&mut self, note: NoteId, settings: &SynthSettings, bus: &mut Engine) -> Result<bool> {
        if self.is_active(note) {
            trace!("{} already active, ignoring note-on", note);
            return Ok(false);
        }

        let now = bus.current_time();
        let voice = Voice::start(note, settings, bus, now)?;
        self.voices.insert(note, voice);
        Ok(true)
    }

    /// Release `note` if it is sounding; returns the scheduled termination time
    pub fn note_off(&mut self, note: NoteId, settings: &SynthSettings, bus: &mut Engine) -> Result<Option<f64>> {
        let Some(voice) = self.voices.remove(&note) else {
            trace!("{} not active, ignoring note-off", note);
            return Ok(None);
        };

        let now = bus.current_time();
        voice.stop(settings, bus, now).map(Some)
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_active(&self, note: NoteId) -> bool {
        self.voices.contains_key(&note)
    }

    /// Active voices in pitch order
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.values()
    }

    /// Apply `update` to every active voice, stopping at the first failure
    pub fn update_all<F>(&mut self, bus: &mut Engine, mut update: F) -> Result<()>
    where
        F: FnMut(&mut Voice, &mut Engine) -> Result<()>,
    {
        for voice in self.voices.values_mut() {
            update(voice, &mut *bus)?;
        }
        Ok(())
    }
}
