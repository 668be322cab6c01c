//! Synthesis core
//!
//! Contains the tuning table, oscillators, gain envelopes, voices and the
//! registry of active voices.

mod envelope;
mod note;
mod oscillator;
mod registry;
mod settings;
mod tuning;
mod voice;

pub use envelope::{AutomationEvent, Envelope};
pub use note::NoteId;
pub use oscillator::{Oscillator, Waveform};
pub use registry::VoiceRegistry;
pub use settings::SynthSettings;
pub use tuning::{frequency_multiplier, TuningTable};
pub use voice::Voice;
