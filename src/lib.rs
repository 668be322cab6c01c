//! Keysynth - A virtual keyboard synthesizer for the terminal
//!
//! Seventeen keys of tone synthesis with attack/release envelopes,
//! played from the computer keyboard and watched on a live oscilloscope.

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod scope;
pub mod synth;
pub mod viz;

pub use config::KeysynthConfig;
pub use control::ControlSurface;
pub use engine::Engine;
pub use error::SynthError;
