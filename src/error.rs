//! Error types for the synthesis core

use thiserror::Error;

use crate::engine::NodeId;
use crate::synth::NoteId;

/// Errors raised by the tuning table, voices, and the control surface
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SynthError {
    /// A note identifier outside the keyboard range
    #[error("unknown note '{0}'")]
    UnknownNote(String),

    /// A waveform name outside sine, square, sawtooth, triangle
    #[error("unknown waveform '{0}'")]
    UnknownWaveform(String),

    /// A second start for a note whose voice is still held
    #[error("voice for {0} is already active")]
    VoiceAlreadyActive(NoteId),

    /// The host could not provide an audio output
    #[error("audio initialization failed: {0}")]
    AudioInit(String),

    /// A control value outside its valid range
    #[error("invalid value {value} for {name}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The engine no longer owns the node a voice points at
    #[error("engine node {0:?} not found")]
    NodeNotFound(NodeId),

    /// The engine lock was poisoned by a panicking thread
    #[error("audio engine unavailable")]
    EngineUnavailable,
}

pub type Result<T> = std::result::Result<T, SynthError>;
