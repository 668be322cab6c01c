//! Session-wide synth settings

use serde::{Deserialize, Serialize};

use super::Waveform;
use crate::error::{Result, SynthError};

/// Parameters every new voice is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthSettings {
    /// Oscillator shape (default: sine)
    #[serde(default)]
    pub waveform: Waveform,

    /// Pitch of the root key in Hz (default: 261.63, middle C)
    #[serde(default = "default_base_frequency")]
    pub base_frequency: f64,

    /// Master volume 0.0-1.0 (default: 0.5)
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Attack time in seconds (default: 0.1)
    #[serde(default = "default_attack")]
    pub attack: f64,

    /// Release time in seconds (default: 0.3)
    #[serde(default = "default_release")]
    pub release: f64,
}

fn default_base_frequency() -> f64 { 261.63 }
fn default_volume() -> f64 { 0.5 }
fn default_attack() -> f64 { 0.1 }
fn default_release() -> f64 { 0.3 }

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            base_frequency: default_base_frequency(),
            volume: default_volume(),
            attack: default_attack(),
            release: default_release(),
        }
    }
}

impl SynthSettings {
    /// Check every field against its range
    pub fn validate(&self) -> Result<()> {
        check_frequency(self.base_frequency)?;
        check_volume(self.volume)?;
        check_time("attack", self.attack)?;
        check_time("release", self.release)?;
        Ok(())
    }

    pub fn set_base_frequency(&mut self, hz: f64) -> Result<()> {
        self.base_frequency = check_frequency(hz)?;
        Ok(())
    }

    pub fn set_volume(&mut self, level: f64) -> Result<()> {
        self.volume = check_volume(level)?;
        Ok(())
    }

    pub fn set_attack(&mut self, seconds: f64) -> Result<()> {
        self.attack = check_time("attack", seconds)?;
        Ok(())
    }

    pub fn set_release(&mut self, seconds: f64) -> Result<()> {
        self.release = check_time("release", seconds)?;
        Ok(())
    }
}

fn check_frequency(hz: f64) -> Result<f64> {
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(SynthError::InvalidParameter {
            name: "base_frequency",
            value: hz,
        })
    }
}

fn check_volume(level: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&level) {
        Ok(level)
    } else {
        Err(SynthError::InvalidParameter {
            name: "volume",
            value: level,
        })
    }
}

fn check_time(name: &'static str, seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(SynthError::InvalidParameter {
            name,
            value: seconds,
        })
    }
}
