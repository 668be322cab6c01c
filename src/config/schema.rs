//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::synth::SynthSettings;

/// Main configuration for keysynth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysynthConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Initial synth settings (waveform, pitch, volume, envelope)
    #[serde(default)]
    pub synth: SynthSettings,

    /// Oscilloscope settings
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Computer keyboard behaviour
    #[serde(default)]
    pub keyboard: KeyboardConfig,
}

impl KeysynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate audio settings
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        // Validate synth settings
        self.synth.validate()?;

        // Validate scope settings
        if !self.scope.fft_size.is_power_of_two()
            || self.scope.fft_size < 32
            || self.scope.fft_size > 32768
        {
            bail!("FFT size must be a power of two between 32 and 32768");
        }
        if self.scope.frame_rate == 0 || self.scope.frame_rate > 240 {
            bail!("Frame rate must be between 1 and 240");
        }
        if self.scope.grid_columns > 64 || self.scope.grid_rows > 64 {
            bail!("Grid may have at most 64 columns and 64 rows");
        }

        if self.keyboard.release_timeout_ms < 50 {
            bail!("Key release timeout must be at least 50 ms");
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz until a device is opened (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

/// Oscilloscope configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Analysis window in samples; the scope shows half of it (default: 2048)
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    /// Vertical grid divisions (default: 10)
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,

    /// Horizontal grid divisions (default: 8)
    #[serde(default = "default_grid_rows")]
    pub grid_rows: usize,

    /// Redraws per second (default: 60)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_fft_size() -> usize { 2048 }
fn default_grid_columns() -> usize { 10 }
fn default_grid_rows() -> usize { 8 }
fn default_frame_rate() -> u32 { 60 }

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            grid_columns: default_grid_columns(),
            grid_rows: default_grid_rows(),
            frame_rate: default_frame_rate(),
        }
    }
}

/// Computer keyboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Release a held key after this long without a press or repeat,
    /// on terminals that cannot report key releases (default: 600)
    #[serde(default = "default_release_timeout_ms")]
    pub release_timeout_ms: u64,
}

fn default_release_timeout_ms() -> u64 { 600 }

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            release_timeout_ms: default_release_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Waveform;

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512); // default
        assert!(config.device.is_none());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: KeysynthConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.synth, SynthSettings::default());
        assert_eq!(config.scope.fft_size, 2048);
        assert_eq!(config.keyboard.release_timeout_ms, 600);
    }

    #[test]
    fn test_synth_section() {
        let yaml = r#"
synth:
  waveform: triangle
  base_frequency: 220.0
  volume: 0.8
"#;
        let config: KeysynthConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.synth.waveform, Waveform::Triangle);
        assert_eq!(config.synth.base_frequency, 220.0);
        assert_eq!(config.synth.volume, 0.8);
        assert_eq!(config.synth.attack, 0.1);
    }

    #[test]
    fn test_unknown_waveform_rejected() {
        let yaml = "synth:\n  waveform: noise\n";
        assert!(serde_yaml::from_str::<KeysynthConfig>(yaml).is_err());
    }

    #[test]
    fn test_invalid_volume() {
        let mut config = KeysynthConfig::default();
        config.synth.volume = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_fft_size() {
        let mut config = KeysynthConfig::default();
        config.scope.fft_size = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_frame_rate() {
        let mut config = KeysynthConfig::default();
        config.scope.frame_rate = 0;
        assert!(config.validate().is_err());
    }
}
