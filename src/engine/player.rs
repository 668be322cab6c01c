//! Real-time audio playback using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

use super::Engine;
use crate::error::{Result, SynthError};

/// Something that pulls samples from the engine and sends them to a listener
pub trait AudioOutput {
    /// Begin pulling audio; called once, at the first user interaction
    fn start(&mut self, engine: Arc<Mutex<Engine>>) -> Result<()>;

    /// Stop pulling audio
    fn stop(&mut self);

    /// Check if currently playing
    fn is_playing(&self) -> bool;
}

/// Real-time audio player
pub struct Player {
    device_name: Option<String>,
    buffer_size: Option<u32>,
    stream: Option<Stream>,
}

impl Player {
    /// Create a player for the named device, or the default output
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            buffer_size: None,
            stream: None,
        }
    }

    /// Ask for a fixed callback size in frames when the device allows it
    pub fn with_buffer_size(mut self, frames: u32) -> Self {
        self.buffer_size = Some(frames);
        self
    }

    fn find_device(&self) -> Result<Device> {
        let host = cpal::default_host();

        if let Some(wanted) = &self.device_name {
            let devices = host
                .output_devices()
                .map_err(|e| SynthError::AudioInit(e.to_string()))?;
            for device in devices {
                if device.name().map(|n| &n == wanted).unwrap_or(false) {
                    return Ok(device);
                }
            }
            warn!("output device '{}' not found, using default", wanted);
        }

        host.default_output_device()
            .ok_or_else(|| SynthError::AudioInit("no output device available".to_string()))
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        device: &Device,
        config: &StreamConfig,
        engine: Arc<Mutex<Engine>>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;

        let mut mono: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    if mono.len() < frames {
                        mono.resize(frames, 0.0);
                    }

                    match lock_briefly(&engine) {
                        Some(mut eng) => eng.fill_buffer(&mut mono[..frames]),
                        // Control thread kept the engine for the whole retry window
                        None => mono[..frames].fill(0.0),
                    }
                    write_interleaved(data, &mono[..frames], channels);
                },
                |err| {
                    error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SynthError::AudioInit(e.to_string()))?;

        Ok(stream)
    }
}

impl AudioOutput for Player {
    fn start(&mut self, engine: Arc<Mutex<Engine>>) -> Result<()> {
        let device = self.find_device()?;
        let config = device
            .default_output_config()
            .map_err(|e| SynthError::AudioInit(e.to_string()))?;
        let sample_format = config.sample_format();
        let buffer_size = pick_buffer_size(self.buffer_size, config.buffer_size());
        let mut stream_config: StreamConfig = config.into();
        stream_config.buffer_size = buffer_size;

        engine
            .lock()
            .map_err(|_| SynthError::EngineUnavailable)?
            .set_sample_rate(stream_config.sample_rate.0 as f64);

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &stream_config, engine)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &stream_config, engine)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &stream_config, engine)?,
            other => {
                return Err(SynthError::AudioInit(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| SynthError::AudioInit(e.to_string()))?;
        info!(
            "playing on '{}' at {} Hz, {} channels",
            device.name().unwrap_or_default(),
            stream_config.sample_rate.0,
            stream_config.channels
        );
        self.stream = Some(stream);

        Ok(())
    }

    fn stop(&mut self) {
        self.stream = None;
    }

    fn is_playing(&self) -> bool {
        self.stream.is_some()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Attempts before a callback gives up on the engine and plays silence
const LOCK_ATTEMPTS: usize = 256;

/// Try the engine lock a bounded number of times without blocking
fn lock_briefly<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    for _ in 0..LOCK_ATTEMPTS {
        match mutex.try_lock() {
            Ok(guard) => return Some(guard),
            Err(std::sync::TryLockError::WouldBlock) => std::hint::spin_loop(),
            Err(std::sync::TryLockError::Poisoned(_)) => return None,
        }
    }
    None
}

/// Copy mono samples to every channel, clamped to [-1, 1]
fn write_interleaved<T: cpal::Sample + cpal::FromSample<f32>>(data: &mut [T], mono: &[f32], channels: usize) {
    for (frame, &sample) in data.chunks_mut(channels).zip(mono) {
        let sample = sample.clamp(-1.0, 1.0);
        for channel_sample in frame.iter_mut() {
            *channel_sample = T::from_sample(sample);
        }
    }
}

fn pick_buffer_size(wanted: Option<u32>, supported: &SupportedBufferSize) -> BufferSize {
    match (wanted, supported) {
        (Some(frames), SupportedBufferSize::Range { min, max }) if (*min..=*max).contains(&frames) => {
            BufferSize::Fixed(frames)
        }
        (Some(frames), _) => {
            debug!("buffer size {} not supported by device, using its default", frames);
            BufferSize::Default
        }
        (None, _) => BufferSize::Default,
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
