//! One sounding note: oscillator plus attack/release gain envelope

use log::debug;

use super::{frequency_multiplier, NoteId, SynthSettings, Waveform};
use crate::engine::{Engine, NodeId};
use crate::error::Result;

/// Handle to a note playing on the engine
///
/// The engine owns the oscillator and gain stage. Stopping consumes the
/// handle; the engine drops the node once its scheduled termination passes.
#[derive(Debug)]
pub struct Voice {
    note: NoteId,
    frequency: f64,
    node: NodeId,
    started_at: f64,
}

impl Voice {
    /// Start `note` at `now` with a linear attack from silence to full gain
    pub fn start(note: NoteId, settings: &SynthSettings, bus: &mut Engine, now: f64) -> Result<Self> {
        let frequency = settings.base_frequency * frequency_multiplier(note);
        let node = bus.spawn_voice_node(note, settings.waveform, frequency, now)?;

        let gain = bus.envelope_mut(node)?;
        gain.set_value_at_time(0.0, now);
        gain.linear_ramp_to_value_at_time(1.0, now + settings.attack);

        debug!("{} on at {:.3}s, {:.2} Hz", note, now, frequency);
        Ok(Self {
            note,
            frequency,
            node,
            started_at: now,
        })
    }

    pub fn note(&self) -> NoteId {
        self.note
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Change pitch in place; phase and envelope carry on
    pub fn retune(&mut self, bus: &mut Engine, frequency: f64) -> Result<()> {
        bus.set_frequency(self.node, frequency)?;
        self.frequency = frequency;
        Ok(())
    }

    /// Change waveform in place; phase and envelope carry on
    pub fn rewave(&self, bus: &mut Engine, waveform: Waveform) -> Result<()> {
        bus.set_waveform(self.node, waveform)
    }

    /// Release from the current gain down to silence, returning the termination time
    pub fn stop(self, settings: &SynthSettings, bus: &mut Engine, now: f64) -> Result<f64> {
        let end = now + settings.release;

        let gain = bus.envelope_mut(self.node)?;
        let current = gain.value_at(now);
        gain.cancel_scheduled_values(now);
        gain.set_value_at_time(current, now);
        gain.linear_ramp_to_value_at_time(0.0, end);
        bus.schedule_stop(self.node, end)?;

        debug!(
            "{} off at {:.3}s after {:.3}s held, from gain {:.3}, ends {:.3}s",
            self.note,
            now,
            now - self.started_at,
            current,
            end
        );
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthError;
    use crate::scope::SignalTap;

    fn engine() -> Engine {
        Engine::new(1000.0, 1.0, SignalTap::new(32))
    }

    #[test]
    fn test_start_computes_frequency() {
        let mut bus = engine();
        let voice = Voice::start(NoteId::G4, &SynthSettings::default(), &mut bus, 0.0).unwrap();

        assert!((voice.frequency() - 392.0).abs() < 0.01);
        assert_eq!(bus.frequency(voice.node()), Some(voice.frequency()));
        assert_eq!(bus.waveform(voice.node()), Some(Waveform::Sine));
        assert_eq!(voice.started_at, 0.0);
    }

    #[test]
    fn test_attack_ramps_from_zero() {
        let mut bus = engine();
        let voice = Voice::start(NoteId::C4, &SynthSettings::default(), &mut bus, 0.0).unwrap();

        assert_eq!(bus.gain(voice.node()), Some(0.0));
        for _ in 0..50 {
            bus.process();
        }
        let halfway = bus.gain(voice.node()).unwrap();
        assert!((halfway - 0.5).abs() < 1e-9);
        for _ in 0..100 {
            bus.process();
        }
        assert_eq!(bus.gain(voice.node()), Some(1.0));
    }

    #[test]
    fn test_double_start_rejected() {
        let mut bus = engine();
        let settings = SynthSettings::default();
        let _voice = Voice::start(NoteId::A4, &settings, &mut bus, 0.0).unwrap();

        let err = Voice::start(NoteId::A4, &settings, &mut bus, 0.0).unwrap_err();
        assert_eq!(err, SynthError::VoiceAlreadyActive(NoteId::A4));
        assert_eq!(bus.node_count(), 1);
    }

    #[test]
    fn test_stop_releases_from_current_gain() {
        let mut bus = engine();
        let settings = SynthSettings::default();
        let voice = Voice::start(NoteId::E4, &settings, &mut bus, 0.0).unwrap();
        let node = voice.node();

        for _ in 0..50 {
            bus.process();
        }
        let now = bus.current_time();
        let end = voice.stop(&settings, &mut bus, now).unwrap();

        assert!((end - (now + 0.3)).abs() < 1e-12);
        assert!((bus.gain(node).unwrap() - 0.5).abs() < 1e-9);

        for _ in 0..150 {
            bus.process();
        }
        assert!((bus.gain(node).unwrap() - 0.25).abs() < 1e-9);

        for _ in 0..200 {
            bus.process();
        }
        assert!(!bus.contains(node));
    }

    #[test]
    fn test_zero_attack_and_release() {
        let mut bus = engine();
        let settings = SynthSettings {
            attack: 0.0,
            release: 0.0,
            ..SynthSettings::default()
        };

        let voice = Voice::start(NoteId::C4, &settings, &mut bus, 0.0).unwrap();
        let node = voice.node();
        assert_eq!(bus.gain(node), Some(1.0));

        for _ in 0..10 {
            bus.process();
        }
        let now = bus.current_time();
        let end = voice.stop(&settings, &mut bus, now).unwrap();

        assert_eq!(end, now);
        assert_eq!(bus.gain(node), Some(0.0));
        bus.process();
        assert!(!bus.contains(node));
    }

    #[test]
    fn test_retune_and_rewave_in_place() {
        let mut bus = engine();
        let mut voice = Voice::start(NoteId::C4, &SynthSettings::default(), &mut bus, 0.0).unwrap();
        for _ in 0..20 {
            bus.process();
        }
        let gain_before = bus.gain(voice.node());

        voice.retune(&mut bus, 300.0).unwrap();
        voice.rewave(&mut bus, Waveform::Triangle).unwrap();

        assert_eq!(voice.frequency(), 300.0);
        assert_eq!(bus.frequency(voice.node()), Some(300.0));
        assert_eq!(bus.waveform(voice.node()), Some(Waveform::Triangle));
        assert_eq!(bus.gain(voice.node()), gain_before);
        assert_eq!(bus.node_count(), 1);
    }
}
