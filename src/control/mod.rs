//! Control surface: the entry points a UI shell calls
//!
//! Owns the session's settings, the voice registry, the scope state machine
//! and the audio output. Each call takes the engine lock for the duration of
//! one scheduling step and never waits on audio.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};

use crate::config::KeysynthConfig;
use crate::engine::{AudioOutput, Engine};
use crate::error::{Result, SynthError};
use crate::scope::{DisplayList, Scope, ScopeRenderer, ScopeStyle, SignalTap};
use crate::synth::{frequency_multiplier, NoteId, SynthSettings, VoiceRegistry, Waveform};

/// What the audio bus is doing right now
#[derive(Debug, Clone, PartialEq)]
pub struct BusStatus {
    pub sample_rate: f64,
    pub master_volume: f64,
    /// Includes voices still in their release tail
    pub nodes: usize,
    /// Held voices in pitch order
    pub voices: Vec<VoiceLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLevel {
    pub note: NoteId,
    pub frequency: f64,
    pub waveform: Waveform,
    pub gain: f64,
}

/// Translates UI events into registry, engine and scope operations
pub struct ControlSurface {
    settings: SynthSettings,
    registry: VoiceRegistry,
    engine: Arc<Mutex<Engine>>,
    tap: SignalTap,
    scope: Scope,
    output: Box<dyn AudioOutput>,
}

impl ControlSurface {
    /// Build the session from configuration; audio does not start until the first interaction
    pub fn new(config: &KeysynthConfig, output: Box<dyn AudioOutput>) -> Result<Self> {
        config.synth.validate()?;

        let tap = SignalTap::new(config.scope.fft_size);
        let engine = Engine::new(config.audio.sample_rate as f64, config.synth.volume, tap.clone());
        let renderer = ScopeRenderer::new(
            ScopeStyle::default(),
            config.scope.grid_columns,
            config.scope.grid_rows,
        );

        Ok(Self {
            settings: config.synth.clone(),
            registry: VoiceRegistry::new(),
            engine: Arc::new(Mutex::new(engine)),
            tap,
            scope: Scope::new(renderer, config.scope.fft_size),
            output,
        })
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    pub fn registry(&self) -> &VoiceRegistry {
        &self.registry
    }

    /// Shared handle to the engine, as handed to the audio output
    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    pub fn is_live(&self) -> bool {
        self.scope.is_live()
    }

    pub fn on_note_down(&mut self, note: NoteId) -> Result<bool> {
        let mut engine = lock(&self.engine)?;
        self.registry.note_on(note, &self.settings, &mut engine)
    }

    pub fn on_note_up(&mut self, note: NoteId) -> Result<Option<f64>> {
        let mut engine = lock(&self.engine)?;
        let end = self.registry.note_off(note, &self.settings, &mut engine)?;
        if end.is_some() {
            debug!("{} released, {} nodes on the bus", note, engine.node_count());
        }
        Ok(end)
    }

    /// New waveform for future voices and every held one
    ///
    /// Settings change only once every held voice has been updated.
    pub fn on_waveform_change(&mut self, waveform: Waveform) -> Result<()> {
        let mut engine = lock(&self.engine)?;
        check_voices(&self.registry, &engine)?;
        self.registry
            .update_all(&mut engine, |voice, bus| voice.rewave(bus, waveform))?;

        self.settings.waveform = waveform;
        Ok(())
    }

    /// New base pitch; held notes are retuned and reported in pitch order
    pub fn on_base_frequency_change(&mut self, hz: f64) -> Result<Vec<(NoteId, f64)>> {
        let mut next = self.settings.clone();
        next.set_base_frequency(hz)?;

        let mut engine = lock(&self.engine)?;
        check_voices(&self.registry, &engine)?;

        let mut retuned = Vec::with_capacity(self.registry.active_count());
        self.registry.update_all(&mut engine, |voice, bus| {
            voice.retune(bus, hz * frequency_multiplier(voice.note()))?;
            retuned.push((voice.note(), voice.frequency()));
            Ok(())
        })?;

        self.settings = next;
        Ok(retuned)
    }

    /// Master bus gain only; voices are untouched
    pub fn on_volume_change(&mut self, level: f64) -> Result<()> {
        let mut next = self.settings.clone();
        next.set_volume(level)?;

        lock(&self.engine)?.set_master_volume(level);
        self.settings = next;
        Ok(())
    }

    /// Applies to voices started from now on
    pub fn on_attack_change(&mut self, seconds: f64) -> Result<()> {
        self.settings.set_attack(seconds)
    }

    /// Applies to voices released from now on
    pub fn on_release_change(&mut self, seconds: f64) -> Result<()> {
        self.settings.set_release(seconds)
    }

    /// Start audio and bring the scope live; returns false if already live
    ///
    /// On failure the scope stays Idle and a later call may try again.
    pub fn on_first_user_interaction(&mut self) -> Result<bool> {
        if self.scope.is_live() {
            return Ok(false);
        }

        if let Err(err) = self.output.start(self.engine()) {
            warn!("could not start audio: {}", err);
            return Err(err);
        }

        self.scope.go_live(self.tap.clone());
        info!("audio running, scope live");
        Ok(true)
    }

    /// Snapshot of the bus as the engine sees it
    pub fn bus_status(&self) -> Result<BusStatus> {
        let engine = lock(&self.engine)?;
        let voices = self
            .registry
            .voices()
            .filter_map(|voice| {
                let node = voice.node();
                Some(VoiceLevel {
                    note: voice.note(),
                    frequency: engine.frequency(node)?,
                    waveform: engine.waveform(node)?,
                    gain: engine.gain(node)?,
                })
            })
            .collect();

        Ok(BusStatus {
            sample_rate: engine.sample_rate(),
            master_volume: engine.master_volume(),
            nodes: engine.node_count(),
            voices,
        })
    }

    /// The scope picture for a surface of the given size
    pub fn scope_frame(&mut self, width: f64, height: f64) -> DisplayList {
        self.scope.frame(width, height)
    }

    /// Stop pulling audio; held voices are left as they are
    pub fn shutdown(&mut self) {
        self.output.stop();
    }
}

/// Fail before touching any voice if one has lost its node
fn check_voices(registry: &VoiceRegistry, engine: &Engine) -> Result<()> {
    match registry.voices().find(|voice| !engine.contains(voice.node())) {
        Some(voice) => Err(SynthError::NodeNotFound(voice.node())),
        None => Ok(()),
    }
}

fn lock(engine: &Mutex<Engine>) -> Result<MutexGuard<'_, Engine>> {
    engine.lock().map_err(|_| SynthError::EngineUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Output that never touches a device
    struct FakeOutput {
        starts: Rc<Cell<usize>>,
        fail: bool,
        playing: bool,
    }

    impl AudioOutput for FakeOutput {
        fn start(&mut self, _engine: Arc<Mutex<Engine>>) -> Result<()> {
            self.starts.set(self.starts.get() + 1);
            if self.fail {
                return Err(SynthError::AudioInit("no output device available".to_string()));
            }
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn surface_with(config: KeysynthConfig, fail: bool) -> (ControlSurface, Rc<Cell<usize>>) {
        let starts = Rc::new(Cell::new(0));
        let output = FakeOutput {
            starts: Rc::clone(&starts),
            fail,
            playing: false,
        };
        (ControlSurface::new(&config, Box::new(output)).unwrap(), starts)
    }

    fn surface() -> ControlSurface {
        surface_with(KeysynthConfig::default(), false).0
    }

    fn advance(control: &ControlSurface, samples: usize) {
        let engine = control.engine();
        let mut engine = engine.lock().unwrap();
        for _ in 0..samples {
            engine.process();
        }
    }

    fn held(control: &ControlSurface, note: NoteId) -> &crate::synth::Voice {
        control.registry().voices().find(|v| v.note() == note).unwrap()
    }

    fn poison(control: &ControlSurface) {
        let engine = control.engine();
        let _ = std::thread::spawn(move || {
            let _guard = engine.lock().unwrap();
            panic!("engine poisoned on purpose");
        })
        .join();
    }

    #[test]
    fn test_unavailable_engine_leaves_settings_unchanged() {
        let mut control = surface();
        control.on_note_down(NoteId::C4).unwrap();
        let node = held(&control, NoteId::C4).node();
        poison(&control);

        assert_eq!(
            control.on_waveform_change(Waveform::Square),
            Err(SynthError::EngineUnavailable)
        );
        assert_eq!(
            control.on_base_frequency_change(300.0),
            Err(SynthError::EngineUnavailable)
        );
        assert_eq!(control.on_volume_change(0.1), Err(SynthError::EngineUnavailable));

        assert_eq!(control.settings(), &SynthSettings::default());
        assert_eq!(held(&control, NoteId::C4).frequency(), 261.63);

        let engine = control.engine();
        let engine = engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert_eq!(engine.waveform(node), Some(Waveform::Sine));
        assert_eq!(engine.frequency(node), Some(261.63));
        assert_eq!(engine.master_volume(), 0.5);
    }

    #[test]
    fn test_going_live_does_not_need_the_engine_lock() {
        let (mut control, starts) = surface_with(KeysynthConfig::default(), false);
        poison(&control);

        assert_eq!(control.on_first_user_interaction(), Ok(true));
        assert!(control.is_live());
        assert_eq!(control.on_first_user_interaction(), Ok(false));
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_bus_status() {
        let mut control = surface();
        control.on_attack_change(0.0).unwrap();
        control.on_note_down(NoteId::C4).unwrap();

        let status = control.bus_status().unwrap();
        assert_eq!(status.sample_rate, 44100.0);
        assert_eq!(status.master_volume, 0.5);
        assert_eq!(status.nodes, 1);
        assert_eq!(
            status.voices,
            vec![VoiceLevel {
                note: NoteId::C4,
                frequency: 261.63,
                waveform: Waveform::Sine,
                gain: 1.0,
            }]
        );

        // Release tails stay on the bus but are no longer held
        control.on_note_up(NoteId::C4).unwrap();
        let status = control.bus_status().unwrap();
        assert_eq!(status.nodes, 1);
        assert!(status.voices.is_empty());

        poison(&control);
        assert_eq!(control.bus_status(), Err(SynthError::EngineUnavailable));
    }

    #[test]
    fn test_note_down_up() {
        let mut control = surface();

        assert!(control.on_note_down(NoteId::C4).unwrap());
        assert!(!control.on_note_down(NoteId::C4).unwrap());
        assert_eq!(control.registry().active_count(), 1);

        assert_eq!(control.on_note_up(NoteId::C4).unwrap(), Some(0.3));
        assert!(!control.registry().is_active(NoteId::C4));
        assert_eq!(control.on_note_up(NoteId::C4).unwrap(), None);
    }

    #[test]
    fn test_base_frequency_change_retunes_held_notes() {
        let mut control = surface();
        control.on_note_down(NoteId::C4).unwrap();
        control.on_note_down(NoteId::A4).unwrap();
        advance(&control, 2000);

        let node = held(&control, NoteId::A4).node();
        let gain_before = control.engine().lock().unwrap().gain(node);

        let report = control.on_base_frequency_change(220.0).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0], (NoteId::C4, 220.0));
        assert_eq!(report[1].0, NoteId::A4);
        assert!((report[1].1 - 369.99).abs() < 0.01);

        let engine = control.engine();
        let engine = engine.lock().unwrap();
        assert_eq!(engine.frequency(node), Some(report[1].1));
        assert_eq!(engine.gain(node), gain_before);
        assert_eq!(control.settings().base_frequency, 220.0);
    }

    #[test]
    fn test_base_frequency_change_with_nothing_held() {
        let mut control = surface();
        control.on_note_down(NoteId::E4).unwrap();
        control.on_note_up(NoteId::E4).unwrap();

        assert!(control.on_base_frequency_change(300.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base_frequency_changes_nothing() {
        let mut control = surface();
        control.on_note_down(NoteId::C4).unwrap();

        assert!(control.on_base_frequency_change(-5.0).is_err());
        assert_eq!(control.settings().base_frequency, 261.63);
        let voice = held(&control, NoteId::C4);
        assert_eq!(voice.frequency(), 261.63);
    }

    #[test]
    fn test_waveform_change_applies_to_held_and_new() {
        let mut control = surface();
        control.on_note_down(NoteId::D4).unwrap();

        control.on_waveform_change(Waveform::Sawtooth).unwrap();
        control.on_note_down(NoteId::F4).unwrap();

        let engine = control.engine();
        let engine = engine.lock().unwrap();
        for voice in control.registry().voices() {
            assert_eq!(engine.waveform(voice.node()), Some(Waveform::Sawtooth));
        }
    }

    #[test]
    fn test_volume_goes_to_master_bus() {
        let mut control = surface();
        control.on_volume_change(0.2).unwrap();
        assert_eq!(control.engine().lock().unwrap().master_volume(), 0.2);
        assert!(control.on_volume_change(2.0).is_err());
        assert_eq!(control.engine().lock().unwrap().master_volume(), 0.2);
    }

    #[test]
    fn test_envelope_changes_only_affect_later_voices() {
        let mut control = surface();
        control.on_note_down(NoteId::G4).unwrap();
        let first = held(&control, NoteId::G4).node();

        control.on_attack_change(0.0).unwrap();
        control.on_release_change(0.0).unwrap();
        control.on_note_down(NoteId::B4).unwrap();
        let second = held(&control, NoteId::B4).node();

        {
            let engine = control.engine();
            let engine = engine.lock().unwrap();
            assert_eq!(engine.gain(first), Some(0.0));
            assert_eq!(engine.gain(second), Some(1.0));
        }

        let end = control.on_note_up(NoteId::B4).unwrap();
        assert_eq!(end, Some(0.0));
        assert!(control.on_attack_change(-1.0).is_err());
    }

    #[test]
    fn test_first_interaction_goes_live_once() {
        let (mut control, starts) = surface_with(KeysynthConfig::default(), false);
        assert!(!control.is_live());

        assert!(control.on_first_user_interaction().unwrap());
        assert!(!control.on_first_user_interaction().unwrap());
        assert!(!control.on_first_user_interaction().unwrap());

        assert!(control.is_live());
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_failed_audio_start_is_surfaced() {
        let (mut control, starts) = surface_with(KeysynthConfig::default(), true);

        let err = control.on_first_user_interaction().unwrap_err();
        assert!(matches!(err, SynthError::AudioInit(_)));
        assert!(!control.is_live());

        // The idle picture still renders
        let frame = control.scope_frame(100.0, 40.0);
        assert!(frame.trace().unwrap().0.iter().all(|&(_, y)| y == 20.0));
        assert_eq!(starts.get(), 1);
    }

    #[test]
    fn test_live_scope_follows_bus() {
        let mut config = KeysynthConfig::default();
        config.scope.fft_size = 64;
        config.synth.attack = 0.0;
        config.synth.volume = 1.0;
        config.synth.waveform = Waveform::Square;
        let (mut control, _) = surface_with(config, false);

        control.on_first_user_interaction().unwrap();
        let idle = control.scope_frame(64.0, 32.0);
        assert!(idle.trace().unwrap().0.iter().all(|&(_, y)| y == 16.0));

        control.on_note_down(NoteId::C4).unwrap();
        advance(&control, 64);

        let frame = control.scope_frame(64.0, 32.0);
        let trace = frame.trace().unwrap().0;
        assert_eq!(trace.len(), 33);
        assert!(trace.iter().any(|&(_, y)| y != 16.0));
    }

    #[test]
    fn test_seventeen_notes() {
        let mut control = surface();
        for note in NoteId::ALL {
            control.on_note_down(note).unwrap();
        }
        assert_eq!(control.registry().active_count(), 17);

        let mut frequencies: Vec<f64> = control.registry().voices().map(|v| v.frequency()).collect();
        frequencies.dedup();
        assert_eq!(frequencies.len(), 17);
    }
}
