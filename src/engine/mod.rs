//! Audio engine for keysynth
//!
//! Owns the shared output bus: every voice node (oscillator into gain
//! envelope) is summed here, scaled by the master gain, and written to the
//! signal tap. The engine's rendered-frame counter is the audio clock that
//! envelope and stop events are scheduled against.

mod player;

pub use player::{default_device_name, list_output_devices, AudioOutput, Player};

use log::debug;

use crate::error::{Result, SynthError};
use crate::scope::SignalTap;
use crate::synth::{Envelope, NoteId, Oscillator, Waveform};

/// Handle to a voice node owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Oscillator plus gain stage, connected to the output bus
struct VoiceNode {
    id: NodeId,
    note: NoteId,
    oscillator: Oscillator,
    gain: Envelope,
    start_at: f64,
    stop_at: Option<f64>,
}

impl VoiceNode {
    /// Still sounding for its note and not yet scheduled to stop
    fn is_held(&self) -> bool {
        self.stop_at.is_none()
    }
}

/// The main audio engine
pub struct Engine {
    sample_rate: f64,
    frames: u64,
    master_volume: f64,
    nodes: Vec<VoiceNode>,
    next_id: u64,
    tap: SignalTap,
}

impl Engine {
    /// Create an engine whose output is mirrored into `tap`
    pub fn new(sample_rate: f64, master_volume: f64, tap: SignalTap) -> Self {
        Self {
            sample_rate,
            frames: 0,
            master_volume,
            nodes: Vec::new(),
            next_id: 0,
            tap,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Switch sample rate while keeping the clock's position in seconds
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        let now = self.current_time();
        self.sample_rate = sample_rate;
        self.frames = (now * sample_rate).round() as u64;
        for node in &mut self.nodes {
            node.oscillator.set_sample_rate(sample_rate);
        }
    }

    /// Audio clock position in seconds
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume;
    }

    /// Create an oscillator and a silent gain stage for `note`, starting at `start_at`
    pub fn spawn_voice_node(
        &mut self,
        note: NoteId,
        waveform: Waveform,
        frequency: f64,
        start_at: f64,
    ) -> Result<NodeId> {
        if self.nodes.iter().any(|n| n.note == note && n.is_held()) {
            return Err(SynthError::VoiceAlreadyActive(note));
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(VoiceNode {
            id,
            note,
            oscillator: Oscillator::new(waveform, frequency, self.sample_rate),
            gain: Envelope::new(0.0),
            start_at,
            stop_at: None,
        });
        debug!("node {:?} spawned for {} at {:.1} Hz", id, note, frequency);

        Ok(id)
    }

    /// Gain automation of a node
    pub fn envelope_mut(&mut self, id: NodeId) -> Result<&mut Envelope> {
        Ok(&mut self.node_mut(id)?.gain)
    }

    pub fn set_frequency(&mut self, id: NodeId, frequency: f64) -> Result<()> {
        self.node_mut(id)?.oscillator.set_frequency(frequency);
        Ok(())
    }

    pub fn set_waveform(&mut self, id: NodeId, waveform: Waveform) -> Result<()> {
        self.node_mut(id)?.oscillator.set_waveform(waveform);
        Ok(())
    }

    /// Terminate the node's oscillator once the clock reaches `time`
    pub fn schedule_stop(&mut self, id: NodeId, time: f64) -> Result<()> {
        self.node_mut(id)?.stop_at = Some(time);
        Ok(())
    }

    /// Current frequency of a node, if the engine still owns it
    pub fn frequency(&self, id: NodeId) -> Option<f64> {
        self.node(id).map(|n| n.oscillator.frequency())
    }

    pub fn waveform(&self, id: NodeId) -> Option<Waveform> {
        self.node(id).map(|n| n.oscillator.waveform())
    }

    /// Gain of a node at the current clock position
    pub fn gain(&self, id: NodeId) -> Option<f64> {
        let now = self.current_time();
        self.node(id).map(|n| n.gain.value_at(now))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Nodes still owned by the engine, including release tails
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Generate the next sample of the output bus
    pub fn process(&mut self) -> f64 {
        let now = self.current_time();
        let mut output = 0.0;

        self.nodes.retain(|node| match node.stop_at {
            Some(stop) if now >= stop => {
                debug!("node {:?} ({}) terminated", node.id, node.note);
                false
            }
            _ => true,
        });

        for node in &mut self.nodes {
            if now < node.start_at {
                continue;
            }
            output += node.oscillator.generate() * node.gain.value_at(now);
        }

        let output = output * self.master_volume;
        self.tap.push(output as f32);
        self.frames += 1;

        output
    }

    /// Fill a buffer with samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process() as f32;
        }
        let now = self.current_time();
        for node in &mut self.nodes {
            node.gain.prune_before(now);
        }
    }

    fn node(&self, id: NodeId) -> Option<&VoiceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut VoiceNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(SynthError::NodeNotFound(id))
    }
}
