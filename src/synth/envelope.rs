//! Gain envelope driven by timestamped automation events
//!
//! The control thread schedules events against the audio clock; the audio
//! thread evaluates the envelope at the time of each rendered sample.
//! Events at the same timestamp apply in insertion order, so a ramp that ends
//! at the instant it is anchored jumps straight to its target.

/// A scheduled change to the envelope level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` at `time`
    SetValue { value: f64, time: f64 },
    /// Move linearly from the previous event's level to `value`, arriving at `time`
    LinearRamp { value: f64, time: f64 },
}

impl AutomationEvent {
    pub fn time(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { time, .. } | AutomationEvent::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            AutomationEvent::SetValue { value, .. } | AutomationEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// Gain automation for one voice
#[derive(Debug, Clone)]
pub struct Envelope {
    default_value: f64,
    events: Vec<AutomationEvent>,
}

impl Envelope {
    /// Create an envelope resting at `default_value` with nothing scheduled
    pub fn new(default_value: f64) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Schedule a jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::SetValue { value, time });
    }

    /// Schedule a linear ramp reaching `value` at `end_time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(AutomationEvent::LinearRamp {
            value,
            time: end_time,
        });
    }

    /// Drop every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|event| event.time() < time);
    }

    /// Forget events that no longer influence values at or after `time`
    pub fn prune_before(&mut self, time: f64) {
        let settled = self.events.iter().rposition(|event| event.time() <= time);
        if let Some(index) = settled {
            self.events.drain(..index);
        }
    }

    /// Level of the envelope at `time`
    pub fn value_at(&self, time: f64) -> f64 {
        let split = self.events.partition_point(|event| event.time() <= time);

        let (anchor_time, anchor_value) = match split.checked_sub(1) {
            Some(index) => (self.events[index].time(), self.events[index].value()),
            None => (f64::NEG_INFINITY, self.default_value),
        };

        match self.events.get(split) {
            Some(AutomationEvent::LinearRamp { value, time: end }) if anchor_time.is_finite() => {
                // end > time >= anchor_time, so the span is never zero
                let progress = (time - anchor_time) / (end - anchor_time);
                anchor_value + (value - anchor_value) * progress
            }
            _ => anchor_value,
        }
    }

    fn insert(&mut self, event: AutomationEvent) {
        // After any existing events at the same time
        let index = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(index, event);
    }
}
