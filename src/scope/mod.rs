//! Oscilloscope for the output bus
//!
//! The scope starts Idle, showing a static grid with a flat trace. Once audio
//! is running it goes Live and redraws from the signal tap every frame. The
//! transition happens once and is never undone.

mod frame_loop;
mod render;
mod tap;

pub use frame_loop::{CancelToken, FrameLoop};
pub use render::{DisplayList, DrawOp, Rgb, ScopeBuffer, ScopeRenderer, ScopeStyle, Surface};
pub use tap::{sample_to_byte, SignalTap};

use log::info;

/// Whether the scope has a live signal to draw
enum ScopeState {
    Idle,
    Live(SignalTap),
}

/// Scope state machine plus its renderer and sample buffer
pub struct Scope {
    state: ScopeState,
    renderer: ScopeRenderer,
    buffer: ScopeBuffer,
    idle_frame: DisplayList,
}

impl Scope {
    pub fn new(renderer: ScopeRenderer, fft_size: usize) -> Self {
        Self {
            state: ScopeState::Idle,
            renderer,
            buffer: ScopeBuffer::for_window(fft_size),
            idle_frame: DisplayList::default(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, ScopeState::Live(_))
    }

    /// Attach the tap; returns false if already live
    pub fn go_live(&mut self, tap: SignalTap) -> bool {
        if self.is_live() {
            return false;
        }
        info!("scope live, window of {} samples", tap.window());
        self.state = ScopeState::Live(tap);
        true
    }

    /// One live frame: copy the tap, then draw
    ///
    /// Returns false without touching the surface while Idle.
    pub fn render_step(&mut self, surface: &mut dyn Surface) -> bool {
        let ScopeState::Live(tap) = &self.state else {
            return false;
        };
        self.buffer.refresh(tap);
        self.renderer.draw(surface, &self.buffer);
        true
    }

    /// The static Idle picture, drawn once per surface size
    pub fn idle_frame(&mut self, width: f64, height: f64) -> &DisplayList {
        if !self.idle_frame.matches_size(width, height) {
            let mut frame = DisplayList::new(width, height);
            let flat = ScopeBuffer::silent(self.buffer.len());
            self.renderer.draw(&mut frame, &flat);
            self.idle_frame = frame;
        }
        &self.idle_frame
    }

    /// Whatever the current state shows, for a surface of the given size
    pub fn frame(&mut self, width: f64, height: f64) -> DisplayList {
        let mut surface = DisplayList::new(width, height);
        if self.render_step(&mut surface) {
            surface
        } else {
            self.idle_frame(width, height).clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new(ScopeRenderer::default(), 16)
    }

    #[test]
    fn test_starts_idle() {
        let mut scope = scope();
        assert!(!scope.is_live());

        let mut surface = DisplayList::new(10.0, 10.0);
        assert!(!scope.render_step(&mut surface));
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_idle_frame_is_flat_and_cached() {
        let mut scope = scope();
        let first = scope.idle_frame(80.0, 40.0).clone();
        assert!(first.trace().unwrap().0.iter().all(|&(_, y)| y == 20.0));

        let again = scope.idle_frame(80.0, 40.0);
        assert_eq!(&first, again);
    }

    #[test]
    fn test_go_live_once() {
        let mut scope = scope();
        let tap = SignalTap::new(16);

        assert!(scope.go_live(tap.clone()));
        assert!(!scope.go_live(tap.clone()));
        assert!(!scope.go_live(SignalTap::new(4)));
        assert!(scope.is_live());
    }

    #[test]
    fn test_live_step_reads_tap() {
        let mut scope = scope();
        let tap = SignalTap::new(16);
        scope.go_live(tap.clone());

        tap.push(-1.0);
        let frame = scope.frame(64.0, 32.0);

        assert_eq!(scope.buffer.len(), 8);
        assert_eq!(scope.buffer.as_slice()[7], 0);
        let trace = frame.trace().unwrap().0;
        assert_eq!(trace[7], (56.0, 0.0));
        assert_eq!(trace[0], (0.0, 16.0));
    }

    #[test]
    fn test_live_silence_is_flat() {
        let mut scope = scope();
        let tap = SignalTap::new(16);
        scope.go_live(tap.clone());
        for _ in 0..16 {
            tap.push(0.0);
        }

        let frame = scope.frame(100.0, 60.0);
        assert!(frame.trace().unwrap().0.iter().all(|&(_, y)| y == 30.0));
    }
}
