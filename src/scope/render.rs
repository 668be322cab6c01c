//! Oscilloscope drawing onto a 2D surface
//!
//! Coordinates follow the usual raster convention: origin at the top left,
//! y growing downward.

use super::SignalTap;

/// An opaque color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Colors used by the scope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeStyle {
    pub background: Rgb,
    pub grid: Rgb,
    pub center: Rgb,
    pub trace: Rgb,
}

impl Default for ScopeStyle {
    fn default() -> Self {
        Self {
            background: Rgb(16, 18, 28),
            grid: Rgb(40, 44, 64),
            center: Rgb(90, 96, 130),
            trace: Rgb(0, 188, 212),
        }
    }
}

/// Minimal drawing interface the scope needs
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self, color: Rgb);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb);
    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb);
}

/// A recorded drawing command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Rgb),
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        color: Rgb,
    },
}

/// Surface that records commands for a backend to replay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Whether the list was drawn for this surface size
    pub fn matches_size(&self, width: f64, height: f64) -> bool {
        self.width == width && self.height == height && !self.ops.is_empty()
    }

    /// The waveform trace and its color, if one was drawn
    pub fn trace(&self) -> Option<(&[(f64, f64)], Rgb)> {
        self.ops.iter().rev().find_map(|op| match op {
            DrawOp::Polyline { points, color } => Some((points.as_slice(), *color)),
            _ => None,
        })
    }
}

impl Surface for DisplayList {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, color: Rgb) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(color));
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb) {
        self.ops.push(DrawOp::Line { from, to, color });
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            color,
        });
    }
}

/// Byte samples copied from the tap each frame
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeBuffer {
    bytes: Vec<u8>,
}

impl ScopeBuffer {
    /// A buffer of `fft_size / 2` bins, all at the zero line
    pub fn for_window(fft_size: usize) -> Self {
        Self::silent((fft_size / 2).max(1))
    }

    pub fn silent(len: usize) -> Self {
        Self {
            bytes: vec![128; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Overwrite in place with the newest tap samples
    pub fn refresh(&mut self, tap: &SignalTap) {
        tap.copy_time_domain_bytes(self.as_mut_slice());
    }
}

/// Draws grid, center line and trace
#[derive(Debug, Clone)]
pub struct ScopeRenderer {
    style: ScopeStyle,
    grid_columns: usize,
    grid_rows: usize,
    points: Vec<(f64, f64)>,
}

impl ScopeRenderer {
    pub fn new(style: ScopeStyle, grid_columns: usize, grid_rows: usize) -> Self {
        Self {
            style,
            grid_columns,
            grid_rows,
            points: Vec::new(),
        }
    }

    /// Full frame: background, grid, center line, then the trace
    pub fn draw(&mut self, surface: &mut dyn Surface, buffer: &ScopeBuffer) {
        surface.clear(self.style.background);
        self.draw_grid(surface);
        self.draw_center_line(surface);
        self.draw_trace(surface, buffer.as_slice());
    }

    fn draw_grid(&self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());

        for col in 1..self.grid_columns {
            let x = w * col as f64 / self.grid_columns as f64;
            surface.line((x, 0.0), (x, h), self.style.grid);
        }
        for row in 1..self.grid_rows {
            let y = h * row as f64 / self.grid_rows as f64;
            surface.line((0.0, y), (w, y), self.style.grid);
        }
    }

    fn draw_center_line(&self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());
        surface.line((0.0, h / 2.0), (w, h / 2.0), self.style.center);
    }

    fn draw_trace(&mut self, surface: &mut dyn Surface, samples: &[u8]) {
        let (w, h) = (surface.width(), surface.height());
        let slice_width = w / samples.len().max(1) as f64;

        self.points.clear();
        for (i, &v) in samples.iter().enumerate() {
            let y = (v as f64 / 128.0) * h / 2.0;
            self.points.push((i as f64 * slice_width, y));
        }
        self.points.push((w, h / 2.0));

        surface.polyline(&self.points, self.style.trace);
    }
}

impl Default for ScopeRenderer {
    fn default() -> Self {
        Self::new(ScopeStyle::default(), 10, 8)
    }
}
