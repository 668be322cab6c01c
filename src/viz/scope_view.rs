//! Oscilloscope widget for ratatui
//!
//! Replays a recorded scope frame onto a braille canvas. The frame uses
//! raster coordinates while the canvas grows upward, so y is flipped here.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Context, Line},
        Block, Widget,
    },
};

use crate::scope::{DisplayList, DrawOp, Rgb};

/// Braille cells hold 2x4 dots
pub const DOTS_PER_COLUMN: f64 = 2.0;
pub const DOTS_PER_ROW: f64 = 4.0;

/// Scope surface size in dots for a widget area
pub fn surface_size(area: Rect) -> (f64, f64) {
    (
        area.width as f64 * DOTS_PER_COLUMN,
        area.height as f64 * DOTS_PER_ROW,
    )
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// A widget that draws a scope frame
pub struct ScopeView<'a> {
    frame: &'a DisplayList,
    width: f64,
    height: f64,
    block: Option<Block<'a>>,
}

impl<'a> ScopeView<'a> {
    pub fn new(frame: &'a DisplayList, width: f64, height: f64) -> Self {
        Self {
            frame,
            width,
            height,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn background(&self) -> Color {
        self.frame
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Clear(rgb) => Some(color(*rgb)),
                _ => None,
            })
            .unwrap_or(Color::Reset)
    }

    fn paint(&self, ctx: &mut Context) {
        let flip = |y: f64| self.height - y;

        for op in self.frame.ops() {
            if let DrawOp::Line { from, to, color: rgb } = op {
                ctx.draw(&Line {
                    x1: from.0,
                    y1: flip(from.1),
                    x2: to.0,
                    y2: flip(to.1),
                    color: color(*rgb),
                });
            }
        }

        // Keep the trace above the grid
        if let Some((points, rgb)) = self.frame.trace() {
            ctx.layer();
            for pair in points.windows(2) {
                ctx.draw(&Line {
                    x1: pair[0].0,
                    y1: flip(pair[0].1),
                    x2: pair[1].0,
                    y2: flip(pair[1].1),
                    color: color(rgb),
                });
            }
        }
    }
}

impl Widget for ScopeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let background = self.background();
        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .background_color(background)
            .x_bounds([0.0, self.width])
            .y_bounds([0.0, self.height])
            .paint(|ctx| self.paint(ctx));

        if let Some(block) = self.block.clone() {
            canvas = canvas.block(block);
        }

        canvas.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ScopeBuffer, ScopeRenderer, ScopeStyle};

    fn flat_frame(width: f64, height: f64) -> DisplayList {
        let mut frame = DisplayList::new(width, height);
        ScopeRenderer::default().draw(&mut frame, &ScopeBuffer::silent(64));
        frame
    }

    #[test]
    fn test_surface_size() {
        assert_eq!(surface_size(Rect::new(0, 0, 40, 10)), (80.0, 40.0));
    }

    #[test]
    fn test_render_paints_background() {
        let area = Rect::new(0, 0, 20, 6);
        let (w, h) = surface_size(area);
        let frame = flat_frame(w, h);
        let mut buf = Buffer::empty(area);

        ScopeView::new(&frame, w, h).render(area, &mut buf);

        assert_eq!(buf[(0, 0)].bg, color(ScopeStyle::default().background));
    }

    #[test]
    fn test_render_draws_trace() {
        let area = Rect::new(0, 0, 20, 6);
        let (w, h) = surface_size(area);
        let frame = flat_frame(w, h);
        let mut buf = Buffer::empty(area);

        ScopeView::new(&frame, w, h).render(area, &mut buf);

        let trace = color(ScopeStyle::default().trace);
        let traced = (0..area.width)
            .flat_map(|x| (0..area.height).map(move |y| (x, y)))
            .filter(|&pos| buf[pos].fg == trace)
            .count();
        assert!(traced > 0);
    }

    #[test]
    fn test_render_with_block() {
        let area = Rect::new(0, 0, 30, 10);
        let block = Block::bordered().title(" Scope ");
        let inner = block.inner(area);
        let (w, h) = surface_size(inner);
        let frame = flat_frame(w, h);
        let mut buf = Buffer::empty(area);

        ScopeView::new(&frame, w, h).block(block).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "┌");
    }

    #[test]
    fn test_empty_frame_does_not_panic() {
        let frame = DisplayList::new(10.0, 10.0);
        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        ScopeView::new(&frame, 10.0, 10.0).render(area, &mut buf);
    }
}
