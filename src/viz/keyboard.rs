//! Piano keyboard widget for ratatui

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use super::keys::key_for_note;
use crate::synth::NoteId;

/// A widget that draws the 17 keys, highlighting the sounding ones
pub struct Keyboard<'a> {
    active: &'a [NoteId],
    highlight: Style,
    block: Option<Block<'a>>,
}

impl<'a> Keyboard<'a> {
    pub fn new(active: &'a [NoteId]) -> Self {
        Self {
            active,
            highlight: Style::default().bg(Color::Cyan).fg(Color::Black),
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn key_style(&self, note: NoteId) -> Style {
        if self.active.contains(&note) {
            self.highlight
        } else if note.is_sharp() {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default().bg(Color::White).fg(Color::Black)
        }
    }

    fn render_keys(&self, area: Rect, buf: &mut Buffer) {
        let count = NoteId::ALL.len() as u16;
        let key_width = area.width / count;
        if key_width < 2 || area.height == 0 {
            return;
        }

        for (i, note) in NoteId::ALL.iter().enumerate() {
            let x = area.x + i as u16 * key_width;
            // One column gap between keys
            let key = Rect::new(x, area.y, key_width - 1, area.height);
            let style = self.key_style(*note);
            buf.set_style(key, style);

            let bottom = key.y + key.height - 1;
            let mut binding = String::new();
            binding.push(key_for_note(*note).to_ascii_uppercase());
            buf.set_stringn(key.x, bottom, &binding, key.width as usize, style.add_modifier(Modifier::BOLD));

            if key.height >= 2 {
                buf.set_stringn(key.x, bottom - 1, note.name(), key.width as usize, style);
            }
        }
    }
}

impl Widget for Keyboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_keys(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_labels() {
        let area = Rect::new(0, 0, 68, 4);
        let mut buf = Buffer::empty(area);
        Keyboard::new(&[]).render(area, &mut buf);

        // 4 columns per key; bottom row holds the binding, the row above the name
        assert_eq!(buf[(0, 3)].symbol(), "A");
        assert_eq!(buf[(0, 2)].symbol(), "C");
        assert_eq!(buf[(4, 3)].symbol(), "W");
        assert_eq!(buf[(64, 3)].symbol(), ";");
    }

    #[test]
    fn test_keyboard_highlights_active() {
        let area = Rect::new(0, 0, 68, 4);
        let mut buf = Buffer::empty(area);
        Keyboard::new(&[NoteId::A4]).render(area, &mut buf);

        let a4 = NoteId::A4.semitone() as u16 * 4;
        assert_eq!(buf[(a4, 0)].bg, Color::Cyan);
        assert_eq!(buf[(0, 0)].bg, Color::White);
        assert_eq!(buf[(4, 0)].bg, Color::DarkGray);
    }

    #[test]
    fn test_keyboard_too_narrow() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        Keyboard::new(&[NoteId::C4]).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].bg, Color::Reset);
    }

    #[test]
    fn test_keyboard_with_block() {
        let area = Rect::new(0, 0, 80, 6);
        let mut buf = Buffer::empty(area);
        Keyboard::new(&[])
            .block(Block::bordered().title("Keys"))
            .render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "┌");
    }
}
