//! Terminal UI: pixel preview plus a live link sidebar.
//!
//! Each terminal cell stacks two panel rows with the upper-half-block
//! glyph: the foreground color paints the top pixel, the background
//! the bottom one. A 32x32 matrix therefore fits in 32x16 cells.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use lux_core::{ReceiverStats, Rgb};

/// Everything the panel screen needs to draw itself.
pub struct PanelApp {
    pub width: usize,
    pub height: usize,
    pub listen: String,
    pub encoding: String,
    pub pixels: Vec<Rgb>,
    pub stats: ReceiverStats,
    pub exit: bool,
}

impl PanelApp {
    pub fn new(width: usize, height: usize, listen: String, encoding: String) -> Self {
        Self {
            width,
            height,
            listen,
            encoding,
            pixels: vec![Rgb::BLACK; width * height],
            stats: ReceiverStats::default(),
            exit: false,
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let buf = frame.buffer_mut();

        // Preview on the left, sized to the matrix; sidebar gets the rest.
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(self.width as u16 + 2),
                Constraint::Min(24),
            ])
            .split(area);

        self.render_preview(layout[0], buf);
        self.render_sidebar(layout[1], buf);
    }

    fn render_preview(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(
                " Panel ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = self.height.div_ceil(2).min(inner.height as usize);
        let cols = self.width.min(inner.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                let top = self.pixel(col, row * 2);
                let bottom = self.pixel(col, row * 2 + 1);
                let pos = (inner.x + col as u16, inner.y + row as u16);
                if let Some(cell) = buf.cell_mut(pos) {
                    cell.set_symbol("▀")
                        .set_fg(Color::Rgb(top.r, top.g, top.b))
                        .set_bg(Color::Rgb(bottom.r, bottom.g, bottom.b));
                }
            }
        }
    }

    fn render_sidebar(&self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        self.render_stats(layout[0], buf);
        self.render_help(layout[1], buf);
    }

    fn render_stats(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(
                " Link ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(Color::DarkGray))
            .padding(ratatui::widgets::Padding::horizontal(1));
        let inner = block.inner(area);
        block.render(area, buf);

        let label = Style::default().fg(Color::Gray);
        let value = Style::default().fg(Color::Yellow);
        // Error counters turn red once they move.
        let alarm = |n: u64| {
            if n > 0 {
                Style::default().fg(Color::Red)
            } else {
                value
            }
        };

        let source = match self.stats.source {
            Some(addr) => addr.to_string(),
            None => "waiting".to_string(),
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Listen    : ", label),
                Span::styled(self.listen.as_str(), value),
            ]),
            Line::from(vec![
                Span::styled("Source    : ", label),
                Span::styled(source, value),
            ]),
            Line::from(vec![
                Span::styled("Format    : ", label),
                Span::styled(
                    format!("{}x{} {}", self.width, self.height, self.encoding),
                    value,
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("FPS       : ", label),
                Span::styled(
                    format!("{:.1}", self.stats.fps),
                    Style::default().fg(Color::Green),
                ),
            ]),
            Line::from(vec![
                Span::styled("Frames    : ", label),
                Span::styled(self.stats.frames_presented.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Expired   : ", label),
                Span::styled(
                    self.stats.frames_expired.to_string(),
                    alarm(self.stats.frames_expired),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Accepted  : ", label),
                Span::styled(self.stats.chunks_accepted.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Rejected  : ", label),
                Span::styled(
                    self.stats.chunks_rejected.to_string(),
                    alarm(self.stats.chunks_rejected),
                ),
            ]),
            Line::from(vec![
                Span::styled("Duplicates: ", label),
                Span::styled(self.stats.duplicates.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("Received  : ", label),
                Span::styled(human_bytes(self.stats.bytes_received), value),
            ]),
        ];
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);
        Paragraph::new(Line::from(Span::styled(
            " [q] Quit ",
            Style::default().fg(Color::Gray),
        )))
        .render(inner, buf);
    }

    fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels
            .get(y * self.width + x)
            .copied()
            .unwrap_or(Rgb::BLACK)
    }
}

fn human_bytes(n: u64) -> String {
    if n >= 1024 * 1024 {
        format!("{:.1} MiB", n as f64 / (1024.0 * 1024.0))
    } else if n >= 1024 {
        format!("{:.1} KiB", n as f64 / 1024.0)
    } else {
        format!("{n} B")
    }
}
