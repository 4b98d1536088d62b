// SPDX-License-Identifier: GPL-3.0-only

//! Terminal display surface
//!
//! Renders frames to the terminal using Unicode half-block characters for
//! improved vertical resolution. `q`, `Esc` or Ctrl+C request a stop.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use tracing::{debug, warn};

use super::DisplaySurface;
use crate::constants::timing;
use crate::errors::DisplayError;
use crate::frame::Frame;

pub struct TerminalSurface {
    terminal: Option<Terminal<CrosstermBackend<io::Stdout>>>,
    title: String,
}

impl TerminalSurface {
    /// Switch the terminal to raw mode on the alternate screen.
    ///
    /// Fails with `DisplayError::Unavailable` when stdout is not a usable
    /// terminal.
    pub fn open(title: &str) -> Result<Self, DisplayError> {
        enable_raw_mode().map_err(|e| DisplayError::Unavailable(e.to_string()))?;

        let mut out = stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(DisplayError::Unavailable(e.to_string()));
        }

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => {
                debug!(title = %title, "Terminal surface ready");
                Ok(Self {
                    terminal: Some(terminal),
                    title: title.to_string(),
                })
            }
            Err(e) => {
                let _ = execute!(stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(DisplayError::Unavailable(e.to_string()))
            }
        }
    }
}

impl TerminalSurface {
    /// Draw `frame` (or nothing) above a one-line status bar
    fn draw(&mut self, frame: Option<&Frame>, status: &str) -> Result<(), DisplayError> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Err(DisplayError::Render("terminal released".to_string()));
        };

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let frame_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            if let Some(frame) = frame {
                f.render_widget(FrameView { frame }, frame_area);
            }

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: status }, status_area);
        })?;
        Ok(())
    }
}

impl DisplaySurface for TerminalSurface {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let status = format!("{} | frame {} | 'q' quit", self.title, frame.sequence);
        self.draw(Some(frame), &status)
    }

    fn show_status(&mut self, message: &str) -> Result<(), DisplayError> {
        let status = format!("{} | {} | 'q' quit", self.title, message);
        self.draw(None, &status)
    }

    fn poll_stop(&mut self) -> Result<bool, DisplayError> {
        if !event::poll(timing::KEY_POLL_TIMEOUT)? {
            return Ok(false);
        }
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ctrl_c =
                key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            return Ok(ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc));
        }
        Ok(false)
    }

    fn release(&mut self) {
        let Some(mut terminal) = self.terminal.take() else {
            return;
        };
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to leave raw mode");
        }
        if let Err(e) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
            warn!(error = %e, "Failed to leave alternate screen");
        }
        let _ = terminal.show_cursor();
        debug!("Terminal surface released");
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.release();
    }
}

/// Widget that renders a frame using half-block characters
struct FrameView<'a> {
    frame: &'a Frame,
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame;
        if frame.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let w = term_height * frame_aspect;
            (w as u16, (term_height / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let h = term_width / frame_aspect;
            (term_width as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let [tr, tg, tb] = frame.pixel(src_x, src_y_top);
                let [br, bg, bb] = frame.pixel(src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(tr, tg, tb));
                    cell.set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
