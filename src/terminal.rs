// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Renders the live camera and the still preview with Unicode half-block
//! characters (two vertical pixels per cell), plus a comment box and a status
//! line. Logs go to a file while the terminal is in raw mode.

use crate::app::{BoothModel, BoothRuntime, FlowState, Message, StatusMessage};
use crate::backends::camera::{CameraController, CameraFrame, open_source};
use crate::config::Config;
use crate::constants::timing;
use crate::fl;
use crate::media::sample_rgb;
use crate::upload::{UploadClient, Uploader};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::info;

/// What a key press means in the current state
#[derive(Debug, Clone)]
pub enum KeyAction {
    Quit,
    Booth(Message),
}

/// Map a key press to an action
///
/// While previewing, printable keys (including `q`) edit the comment.
pub fn key_to_action(state: FlowState, key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    match state {
        FlowState::Capturing => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Some(KeyAction::Booth(Message::TakePhoto)),
            KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
            _ => None,
        },
        FlowState::Previewing => match key.code {
            KeyCode::Enter => Some(KeyAction::Booth(Message::Send)),
            KeyCode::Esc => Some(KeyAction::Booth(Message::Retry)),
            KeyCode::Backspace => Some(KeyAction::Booth(Message::CommentBackspace)),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(KeyAction::Booth(Message::CommentInput(c)))
            }
            _ => None,
        },
        FlowState::Submitted => match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Some(KeyAction::Quit),
            _ => None,
        },
    }
}

/// Run the booth in the terminal
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let uploader = UploadClient::from_config(&config)?;
    let camera = CameraController::new(
        open_source(&config.camera_source),
        config.stream_constraints(),
    );
    let mut model = BoothModel::new(config, camera, uploader);
    // Failure shows up in the status line
    let _ = model.mount();
    let mut booth = BoothRuntime::new(model, runtime.handle().clone());

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut booth);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<U: Uploader>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    booth: &mut BoothRuntime<U>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        booth.send(Message::Tick);
        booth.pump();

        terminal.draw(|f| draw(f, booth.model()))?;

        if event::poll(Duration::from_millis(timing::UI_POLL_INTERVAL_MS))?
            && let Event::Key(key) = event::read()?
        {
            match key_to_action(booth.model().state(), &key) {
                Some(KeyAction::Quit) => break,
                Some(KeyAction::Booth(message)) => booth.send(message),
                None => {}
            }
        }
    }

    info!(state = %booth.model().state(), "Leaving booth");
    Ok(())
}

fn draw<U: Uploader>(f: &mut Frame, model: &BoothModel<U>) {
    let [title_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(f.area());

    f.render_widget(
        Paragraph::new(fl!("app-title"))
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::BOLD)),
        title_area,
    );

    match model.state() {
        FlowState::Capturing => {
            let surface = model.camera().surface();
            let widget = match surface.current_frame() {
                Some(frame) => ImageWidget::live(frame, model.config().mirror_preview),
                None => ImageWidget::empty(fl!("camera-starting")),
            };
            let [image_area, button_area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(body_area);
            f.render_widget(widget, image_area);
            f.render_widget(button(fl!("take-photo")), button_area);
        }
        FlowState::Previewing => {
            let [image_area, comment_area, button_area] = Layout::vertical([
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .areas(body_area);

            if let Some(capture) = model.flow().capture() {
                f.render_widget(ImageWidget::still(capture.raster()), image_area);
            }

            let comment = model.flow().comment();
            let (text, style) = if comment.is_empty() {
                (
                    fl!("comment-placeholder"),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                (format!("{}▏", comment), Style::default())
            };
            f.render_widget(
                Paragraph::new(text)
                    .style(style)
                    .block(Block::default().borders(Borders::ALL)),
                comment_area,
            );

            let send_label = if model.is_uploading() {
                fl!("sending")
            } else {
                fl!("send")
            };
            f.render_widget(
                button(format!("[{}]   [{}]", send_label, fl!("retry"))),
                button_area,
            );
        }
        FlowState::Submitted => {
            let [_, message_area, _] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(3),
                Constraint::Fill(1),
            ])
            .areas(body_area);
            f.render_widget(
                Paragraph::new(fl!("thank-you"))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                message_area,
            );
        }
    }

    f.render_widget(
        Paragraph::new(status_text(model))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
        status_area,
    );
}

fn button(label: String) -> Paragraph<'static> {
    Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(Style::default().add_modifier(Modifier::BOLD))
}

fn status_text<U: Uploader>(model: &BoothModel<U>) -> String {
    match model.status() {
        Some(StatusMessage::CameraUnavailable(e)) => {
            fl!("camera-unavailable", reason = e.to_string())
        }
        Some(StatusMessage::CaptureFailed(e)) => fl!("capture-failed", reason = e.to_string()),
        Some(StatusMessage::SendFailed(reason)) => fl!("send-failed", reason = reason.clone()),
        Some(StatusMessage::Sending) => fl!("sending"),
        None => match model.state() {
            FlowState::Capturing => fl!("hint-capturing"),
            FlowState::Previewing => fl!("hint-previewing"),
            FlowState::Submitted => fl!("hint-submitted"),
        },
    }
}

/// Pixels the half-block renderer can draw
enum ImageSource<'a> {
    Live(&'a CameraFrame),
    Still(&'a RgbaImage),
}

impl ImageSource<'_> {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSource::Live(frame) => (frame.width, frame.height),
            ImageSource::Still(image) => image.dimensions(),
        }
    }

    fn color(&self, x: u32, y: u32) -> Color {
        let (r, g, b) = match self {
            ImageSource::Live(frame) => sample_rgb(frame, x, y),
            ImageSource::Still(image) => {
                let (w, h) = image.dimensions();
                let px = image.get_pixel(x.min(w - 1), y.min(h - 1)).0;
                (px[0], px[1], px[2])
            }
        };
        Color::Rgb(r, g, b)
    }
}

/// Widget that renders an image using half-block characters
struct ImageWidget<'a> {
    source: Option<ImageSource<'a>>,
    mirror: bool,
    placeholder: String,
}

impl<'a> ImageWidget<'a> {
    fn live(frame: &'a CameraFrame, mirror: bool) -> Self {
        Self {
            source: Some(ImageSource::Live(frame)),
            mirror,
            placeholder: String::new(),
        }
    }

    fn still(image: &'a RgbaImage) -> Self {
        Self {
            source: Some(ImageSource::Still(image)),
            mirror: false,
            placeholder: String::new(),
        }
    }

    fn empty(placeholder: String) -> Self {
        Self {
            source: None,
            mirror: false,
            placeholder,
        }
    }
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let source = match self.source {
            Some(source) if source.dimensions().0 > 0 && source.dimensions().1 > 0 => source,
            _ => {
                Paragraph::new(self.placeholder)
                    .alignment(Alignment::Center)
                    .render(Rect { y: area.y + area.height / 2, height: 1, ..area }, buf);
                return;
            }
        };
        let (width, height) = source.dimensions();

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let mut src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                if self.mirror {
                    src_x = width - 1 - src_x;
                }
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(source.color(src_x, src_y_top));
                    cell.set_bg(source.color(src_x, src_y_bottom));
                }
            }
        }
    }
}
