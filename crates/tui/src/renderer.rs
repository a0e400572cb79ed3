use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use calltree_core::{PanelConfig, ProfilePanel};
use calltree_core::model::FlamegraphDetails;
use calltree_protocol::{RenderCommand, TextAlign, ThemeToken};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    style::{Color, Style},
    widgets::Block,
};
use tracing::debug;

/// Upper bound on how long the loop sleeps waiting for input.
const IDLE_POLL: Duration = Duration::from_millis(100);

const HINT: &str = " click: expand | click empty: overview | /: focus | r: reset | q: quit ";

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::FlameHot => Color::Red,
        ThemeToken::FlameWarm => Color::Yellow,
        ThemeToken::FlameCold => Color::Rgb(230, 120, 40),
        ThemeToken::FlameNeutral => Color::Gray,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::SelectionHighlight => Color::Green,
        ThemeToken::HoverHighlight => Color::LightYellow,
        ThemeToken::SearchHighlight => Color::LightMagenta,
        ThemeToken::Background => Color::Black,
        ThemeToken::Surface => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::PanelHeaderBackground => Color::DarkGray,
        ThemeToken::PanelHeaderText => Color::White,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    /// Keystrokes edit the focus query.
    Focus,
}

/// Run the interactive viewer until the user quits. The terminal is
/// restored even when the loop fails.
pub fn run(config: PanelConfig, details: FlamegraphDetails) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut panel = ProfilePanel::new(config);
    panel.update(Some(details));
    let result = event_loop(&mut terminal, &mut panel);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    debug!(stats = ?panel.stats(), "viewer closed");
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    panel: &mut ProfilePanel,
) -> Result<()> {
    let mut mode = Mode::Browse;

    loop {
        let size = terminal.size()?;
        let body_rows = size.height.saturating_sub(1);
        let commands = panel.render(f64::from(size.width));
        let status = status_line(panel, mode);
        terminal.draw(|frame| draw(frame, &commands, body_rows, &status))?;

        let timeout = panel
            .next_deadline(Instant::now())
            .map_or(IDLE_POLL, |d| d.min(IDLE_POLL));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if !handle_key(panel, &mut mode, key.code) {
                        break;
                    }
                }
                Event::Mouse(mouse) => handle_mouse(panel, mouse, body_rows),
                _ => {}
            }
        }
        panel.tick(Instant::now());
    }

    Ok(())
}

/// Returns `false` when the viewer should exit.
fn handle_key(panel: &mut ProfilePanel, mode: &mut Mode, code: KeyCode) -> bool {
    match (*mode, code) {
        (Mode::Browse, KeyCode::Char('q') | KeyCode::Esc) => return false,
        (Mode::Browse, KeyCode::Char('/')) => *mode = Mode::Focus,
        (Mode::Browse, KeyCode::Char('r')) => panel.reset(),
        (Mode::Focus, KeyCode::Enter | KeyCode::Esc) => *mode = Mode::Browse,
        (Mode::Focus, KeyCode::Char(c)) => {
            let mut query = panel.focus_query().to_string();
            query.push(c);
            panel.on_focus_query_changed(query, Instant::now());
        }
        (Mode::Focus, KeyCode::Backspace) => {
            let mut query = panel.focus_query().to_string();
            query.pop();
            panel.on_focus_query_changed(query, Instant::now());
        }
        _ => {}
    }
    true
}

fn handle_mouse(panel: &mut ProfilePanel, mouse: MouseEvent, body_rows: u16) {
    if mouse.row >= body_rows {
        panel.on_mouse_out();
        return;
    }
    // Aim at the centre of the cell.
    let x = f64::from(mouse.column) + 0.5;
    let y = f64::from(mouse.row) + 0.5;
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            panel.on_click(x, y);
        }
        MouseEventKind::Moved => {
            panel.on_mouse_move(x, y);
        }
        _ => {}
    }
}

fn status_line(panel: &ProfilePanel, mode: Mode) -> String {
    if mode == Mode::Focus {
        let marker = if panel.highlight_pending() { " ..." } else { "" };
        return format!(" Focus: {}_{marker}", panel.focus_query());
    }
    if let Some(error) = panel.error() {
        return format!(" error: {error}");
    }
    panel
        .tooltip()
        .map(|lines| format!(" {}", lines.join(" | ")))
        .unwrap_or_else(|| HINT.to_string())
}

fn draw(frame: &mut Frame<'_>, commands: &[RenderCommand], body_rows: u16, status: &str) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black)),
        area,
    );

    let buf = frame.buffer_mut();
    fill_row(buf, 0, ' ', ThemeToken::PanelHeaderBackground);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let len = text.chars().count() as f64;
                let start = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - len / 2.0,
                    TextAlign::Right => position.x - len,
                };
                put_str(
                    buf,
                    start.max(0.0) as u16,
                    0,
                    text,
                    usize::MAX,
                    theme_to_color(*color),
                    theme_to_color(ThemeToken::PanelHeaderBackground),
                );
            }
            RenderCommand::DrawRect {
                rect, color, label, ..
            } => {
                let row = rect.y.floor() as u16;
                if row >= body_rows {
                    continue;
                }
                let col = rect.x.round().max(0.0) as u16;
                let end = (rect.x + rect.w).round().max(0.0) as u16;
                let width = end.saturating_sub(col).max(1);
                let label = label.as_deref().unwrap_or("");
                let cell: String = format!(" {label:<w$}", w = usize::from(width));
                put_str(
                    buf,
                    col,
                    row,
                    &cell,
                    usize::from(width),
                    Color::Black,
                    theme_to_color(*color),
                );
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }

    let status_row = area.height.saturating_sub(1);
    fill_row(buf, status_row, ' ', ThemeToken::PanelHeaderBackground);
    put_str(
        buf,
        0,
        status_row,
        status,
        usize::MAX,
        Color::White,
        theme_to_color(ThemeToken::PanelHeaderBackground),
    );
}

fn fill_row(buf: &mut Buffer, row: u16, ch: char, token: ThemeToken) {
    let area = buf.area;
    if row >= area.y + area.height {
        return;
    }
    for x in area.x..area.x + area.width {
        buf[(x, row)].set_char(ch).set_bg(theme_to_color(token));
    }
}

/// Write at most `max` characters of `text`, clipped to the buffer.
fn put_str(buf: &mut Buffer, col: u16, row: u16, text: &str, max: usize, fg: Color, bg: Color) {
    let area = buf.area;
    if row >= area.y + area.height {
        return;
    }
    for (i, ch) in text.chars().take(max).enumerate() {
        let Ok(offset) = u16::try_from(i) else {
            break;
        };
        let x = col.saturating_add(offset);
        if x >= area.x + area.width {
            break;
        }
        buf[(x, row)].set_char(ch).set_fg(fg).set_bg(bg);
    }
}
