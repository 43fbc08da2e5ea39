use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, BackendStatus, Role, THINKING_TEXT};

pub fn render(frame: &mut Frame, app: &mut App) {
    let [chat_area, input_row, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [input_area, send_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(10)]).areas(input_row);

    draw_transcript(frame, app, chat_area);
    draw_input(frame, app, input_area);
    draw_send_button(frame, app, send_area);
    draw_status_bar(frame, app, status_area);

    // Stored for mouse hit-testing in the handler
    app.send_area = Some(send_area);
}

fn draw_transcript(frame: &mut Frame, app: &mut App, area: Rect) {
    // Inner dimensions (minus borders) feed the scroll arithmetic in App
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default().borders(Borders::ALL).title(" JARVIS ");

    let text = if app.messages.is_empty() && !app.sending {
        Text::from(Span::styled(
            "Ask JARVIS anything...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(transcript_lines(app))
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(transcript, area);
}

/// Build the transcript as styled lines. Message text goes into plain spans,
/// so markup-significant characters always display literally.
pub fn transcript_lines(app: &App) -> Vec<Line<'_>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        lines.push(label_line(msg.role));
        for line in msg.text.lines() {
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
    }

    if app.sending {
        lines.push(label_line(Role::Agent));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", THINKING_TEXT, dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn label_line(role: Role) -> Line<'static> {
    match role {
        Role::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Role::Agent => Line::from(Span::styled(
            "JARVIS:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    }
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.sending {
        Color::DarkGray
    } else {
        Color::Yellow
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Horizontal scrolling keeps the cursor inside the visible slice
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn draw_send_button(frame: &mut Frame, app: &App, area: Rect) {
    // Rendered disabled for the whole dispatch-to-settle span
    let (border_color, label_style) = if app.sending {
        (Color::DarkGray, Style::default().fg(Color::DarkGray))
    } else {
        (
            Color::Cyan,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };

    let button = Paragraph::new(Line::from(Span::styled("Send", label_style)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color)),
        );

    frame.render_widget(button, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let backend = match app.backend {
        BackendStatus::Checking => {
            Span::styled("backend: checking", Style::default().fg(Color::DarkGray))
        }
        BackendStatus::Online => Span::styled("backend: online", Style::default().fg(Color::Green)),
        BackendStatus::Offline => Span::styled("backend: offline", Style::default().fg(Color::Red)),
    };

    let line = Line::from(vec![
        Span::styled(
            " Enter: send  Esc: quit  Up/Down: scroll  ",
            Style::default().fg(Color::DarkGray),
        ),
        backend,
        Span::styled(
            format!("  {}", app.base_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}
