use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use chatline_core::{Focus, Sender};
use crate::app::{sender_label, App};

const SEND_LABEL: &str = "[Send]";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if close == 0 {
            // "****" is literal
            spans.push(Span::styled(rest[..open + 4].to_string(), base));
            rest = &after_open[2..];
            continue;
        }
        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), base));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            base.add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() || spans.is_empty() {
        spans.push(Span::styled(rest.to_string(), base));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" chatline ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled(app.endpoint_label.clone(), Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.sync_scroll();

    let view = app.controller.view();
    let border_color = if view.focus == Focus::Transcript {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let transcript = app.controller.transcript();
    let chat_text = if transcript.is_empty() && !view.indicator_visible {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in transcript.iter() {
            let label_style = match msg.sender() {
                Sender::User => Style::default().fg(Color::Cyan),
                Sender::Remote => Style::default().fg(Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                sender_label(msg.sender()),
                label_style.add_modifier(Modifier::BOLD),
            )));

            let body_style = if msg.is_error() {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            if msg.text().is_empty() {
                lines.push(Line::default());
            }
            for line in msg.text().lines() {
                match msg.sender() {
                    Sender::User => lines.push(Line::styled(line.to_string(), body_style)),
                    Sender::Remote => lines.push(parse_markdown_line(line, body_style)),
                }
            }
            lines.push(Line::default());
        }

        if view.indicator_visible {
            lines.push(Line::from(Span::styled(
                sender_label(Sender::Remote),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // No trim: the line estimate in App counts leading whitespace
    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let send_width = SEND_LABEL.len() as u16 + 2;
    let [field_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(send_width),
    ])
    .areas(area);
    app.send_area = Some(send_area);

    let view = app.controller.view();
    let enabled = view.input_enabled;

    let border_color = if !enabled {
        Color::DarkGray
    } else if view.focus == Focus::Input {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if enabled { " Message " } else { " Message (waiting...) " };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Inner width = total width - 2 (for borders); scroll to keep cursor visible
    let inner_width = field_area.width.saturating_sub(2) as usize;
    let cursor_pos = view.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = view
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(visible_text).style(text_style).block(input_block),
        field_area,
    );

    let send_style = if view.send_enabled {
        Style::default().fg(Color::Black).bg(Color::Green).bold()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let send = Paragraph::new(Span::styled(SEND_LABEL, send_style))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(send, send_area);

    if enabled && view.focus == Focus::Input {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.controller.is_pending() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let hints = " Enter/Ctrl+S send | Tab focus | PgUp/PgDn scroll | Esc quit ";
    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}
