use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use diffnosis_core::Speaker;

use crate::app::{App, ProfileField, Screen};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    match app.screen {
        Screen::Profile => render_profile_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Diffnosis ", Style::default().fg(Color::Blue).bold()),
        Span::styled("Your At Home Health Consultant", Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = match app.screen {
        Screen::Profile => " Tab/↑↓ field  ←→/Space toggle sex  Enter next  Esc quit ",
        Screen::Chat => " Enter send  PgUp/PgDn scroll  Esc home  Ctrl-C quit ",
    };

    let line = match (&app.status, app.screen) {
        (Some(status), Screen::Profile) => Line::from(vec![
            Span::styled(format!(" {} ", status), Style::default().fg(Color::Red)),
            Span::styled(hints, Style::default().fg(Color::DarkGray)),
        ]),
        _ => Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_profile_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Enter Your Information ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label_width = ProfileField::all()
        .iter()
        .map(|f| f.label().len())
        .max()
        .unwrap_or(0) as u16
        + 3;
    let value_width = inner.width.saturating_sub(label_width + 1) as usize;

    let mut lines: Vec<Line> = Vec::new();
    let mut cursor = None;

    for (row, field) in ProfileField::all().into_iter().enumerate() {
        let focused = field == app.focused_field;
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let mut spans = vec![Span::styled(
            format!("{}{:<width$}", marker, field.label(), width = label_width as usize - 2),
            label_style,
        )];

        match app.form.input(field) {
            Some(input) => {
                let (visible, cursor_col) = input.visible(value_width);
                if focused {
                    cursor = Some((
                        inner.x + label_width + cursor_col as u16,
                        inner.y + (row as u16) * 2,
                    ));
                }
                spans.push(Span::raw(visible));
            }
            None => {
                for sex in diffnosis_core::Sex::all() {
                    let style = if sex == app.form.sex {
                        Style::default().fg(Color::White).bg(Color::Blue).bold()
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    spans.push(Span::styled(format!(" {} ", sex), style));
                    spans.push(Span::raw(" "));
                }
            }
        }

        lines.push(Line::from(spans));
        lines.push(Line::default());
    }

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);

    if let Some((x, y)) = cursor {
        if y < inner.y + inner.height {
            frame.set_cursor_position((x, y));
        }
    }
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Chat with AI ({}) ", app.model_label));

    let mut lines: Vec<Line> = Vec::new();
    for entry in app.session.observe_log() {
        let color = match entry.speaker {
            Speaker::User => Color::Cyan,
            Speaker::Assistant => Color::Yellow,
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", entry.speaker.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        match entry.speaker {
            Speaker::User => lines.push(Line::from(entry.text.clone())),
            Speaker::Assistant => lines.extend(entry.text.lines().map(parse_markdown_line)),
        }
        lines.push(Line::default());
    }

    if app.session.is_sending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let input_border_color = if app.session.is_sending() {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Type your message... ");

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible, cursor_col) = app.chat_input.visible(inner_width);
    let input_text = if app.chat_input.is_empty() {
        Line::from(Span::styled(
            "Describe your symptoms...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(visible)
    };
    frame.render_widget(Paragraph::new(input_text).block(input_block), input_area);
    frame.set_cursor_position((input_area.x + 1 + cursor_col as u16, input_area.y + 1));
}
