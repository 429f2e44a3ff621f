use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode};
use codeai::segment::{segment, Segment};
use codeai::session::ChatRole;
use codeai::upload::ALLOWED_EXTENSIONS;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(body_area);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    // Popups (in order of priority)
    if app.notice.is_some() {
        render_notice(app, frame, area);
    } else if app.show_attach_input {
        render_attach_input(app, frame, area);
    } else if app.show_clear_confirm {
        render_clear_confirm(frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let file_indicator = match app.session.file_context() {
        Some(ctx) => format!(" [{}]", ctx.file_name),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" CodeAI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} mode ", app.session.mode().as_str()),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(file_indicator, Style::default().fg(Color::Green)),
        Span::raw(" "),
        Span::styled(
            app.client.base_url().to_string(),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let chat_focused = app.focus == FocusPane::Transcript;
    let border_color = if chat_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let inner_width = area.width.saturating_sub(2).max(1);
    app.chat_height = area.height.saturating_sub(2);

    let lines = build_chat_lines(app);

    // Wrapped height, for scroll clamping and stick-to-bottom
    let total: usize = lines
        .iter()
        .map(|line| {
            let width = line.width();
            if width == 0 {
                1
            } else {
                width.div_ceil(inner_width as usize)
            }
        })
        .sum();
    app.total_chat_lines = total as u16;

    if app.follow_chat {
        app.chat_scroll = app.total_chat_lines.saturating_sub(app.chat_height);
    } else {
        let max = app.total_chat_lines.saturating_sub(app.chat_height);
        app.chat_scroll = app.chat_scroll.min(max);
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn build_chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    let mut block_idx = 0usize;

    for msg in app.session.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
            }
        }

        for seg in segment(&msg.content) {
            match seg {
                Segment::Text { body } => {
                    for line in body.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Segment::Code { language, body } => {
                    push_code_block(app, &mut lines, block_idx, language.as_deref(), &body);
                    block_idx += 1;
                }
            }
        }

        lines.push(Line::default());
    }

    if app.session.is_sending() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_code_block(
    app: &App,
    lines: &mut Vec<Line<'static>>,
    block_idx: usize,
    language: Option<&str>,
    body: &str,
) {
    let selected = app.selected_block == Some(block_idx);
    let frame_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let label = language.unwrap_or("code");
    let mut header = vec![Span::styled(format!("┌── {} ", label), frame_style)];
    if app.copy_flash.is_some_and(|f| f.block == block_idx) {
        header.push(Span::styled(
            "copied",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    } else if selected {
        header.push(Span::styled("press c to copy", frame_style));
    }
    lines.push(Line::from(header));

    for line in body.lines() {
        lines.push(Line::from(vec![
            Span::styled("│ ", frame_style),
            Span::styled(line.to_string(), Style::default().fg(Color::Green)),
        ]));
    }

    lines.push(Line::from(Span::styled("└──", frame_style)));
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ");

    // Horizontal scroll keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    if app.input.is_empty() {
        let placeholder = Paragraph::new(app.session.mode().placeholder())
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, area);
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();

        let input = Paragraph::new(visible_text)
            .style(Style::default().fg(Color::Cyan))
            .block(input_block);
        frame.render_widget(input, area);
    }

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" keys ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" ask ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" n/p ", key_style),
            Span::styled(" block ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" copy ", label_style),
            Span::styled(" f ", key_style),
            Span::styled(" attach ", label_style),
            Span::styled(" m ", key_style),
            Span::styled(" mode ", label_style),
            Span::styled(" R ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = app.notice.as_deref() else {
        return;
    };

    let popup_area = centered_popup(area, 56, 6);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Notice ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = Paragraph::new(notice.to_string()).wrap(Wrap { trim: true });
    let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
    frame.render_widget(text, text_area);

    let hint = Paragraph::new("Press any key to continue")
        .style(Style::default().fg(Color::DarkGray));
    let hint_area = Rect::new(inner.x, inner.y + inner.height.saturating_sub(1), inner.width, 1);
    frame.render_widget(hint, hint_area);
}

fn render_attach_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Attach file ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions =
        Paragraph::new("Enter a file path. Press Enter to attach, Esc to cancel.")
            .style(Style::default().fg(Color::DarkGray));
    let instructions_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(instructions, instructions_area);

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(app.attach_input.as_str()).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = app.attach_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let allowed = format!("Supported: {}", ALLOWED_EXTENSIONS.join(", "));
    let status = Paragraph::new(allowed).style(Style::default().fg(Color::DarkGray));
    let status_area = Rect::new(inner.x, inner.y + 4, inner.width, 1);
    frame.render_widget(status, status_area);
}

fn render_clear_confirm(frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 44, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Clear chat ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = Paragraph::new("Clear the chat and the attached file context?")
        .wrap(Wrap { trim: true });
    let text_area = Rect::new(inner.x, inner.y, inner.width, 2);
    frame.render_widget(text, text_area);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("y", Style::default().fg(Color::Green).bold()),
        Span::raw(" confirm  "),
        Span::styled("n", Style::default().fg(Color::Red).bold()),
        Span::raw(" cancel"),
    ]));
    let hint_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    frame.render_widget(hint, hint_area);
}
