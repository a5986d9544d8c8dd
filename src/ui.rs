use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::app::{App, FocusPane};
use crate::state::ChatRole;

const SIDEBAR_WIDTH: u16 = 30;
const USER_LABEL: &str = "☃️ You";
const ASSISTANT_LABEL: &str = "🤖 AI";

/// Styles `**bold**` and `` `code` `` spans; anything unbalanced stays literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let markers = [
        ("**", Style::default().add_modifier(Modifier::BOLD)),
        ("`", Style::default().fg(Color::Green)),
    ];
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let next = markers
            .into_iter()
            .filter_map(|(marker, style)| rest.find(marker).map(|at| (at, marker, style)))
            .min_by_key(|(at, _, _)| *at);

        let Some((start, marker, style)) = next else {
            spans.push(Span::raw(rest.to_string()));
            break;
        };

        let after_open = &rest[start + marker.len()..];
        match after_open.find(marker) {
            Some(len) if len > 0 => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(after_open[..len].to_string(), style));
                rest = &after_open[len + marker.len()..];
            }
            _ => {
                spans.push(Span::raw(rest[..start + marker.len()].to_string()));
                rest = after_open;
            }
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [models_area, chat_column] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .areas(body_area);

    render_header(app, frame, header_area);
    render_models(app, frame, models_area);
    render_chat_column(app, frame, chat_column);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let model = app.session.selected_model().unwrap_or("no model");
    let title = Line::from(vec![
        Span::styled(" ∮ Sigma AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("[{}]", model), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_models(app: &mut App, frame: &mut Frame, area: Rect) {
    app.models_area = Some(area);

    let focused = app.focus == FocusPane::Models;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Model Selection ");

    if !app.session.has_models() {
        let placeholder = Paragraph::new(
            "No models available.\n\nPull one with\n`ollama pull llama3`\nand restart.",
        )
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let selected = app.session.selected_index();
    let items: Vec<ListItem> = app
        .session
        .registry()
        .models()
        .iter()
        .enumerate()
        .map(|(i, model)| {
            let style = if Some(i) == selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut lines = vec![Line::from(Span::styled(model.name.clone(), style))];
            if let Some(details) = model.details() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", details),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if focused {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        })
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.model_list_state);
}

fn render_chat_column(app: &mut App, frame: &mut Frame, area: Rect) {
    let notice_height = if app.error_notice.is_some() { 3 } else { 0 };
    let [chat_area, notice_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(notice_height),
        Constraint::Length(3),
    ])
    .areas(area);

    render_chat(app, frame, chat_area);
    if let Some(notice) = &app.error_notice {
        render_notice(notice, frame, notice_area);
    }
    render_input(app, frame, input_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let focused = app.focus == FocusPane::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Sigma AI ");

    let text = if app.messages().is_empty() && !app.is_processing() {
        Text::from(Span::styled(
            "Pick a model on the left and ask anything below.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(chat_lines(app))
    };

    // Measured without the block: line_count counts borders but not their width.
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    app.set_chat_rows(chat.line_count(app.chat_width));

    let chat = chat.block(block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn role_label(role: ChatRole) -> Line<'static> {
    let (label, color) = match role {
        ChatRole::User => (USER_LABEL, Color::Cyan),
        ChatRole::Assistant => (ASSISTANT_LABEL, Color::Yellow),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for msg in app.messages() {
        lines.push(role_label(msg.role()));
        match msg.role() {
            ChatRole::User => {
                lines.extend(msg.content().lines().map(|l| Line::from(l.to_string())));
            }
            ChatRole::Assistant => {
                lines.extend(msg.content().lines().map(parse_markdown_line));
            }
        }
        lines.push(Line::default());
    }

    if app.is_processing() {
        lines.push(role_label(ChatRole::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("processing{}", dots),
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error (Esc in chat to dismiss) ");
    let paragraph = Paragraph::new(Line::from(vec![
        Span::raw("⛔️ "),
        Span::styled(notice.to_string(), Style::default().fg(Color::Red)),
    ]))
    .block(block);
    frame.render_widget(paragraph, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input;
    let border_color = if !app.accepts_prompt() {
        Color::DarkGray
    } else if focused {
        Color::Yellow
    } else {
        Color::Gray
    };

    let title = if !app.session.has_models() {
        " Input disabled: no models "
    } else if app.is_processing() {
        " Waiting for the answer... "
    } else {
        " Prompt "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_x) = input_window(&app.input, app.input_cursor, inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            "Enter a prompt here...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(block), area);

    if focused && app.session.has_models() {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// The slice of `input` that fits in `width` terminal columns with the cursor
/// (a char index) in view, and the cursor's column within it. Scrolls
/// horizontally by display width so wide glyphs take their two cells.
fn input_window(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());
    let cells = |c: char| c.width().unwrap_or(0);

    // One cell is kept free for the cursor itself.
    let mut start = cursor;
    let mut used = 1;
    while start > 0 && used + cells(chars[start - 1]) <= width {
        start -= 1;
        used += cells(chars[start]);
    }

    let mut visible = String::new();
    let mut columns = 0;
    for &c in &chars[start..] {
        if columns + cells(c) > width {
            break;
        }
        columns += cells(c);
        visible.push(c);
    }

    let cursor_x: usize = chars[start..cursor].iter().map(|&c| cells(c)).sum();
    (visible, cursor_x as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.focus {
        FocusPane::Input => (" PROMPT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        FocusPane::Chat => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        FocusPane::Models => (" MODELS ", Style::default().bg(Color::Magenta).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    match app.focus {
        FocusPane::Input => {
            hints.extend(hint(" Enter ", " send "));
            hints.extend(hint(" Esc ", " chat "));
        }
        FocusPane::Chat => {
            hints.extend(hint(" j/k ", " scroll "));
            hints.extend(hint(" g/G ", " top/bottom "));
            hints.extend(hint(" i ", " prompt "));
            hints.extend(hint(" m ", " models "));
            if app.error_notice.is_some() {
                hints.extend(hint(" Esc ", " dismiss "));
            }
            hints.extend(hint(" q ", " quit "));
        }
        FocusPane::Models => {
            hints.extend(hint(" j/k ", " nav "));
            hints.extend(hint(" Enter ", " use model "));
            hints.extend(hint(" Esc ", " cancel "));
        }
    }
    hints.extend(hint(" Tab ", " focus "));
    hints.extend(hint(" Ctrl+C ", " quit "));

    let footer_content = Line::from(
        [Span::styled(mode_text, mode_style), Span::styled(" ", label_style)]
            .into_iter()
            .chain(hints)
            .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
