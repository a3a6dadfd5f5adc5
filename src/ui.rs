use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, ChatRow};
use crate::state::ChatRole;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        match after_open.find("**") {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Span::styled(rest[..start].to_string(), base));
                }
                spans.push(Span::styled(
                    after_open[..end].to_string(),
                    base.add_modifier(Modifier::BOLD),
                ));
                rest = &after_open[end + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), base));
    }

    Line::from(spans)
}

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan),
        ChatRole::Assistant => Style::default().fg(Color::Yellow),
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, conversation, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" promptline ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::White)),
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
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    // Inner size minus borders, used for wrapping and scroll calculations
    app.set_chat_area(area.width.saturating_sub(2), area.height.saturating_sub(2));

    let rows = app.chat_rows();
    let chat_text = if rows.is_empty() {
        Text::from(Span::styled(
            "Type a message below and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let lines: Vec<Line> = rows
            .iter()
            .map(|row| match row {
                ChatRow::Label(role) => Line::from(Span::styled(
                    role.label(),
                    role_style(*role).add_modifier(Modifier::BOLD),
                )),
                ChatRow::Text(ChatRole::User, text) => Line::from(text.clone()),
                ChatRow::Text(ChatRole::Assistant, text) => parse_markdown_line(text, Style::default()),
                ChatRow::Thinking => {
                    // Animated ellipsis: cycles through ".", "..", "..."
                    let dots = ".".repeat((app.animation_frame as usize / 4) % 3 + 1);
                    Line::from(Span::styled(
                        format!("Thinking{}", dots),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    ))
                }
                ChatRow::Blank => Line::default(),
            })
            .collect();
        Text::from(lines)
    };

    // Rows are pre-wrapped, so no Wrap here keeps the row count exact
    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    let max_scroll = app.max_scroll();
    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            Rect {
                y: area.y + 1,
                height: area.height.saturating_sub(2),
                ..area
            },
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let [field_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);

    let pending = app.session.is_pending();
    let draft = app.session.draft();

    // The input is disabled while a request is in flight
    let (border_color, title, text_style) = if pending {
        (Color::DarkGray, " Waiting for response ", Style::default().fg(Color::DarkGray))
    } else {
        (Color::Yellow, " Message ", Style::default().fg(Color::Cyan))
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling in terminal columns so wide characters keep the cursor aligned
    let inner_width = field_area.width.saturating_sub(2) as usize;
    let chars: Vec<char> = draft.text().chars().collect();
    let cursor_pos = draft.cursor().min(chars.len());
    let mut scroll_offset = 0;
    let mut cursor_col: usize = chars[..cursor_pos].iter().map(|c| c.width().unwrap_or(0)).sum();
    while inner_width > 0 && cursor_col >= inner_width && scroll_offset < cursor_pos {
        cursor_col -= chars[scroll_offset].width().unwrap_or(0);
        scroll_offset += 1;
    }

    let visible_text: String = chars[scroll_offset..].iter().collect();

    let input = Paragraph::new(visible_text)
        .style(text_style)
        .block(input_block);
    frame.render_widget(input, field_area);

    if !pending {
        let cursor_x = u16::try_from(cursor_col).unwrap_or(u16::MAX);
        frame.set_cursor_position((field_area.x + cursor_x + 1, field_area.y + 1));
    }

    // Submit affordance: spinner while busy, send otherwise
    let button_text = if pending {
        Span::styled(
            format!(" {} ", SPINNER[app.animation_frame as usize % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled(" Send ", Style::default().fg(Color::Black).bg(Color::Cyan).bold())
    };
    let button = Paragraph::new(Line::from(button_text).centered()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    frame.render_widget(button, button_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.session.is_pending() {
        (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut hints = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    if !app.session.is_pending() {
        hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" page ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SubmissionController;
    use crate::generate::{GenerateError, GenerateRequest, GenerationOptions, TextGenerator};
    use crate::state::ChatMessage;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct Idle;

    #[async_trait]
    impl TextGenerator for Idle {
        async fn generate(&self, _request: &GenerateRequest) -> Result<String, GenerateError> {
            std::future::pending().await
        }
    }

    fn draw(app: &mut App) -> String {
        draw_sized(app, 60, 16)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn test_app() -> App {
        let (controller, _rx) = SubmissionController::new(Arc::new(Idle), GenerationOptions::default());
        App::new(controller, "http://localhost:8000")
    }

    #[test]
    fn test_parse_markdown_line_bolds_pairs() {
        let line = parse_markdown_line("a **b** c **d", Style::default());
        let texts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["a ", "b", " c **d"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_render_shows_transcript_by_role() {
        let mut app = test_app();
        app.session.append(ChatMessage::user("Hello"));
        app.session.append(ChatMessage::assistant("Hi there"));

        let screen = draw(&mut app);

        assert!(screen.contains("You:"));
        assert!(screen.contains("Hello"));
        assert!(screen.contains("AI:"));
        assert!(screen.contains("Hi there"));
        assert!(screen.contains("Send"));
    }

    #[test]
    fn test_render_shows_busy_state_while_pending() {
        let mut app = test_app();
        app.session.append(ChatMessage::user("Hello"));
        app.session.set_pending(true);

        let screen = draw(&mut app);

        assert!(screen.contains("Thinking"));
        assert!(screen.contains("Waiting for response"));
        assert!(screen.contains(SPINNER[0]));
        assert!(!screen.contains("Send"));
    }

    #[test]
    fn test_wide_characters_are_fully_visible() {
        let mut app = test_app();
        let reply = "一二三四五六七八九十甲乙丙丁戊己庚辛壬癸子丑寅卯辰巳午未申酉戌亥";
        app.session.append(ChatMessage::assistant(reply));

        let screen = draw_sized(&mut app, 30, 16);

        let missing: Vec<char> = reply.chars().filter(|c| !screen.contains(*c)).collect();
        assert!(missing.is_empty(), "missing on screen: {:?}", missing);
    }

    #[test]
    fn test_indentation_survives_rendering() {
        let mut app = test_app();
        app.session.append(ChatMessage::assistant("fn main() {\n    println!(\"hi\");\n}"));

        let screen = draw(&mut app);

        assert!(screen.contains("│    println!(\"hi\");"));
    }

    #[test]
    fn test_cursor_follows_wide_characters() {
        let mut app = test_app();
        app.session.edit_draft(|d| "日本".chars().for_each(|c| d.insert(c)));

        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // Input field starts at column 0 with a border, each ideograph is two columns
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.x, 1 + 4);
    }
}
