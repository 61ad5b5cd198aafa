use ratatui::{
    prelude::*,
    widgets::Paragraph,
};

use crate::app::{App, AppMode};
use crate::classify::ReviewLabel;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // If there's a status message, show it prominently
    if let Some(ref message) = app.status_message {
        let line = Line::from(vec![
            Span::styled(
                format!(" {} ", message),
                Style::default().fg(Color::Yellow).bg(Color::DarkGray),
            ),
        ]);
        let paragraph = Paragraph::new(line);
        frame.render_widget(paragraph, area);
        return;
    }

    let mut spans = Vec::new();

    let workflows = if app.selected_workflows.is_empty() {
        "no workflow".to_string()
    } else {
        app.selected_workflows.join(", ")
    };
    spans.push(Span::styled(
        format!(" {} ", workflows),
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    if let Some(ref session) = app.session {
        for (label, color) in [
            (ReviewLabel::Validated, Color::Green),
            (ReviewLabel::Tbd, Color::Yellow),
            (ReviewLabel::Rejected, Color::Red),
        ] {
            spans.push(Span::styled(
                format!(" {} {} ", session.count(label), label),
                Style::default().fg(color),
            ));
        }
    }

    if app.config.delivery.dry_run {
        spans.push(Span::styled(" [dry run] ", Style::default().fg(Color::Magenta)));
    }

    let help_text = match app.mode {
        AppMode::Filters => " h/l H/L:adjust r:reset Esc:back ".to_string(),
        _ => " Space:pick f:filters D:done ?:help q:quit ".to_string(),
    };

    // Calculate remaining space and add spacing
    let content_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let help_len = help_text.chars().count();

    let available = area.width as usize;
    if available > content_len + help_len {
        let spacing = " ".repeat(available - content_len - help_len);
        spans.push(Span::raw(spacing));
    }

    spans.push(Span::styled(
        help_text,
        Style::default().fg(Color::White).bg(Color::DarkGray),
    ));

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line);
    frame.render_widget(paragraph, area);
}
