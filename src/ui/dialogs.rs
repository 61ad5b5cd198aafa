use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub fn render_help(frame: &mut Frame, area: Rect) {
    // Center the help dialog
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 36.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)))
    };

    let help_text = vec![
        heading("Review"),
        Line::from(""),
        Line::from("  j / ↓      Next scene"),
        Line::from("  k / ↑      Previous scene"),
        Line::from("  gg / G     First / last scene"),
        Line::from("  Space      Pick / unpick scene for delivery"),
        Line::from("  Esc        Clear picks"),
        Line::from("  Tab        Next histogram"),
        Line::from(""),
        heading("Filters"),
        Line::from(""),
        Line::from("  f          Focus filter panel"),
        Line::from("  j / k      Choose filter"),
        Line::from("  h / l      Move low handle"),
        Line::from("  H / L      Move high handle"),
        Line::from("  r          Reset filters"),
        Line::from("  Esc / f    Back to review"),
        Line::from(""),
        heading("Delivery"),
        Line::from(""),
        Line::from("  w          Choose workflow runs"),
        Line::from("  c          Edit customer id"),
        Line::from("  a          Edit AOI name"),
        Line::from("  D / Enter  Done: deliver validated and picked scenes"),
        Line::from("  e          Export scene table"),
        Line::from("  ?          Show this help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from(Span::styled("Press ? or Esc to close", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, dialog_area);
}

/// Blocking message shown in place of the dashboard when nothing is loaded.
pub fn render_message(frame: &mut Frame, title: &str, message: &str, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "w: choose workflow runs | ?: help | q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", title)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}
