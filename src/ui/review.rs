use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
};

use crate::session::SessionContext;
use crate::table::SceneRow;

fn cell(value: f64, precision: usize) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.*}", precision, value)
    }
}

fn scene_row(row: &SceneRow, picked: bool) -> Row<'static> {
    let marker = if picked { "[x]" } else { "[ ]" };
    let date = row
        .datetime
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    let style = if picked {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Row::new(vec![
        marker.to_string(),
        row.key.clone(),
        date,
        row.satellite.clone(),
        cell(row.invalid_ratio_aoi, 1),
        cell(row.invalid_ratio_image, 1),
        cell(row.min_lst, 1),
        cell(row.max_lst, 1),
        cell(row.median_lst, 1),
        cell(row.sun_elevation, 1),
        cell(row.invalid_pixel, 1),
    ])
    .style(style)
}

/// Scenes offered for review. Picking one adds it to the delivery set.
pub fn render(frame: &mut Frame, session: &SessionContext, cursor: usize, focused: bool, area: Rect) {
    let review = session.review_rows();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Review ({} TBD) ", review.len()));

    if review.is_empty() {
        let empty = Paragraph::new("No scenes need review with the current filters")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = review
        .iter()
        .map(|row| scene_row(row, session.selection().contains(&row.key)))
        .collect();

    let header = Row::new(vec![
        "", "Scene", "Datetime", "Satellite", "AOI %", "Image %", "Min K", "Max K", "Median K", "Sun °", "Invalid",
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let widths = [
        Constraint::Length(3),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    state.select(Some(cursor.min(review.len() - 1)));
    frame.render_stateful_widget(table, area, &mut state);
}
