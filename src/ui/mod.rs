pub mod delivery_dialog;
mod dialogs;
pub mod export_dialog;
pub mod filter_panel;
mod plots;
mod review;
mod status_bar;
pub mod text_input;
pub mod workflow_dialog;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, AppMode};
use crate::table::Metric;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Header, dashboard, status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    render_header(frame, app, main_chunks[0]);

    match app.session {
        Some(ref session) => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(34), Constraint::Min(0)])
                .split(main_chunks[1]);

            filter_panel::render(
                frame,
                &app.filter_panel,
                session.filters(),
                app.mode == AppMode::Filters,
                body[0],
            );

            let dashboard = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(45), // Review table
                    Constraint::Percentage(30), // Time series
                    Constraint::Percentage(25), // Histogram
                ])
                .split(body[1]);

            review::render(frame, session, app.review_index, app.mode == AppMode::Normal, dashboard[0]);
            plots::render_time_series(frame, &session.time_series(), dashboard[1]);

            let metric = Metric::HISTOGRAM[app.histogram_index % Metric::HISTOGRAM.len()];
            let histogram = session.histogram(metric, app.config.filters.histogram_bins);
            plots::render_histogram(frame, &histogram, dashboard[2]);
        }
        None => {
            let message = app
                .load_error
                .as_deref()
                .unwrap_or("No workflow run selected");
            dialogs::render_message(frame, "LST QC", message, main_chunks[1]);
        }
    }

    status_bar::render(frame, app, main_chunks[2]);

    // Overlays
    match app.mode {
        AppMode::Help => dialogs::render_help(frame, area),
        AppMode::PickingWorkflows => {
            if let Some(ref dialog) = app.workflow_dialog {
                workflow_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Delivering => {
            if let Some(ref dialog) = app.delivery_dialog {
                delivery_dialog::render(frame, dialog, area);
            }
        }
        AppMode::Exporting => {
            if let Some(ref dialog) = app.export_dialog {
                export_dialog::render(frame, dialog, area);
            }
        }
        _ => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(28), Constraint::Length(28)])
        .split(area);

    let mut spans = vec![Span::styled(
        " LST QC ",
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    if let Some(ref session) = app.session {
        spans.push(Span::raw(format!(
            "  {}/{} Images",
            session.selection().len(),
            session.table().len()
        )));
        let delivery = session.delivery_set();
        spans.push(Span::styled(
            format!(
                "  delivery set: {} scenes, {} files",
                delivery.len(),
                delivery.artifact_count()
            ),
            Style::default().fg(Color::Green),
        ));
    }

    let title = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(title, chunks[0]);

    text_input::render(
        frame,
        &app.customer_input,
        "Customer",
        app.mode == AppMode::EditingCustomer,
        chunks[1],
    );
    text_input::render(
        frame,
        &app.aoi_input,
        "AOI name",
        app.mode == AppMode::EditingAoi,
        chunks[2],
    );
}
