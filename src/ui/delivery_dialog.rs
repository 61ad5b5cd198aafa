//! Delivery confirmation and outcome dialogs.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::delivery::{DeliveryPlan, DeliveryReport};

pub enum DeliveryDialog {
    /// Waiting for the operator to confirm the copies.
    Confirm { plan: DeliveryPlan, dry_run: bool },
    /// Finished delivery; failures are listed.
    Report { report: DeliveryReport, scroll: u16 },
}

impl DeliveryDialog {
    pub fn scroll_down(&mut self) {
        if let DeliveryDialog::Report { scroll, .. } = self {
            *scroll = scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        if let DeliveryDialog::Report { scroll, .. } = self {
            *scroll = scroll.saturating_sub(1);
        }
    }
}

fn dialog_area(area: Rect) -> Rect {
    let dialog_width = 90.min(area.width.saturating_sub(4));
    let dialog_height = 22.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    Rect::new(x, y, dialog_width, dialog_height)
}

pub fn render(frame: &mut Frame, dialog: &DeliveryDialog, area: Rect) {
    let dialog_area = dialog_area(area);
    frame.render_widget(Clear, dialog_area);

    match dialog {
        DeliveryDialog::Confirm { plan, dry_run } => render_confirm(frame, plan, *dry_run, dialog_area),
        DeliveryDialog::Report { report, scroll } => render_report(frame, report, *scroll, dialog_area),
    }
}

fn render_confirm(frame: &mut Frame, plan: &DeliveryPlan, dry_run: bool, area: Rect) {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Customer: ", Style::default().fg(Color::DarkGray)),
            Span::raw(plan.request.customer_id.clone()),
        ]),
        Line::from(vec![
            Span::styled("AOI:      ", Style::default().fg(Color::DarkGray)),
            Span::raw(plan.request.aoi_name.clone()),
        ]),
        Line::from(""),
        Line::from(format!(
            "Copy {} files from {} scenes?",
            plan.jobs.len(),
            plan.scene_count
        )),
    ];
    if dry_run {
        lines.push(Line::from(Span::styled(
            "Dry run: nothing will be written",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));

    if let Some(first) = plan.jobs.first() {
        lines.push(Line::from(Span::styled("First copy:", Style::default().fg(Color::DarkGray))));
        lines.push(Line::from(format!("  {}", first.source)));
        lines.push(Line::from(format!("  -> {}", first.destination)));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(vec![
        Span::styled("[y]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw(" Deliver   "),
        Span::styled("[n]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(" Cancel"),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Deliver Scenes ")
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_report(frame: &mut Frame, report: &DeliveryReport, scroll: u16, area: Rect) {
    let (color, title) = if report.is_complete() {
        (Color::Green, " Delivery Complete ")
    } else {
        (Color::Red, " Delivery Incomplete ")
    };

    let mut lines = vec![
        Line::from(Span::styled(report.summary(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    if !report.succeeded.is_empty() {
        lines.push(Line::from(format!(
            "{} bytes copied",
            report.total_bytes()
        )));
    }

    if !report.failed.is_empty() {
        lines.push(Line::from(Span::styled("Failed copies:", Style::default().fg(Color::Red))));
        for (job, error) in &report.failed {
            lines.push(Line::from(format!("  {}", job.source)));
            lines.push(Line::from(Span::styled(
                format!("    {}", error),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    for job in &report.planned_only {
        lines.push(Line::from(format!("saving {} to {}", job.source, job.destination)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k: scroll | Enter/Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(title)
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}
