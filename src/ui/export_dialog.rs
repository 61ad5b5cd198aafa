use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::path::{Path, PathBuf};

use crate::export::{default_export_path, ExportFormat};

/// State for the export dialog
pub struct ExportDialog {
    format: ExportFormat,
    output_path: PathBuf,
    formats: [ExportFormat; 2],
    selected_index: usize,
}

impl ExportDialog {
    pub fn new(export_dir: &Path) -> Self {
        let format = ExportFormat::Csv;
        Self {
            format,
            output_path: default_export_path(export_dir, format),
            formats: [ExportFormat::Csv, ExportFormat::Json],
            selected_index: 0,
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.update_format();
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_index < self.formats.len() - 1 {
            self.selected_index += 1;
            self.update_format();
        }
    }

    fn update_format(&mut self) {
        self.format = self.formats[self.selected_index];
        self.output_path.set_extension(self.format.extension());
    }

    pub fn selected_format(&self) -> ExportFormat {
        self.format
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

pub fn render(frame: &mut Frame, dialog: &ExportDialog, area: Rect) {
    let dialog_width = 70.min(area.width.saturating_sub(4));
    let dialog_height = 13.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(4), // Format selection
            Constraint::Length(3), // Output path
            Constraint::Length(1), // Footer
        ])
        .split(dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Export Review ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(block, dialog_area);

    let header = Paragraph::new("Export every scene with its label:")
        .style(Style::default().fg(Color::Green));
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = dialog
        .formats
        .iter()
        .map(|f| {
            let desc = match f {
                ExportFormat::Csv => "CSV  - Spreadsheet compatible",
                ExportFormat::Json => "JSON - One object per scene",
            };
            ListItem::new(desc)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Format "))
        .highlight_style(
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(dialog.selected_index));
    frame.render_stateful_widget(list, chunks[1], &mut state);

    let output = Paragraph::new(format!("{}", dialog.output_path.display()))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Output File "));
    frame.render_widget(output, chunks[2]);

    let footer = Paragraph::new("j/k: select | Enter: export | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_change_updates_extension() {
        let mut dialog = ExportDialog::new(Path::new("/tmp/exports"));
        assert_eq!(dialog.selected_format(), ExportFormat::Csv);

        dialog.move_down();
        assert_eq!(dialog.selected_format(), ExportFormat::Json);
        assert_eq!(dialog.output_path().extension().and_then(|e| e.to_str()), Some("json"));

        dialog.move_down();
        assert_eq!(dialog.selected_format(), ExportFormat::Json);
    }
}
