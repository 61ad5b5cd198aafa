use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

/// Multi-select list of workflow runs. Picks keep the order in which they
/// were made, which is the merge order of the collection.
pub struct WorkflowDialog {
    workflows: Vec<String>,
    picked: Vec<String>,
    selected_index: usize,
}

impl WorkflowDialog {
    pub fn new(available: &[String], current: &[String]) -> Self {
        let mut workflows = available.to_vec();
        for id in current {
            if !workflows.contains(id) {
                workflows.push(id.clone());
            }
        }

        Self {
            workflows,
            picked: current.to_vec(),
            selected_index: 0,
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.workflows.len() {
            self.selected_index += 1;
        }
    }

    pub fn toggle(&mut self) {
        let Some(id) = self.workflows.get(self.selected_index) else {
            return;
        };
        if let Some(pos) = self.picked.iter().position(|p| p == id) {
            self.picked.remove(pos);
        } else {
            self.picked.push(id.clone());
        }
    }

    pub fn picked(&self) -> &[String] {
        &self.picked
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

pub fn render(frame: &mut Frame, dialog: &WorkflowDialog, area: Rect) {
    let dialog_width = 70.min(area.width.saturating_sub(4));
    let dialog_height = 20.min(area.height.saturating_sub(4));

    let x = (area.width - dialog_width) / 2;
    let y = (area.height - dialog_height) / 2;

    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    frame.render_widget(Clear, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Workflow Runs ")
        .title_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(block, dialog_area);

    if dialog.is_empty() {
        let empty = Paragraph::new("No workflow runs found")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = dialog
            .workflows
            .iter()
            .map(|id| {
                let marker = match dialog.picked.iter().position(|p| p == id) {
                    Some(order) => format!("[{}]", order + 1),
                    None => "[ ]".to_string(),
                };
                ListItem::new(format!("{} {}", marker, id))
            })
            .collect();

        let list = List::new(items).highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

        let mut state = ListState::default();
        state.select(Some(dialog.selected_index));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    let footer = Paragraph::new("j/k: move | Space: pick | Enter: load | Esc: cancel")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_picks_keep_order() {
        let mut dialog = WorkflowDialog::new(&ids(&["wf-a", "wf-b", "wf-c"]), &[]);
        dialog.move_down();
        dialog.move_down();
        dialog.toggle();
        dialog.move_up();
        dialog.move_up();
        dialog.toggle();

        assert_eq!(dialog.picked(), ids(&["wf-c", "wf-a"]).as_slice());

        dialog.toggle();
        assert_eq!(dialog.picked(), ids(&["wf-c"]).as_slice());
    }

    #[test]
    fn test_current_runs_are_listed() {
        let dialog = WorkflowDialog::new(&ids(&["wf-a"]), &ids(&["wf-old"]));
        assert_eq!(dialog.workflows, ids(&["wf-a", "wf-old"]));
        assert_eq!(dialog.picked(), ids(&["wf-old"]).as_slice());
    }
}
