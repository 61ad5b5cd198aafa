use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use std::time::Duration;
use tracing::{info, warn};

use crate::classify::FilterConfig;
use crate::collection::CollectionCache;
use crate::config::Config;
use crate::delivery::DeliveryRequest;
use crate::export;
use crate::services::Services;
use crate::session::SessionContext;
use crate::table::Metric;
use crate::ui;
use crate::ui::delivery_dialog::DeliveryDialog;
use crate::ui::export_dialog::ExportDialog;
use crate::ui::filter_panel::{FilterPanel, Handle};
use crate::ui::text_input::TextInput;
use crate::ui::workflow_dialog::WorkflowDialog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Help,
    Filters,
    EditingCustomer,
    EditingAoi,
    PickingWorkflows,
    Delivering,
    Exporting,
}

pub struct App {
    pub config: Config,
    services: Services,
    cache: CollectionCache,
    pub session: Option<SessionContext>,
    /// Runs offered by Argo.
    pub available_workflows: Vec<String>,
    /// Runs currently loaded, in merge order.
    pub selected_workflows: Vec<String>,
    pub load_error: Option<String>,
    pub customer_input: TextInput,
    pub aoi_input: TextInput,
    pub filter_panel: FilterPanel,
    /// Cursor in the review table.
    pub review_index: usize,
    pub histogram_index: usize,
    pub workflow_dialog: Option<WorkflowDialog>,
    pub delivery_dialog: Option<DeliveryDialog>,
    pub export_dialog: Option<ExportDialog>,
    pub mode: AppMode,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub g_pressed: bool,
}

impl App {
    pub fn new(config: Config, services: Services) -> Self {
        let selected_workflows = config.default_workflows.clone();
        let mut app = Self {
            config,
            services,
            cache: CollectionCache::new(),
            session: None,
            available_workflows: Vec::new(),
            selected_workflows,
            load_error: None,
            customer_input: TextInput::default(),
            aoi_input: TextInput::default(),
            filter_panel: FilterPanel::new(),
            review_index: 0,
            histogram_index: 0,
            workflow_dialog: None,
            delivery_dialog: None,
            export_dialog: None,
            mode: AppMode::Normal,
            should_quit: false,
            status_message: None,
            g_pressed: false,
        };

        app.refresh_workflows();
        if app.selected_workflows.is_empty() {
            app.open_workflow_dialog();
        } else {
            app.load_selected();
        }

        app
    }

    fn refresh_workflows(&mut self) {
        match self.services.list_workflows(&self.config) {
            Ok(workflows) => self.available_workflows = workflows,
            Err(e) => {
                warn!("Could not list workflows: {}", e);
                self.status_message = Some(format!("Could not list workflows: {}", e));
            }
        }
    }

    /// Load the selected runs and start a fresh review session.
    pub fn load_selected(&mut self) {
        self.session = None;
        self.review_index = 0;

        match self.cache.get_or_load(&self.services.loader, &self.selected_workflows) {
            Ok(collection) => {
                info!(
                    "Reviewing {} scenes from {:?}",
                    collection.len(),
                    self.selected_workflows
                );
                if !collection.overwritten.is_empty() {
                    self.status_message = Some(format!(
                        "{} scenes appear in several runs, keeping the last run's version",
                        collection.overwritten.len()
                    ));
                }
                self.session = Some(SessionContext::new(&collection, &self.config.filters));
                self.load_error = None;
            }
            Err(e) => {
                warn!("Failed to load {:?}: {}", self.selected_workflows, e);
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key)?;
                }
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode {
            AppMode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                    self.mode = AppMode::Normal;
                }
                Ok(())
            }
            AppMode::Filters => self.handle_filters_key(key),
            AppMode::EditingCustomer | AppMode::EditingAoi => self.handle_input_key(key),
            AppMode::PickingWorkflows => self.handle_workflow_dialog_key(key),
            AppMode::Delivering => self.handle_delivery_dialog_key(key),
            AppMode::Exporting => self.handle_export_dialog_key(key),
            AppMode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        // Any key press clears a stale message
        self.status_message = None;

        // Handle g prefix for gg (go to top)
        if self.g_pressed {
            self.g_pressed = false;
            if key.code == KeyCode::Char('g') {
                self.review_index = 0;
                return Ok(());
            }
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char('g') => self.g_pressed = true,
            KeyCode::Char('G') => self.go_to_bottom(),
            KeyCode::Char(' ') => self.toggle_current(),
            KeyCode::Esc => self.clear_picks(),
            KeyCode::Tab => {
                self.histogram_index = (self.histogram_index + 1) % Metric::HISTOGRAM.len();
            }
            KeyCode::Char('f') => {
                if self.session.is_some() {
                    self.mode = AppMode::Filters;
                }
            }
            KeyCode::Char('w') => self.open_workflow_dialog(),
            KeyCode::Char('c') => self.mode = AppMode::EditingCustomer,
            KeyCode::Char('a') => self.mode = AppMode::EditingAoi,
            KeyCode::Char('D') | KeyCode::Enter => self.start_delivery(),
            KeyCode::Char('e') => self.open_export_dialog(),
            _ => {}
        }

        Ok(())
    }

    fn review_len(&self) -> usize {
        self.session
            .as_ref()
            .map(|session| session.review_rows().len())
            .unwrap_or(0)
    }

    fn move_down(&mut self) {
        if self.review_index + 1 < self.review_len() {
            self.review_index += 1;
        }
    }

    fn move_up(&mut self) {
        if self.review_index > 0 {
            self.review_index -= 1;
        }
    }

    fn go_to_bottom(&mut self) {
        self.review_index = self.review_len().saturating_sub(1);
    }

    fn toggle_current(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(key) = session
            .review_rows()
            .get(self.review_index)
            .map(|row| row.key.clone())
        else {
            return;
        };

        if let Some(picked) = session.toggle(&key) {
            let verb = if picked { "Picked" } else { "Unpicked" };
            self.status_message = Some(format!("{} {}", verb, key));
        }
    }

    fn clear_picks(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if !session.selection().is_empty() {
                session.clear_selection();
                self.status_message = Some("Picks cleared".to_string());
            }
        }
    }

    // --- Filters ---

    fn handle_filters_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('f') => self.mode = AppMode::Normal,
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Char('j') | KeyCode::Down => self.filter_panel.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.filter_panel.move_up(),
            KeyCode::Char('h') | KeyCode::Left => self.adjust_filter(Handle::Low, -1),
            KeyCode::Char('l') | KeyCode::Right => self.adjust_filter(Handle::Low, 1),
            KeyCode::Char('H') => self.adjust_filter(Handle::High, -1),
            KeyCode::Char('L') => self.adjust_filter(Handle::High, 1),
            KeyCode::Char('r') => self.reset_filters(),
            _ => {}
        }
        Ok(())
    }

    fn adjust_filter(&mut self, handle: Handle, steps: i32) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let next = self.filter_panel.adjust(
            session.filters(),
            session.ranges(),
            &self.config.filters,
            handle,
            steps,
        );
        self.apply_filters(next);
    }

    fn reset_filters(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let initial = FilterConfig::initial(session.ranges(), &self.config.filters);
        self.apply_filters(initial);
        self.status_message = Some("Filters reset".to_string());
    }

    fn apply_filters(&mut self, filters: FilterConfig) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if *session.filters() == filters {
            return;
        }

        let dropped = session.set_filters(filters);
        if !dropped.is_empty() {
            self.status_message = Some(format!(
                "Unpicked {} scenes no longer under review",
                dropped.len()
            ));
        }

        let review_len = session.review_rows().len();
        if self.review_index >= review_len {
            self.review_index = review_len.saturating_sub(1);
        }
    }

    // --- Customer / AOI inputs ---

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<()> {
        let input = if self.mode == AppMode::EditingCustomer {
            &mut self.customer_input
        } else {
            &mut self.aoi_input
        };

        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = AppMode::Normal,
            KeyCode::Tab => {
                self.mode = if self.mode == AppMode::EditingCustomer {
                    AppMode::EditingAoi
                } else {
                    AppMode::EditingCustomer
                };
            }
            KeyCode::Char(c) => input.handle_char(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_cursor_left(),
            KeyCode::Right => input.move_cursor_right(),
            KeyCode::Home => input.move_cursor_home(),
            KeyCode::End => input.move_cursor_end(),
            _ => {}
        }
        Ok(())
    }

    // --- Workflow picker ---

    fn open_workflow_dialog(&mut self) {
        if self.available_workflows.is_empty() {
            self.refresh_workflows();
        }
        self.workflow_dialog = Some(WorkflowDialog::new(
            &self.available_workflows,
            &self.selected_workflows,
        ));
        self.mode = AppMode::PickingWorkflows;
    }

    fn handle_workflow_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(dialog) = self.workflow_dialog.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.workflow_dialog = None;
                self.mode = AppMode::Normal;
            }
            KeyCode::Char('j') | KeyCode::Down => dialog.move_down(),
            KeyCode::Char('k') | KeyCode::Up => dialog.move_up(),
            KeyCode::Char(' ') => dialog.toggle(),
            KeyCode::Enter => {
                let picked = dialog.picked().to_vec();
                self.workflow_dialog = None;
                self.mode = AppMode::Normal;
                if picked != self.selected_workflows || self.session.is_none() {
                    self.selected_workflows = picked;
                    self.load_selected();
                }
            }
            _ => {}
        }
        Ok(())
    }

    // --- Delivery ---

    /// "Done": validate the inputs and ask for confirmation.
    fn start_delivery(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.status_message = Some("Load a workflow run first".to_string());
            return;
        };

        let request = DeliveryRequest::new(self.customer_input.value(), self.aoi_input.value());
        match self.services.dispatcher.plan(&session.delivery_set(), &request) {
            Ok(plan) => {
                self.delivery_dialog = Some(DeliveryDialog::Confirm {
                    plan,
                    dry_run: self.config.delivery.dry_run,
                });
                self.mode = AppMode::Delivering;
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
    }

    fn handle_delivery_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(dialog) = self.delivery_dialog.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(());
        };

        match dialog {
            DeliveryDialog::Confirm { plan, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    match self.services.dispatcher.execute(plan) {
                        Ok(report) => {
                            self.status_message = Some(report.summary());
                            self.delivery_dialog = Some(DeliveryDialog::Report { report, scroll: 0 });
                        }
                        Err(e) => {
                            self.status_message = Some(format!("Delivery failed: {}", e));
                            self.delivery_dialog = None;
                            self.mode = AppMode::Normal;
                        }
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.delivery_dialog = None;
                    self.mode = AppMode::Normal;
                    self.status_message = Some("Delivery cancelled".to_string());
                }
                _ => {}
            },
            DeliveryDialog::Report { .. } => match key.code {
                KeyCode::Char('j') | KeyCode::Down => dialog.scroll_down(),
                KeyCode::Char('k') | KeyCode::Up => dialog.scroll_up(),
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    self.delivery_dialog = None;
                    self.mode = AppMode::Normal;
                }
                _ => {}
            },
        }
        Ok(())
    }

    // --- Export ---

    fn open_export_dialog(&mut self) {
        if self.session.is_none() {
            self.status_message = Some("Nothing to export".to_string());
            return;
        }
        self.export_dialog = Some(ExportDialog::new(&self.config.export_dir));
        self.mode = AppMode::Exporting;
    }

    fn handle_export_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(dialog) = self.export_dialog.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(());
        };

        match key.code {
            KeyCode::Esc => {
                self.export_dialog = None;
                self.mode = AppMode::Normal;
                self.status_message = Some("Export cancelled".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => dialog.move_down(),
            KeyCode::Char('k') | KeyCode::Up => dialog.move_up(),
            KeyCode::Enter => {
                let Some(session) = self.session.as_ref() else {
                    return Ok(());
                };
                let format = dialog.selected_format();
                let output_path = dialog.output_path().to_path_buf();

                match export::export_review(session, &output_path, format) {
                    Ok(count) => {
                        self.export_dialog = None;
                        self.mode = AppMode::Normal;
                        self.status_message = Some(format!(
                            "Exported {} scenes as {} to {}",
                            count,
                            format.name(),
                            output_path.display()
                        ));
                    }
                    Err(e) => {
                        self.status_message = Some(format!("Export error: {}", e));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
