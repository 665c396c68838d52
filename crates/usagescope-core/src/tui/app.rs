//! Main TUI application state and logic

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::widgets::TableState;
use tokio::sync::mpsc;
use tracing::debug;

use super::event::Event;
use crate::client::UsageDataProvider;
use crate::models::{
    group_usage, FilterCriteria, FormField, GroupedRow, TimelineSnapshot, UsageRecord,
    ValidationError,
};

/// Main TUI application state
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Current filter criteria
    pub criteria: FilterCriteria,
    /// Focused form field
    pub focus: FormField,
    /// Whether focus is on the results table instead of the form
    pub results_focused: bool,
    /// Fetched usage records (canonical; grouped rows derive per frame)
    pub records: Vec<UsageRecord>,
    /// Fetch in flight; submit is disabled while set
    pub loading: bool,
    /// Inline validation message for one field
    pub field_error: Option<ValidationError>,
    /// Request-error banner message
    pub banner_error: Option<String>,
    /// Group key of the row whose timeline is open
    pub selected_timeline: Option<String>,
    /// Timeline breakdown for the selected row
    pub timeline: Option<TimelineSnapshot>,
    /// Results table state
    pub table_state: TableState,
    /// Refresh rate
    pub refresh_rate: Duration,
    submit_seq: u64,
    provider: Arc<dyn UsageDataProvider>,
}

impl App {
    /// Create a new TUI app backed by the given usage data provider
    pub fn new(provider: Arc<dyn UsageDataProvider>) -> Self {
        Self {
            should_quit: false,
            criteria: FilterCriteria::default(),
            focus: FormField::RequestGroupId,
            results_focused: false,
            records: Vec::new(),
            loading: false,
            field_error: None,
            banner_error: None,
            selected_timeline: None,
            timeline: None,
            table_state: TableState::default(),
            refresh_rate: Duration::from_millis(250),
            submit_seq: 0,
            provider,
        }
    }

    /// Set refresh rate
    pub fn with_refresh_rate(mut self, ms: u64) -> Self {
        self.refresh_rate = Duration::from_millis(ms);
        self
    }

    /// Grouped rows for the current records and aggregation type
    pub fn grouped_rows(&self) -> Vec<GroupedRow> {
        group_usage(&self.records, self.criteria.aggregation_type)
    }

    /// Whether the SKU column is part of the current column set
    pub fn show_sku_column(&self) -> bool {
        self.criteria.aggregation_type == crate::models::AggregationType::Sku
            || self.criteria.has_sku_filter()
    }

    /// Column headers for the results table
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            "Request Group Id".to_string(),
            self.criteria.entity_type.id_label().to_string(),
        ];
        if self.show_sku_column() {
            columns.push("SKU".to_string());
        }
        columns.push("Aggregated Total".to_string());
        columns.push("Actions".to_string());
        columns
    }

    /// Handle key events
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        tx: &mpsc::UnboundedSender<Event>,
    ) {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Esc, KeyModifiers::NONE) => {
                self.should_quit = true;
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.focus_next();
            }
            (KeyCode::BackTab, _) => {
                self.focus_prev();
            }
            _ => {
                if self.results_focused {
                    self.handle_results_key(code);
                } else {
                    self.handle_form_key(code, tx);
                }
            }
        }
    }

    fn focus_order(&self) -> &'static [FormField] {
        &[
            FormField::RequestGroupId,
            FormField::EntityId,
            FormField::EntityType,
            FormField::Sku,
            FormField::Aggregation,
            FormField::Submit,
        ]
    }

    fn focus_next(&mut self) {
        if self.results_focused {
            self.results_focused = false;
            self.focus = FormField::RequestGroupId;
            return;
        }
        if self.focus == FormField::Submit && !self.records.is_empty() {
            self.results_focused = true;
            if self.table_state.selected().is_none() {
                self.table_state.select(Some(0));
            }
            return;
        }
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + 1) % order.len()];
    }

    fn focus_prev(&mut self) {
        if self.results_focused {
            self.results_focused = false;
            self.focus = FormField::Submit;
            return;
        }
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        if i == 0 {
            if self.records.is_empty() {
                self.focus = FormField::Submit;
            } else {
                self.results_focused = true;
                if self.table_state.selected().is_none() {
                    self.table_state.select(Some(0));
                }
            }
        } else {
            self.focus = order[i - 1];
        }
    }

    fn handle_form_key(&mut self, code: KeyCode, tx: &mpsc::UnboundedSender<Event>) {
        match self.focus {
            FormField::RequestGroupId | FormField::EntityId | FormField::Sku => match code {
                KeyCode::Char(c) => {
                    self.edit_field(|criteria, field| {
                        field_mut(criteria, field).push(c);
                    });
                }
                KeyCode::Backspace => {
                    self.edit_field(|criteria, field| {
                        field_mut(criteria, field).pop();
                    });
                }
                KeyCode::Enter => self.submit(tx),
                _ => {}
            },
            FormField::EntityType => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                    self.on_edit();
                    self.criteria.entity_type = self.criteria.entity_type.toggled();
                }
                KeyCode::Enter => self.submit(tx),
                _ => {}
            },
            FormField::Aggregation => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                    self.on_edit();
                    self.criteria.aggregation_type = self.criteria.aggregation_type.toggled();
                }
                KeyCode::Enter => self.submit(tx),
                _ => {}
            },
            FormField::Submit => {
                if code == KeyCode::Enter {
                    self.submit(tx);
                }
            }
        }
    }

    fn handle_results_key(&mut self, code: KeyCode) {
        let rows = self.grouped_rows();
        if rows.is_empty() {
            return;
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(i.saturating_sub(1)));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some((i + 1).min(rows.len() - 1)));
            }
            KeyCode::Enter => {
                if let Some(row) = self.table_state.selected().and_then(|i| rows.get(i)) {
                    self.toggle_timeline(&row.key.clone(), row.aggregated_total);
                }
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    /// Apply an edit to the focused text field. Any edit invalidates fetched
    /// results and the open timeline.
    fn edit_field(&mut self, apply: impl FnOnce(&mut FilterCriteria, FormField)) {
        self.on_edit();
        apply(&mut self.criteria, self.focus);
    }

    fn on_edit(&mut self) {
        self.records.clear();
        self.selected_timeline = None;
        self.timeline = None;
        self.results_focused = false;
        self.table_state.select(None);
    }

    /// Validate and dispatch the fetch. No-op while a fetch is in flight.
    pub fn submit(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        if self.loading {
            return;
        }

        if let Err(err) = self.criteria.validate() {
            self.field_error = Some(err);
            self.banner_error = None;
            return;
        }
        self.field_error = None;
        self.banner_error = None;
        self.loading = true;
        self.submit_seq += 1;

        let seq = self.submit_seq;
        let criteria = self.criteria.clone();
        let provider = Arc::clone(&self.provider);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = provider
                .fetch_usage(&criteria)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Event::FetchCompleted { seq, result });
        });
    }

    /// Apply a completed fetch. Results from a superseded submission are
    /// dropped.
    pub fn apply_fetch_result(
        &mut self,
        seq: u64,
        result: std::result::Result<Vec<UsageRecord>, String>,
    ) {
        if seq != self.submit_seq {
            debug!(seq, current = self.submit_seq, "dropping stale fetch result");
            return;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                self.records = records;
                // Keyed selection survives a refetch only if the row is still there.
                if let Some(key) = &self.selected_timeline {
                    if !self.grouped_rows().iter().any(|r| &r.key == key) {
                        self.selected_timeline = None;
                        self.timeline = None;
                    }
                }
            }
            Err(message) => {
                self.banner_error = Some(message);
                self.records.clear();
                self.selected_timeline = None;
                self.timeline = None;
            }
        }
    }

    /// Toggle the timeline panel for the row with the given group key.
    pub fn toggle_timeline(&mut self, key: &str, aggregated_total: f64) {
        if self.selected_timeline.as_deref() == Some(key) {
            self.selected_timeline = None;
            self.timeline = None;
            return;
        }
        self.selected_timeline = Some(key.to_string());
        self.timeline = Some(TimelineSnapshot::from_aggregated_total(aggregated_total));
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> crate::error::Result<()> {
        use crossterm::{
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        };
        use ratatui::{backend::CrosstermBackend, Terminal};
        use std::io;

        enable_raw_mode().map_err(|e| crate::error::Error::Tui(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| crate::error::Error::Tui(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)
            .map_err(|e| crate::error::Error::Tui(e.to_string()))?;

        let mut events = super::EventHandler::new(self.refresh_rate.as_millis() as u64);
        let tx = events.sender();
        events.start();

        while !self.should_quit {
            terminal
                .draw(|frame| super::ui::draw(frame, self))
                .map_err(|e| crate::error::Error::Tui(e.to_string()))?;

            if let Some(event) = events.next().await {
                match event {
                    Event::Key(key) => {
                        self.handle_key(key.code, key.modifiers, &tx);
                    }
                    Event::FetchCompleted { seq, result } => {
                        self.apply_fetch_result(seq, result);
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                }
            }
        }

        disable_raw_mode().map_err(|e| crate::error::Error::Tui(e.to_string()))?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| crate::error::Error::Tui(e.to_string()))?;
        terminal
            .show_cursor()
            .map_err(|e| crate::error::Error::Tui(e.to_string()))?;

        Ok(())
    }
}

fn field_mut(criteria: &mut FilterCriteria, field: FormField) -> &mut String {
    match field {
        FormField::RequestGroupId => &mut criteria.request_group_id,
        FormField::EntityId => &mut criteria.entity_id,
        FormField::Sku => &mut criteria.sku_id,
        // Only text fields route through here; the match in handle_form_key
        // guarantees it.
        _ => unreachable!("not a text field"),
    }
}
