//! Application state and logic for the interactive board

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tui_input::InputRequest;
use uuid::Uuid;

use crate::activity::{ActivityCatalog, TimerStatus};
use crate::workflow::{sort_board, BoardRow, Workflow, BOARD_RELOAD_INTERVAL};

use super::form::{FormField, StartForm};
use super::messages::Message;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Watching the board
    Normal,
    /// Help screen
    Help,
    /// Filling in the start form
    StartActivity,
    /// Confirming a stop
    StopConfirm,
}

/// Main application state
pub struct App {
    pub workflow: Workflow,
    pub catalog: ActivityCatalog,
    /// Running activities, most urgent first
    pub rows: Vec<BoardRow>,
    /// Selected activity, tracked by id so re-sorting keeps the cursor
    pub selected: Option<Uuid>,
    pub mode: AppMode,
    pub messages: Vec<Message>,
    pub form: Option<StartForm>,
    pub now: DateTime<Utc>,
    pub loading: bool,
    last_reload: Instant,
}

impl App {
    pub async fn new(workflow: Workflow) -> Result<Self> {
        let mut app = App {
            workflow,
            catalog: ActivityCatalog::built_in(),
            rows: Vec::new(),
            selected: None,
            mode: AppMode::Normal,
            messages: vec![Message::info("Loading board...")],
            form: None,
            now: Utc::now(),
            loading: true,
            last_reload: Instant::now(),
        };
        app.reload().await;
        Ok(app)
    }

    /// Re-read the catalog and active activities. Failures are shown, not fatal.
    pub async fn reload(&mut self) {
        self.loading = true;
        self.now = Utc::now();
        match self.workflow.board(self.now).await {
            Ok((catalog, rows)) => {
                self.catalog = catalog;
                self.rows = rows;
                self.keep_selection();
            }
            Err(e) => {
                tracing::error!(error = %e, "board reload failed");
                self.add_message(Message::error(format!("Reload failed: {}", e)));
            }
        }
        self.last_reload = Instant::now();
        self.loading = false;
    }

    /// Advance timers to `now`; reloads from the backend when due
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        if self.last_reload.elapsed() >= BOARD_RELOAD_INTERVAL {
            self.reload().await;
            return;
        }
        self.advance(now);
    }

    /// Recompute every row's timer without touching the backend
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.now = now;
        for row in &mut self.rows {
            row.refresh(now);
        }
        sort_board(&mut self.rows);
        self.keep_selection();
        self.messages.retain(|m| !m.is_expired());
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > 20 {
            self.messages.remove(0);
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.rows.iter().position(|r| r.activity.id == id)
    }

    pub fn selected_row(&self) -> Option<&BoardRow> {
        self.selected_index().map(|i| &self.rows[i])
    }

    /// Rows per status, in Normal/Warning/Urgent order
    pub fn status_counts(&self) -> [(TimerStatus, usize); 3] {
        let count = |s: TimerStatus| self.rows.iter().filter(|r| r.timer.status == s).count();
        [
            (TimerStatus::Normal, count(TimerStatus::Normal)),
            (TimerStatus::Warning, count(TimerStatus::Warning)),
            (TimerStatus::Urgent, count(TimerStatus::Urgent)),
        ]
    }

    fn keep_selection(&mut self) {
        if self.selected_index().is_none() {
            self.selected = self.rows.first().map(|r| r.activity.id);
        }
    }

    /// Handle a key press. Returns `false` when the app should quit.
    pub async fn handle_event(&mut self, event: KeyEvent) -> Result<bool> {
        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Ok(false);
        }

        match self.mode {
            AppMode::Normal => self.handle_normal_mode(event).await,
            AppMode::Help => {
                self.mode = AppMode::Normal;
                Ok(true)
            }
            AppMode::StartActivity => self.handle_start_mode(event).await,
            AppMode::StopConfirm => self.handle_stop_mode(event).await,
        }
    }

    async fn handle_normal_mode(&mut self, event: KeyEvent) -> Result<bool> {
        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
            KeyCode::Char('?') | KeyCode::Char('h') => self.mode = AppMode::Help,
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Char('r') => {
                self.reload().await;
                self.add_message(Message::info(format!(
                    "Refreshed: {} active",
                    self.rows.len()
                )));
            }
            KeyCode::Char('s') | KeyCode::Char('a') => {
                self.form = Some(StartForm::new(&self.catalog));
                self.mode = AppMode::StartActivity;
            }
            KeyCode::Char('x') | KeyCode::Enter => {
                if let Some(row) = self.selected_row() {
                    let text = format!(
                        "Stop {} for {}? (y/n)",
                        row.definition.label, row.activity.dog_id
                    );
                    self.add_message(Message::warning(text));
                    self.mode = AppMode::StopConfirm;
                }
            }
            _ => {}
        }
        Ok(true)
    }

    async fn handle_start_mode(&mut self, event: KeyEvent) -> Result<bool> {
        let Some(form) = self.form.as_mut() else {
            self.mode = AppMode::Normal;
            return Ok(true);
        };

        match event.code {
            KeyCode::Esc => {
                self.form = None;
                self.mode = AppMode::Normal;
                self.add_message(Message::info("Start cancelled"));
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Enter => self.submit_start().await,
            code if form.current_field == FormField::ActivityType => match code {
                KeyCode::Up | KeyCode::Left => form.select_previous_type(),
                KeyCode::Down | KeyCode::Right => form.select_next_type(),
                KeyCode::Char(c) => {
                    if let Some(digit) = c.to_digit(10) {
                        form.select_type_by_digit(digit);
                    }
                }
                _ => {}
            },
            KeyCode::Char(c) => form.edit(InputRequest::InsertChar(c)),
            KeyCode::Backspace => form.edit(InputRequest::DeletePrevChar),
            KeyCode::Delete => form.edit(InputRequest::DeleteNextChar),
            KeyCode::Left => form.edit(InputRequest::GoToPrevChar),
            KeyCode::Right => form.edit(InputRequest::GoToNextChar),
            KeyCode::Home => form.edit(InputRequest::GoToStart),
            KeyCode::End => form.edit(InputRequest::GoToEnd),
            _ => {}
        }
        Ok(true)
    }

    async fn submit_start(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let request = match form.to_new_activity() {
            Ok(request) => request,
            Err(reason) => {
                self.add_message(Message::warning(reason));
                return;
            }
        };

        match self.workflow.start_activity(request).await {
            Ok(log) => {
                self.form = None;
                self.mode = AppMode::Normal;
                self.add_message(Message::success(format!(
                    "Started {} for {}",
                    log.activity_type_code, log.dog_id
                )));
                let id = log.id;
                self.reload().await;
                self.selected = Some(id);
            }
            // Keep the form open so the entry can be corrected
            Err(e) => self.add_message(Message::error(format!("Start failed: {}", e))),
        }
    }

    async fn handle_stop_mode(&mut self, event: KeyEvent) -> Result<bool> {
        match event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.mode = AppMode::Normal;
                if let Some(id) = self.selected {
                    match self.workflow.stop_activity(id).await {
                        Ok(log) => {
                            self.add_message(Message::success(format!(
                                "Stopped {} for {}",
                                log.activity_type_code, log.dog_id
                            )));
                            self.reload().await;
                        }
                        Err(e) => {
                            self.add_message(Message::error(format!("Stop failed: {}", e)))
                        }
                    }
                }
            }
            _ => {
                self.mode = AppMode::Normal;
                self.add_message(Message::info("Stop cancelled"));
            }
        }
        Ok(true)
    }

    fn select_previous(&mut self) {
        if let Some(i) = self.selected_index() {
            if i > 0 {
                self.selected = Some(self.rows[i - 1].activity.id);
            }
        }
    }

    fn select_next(&mut self) {
        if let Some(i) = self.selected_index() {
            if i + 1 < self.rows.len() {
                self.selected = Some(self.rows[i + 1].activity.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::NewActivity;
    use crate::store::LocalBackend;
    use chrono::Duration as ChronoDuration;
    use crossterm::event::KeyEventKind;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    async fn app_with(dogs: &[(&str, &str)]) -> App {
        let workflow = Workflow::new(Arc::new(LocalBackend::in_memory()), "fac-1");
        for (dog, code) in dogs {
            workflow
                .start_activity(NewActivity {
                    dog_id: dog.to_string(),
                    activity_type_code: code.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        App::new(workflow).await.unwrap()
    }

    #[tokio::test]
    async fn test_loads_board_and_selects_first_row() {
        let app = app_with(&[("rex", "potty"), ("bella", "kennel")]).await;
        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.selected_index(), Some(0));
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn test_advance_resorts_but_keeps_selection() {
        let mut app = app_with(&[("rex", "kennel"), ("bella", "potty")]).await;
        let bella = app
            .rows
            .iter()
            .find(|r| r.activity.dog_id == "bella")
            .unwrap()
            .activity
            .id;
        app.selected = Some(bella);

        // 35 minutes in: potty is urgent, kennel is still normal
        app.advance(Utc::now() + ChronoDuration::minutes(35));
        assert_eq!(app.rows[0].activity.dog_id, "bella");
        assert_eq!(app.rows[0].timer.status, TimerStatus::Urgent);
        assert_eq!(app.selected, Some(bella));
        assert_eq!(
            app.status_counts(),
            [
                (TimerStatus::Normal, 1),
                (TimerStatus::Warning, 0),
                (TimerStatus::Urgent, 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_start_via_form() {
        let mut app = app_with(&[]).await;
        app.handle_event(key(KeyCode::Char('s'))).await.unwrap();
        assert_eq!(app.mode, AppMode::StartActivity);

        for c in "rex".chars() {
            app.handle_event(key(KeyCode::Char(c))).await.unwrap();
        }
        app.handle_event(key(KeyCode::Tab)).await.unwrap();
        app.handle_event(key(KeyCode::Char('3'))).await.unwrap();
        app.handle_event(key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.rows[0].activity.activity_type_code, "training");
    }

    #[tokio::test]
    async fn test_stop_requires_confirmation() {
        let mut app = app_with(&[("rex", "walk")]).await;

        app.handle_event(key(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.mode, AppMode::StopConfirm);
        app.handle_event(key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.rows.len(), 1);

        app.handle_event(key(KeyCode::Char('x'))).await.unwrap();
        app.handle_event(key(KeyCode::Char('y'))).await.unwrap();
        assert!(app.rows.is_empty());
        assert_eq!(app.selected, None);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app_with(&[]).await;
        assert!(!app.handle_event(key(KeyCode::Char('q'))).await.unwrap());

        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        assert!(!app.handle_event(ctrl_c).await.unwrap());
    }
}
