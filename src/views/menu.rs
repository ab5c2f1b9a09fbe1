use crossterm::event::{KeyCode, KeyEvent};

use crate::model::SessionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuOutcome {
    Open,
    Back,
    Chosen(SessionMode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModeMenu {
    connection_id: String,
    title: String,
    selected: usize,
}

impl ModeMenu {
    pub(crate) fn new(connection_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            title: title.into(),
            selected: 0,
        }
    }

    pub(crate) fn update(mut self, key: KeyEvent) -> (Self, MenuOutcome) {
        let outcome = match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                MenuOutcome::Open
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(SessionMode::ALL.len() - 1);
                MenuOutcome::Open
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                MenuOutcome::Chosen(SessionMode::ALL[self.selected])
            }
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => MenuOutcome::Back,
            _ => MenuOutcome::Open,
        };
        (self, outcome)
    }

    pub(crate) fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }
}
