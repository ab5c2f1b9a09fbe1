use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::Credential;
use crate::views::FormMode;
use crate::views::credential_form::{CredentialDraft, CredentialForm};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ManagerIntent {
    None,
    Close,
    Edit(String),
    Delete(String),
    Save(CredentialDraft),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CredentialManager {
    selected: usize,
    form: Option<CredentialForm>,
}

impl CredentialManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update(
        mut self,
        key: KeyEvent,
        credentials: &[Credential],
    ) -> (Self, ManagerIntent) {
        if let Some(form) = self.form.take() {
            let form = form.update(key);
            if form.is_cancelled() {
                return (self, ManagerIntent::None);
            }
            let intent = match form.value() {
                Some(draft) if form.is_submitted() => ManagerIntent::Save(draft.clone()),
                _ => ManagerIntent::None,
            };
            self.form = Some(form);
            return (self, intent);
        }

        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        let selected_id = credentials.get(self.selected).map(|cred| cred.id.clone());
        let intent = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => ManagerIntent::Close,
            _ if ctrl_c => ManagerIntent::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                ManagerIntent::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < credentials.len() {
                    self.selected += 1;
                }
                ManagerIntent::None
            }
            KeyCode::Char('a') => {
                self.form = Some(CredentialForm::new(FormMode::Add, None, None));
                ManagerIntent::None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                selected_id.map_or(ManagerIntent::None, ManagerIntent::Edit)
            }
            KeyCode::Char('d') => selected_id.map_or(ManagerIntent::None, ManagerIntent::Delete),
            _ => ManagerIntent::None,
        };
        (self, intent)
    }

    pub(crate) fn with_form(mut self, form: CredentialForm) -> Self {
        self.form = Some(form);
        self
    }

    pub(crate) fn form_saved(mut self, credentials: &[Credential], id: &str) -> Self {
        self.form = None;
        if let Some(index) = credentials.iter().position(|cred| cred.id == id) {
            self.selected = index;
        }
        self
    }

    pub(crate) fn form_failed(mut self, error: impl Into<String>) -> Self {
        self.form = self.form.map(|form| form.reopen_with_error(error));
        self
    }

    pub(crate) fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub(crate) fn selected(&self) -> usize {
        self.selected
    }

    pub(crate) fn form(&self) -> Option<&CredentialForm> {
        self.form.as_ref()
    }
}
